//! Barber Queue Core - Domain types and queue logic.
//!
//! This crate provides the types and rules shared by all Barber Queue
//! components:
//! - `server` - HTTP API for clients, barbers and the public queue page
//! - `cli` - Command-line tools for migrations and queue administration
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. With the `postgres` feature, IDs, emails and enums
//! gain sqlx encodings.
//!
//! # Modules
//!
//! - [`types`] - IDs, emails, phone normalization, statuses and roles
//! - [`queue`] - Queue ordering and 1-based position computation
//! - [`notify`] - WhatsApp deep links for calling the next client

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod notify;
pub mod queue;
pub mod types;

pub use notify::{NotifyError, NotifyLinks, build_notify_links};
pub use queue::{QueueEntry, compute_position, locate_active, order_queue, positions};
pub use types::*;
