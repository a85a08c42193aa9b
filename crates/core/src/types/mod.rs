//! Core types for Barber Queue.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod phone;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use phone::{NormalizedPhone, PhoneError, PhoneLocale, normalize_phone};
pub use status::*;
