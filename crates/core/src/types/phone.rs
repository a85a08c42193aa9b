//! Phone number normalization for outbound messaging links.
//!
//! Numbers arrive in whatever shape the client typed or the identity provider
//! returned (`+55 (11) 98765-4321`, `11987654321`, ...). Messaging deep links
//! need bare international digits, so normalization strips everything that is
//! not a digit and prefixes the locale's country code when it is missing.
//!
//! The country code is an explicit [`PhoneLocale`] parameter rather than a
//! constant so deployments outside Brazil only change configuration.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors from phone normalization.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input has no digits at all.
    #[error("phone number is empty")]
    Empty,
    /// The country code is not 1-3 digits.
    #[error("invalid country code: {0:?}")]
    InvalidCountryCode(String),
}

/// Locale used to complete local phone numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneLocale {
    country_code: String,
}

impl PhoneLocale {
    /// Brazil (`+55`), the default deployment locale.
    pub const BRAZIL_COUNTRY_CODE: &'static str = "55";

    /// Build a locale from an international dialing code (`"55"`, `"+1"`).
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::InvalidCountryCode`] unless the code is 1-3 digits
    /// (an optional leading `+` is accepted).
    pub fn new(country_code: &str) -> Result<Self, PhoneError> {
        let code = country_code.trim().trim_start_matches('+');
        if code.is_empty() || code.len() > 3 || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::InvalidCountryCode(country_code.to_owned()));
        }
        Ok(Self {
            country_code: code.to_owned(),
        })
    }

    /// The country code digits, without `+`.
    #[must_use]
    pub fn country_code(&self) -> &str {
        &self.country_code
    }
}

impl Default for PhoneLocale {
    fn default() -> Self {
        Self {
            country_code: Self::BRAZIL_COUNTRY_CODE.to_owned(),
        }
    }
}

/// A phone number reduced to international digits (`5511987654321`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedPhone(String);

impl NormalizedPhone {
    /// Returns the digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize a raw phone number for the given locale.
///
/// Non-digits are removed; if the remaining digits do not already start with
/// the locale's country code, the code is prepended.
///
/// ```
/// use barberq_core::{PhoneLocale, normalize_phone};
///
/// let br = PhoneLocale::default();
/// assert_eq!(normalize_phone("(11) 98765-4321", &br).unwrap().as_str(), "5511987654321");
/// assert_eq!(normalize_phone("+55 11 98765-4321", &br).unwrap().as_str(), "5511987654321");
/// ```
///
/// # Errors
///
/// Returns [`PhoneError::Empty`] when the input contains no digits.
pub fn normalize_phone(raw: &str, locale: &PhoneLocale) -> Result<NormalizedPhone, PhoneError> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Err(PhoneError::Empty);
    }

    if digits.starts_with(locale.country_code()) {
        Ok(NormalizedPhone(digits))
    } else {
        Ok(NormalizedPhone(format!("{}{digits}", locale.country_code())))
    }
}
