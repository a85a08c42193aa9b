//! WhatsApp "your turn" deep links.
//!
//! No message is sent from the server. The barber's browser opens one of the
//! generated links and the barber presses send.

use serde::Serialize;

use crate::types::{NormalizedPhone, PhoneError, PhoneLocale, normalize_phone};

/// Name used in the greeting when the client never told us theirs.
const FALLBACK_NAME: &str = "cliente";

/// Characters kept in [`NotifyLinks::message_preview`].
const PREVIEW_CHARS: usize = 100;

/// Errors from building a notification link.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// No usable phone number for the client.
    #[error("client has no phone number")]
    MissingContact,
}

impl From<PhoneError> for NotifyError {
    fn from(_: PhoneError) -> Self {
        Self::MissingContact
    }
}

/// Links and metadata handed to the barber's UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotifyLinks {
    /// `https://wa.me/...` link.
    pub web_url: String,
    /// `https://api.whatsapp.com/send?...` link, for clients where `wa.me` fails.
    pub api_url: String,
    /// Normalized recipient number.
    pub phone: NormalizedPhone,
    /// Name used in the greeting.
    pub recipient_name: String,
    /// Start of the message, for display.
    pub message_preview: String,
}

/// Render the greeting sent to a client whose turn has come.
#[must_use]
pub fn turn_message(shop_name: &str, recipient_name: &str) -> String {
    format!(
        "🔔 *{shop_name} - Sua vez chegou!*\n\n\
         Olá {recipient_name}! 👋\n\n\
         Sua vez na fila chegou! Por favor, dirija-se à barbearia para o seu atendimento.\n\n\
         ⏰ *Não perca sua vez!*\n\n\
         Obrigado pela preferência! ✂️"
    )
}

/// Build the deep links for notifying a client.
///
/// # Errors
///
/// Returns [`NotifyError::MissingContact`] when `phone` is empty or contains
/// no digits.
pub fn build_notify_links(
    phone: Option<&str>,
    name: Option<&str>,
    locale: &PhoneLocale,
    shop_name: &str,
) -> Result<NotifyLinks, NotifyError> {
    let raw_phone = phone.ok_or(NotifyError::MissingContact)?;
    let phone = normalize_phone(raw_phone, locale)?;

    let recipient_name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(FALLBACK_NAME)
        .to_owned();

    let message = turn_message(shop_name, &recipient_name);
    let encoded = urlencoding::encode(&message);

    Ok(NotifyLinks {
        web_url: format!("https://wa.me/{phone}?text={encoded}"),
        api_url: format!("https://api.whatsapp.com/send?phone={phone}&text={encoded}"),
        message_preview: preview(&message),
        phone,
        recipient_name,
    })
}

fn preview(message: &str) -> String {
    let mut out: String = message.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_links_use_normalized_phone() {
        let links = build_notify_links(
            Some("(11) 98765-4321"),
            Some("Pedro"),
            &PhoneLocale::default(),
            "Barbearia",
        )
        .unwrap();

        assert_eq!(links.phone.as_str(), "5511987654321");
        assert!(links.web_url.starts_with("https://wa.me/5511987654321?text="));
        assert!(
            links
                .api_url
                .starts_with("https://api.whatsapp.com/send?phone=5511987654321&text=")
        );
        assert_eq!(links.recipient_name, "Pedro");
    }

    #[test]
    fn test_message_is_url_encoded() {
        let links =
            build_notify_links(Some("11999990000"), Some("Ana"), &PhoneLocale::default(), "Barbearia")
                .unwrap();
        let text = links.web_url.split_once("text=").unwrap().1;
        assert!(!text.contains(' '));
        assert!(!text.contains('\n'));
        assert!(text.contains("Ol%C3%A1%20Ana"));
    }

    #[test]
    fn test_blank_name_falls_back() {
        let links =
            build_notify_links(Some("11999990000"), Some("  "), &PhoneLocale::default(), "Barbearia")
                .unwrap();
        assert_eq!(links.recipient_name, "cliente");

        let links =
            build_notify_links(Some("11999990000"), None, &PhoneLocale::default(), "Barbearia")
                .unwrap();
        assert_eq!(links.recipient_name, "cliente");
    }

    #[test]
    fn test_preview_is_truncated_on_char_boundary() {
        let links =
            build_notify_links(Some("11999990000"), Some("Zé"), &PhoneLocale::default(), "Barbearia")
                .unwrap();
        assert!(links.message_preview.ends_with("..."));
        assert_eq!(links.message_preview.chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_missing_contact() {
        let br = PhoneLocale::default();
        assert_eq!(
            build_notify_links(None, Some("Ana"), &br, "Barbearia"),
            Err(NotifyError::MissingContact)
        );
        assert_eq!(
            build_notify_links(Some(""), Some("Ana"), &br, "Barbearia"),
            Err(NotifyError::MissingContact)
        );
    }

    #[test]
    fn test_message_mentions_shop() {
        let message = turn_message("Navalha de Ouro", "Caio");
        assert!(message.contains("*Navalha de Ouro - Sua vez chegou!*"));
        assert!(message.contains("Olá Caio!"));
    }
}
