//! Operator input checks applied before any provider call, plus display helpers.
//!
//! Nothing here decodes invoices; request strings are passed through to the
//! provider untouched apart from trimming and URI-prefix removal.

use crate::types::{AppError, AppResult};

const LIGHTNING_URI_PREFIX: &str = "lightning:";
const PUBKEY_HEX_LEN: usize = 66;

/// Strip an optional `lightning:` URI scheme (case-insensitive)
pub fn strip_lightning_uri(input: &str) -> &str {
    let trimmed = input.trim();
    match trimmed.get(..LIGHTNING_URI_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(LIGHTNING_URI_PREFIX) => {
            trimmed[LIGHTNING_URI_PREFIX.len()..].trim()
        }
        _ => trimmed,
    }
}

/// Parse a positive whole number of sats
pub fn parse_sats(input: &str) -> AppResult<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("amount is required".to_string()));
    }
    match trimmed.parse::<u64>() {
        Ok(0) => Err(AppError::InvalidInput("amount must be at least 1 sat".to_string())),
        Ok(sats) => Ok(sats),
        Err(_) => Err(AppError::InvalidInput(format!("'{}' is not a whole number of sats", trimmed))),
    }
}

pub fn payment_request(input: &str) -> AppResult<&str> {
    let request = strip_lightning_uri(input);
    if request.is_empty() {
        return Err(AppError::InvalidInput("payment request is empty".to_string()));
    }
    if request.chars().any(char::is_whitespace) {
        return Err(AppError::InvalidInput("payment request contains whitespace".to_string()));
    }
    Ok(request)
}

/// Hex-encoded compressed node public key
pub fn node_pubkey(input: &str) -> AppResult<&str> {
    let key = input.trim();
    if key.len() != PUBKEY_HEX_LEN || !key.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::InvalidInput(format!(
            "node public key must be {} hex characters",
            PUBKEY_HEX_LEN
        )));
    }
    Ok(key)
}

/// Lightning Address (`user@host`) or bech32 LNURL
pub fn payable_identifier(input: &str) -> AppResult<&str> {
    let identifier = strip_lightning_uri(input);
    if is_lightning_address(identifier) || is_lnurl(identifier) {
        Ok(identifier)
    } else {
        Err(AppError::InvalidInput(format!(
            "'{}' is not a Lightning Address or LNURL",
            identifier
        )))
    }
}

fn is_lightning_address(s: &str) -> bool {
    let Some((user, host)) = s.split_once('@') else {
        return false;
    };
    let user_ok = !user.is_empty()
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'));
    let host_ok = !host.is_empty()
        && !host.starts_with('.')
        && !host.ends_with('.')
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':'));
    user_ok && host_ok
}

fn is_lnurl(s: &str) -> bool {
    s.len() > 6
        && s.get(..6).is_some_and(|prefix| prefix.eq_ignore_ascii_case("lnurl1"))
        && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// `abcdefgh...stuvwxyz` for node keys, "N/A" when missing
pub fn truncate_pubkey(pubkey: Option<&str>) -> String {
    match pubkey {
        Some(key) if key.len() > 16 && key.is_ascii() => format!("{}...{}", &key[..8], &key[key.len() - 8..]),
        Some(key) => key.to_string(),
        None => "N/A".to_string(),
    }
}

/// Shorten long payment requests to their first and last 15 characters
pub fn truncate_invoice(invoice: &str) -> String {
    if invoice.len() > 30 && invoice.is_ascii() {
        format!("{}...{}", &invoice[..15], &invoice[invoice.len() - 15..])
    } else {
        invoice.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sats() {
        assert_eq!(parse_sats(" 1500 ").unwrap(), 1500);
        assert!(parse_sats("").is_err());
        assert!(parse_sats("0").is_err());
        assert!(parse_sats("-3").is_err());
        assert!(parse_sats("1.5").is_err());
    }

    #[test]
    fn test_strip_lightning_uri() {
        assert_eq!(strip_lightning_uri("LIGHTNING:lnbc1abc"), "lnbc1abc");
        assert_eq!(strip_lightning_uri("  lnbc1abc "), "lnbc1abc");
        assert_eq!(strip_lightning_uri("light"), "light");
    }

    #[test]
    fn test_payable_identifier() {
        assert_eq!(payable_identifier("satoshi@getalby.com").unwrap(), "satoshi@getalby.com");
        assert_eq!(payable_identifier("x@y").unwrap(), "x@y");
        assert!(payable_identifier("lightning:LNURL1DP68GURN8GHJ7").is_ok());
        assert!(payable_identifier("satoshi").is_err());
        assert!(payable_identifier("@getalby.com").is_err());
        assert!(payable_identifier("a b@c.com").is_err());
        assert!(payable_identifier("lnurl1").is_err());
    }

    #[test]
    fn test_non_ascii_identifier_is_rejected() {
        assert!(payable_identifier("a€€").unwrap_err().is_validation());
        assert!(payable_identifier("lnurl€1abc").unwrap_err().is_validation());
        assert!(payable_identifier("sätoshi@getalby.com").unwrap_err().is_validation());
    }

    #[test]
    fn test_node_pubkey() {
        let key = "02".to_string() + &"ab".repeat(32);
        assert!(node_pubkey(&key).is_ok());
        assert!(node_pubkey(&key[..64]).is_err());
        assert!(node_pubkey(&key.replace('a', "z")).is_err());
    }

    #[test]
    fn test_truncation() {
        let key = "0123456789abcdef0123456789abcdef";
        assert_eq!(truncate_pubkey(Some(key)), "01234567...89abcdef");
        assert_eq!(truncate_pubkey(None), "N/A");
        assert_eq!(truncate_pubkey(Some("0123456€89abcdef0123")), "0123456€89abcdef0123");

        let invoice = "lnbc2500u1pvjluezpp5qqqsyqcyq5rqwzqfqqqsyqcyq5rqwzqfq";
        assert_eq!(truncate_invoice(invoice), "lnbc2500u1pvjlu...qsyqcyq5rqwzqfq");
        assert_eq!(truncate_invoice("lnbc1short"), "lnbc1short");
    }
}
