//! Time-based one-time password generation for the broker login flow.
//!
//! Angel One second-factor codes are standard RFC 6238 TOTP: HMAC-SHA1 over
//! a 30-second counter, truncated to 6 digits. The shared secret arrives as
//! a base32 string from the broker's authenticator setup.

use data_encoding::BASE32_NOPAD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Seconds per TOTP window.
const STEP_SECS: u64 = 30;

/// Digits in the generated code.
const DIGITS: u32 = 6;

#[derive(Debug, thiserror::Error)]
pub enum TotpError {
    #[error("invalid TOTP secret: not a usable base32 string")]
    InvalidSecret,
}

/// Generate the code for the current time window.
///
/// A malformed secret is fatal for the login attempt: it will not become
/// valid on retry, so the error is surfaced rather than absorbed.
pub fn generate_totp(secret: &str) -> Result<String, TotpError> {
    let now = chrono::Utc::now().timestamp() as u64;
    totp_at(secret, now)
}

/// Generate the code for an explicit unix time. Deterministic within a
/// window, which is what the tests pin down.
pub fn totp_at(secret: &str, unix_time: u64) -> Result<String, TotpError> {
    let key = decode_secret(secret)?;

    let counter = unix_time / STEP_SECS;
    let mut mac = HmacSha1::new_from_slice(&key).map_err(|_| TotpError::InvalidSecret)?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // RFC 6238 dynamic truncation: low nibble of the last byte picks a
    // 4-byte window, high bit masked off.
    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    let code = binary % 10u32.pow(DIGITS);

    Ok(format!("{code:0width$}", width = DIGITS as usize))
}

/// Decode a base32 secret, tolerating the spacing, padding, and lowercase
/// that authenticator apps commonly emit.
fn decode_secret(secret: &str) -> Result<Vec<u8>, TotpError> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let key = BASE32_NOPAD
        .decode(normalized.as_bytes())
        .map_err(|_| TotpError::InvalidSecret)?;

    if key.is_empty() {
        return Err(TotpError::InvalidSecret);
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    // base32 of the RFC 6238 appendix B ASCII secret "12345678901234567890"
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn rfc6238_sha1_vectors() {
        // Appendix B values truncated from 8 to 6 digits.
        let cases = [
            (59u64, "287082"),
            (1111111109, "081804"),
            (1111111111, "050471"),
            (1234567890, "005924"),
            (2000000000, "279037"),
            (20000000000, "353130"),
        ];
        for (time, expected) in cases {
            assert_eq!(totp_at(RFC_SECRET, time).unwrap(), expected, "T={time}");
        }
    }

    #[test]
    fn same_window_same_code() {
        let a = totp_at(RFC_SECRET, 1111111100).unwrap();
        let b = totp_at(RFC_SECRET, 1111111109).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn window_rollover_changes_code() {
        let a = totp_at(RFC_SECRET, 1111111109).unwrap();
        let b = totp_at(RFC_SECRET, 1111111111).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tolerates_lowercase_spaces_and_padding() {
        let padded = "gezd gnbv gy3t qojq gezd gnbv gy3t qojq====";
        assert_eq!(
            totp_at(padded, 59).unwrap(),
            totp_at(RFC_SECRET, 59).unwrap()
        );
    }

    #[test]
    fn malformed_secret_is_rejected() {
        assert!(matches!(
            totp_at("definitely!not@base32", 59),
            Err(TotpError::InvalidSecret)
        ));
        assert!(matches!(totp_at("", 59), Err(TotpError::InvalidSecret)));
        assert!(matches!(totp_at("=====", 59), Err(TotpError::InvalidSecret)));
    }

    #[test]
    fn codes_are_always_six_digits() {
        for t in (0..3000u64).step_by(30) {
            let code = totp_at(RFC_SECRET, t).unwrap();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
