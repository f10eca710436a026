// totp.rs
// TOTP utilities: build a TOTP instance and generate Base32 secrets for staff logins.

use anyhow::Result;
use data_encoding::BASE32_NOPAD;
use rand::RngCore;
use totp_rs::{Algorithm, Secret, TOTP};

pub const ISSUER: &str = "QUICKBILL";
pub const MIN_SECRET_BYTES: usize = 16; // 128 bits
pub const DEFAULT_SECRET_BYTES: usize = 20; // 160 bits

/// TOTP for one staff member. Rejects secrets shorter than 128 bits once decoded.
pub fn build_totp(email: &str, base32_secret: &str) -> Result<TOTP> {
    let secret = Secret::Encoded(base32_secret.to_string()).to_bytes()?;
    if secret.len() < MIN_SECRET_BYTES {
        anyhow::bail!(
            "shared secret too short: {} bytes, need >= {}",
            secret.len(),
            MIN_SECRET_BYTES
        );
    }
    let totp = TOTP::new(
        Algorithm::SHA1,
        6,
        1, // ±1 step of clock drift
        30,
        secret,
        Some(ISSUER.to_string()),
        email.to_string(),
    )?;
    Ok(totp)
}

/// Random Base32 (NOPAD) secret of at least `MIN_SECRET_BYTES`.
pub fn generate_base32_secret_n(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes.max(MIN_SECRET_BYTES)];
    rand::rng().fill_bytes(&mut buf);
    BASE32_NOPAD.encode(&buf)
}

pub fn generate_base32_secret() -> String {
    generate_base32_secret_n(DEFAULT_SECRET_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_secret_builds_and_verifies() {
        let secret = generate_base32_secret();
        let totp = build_totp("finance@quickbill.local", &secret).unwrap();
        let code = totp.generate_current().unwrap();
        assert!(totp.check_current(&code).unwrap());
    }

    #[test]
    fn short_secrets_are_rejected() {
        let short = BASE32_NOPAD.encode(&[1u8; 8]);
        assert!(build_totp("a@b.c", &short).is_err());
    }

    #[test]
    fn secret_length_has_a_floor() {
        let secret = generate_base32_secret_n(4);
        assert_eq!(BASE32_NOPAD.decode(secret.as_bytes()).unwrap().len(), MIN_SECRET_BYTES);
    }
}
