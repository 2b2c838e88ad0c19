//! Time-based one-time password engine (HMAC-SHA1, 30-second steps,
//! 6 digits).
//!
//! Secrets are 160-bit random values carried as unpadded RFC 4648 Base32.
//! The gateway never stores them; persistence belongs to the identity
//! service.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use base32::Alphabet;
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha1::Sha1;
use subtle::ConstantTimeEq;

const SECRET_BYTES: usize = 20;
const TIME_STEP_SECONDS: u64 = 30;
const CODE_DIGITS: u32 = 6;
const ALPHABET: Alphabet = Alphabet::Rfc4648 { padding: false };

/// Generate a fresh 160-bit secret, Base32-encoded.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    base32::encode(ALPHABET, &bytes)
}

/// The code valid for the current 30-second step.
///
/// # Errors
/// Returns an error when the secret is not valid Base32 or the HMAC cannot
/// be keyed. A failure here means "cannot validate", never "code invalid".
pub fn current_code(secret: &str) -> Result<String> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before Unix epoch")?
        .as_secs();
    code_at(secret, now)
}

/// The code valid at `unix_seconds`.
pub fn code_at(secret: &str, unix_seconds: u64) -> Result<String> {
    let key = decode_secret(secret)?;
    let counter = unix_seconds / TIME_STEP_SECONDS;

    let mut mac = Hmac::<Sha1>::new_from_slice(&key)
        .map_err(|e| anyhow!("HMAC init failure: {e}"))?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamic truncation: low 4 bits of the last byte select the offset.
    let offset = (digest[19] & 0x0f) as usize;
    let binary = ((u32::from(digest[offset]) & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);

    Ok(format!("{:06}", binary % 10u32.pow(CODE_DIGITS)))
}

/// True iff `submitted` equals the code for the exact current step.
///
/// Adjacent steps are deliberately not accepted; a client whose clock has
/// drifted past the step boundary must retry with a fresh code.
pub fn validate(secret: &str, submitted: &str) -> Result<bool> {
    let expected = current_code(secret)?;
    Ok(expected.as_bytes().ct_eq(submitted.as_bytes()).into())
}

/// Provisioning URI consumed by authenticator apps.
pub fn otpauth_url(identifier: &str, secret: &str, issuer: &str) -> String {
    format!("otpauth://totp/{issuer}:{identifier}?secret={secret}&issuer={issuer}")
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    base32::decode(ALPHABET, secret)
        .ok_or_else(|| anyhow!("second-factor secret is not valid base32"))
}
