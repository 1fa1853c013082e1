//! Key material: bech32 `nsec`/`npub` and raw hex.

use crate::{Error, Result};
use bech32::{Bech32, Hrp};
use once_cell::sync::Lazy;
use secp256k1::{All, Keypair, Secp256k1, SecretKey};
use std::fmt;

/// Shared secp256k1 context.
pub(super) static SECP: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

const NSEC_HRP: &str = "nsec";
const NPUB_HRP: &str = "npub";

/// Decodes a bech32 string and checks its human-readable part.
fn decode_bech32(expected_hrp: &str, value: &str) -> Result<Vec<u8>> {
    let (hrp, data) = bech32::decode(value)
        .map_err(|e| Error::InvalidInput(format!("bad bech32 '{expected_hrp}': {e}")))?;
    if hrp.to_lowercase() != expected_hrp {
        return Err(Error::InvalidInput(format!(
            "expected '{expected_hrp}' prefix, found '{}'",
            hrp.as_str()
        )));
    }
    if data.len() != 32 {
        return Err(Error::InvalidInput(format!(
            "expected 32 bytes in '{expected_hrp}', found {}",
            data.len()
        )));
    }
    Ok(data)
}

/// Decodes an `npub` into a lowercase hex public key.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `npub` is not a valid bech32 `npub`.
pub fn npub_to_hex(npub: &str) -> Result<String> {
    decode_bech32(NPUB_HRP, npub).map(hex::encode)
}

/// Encodes a hex public key as `npub`.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if `hex_key` is not 32 bytes of hex.
pub fn hex_to_npub(hex_key: &str) -> Result<String> {
    let bytes =
        hex::decode(hex_key).map_err(|e| Error::InvalidInput(format!("bad pubkey hex: {e}")))?;
    if bytes.len() != 32 {
        return Err(Error::InvalidInput(format!(
            "expected 32 byte pubkey, found {}",
            bytes.len()
        )));
    }
    let hrp = Hrp::parse(NPUB_HRP).map_err(|e| Error::operation("encode_npub", e))?;
    bech32::encode::<Bech32>(hrp, &bytes).map_err(|e| Error::operation("encode_npub", e))
}

/// The bot's signing identity.
///
/// `Debug` never prints the secret.
#[derive(Clone)]
pub struct Keys {
    keypair: Keypair,
    public_key_hex: String,
}

impl Keys {
    /// Parses a secret key given as `nsec` bech32 or 64 hex characters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the value is neither form or not a
    /// valid secp256k1 scalar.
    pub fn parse(secret: &str) -> Result<Self> {
        let secret = secret.trim();
        let bytes = if secret.to_lowercase().starts_with(NSEC_HRP) {
            decode_bech32(NSEC_HRP, secret)?
        } else {
            hex::decode(secret).map_err(|_| {
                Error::InvalidInput("secret key is neither nsec nor 64 hex characters".to_string())
            })?
        };

        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|e| Error::InvalidInput(format!("invalid secret key: {e}")))?;
        let keypair = Keypair::from_secret_key(&SECP, &secret_key);
        let (xonly, _parity) = keypair.x_only_public_key();

        Ok(Self {
            keypair,
            public_key_hex: hex::encode(xonly.serialize()),
        })
    }

    /// Lowercase hex x-only public key.
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        self.public_key_hex.clone()
    }

    /// Public key as `npub`.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn npub(&self) -> Result<String> {
        hex_to_npub(&self.public_key_hex)
    }

    pub(super) const fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl fmt::Debug for Keys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keys")
            .field("public_key", &self.public_key_hex)
            .finish_non_exhaustive()
    }
}
