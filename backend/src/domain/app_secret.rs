//! Webhook secret generation and sealing for apps.
//!
//! Secrets are sealed with AES-256-GCM. The 12-byte nonce doubles as the
//! stored initialisation vector, so an app whose IV is already set is treated
//! as having a secret and nothing new is generated.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::{Rng, RngCore, distributions::Alphanumeric};
use zeroize::Zeroizing;

use super::app::NewApp;

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 12;
const SECRET_LENGTH: usize = 32;

/// Failures while handling sealed secrets.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SecretError {
    /// The configured key is not 32 bytes.
    #[error("encryption key must be {KEY_SIZE} bytes, got {0}")]
    InvalidKeyLength(usize),
    /// The stored IV has the wrong size.
    #[error("initialisation vector must be {NONCE_SIZE} bytes, got {0}")]
    InvalidNonceLength(usize),
    /// The cipher rejected the input.
    #[error("cipher failure: {0}")]
    Cipher(String),
    /// A decrypted secret was not UTF-8.
    #[error("decrypted secret is not valid UTF-8")]
    NotUtf8,
}

/// AES-256 key used to seal app secrets.
///
/// The key bytes are wiped on drop.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<[u8; KEY_SIZE]>);

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

impl SecretKey {
    /// Wrap raw key bytes.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Parse a configured key.
    ///
    /// A 32-character value is taken as raw key material; anything else must
    /// be base64 for exactly 32 bytes.
    ///
    /// # Errors
    /// Returns [`SecretError::InvalidKeyLength`] when neither form yields 32
    /// bytes.
    ///
    /// # Examples
    /// ```
    /// use ship_backend::domain::SecretKey;
    ///
    /// assert!(SecretKey::parse("0123456789abcdef0123456789abcdef").is_ok());
    /// assert!(SecretKey::parse("short").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, SecretError> {
        let raw = value.as_bytes();
        if raw.len() == KEY_SIZE {
            return Self::from_slice(raw);
        }
        let decoded = Zeroizing::new(
            BASE64
                .decode(value.trim())
                .map_err(|_| SecretError::InvalidKeyLength(raw.len()))?,
        );
        Self::from_slice(&decoded)
    }

    fn from_slice(bytes: &[u8]) -> Result<Self, SecretError> {
        let array: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| SecretError::InvalidKeyLength(bytes.len()))?;
        Ok(Self::from_bytes(array))
    }

    fn cipher(&self) -> Result<Aes256Gcm, SecretError> {
        Aes256Gcm::new_from_slice(self.0.as_slice()).map_err(|err| SecretError::Cipher(err.to_string()))
    }

    /// Seal `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    /// Returns [`SecretError::Cipher`] if encryption fails.
    pub fn seal(&self, plaintext: &str) -> Result<SealedSecret, SecretError> {
        let mut nonce = [0_u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce);
        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|err| SecretError::Cipher(err.to_string()))?;
        Ok(SealedSecret {
            ciphertext,
            iv: nonce.to_vec(),
        })
    }

    /// Recover the plaintext of a sealed secret.
    ///
    /// # Errors
    /// Fails on a malformed IV, a wrong key, or tampered ciphertext.
    pub fn open(&self, ciphertext: &[u8], iv: &[u8]) -> Result<Zeroizing<String>, SecretError> {
        if iv.len() != NONCE_SIZE {
            return Err(SecretError::InvalidNonceLength(iv.len()));
        }
        let plaintext = Zeroizing::new(
            self.cipher()?
                .decrypt(Nonce::from_slice(iv), ciphertext)
                .map_err(|err| SecretError::Cipher(err.to_string()))?,
        );
        let text = std::str::from_utf8(&plaintext).map_err(|_| SecretError::NotUtf8)?;
        Ok(Zeroizing::new(text.to_owned()))
    }
}

/// Ciphertext plus the nonce it was sealed with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    /// AES-GCM ciphertext including the tag.
    pub ciphertext: Vec<u8>,
    /// 12-byte nonce.
    pub iv: Vec<u8>,
}

/// Random alphanumeric webhook secret.
pub fn generate_secret() -> Zeroizing<String> {
    Zeroizing::new(
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SECRET_LENGTH)
            .map(char::from)
            .collect(),
    )
}

/// Give a new app a sealed secret unless its IV was supplied.
///
/// # Errors
/// Propagates sealing failures.
pub fn ensure_secret(draft: &mut NewApp, key: &SecretKey) -> Result<(), SecretError> {
    if draft.encrypted_secret_iv.is_some() {
        return Ok(());
    }
    let secret = generate_secret();
    let sealed = key.seal(&secret)?;
    draft.encrypted_secret = Some(sealed.ciphertext);
    draft.encrypted_secret_iv = Some(sealed.iv);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn key() -> SecretKey {
        SecretKey::from_bytes([7_u8; KEY_SIZE])
    }

    fn draft() -> NewApp {
        NewApp {
            app_slug: "slug".into(),
            plan: "free".into(),
            api_token: "token".into(),
            ..NewApp::default()
        }
    }

    #[rstest]
    fn seal_then_open_recovers_plaintext(key: SecretKey) {
        let sealed = key.seal("hush").expect("seal");
        assert_eq!(sealed.iv.len(), NONCE_SIZE);
        let opened = key.open(&sealed.ciphertext, &sealed.iv).expect("open");
        assert_eq!(opened.as_str(), "hush");
    }

    #[rstest]
    fn open_with_other_key_fails(key: SecretKey) {
        let sealed = key.seal("hush").expect("seal");
        let other = SecretKey::from_bytes([8_u8; KEY_SIZE]);
        assert!(matches!(
            other.open(&sealed.ciphertext, &sealed.iv),
            Err(SecretError::Cipher(_))
        ));
    }

    #[rstest]
    fn parse_accepts_base64_key() {
        let encoded = BASE64.encode([1_u8; KEY_SIZE]);
        assert!(SecretKey::parse(&encoded).is_ok());
    }

    #[rstest]
    fn generated_secret_is_alphanumeric() {
        let secret = generate_secret();
        assert_eq!(secret.len(), SECRET_LENGTH);
        assert!(secret.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[rstest]
    fn ensure_secret_populates_missing_secret(key: SecretKey) {
        let mut app = draft();
        ensure_secret(&mut app, &key).expect("seal");
        let (Some(ciphertext), Some(iv)) = (&app.encrypted_secret, &app.encrypted_secret_iv) else {
            panic!("secret should be populated");
        };
        let opened = key.open(ciphertext, iv).expect("open");
        assert_eq!(opened.len(), SECRET_LENGTH);
    }

    #[rstest]
    fn ensure_secret_skips_when_iv_supplied(key: SecretKey) {
        let mut app = NewApp {
            encrypted_secret_iv: Some(vec![0; NONCE_SIZE]),
            ..draft()
        };
        ensure_secret(&mut app, &key).expect("no-op");
        assert!(app.encrypted_secret.is_none());
        assert_eq!(app.encrypted_secret_iv, Some(vec![0; NONCE_SIZE]));
    }
}
