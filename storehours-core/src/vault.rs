//! Two-hop credential unwrapping.
//!
//! A section stores `user`, `pwd` and `token`. `token` is the RC4 ciphertext
//! of an intermediate key under `[MAIN] GLOBAL`; `pwd` is the RC4 ciphertext
//! of the password under that intermediate key. Both are hex encoded.
//!
//! Decrypted bytes are read as Latin-1 characters; the intermediate key is
//! then fed back to RC4 as its UTF-8 encoding.

use zeroize::Zeroizing;

use crate::cipher::{bytes_to_latin1, latin1_to_bytes, Rc4};
use crate::config::ConfigStore;
use crate::error::{CoreError, CryptoError, SealError};
use crate::types::Credentials;

pub const MAIN_SECTION: &str = "MAIN";
pub const GLOBAL_KEY: &str = "GLOBAL";

/// Decrypts credentials stored in a [`ConfigStore`].
#[derive(Debug, Clone, Copy)]
pub struct CredentialVault<'a> {
    config: &'a ConfigStore,
}

impl<'a> CredentialVault<'a> {
    pub fn new(config: &'a ConfigStore) -> Self {
        Self { config }
    }

    /// Unwrap the login/password pair stored in `section`.
    pub fn credentials(&self, section: &str) -> Result<Credentials, CoreError> {
        let login = self.config.get_text(section, "user")?;
        let hex_pwd = Zeroizing::new(self.config.get_text(section, "pwd")?);
        let hex_token = Zeroizing::new(self.config.get_text(section, "token")?);
        let global = Zeroizing::new(self.config.get_text(MAIN_SECTION, GLOBAL_KEY)?);

        let intermediate = Zeroizing::new(decrypt_hex(
            global.as_bytes(),
            &hex_token,
            (MAIN_SECTION, GLOBAL_KEY),
            (section, "token"),
        )?);
        let password = decrypt_hex(
            intermediate.as_bytes(),
            &hex_pwd,
            (section, "token"),
            (section, "pwd"),
        )?;

        tracing::debug!("unwrapped credentials for [{section}]");
        Ok(Credentials::new(login, password))
    }
}

/// Hex-decode `ciphertext` and decrypt it with `key`, returning Latin-1 text.
///
/// `key_origin` and `value_origin` name the config entries involved, for
/// error messages.
fn decrypt_hex(
    key: &[u8],
    ciphertext: &str,
    key_origin: (&str, &str),
    value_origin: (&str, &str),
) -> Result<String, CryptoError> {
    let sealed = hex::decode(ciphertext.trim()).map_err(|source| CryptoError::Hex {
        section: value_origin.0.to_string(),
        key: value_origin.1.to_string(),
        source,
    })?;
    let plain = Zeroizing::new(Rc4::apply(key, &sealed).ok_or_else(|| CryptoError::EmptyKey {
        section: key_origin.0.to_string(),
        key: key_origin.1.to_string(),
    })?);
    Ok(bytes_to_latin1(&plain))
}

/// Hex values to store as `token` and `pwd` for one config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedSecret {
    pub token: String,
    pub pwd: String,
}

/// Inverse of [`CredentialVault::credentials`]: wrap `password` under
/// `intermediate_key`, and `intermediate_key` under `global`.
///
/// Both `intermediate_key` and `password` must be Latin-1 text.
pub fn seal(global: &str, intermediate_key: &str, password: &str) -> Result<SealedSecret, SealError> {
    let key_bytes = Zeroizing::new(
        latin1_to_bytes(intermediate_key).ok_or(SealError::NotLatin1("intermediate key"))?,
    );
    let pwd_bytes =
        Zeroizing::new(latin1_to_bytes(password).ok_or(SealError::NotLatin1("password"))?);

    let token = Rc4::apply(global.as_bytes(), &key_bytes).ok_or(SealError::EmptyKey("global"))?;
    let pwd = Rc4::apply(intermediate_key.as_bytes(), &pwd_bytes)
        .ok_or(SealError::EmptyKey("intermediate key"))?;

    Ok(SealedSecret {
        token: hex::encode(token),
        pwd: hex::encode(pwd),
    })
}
