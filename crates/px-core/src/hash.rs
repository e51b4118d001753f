//! Password hashing
//!
//! The credential file stores `crypt(3)`-style SHA-512 hashes
//! (`$6$<salt>$<hash>`). [`Sha512Crypt`] produces them through `sha-crypt`
//! so existing credential files verify byte-for-byte. Other schemes plug in
//! through [`PasswordHasher`].

use sha_crypt::{sha512_crypt_b64, Sha512Params, ROUNDS_DEFAULT, ROUNDS_MAX, ROUNDS_MIN};

use crate::error::CredentialError;

/// Default salt setting used when none is configured
pub const DEFAULT_SALT: &str = "$6$myS4ltStr1ng$";

const PREFIX: &str = "$6$";
const ROUNDS_PREFIX: &str = "rounds=";
const SALT_MAX: usize = 16;

/// A salted one-way password transformation
pub trait PasswordHasher: Send + Sync {
    /// Hash `password`; the result is compared verbatim against stored hashes
    fn hash(&self, password: &str) -> Result<String, CredentialError>;
}

/// SHA-512 based `crypt(3)` (`$6$`) with a fixed salt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sha512Crypt {
    salt: String,
    rounds: Option<usize>,
}

impl Sha512Crypt {
    /// Parse a salt setting such as `$6$salt$` or `$6$rounds=10000$salt`
    ///
    /// The salt must be ASCII. It ends at the next `$` and is cut to 16 bytes.
    pub fn new(setting: &str) -> Result<Self, CredentialError> {
        let rest = setting.strip_prefix(PREFIX).ok_or_else(|| {
            CredentialError::Hash(format!("unsupported salt setting {:?}", setting))
        })?;

        let (rounds, rest) = match rest.strip_prefix(ROUNDS_PREFIX) {
            Some(tail) => {
                let (digits, tail) = tail.split_once('$').ok_or_else(|| {
                    CredentialError::Hash(format!("unterminated rounds in {:?}", setting))
                })?;
                let rounds: u64 = digits.parse().map_err(|_| {
                    CredentialError::Hash(format!("invalid rounds {:?}", digits))
                })?;
                let rounds = rounds.clamp(ROUNDS_MIN as u64, ROUNDS_MAX as u64) as usize;
                (Some(rounds), tail)
            }
            None => (None, rest),
        };

        let salt = rest.split('$').next().unwrap_or_default();
        if !salt.is_ascii() {
            return Err(CredentialError::Hash(format!(
                "salt must be ASCII: {:?}",
                salt
            )));
        }
        let salt = salt[..salt.len().min(SALT_MAX)].to_string();

        Ok(Self { salt, rounds })
    }
}

impl Default for Sha512Crypt {
    fn default() -> Self {
        Self {
            salt: "myS4ltStr1ng".to_string(),
            rounds: None,
        }
    }
}

impl PasswordHasher for Sha512Crypt {
    fn hash(&self, password: &str) -> Result<String, CredentialError> {
        let params = Sha512Params::new(self.rounds.unwrap_or(ROUNDS_DEFAULT))
            .map_err(|e| CredentialError::Hash(format!("invalid rounds: {:?}", e)))?;
        let encoded = sha512_crypt_b64(password.as_bytes(), self.salt.as_bytes(), &params)
            .map_err(|e| CredentialError::Hash(format!("{:?}", e)))?;

        let mut out = String::from(PREFIX);
        if let Some(rounds) = self.rounds {
            out.push_str(&format!("{}{}$", ROUNDS_PREFIX, rounds));
        }
        out.push_str(&self.salt);
        out.push('$');
        out.push_str(&encoded);
        Ok(out)
    }
}
