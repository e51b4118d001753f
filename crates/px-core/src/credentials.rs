//! Credential store
//!
//! Loads `username password_hash` pairs from a plain text file. One record
//! per line, tokens separated by whitespace. The first two tokens of a line
//! form the record and anything after them is ignored; lines with fewer than
//! two tokens are skipped.

use std::fs;
use std::io;
use std::path::Path;

use crate::error::CredentialError;
use crate::hash::PasswordHasher;

/// A single username/password-hash pair
#[derive(Debug, Clone, PartialEq, Eq)]
struct CredentialRecord {
    username: String,
    password_hash: String,
}

/// Read-only list of credential records
///
/// Usernames are not required to be unique; lookup is a linear scan that
/// matches the `(username, hash)` pair exactly.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    records: Vec<CredentialRecord>,
}

impl CredentialStore {
    /// Load the store from a credential file
    pub fn load(path: &Path) -> Result<Self, CredentialError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(CredentialError::NotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(CredentialError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let store = Self::parse(&contents);
        tracing::info!("Loaded {} credential records from {:?}", store.len(), path);
        Ok(store)
    }

    /// Build a store from credential file contents
    pub fn parse(contents: &str) -> Self {
        let mut records = Vec::new();

        for (index, line) in contents.lines().enumerate() {
            let mut tokens = line.split_whitespace();
            match (tokens.next(), tokens.next()) {
                (Some(username), Some(password_hash)) => records.push(CredentialRecord {
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                }),
                _ => {
                    tracing::debug!("Skipping malformed credential line {}", index + 1);
                }
            }
        }

        Self { records }
    }

    /// Check a username/password pair
    ///
    /// Hashes `password` with `hasher` and looks for a record whose username
    /// and hash both match exactly.
    pub fn lookup(
        &self,
        username: &str,
        password: &str,
        hasher: &dyn PasswordHasher,
    ) -> Result<bool, CredentialError> {
        let hash = hasher.hash(password)?;
        Ok(self
            .records
            .iter()
            .any(|r| r.username == username && r.password_hash == hash))
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::Sha512Crypt;
    use tempfile::tempdir;

    /// Reversible stand-in so tests can state hashes literally
    struct PrefixHasher;

    impl PasswordHasher for PrefixHasher {
        fn hash(&self, password: &str) -> Result<String, CredentialError> {
            Ok(format!("h:{}", password))
        }
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let store = CredentialStore::parse(
            "alice h:wonderland\n\
             \n\
             bob\n\
             \tdave   h:secret  \n",
        );
        assert_eq!(store.len(), 2);
        assert!(store.lookup("alice", "wonderland", &PrefixHasher).unwrap());
        assert!(store.lookup("dave", "secret", &PrefixHasher).unwrap());
        assert!(!store.lookup("bob", "", &PrefixHasher).unwrap());
    }

    #[test]
    fn test_parse_uses_first_two_tokens() {
        let store = CredentialStore::parse("carol h:x # admin\nerin h:y extra\n");
        assert_eq!(store.len(), 2);
        assert!(store.lookup("carol", "x", &PrefixHasher).unwrap());
        assert!(store.lookup("erin", "y", &PrefixHasher).unwrap());
        assert!(!store.lookup("carol", "#", &PrefixHasher).unwrap());
    }

    #[test]
    fn test_lookup_requires_exact_pair() {
        let store = CredentialStore::parse("alice h:one\nbob h:two\n");
        assert!(store.lookup("alice", "one", &PrefixHasher).unwrap());
        assert!(!store.lookup("alice", "two", &PrefixHasher).unwrap());
        assert!(!store.lookup("Alice", "one", &PrefixHasher).unwrap());
        assert!(!store.lookup("carol", "one", &PrefixHasher).unwrap());
    }

    #[test]
    fn test_duplicate_usernames_are_kept() {
        let store = CredentialStore::parse("alice h:one\nalice h:two\n");
        assert_eq!(store.len(), 2);
        assert!(store.lookup("alice", "one", &PrefixHasher).unwrap());
        assert!(store.lookup("alice", "two", &PrefixHasher).unwrap());
    }

    #[test]
    fn test_load_from_file_with_crypt_hashes() {
        let hasher = Sha512Crypt::default();
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("passwords.txt");
        let contents = format!("admin {}\n", hasher.hash("letmein").unwrap());
        fs::write(&path, contents).expect("Failed to write credentials");

        let store = CredentialStore::load(&path).expect("Failed to load credentials");
        assert_eq!(store.len(), 1);
        assert!(store.lookup("admin", "letmein", &hasher).unwrap());
        assert!(!store.lookup("admin", "letmeout", &hasher).unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let result = CredentialStore::load(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(CredentialError::NotFound(_))));
    }

    #[test]
    fn test_empty_store() {
        let store = CredentialStore::parse("");
        assert!(store.is_empty());
        assert!(!store.lookup("anyone", "anything", &PrefixHasher).unwrap());
    }
}
