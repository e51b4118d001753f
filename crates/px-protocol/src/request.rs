//! Client requests
//!
//! A request is one line: a verb followed by space-separated words. The verb
//! is matched case-insensitively.

use std::fmt;

use crate::error::ProtocolError;
use crate::limits::{MAX_CREDENTIAL_LENGTH, MAX_EXEC_ARG_LENGTH};

/// Request verbs understood by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// Close the session
    Goodbye,
    /// Authenticate with username and password
    User,
    /// Run a program on the server
    Exec,
}

impl Verb {
    /// Match a token against the known verbs, ignoring ASCII case
    pub fn from_token(token: &str) -> Option<Self> {
        [Verb::Goodbye, Verb::User, Verb::Exec]
            .into_iter()
            .find(|verb| token.eq_ignore_ascii_case(verb.as_str()))
    }

    /// Canonical spelling on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Goodbye => "GOODBYE",
            Verb::User => "USER",
            Verb::Exec => "EXEC",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Username and password carried by a `USER` request
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Keep passwords out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A parsed request line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// `GOODBYE`
    Goodbye,
    /// `USER <username> <password>`
    User(Credentials),
    /// `EXEC <words...>`, words not yet validated
    ///
    /// Validation happens after the authorization check, see
    /// [`ExecCommand::from_words`].
    Exec(Vec<String>),
    /// A known verb with unusable arguments
    Invalid { verb: Verb, reason: String },
    /// Empty line or unrecognized verb
    Unknown(String),
}

impl Request {
    /// Parse one request line (without its terminator)
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Request::Unknown(String::new());
        };

        match Verb::from_token(first) {
            Some(Verb::Goodbye) => Request::Goodbye,
            Some(Verb::User) => {
                let args: Vec<&str> = words.collect();
                match parse_credentials(&args) {
                    Ok(credentials) => Request::User(credentials),
                    Err(e) => Request::Invalid {
                        verb: Verb::User,
                        reason: e.to_string(),
                    },
                }
            }
            Some(Verb::Exec) => Request::Exec(words.map(String::from).collect()),
            None => Request::Unknown(first.to_string()),
        }
    }
}

fn parse_credentials(args: &[&str]) -> Result<Credentials, ProtocolError> {
    let [username, password] = args else {
        return Err(ProtocolError::ArgumentCount {
            verb: "USER",
            expected: "exactly 2".to_string(),
            actual: args.len(),
        });
    };

    for token in [username, password] {
        check_token(token, MAX_CREDENTIAL_LENGTH)?;
    }

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

fn check_token(token: &str, max: usize) -> Result<(), ProtocolError> {
    if token.len() > max {
        return Err(ProtocolError::TokenTooLong {
            size: token.len(),
            max,
        });
    }
    Ok(())
}

/// A validated `EXEC` invocation
///
/// Wire syntax is `EXEC <program> <argv0> [argv1..argvN]`. The first word
/// names the program to run and is never handed to the child; the child's
/// argument vector starts at the second word, so the second word becomes the
/// child's own `argv[0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCommand {
    program: String,
    argv: Vec<String>,
}

impl ExecCommand {
    /// Validate the words following the `EXEC` verb
    pub fn from_words(words: Vec<String>, max_args: usize) -> Result<Self, ProtocolError> {
        if words.len() < 2 || words.len() > max_args {
            return Err(ProtocolError::ArgumentCount {
                verb: "EXEC",
                expected: format!("2 to {}", max_args),
                actual: words.len(),
            });
        }

        for word in &words {
            check_token(word, MAX_EXEC_ARG_LENGTH)?;
        }

        let mut words = words.into_iter();
        let program = words.next().unwrap_or_default();
        Ok(Self {
            program,
            argv: words.collect(),
        })
    }

    /// Program path or name, looked up through `PATH` when it has no slash
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The child's complete argument vector, including its `argv[0]`
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl fmt::Display for ExecCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.program, self.argv.join(" "))
    }
}
