//! Credentials for opening filesystems
//!
//! Built once from the command-line flags and handed to the adaptor that
//! opens a filesystem. Local adaptors ignore them.

use std::path::PathBuf;

/// Credential used to authenticate against a location
#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    /// Username only, the adaptor picks its default mechanism (e.g. SSH agent)
    Default {
        /// Username
        username: String,
    },
    /// Username and password
    Password {
        /// Username
        username: String,
        /// Password
        password: String,
    },
    /// Private key file with optional passphrase
    Certificate {
        /// Username
        username: String,
        /// Private key file
        certfile: PathBuf,
        /// Passphrase of the key
        passphrase: Option<String>,
    },
}

impl Credential {
    /// Build a credential from optional flags.
    ///
    /// A certificate file wins over a password, which wins over the default
    /// mechanism. A missing username falls back to the current user.
    pub fn from_parts(
        username: Option<String>,
        password: Option<String>,
        certfile: Option<PathBuf>,
    ) -> Self {
        let username = username.unwrap_or_else(current_user);
        match (certfile, password) {
            (Some(certfile), passphrase) => Self::Certificate {
                username,
                certfile,
                passphrase,
            },
            (None, Some(password)) => Self::Password { username, password },
            (None, None) => Self::Default { username },
        }
    }

    /// Username of this credential
    pub fn username(&self) -> &str {
        match self {
            Self::Default { username }
            | Self::Password { username, .. }
            | Self::Certificate { username, .. } => username,
        }
    }

    /// Short name of the credential kind, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Default { .. } => "default",
            Self::Password { .. } => "password",
            Self::Certificate { .. } => "certificate",
        }
    }
}

impl Default for Credential {
    fn default() -> Self {
        Self::Default {
            username: current_user(),
        }
    }
}

// Secrets stay out of logs and panics.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default { username } => {
                f.debug_struct("Default").field("username", username).finish()
            }
            Self::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Certificate {
                username, certfile, ..
            } => f
                .debug_struct("Certificate")
                .field("username", username)
                .field("certfile", certfile)
                .finish(),
        }
    }
}

/// Name of the user running the process
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_default()
}
