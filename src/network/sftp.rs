//! SSH/SFTP filesystem
//!
//! Backs the `sftp` adaptor with a blocking libssh2 session.

use crate::config::{AdaptorProperties, Credential};
use crate::error::{GridError, Result};
use crate::fs::{DirEntry, FileSystem, ObjectId, PathAttributes};
use ssh2::{
    CheckResult, ErrorCode, FileStat, KnownHostFileKind, OpenFlags, OpenType, Session, Sftp,
};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const ADAPTOR: &str = "sftp";
const DEFAULT_PORT: u16 = 22;

// LIBSSH2_FX_NO_SUCH_FILE
const SFTP_NO_SUCH_FILE: i32 = 2;

/// Parsed `[user@]host[:port]` location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SftpLocation {
    /// Username embedded in the location
    pub user: Option<String>,
    /// Hostname or IP address
    pub host: String,
    /// Port embedded in the location
    pub port: Option<u16>,
}

impl SftpLocation {
    /// Parse a location string
    pub fn parse(location: &str) -> Result<Self> {
        let (user, host_port) = match location.split_once('@') {
            Some((user, rest)) if !user.is_empty() => (Some(user.to_string()), rest),
            Some((_, rest)) => (None, rest),
            None => (None, location),
        };

        let (host, port) = match host_port.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    GridError::connection(ADAPTOR, location, format!("Invalid port '{}'", port))
                })?;
                (host, Some(port))
            }
            None => (host_port, None),
        };

        if host.is_empty() {
            return Err(GridError::connection(ADAPTOR, location, "Missing host"));
        }

        Ok(Self {
            user,
            host: host.to_string(),
            port,
        })
    }
}

/// Remote filesystem reached over SFTP
pub struct SftpFileSystem {
    session: Session,
    sftp: Sftp,
    location: String,
    /// `sftp://user@host:port`, shared by every connection to the same account
    store: String,
    closed: bool,
}

impl SftpFileSystem {
    /// Connect and authenticate to `location`
    pub fn connect(
        location: &str,
        credential: &Credential,
        properties: &AdaptorProperties,
    ) -> Result<Self> {
        let parsed = SftpLocation::parse(location)?;
        let port = match properties.get_parsed::<u16>("port")? {
            Some(port) => port,
            None => parsed.port.unwrap_or(DEFAULT_PORT),
        };
        let user = parsed
            .user
            .clone()
            .unwrap_or_else(|| credential.username().to_string());

        let addr = format!("{}:{}", parsed.host, port);
        debug!("Connecting to {}", addr);
        let tcp = TcpStream::connect(&addr)
            .map_err(|e| GridError::connection(ADAPTOR, location, e.to_string()))?;

        let mut session =
            Session::new().map_err(|e| GridError::connection(ADAPTOR, location, e.to_string()))?;

        if let Some(secs) = properties.get_parsed::<u64>("connect-timeout")? {
            let millis = Duration::from_secs(secs).as_millis().min(u32::MAX as u128) as u32;
            session.set_timeout(millis);
        }

        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| GridError::connection(ADAPTOR, location, e.to_string()))?;

        if properties
            .get_parsed::<bool>("strict-host-key-checking")?
            .unwrap_or(false)
        {
            Self::verify_host_key(&session, &parsed.host, port, location)?;
        }

        Self::authenticate(&session, &user, credential, location)?;

        let sftp = session
            .sftp()
            .map_err(|e| GridError::connection(ADAPTOR, location, e.to_string()))?;

        info!("Connected to {} as {}", addr, user);

        Ok(Self {
            session,
            sftp,
            location: location.to_string(),
            store: format!("sftp://{}@{}:{}", user, parsed.host, port),
            closed: false,
        })
    }

    /// Check the server key against ~/.ssh/known_hosts
    fn verify_host_key(session: &Session, host: &str, port: u16, location: &str) -> Result<()> {
        let (key, _) = session
            .host_key()
            .ok_or_else(|| GridError::connection(ADAPTOR, location, "Server sent no host key"))?;

        let mut known_hosts = session
            .known_hosts()
            .map_err(|e| GridError::connection(ADAPTOR, location, e.to_string()))?;

        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let file = PathBuf::from(home).join(".ssh").join("known_hosts");
        known_hosts
            .read_file(&file, KnownHostFileKind::OpenSSH)
            .map_err(|e| GridError::connection(ADAPTOR, location, e.to_string()))?;

        match known_hosts.check_port(host, port, key) {
            CheckResult::Match => Ok(()),
            CheckResult::NotFound => Err(GridError::connection(
                ADAPTOR,
                location,
                "Host key not found in known_hosts",
            )),
            CheckResult::Mismatch => Err(GridError::connection(
                ADAPTOR,
                location,
                "Host key does not match known_hosts",
            )),
            CheckResult::Failure => Err(GridError::connection(
                ADAPTOR,
                location,
                "Host key check failed",
            )),
        }
    }

    /// Authenticate with the remote host
    fn authenticate(
        session: &Session,
        user: &str,
        credential: &Credential,
        location: &str,
    ) -> Result<()> {
        match credential {
            Credential::Certificate {
                certfile,
                passphrase,
                ..
            } => {
                session
                    .userauth_pubkey_file(user, None, certfile, passphrase.as_deref())
                    .map_err(|e| GridError::auth(ADAPTOR, user, location, e.to_string()))?;
            }
            Credential::Password { password, .. } => {
                session
                    .userauth_password(user, password)
                    .map_err(|e| GridError::auth(ADAPTOR, user, location, e.to_string()))?;
            }
            Credential::Default { .. } => {
                let mut agent = session
                    .agent()
                    .map_err(|e| GridError::auth(ADAPTOR, user, location, e.to_string()))?;

                agent
                    .connect()
                    .map_err(|e| GridError::auth(ADAPTOR, user, location, e.to_string()))?;

                agent
                    .list_identities()
                    .map_err(|e| GridError::auth(ADAPTOR, user, location, e.to_string()))?;

                let identities = agent.identities().unwrap_or_default();
                let authenticated = identities
                    .iter()
                    .any(|identity| agent.userauth(user, identity).is_ok());

                if !authenticated {
                    return Err(GridError::auth(
                        ADAPTOR,
                        user,
                        location,
                        "No valid SSH key found in agent",
                    ));
                }
            }
        }

        if !session.authenticated() {
            return Err(GridError::auth(
                ADAPTOR,
                user,
                location,
                "Authentication failed",
            ));
        }

        Ok(())
    }

    fn attributes_of(stat: &FileStat, is_symbolic_link: bool) -> PathAttributes {
        PathAttributes {
            is_directory: stat.is_dir(),
            is_regular_file: stat.is_file(),
            is_symbolic_link,
            size: stat.size.unwrap_or(0),
        }
    }

    fn is_not_found(err: &ssh2::Error) -> bool {
        matches!(err.code(), ErrorCode::SFTP(SFTP_NO_SUCH_FILE))
    }

    fn failed(context: String, err: ssh2::Error) -> GridError {
        GridError::transfer(ADAPTOR, context, std::io::Error::from(err))
    }
}

impl FileSystem for SftpFileSystem {
    fn adaptor(&self) -> &str {
        ADAPTOR
    }

    fn location(&self) -> Option<&str> {
        Some(&self.location)
    }

    fn attributes(&self, path: &Path) -> Result<Option<PathAttributes>> {
        let link = match self.sftp.lstat(path) {
            Ok(stat) => stat,
            Err(e) if Self::is_not_found(&e) => return Ok(None),
            Err(e) => {
                return Err(Self::failed(
                    format!("Failed to get attributes of '{}'", path.display()),
                    e,
                ))
            }
        };

        let is_symbolic_link = link.file_type().is_symlink();
        let stat = if is_symbolic_link {
            self.sftp.stat(path).unwrap_or(link)
        } else {
            link
        };

        Ok(Some(Self::attributes_of(&stat, is_symbolic_link)))
    }

    fn object_id(&self, path: &Path) -> Result<Option<ObjectId>> {
        match self.sftp.realpath(path) {
            Ok(canonical) => Ok(Some(ObjectId {
                store: self.store.clone(),
                path: canonical,
            })),
            Err(e) if Self::is_not_found(&e) => Ok(None),
            Err(e) => Err(Self::failed(
                format!("Failed to resolve '{}'", path.display()),
                e,
            )),
        }
    }

    fn list(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entries = self.sftp.readdir(path).map_err(|e| GridError::ListFailed {
            adaptor: ADAPTOR.to_string(),
            path: path.display().to_string(),
            source: std::io::Error::from(e),
        })?;

        Ok(entries
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path.file_name()?.to_string_lossy().to_string();
                if name == "." || name == ".." {
                    return None;
                }
                let is_symbolic_link = stat.file_type().is_symlink();
                let stat = if is_symbolic_link {
                    self.sftp.stat(&entry_path).unwrap_or(stat)
                } else {
                    stat
                };
                Some(DirEntry {
                    name,
                    attributes: Self::attributes_of(&stat, is_symbolic_link),
                })
            })
            .collect())
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + '_>> {
        let file = self
            .sftp
            .open(path)
            .map_err(|e| {
                Self::failed(format!("Failed to open '{}' for reading", path.display()), e)
            })?;
        Ok(Box::new(file))
    }

    fn open_write(&self, path: &Path, replace: bool) -> Result<Box<dyn Write + '_>> {
        let flags = if replace {
            OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::TRUNCATE
        } else {
            OpenFlags::WRITE | OpenFlags::CREATE | OpenFlags::EXCLUSIVE
        };

        if !replace && self.attributes(path)?.is_some() {
            return Err(GridError::target_exists(ADAPTOR, path.display().to_string()));
        }

        let file = self
            .sftp
            .open_mode(path, flags, 0o644, OpenType::File)
            .map_err(|e| {
                Self::failed(format!("Failed to open '{}' for writing", path.display()), e)
            })?;
        Ok(Box::new(file))
    }

    fn create_dir(&self, path: &Path) -> Result<()> {
        if self.attributes(path)?.is_some() {
            return Err(GridError::target_exists(ADAPTOR, path.display().to_string()));
        }
        self.sftp
            .mkdir(path, 0o755)
            .map_err(|e| {
                Self::failed(format!("Failed to create directory '{}'", path.display()), e)
            })
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        self.sftp.rename(from, to, None).map_err(|e| {
            Self::failed(
                format!("Failed to rename '{}' to '{}'", from.display(), to.display()),
                e,
            )
        })
    }

    fn delete(&self, path: &Path) -> Result<()> {
        let attrs = self
            .attributes(path)?
            .ok_or_else(|| GridError::source_not_found(ADAPTOR, path.display().to_string()))?;

        let result = if attrs.is_directory && !attrs.is_symbolic_link {
            self.sftp.rmdir(path)
        } else {
            self.sftp.unlink(path)
        };
        result.map_err(|e| Self::failed(format!("Failed to delete '{}'", path.display()), e))
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Err(GridError::unsupported(ADAPTOR, "close of a closed filesystem"));
        }
        self.closed = true;
        debug!("Disconnecting from {}", self.location);
        self.session
            .disconnect(None, "closing", None)
            .map_err(|e| GridError::connection(ADAPTOR, &self.location, e.to_string()))
    }
}
