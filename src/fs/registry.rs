//! Adaptor registry
//!
//! The supported adaptors are a closed set. The registry describes what
//! each one accepts (locations, properties, credentials) and opens
//! filesystems for them.

use crate::config::{AdaptorProperties, Credential};
use crate::error::{GridError, Result};
use crate::fs::{FileSystemHandle, LocalFileSystem};
use crate::network::SftpFileSystem;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Filesystem adaptor
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdaptorKind {
    /// Files on the local disk
    #[value(name = "file")]
    File,
    /// Local machine (files on the local disk)
    #[value(name = "local")]
    Local,
    /// Files on a remote host over SSH/SFTP
    #[value(name = "sftp")]
    Sftp,
}

impl AdaptorKind {
    /// All adaptors
    pub const ALL: [AdaptorKind; 3] = [Self::File, Self::Local, Self::Sftp];

    /// Name used on the command line and in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Local => "local",
            Self::Sftp => "sftp",
        }
    }

    /// Look up an adaptor by its name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }
}

impl std::fmt::Display for AdaptorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Capabilities and options of one adaptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaptorDescriptor {
    /// Adaptor kind
    pub kind: AdaptorKind,
    /// Adaptor name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Whether the adaptor cannot work without a location
    pub requires_location: bool,
    /// Accepted location formats
    pub location_formats: &'static [&'static str],
    /// Accepted --prop keys
    pub properties: &'static [&'static str],
    /// Credential kinds the adaptor can use
    pub credentials: &'static [&'static str],
}

/// Registry of the built-in adaptors
#[derive(Debug, Clone)]
pub struct AdaptorRegistry {
    descriptors: Vec<AdaptorDescriptor>,
}

impl AdaptorRegistry {
    /// Registry with every built-in adaptor
    pub fn builtin() -> Self {
        let descriptors = vec![
            AdaptorDescriptor {
                kind: AdaptorKind::File,
                name: AdaptorKind::File.name(),
                description: "Files on the local disk",
                requires_location: false,
                location_formats: &["(empty)", "/base/directory"],
                properties: &[],
                credentials: &[],
            },
            AdaptorDescriptor {
                kind: AdaptorKind::Local,
                name: AdaptorKind::Local.name(),
                description: "Local machine, files on the local disk",
                requires_location: false,
                location_formats: &["(empty)", "/base/directory"],
                properties: &[],
                credentials: &[],
            },
            AdaptorDescriptor {
                kind: AdaptorKind::Sftp,
                name: AdaptorKind::Sftp.name(),
                description: "Files on a remote host over SSH/SFTP",
                requires_location: true,
                location_formats: &["host", "user@host", "host:port", "user@host:port"],
                properties: &["port", "strict-host-key-checking", "connect-timeout"],
                credentials: &["default", "password", "certificate"],
            },
        ];
        Self { descriptors }
    }

    /// Descriptor of `kind`
    pub fn descriptor(&self, kind: AdaptorKind) -> &AdaptorDescriptor {
        // Registered in declaration order of AdaptorKind
        &self.descriptors[kind as usize]
    }

    /// All descriptors
    pub fn descriptors(&self) -> &[AdaptorDescriptor] {
        &self.descriptors
    }

    /// Reference of every adaptor's locations, properties and credentials
    pub fn help(&self) -> String {
        let list = |items: &[&str]| {
            if items.is_empty() {
                "none".to_string()
            } else {
                items.join(", ")
            }
        };

        let mut text = String::from("Adaptors:\n");
        for descriptor in self.descriptors() {
            text.push_str(&format!(
                "  {:<6} {}\n",
                descriptor.name, descriptor.description
            ));
            text.push_str(&format!(
                "         locations:   {}\n",
                list(descriptor.location_formats)
            ));
            text.push_str(&format!(
                "         properties:  {}\n",
                list(descriptor.properties)
            ));
            text.push_str(&format!(
                "         credentials: {}\n",
                list(descriptor.credentials)
            ));
        }
        text
    }

    /// Open a filesystem of `kind` at `location`
    pub fn open(
        &self,
        kind: AdaptorKind,
        location: Option<&str>,
        credential: &Credential,
        properties: &AdaptorProperties,
    ) -> Result<FileSystemHandle> {
        let descriptor = self.descriptor(kind);
        properties.validate(descriptor)?;

        let location = location.filter(|l| !l.is_empty());
        if descriptor.requires_location && location.is_none() {
            return Err(GridError::LocationRequired {
                adaptor: descriptor.name.to_string(),
            });
        }

        debug!(
            "Opening {} filesystem (location: {}, credential: {})",
            descriptor.name,
            location.unwrap_or("<default>"),
            credential.kind()
        );

        let handle = match kind {
            AdaptorKind::File | AdaptorKind::Local => {
                FileSystemHandle::new(Box::new(LocalFileSystem::open(descriptor.name, location)?))
            }
            AdaptorKind::Sftp => {
                let location = location.unwrap_or_default();
                FileSystemHandle::new(Box::new(SftpFileSystem::connect(
                    location, credential, properties,
                )?))
            }
        };

        Ok(handle)
    }
}

impl Default for AdaptorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
