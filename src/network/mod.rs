//! Network filesystems
//!
//! Remote adaptors reached over the network. Only SSH/SFTP is supported;
//! connections are blocking and live as long as their filesystem handle.

mod sftp;

pub use sftp::*;
