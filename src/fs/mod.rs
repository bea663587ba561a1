//! Filesystem module
//!
//! Provides the filesystem abstraction shared by all adaptors, the local
//! disk implementation, scoped handles, and the adaptor registry.

mod handle;
mod local;
mod registry;
mod traits;

pub use handle::*;
pub use local::*;
pub use registry::*;
pub use traits::*;

#[cfg(test)]
pub(crate) use handle::tests::CountingFileSystem;
