//! Filesystem primitives for dota2-sync
//!
//! Provides normalized profile-relative paths, content digests, and
//! stage-then-rename I/O so no reader ever observes a half-written file.

pub mod checksum;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::Digest;
pub use error::{Error, Result};
pub use path::RelativePath;
