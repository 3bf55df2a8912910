//! Share management for lanshare.
//!
//! This module provides the core of the relay:
//! - Token-keyed share registry with lazy expiry
//! - Per-client session flags
//! - Path containment checks for client-supplied paths
//! - Directory listing and zip archiving

pub mod archive;
pub mod listing;
pub mod path;
pub mod registry;
pub mod session;

pub use archive::{archive_name, build_archive, Archive};
pub use listing::{guess_mime, list_dir, Entry};
pub use path::{display_name, resolve_within, sanitize_filename};
pub use registry::{
    generate_token, resolve_root, Clock, Expiry, InMemoryShareRegistry, NewShare, ShareRecord,
    ShareRegistry,
};
pub use session::SessionStore;
