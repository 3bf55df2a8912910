//! lanshare - LAN file sharing relay
//!
//! Exposes a local directory to a receiver on the same network behind a
//! share token and a password, with listing, upload, download, zip archives
//! and previews over HTTP.

pub mod config;
pub mod datetime;
pub mod error;
pub mod logging;
pub mod net;
pub mod qr;
pub mod share;
pub mod web;

pub use config::Config;
pub use error::{Result, ShareError};
pub use share::{
    Expiry, InMemoryShareRegistry, NewShare, SessionStore, ShareRecord, ShareRegistry,
};
pub use web::{AppState, WebServer};
