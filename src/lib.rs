//! Reconcile a local photo directory tree against a cloud photo library.
//!
//! Both sides are pulled into one SQLite store, then compared album by
//! album to find local photos the library does not have yet.

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod logging;
pub mod normalize;
pub mod reconcile;
pub mod remote;
pub mod scanner;

pub use error::{Error, Result};
