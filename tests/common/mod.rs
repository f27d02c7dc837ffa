//! Common test utilities for cms-backup end-to-end tests

#[allow(dead_code)]
pub mod files;
#[allow(dead_code)]
pub mod server;

#[allow(unused_imports)]
pub use files::*;
pub use server::*;
