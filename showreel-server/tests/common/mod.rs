//! Shared helpers for integration tests.

mod server;

#[allow(unused_imports)]
pub use server::TestServer;
