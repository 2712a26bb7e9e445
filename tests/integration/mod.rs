//! Integration tests against a local HTTP endpoint.

pub mod common;
pub mod database_test;
pub mod transport_test;
