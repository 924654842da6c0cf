//! Client tests against an in-memory transport.
//!
//! - `harness.rs`       - recording mock transport and session fixtures
//! - `dispatch.rs`      - account defaulting, envelope, correlation, errors
//! - `session_fetch.rs` - session fetch/refetch and blob upload

pub(crate) mod harness;
