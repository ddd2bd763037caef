//! Shared command-line plumbing for the `train`, `eval` and `infer` binaries.

pub mod common;
pub mod logging;

pub use common::{default_backend, validate_backend_choice, BackendKind, RuntimeArgs};
pub use logging::init_tracing;
