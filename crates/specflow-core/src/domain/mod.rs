//! Domain models for specflow.
//!
//! - `Spec`: immutable infrastructure spec tree
//! - `ChangeWarning` / `Severity`: classifier output
//! - `SpecError`: parse and validation failures

pub mod error;
pub mod spec;
pub mod warning;

pub use error::SpecError;
pub use spec::Spec;
pub use warning::{ChangeWarning, Severity};
