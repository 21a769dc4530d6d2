//! Concurrent existence validation.

pub mod references;
pub mod scatter;

pub use references::{LookupFailure, ReferenceError, ReferenceValidator};
pub use scatter::{CheckAborted, ScatterGather, ValidationOutcome, Verdict};
