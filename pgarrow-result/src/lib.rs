//! Error types and result definitions shared by every pg2arrow crate.
//!
//! All fallible operations return [`Result<T>`], whose error variant is the
//! single [`Error`] enum. Errors propagate with `?` up to the binary, which
//! reports them and aborts the pass; nothing inside the pipeline recovers
//! from an error.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
