//! External collaborators of the data-access core.
//!
//! # Responsibility
//! - Build requests (`request`), interpret responses (`response`, `parser`).
//! - Define the transport and identity-resolution seams the retry driver
//!   calls through.
//!
//! # See also
//! - crate::retry for how gateway errors are classified and retried.

pub mod identity;
pub mod parser;
pub mod request;
pub mod response;
pub mod transport;
