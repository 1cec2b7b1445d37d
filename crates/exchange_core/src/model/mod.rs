//! Wire-format-agnostic domain model.
//!
//! # Responsibility
//! - Define identities, references, intervals and items shared by every
//!   layer of the data-access stack.
//!
//! # Invariants
//! - Model types carry no transport state; they are safe to clone across
//!   threads.

pub mod interval;
pub mod item;
pub mod refs;
