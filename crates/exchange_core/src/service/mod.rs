//! Data-access use-case services.
//!
//! # Responsibility
//! - Compose gateway collaborators with retry, splitting and paging into
//!   caller-facing calendar, item and folder operations.
//! - Keep callers decoupled from wire requests and retry mechanics.

pub mod calendar_service;
pub mod folder_service;
