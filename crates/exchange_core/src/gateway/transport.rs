//! Transport seam between the data-access core and the wire client.
//!
//! # Responsibility
//! - Execute one request on behalf of one principal and return either the
//!   raw response or a typed `ExchangeError`.
//!
//! # Invariants
//! - The principal travels with every call; transports keep no per-thread
//!   impersonation state.
//! - Implementations must be shareable across threads (`Send + Sync`).

use crate::error::ExchangeError;
use crate::gateway::request::Request;
use crate::gateway::response::Response;
use crate::model::refs::Principal;
use std::sync::Arc;

/// One remote call under an impersonated principal.
///
/// Network failures should surface as `ExchangeErrorKind::Timeout` or
/// `ExchangeErrorKind::Unrecognized`; server response codes are mapped by
/// the parser after a response is returned.
pub trait Transport: Send + Sync {
    fn call(&self, principal: &Principal, request: &Request) -> Result<Response, ExchangeError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn call(&self, principal: &Principal, request: &Request) -> Result<Response, ExchangeError> {
        (**self).call(principal, request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn call(&self, principal: &Principal, request: &Request) -> Result<Response, ExchangeError> {
        (**self).call(principal, request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn call(&self, principal: &Principal, request: &Request) -> Result<Response, ExchangeError> {
        (**self).call(principal, request)
    }
}
