//! Principal re-resolution used after the server rejects a mailbox identity.
//!
//! # Responsibility
//! - Turn an ambiguous principal into a corrected one, or report that no
//!   correction exists.
//!
//! # Invariants
//! - `Ok(None)` means "cannot resolve"; the retry driver then surfaces the
//!   original failure.
//! - Directory lookups run as the configured admin principal, never as the
//!   principal being resolved.

use crate::error::{ExchangeError, ExchangeErrorKind};
use crate::gateway::parser;
use crate::gateway::request::{RequestFactory, ResolveNamesScope};
use crate::gateway::transport::Transport;
use crate::model::refs::{FolderRef, Principal};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

const SMTP_PREFIX: &str = "smtp:";

static SMTP_ADDRESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)+$")
        .expect("smtp address regex must compile")
});

pub trait IdentityResolver: Send + Sync {
    fn resolve_identity(&self, principal: &Principal) -> Result<Option<Principal>, ExchangeError>;
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for &R {
    fn resolve_identity(&self, principal: &Principal) -> Result<Option<Principal>, ExchangeError> {
        (**self).resolve_identity(principal)
    }
}

impl<R: IdentityResolver + ?Sized> IdentityResolver for Arc<R> {
    fn resolve_identity(&self, principal: &Principal) -> Result<Option<Principal>, ExchangeError> {
        (**self).resolve_identity(principal)
    }
}

/// Resolver that never proposes a replacement.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentityResolution;

impl IdentityResolver for NoIdentityResolution {
    fn resolve_identity(&self, _principal: &Principal) -> Result<Option<Principal>, ExchangeError> {
        Ok(None)
    }
}

/// Directory-backed resolver.
///
/// Looks the address up with ResolveNames, retrying against the contacts
/// folder when the directory reports a missing email address, then returns
/// the first candidate whose primary calendar folder can be opened.
pub struct DirectoryIdentityResolver<T> {
    transport: T,
    admin: Principal,
    requests: RequestFactory,
}

impl<T: Transport> DirectoryIdentityResolver<T> {
    pub fn new(transport: T, admin: Principal, requests: RequestFactory) -> Self {
        Self {
            transport,
            admin,
            requests,
        }
    }

    fn lookup_candidates(&self, entry: &str) -> Result<Vec<String>, ExchangeError> {
        let request = self
            .requests
            .build_resolve_names(entry, ResolveNamesScope::ActiveDirectory);
        let response = self.transport.call(&self.admin, &request)?;
        match parser::parse_resolved_addresses(&response) {
            Err(err) if err.kind() == ExchangeErrorKind::MissingEmailAddress => {
                debug!("event=resolve_names module=identity status=fallback scope=contacts");
                let request = self
                    .requests
                    .build_resolve_names(entry, ResolveNamesScope::Contacts);
                let response = self.transport.call(&self.admin, &request)?;
                parser::parse_resolved_addresses(&response)
            }
            other => other,
        }
    }

    fn owns_primary_calendar(&self, candidate: &Principal) -> bool {
        let request = self.requests.build_get_folder(&FolderRef::primary_calendar());
        let probe = self
            .transport
            .call(candidate, &request)
            .and_then(|response| parser::parse_folders(&response));
        match probe {
            Ok(folders) => !folders.is_empty(),
            Err(err) => {
                debug!(
                    "event=identity_probe module=identity status=rejected kind={}",
                    err.kind()
                );
                false
            }
        }
    }
}

impl<T: Transport> IdentityResolver for DirectoryIdentityResolver<T> {
    fn resolve_identity(&self, principal: &Principal) -> Result<Option<Principal>, ExchangeError> {
        if !SMTP_ADDRESS_RE.is_match(principal.as_str()) {
            debug!("event=identity_resolve module=identity status=skipped reason=not_smtp");
            return Ok(None);
        }

        let entry = format!("{SMTP_PREFIX}{}", principal.as_str());
        let candidates = self.lookup_candidates(&entry)?;
        for raw in &candidates {
            let Some(candidate) = strip_smtp_prefix(raw).and_then(|addr| Principal::new(addr).ok())
            else {
                continue;
            };
            if self.owns_primary_calendar(&candidate) {
                info!(
                    "event=identity_resolve module=identity status=ok candidates={}",
                    candidates.len()
                );
                return Ok(Some(candidate));
            }
        }

        info!(
            "event=identity_resolve module=identity status=none candidates={}",
            candidates.len()
        );
        Ok(None)
    }
}

fn strip_smtp_prefix(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    let address = match trimmed.get(..SMTP_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(SMTP_PREFIX) => &trimmed[SMTP_PREFIX.len()..],
        _ => trimmed,
    };
    (!address.is_empty()).then_some(address)
}

#[cfg(test)]
mod tests {
    use super::{strip_smtp_prefix, SMTP_ADDRESS_RE};

    #[test]
    fn smtp_prefix_is_stripped_case_insensitively() {
        assert_eq!(strip_smtp_prefix("SMTP:a@example.com"), Some("a@example.com"));
        assert_eq!(strip_smtp_prefix("smtp:a@example.com"), Some("a@example.com"));
        assert_eq!(strip_smtp_prefix(" a@example.com "), Some("a@example.com"));
        assert_eq!(strip_smtp_prefix("smtp:"), None);
    }

    #[test]
    fn address_pattern_rejects_non_smtp_principals() {
        assert!(SMTP_ADDRESS_RE.is_match("jane.doe@example.edu"));
        assert!(!SMTP_ADDRESS_RE.is_match("DOMAIN\\jane"));
        assert!(!SMTP_ADDRESS_RE.is_match("jane@localhost"));
    }
}
