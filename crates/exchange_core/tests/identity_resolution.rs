mod common;

use common::{
    error_message, folder, item_ids, principal, service_with, RecordingSleeper, ScriptedResolver,
    ScriptedTransport,
};
use exchange_core::gateway::request::{ResolveNamesRequest, ResolveNamesScope};
use exchange_core::{
    DaoError, DirectoryIdentityResolver, ExchangeConfig, FolderKind, IdentityResolver, Request,
    RequestFactory, Response, ResponseCode, ResponseMessage,
};

fn resolved(addresses: &[&str]) -> Result<Response, exchange_core::ExchangeError> {
    Ok(Response::ResolveNames {
        messages: vec![ResponseMessage::ok()],
        addresses: addresses.iter().map(|address| address.to_string()).collect(),
    })
}

fn calendar_found() -> Result<Response, exchange_core::ExchangeError> {
    Ok(Response::GetFolder {
        messages: vec![ResponseMessage::ok()],
        folders: vec![folder("cal-1", "Calendar", FolderKind::Calendar)],
    })
}

fn calendar_rejected() -> Result<Response, exchange_core::ExchangeError> {
    Ok(Response::GetFolder {
        messages: vec![error_message(ResponseCode::ErrorNonExistentMailbox)],
        folders: Vec::new(),
    })
}

#[test]
fn service_retries_with_rewritten_principal() {
    let transport = ScriptedTransport::new(vec![
        Ok(Response::GetItem {
            messages: vec![error_message(ResponseCode::ErrorNonExistentMailbox)],
            items: Vec::new(),
        }),
        Ok(Response::GetItem {
            messages: vec![ResponseMessage::ok()],
            items: Vec::new(),
        }),
    ]);
    let sleeper = RecordingSleeper::new();
    let resolver = ScriptedResolver::new(vec![Ok(Some(principal("jane.doe@example.com")))]);
    let service = service_with(&transport, &sleeper, resolver, ExchangeConfig::fast());
    let caller = principal("jdoe@example.com");

    service
        .get_items(&caller, &item_ids(&["c1"]))
        .expect("rewritten principal should succeed");

    let principals: Vec<String> = transport
        .principals()
        .iter()
        .map(|who| who.as_str().to_string())
        .collect();
    assert_eq!(principals, vec!["jdoe@example.com", "jane.doe@example.com"]);
    assert_eq!(caller.as_str(), "jdoe@example.com");
    assert!(sleeper.waits().is_empty());
}

#[test]
fn service_without_resolution_surfaces_identity_error() {
    let transport = ScriptedTransport::new(vec![Ok(Response::GetItem {
        messages: vec![error_message(ResponseCode::ErrorNonExistentMailbox)],
        items: Vec::new(),
    })]);
    let sleeper = RecordingSleeper::new();
    let service = service_with(
        &transport,
        &sleeper,
        exchange_core::NoIdentityResolution,
        ExchangeConfig::fast(),
    );

    let err = service
        .get_items(&principal("ghost@example.com"), &item_ids(&["c1"]))
        .unwrap_err();

    assert_eq!(transport.call_count(), 1);
    assert!(matches!(err, DaoError::IdentityUnresolved { .. }));
}

#[test]
fn directory_resolver_returns_first_candidate_owning_a_calendar() {
    let transport = ScriptedTransport::new(vec![
        resolved(&["SMTP:old.alias@example.com", "smtp:jane.doe@example.com"]),
        calendar_rejected(),
        calendar_found(),
    ]);
    let admin = principal("admin@example.com");
    let resolver = DirectoryIdentityResolver::new(
        transport.clone(),
        admin.clone(),
        RequestFactory::default(),
    );

    let resolved = resolver
        .resolve_identity(&principal("jdoe@example.com"))
        .expect("lookup should succeed");

    assert_eq!(resolved, Some(principal("jane.doe@example.com")));
    let calls = transport.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].0, admin);
    assert_eq!(
        calls[0].1,
        Request::ResolveNames(ResolveNamesRequest {
            unresolved_entry: "smtp:jdoe@example.com".to_string(),
            scope: ResolveNamesScope::ActiveDirectory,
        })
    );
    assert_eq!(calls[1].0, principal("old.alias@example.com"));
    assert_eq!(calls[2].0, principal("jane.doe@example.com"));
}

#[test]
fn directory_resolver_falls_back_to_contacts_on_missing_address() {
    let transport = ScriptedTransport::new(vec![
        Ok(Response::ResolveNames {
            messages: vec![error_message(ResponseCode::ErrorMissingEmailAddress)],
            addresses: Vec::new(),
        }),
        resolved(&[]),
    ]);
    let resolver = DirectoryIdentityResolver::new(
        transport.clone(),
        principal("admin@example.com"),
        RequestFactory::default(),
    );

    let resolved = resolver
        .resolve_identity(&principal("jdoe@example.com"))
        .unwrap();

    assert_eq!(resolved, None);
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    let Request::ResolveNames(fallback) = &requests[1] else {
        panic!("expected ResolveNames");
    };
    assert_eq!(fallback.scope, ResolveNamesScope::Contacts);
}

#[test]
fn directory_resolver_skips_non_smtp_principals() {
    let transport = ScriptedTransport::new(Vec::new());
    let resolver = DirectoryIdentityResolver::new(
        transport.clone(),
        principal("admin@example.com"),
        RequestFactory::default(),
    );

    let resolved = resolver
        .resolve_identity(&principal("CORP\\jdoe"))
        .unwrap();

    assert_eq!(resolved, None);
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn directory_resolver_propagates_lookup_failures() {
    let transport = ScriptedTransport::new(vec![common::fail(
        exchange_core::ExchangeErrorKind::Timeout,
    )]);
    let resolver = DirectoryIdentityResolver::new(
        transport.clone(),
        principal("admin@example.com"),
        RequestFactory::default(),
    );

    let err = resolver
        .resolve_identity(&principal("jdoe@example.com"))
        .unwrap_err();

    assert_eq!(err.kind(), exchange_core::ExchangeErrorKind::Timeout);
}
