mod common;

use common::{principal, RecordingSleeper};
use exchange_core::{
    CalendarService, ExchangeConfig, ExchangeError, ExchangeErrorKind, FindItemResponse,
    FolderRef, ItemRef, NoIdentityResolution, Request, Response,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn shared_service_keeps_each_mailbox_isolated() {
    let failed_once: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
    let failures = failed_once.clone();
    let transport = common::HandlerTransport::new(move |who, request| match request {
        Request::FindItem(_) => {
            if failures.lock().unwrap().insert(who.as_str().to_string()) {
                return Err(ExchangeError::new(ExchangeErrorKind::Timeout, "first call"));
            }
            Ok(Response::FindItem(FindItemResponse::last_page(vec![
                ItemRef::new(format!("{}-item", who.as_str())),
            ])))
        }
        other => Err(ExchangeError::unrecognized(format!(
            "unexpected request {other:?}"
        ))),
    });
    let sleeper = RecordingSleeper::new();
    let service = Arc::new(
        CalendarService::with_sleeper(
            transport,
            NoIdentityResolution,
            sleeper.clone(),
            ExchangeConfig::fast(),
        )
        .unwrap(),
    );

    let handles: Vec<_> = (0..8)
        .map(|index| {
            let service = service.clone();
            thread::spawn(move || {
                let who = principal(&format!("user{index}@example.com"));
                let ids = service
                    .find_item_ids(&who, &[FolderRef::id("calendar-1")])
                    .unwrap();
                (who, ids)
            })
        })
        .collect();

    for handle in handles {
        let (who, ids) = handle.join().unwrap();
        let expected = ItemRef::new(format!("{}-item", who.as_str()));
        assert_eq!(ids.len(), 1);
        assert!(ids.contains(&expected));
    }
    assert_eq!(failed_once.lock().unwrap().len(), 8);
    assert_eq!(sleeper.waits().len(), 8);
}

#[test]
fn cancelling_the_shared_token_stops_new_calls() {
    let transport = common::ScriptedTransport::new(Vec::new());
    let sleeper = RecordingSleeper::new();
    let service = common::service_with(
        &transport,
        &sleeper,
        NoIdentityResolution,
        ExchangeConfig::fast(),
    );

    service.cancellation_token().cancel();
    let err = service
        .find_item_ids(&principal("u@example.com"), &[FolderRef::id("calendar-1")])
        .unwrap_err();

    assert!(matches!(err, exchange_core::DaoError::Cancelled { .. }));
    assert_eq!(transport.call_count(), 0);
}
