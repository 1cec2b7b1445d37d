#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use exchange_core::{
    CalendarService, DateInterval, ExchangeConfig, ExchangeError, ExchangeErrorKind,
    FindItemResponse, Folder, FolderKind, FolderRef, IdentityResolver, ItemRef, Principal,
    Request, Response, ResponseCode, ResponseMessage, Sleeper, Transport,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub type ScriptedService<R> = CalendarService<Arc<ScriptedTransport>, R, Arc<RecordingSleeper>>;

/// Replays queued results in order and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Response, ExchangeError>>>,
    calls: Mutex<Vec<(Principal, Request)>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<Response, ExchangeError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<(Principal, Request)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<Request> {
        self.calls().into_iter().map(|(_, request)| request).collect()
    }

    pub fn principals(&self) -> Vec<Principal> {
        self.calls().into_iter().map(|(principal, _)| principal).collect()
    }
}

impl Transport for ScriptedTransport {
    fn call(&self, principal: &Principal, request: &Request) -> Result<Response, ExchangeError> {
        self.calls
            .lock()
            .unwrap()
            .push((principal.clone(), request.clone()));
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ExchangeError::unrecognized("script exhausted")))
    }
}

/// Answers every call through a closure.
pub struct HandlerTransport<F> {
    handler: F,
}

impl<F> HandlerTransport<F>
where
    F: Fn(&Principal, &Request) -> Result<Response, ExchangeError> + Send + Sync,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

impl<F> Transport for HandlerTransport<F>
where
    F: Fn(&Principal, &Request) -> Result<Response, ExchangeError> + Send + Sync,
{
    fn call(&self, principal: &Principal, request: &Request) -> Result<Response, ExchangeError> {
        (self.handler)(principal, request)
    }
}

/// Records requested waits instead of blocking.
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

/// Replays queued resolutions; an empty queue resolves to `None`.
#[derive(Default)]
pub struct ScriptedResolver {
    script: Mutex<VecDeque<Result<Option<Principal>, ExchangeError>>>,
    calls: Mutex<Vec<Principal>>,
}

impl ScriptedResolver {
    pub fn new(script: Vec<Result<Option<Principal>, ExchangeError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Principal> {
        self.calls.lock().unwrap().clone()
    }
}

impl IdentityResolver for ScriptedResolver {
    fn resolve_identity(&self, principal: &Principal) -> Result<Option<Principal>, ExchangeError> {
        self.calls.lock().unwrap().push(principal.clone());
        self.script.lock().unwrap().pop_front().unwrap_or(Ok(None))
    }
}

pub fn service_with<R: IdentityResolver>(
    transport: &Arc<ScriptedTransport>,
    sleeper: &Arc<RecordingSleeper>,
    resolver: R,
    config: ExchangeConfig,
) -> ScriptedService<R> {
    CalendarService::with_sleeper(transport.clone(), resolver, sleeper.clone(), config)
        .expect("test config should validate")
}

pub fn principal(value: &str) -> Principal {
    Principal::new(value).expect("test principal should be valid")
}

pub fn item_ids(ids: &[&str]) -> Vec<ItemRef> {
    ids.iter().map(|id| ItemRef::new(*id)).collect()
}

pub fn numbered_ids(prefix: &str, count: usize) -> Vec<ItemRef> {
    (0..count)
        .map(|index| ItemRef::new(format!("{prefix}-{index:04}")))
        .collect()
}

pub fn fail(kind: ExchangeErrorKind) -> Result<Response, ExchangeError> {
    Err(ExchangeError::new(kind, format!("scripted {kind}")))
}

pub fn last_page(ids: Vec<ItemRef>) -> Result<Response, ExchangeError> {
    Ok(Response::FindItem(FindItemResponse::last_page(ids)))
}

pub fn page(ids: Vec<ItemRef>, next_offset: u32, total: u32) -> Result<Response, ExchangeError> {
    Ok(Response::FindItem(FindItemResponse::page(ids, next_offset, total)))
}

pub fn deleted() -> Result<Response, ExchangeError> {
    Ok(Response::DeleteItem {
        messages: vec![ResponseMessage::ok()],
    })
}

pub fn error_message(code: ResponseCode) -> ResponseMessage {
    ResponseMessage::error(code, "scripted server error")
}

pub fn folder(id: &str, name: &str, kind: FolderKind) -> Folder {
    Folder {
        folder_ref: FolderRef::id(id),
        display_name: name.to_string(),
        kind,
        total_count: Some(0),
    }
}

pub fn day(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
}

pub fn week() -> DateInterval {
    DateInterval::new(day(1), day(8)).expect("week interval")
}
