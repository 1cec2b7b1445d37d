//! Response parsing into domain results or typed errors.
//!
//! # Responsibility
//! - Map EWS response codes onto `ExchangeErrorKind`.
//! - Extract ids, items, folders and paging state from successful replies.
//!
//! # Invariants
//! - The first non-`NoError` message of a reply decides the raised error.
//! - A reply of the wrong operation is `Unrecognized`, never success.
//! - A non-final page must carry a positive paging offset.

use crate::error::{ExchangeError, ExchangeErrorKind};
use crate::gateway::response::{Response, ResponseCode, ResponseMessage};
use crate::model::item::{ExchangeItem, Folder};
use crate::model::refs::{FolderRef, ItemRef};
use crate::paging::{NextPage, Page};
use log::debug;

/// Maps one response code to the error kind the classifier understands.
pub fn error_kind_for(code: &ResponseCode) -> Option<ExchangeErrorKind> {
    let kind = match code {
        ResponseCode::NoError => return None,
        ResponseCode::ErrorInternalServerError
        | ResponseCode::ErrorInternalServerTransientError => ExchangeErrorKind::InternalServerError,
        ResponseCode::ErrorTimeoutExpired => ExchangeErrorKind::Timeout,
        ResponseCode::ErrorMissingEmailAddress => ExchangeErrorKind::MissingEmailAddress,
        ResponseCode::ErrorCannotDeleteObject => ExchangeErrorKind::CannotDeleteObject,
        ResponseCode::ErrorItemNotFound => ExchangeErrorKind::ItemNotFound,
        ResponseCode::ErrorExceededFindCountLimit => ExchangeErrorKind::ExceededFindCountLimit,
        ResponseCode::ErrorNonExistentMailbox => ExchangeErrorKind::InvalidPrincipal,
        ResponseCode::ErrorServerBusy | ResponseCode::Other(_) => ExchangeErrorKind::Other,
    };
    Some(kind)
}

/// Raises the error carried by the first failed message, if any.
pub fn ensure_success(messages: &[ResponseMessage]) -> Result<(), ExchangeError> {
    for message in messages {
        if let Some(kind) = error_kind_for(&message.code) {
            let text = message.text.as_deref().unwrap_or("no message text");
            return Err(ExchangeError::new(
                kind,
                format!("{}: {text}", message.code.as_str()),
            ));
        }
    }
    Ok(())
}

fn unexpected(expected: &str, response: &Response) -> ExchangeError {
    ExchangeError::unrecognized(format!(
        "expected {expected} response, got {}",
        response.kind_name()
    ))
}

/// Parses one indexed FindItem page.
pub fn parse_found_item_ids(response: &Response) -> Result<Page<ItemRef>, ExchangeError> {
    let Response::FindItem(find) = response else {
        return Err(unexpected("FindItem", response));
    };
    ensure_success(std::slice::from_ref(&find.message))?;

    let next = if find.includes_last_item_in_range {
        NextPage::Exhausted
    } else {
        match find.indexed_paging_offset {
            Some(offset) if offset > 0 => NextPage::Offset(offset),
            other => {
                return Err(ExchangeError::unrecognized(format!(
                    "non-final FindItem page carried invalid paging offset {other:?}"
                )))
            }
        }
    };
    debug!(
        "event=find_item_parse module=parser status=ok found={} total_in_view={} next={:?}",
        find.item_ids.len(),
        find.total_items_in_view,
        next
    );
    Ok(Page {
        items: find.item_ids.clone(),
        next,
    })
}

/// Parses a calendar-view FindItem reply, which is never paged.
pub fn parse_found_item_ids_unpaged(response: &Response) -> Result<Vec<ItemRef>, ExchangeError> {
    let Response::FindItem(find) = response else {
        return Err(unexpected("FindItem", response));
    };
    ensure_success(std::slice::from_ref(&find.message))?;
    Ok(find.item_ids.clone())
}

pub fn parse_items(response: &Response) -> Result<Vec<ExchangeItem>, ExchangeError> {
    let Response::GetItem { messages, items } = response else {
        return Err(unexpected("GetItem", response));
    };
    ensure_success(messages)?;
    Ok(items.clone())
}

/// Returns `true` when every message succeeded and at least one was sent.
pub fn parse_success(response: &Response) -> Result<bool, ExchangeError> {
    let messages = match response {
        Response::DeleteItem { messages }
        | Response::DeleteFolder { messages }
        | Response::EmptyFolder { messages } => messages,
        other => return Err(unexpected("DeleteItem, DeleteFolder or EmptyFolder", other)),
    };
    ensure_success(messages)?;
    Ok(!messages.is_empty())
}

pub fn parse_created_item_ids(response: &Response) -> Result<Vec<ItemRef>, ExchangeError> {
    let Response::CreateItem { messages, item_ids } = response else {
        return Err(unexpected("CreateItem", response));
    };
    ensure_success(messages)?;
    Ok(item_ids.clone())
}

pub fn parse_updated_item_ids(response: &Response) -> Result<Vec<ItemRef>, ExchangeError> {
    let Response::UpdateItem { messages, item_ids } = response else {
        return Err(unexpected("UpdateItem", response));
    };
    ensure_success(messages)?;
    Ok(item_ids.clone())
}

pub fn parse_folders(response: &Response) -> Result<Vec<Folder>, ExchangeError> {
    match response {
        Response::GetFolder { messages, folders } | Response::FindFolder { messages, folders } => {
            ensure_success(messages)?;
            Ok(folders.clone())
        }
        other => Err(unexpected("GetFolder or FindFolder", other)),
    }
}

pub fn parse_created_folder_ids(response: &Response) -> Result<Vec<FolderRef>, ExchangeError> {
    let Response::CreateFolder {
        messages,
        folder_ids,
    } = response
    else {
        return Err(unexpected("CreateFolder", response));
    };
    ensure_success(messages)?;
    Ok(folder_ids.clone())
}

pub fn parse_resolved_addresses(response: &Response) -> Result<Vec<String>, ExchangeError> {
    let Response::ResolveNames {
        messages,
        addresses,
    } = response
    else {
        return Err(unexpected("ResolveNames", response));
    };
    ensure_success(messages)?;
    Ok(addresses.clone())
}
