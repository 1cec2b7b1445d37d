//! Response values returned by the transport.
//!
//! Each EWS response carries one `ResponseMessage` per requested element;
//! payload fields hold whatever the successful messages returned.

use crate::model::item::{ExchangeItem, Folder};
use crate::model::refs::{FolderRef, ItemRef};

/// EWS response codes the data-access layer distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    ErrorInternalServerError,
    ErrorInternalServerTransientError,
    ErrorTimeoutExpired,
    ErrorMissingEmailAddress,
    ErrorCannotDeleteObject,
    ErrorItemNotFound,
    ErrorExceededFindCountLimit,
    ErrorNonExistentMailbox,
    ErrorServerBusy,
    Other(String),
}

impl ResponseCode {
    pub fn from_code(code: &str) -> Self {
        match code {
            "NoError" => Self::NoError,
            "ErrorInternalServerError" => Self::ErrorInternalServerError,
            "ErrorInternalServerTransientError" => Self::ErrorInternalServerTransientError,
            "ErrorTimeoutExpired" => Self::ErrorTimeoutExpired,
            "ErrorMissingEmailAddress" => Self::ErrorMissingEmailAddress,
            "ErrorCannotDeleteObject" => Self::ErrorCannotDeleteObject,
            "ErrorItemNotFound" => Self::ErrorItemNotFound,
            "ErrorExceededFindCountLimit" => Self::ErrorExceededFindCountLimit,
            "ErrorNonExistentMailbox" => Self::ErrorNonExistentMailbox,
            "ErrorServerBusy" => Self::ErrorServerBusy,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::NoError => "NoError",
            Self::ErrorInternalServerError => "ErrorInternalServerError",
            Self::ErrorInternalServerTransientError => "ErrorInternalServerTransientError",
            Self::ErrorTimeoutExpired => "ErrorTimeoutExpired",
            Self::ErrorMissingEmailAddress => "ErrorMissingEmailAddress",
            Self::ErrorCannotDeleteObject => "ErrorCannotDeleteObject",
            Self::ErrorItemNotFound => "ErrorItemNotFound",
            Self::ErrorExceededFindCountLimit => "ErrorExceededFindCountLimit",
            Self::ErrorNonExistentMailbox => "ErrorNonExistentMailbox",
            Self::ErrorServerBusy => "ErrorServerBusy",
            Self::Other(code) => code.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseMessage {
    pub code: ResponseCode,
    pub text: Option<String>,
}

impl ResponseMessage {
    pub fn ok() -> Self {
        Self {
            code: ResponseCode::NoError,
            text: None,
        }
    }

    pub fn error(code: ResponseCode, text: impl Into<String>) -> Self {
        Self {
            code,
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindItemResponse {
    pub message: ResponseMessage,
    pub item_ids: Vec<ItemRef>,
    pub includes_last_item_in_range: bool,
    pub indexed_paging_offset: Option<u32>,
    pub total_items_in_view: u32,
}

impl FindItemResponse {
    /// Successful final page (or unpaged calendar view).
    pub fn last_page(item_ids: Vec<ItemRef>) -> Self {
        let total = item_ids.len() as u32;
        Self {
            message: ResponseMessage::ok(),
            item_ids,
            includes_last_item_in_range: true,
            indexed_paging_offset: None,
            total_items_in_view: total,
        }
    }

    /// Successful page that continues at `next_offset`.
    pub fn page(item_ids: Vec<ItemRef>, next_offset: u32, total_items_in_view: u32) -> Self {
        Self {
            message: ResponseMessage::ok(),
            item_ids,
            includes_last_item_in_range: false,
            indexed_paging_offset: Some(next_offset),
            total_items_in_view,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    FindItem(FindItemResponse),
    GetItem {
        messages: Vec<ResponseMessage>,
        items: Vec<ExchangeItem>,
    },
    CreateItem {
        messages: Vec<ResponseMessage>,
        item_ids: Vec<ItemRef>,
    },
    UpdateItem {
        messages: Vec<ResponseMessage>,
        item_ids: Vec<ItemRef>,
    },
    DeleteItem {
        messages: Vec<ResponseMessage>,
    },
    GetFolder {
        messages: Vec<ResponseMessage>,
        folders: Vec<Folder>,
    },
    FindFolder {
        messages: Vec<ResponseMessage>,
        folders: Vec<Folder>,
    },
    CreateFolder {
        messages: Vec<ResponseMessage>,
        folder_ids: Vec<FolderRef>,
    },
    DeleteFolder {
        messages: Vec<ResponseMessage>,
    },
    EmptyFolder {
        messages: Vec<ResponseMessage>,
    },
    ResolveNames {
        messages: Vec<ResponseMessage>,
        addresses: Vec<String>,
    },
}

impl Response {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::FindItem(_) => "FindItem",
            Self::GetItem { .. } => "GetItem",
            Self::CreateItem { .. } => "CreateItem",
            Self::UpdateItem { .. } => "UpdateItem",
            Self::DeleteItem { .. } => "DeleteItem",
            Self::GetFolder { .. } => "GetFolder",
            Self::FindFolder { .. } => "FindFolder",
            Self::CreateFolder { .. } => "CreateFolder",
            Self::DeleteFolder { .. } => "DeleteFolder",
            Self::EmptyFolder { .. } => "EmptyFolder",
            Self::ResolveNames { .. } => "ResolveNames",
        }
    }
}
