//! Mailbox items and folders as seen by data-access callers.
//!
//! # Responsibility
//! - Model the subset of calendar/task/message fields callers work with.
//! - Keep heterogeneous GetItem results typed (`ExchangeItem`).
//!
//! # Invariants
//! - Items returned by the server always carry an `item_ref`; items built
//!   locally for creation carry none.

use crate::model::refs::{FolderRef, ItemRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free/busy status shown to other attendees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeBusyStatus {
    Free,
    Tentative,
    Busy,
    OutOfOffice,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarItem {
    pub item_ref: Option<ItemRef>,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: Option<String>,
    pub is_all_day: bool,
    pub legacy_free_busy: FreeBusyStatus,
}

impl CalendarItem {
    /// Creates an unsaved busy appointment.
    pub fn new(subject: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            item_ref: None,
            subject: subject.into(),
            start,
            end,
            location: None,
            is_all_day: false,
            legacy_free_busy: FreeBusyStatus::Busy,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    pub item_ref: Option<ItemRef>,
    pub subject: String,
    pub due: Option<DateTime<Utc>>,
    pub is_complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageItem {
    pub item_ref: Option<ItemRef>,
    pub subject: String,
    pub is_read: bool,
}

/// One item of a possibly heterogeneous GetItem result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExchangeItem {
    Calendar(CalendarItem),
    Task(TaskItem),
    Message(MessageItem),
}

impl ExchangeItem {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Calendar(_) => "calendar",
            Self::Task(_) => "task",
            Self::Message(_) => "message",
        }
    }

    pub fn item_ref(&self) -> Option<&ItemRef> {
        match self {
            Self::Calendar(item) => item.item_ref.as_ref(),
            Self::Task(item) => item.item_ref.as_ref(),
            Self::Message(item) => item.item_ref.as_ref(),
        }
    }
}

/// Field-level change applied by UpdateItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ItemChange {
    Subject(String),
    Location(Option<String>),
    Start(DateTime<Utc>),
    End(DateTime<Utc>),
    LegacyFreeBusy(FreeBusyStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderKind {
    Calendar,
    Tasks,
    Mail,
    Contacts,
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Always a concrete id for server-returned folders.
    pub folder_ref: FolderRef,
    pub display_name: String,
    pub kind: FolderKind,
    pub total_count: Option<u32>,
}
