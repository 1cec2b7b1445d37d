//! Request values and the stateless request factory.
//!
//! # Responsibility
//! - Describe each EWS operation as a plain Rust value the transport can
//!   marshal.
//! - Build requests from high-level parameters plus one injected
//!   `RequestOptions` struct.
//!
//! # Invariants
//! - Indexed page requests never ask for more than
//!   `MAX_FIND_ITEMS_CEILING` entries.
//! - Date-range finds with no folders target the primary calendar.

use crate::config::MAX_FIND_ITEMS_CEILING;
use crate::model::interval::DateInterval;
use crate::model::item::{CalendarItem, ItemChange};
use crate::model::refs::{DistinguishedFolder, FolderRef, ItemRef};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Remote operation names, used for logging and transport dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FindItem,
    GetItem,
    CreateItem,
    UpdateItem,
    DeleteItem,
    GetFolder,
    FindFolder,
    CreateFolder,
    DeleteFolder,
    EmptyFolder,
    ResolveNames,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FindItem => "FindItem",
            Self::GetItem => "GetItem",
            Self::CreateItem => "CreateItem",
            Self::UpdateItem => "UpdateItem",
            Self::DeleteItem => "DeleteItem",
            Self::GetFolder => "GetFolder",
            Self::FindFolder => "FindFolder",
            Self::CreateFolder => "CreateFolder",
            Self::DeleteFolder => "DeleteFolder",
            Self::EmptyFolder => "EmptyFolder",
            Self::ResolveNames => "ResolveNames",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposalType {
    HardDelete,
    SoftDelete,
    MoveToDeletedItems,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    NeverOverwrite,
    AutoResolve,
    AlwaysOverwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTraversal {
    Shallow,
    SoftDeleted,
    Associated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FolderTraversal {
    Shallow,
    Deep,
}

/// Meeting-invitation policy for create/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendInvitations {
    SendToNone,
    SendOnlyToAll,
    SendToAllAndSaveCopy,
}

/// Meeting-cancellation policy for delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SendCancellations {
    SendToNone,
    SendOnlyToAll,
    SendToAllAndSaveCopy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemShape {
    IdOnly,
    Default,
    AllProperties,
}

/// Request-shaping policy shared by every request the factory builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestOptions {
    pub disposal: DisposalType,
    pub conflict_resolution: ConflictResolution,
    pub traversal: ItemTraversal,
    pub send_invitations: SendInvitations,
    pub send_cancellations: SendCancellations,
    pub item_shape: ItemShape,
    pub max_find_items: u32,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            disposal: DisposalType::HardDelete,
            conflict_resolution: ConflictResolution::AutoResolve,
            traversal: ItemTraversal::Shallow,
            send_invitations: SendInvitations::SendToNone,
            send_cancellations: SendCancellations::SendToNone,
            item_shape: ItemShape::AllProperties,
            max_find_items: crate::config::DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindItemView {
    /// Calendar view; the server expands recurrences inside the window.
    Calendar { interval: DateInterval },
    IndexedPage { offset: u32, max_entries: u32 },
}

/// Server-side filter applied to a find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemRestriction {
    /// Calendar items whose `IsCancelled` property is set.
    CancelledCalendarItems,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindItemRequest {
    pub folders: Vec<FolderRef>,
    pub traversal: ItemTraversal,
    pub view: FindItemView,
    pub restriction: Option<ItemRestriction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetItemRequest {
    pub item_ids: Vec<ItemRef>,
    pub shape: ItemShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateItemRequest {
    pub items: Vec<CalendarItem>,
    pub folder: Option<FolderRef>,
    pub send_invitations: SendInvitations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateItemRequest {
    pub item: ItemRef,
    pub changes: Vec<ItemChange>,
    pub conflict_resolution: ConflictResolution,
    pub send_invitations: SendInvitations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteItemRequest {
    pub item_ids: Vec<ItemRef>,
    pub disposal: DisposalType,
    pub send_cancellations: SendCancellations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindFolderRequest {
    pub parent: FolderRef,
    pub traversal: FolderTraversal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveNamesScope {
    ActiveDirectory,
    /// Restrict the lookup to the distinguished contacts folder.
    Contacts,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveNamesRequest {
    pub unresolved_entry: String,
    pub scope: ResolveNamesScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    FindItem(FindItemRequest),
    GetItem(GetItemRequest),
    CreateItem(CreateItemRequest),
    UpdateItem(UpdateItemRequest),
    DeleteItem(DeleteItemRequest),
    GetFolder { folders: Vec<FolderRef> },
    FindFolder(FindFolderRequest),
    CreateFolder { parent: FolderRef, display_name: String },
    DeleteFolder { folder: FolderRef, disposal: DisposalType },
    EmptyFolder { folders: Vec<FolderRef>, delete_sub_folders: bool },
    ResolveNames(ResolveNamesRequest),
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Self::FindItem(_) => Operation::FindItem,
            Self::GetItem(_) => Operation::GetItem,
            Self::CreateItem(_) => Operation::CreateItem,
            Self::UpdateItem(_) => Operation::UpdateItem,
            Self::DeleteItem(_) => Operation::DeleteItem,
            Self::GetFolder { .. } => Operation::GetFolder,
            Self::FindFolder(_) => Operation::FindFolder,
            Self::CreateFolder { .. } => Operation::CreateFolder,
            Self::DeleteFolder { .. } => Operation::DeleteFolder,
            Self::EmptyFolder { .. } => Operation::EmptyFolder,
            Self::ResolveNames(_) => Operation::ResolveNames,
        }
    }
}

/// Stateless request builder configured by one `RequestOptions` value.
#[derive(Debug, Clone, Default)]
pub struct RequestFactory {
    options: RequestOptions,
}

impl RequestFactory {
    /// `max_find_items` is clamped to `1..=MAX_FIND_ITEMS_CEILING`.
    pub fn new(mut options: RequestOptions) -> Self {
        options.max_find_items = options.max_find_items.clamp(1, MAX_FIND_ITEMS_CEILING);
        Self { options }
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    pub fn build_find_by_date_range(
        &self,
        interval: DateInterval,
        folders: &[FolderRef],
    ) -> Request {
        let folders = if folders.is_empty() {
            vec![FolderRef::primary_calendar()]
        } else {
            folders.to_vec()
        };
        Request::FindItem(FindItemRequest {
            folders,
            traversal: self.options.traversal,
            view: FindItemView::Calendar { interval },
            restriction: None,
        })
    }

    /// Builds one indexed page; offset 0 is the first page.
    ///
    /// `max_entries` is clamped to `1..=max_find_items`.
    pub fn build_find_page(
        &self,
        offset: u32,
        max_entries: u32,
        folders: &[FolderRef],
    ) -> Request {
        self.indexed_find(offset, max_entries, folders, None)
    }

    /// Builds one indexed page restricted to cancelled calendar items.
    pub fn build_find_cancelled_page(&self, offset: u32, folders: &[FolderRef]) -> Request {
        self.indexed_find(
            offset,
            self.options.max_find_items,
            folders,
            Some(ItemRestriction::CancelledCalendarItems),
        )
    }

    fn indexed_find(
        &self,
        offset: u32,
        max_entries: u32,
        folders: &[FolderRef],
        restriction: Option<ItemRestriction>,
    ) -> Request {
        Request::FindItem(FindItemRequest {
            folders: folders.to_vec(),
            traversal: self.options.traversal,
            view: FindItemView::IndexedPage {
                offset,
                max_entries: max_entries.clamp(1, self.options.max_find_items),
            },
            restriction,
        })
    }

    pub fn build_get_items(&self, item_ids: &[ItemRef]) -> Request {
        Request::GetItem(GetItemRequest {
            item_ids: item_ids.to_vec(),
            shape: self.options.item_shape,
        })
    }

    pub fn build_delete_items(&self, item_ids: &[ItemRef]) -> Request {
        Request::DeleteItem(DeleteItemRequest {
            item_ids: item_ids.to_vec(),
            disposal: self.options.disposal,
            send_cancellations: self.options.send_cancellations,
        })
    }

    pub fn build_create_calendar_items(
        &self,
        items: &[CalendarItem],
        folder: Option<&FolderRef>,
    ) -> Request {
        Request::CreateItem(CreateItemRequest {
            items: items.to_vec(),
            folder: folder.cloned(),
            send_invitations: self.options.send_invitations,
        })
    }

    pub fn build_update_calendar_item(&self, item: &ItemRef, changes: &[ItemChange]) -> Request {
        Request::UpdateItem(UpdateItemRequest {
            item: item.clone(),
            changes: changes.to_vec(),
            conflict_resolution: self.options.conflict_resolution,
            send_invitations: self.options.send_invitations,
        })
    }

    pub fn build_get_folder(&self, folder: &FolderRef) -> Request {
        Request::GetFolder {
            folders: vec![folder.clone()],
        }
    }

    pub fn build_find_subfolders(&self, parent: DistinguishedFolder) -> Request {
        Request::FindFolder(FindFolderRequest {
            parent: FolderRef::Distinguished(parent),
            traversal: FolderTraversal::Deep,
        })
    }

    pub fn build_create_calendar_folder(&self, display_name: &str) -> Request {
        Request::CreateFolder {
            parent: FolderRef::primary_calendar(),
            display_name: display_name.to_string(),
        }
    }

    pub fn build_delete_folder(&self, folder: &FolderRef) -> Request {
        Request::DeleteFolder {
            folder: folder.clone(),
            disposal: self.options.disposal,
        }
    }

    pub fn build_empty_folder(&self, folder: &FolderRef, delete_sub_folders: bool) -> Request {
        Request::EmptyFolder {
            folders: vec![folder.clone()],
            delete_sub_folders,
        }
    }

    pub fn build_resolve_names(&self, entry: &str, scope: ResolveNamesScope) -> Request {
        Request::ResolveNames(ResolveNamesRequest {
            unresolved_entry: entry.to_string(),
            scope,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FindItemView, ItemRestriction, Request, RequestFactory, RequestOptions};
    use crate::config::MAX_FIND_ITEMS_CEILING;
    use crate::model::interval::DateInterval;
    use crate::model::refs::FolderRef;
    use chrono::{TimeZone, Utc};

    #[test]
    fn date_range_find_defaults_to_primary_calendar() {
        let factory = RequestFactory::default();
        let interval = DateInterval::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let Request::FindItem(find) = factory.build_find_by_date_range(interval, &[]) else {
            panic!("expected FindItem request");
        };
        assert_eq!(find.folders, vec![FolderRef::primary_calendar()]);
        assert_eq!(find.view, FindItemView::Calendar { interval });
    }

    #[test]
    fn page_size_is_clamped_to_server_ceiling() {
        let factory = RequestFactory::new(RequestOptions {
            max_find_items: 5_000,
            ..RequestOptions::default()
        });

        let Request::FindItem(find) = factory.build_find_page(0, u32::MAX, &[FolderRef::id("f1")])
        else {
            panic!("expected FindItem request");
        };
        assert_eq!(
            find.view,
            FindItemView::IndexedPage {
                offset: 0,
                max_entries: MAX_FIND_ITEMS_CEILING,
            }
        );
    }

    #[test]
    fn smaller_page_requests_keep_their_size() {
        let factory = RequestFactory::default();

        let Request::FindItem(find) = factory.build_find_page(40, 250, &[FolderRef::id("f1")])
        else {
            panic!("expected FindItem request");
        };
        assert_eq!(
            find.view,
            FindItemView::IndexedPage {
                offset: 40,
                max_entries: 250,
            }
        );
        assert_eq!(find.restriction, None);
    }

    #[test]
    fn cancelled_page_carries_restriction() {
        let factory = RequestFactory::default();

        let Request::FindItem(find) = factory.build_find_cancelled_page(0, &[FolderRef::id("f1")])
        else {
            panic!("expected FindItem request");
        };
        assert_eq!(find.restriction, Some(ItemRestriction::CancelledCalendarItems));
    }
}
