//! Folder operations of the calendar service.
//!
//! # Responsibility
//! - Look up primary and secondary calendar/task folders.
//! - Create and delete calendar folders, emptying them first on request.
//! - Empty non-calendar folders in a single call.
//!
//! # Invariants
//! - Folder listings contain each folder id at most once.
//! - Every call is retried through the same driver as item operations.

use crate::error::{DaoError, DaoResult};
use crate::gateway::identity::IdentityResolver;
use crate::gateway::parser;
use crate::gateway::transport::Transport;
use crate::model::item::Folder;
use crate::model::refs::{DistinguishedFolder, FolderRef, Principal};
use crate::retry::Sleeper;
use crate::service::calendar_service::CalendarService;
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

impl<T: Transport, R: IdentityResolver, S: Sleeper> CalendarService<T, R, S> {
    /// Returns the folder, or `None` when the server returned none.
    pub fn get_folder(
        &self,
        principal: &Principal,
        folder: &FolderRef,
    ) -> DaoResult<Option<Folder>> {
        let mut principal = principal.clone();
        let folders = self
            .driver()
            .execute("get_folder", &mut principal, |principal| {
                let request = self.requests.build_get_folder(folder);
                self.send(principal, &request, parser::parse_folders)
            })?;
        Ok(folders.into_iter().next())
    }

    pub fn get_primary_calendar_folder(&self, principal: &Principal) -> DaoResult<Option<Folder>> {
        self.get_folder(principal, &FolderRef::Distinguished(DistinguishedFolder::Calendar))
    }

    pub fn get_primary_task_folder(&self, principal: &Principal) -> DaoResult<Option<Folder>> {
        self.get_folder(principal, &FolderRef::Distinguished(DistinguishedFolder::Tasks))
    }

    /// Primary calendar plus every calendar folder beneath it.
    pub fn get_all_calendar_folders(&self, principal: &Principal) -> DaoResult<Vec<Folder>> {
        self.folders_by_type(principal, DistinguishedFolder::Calendar)
    }

    /// Primary task folder plus every task folder beneath it.
    pub fn get_all_task_folders(&self, principal: &Principal) -> DaoResult<Vec<Folder>> {
        self.folders_by_type(principal, DistinguishedFolder::Tasks)
    }

    /// Maps calendar folder id to display name.
    pub fn get_calendar_folder_map(
        &self,
        principal: &Principal,
    ) -> DaoResult<BTreeMap<String, String>> {
        Ok(folder_map(self.get_all_calendar_folders(principal)?))
    }

    pub fn get_task_folder_map(
        &self,
        principal: &Principal,
    ) -> DaoResult<BTreeMap<String, String>> {
        Ok(folder_map(self.get_all_task_folders(principal)?))
    }

    /// Finds a calendar folder by exact display name.
    pub fn get_calendar_folder_id(
        &self,
        principal: &Principal,
        display_name: &str,
    ) -> DaoResult<Option<FolderRef>> {
        let folders = self.get_all_calendar_folders(principal)?;
        Ok(folders
            .into_iter()
            .find(|folder| folder.display_name == display_name)
            .map(|folder| folder.folder_ref))
    }

    /// Creates a calendar folder under the primary calendar.
    pub fn create_calendar_folder(
        &self,
        principal: &Principal,
        display_name: &str,
    ) -> DaoResult<FolderRef> {
        if display_name.trim().is_empty() {
            return Err(DaoError::InvalidArgument(
                "folder display name cannot be blank".to_string(),
            ));
        }
        let mut principal = principal.clone();
        let ids = self
            .driver()
            .execute("create_calendar_folder", &mut principal, |principal| {
                let request = self.requests.build_create_calendar_folder(display_name);
                self.send(principal, &request, parser::parse_created_folder_ids)
            })?;
        let mut ids = ids.into_iter();
        match (ids.next(), ids.next()) {
            (Some(id), None) => {
                info!("event=create_calendar_folder module=service status=ok");
                Ok(id)
            }
            _ => Err(DaoError::InconsistentState(
                "create folder returned other than exactly one folder id",
            )),
        }
    }

    pub fn delete_folder(&self, principal: &Principal, folder: &FolderRef) -> DaoResult<bool> {
        let mut principal = principal.clone();
        self.driver()
            .execute("delete_folder", &mut principal, |principal| {
                let request = self.requests.build_delete_folder(folder);
                self.send(principal, &request, parser::parse_success)
            })
    }

    /// Empties the folder, then deletes it.
    pub fn delete_calendar_folder(
        &self,
        principal: &Principal,
        folder: &FolderRef,
    ) -> DaoResult<bool> {
        let deleted_items = self.empty_calendar_folder(principal, folder)?;
        debug!(
            "event=delete_calendar_folder module=service status=emptied deleted={}",
            deleted_items
        );
        self.delete_folder(principal, folder)
    }

    /// Deletes the folder only when it already holds no items.
    pub fn delete_empty_calendar_folder(
        &self,
        principal: &Principal,
        folder: &FolderRef,
    ) -> DaoResult<bool> {
        if !self.is_empty(principal, folder)? {
            debug!(
                "event=delete_empty_calendar_folder module=service status=skipped reason=not_empty"
            );
            return Ok(false);
        }
        self.delete_folder(principal, folder)
    }

    /// Removes every item of `folder` with one EmptyFolder call.
    ///
    /// # Contract
    /// - The server refuses to empty calendar folders, so the primary
    ///   calendar is `InvalidArgument`; use `empty_calendar_folder` there.
    /// - `delete_sub_folders` also removes the folder's sub-folders.
    pub fn empty_folder(
        &self,
        principal: &Principal,
        folder: &FolderRef,
        delete_sub_folders: bool,
    ) -> DaoResult<bool> {
        if *folder == FolderRef::primary_calendar() {
            return Err(DaoError::InvalidArgument(
                "calendar folders cannot be emptied in one call".to_string(),
            ));
        }
        let mut principal = principal.clone();
        self.driver()
            .execute("empty_folder", &mut principal, |principal| {
                let request = self.requests.build_empty_folder(folder, delete_sub_folders);
                self.send(principal, &request, parser::parse_success)
            })
    }

    fn folders_by_type(
        &self,
        principal: &Principal,
        parent: DistinguishedFolder,
    ) -> DaoResult<Vec<Folder>> {
        let primary = self.get_folder(principal, &FolderRef::Distinguished(parent))?;

        let mut principal = principal.clone();
        let secondary = self
            .driver()
            .execute("find_folders", &mut principal, |principal| {
                let request = self.requests.build_find_subfolders(parent);
                self.send(principal, &request, parser::parse_folders)
            })?;

        let mut seen = BTreeSet::new();
        let mut folders = Vec::new();
        let kind = primary.as_ref().map(|folder| folder.kind);
        if let Some(primary) = primary {
            seen.insert(primary.folder_ref.clone());
            folders.push(primary);
        }
        for folder in secondary {
            if kind.is_some_and(|kind| kind != folder.kind) {
                continue;
            }
            if seen.insert(folder.folder_ref.clone()) {
                folders.push(folder);
            }
        }
        debug!(
            "event=folders_by_type module=service status=ok parent={} found={}",
            parent.as_str(),
            folders.len()
        );
        Ok(folders)
    }
}

fn folder_map(folders: Vec<Folder>) -> BTreeMap<String, String> {
    folders
        .into_iter()
        .filter_map(|folder| {
            let id = folder.folder_ref.server_id()?.to_string();
            Some((id, folder.display_name))
        })
        .collect()
}
