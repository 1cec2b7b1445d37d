//! Calendar and item use-case service.
//!
//! # Responsibility
//! - Expose find/get/create/update/delete operations over one mailbox.
//! - Compose request building, transport calls and response parsing with
//!   the retry driver, date-range splitter and pagination walker.
//!
//! # Invariants
//! - Every remote call goes through `RetryDriver`; callers never observe
//!   intermediate failures.
//! - Preconditions are checked before any transport call.
//! - The caller's principal is never mutated; identity rewrites apply to
//!   the remainder of the same operation only.
//!
//! # See also
//! - crate::service::folder_service for folder operations on this service.

use crate::config::{ConfigError, ExchangeConfig};
use crate::error::{DaoError, DaoResult, ExchangeError};
use crate::gateway::identity::IdentityResolver;
use crate::gateway::parser;
use crate::gateway::request::{Request, RequestFactory, RequestOptions};
use crate::gateway::response::Response;
use crate::gateway::transport::Transport;
use crate::model::interval::DateInterval;
use crate::model::item::{CalendarItem, ExchangeItem, ItemChange, TaskItem};
use crate::model::refs::{FolderRef, ItemRef, Principal};
use crate::paging::PaginationWalker;
use crate::retry::{
    BackoffPolicy, CancellationToken, DateRangeSplitter, RetryDriver, Sleeper, ThreadSleeper,
};
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::time::Instant;

/// Data-access façade over one Exchange endpoint.
///
/// The service holds no per-call state and can be shared across threads
/// (`Arc<CalendarService<..>>`) when its collaborators are `Send + Sync`.
pub struct CalendarService<T, R, S = ThreadSleeper> {
    pub(super) transport: T,
    pub(super) resolver: R,
    pub(super) sleeper: S,
    pub(super) config: ExchangeConfig,
    pub(super) requests: RequestFactory,
    pub(super) splitter: DateRangeSplitter,
    pub(super) backoff: BackoffPolicy,
    pub(super) cancellation: CancellationToken,
}

impl<T: Transport, R: IdentityResolver> CalendarService<T, R, ThreadSleeper> {
    /// Creates a service that blocks the calling thread during backoff.
    pub fn new(transport: T, resolver: R, config: ExchangeConfig) -> Result<Self, ConfigError> {
        Self::with_sleeper(transport, resolver, ThreadSleeper, config)
    }
}

impl<T: Transport, R: IdentityResolver, S: Sleeper> CalendarService<T, R, S> {
    /// Creates a service with an injected backoff sleeper.
    ///
    /// # Contract
    /// - Rejects configurations that fail `ExchangeConfig::validate`.
    /// - Page requests use `config.page_size` entries.
    pub fn with_sleeper(
        transport: T,
        resolver: R,
        sleeper: S,
        config: ExchangeConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let requests = RequestFactory::new(RequestOptions {
            max_find_items: config.page_size,
            ..RequestOptions::default()
        });
        Ok(Self {
            transport,
            resolver,
            sleeper,
            splitter: DateRangeSplitter::new(config.min_split_granularity()?),
            backoff: BackoffPolicy::new(config.backoff_base_unit()),
            requests,
            config,
            cancellation: CancellationToken::new(),
        })
    }

    /// Replaces request-shaping options; the page size stays `config.page_size`.
    pub fn with_request_options(mut self, mut options: RequestOptions) -> Self {
        options.max_find_items = self.config.page_size;
        self.requests = RequestFactory::new(options);
        self
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }

    /// Token shared with every operation of this service.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub(super) fn driver(&self) -> RetryDriver<'_, R, S> {
        RetryDriver::new(
            self.config.max_retries,
            self.backoff,
            &self.resolver,
            &self.sleeper,
            &self.cancellation,
        )
    }

    /// One transport call followed by one parse.
    pub(super) fn send<V>(
        &self,
        principal: &Principal,
        request: &Request,
        parse: fn(&Response) -> Result<V, ExchangeError>,
    ) -> Result<V, ExchangeError> {
        let started = Instant::now();
        let response = self.transport.call(principal, request)?;
        debug!(
            "event=transport_call module=service status=ok op={} duration_ms={}",
            request.operation(),
            started.elapsed().as_millis()
        );
        parse(&response)
    }

    /// Finds calendar item ids intersecting `interval`.
    ///
    /// # Contract
    /// - Empty `folders` searches the primary calendar.
    /// - Count-limit errors bisect the interval; leaf results are unioned.
    pub fn find_calendar_item_ids(
        &self,
        principal: &Principal,
        interval: DateInterval,
        folders: &[FolderRef],
    ) -> DaoResult<BTreeSet<ItemRef>> {
        let mut principal = principal.clone();
        let leaves = self.driver().execute_splitting(
            "find_calendar_item_ids",
            &mut principal,
            interval,
            &self.splitter,
            |principal, window| {
                let request = self.requests.build_find_by_date_range(*window, folders);
                self.send(principal, &request, parser::parse_found_item_ids_unpaged)
            },
        )?;
        let leaf_count = leaves.len();
        let ids: BTreeSet<ItemRef> = leaves.into_iter().flatten().collect();
        info!(
            "event=find_calendar_item_ids module=service status=ok leaves={} found={}",
            leaf_count,
            ids.len()
        );
        Ok(ids)
    }

    /// Returns the first page of item ids only.
    pub fn find_item_ids(
        &self,
        principal: &Principal,
        folders: &[FolderRef],
    ) -> DaoResult<BTreeSet<ItemRef>> {
        require_folders(folders)?;
        let mut principal = principal.clone();
        let page = self
            .driver()
            .execute("find_item_ids", &mut principal, |principal| {
                let request = self
                    .requests
                    .build_find_page(0, self.config.page_size, folders);
                self.send(principal, &request, parser::parse_found_item_ids)
            })?;
        Ok(page.items.into_iter().collect())
    }

    /// Walks every page of a shallow find over `folders`.
    pub fn find_all_item_ids(
        &self,
        principal: &Principal,
        folders: &[FolderRef],
    ) -> DaoResult<BTreeSet<ItemRef>> {
        require_folders(folders)?;
        let mut principal = principal.clone();
        let driver = self.driver();
        let walker = PaginationWalker::new(&driver, self.config.max_page_iterations);
        let ids = walker.walk("find_all_item_ids", &mut principal, |principal, cursor| {
            let request = self
                .requests
                .build_find_page(cursor.offset(), self.config.page_size, folders);
            self.send(principal, &request, parser::parse_found_item_ids)
        })?;
        Ok(ids.into_iter().collect())
    }

    /// Fetches items of any kind; an empty id set makes no call.
    pub fn get_items(
        &self,
        principal: &Principal,
        item_ids: &[ItemRef],
    ) -> DaoResult<Vec<ExchangeItem>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut principal = principal.clone();
        self.driver()
            .execute("get_items", &mut principal, |principal| {
                let request = self.requests.build_get_items(item_ids);
                self.send(principal, &request, parser::parse_items)
            })
    }

    /// Fetches calendar items.
    ///
    /// Non-calendar items in the reply are dropped and logged, not raised.
    pub fn get_calendar_items(
        &self,
        principal: &Principal,
        item_ids: &[ItemRef],
    ) -> DaoResult<Vec<CalendarItem>> {
        let items = self.get_items(principal, item_ids)?;
        let mut calendar_items = Vec::with_capacity(items.len());
        for item in items {
            match item {
                ExchangeItem::Calendar(calendar_item) => calendar_items.push(calendar_item),
                other => warn!(
                    "event=get_calendar_items module=service status=dropped kind={}",
                    other.kind_name()
                ),
            }
        }
        Ok(calendar_items)
    }

    pub fn get_calendar_item(
        &self,
        principal: &Principal,
        item_id: &ItemRef,
    ) -> DaoResult<Option<CalendarItem>> {
        let items = self.get_calendar_items(principal, std::slice::from_ref(item_id))?;
        Ok(items.into_iter().next())
    }

    /// Finds ids in `interval`, then fetches them in page-sized batches.
    pub fn get_calendar_items_in_range(
        &self,
        principal: &Principal,
        interval: DateInterval,
        folders: &[FolderRef],
    ) -> DaoResult<Vec<CalendarItem>> {
        let ids: Vec<ItemRef> = self
            .find_calendar_item_ids(principal, interval, folders)?
            .into_iter()
            .collect();
        let mut items = Vec::with_capacity(ids.len());
        for batch in ids.chunks(self.config.page_size as usize) {
            items.extend(self.get_calendar_items(principal, batch)?);
        }
        Ok(items)
    }

    /// Fetches task items; other kinds are dropped and logged.
    pub fn get_task_items(
        &self,
        principal: &Principal,
        item_ids: &[ItemRef],
    ) -> DaoResult<Vec<TaskItem>> {
        let items = self.get_items(principal, item_ids)?;
        let mut tasks = Vec::with_capacity(items.len());
        for item in items {
            match item {
                ExchangeItem::Task(task) => tasks.push(task),
                other => warn!(
                    "event=get_task_items module=service status=dropped kind={}",
                    other.kind_name()
                ),
            }
        }
        Ok(tasks)
    }

    /// Creates one calendar item, in `folder` or the primary calendar.
    ///
    /// # Contract
    /// - Returns the id of the created item.
    /// - A reply with other than exactly one id is `InconsistentState`.
    pub fn create_calendar_item(
        &self,
        principal: &Principal,
        item: &CalendarItem,
        folder: Option<&FolderRef>,
    ) -> DaoResult<ItemRef> {
        if item.end < item.start {
            return Err(DaoError::InvalidArgument(
                "calendar item end must not precede its start".to_string(),
            ));
        }
        let mut principal = principal.clone();
        let ids = self
            .driver()
            .execute("create_calendar_item", &mut principal, |principal| {
                let request = self
                    .requests
                    .build_create_calendar_items(std::slice::from_ref(item), folder);
                self.send(principal, &request, parser::parse_created_item_ids)
            })?;
        single_id(ids, "create returned other than exactly one item id")
    }

    /// Applies `changes` to an existing calendar item and returns its new id.
    pub fn update_calendar_item(
        &self,
        principal: &Principal,
        item_id: &ItemRef,
        changes: &[ItemChange],
    ) -> DaoResult<ItemRef> {
        if changes.is_empty() {
            return Err(DaoError::InvalidArgument(
                "item changes cannot be empty".to_string(),
            ));
        }
        let mut principal = principal.clone();
        let ids = self
            .driver()
            .execute("update_calendar_item", &mut principal, |principal| {
                let request = self.requests.build_update_calendar_item(item_id, changes);
                self.send(principal, &request, parser::parse_updated_item_ids)
            })?;
        single_id(ids, "update returned other than exactly one item id")
    }

    /// Deletes calendar items.
    ///
    /// # Contract
    /// - Empty `item_ids` is `InvalidArgument`; transport is not contacted.
    /// - Returns `true` when the server acknowledged the delete.
    pub fn delete_calendar_items(
        &self,
        principal: &Principal,
        item_ids: &[ItemRef],
    ) -> DaoResult<bool> {
        if item_ids.is_empty() {
            return Err(DaoError::InvalidArgument(
                "item ids cannot be empty".to_string(),
            ));
        }
        let mut principal = principal.clone();
        self.delete_with(&mut principal, item_ids)
    }

    fn delete_with(&self, principal: &mut Principal, item_ids: &[ItemRef]) -> DaoResult<bool> {
        self.driver()
            .execute("delete_calendar_items", principal, |principal| {
                let request = self.requests.build_delete_items(item_ids);
                self.send(principal, &request, parser::parse_success)
            })
    }

    /// Deletes every item in `folder`, `delete_batch_size` ids at a time.
    ///
    /// # Contract
    /// - Each round finds at most `delete_batch_size` ids and deletes them.
    /// - Re-queries the first page after each batch until it comes back empty.
    /// - Returns the number of ids submitted for deletion.
    /// - More than `max_page_iterations` non-empty rounds is `PagingStalled`.
    pub fn empty_calendar_folder(
        &self,
        principal: &Principal,
        folder: &FolderRef,
    ) -> DaoResult<usize> {
        let mut principal = principal.clone();
        let folders = std::slice::from_ref(folder);
        let driver = self.driver();
        let started = Instant::now();
        let batch_size = u32::try_from(self.config.delete_batch_size).unwrap_or(u32::MAX);
        let mut deleted = 0usize;

        for round in 0..self.config.max_page_iterations {
            let page = driver.execute("empty_calendar_folder", &mut principal, |principal| {
                let request = self.requests.build_find_page(0, batch_size, folders);
                self.send(principal, &request, parser::parse_found_item_ids)
            })?;
            if page.items.is_empty() {
                info!(
                    "event=empty_calendar_folder module=service status=ok rounds={} deleted={} duration_ms={}",
                    round,
                    deleted,
                    started.elapsed().as_millis()
                );
                return Ok(deleted);
            }

            let batch: Vec<ItemRef> = page
                .items
                .into_iter()
                .take(self.config.delete_batch_size)
                .collect();
            if !self.delete_with(&mut principal, &batch)? {
                return Err(DaoError::InconsistentState(
                    "delete returned no response messages",
                ));
            }
            deleted += batch.len();
            debug!(
                "event=empty_calendar_folder module=service status=batch round={} batch={} deleted={}",
                round + 1,
                batch.len(),
                deleted
            );
        }

        Err(DaoError::PagingStalled {
            operation: "empty_calendar_folder",
            pages: self.config.max_page_iterations,
            offset: 0,
        })
    }

    /// Deletes every cancelled calendar item in `folder`, page by page.
    ///
    /// # Contract
    /// - Each page is deleted, in `delete_batch_size` chunks, before the
    ///   next page is requested.
    /// - Returns the number of ids submitted for deletion.
    /// - A non-advancing offset or more than `max_page_iterations` pages is
    ///   `PagingStalled`.
    pub fn purge_cancelled_calendar_items(
        &self,
        principal: &Principal,
        folder: &FolderRef,
    ) -> DaoResult<usize> {
        let mut principal = principal.clone();
        let folders = std::slice::from_ref(folder);
        let driver = self.driver();
        let walker = PaginationWalker::new(&driver, self.config.max_page_iterations);
        let mut purged = 0usize;

        let pages = walker.for_each_page(
            "purge_cancelled_calendar_items",
            &mut principal,
            |principal, cursor| {
                let request = self
                    .requests
                    .build_find_cancelled_page(cursor.offset(), folders);
                self.send(principal, &request, parser::parse_found_item_ids)
            },
            |principal, ids| {
                for batch in ids.chunks(self.config.delete_batch_size) {
                    if !self.delete_with(principal, batch)? {
                        return Err(DaoError::InconsistentState(
                            "delete returned no response messages",
                        ));
                    }
                    purged += batch.len();
                }
                Ok(())
            },
        )?;
        info!(
            "event=purge_cancelled_calendar_items module=service status=ok pages={} deleted={}",
            pages, purged
        );
        Ok(purged)
    }

    /// Returns `true` when the first page of `folder` has no items.
    pub fn is_empty(&self, principal: &Principal, folder: &FolderRef) -> DaoResult<bool> {
        let ids = self.find_item_ids(principal, std::slice::from_ref(folder))?;
        Ok(ids.is_empty())
    }
}

fn require_folders(folders: &[FolderRef]) -> DaoResult<()> {
    if folders.is_empty() {
        return Err(DaoError::InvalidArgument(
            "folder ids cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn single_id<I>(ids: Vec<I>, details: &'static str) -> DaoResult<I> {
    let mut ids = ids.into_iter();
    match (ids.next(), ids.next()) {
        (Some(id), None) => Ok(id),
        _ => Err(DaoError::InconsistentState(details)),
    }
}
