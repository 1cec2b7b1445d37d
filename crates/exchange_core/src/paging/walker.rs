//! Walks indexed pages to exhaustion through the retry driver.
//!
//! # Responsibility
//! - Fetch pages from offset 0 until the server reports the last page,
//!   retrying each page as its own chain.
//!
//! # Invariants
//! - The server's "includes last item" flag is the only normal exit.
//! - A non-advancing offset or more than `max_pages` pages fails with
//!   `DaoError::PagingStalled` instead of looping.

use crate::error::{DaoError, DaoResult, ExchangeError};
use crate::gateway::identity::IdentityResolver;
use crate::model::refs::Principal;
use crate::paging::{Page, PageCursor};
use crate::retry::driver::{RetryDriver, Sleeper};
use log::{debug, error};

pub struct PaginationWalker<'d, 'a, R: ?Sized, S: ?Sized> {
    driver: &'d RetryDriver<'a, R, S>,
    max_pages: u32,
}

impl<'d, 'a, R, S> PaginationWalker<'d, 'a, R, S>
where
    R: IdentityResolver + ?Sized,
    S: Sleeper + ?Sized,
{
    pub fn new(driver: &'d RetryDriver<'a, R, S>, max_pages: u32) -> Self {
        Self {
            driver,
            max_pages: max_pages.max(1),
        }
    }

    /// Returns every item of every page in page order.
    pub fn walk<T, F>(
        &self,
        operation: &'static str,
        principal: &mut Principal,
        fetch: F,
    ) -> DaoResult<Vec<T>>
    where
        F: FnMut(&Principal, PageCursor) -> Result<Page<T>, ExchangeError>,
    {
        let mut items = Vec::new();
        self.for_each_page(operation, principal, fetch, |_, page| {
            items.extend(page);
            Ok(())
        })?;
        Ok(items)
    }

    /// Hands each page's items to `visit` before the next page is fetched.
    ///
    /// `visit` runs outside the retry chain and sees the principal as
    /// rewritten so far. Returns the number of pages fetched.
    pub fn for_each_page<T, F, V>(
        &self,
        operation: &'static str,
        principal: &mut Principal,
        mut fetch: F,
        mut visit: V,
    ) -> DaoResult<u32>
    where
        F: FnMut(&Principal, PageCursor) -> Result<Page<T>, ExchangeError>,
        V: FnMut(&mut Principal, Vec<T>) -> DaoResult<()>,
    {
        let mut cursor = PageCursor::start();
        let mut pages: u32 = 0;
        let mut seen: usize = 0;

        while !cursor.is_exhausted() {
            if pages >= self.max_pages {
                error!(
                    "event=paging module=paging status=error op={} reason=page_cap pages={} offset={}",
                    operation,
                    pages,
                    cursor.offset()
                );
                return Err(DaoError::PagingStalled {
                    operation,
                    pages,
                    offset: cursor.offset(),
                });
            }

            let page = self
                .driver
                .execute(operation, principal, |principal: &Principal| {
                    fetch(principal, cursor)
                })?;
            pages += 1;
            seen += page.items.len();
            let next = page.next;
            visit(principal, page.items)?;

            cursor = match cursor.advance(next) {
                Some(advanced) => advanced,
                None => {
                    error!(
                        "event=paging module=paging status=error op={} reason=offset_not_advancing pages={} offset={} next={:?}",
                        operation,
                        pages,
                        cursor.offset(),
                        next
                    );
                    return Err(DaoError::PagingStalled {
                        operation,
                        pages,
                        offset: cursor.offset(),
                    });
                }
            };
        }

        debug!(
            "event=paging module=paging status=ok op={} pages={} items={}",
            operation, pages, seen
        );
        Ok(pages)
    }
}
