//! Indexed paging state and the pagination walker.
//!
//! # Invariants
//! - A cursor starts at offset 0; offset 0 is never a "continue" signal.
//! - Once exhausted, a cursor never advances again.

pub mod walker;

pub use walker::PaginationWalker;

/// Where the next page starts, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    Offset(u32),
    Exhausted,
}

/// One parsed page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: NextPage,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next: NextPage::Exhausted,
        }
    }

    pub fn continues_at(items: Vec<T>, offset: u32) -> Self {
        Self {
            items,
            next: NextPage::Offset(offset),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    offset: u32,
    exhausted: bool,
}

impl PageCursor {
    pub fn start() -> Self {
        Self {
            offset: 0,
            exhausted: false,
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Moves to `next`; `None` when the offset would not advance.
    pub fn advance(&self, next: NextPage) -> Option<Self> {
        if self.exhausted {
            return None;
        }
        match next {
            NextPage::Exhausted => Some(Self {
                offset: self.offset,
                exhausted: true,
            }),
            NextPage::Offset(offset) if offset > self.offset => Some(Self {
                offset,
                exhausted: false,
            }),
            NextPage::Offset(_) => None,
        }
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::start()
    }
}
