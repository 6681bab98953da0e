//! Lazy traversal of paged list endpoints.
//!
//! The API caps `per_page` at 30, so large listings (changesets) are fetched
//! page by page as the consumer walks them. Pages are cached for the lifetime
//! of the [`PagedResult`]; rewinding replays the cache without new requests.

use std::collections::BTreeMap;

use tracing::debug;

use crate::client::{Params, Record};
use crate::error::{ApiError, Result};

/// Anything that can fetch one page of unwrapped records.
pub trait PageSource {
    fn fetch_page(&self, path: &str, params: &Params) -> Result<Vec<Record>>;
}

impl<T: PageSource + ?Sized> PageSource for &T {
    fn fetch_page(&self, path: &str, params: &Params) -> Result<Vec<Record>> {
        (**self).fetch_page(path, params)
    }
}

/// Number of records requested per page, `1..=30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(u32);

impl PageSize {
    /// Largest page the server hands out.
    pub const MAX: u32 = 30;

    pub fn new(n: u32) -> Result<Self> {
        if (1..=Self::MAX).contains(&n) {
            Ok(Self(n))
        } else {
            Err(ApiError::InvalidPageSize(n))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(Self::MAX)
    }
}

impl TryFrom<u32> for PageSize {
    type Error = ApiError;

    fn try_from(n: u32) -> Result<Self> {
        Self::new(n)
    }
}

#[derive(Debug)]
struct Page {
    records: Vec<Record>,
    cursor: usize,
}

/// Iterator over every record of a paged endpoint.
///
/// Item `i` of the sequence is item `i % per_page` of page `i / per_page + 1`.
/// A page holding fewer (or more) than `per_page` records is the last one, so
/// when the total is an exact multiple of the page size one extra, empty page
/// is requested before the sequence ends.
///
/// Construction does no I/O. The first call to [`Iterator::next`] (or
/// [`PagedResult::rewind`]) fetches page 1; later pages are fetched when the
/// previous one is exhausted. After an error the iterator yields `None` until
/// it is rewound.
#[derive(Debug)]
pub struct PagedResult<S> {
    source: S,
    path: String,
    params: Params,
    per_page: PageSize,
    pages: BTreeMap<u32, Page>,
    page: u32,
    last_page: bool,
    positioned: bool,
    pending: bool,
    failed: bool,
}

impl<S: PageSource> PagedResult<S> {
    pub fn new(source: S, path: impl Into<String>, params: Params) -> Self {
        Self {
            source,
            path: path.into(),
            params,
            per_page: PageSize::default(),
            pages: BTreeMap::new(),
            page: 1,
            last_page: false,
            positioned: false,
            pending: false,
            failed: false,
        }
    }

    /// Only meaningful before the first page is fetched.
    pub fn with_page_size(mut self, per_page: PageSize) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn page_size(&self) -> PageSize {
        self.per_page
    }

    /// Number of pages fetched so far.
    pub fn cached_pages(&self) -> usize {
        self.pages.len()
    }

    /// Current page number (1-based).
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Whether the current page is known to be the last.
    pub fn is_last_page(&self) -> bool {
        self.last_page
    }

    /// Position at the first record, fetching page 1 if nothing is cached.
    pub fn rewind(&mut self) -> Result<()> {
        self.failed = false;
        if self.pages.is_empty() {
            self.load(1)?;
        } else {
            for page in self.pages.values_mut() {
                page.cursor = 0;
            }
        }
        self.page = 1;
        self.last_page = self.is_final(1);
        self.positioned = true;
        self.pending = true;
        Ok(())
    }

    pub fn valid(&self) -> bool {
        self.positioned
            && self
                .pages
                .get(&self.page)
                .is_some_and(|p| p.cursor < p.records.len())
    }

    pub fn current(&self) -> Option<&Record> {
        if !self.positioned {
            return None;
        }
        let p = self.pages.get(&self.page)?;
        p.records.get(p.cursor)
    }

    /// Global index of the current record.
    pub fn key(&self) -> Option<usize> {
        let p = self.pages.get(&self.page)?;
        (self.positioned && p.cursor < p.records.len())
            .then(|| (self.page as usize - 1) * self.per_page.get() as usize + p.cursor)
    }

    /// Step to the next record, crossing into the next page when needed.
    pub fn advance(&mut self) -> Result<()> {
        let Some(p) = self.pages.get_mut(&self.page) else {
            return Ok(());
        };
        if p.cursor < p.records.len() {
            p.cursor += 1;
        }
        if p.cursor < p.records.len() || self.last_page {
            self.pending = true;
            return Ok(());
        }

        let next = self.page + 1;
        if let Some(cached) = self.pages.get_mut(&next) {
            cached.cursor = 0;
        } else {
            self.load(next)?;
        }
        self.page = next;
        self.last_page = self.is_final(next);
        self.pending = true;
        Ok(())
    }

    fn load(&mut self, page: u32) -> Result<()> {
        let mut params = self.params.clone();
        params.insert("page".to_string(), page.to_string());
        params.insert("per_page".to_string(), self.per_page.get().to_string());
        let records = self.source.fetch_page(&self.path, &params)?;
        debug!(
            path = %self.path,
            page,
            records = records.len(),
            last = records.len() != self.per_page.get() as usize,
            "fetched page"
        );
        self.pages.insert(page, Page { records, cursor: 0 });
        Ok(())
    }

    fn is_final(&self, page: u32) -> bool {
        self.pages
            .get(&page)
            .is_none_or(|p| p.records.len() != self.per_page.get() as usize)
    }
}

impl<S: PageSource> Iterator for PagedResult<S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let step = if !self.positioned {
            self.rewind()
        } else if !self.pending {
            self.advance()
        } else {
            Ok(())
        };
        if let Err(e) = step {
            self.failed = true;
            return Some(Err(e));
        }
        let record = self.current()?.clone();
        self.pending = false;
        Some(Ok(record))
    }
}
