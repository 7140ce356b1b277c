use super::models::{Record, RecordFilter};
use super::trait_def::DocumentStore;
use anyhow::Result;
use std::collections::VecDeque;

pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Lazy, finite iterator over the documents matching a filter.
///
/// Pages are fetched on demand with keyset pagination, so documents updated
/// while iterating are not seen twice. A read error is yielded once and ends
/// the iteration. To restart, build a new cursor.
pub struct RecordCursor<'a> {
    store: &'a dyn DocumentStore,
    filter: RecordFilter,
    page_size: usize,
    last_rowid: i64,
    buffer: VecDeque<Record>,
    exhausted: bool,
}

impl<'a> RecordCursor<'a> {
    pub fn new(store: &'a dyn DocumentStore, filter: RecordFilter, page_size: usize) -> Self {
        Self {
            store,
            filter,
            page_size: page_size.max(1),
            last_rowid: 0,
            buffer: VecDeque::new(),
            exhausted: false,
        }
    }

    fn fill(&mut self) -> Result<()> {
        let page = self
            .store
            .fetch_page(self.filter, self.last_rowid, self.page_size)?;
        if page.len() < self.page_size {
            self.exhausted = true;
        }
        if let Some(last) = page.last() {
            self.last_rowid = last.rowid;
        }
        self.buffer.extend(page.into_iter().map(|stored| stored.record));
        Ok(())
    }
}

impl Iterator for RecordCursor<'_> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fill() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}
