//! Purpose: Lazy, page-per-user feed of `(Thing, creator)` pairs.
//! Exports: `FeedReader`, `read_feed`.
//! Role: Read workload; one fresh query per user position, nothing cached.
//! Invariants: Pages are fetched in ascending position `0..user_count`; items keep store order within a page.
//! Invariants: Rows decoded before a failure are still yielded; the failure follows them once.
//! Invariants: After the first error the iterator is exhausted.
#![allow(clippy::result_large_err)]

use super::executor::QueryExecutor;
use crate::core::cypher;
use crate::core::error::{Error, ErrorKind};
use crate::core::record::{FeedItem, Thing, User, decode};
use std::collections::VecDeque;

pub struct FeedReader<E> {
    executor: E,
    user_count: usize,
    next_page: usize,
    pending: VecDeque<FeedItem>,
    failed: Option<Error>,
    done: bool,
}

pub fn read_feed<E: QueryExecutor>(executor: E, user_count: usize) -> FeedReader<E> {
    FeedReader {
        executor,
        user_count,
        next_page: 0,
        pending: VecDeque::new(),
        failed: None,
        done: false,
    }
}

impl<E: QueryExecutor> FeedReader<E> {
    pub fn pages_fetched(&self) -> usize {
        self.next_page
    }

    /// Queues rows in store order until one fails to decode.
    fn fetch_page(&mut self, page: usize) -> Result<(), Error> {
        let result = self
            .executor
            .execute(&cypher::feed_page(page))
            .map_err(|err| err.with_page(page))?;
        for row in &result.rows {
            let item = decode_row(page, row).map_err(|err| err.with_page(page))?;
            self.pending.push_back(item);
        }
        tracing::trace!(page, items = result.rows.len(), "feed page fetched");
        Ok(())
    }
}

fn decode_row(page: usize, row: &[serde_json::Value]) -> Result<FeedItem, Error> {
    let [thing, creator] = row else {
        return Err(Error::new(ErrorKind::Decode)
            .with_message(format!("expected 2 cells (t, u) per row, got {}", row.len())));
    };
    Ok(FeedItem {
        page,
        thing: decode::<Thing>(thing)?,
        creator: decode::<User>(creator)?,
    })
}

impl<E: QueryExecutor> Iterator for FeedReader<E> {
    type Item = Result<FeedItem, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.pending.pop_front() {
                return Some(Ok(item));
            }
            if let Some(err) = self.failed.take() {
                return Some(Err(err));
            }
            if self.done || self.next_page >= self.user_count {
                return None;
            }
            let page = self.next_page;
            self.next_page += 1;
            if let Err(err) = self.fetch_page(page) {
                self.done = true;
                self.failed = Some(err);
            }
        }
    }
}

impl<E: QueryExecutor> std::iter::FusedIterator for FeedReader<E> {}
