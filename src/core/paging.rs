//! Paging Guard
//!
//! Client supplied offset/limit are merged with configured defaults and
//! checked before any data is fetched. The resolved [`PagingWindow`] is then
//! applied to an ordered sequence, yielding one page and the total count.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::core::error::ValidationError;

/// Upper bound on the page size a client may request
pub const MAX_LIMIT: usize = 100;

/// Page size used when neither the request nor the configuration sets one
pub const DEFAULT_LIMIT: usize = 25;

/// Paging parameters as sent by the client
///
/// # Example
/// ```rust,ignore
/// GET /api/worlds?offset=50&limit=25
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingOptions {
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

/// Server-side paging defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingDefaults {
    pub offset: usize,
    pub limit: usize,
}

impl Default for PagingDefaults {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// A fully resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingWindow {
    pub offset: usize,
    pub limit: usize,
}

impl PagingWindow {
    /// Merge requested options with defaults and validate the result
    ///
    /// Offset must be at least 0 and limit must lie in `1..=MAX_LIMIT`.
    pub fn resolve(
        requested: &PagingOptions,
        defaults: PagingDefaults,
    ) -> Result<Self, ValidationError> {
        let offset = match requested.offset {
            Some(offset) if offset < 0 => return Err(ValidationError::OffsetOutOfRange { offset }),
            Some(offset) => usize::try_from(offset)
                .map_err(|_| ValidationError::OffsetOutOfRange { offset })?,
            None => defaults.offset,
        };

        // a configured default goes through the same bounds check as a request
        let limit = requested
            .limit
            .unwrap_or_else(|| i64::try_from(defaults.limit).unwrap_or(i64::MAX));
        let limit = usize::try_from(limit)
            .ok()
            .filter(|l| (1..=MAX_LIMIT).contains(l))
            .ok_or(ValidationError::LimitOutOfRange {
                limit,
                max: MAX_LIMIT,
            })?;

        Ok(Self { offset, limit })
    }

    /// Index range of this window within `total` items
    pub fn range(&self, total: usize) -> Range<usize> {
        let start = self.offset.min(total);
        let end = self.offset.saturating_add(self.limit).min(total);
        start..end
    }

    /// Take one page out of an ordered sequence
    ///
    /// Only the items inside the window are kept; the rest are counted and
    /// dropped.
    pub fn apply<T, I>(&self, ordered: I) -> PagedResults<T>
    where
        I: IntoIterator<Item = T>,
    {
        let mut total_size = 0;
        let mut items = Vec::with_capacity(self.limit);
        for (index, item) in ordered.into_iter().enumerate() {
            total_size += 1;
            if index >= self.offset && items.len() < self.limit {
                items.push(item);
            }
        }
        PagedResults { items, total_size }
    }

    /// Offset of the next page, if there is one
    pub fn next_offset(&self, total: usize) -> Option<usize> {
        let next = self.offset.saturating_add(self.limit);
        (next < total).then_some(next)
    }

    /// Offset of the previous page, if there is one
    pub fn previous_offset(&self) -> Option<usize> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.limit))
    }

    /// Offset of the last page, if the collection is non-empty
    pub fn last_offset(&self, total: usize) -> Option<usize> {
        (total > 0).then(|| ((total - 1) / self.limit) * self.limit)
    }

    /// Options that reproduce this window
    pub fn to_options(&self) -> PagingOptions {
        PagingOptions {
            offset: i64::try_from(self.offset).ok(),
            limit: i64::try_from(self.limit).ok(),
        }
    }
}

/// One page of items plus the size of the whole filtered collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResults<T> {
    pub items: Vec<T>,
    pub total_size: usize,
}

impl<T> PagedResults<T> {
    pub fn new(items: Vec<T>, total_size: usize) -> Self {
        Self { items, total_size }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    /// Convert each item, keeping the total
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> PagedResults<U> {
        PagedResults {
            items: self.items.into_iter().map(f).collect(),
            total_size: self.total_size,
        }
    }
}
