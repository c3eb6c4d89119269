//! Pagination processor
//!
//! Turns the rows fetched for a plan into a page plus its metadata. The same
//! row-fetch path serves both modes:
//!
//! - **Cursor**: the plan fetched `limit + 1` rows; the extra sentinel row
//!   only tells us whether another page exists.
//! - **Offset**: the plan fetched `limit` rows after skipping `offset`. With a
//!   total count the page math is exact; without one, a full page is taken
//!   to mean there may be more.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::cursor::Cursor;

/// Rows that can mint a cursor for the row after them
pub trait Paginated {
    fn cursor_id(&self) -> Uuid;
    fn cursor_timestamp(&self) -> DateTime<Utc>;
}

/// How the rows of a page were selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMode {
    Cursor,
    Offset {
        offset: u64,
        /// `None` when counting failed or was not attempted
        total_count: Option<u64>,
    },
}

/// Pagination metadata returned with every page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Pagination {
    /// Token for the following page, absent on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_token: Option<String>,

    pub has_next: bool,

    pub has_prev: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,

    /// 1-based
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

/// A page of items and how it relates to its neighbours
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

fn saturating_u32(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Build a page from fetched rows
///
/// `limit` is the page size the caller asked for, not the number of rows
/// fetched (cursor plans fetch one more).
pub fn paginate<T: Paginated>(mut rows: Vec<T>, limit: u64, mode: PageMode) -> Page<T> {
    let limit = limit.max(1);
    let fetched = rows.len() as u64;

    let mut pagination = Pagination::default();

    match mode {
        PageMode::Cursor => {
            pagination.has_next = fetched > limit;
            pagination.has_prev = true;
            if pagination.has_next {
                rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
            }
        }
        PageMode::Offset {
            offset,
            total_count: None,
        } => {
            pagination.has_next = fetched == limit;
            pagination.has_prev = offset > 0;
        }
        PageMode::Offset {
            offset,
            total_count: Some(total),
        } => {
            let current_page = offset / limit + 1;
            let total_pages = total.div_ceil(limit);

            pagination.has_next = current_page < total_pages;
            pagination.has_prev = current_page > 1;
            pagination.total_count = Some(total);
            pagination.current_page = Some(saturating_u32(current_page));
            pagination.total_pages = Some(saturating_u32(total_pages));
        }
    }

    if pagination.has_next {
        pagination.next_token = rows
            .last()
            .map(|row| Cursor::new(row.cursor_id(), row.cursor_timestamp()).encode())
            .filter(|token| !token.is_empty());
    }

    Page {
        items: rows,
        pagination,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: Uuid,
        created_at: DateTime<Utc>,
    }

    impl Paginated for Row {
        fn cursor_id(&self) -> Uuid {
            self.id
        }

        fn cursor_timestamp(&self) -> DateTime<Utc> {
            self.created_at
        }
    }

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|_| Row {
                id: Uuid::now_v7(),
                created_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_offset_without_count_first_page() {
        let page = paginate(
            rows(10),
            10,
            PageMode::Offset {
                offset: 0,
                total_count: None,
            },
        );
        assert!(page.pagination.has_next);
        assert!(!page.pagination.has_prev);
        assert!(page.pagination.total_count.is_none());
        assert!(page.pagination.current_page.is_none());
        assert!(page.pagination.next_token.is_some());
    }

    #[test]
    fn test_offset_without_count_has_prev_follows_offset() {
        for offset in [0_u64, 1, 7, 50] {
            let page = paginate(
                rows(3),
                10,
                PageMode::Offset {
                    offset,
                    total_count: None,
                },
            );
            assert_eq!(page.pagination.has_prev, offset > 0);
            assert!(!page.pagination.has_next);
            assert!(page.pagination.next_token.is_none());
        }
    }

    #[test]
    fn test_offset_with_count_last_page() {
        let page = paginate(
            rows(5),
            10,
            PageMode::Offset {
                offset: 20,
                total_count: Some(25),
            },
        );
        let p = &page.pagination;
        assert_eq!(p.current_page, Some(3));
        assert_eq!(p.total_pages, Some(3));
        assert!(!p.has_next);
        assert!(p.has_prev);
        assert_eq!(p.total_count, Some(25));
    }

    #[test]
    fn test_offset_with_zero_count() {
        let page = paginate(
            rows(0),
            10,
            PageMode::Offset {
                offset: 0,
                total_count: Some(0),
            },
        );
        let p = &page.pagination;
        assert_eq!(p.current_page, Some(1));
        assert_eq!(p.total_pages, Some(0));
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_count_overrides_full_page_heuristic() {
        // Exactly one full page: the heuristic alone would claim more
        let page = paginate(
            rows(10),
            10,
            PageMode::Offset {
                offset: 0,
                total_count: Some(10),
            },
        );
        assert!(!page.pagination.has_next);
        assert!(page.pagination.next_token.is_none());
    }

    #[test]
    fn test_current_page_consistent_with_offset() {
        let limit = 10;
        for offset in (0..200).step_by(10) {
            let page = paginate(
                rows(0),
                limit,
                PageMode::Offset {
                    offset,
                    total_count: Some(200),
                },
            );
            let current = u64::from(page.pagination.current_page.unwrap());
            assert!(current * limit >= offset);
            assert_eq!((current - 1) * limit, offset);
        }
    }

    #[test]
    fn test_cursor_sentinel_row_is_dropped() {
        let fetched = rows(5);
        let page = paginate(fetched.clone(), 1, PageMode::Cursor);
        assert_eq!(page.items, vec![fetched[0].clone()]);
        assert!(page.pagination.has_next);
        assert!(page.pagination.has_prev);
        assert!(page.pagination.total_count.is_none());

        let token = page.pagination.next_token.unwrap();
        let cursor = Cursor::decode(&token).unwrap();
        assert_eq!(cursor.last_id, Some(fetched[0].id));
        assert_eq!(cursor.timestamp, fetched[0].created_at);
    }

    #[test]
    fn test_cursor_exact_page_has_no_next() {
        let page = paginate(rows(5), 5, PageMode::Cursor);
        assert_eq!(page.items.len(), 5);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.next_token.is_none());
    }

    #[test]
    fn test_total_pages_saturates() {
        let page = paginate(
            rows(0),
            1,
            PageMode::Offset {
                offset: 0,
                total_count: Some(u64::MAX),
            },
        );
        assert_eq!(page.pagination.total_pages, Some(u32::MAX));
    }

    #[test]
    fn test_zero_limit_is_treated_as_one() {
        let page = paginate(rows(2), 0, PageMode::Cursor);
        assert_eq!(page.items.len(), 1);
        assert!(page.pagination.has_next);
    }
}
