//! Filter, sort and paginate record collections.
//!
//! The engine holds no state: criteria and sort state come in as values and
//! a fresh collection comes out.

pub mod filter;
pub mod sort;

use serde::{Deserialize, Serialize};

use crate::errors::AnalyticsError;
use filter::{FilterCriteria, Queryable};
use sort::{sort_records, SortState};

/// Filter then (optionally) sort.
pub fn apply<T: Queryable>(records: &[T], criteria: &FilterCriteria, sort: Option<SortState>) -> Vec<T> {
    let mut out: Vec<T> = records
        .iter()
        .filter(|r| criteria.matches(*r))
        .cloned()
        .collect();
    if let Some(state) = sort {
        sort_records(&mut out, state);
    }
    out
}

/// 1-based page request. Page 0 is read as page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: usize,
    pub per_page: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult<T> {
    pub items: Vec<T>,
    /// Matches before pagination.
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

/// Filter, sort, then slice one page. `total` counts every match.
pub fn query<T: Queryable>(
    records: &[T],
    criteria: &FilterCriteria,
    sort: Option<SortState>,
    page: Page,
) -> Result<QueryResult<T>, AnalyticsError> {
    if page.per_page == 0 {
        return Err(AnalyticsError::InvalidPage);
    }
    let matched = apply(records, criteria, sort);
    let total = matched.len();
    let page_no = page.page.max(1);
    let items = matched
        .into_iter()
        .skip((page_no - 1).saturating_mul(page.per_page))
        .take(page.per_page)
        .collect();

    Ok(QueryResult {
        items,
        total,
        page: page_no,
        per_page: page.per_page,
        total_pages: total.div_ceil(page.per_page),
    })
}
