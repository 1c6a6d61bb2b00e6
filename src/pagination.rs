// SPDX-License-Identifier: MIT

//! Page-number pagination with a `limit` override.

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

pub const DEFAULT_PAGE_SIZE: i64 = 6;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw pagination query parameters. Kept as strings so an unparseable
/// `page` maps to the 404 contract while an unparseable `limit` silently
/// falls back to the default size.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn invalid_page() -> ApiError {
    ApiError::NotFound("Неправильная страница.".to_string())
}

impl PageQuery {
    /// 1-based page number.
    pub fn page(&self) -> Result<i64> {
        match &self.page {
            None => Ok(1),
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or_else(invalid_page),
        }
    }

    /// Effective page size: the `limit` override capped at
    /// [`MAX_PAGE_SIZE`], or the default.
    pub fn page_size(&self) -> i64 {
        self.limit
            .as_deref()
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|limit| *limit > 0)
            .map(|limit| limit.min(MAX_PAGE_SIZE))
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Row offset for the requested page.
    pub fn offset(&self) -> Result<i64> {
        Ok((self.page()? - 1) * self.page_size())
    }
}

/// Paginated list envelope.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Build the envelope for one fetched page.
///
/// `path` is the request path used for the absolute next/previous links;
/// a page past the end of the list is the 404 contract.
pub fn build_page<T>(
    results: Vec<T>,
    count: i64,
    query: &PageQuery,
    site_url: &str,
    path: &str,
) -> Result<Page<T>> {
    let page = query.page()?;
    let page_size = query.page_size();
    let num_pages = ((count + page_size - 1) / page_size).max(1);
    if page > num_pages {
        return Err(invalid_page());
    }

    let link = |target: i64| {
        let mut params = Vec::new();
        if target > 1 {
            params.push(format!("page={target}"));
        }
        if let Some(limit) = &query.limit {
            params.push(format!("limit={limit}"));
        }
        if params.is_empty() {
            format!("{site_url}{path}")
        } else {
            format!("{site_url}{path}?{}", params.join("&"))
        }
    };

    Ok(Page {
        count,
        next: (page < num_pages).then(|| link(page + 1)),
        previous: (page > 1).then(|| link(page - 1)),
        results,
    })
}
