use serde::{Deserialize, Serialize};

use crate::config;

/// Optional `page` / `per_page` query parameters accepted by list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    /// Clamp to configured bounds; page numbers are 1-based
    pub fn resolve(&self) -> (i64, i64) {
        let cfg = &config::config().pagination;
        let per_page = self
            .per_page
            .unwrap_or(cfg.default_per_page)
            .clamp(1, cfg.max_per_page);
        let page = self.page.unwrap_or(1).max(1);
        (page, per_page)
    }

    pub fn offset(page: i64, per_page: i64) -> i64 {
        (page - 1) * per_page
    }
}

/// One page of results plus the counts the client pages with
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub pages: i64,
    pub page: i64,
    pub per_page: i64,
}

impl<T: Serialize> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: i64, per_page: i64) -> Self {
        let pages = if total == 0 { 0 } else { (total + per_page - 1) / per_page };
        Self { items, total, pages, page, per_page }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_missing() {
        let q = PageQuery::default();
        let (page, per_page) = q.resolve();
        assert_eq!(page, 1);
        assert!(per_page > 0);
    }

    #[test]
    fn page_count_rounds_up() {
        let p = Paginated::new(vec![1, 2, 3], 41, 1, 20);
        assert_eq!(p.pages, 3);
        let empty: Paginated<i64> = Paginated::new(vec![], 0, 1, 20);
        assert_eq!(empty.pages, 0);
    }
}
