use serde::Deserialize;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Raw `page`/`limit` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// Clamps the request to a valid page: `page >= 1` and
    /// `1 <= limit <= MAX_PAGE_SIZE`, falling back to `default_limit`.
    pub fn resolve(&self, default_limit: i64) -> Pagination {
        Pagination {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Rows to skip. Saturates for pages far past the end, which then
    /// simply come back empty.
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let pagination = PageParams::default().resolve(10);
        assert_eq!(pagination, Pagination { page: 1, limit: 10 });
        assert_eq!(pagination.offset(), 0);
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let params = PageParams {
            page: Some(-3),
            limit: Some(5000),
        };
        assert_eq!(params.resolve(10), Pagination { page: 1, limit: 100 });

        let params = PageParams {
            page: Some(3),
            limit: Some(0),
        };
        let pagination = params.resolve(10);
        assert_eq!(pagination.limit, 1);
        assert_eq!(pagination.offset(), 2);
    }

    #[test]
    fn test_huge_page_does_not_overflow() {
        let params = PageParams {
            page: Some(i64::MAX),
            limit: Some(10),
        };
        let pagination = params.resolve(10);
        assert_eq!(pagination.page, i64::MAX);
        assert_eq!(pagination.offset(), i64::MAX);

        let pagination = Pagination {
            page: i64::MAX,
            limit: MAX_PAGE_SIZE,
        };
        assert!(pagination.offset() > 0);
    }

    #[test]
    fn test_total_pages_rounds_up() {
        let pagination = Pagination { page: 1, limit: 10 };
        assert_eq!(pagination.total_pages(0), 0);
        assert_eq!(pagination.total_pages(10), 1);
        assert_eq!(pagination.total_pages(11), 2);
    }
}
