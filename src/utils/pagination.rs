use serde::Deserialize;

const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;
// LIMIT/OFFSET partent en BIGINT côté Postgres
const MAX_OFFSET: u64 = i64::MAX as u64;

/// ?pageNo=0&limit=20 (valeurs par défaut si absentes, limit plafonné à 100)
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationQuery {
    #[serde(rename = "pageNo")]
    pub page_no: Option<u64>,
    pub limit: Option<u64>,
}

impl PaginationQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT)
    }

    /// offset = pageNo * limit
    pub fn offset(&self) -> u64 {
        self.page_no
            .unwrap_or(0)
            .saturating_mul(self.limit())
            .min(MAX_OFFSET)
    }
}
