//! Page/per_page handling shared by every listing endpoint.

use serde_json::Value;
use service_core::error::AppError;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 20;
pub const DEFAULT_MAX_PER_PAGE: i64 = 1000;

/// A validated page window: `page` and `per_page` are both at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    per_page: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn new(page: i64, per_page: i64) -> Result<Self, AppError> {
        Ok(Self {
            page: at_least_one("page", page)?,
            per_page: at_least_one("per_page", per_page)?,
        })
    }

    /// Build from raw query-string values; absent values take the defaults.
    pub fn from_query(page: Option<&str>, per_page: Option<&str>) -> Result<Self, AppError> {
        Self::new(
            page.map(|raw| parse_integer("page", raw)).transpose()?.unwrap_or(DEFAULT_PAGE),
            per_page
                .map(|raw| parse_integer("per_page", raw))
                .transpose()?
                .unwrap_or(DEFAULT_PER_PAGE),
        )
    }

    /// Build from a JSON filter object; numbers and numeric strings are accepted.
    pub fn from_json(filter: &serde_json::Map<String, Value>) -> Result<Self, AppError> {
        Self::new(
            optional_json_integer(filter, "page")?.unwrap_or(DEFAULT_PAGE),
            optional_json_integer(filter, "per_page")?.unwrap_or(DEFAULT_PER_PAGE),
        )
    }

    /// Reject windows larger than `max_per_page` rows.
    pub fn within(self, max_per_page: i64) -> Result<Self, AppError> {
        if self.per_page > max_per_page {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "per_page must not exceed {}",
                max_per_page
            )));
        }
        Ok(self)
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn per_page(&self) -> i64 {
        self.per_page
    }

    pub fn limit(&self) -> i64 {
        self.per_page
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// One page of rows plus the number of rows matching the same filter without the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}

fn at_least_one(field: &str, value: i64) -> Result<i64, AppError> {
    if value < 1 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "{} must be a positive integer",
            field
        )));
    }
    Ok(value)
}

pub fn parse_integer(field: &str, raw: &str) -> Result<i64, AppError> {
    raw.trim().parse::<i64>().map_err(|_| {
        AppError::BadRequest(anyhow::anyhow!("{} must be an integer, got '{}'", field, raw))
    })
}

/// Integer value of `field` in a JSON object; `null` counts as absent.
pub fn optional_json_integer(
    filter: &serde_json::Map<String, Value>,
    field: &str,
) -> Result<Option<i64>, AppError> {
    match filter.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| {
            AppError::BadRequest(anyhow::anyhow!("{} must be an integer, got {}", field, n))
        }),
        Some(Value::String(s)) => parse_integer(field, s).map(Some),
        Some(other) => Err(AppError::BadRequest(anyhow::anyhow!(
            "{} must be an integer, got {}",
            field,
            other
        ))),
    }
}
