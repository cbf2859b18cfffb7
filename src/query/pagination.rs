//! Pagination validation
//!
//! `page` and `limit` arrive as whatever the caller sent: JSON numbers,
//! query-string text, or nothing at all. They are coerced to numbers,
//! defaulted, clamped and checked here, before any store access.

use serde_json::Value;

use super::errors::{EngineResult, QueryError};

/// Page used when none is given
pub const DEFAULT_PAGE: u64 = 1;

/// Limit used when none is given
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest limit ever executed. Larger requests are truncated, not rejected.
pub const MAX_LIMIT: u64 = 100;

/// Validated pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Rows to skip. Page 0 behaves like page 1.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Validate raw `page` / `limit` values.
///
/// Fractional values are truncated toward zero.
pub fn validate(raw_page: Option<&Value>, raw_limit: Option<&Value>) -> EngineResult<Pagination> {
    let page = match coerce(raw_page) {
        Coerced::Absent => DEFAULT_PAGE as f64,
        Coerced::Number(n) if n.is_finite() => n,
        _ => return Err(reject("page", raw_page)),
    };
    if page < 0.0 {
        return Err(reject("page", raw_page));
    }

    let limit = match coerce(raw_limit) {
        Coerced::Absent => DEFAULT_LIMIT as f64,
        Coerced::Number(n) if n.is_finite() => n.min(MAX_LIMIT as f64),
        _ => return Err(reject("limit", raw_limit)),
    };
    if limit < 0.0 {
        return Err(reject("limit", raw_limit));
    }

    Ok(Pagination {
        page: page.trunc() as u64,
        limit: limit.trunc() as u64,
    })
}

enum Coerced {
    Absent,
    Number(f64),
    NotANumber,
}

/// Loose numeric coercion: blank text counts as zero, booleans as 0/1
fn coerce(raw: Option<&Value>) -> Coerced {
    match raw {
        None | Some(Value::Null) => Coerced::Absent,
        Some(Value::Number(n)) => n.as_f64().map_or(Coerced::NotANumber, Coerced::Number),
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Coerced::Number(0.0);
            }
            s.parse::<f64>()
                .map_or(Coerced::NotANumber, Coerced::Number)
        }
        Some(Value::Bool(b)) => Coerced::Number(if *b { 1.0 } else { 0.0 }),
        Some(_) => Coerced::NotANumber,
    }
}

fn reject(field: &'static str, raw: Option<&Value>) -> QueryError {
    let shown = match raw {
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
        None => "nothing".to_string(),
    };
    QueryError::invalid_pagination(field, shown)
}
