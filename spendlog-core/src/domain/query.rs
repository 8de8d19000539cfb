//! Boundary sanitization of raw listing parameters

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::expense::{parse_date, ExpenseFilter};
use super::ids::UserId;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size policy applied to raw listing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryLimits {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

/// Listing parameters exactly as a caller typed them.
///
/// Nothing here is rejected. Values that do not parse are dropped and the
/// default is used instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub category: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl ExpenseQuery {
    pub fn into_filter(self, owner: UserId, limits: &QueryLimits) -> ExpenseFilter {
        let max = limits.max_page_size.max(1);
        let limit = self
            .limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|&n| n > 0)
            .map_or(limits.default_page_size, |n| {
                u32::try_from(n).unwrap_or(u32::MAX)
            })
            .clamp(1, max);
        let offset = self
            .offset
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|&n| n >= 0)
            .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX));

        ExpenseFilter {
            user_id: owner,
            start_date: self.start_date.as_deref().and_then(|raw| parse_date(raw).ok()),
            end_date: self.end_date.as_deref().and_then(|raw| parse_date(raw).ok()),
            category: self.category.filter(|c| !c.is_empty()).map(canonical_category),
            limit,
            offset,
        }
    }
}

/// Aliases become the stored key; anything else is kept and matches nothing
fn canonical_category(raw: String) -> String {
    match raw.parse::<Category>() {
        Ok(category) => category.as_str().to_string(),
        Err(_) => raw,
    }
}
