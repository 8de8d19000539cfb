//! Spending statistics and aggregation windows

use std::fmt;

use chrono::{Datelike, Duration, Local, Months, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;

/// Length of the stats window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Day,
    Week,
    #[default]
    Month,
}

impl StatsPeriod {
    /// Lenient parse: anything that is not `day` or `week` means month
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword {
            "day" => Self::Day,
            "week" => Self::Week,
            _ => Self::Month,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Window containing the local wall-clock "now"
    pub fn current_window(&self) -> AggregationWindow {
        self.window_at(Local::now().naive_local())
    }

    /// Window containing `now`.
    ///
    /// Weeks start on Monday. Every window ends one second before the next
    /// window starts.
    pub fn window_at(&self, now: NaiveDateTime) -> AggregationWindow {
        let today = now.date();
        let (first, next_first) = match self {
            Self::Day => (today, today + Duration::days(1)),
            Self::Week => {
                let since_monday = today.weekday().num_days_from_monday();
                let monday = today - Duration::days(i64::from(since_monday));
                (monday, monday + Duration::days(7))
            }
            Self::Month => {
                let first = today - Duration::days(i64::from(today.day0()));
                (first, first + Months::new(1))
            }
        };
        AggregationWindow {
            start: first.and_time(NaiveTime::MIN),
            end: next_first.and_time(NaiveTime::MIN) - Duration::seconds(1),
        }
    }
}

impl fmt::Display for StatsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive wall-clock range handed to the store's aggregate query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl AggregationWindow {
    /// First calendar day in the window
    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    /// Last calendar day in the window
    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date() && date <= self.end_date()
    }
}

/// Per-category sum and count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
    pub count: u64,
}

/// Sum of one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Decimal,
}

/// Raw aggregate returned by the expense store for one window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseAggregate {
    pub total: Decimal,
    pub count: u64,
    /// Ordered by total descending, then category key ascending
    pub by_category: Vec<CategoryTotal>,
    /// Ordered by date ascending
    pub daily: Vec<DailyTotal>,
}

impl ExpenseAggregate {
    /// Put the breakdowns into their reporting order
    pub fn sort(&mut self) {
        self.by_category.sort_by(|a, b| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.category.as_str().cmp(b.category.as_str()))
        });
        self.daily.sort_by_key(|d| d.date);
    }
}

/// Statistics for one window, computed on demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseStats {
    pub period: StatsPeriod,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub total: Decimal,
    pub count: u64,
    pub by_category: Vec<CategoryTotal>,
    pub daily_trend: Vec<DailyTotal>,
}

impl ExpenseStats {
    pub fn new(
        period: StatsPeriod,
        window: AggregationWindow,
        aggregate: ExpenseAggregate,
    ) -> Self {
        Self {
            period,
            start: window.start,
            end: window.end,
            total: aggregate.total,
            count: aggregate.count,
            by_category: aggregate.by_category,
            daily_trend: aggregate.daily,
        }
    }
}
