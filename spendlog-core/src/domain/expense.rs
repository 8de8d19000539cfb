//! Expense domain model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::Category;
use super::ids::{ExpenseId, UserId};
use super::result::{Error, Result};

/// Wire format of every calendar date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Amounts are stored as DECIMAL(15,2)
pub const AMOUNT_SCALE: u32 = 2;
const AMOUNT_LIMIT: i64 = 10_000_000_000_000;

/// A single spending record owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    /// Owner, fixed at creation
    pub user_id: UserId,
    pub amount: Decimal,
    pub category: Category,
    pub date: NaiveDate,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        user_id: UserId,
        amount: Decimal,
        category: Category,
        date: NaiveDate,
        note: Option<String>,
    ) -> Self {
        let now = super::now();
        Self {
            id: ExpenseId::new(),
            user_id,
            amount,
            category,
            date,
            note,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an already validated patch and refresh `updated_at`
    fn apply(&mut self, patch: ValidPatch) {
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(note) = patch.note {
            self.note = note;
        }
        self.updated_at = super::now().max(self.updated_at);
    }
}

/// Unvalidated input for creating an expense
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: Decimal,
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl NewExpense {
    pub fn new(
        amount: Decimal,
        category: impl Into<String>,
        date: impl Into<String>,
        note: Option<String>,
    ) -> Self {
        Self {
            amount,
            category: category.into(),
            date: date.into(),
            note,
        }
    }

    /// Validate every field and build the record for `owner`
    pub fn into_expense(self, owner: UserId) -> Result<Expense> {
        let category: Category = self.category.parse()?;
        let date = parse_date(&self.date)?;
        let amount = validate_amount(self.amount)?;
        Ok(Expense::new(owner, amount, category, date, self.note))
    }
}

/// Partial update. `None` leaves a field unchanged.
///
/// `note` is tri-state: `None` keeps it, `Some(Some(_))` replaces it and
/// `Some(None)` clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpensePatch {
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, with = "double_option")]
    pub note: Option<Option<String>>,
}

struct ValidPatch {
    amount: Option<Decimal>,
    category: Option<Category>,
    date: Option<NaiveDate>,
    note: Option<Option<String>>,
}

impl ExpensePatch {
    /// Validate the supplied fields and apply them to `expense`.
    ///
    /// Nothing is written to `expense` unless every supplied field is valid.
    pub fn apply_to(self, expense: &mut Expense) -> Result<()> {
        let valid = ValidPatch {
            amount: self.amount.map(validate_amount).transpose()?,
            category: self.category.as_deref().map(str::parse).transpose()?,
            date: self.date.as_deref().map(parse_date).transpose()?,
            note: self.note,
        };
        expense.apply(valid);
        Ok(())
    }
}

/// Owner-scoped query over expenses. Built per request, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseFilter {
    pub user_id: UserId,
    /// Inclusive lower bound
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound
    pub end_date: Option<NaiveDate>,
    /// Exact match on the stored key. An unknown value matches nothing.
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl ExpenseFilter {
    pub fn for_owner(user_id: UserId) -> Self {
        Self {
            user_id,
            start_date: None,
            end_date: None,
            category: None,
            limit: 10,
            offset: 0,
        }
    }

    pub fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_range(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    /// True when `expense` satisfies every filter field except pagination
    pub fn matches(&self, expense: &Expense) -> bool {
        expense.user_id == self.user_id
            && self.start_date.map_or(true, |start| expense.date >= start)
            && self.end_date.map_or(true, |end| expense.date <= end)
            && self
                .category
                .as_deref()
                .map_or(true, |c| expense.category.as_str() == c)
    }
}

/// One page of a filtered listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpensePage {
    pub expenses: Vec<Expense>,
    /// Size of the filtered set before limit/offset
    pub total: u64,
}

/// Parse a calendar date strictly as `YYYY-MM-DD`
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let bytes = raw.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return Err(Error::InvalidDate(raw.to_string()));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| Error::InvalidDate(raw.to_string()))
}

/// Check an amount and rescale it to two fractional digits
pub fn validate_amount(amount: Decimal) -> Result<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount("amount must be greater than zero".into()));
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(Error::InvalidAmount(
            "amount must have at most 2 decimal places".into(),
        ));
    }
    if amount >= Decimal::from(AMOUNT_LIMIT) {
        return Err(Error::InvalidAmount("amount is too large".into()));
    }
    let mut stored = amount;
    stored.rescale(AMOUNT_SCALE);
    Ok(stored)
}

mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Option<String>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    /// A present key (even `null`) becomes `Some(_)`; a missing key stays `None`
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<String>>, D::Error> {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_date_strict() {
        assert_eq!(
            parse_date("2024-03-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
        assert!(parse_date("2024-02-29").is_ok());
        assert!(matches!(parse_date("2023-02-29"), Err(Error::InvalidDate(_))));
        assert!(matches!(parse_date("2024-13-40"), Err(Error::InvalidDate(_))));
        assert!(matches!(parse_date("2024-01-32"), Err(Error::InvalidDate(_))));
        assert!(parse_date("2024-3-15").is_err());
        assert!(parse_date("15/03/2024").is_err());
        assert!(parse_date("2024-03-15T00:00:00").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(dec("12345.67")).unwrap().to_string(), "12345.67");
        assert_eq!(validate_amount(dec("5")).unwrap().to_string(), "5.00");
        assert_eq!(validate_amount(dec("1.500")).unwrap().to_string(), "1.50");
        assert!(validate_amount(dec("0")).is_err());
        assert!(validate_amount(dec("-3.00")).is_err());
        assert!(validate_amount(dec("0.001")).is_err());
        assert!(validate_amount(dec("9999999999999.99")).is_ok());
        assert!(validate_amount(dec("10000000000000")).is_err());
    }

    #[test]
    fn test_new_expense_validation_order() {
        let owner = UserId::new();
        let bad_category = NewExpense::new(dec("10"), "groceries", "2024-13-40", None);
        assert!(matches!(
            bad_category.into_expense(owner),
            Err(Error::InvalidCategory(_))
        ));

        let bad_date = NewExpense::new(dec("10"), "makanan", "2024-13-40", None);
        assert!(matches!(bad_date.into_expense(owner), Err(Error::InvalidDate(_))));

        let ok = NewExpense::new(dec("10"), "food", "2024-03-15", Some("lunch".into()))
            .into_expense(owner)
            .unwrap();
        assert_eq!(ok.user_id, owner);
        assert_eq!(ok.category, Category::Food);
        assert_eq!(ok.note.as_deref(), Some("lunch"));
    }

    #[test]
    fn test_patch_is_all_or_nothing() {
        let mut expense = NewExpense::new(dec("10"), "makanan", "2024-03-15", None)
            .into_expense(UserId::new())
            .unwrap();
        let before = expense.clone();

        let patch = ExpensePatch {
            amount: Some(dec("99")),
            date: Some("not-a-date".into()),
            ..Default::default()
        };
        assert!(patch.apply_to(&mut expense).is_err());
        assert_eq!(expense, before);
    }

    #[test]
    fn test_patch_note_states() {
        let mut expense = NewExpense::new(dec("10"), "makanan", "2024-03-15", Some("a".into()))
            .into_expense(UserId::new())
            .unwrap();

        ExpensePatch::default().apply_to(&mut expense).unwrap();
        assert_eq!(expense.note.as_deref(), Some("a"));

        let set = ExpensePatch {
            note: Some(Some("b".into())),
            ..Default::default()
        };
        set.apply_to(&mut expense).unwrap();
        assert_eq!(expense.note.as_deref(), Some("b"));

        let clear = ExpensePatch {
            note: Some(None),
            ..Default::default()
        };
        clear.apply_to(&mut expense).unwrap();
        assert!(expense.note.is_none());
    }

    #[test]
    fn test_patch_json_distinguishes_null_from_missing() {
        let missing: ExpensePatch = serde_json::from_str(r#"{"amount": "5.00"}"#).unwrap();
        assert!(missing.note.is_none());

        let cleared: ExpensePatch = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(cleared.note, Some(None));
    }

    #[test]
    fn test_filter_matches() {
        let owner = UserId::new();
        let expense = NewExpense::new(dec("10"), "belanja", "2024-03-15", None)
            .into_expense(owner)
            .unwrap();
        let d = |s| parse_date(s).unwrap();

        assert!(ExpenseFilter::for_owner(owner).matches(&expense));
        assert!(!ExpenseFilter::for_owner(UserId::new()).matches(&expense));
        assert!(ExpenseFilter::for_owner(owner)
            .with_range(Some(d("2024-03-15")), Some(d("2024-03-15")))
            .matches(&expense));
        assert!(!ExpenseFilter::for_owner(owner)
            .with_range(Some(d("2024-03-16")), None)
            .matches(&expense));
        assert!(ExpenseFilter::for_owner(owner)
            .with_category("belanja")
            .matches(&expense));
        // Aliases are not stored keys
        assert!(!ExpenseFilter::for_owner(owner)
            .with_category("shopping")
            .matches(&expense));
    }
}
