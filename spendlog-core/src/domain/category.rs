//! Expense category domain model

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::result::Error;

/// The closed set of expense categories.
///
/// Records store and serialize the canonical key. The English alias is
/// accepted on input only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Food,
    Transport,
    Entertainment,
    Shopping,
    Health,
    Education,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Transport,
        Category::Entertainment,
        Category::Shopping,
        Category::Health,
        Category::Education,
        Category::Other,
    ];

    /// Canonical storage key
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "makanan",
            Category::Transport => "transportasi",
            Category::Entertainment => "hiburan",
            Category::Shopping => "belanja",
            Category::Health => "kesehatan",
            Category::Education => "pendidikan",
            Category::Other => "lainnya",
        }
    }

    pub fn alias(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Entertainment => "entertainment",
            Category::Shopping => "shopping",
            Category::Health => "health",
            Category::Education => "education",
            Category::Other => "other",
        }
    }

    /// Human readable name
    pub fn label(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Transport => "Transport",
            Category::Entertainment => "Entertainment",
            Category::Shopping => "Shopping",
            Category::Health => "Health",
            Category::Education => "Education",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    /// Exact, case-sensitive match on the canonical key or the alias
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s || c.alias() == s)
            .ok_or_else(|| Error::InvalidCategory(s.to_string()))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_alias() {
        assert_eq!("makanan".parse::<Category>().unwrap(), Category::Food);
        assert_eq!("food".parse::<Category>().unwrap(), Category::Food);
        assert_eq!("lainnya".parse::<Category>().unwrap(), Category::Other);
        assert_eq!("education".parse::<Category>().unwrap(), Category::Education);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert!("Makanan".parse::<Category>().is_err());
        assert!("FOOD".parse::<Category>().is_err());
        assert!(" makanan".parse::<Category>().is_err());
    }

    #[test]
    fn test_unknown_category_error() {
        match "groceries".parse::<Category>() {
            Err(Error::InvalidCategory(raw)) => assert_eq!(raw, "groceries"),
            other => panic!("expected InvalidCategory, got {:?}", other),
        }
    }

    #[test]
    fn test_serializes_canonical_key() {
        let json = serde_json::to_string(&Category::Transport).unwrap();
        assert_eq!(json, "\"transportasi\"");

        let parsed: Category = serde_json::from_str("\"transport\"").unwrap();
        assert_eq!(parsed, Category::Transport);
    }

    #[test]
    fn test_keys_are_unique() {
        let mut keys: Vec<&str> = Category::ALL
            .iter()
            .flat_map(|c| [c.as_str(), c.alias()])
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), Category::ALL.len() * 2);
    }
}
