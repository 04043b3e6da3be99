use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Store-assigned entry id. Higher ids were inserted later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub i64);

/// Top-level budget bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Needs,
    Wants,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Needs, Category::Wants];

    /// Lowercase storage form (`needs` / `wants`).
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Needs => "needs",
            Category::Wants => "wants",
        }
    }

    /// Display form used in replies and button labels.
    pub fn title(self) -> &'static str {
        match self {
            Category::Needs => "Needs",
            Category::Wants => "Wants",
        }
    }

    /// Case-insensitive match of user input against the category names.
    pub fn parse_input(input: &str) -> Option<Self> {
        let choice = input.trim().to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == choice)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "needs" => Ok(Category::Needs),
            "wants" => Ok(Category::Wants),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

/// Fields of an entry before the store assigns `id` and `created_at`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewExpense {
    pub user_id: UserId,
    pub category: Category,
    pub subcategory: String,
    pub amount: Decimal,
    pub label: Option<String>,
}

/// One recorded expense row. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpenseEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub category: Category,
    pub subcategory: String,
    pub amount: Decimal,
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-subcategory sum returned by a ledger summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubcategoryTotal {
    pub subcategory: String,
    pub total: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_input_is_case_insensitive_and_trimmed() {
        assert_eq!(Category::parse_input("Needs"), Some(Category::Needs));
        assert_eq!(Category::parse_input("  WANTS "), Some(Category::Wants));
        assert_eq!(Category::parse_input("need"), None);
        assert_eq!(Category::parse_input(""), None);
    }

    #[test]
    fn storage_form_is_strict() {
        assert_eq!("needs".parse::<Category>().unwrap(), Category::Needs);
        assert!("Needs".parse::<Category>().is_err());
    }
}
