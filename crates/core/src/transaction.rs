use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::amount::Amount;
use super::error::ParseError;

/// A `group:subgroup` category pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category {
    pub group: String,
    pub subgroup: String,
}

impl Category {
    pub fn new(group: impl Into<String>, subgroup: impl Into<String>) -> Self {
        Category {
            group: group.into(),
            subgroup: subgroup.into(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.subgroup)
    }
}

impl FromStr for Category {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_once(':')
            .map(|(group, subgroup)| Category::new(group, subgroup))
            .ok_or_else(|| ParseError::InvalidCategory(s.to_string()))
    }
}

impl TryFrom<String> for Category {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cleared {
    Cleared,
    Reconciled,
}

/// A sub-allocation of a transaction's amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    pub amount: Amount,
    pub memo: Option<String>,
    pub category: Option<Category>,
    pub check: Option<String>,
    pub cleared: Option<Cleared>,
}

impl Split {
    pub fn new(amount: Amount) -> Self {
        Split {
            amount,
            memo: None,
            category: None,
            check: None,
            cleared: None,
        }
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }
}

/// One ledger entry as handed to the QIF generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub amount: Amount,
    pub payee: Option<String>,
    pub memo: Option<String>,
    /// Check or reference number.
    pub check: Option<String>,
    pub cleared: Option<Cleared>,
    pub category: Option<Category>,
    /// Empty when the transaction is not split.
    #[serde(default)]
    pub splits: Vec<Split>,
}

impl Transaction {
    pub fn new(date: NaiveDate, amount: Amount) -> Self {
        Transaction {
            date,
            amount,
            payee: None,
            memo: None,
            check: None,
            cleared: None,
            category: None,
            splits: Vec::new(),
        }
    }

    pub fn with_payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check = Some(check.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_splits(mut self, splits: Vec<Split>) -> Self {
        self.splits = splits;
        self
    }

    /// Sum of the split amounts, or `None` if it overflows.
    pub fn split_total(&self) -> Option<Amount> {
        self.splits
            .iter()
            .try_fold(Amount::zero(), |total, split| total.checked_add(split.amount))
    }
}
