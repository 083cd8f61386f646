use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

/// QIF account kinds. `Display` renders the tag used in `!Type:` lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Cash,
    Bank,
    CreditCard,
    Investment,
    OtherAsset,
    OtherLiability,
}

impl AccountType {
    pub fn tag(self) -> &'static str {
        match self {
            AccountType::Cash => "Cash",
            AccountType::Bank => "Bank",
            AccountType::CreditCard => "CCard",
            AccountType::Investment => "Invst",
            AccountType::OtherAsset => "OthA",
            AccountType::OtherLiability => "OthL",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for AccountType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cash" => Ok(AccountType::Cash),
            "bank" => Ok(AccountType::Bank),
            "ccard" | "credit_card" | "credit card" => Ok(AccountType::CreditCard),
            "invst" | "investment" => Ok(AccountType::Investment),
            "otha" | "other_asset" | "other asset" => Ok(AccountType::OtherAsset),
            "othl" | "other_liability" | "other liability" => Ok(AccountType::OtherLiability),
            _ => Err(ParseError::UnknownAccountType(s.to_string())),
        }
    }
}

/// Selects the document header the generator emits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QifConfig {
    pub account_type: AccountType,
    /// When set, an `!Account` block naming the account is prepended.
    pub account_name: Option<String>,
}

impl QifConfig {
    pub fn new(account_type: AccountType) -> Self {
        QifConfig {
            account_type,
            account_name: None,
        }
    }

    pub fn with_account_name(mut self, name: impl Into<String>) -> Self {
        self.account_name = Some(name.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_match_qif_headers() {
        assert_eq!(AccountType::Cash.to_string(), "Cash");
        assert_eq!(AccountType::Bank.to_string(), "Bank");
        assert_eq!(AccountType::CreditCard.to_string(), "CCard");
        assert_eq!(AccountType::Investment.to_string(), "Invst");
        assert_eq!(AccountType::OtherAsset.to_string(), "OthA");
        assert_eq!(AccountType::OtherLiability.to_string(), "OthL");
    }

    #[test]
    fn parses_tags_and_friendly_names() {
        assert_eq!("CCard".parse(), Ok(AccountType::CreditCard));
        assert_eq!("credit_card".parse(), Ok(AccountType::CreditCard));
        assert_eq!("OthL".parse(), Ok(AccountType::OtherLiability));
        assert!("savings".parse::<AccountType>().is_err());
    }

    #[test]
    fn config_builder_sets_name() {
        let config = QifConfig::new(AccountType::Bank).with_account_name("JNB");
        assert_eq!(config.account_name.as_deref(), Some("JNB"));
        assert_eq!(QifConfig::new(AccountType::Cash).account_name, None);
    }
}
