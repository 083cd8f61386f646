use kakeibo_core::{parse_date, Amount, Split, Transaction};
use kakeibo_storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ImportError;

/// Cache key holding debit-card details scraped from the card statement page.
pub const DETAIL_CACHE_KEY: &str = "ccdetail";

const INTEREST_PAYEE: &str = "JNB Interest";

re!(re_debit_inline, r"^.デビット(?:　(?P<payee>.+))?　(?P<tag>[A-Z0-9]+)$");
re!(re_debit_reference, r"^.+デビット(?:売上予約)?\((?P<tag>[A-Z0-9]+)\)$");
re!(re_yen_suffix, r"\s*円");

// ── Debit card details ────────────────────────────────────────────────────────

/// What the debit card statement knows about a purchase that the savings
/// account statement only lists by tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitDetail {
    pub payee: String,
}

pub type DebitDetails = BTreeMap<String, DebitDetail>;

/// A row of the debit card statement table. Rows missing either cell are skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct DebitCardEntry {
    pub id: Option<String>,
    pub payee: Option<String>,
}

pub fn collect_debit_details(entries: &[DebitCardEntry]) -> DebitDetails {
    entries
        .iter()
        .filter_map(|entry| match (&entry.id, &entry.payee) {
            (Some(id), Some(payee)) if !id.is_empty() && !payee.is_empty() => {
                Some((id.clone(), DebitDetail { payee: payee.clone() }))
            }
            _ => None,
        })
        .collect()
}

pub fn load_debit_details<S: KeyValueStore>(store: &S) -> Result<DebitDetails, ImportError> {
    Ok(store.get_json(DETAIL_CACHE_KEY)?.unwrap_or_default())
}

/// Merges freshly scraped details over the cached ones and returns how many
/// the cache now holds.
pub fn remember_debit_details<S: KeyValueStore>(
    store: &mut S,
    scraped: DebitDetails,
) -> Result<usize, ImportError> {
    let mut details = load_debit_details(store)?;
    details.extend(scraped);
    store.set_json(DETAIL_CACHE_KEY, &details)?;
    tracing::info!("Debit card detail cache holds {} entries", details.len());
    Ok(details.len())
}

// ── Savings account statement ─────────────────────────────────────────────────

/// Pre-tax interest and the taxes withheld from it, as printed (`1,234 円`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InterestBreakdown {
    pub pre_tax: String,
    #[serde(default)]
    pub income_tax: String,
    #[serde(default)]
    pub other_tax: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowDescription {
    Payee(String),
    Interest(InterestBreakdown),
}

/// One row of the savings account statement table.
#[derive(Debug, Clone, Deserialize)]
pub struct StatementRow {
    /// `YYYY/MM/DD HH:MM`
    pub date: String,
    /// Unsigned, with thousands separators.
    pub amount: String,
    pub is_expense: bool,
    pub description: RowDescription,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTransaction {
    pub date: String,
    pub payee: String,
    pub expense: String,
    pub income: String,
    pub tag: Option<String>,
    pub interest: Option<InterestBreakdown>,
}

fn clean_yen(raw: &str) -> String {
    re_yen_suffix().replace(raw.trim(), "").replace(',', "")
}

fn debit_payee_and_tag(raw: &str) -> Option<(Option<String>, String)> {
    let caps = re_debit_inline()
        .captures(raw)
        .or_else(|| re_debit_reference().captures(raw))?;
    let tag = caps.name("tag")?.as_str().to_string();
    let payee = caps.name("payee").map(|m| m.as_str().to_string());
    Some((payee, tag))
}

/// Resolves every row's payee. Debit purchases listed only by tag take their
/// payee from `details`; if any tag is unknown the whole statement is
/// rejected with the list of missing tags.
pub fn parse_rows(
    rows: &[StatementRow],
    details: &DebitDetails,
) -> Result<Vec<ParsedTransaction>, ImportError> {
    let mut parsed = Vec::new();
    let mut missing = Vec::new();

    for row in rows {
        // only the date is imported, not the time
        let date = row.date.trim().replace('/', "-");
        let date = date.split(' ').next().unwrap_or_default().to_string();
        let value = row.amount.trim().replace(',', "");
        let (expense, income) = if row.is_expense {
            (value, String::new())
        } else {
            (String::new(), value)
        };

        match &row.description {
            RowDescription::Interest(interest) => parsed.push(ParsedTransaction {
                date,
                payee: INTEREST_PAYEE.to_string(),
                expense: String::new(),
                income: row.amount.trim().replace(',', ""),
                tag: None,
                interest: Some(InterestBreakdown {
                    pre_tax: clean_yen(&interest.pre_tax),
                    income_tax: clean_yen(&interest.income_tax),
                    other_tax: clean_yen(&interest.other_tax),
                }),
            }),
            RowDescription::Payee(raw_payee) => {
                let raw_payee = raw_payee.trim();
                match debit_payee_and_tag(raw_payee) {
                    Some((payee, tag)) => {
                        let payee = payee.or_else(|| details.get(&tag).map(|d| d.payee.clone()));
                        match payee {
                            Some(payee) => parsed.push(ParsedTransaction {
                                date,
                                payee,
                                expense,
                                income,
                                tag: Some(tag),
                                interest: None,
                            }),
                            None => missing.push(tag),
                        }
                    }
                    None => parsed.push(ParsedTransaction {
                        date,
                        payee: raw_payee.to_string(),
                        expense,
                        income,
                        tag: None,
                        interest: None,
                    }),
                }
            }
        }
    }

    if !missing.is_empty() {
        return Err(ImportError::MissingDebitDetails(missing));
    }
    Ok(parsed)
}

fn amount_or_zero(raw: &str) -> Result<Amount, ImportError> {
    if raw.is_empty() {
        Ok(Amount::zero())
    } else {
        Ok(raw.parse()?)
    }
}

fn or_zero(raw: &str) -> &str {
    if raw.is_empty() {
        "0"
    } else {
        raw
    }
}

/// Human-readable interest summary. Finance apps that drop splits on import
/// still get the breakdown in the memo.
pub fn format_interest(interest: &InterestBreakdown) -> String {
    let pre_tax = &interest.pre_tax;
    let income_tax = or_zero(&interest.income_tax);
    let other_tax = or_zero(&interest.other_tax);

    match (income_tax, other_tax) {
        ("0", "0") => "No deductions".to_string(),
        (income, "0") => format!("{pre_tax} - {income} (income tax)"),
        ("0", other) => format!("{pre_tax} - {other} (other taxes)"),
        (income, other) => {
            format!("{pre_tax} - ({income} (income tax) + {other} (other taxes))")
        }
    }
}

pub fn to_transactions(parsed: &[ParsedTransaction]) -> Result<Vec<Transaction>, ImportError> {
    parsed
        .iter()
        .map(|p| -> Result<Transaction, ImportError> {
            let amount = amount_or_zero(&p.income)? - amount_or_zero(&p.expense)?;
            let mut tx = Transaction::new(parse_date(&p.date)?, amount).with_payee(p.payee.clone());

            if let Some(tag) = &p.tag {
                tx = tx.with_check(tag.clone());
            }

            if let Some(interest) = &p.interest {
                tx = tx.with_memo(format_interest(interest)).with_splits(vec![
                    Split::new(interest.pre_tax.parse()?).with_memo("Before Tax"),
                    Split::new(-amount_or_zero(&interest.income_tax)?).with_memo("Income Tax"),
                    Split::new(-amount_or_zero(&interest.other_tax)?).with_memo("Other Taxes"),
                ]);
            }
            Ok(tx)
        })
        .collect()
}

/// `jnb-<period>.qif` from the statement period heading, or `jnb.qif`.
pub fn export_filename(period: Option<&str>) -> String {
    match period.map(str::trim).filter(|p| !p.is_empty()) {
        Some(period) => format!("jnb-{}.qif", period.replace('/', "-").replace('～', "~")),
        None => "jnb.qif".to_string(),
    }
}
