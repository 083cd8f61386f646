use chrono::{Datelike, NaiveDate};
use kakeibo_core::{Amount, Transaction};
use serde::Deserialize;

use crate::error::ImportError;
use crate::util::normalize_cell;

/// The card works anywhere, so fares get a generic payee rather than an operator.
pub const DEFAULT_TRANSPORT_PAYEE: &str = "Suica Transport";

const MODERN_TITLE: [&str; 8] = [
    "", "月日", "種別", "利用場所", "種別", "利用場所", "残高", "入金・利用額",
];
const LEGACY_TITLE: [&str; 7] = ["月/日", "種別", "利用場所", "種別", "利用場所", "残額", "差額"];

/// History table as scraped: the title row and the data rows between it and
/// the trailing opening-balance row.
#[derive(Debug, Clone, Deserialize)]
pub struct SuicaHistory {
    pub title: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// Current Suica site; rows carry a leading blank cell.
    Modern,
    /// Older table layout still served by PASMO.
    Legacy,
}

impl TableLayout {
    pub fn detect(title: &[String]) -> Result<Self, ImportError> {
        let cells: Vec<String> = title.iter().map(|c| normalize_cell(c)).collect();
        if cells == MODERN_TITLE {
            Ok(TableLayout::Modern)
        } else if cells == LEGACY_TITLE {
            Ok(TableLayout::Legacy)
        } else {
            Err(ImportError::UnknownLayout(title.to_vec()))
        }
    }
}

/// The month the history page was opened on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementMonth {
    pub year: i32,
    pub month: u32,
}

impl StatementMonth {
    /// Reads the `YYYY/MM` month selector, falling back to `today`'s month.
    pub fn from_selector(selected: Option<&str>, today: NaiveDate) -> Result<Self, ImportError> {
        let Some(selected) = selected.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(StatementMonth {
                year: today.year(),
                month: today.month(),
            });
        };

        let malformed = || ImportError::MalformedRow(format!("statement month {selected}"));
        let (year, month) = selected
            .split_once(['/', '-'])
            .ok_or_else(malformed)?;
        Ok(StatementMonth {
            year: year.parse().map_err(|_| malformed())?,
            month: month.parse().map_err(|_| malformed())?,
        })
    }

    /// History only reaches back 26 weeks, so a month later than the
    /// statement's must belong to the previous year.
    fn year_of(self, tx_month: u32) -> i32 {
        if tx_month <= self.month {
            self.year
        } else {
            self.year - 1
        }
    }
}

fn cell(row: &[String], i: usize) -> &str {
    row.get(i).map(String::as_str).unwrap_or("")
}

pub fn to_transactions(
    history: &SuicaHistory,
    month: StatementMonth,
    transport_payee: &str,
) -> Result<Vec<Transaction>, ImportError> {
    let layout = TableLayout::detect(&history.title)?;

    history
        .rows
        .iter()
        .map(|raw_row| {
            let mut row: Vec<String> = raw_row.iter().map(|c| normalize_cell(c)).collect();
            if layout == TableLayout::Modern && !row.is_empty() {
                row.remove(0);
            }
            row_to_transaction(&row, month, transport_payee)
        })
        .collect()
}

fn row_to_transaction(
    row: &[String],
    month: StatementMonth,
    transport_payee: &str,
) -> Result<Transaction, ImportError> {
    let raw_date = cell(row, 0);
    let kind = cell(row, 1);
    let location = cell(row, 2);
    let exit_kind = cell(row, 3);
    let exit_location = cell(row, 4);
    let amount_text = cell(row, 6).replace(',', "");

    let date = raw_date
        .split_once('/')
        .and_then(|(m, d)| Some((m.parse::<u32>().ok()?, d.parse::<u32>().ok()?)))
        .and_then(|(m, d)| NaiveDate::from_ymd_opt(month.year_of(m), m, d))
        .ok_or_else(|| ImportError::MalformedRow(format!("date {raw_date:?}")))?;
    let amount: Amount = amount_text.parse()?;
    let tx = Transaction::new(date, amount);

    if location.is_empty() {
        // a transaction happened, but the card doesn't say where
        return Ok(tx);
    }

    if exit_kind.is_empty() {
        // top-ups carry an explicit sign; keep kind and place together so
        // payee renaming rules can match on them
        if amount_text.starts_with('+') {
            return Ok(tx.with_payee(format!("Charge {kind} {location}")));
        }
        return Ok(tx.with_payee(format!("{kind} {location}")));
    }

    Ok(tx
        .with_payee(transport_payee)
        .with_memo(format!("{kind} {location} {exit_kind} {exit_location}")))
}

/// `suica-<YYYY-MM>-<day>.qif`, or `pasmo-…` when exported from the PASMO site.
pub fn export_filename(
    origin: &str,
    selected_month: Option<&str>,
    selected_day: Option<&str>,
    today: NaiveDate,
) -> String {
    let base = if origin.contains("pasmo") { "pasmo" } else { "suica" };
    let day = selected_day
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| today.day().to_string());

    match selected_month.map(str::trim).filter(|m| !m.is_empty()) {
        Some(month) => format!("{base}-{}-{day}.qif", month.replacen('/', "-", 1)),
        None => format!("{base}.qif"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()
    }

    fn modern(rows: &[&[&str]]) -> SuicaHistory {
        SuicaHistory {
            title: strings(&MODERN_TITLE),
            rows: rows.iter().map(|r| strings(r)).collect(),
        }
    }

    fn feb_2024() -> StatementMonth {
        StatementMonth { year: 2024, month: 2 }
    }

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    // ── layout ────────────────────────────────────────────────────────────────

    #[test]
    fn detects_both_layouts() {
        assert_eq!(TableLayout::detect(&strings(&MODERN_TITLE)).unwrap(), TableLayout::Modern);
        assert_eq!(TableLayout::detect(&strings(&LEGACY_TITLE)).unwrap(), TableLayout::Legacy);
    }

    #[test]
    fn unknown_layout_is_rejected() {
        assert!(matches!(
            TableLayout::detect(&strings(&["日付", "金額"])),
            Err(ImportError::UnknownLayout(_))
        ));
    }

    // ── statement month ───────────────────────────────────────────────────────

    #[test]
    fn month_from_selector_or_today() {
        assert_eq!(
            StatementMonth::from_selector(Some("2023/11"), today()).unwrap(),
            StatementMonth { year: 2023, month: 11 }
        );
        assert_eq!(StatementMonth::from_selector(None, today()).unwrap(), feb_2024());
        assert!(StatementMonth::from_selector(Some("soon"), today()).is_err());
    }

    // ── rows ──────────────────────────────────────────────────────────────────

    #[test]
    fn fare_uses_transport_payee() {
        let history = modern(&[&["", "02/14", "入", "渋谷", "出", "新宿", "\\1,000", "-178"]]);
        let tx = &to_transactions(&history, feb_2024(), DEFAULT_TRANSPORT_PAYEE).unwrap()[0];
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 2, 14).unwrap());
        assert_eq!(tx.amount, amt("-178"));
        assert_eq!(tx.payee.as_deref(), Some("Suica Transport"));
        assert_eq!(tx.memo.as_deref(), Some("入 渋谷 出 新宿"));
    }

    #[test]
    fn charge_drops_plus_sign() {
        let history = modern(&[&["", "02/10", "ｵｰﾄ", "渋谷", "", "", "\\3,000", "+3,000"]]);
        let tx = &to_transactions(&history, feb_2024(), DEFAULT_TRANSPORT_PAYEE).unwrap()[0];
        assert_eq!(tx.payee.as_deref(), Some("Charge ｵｰﾄ 渋谷"));
        assert_eq!(tx.amount, amt("3000"));
        assert_eq!(tx.memo, None);
    }

    #[test]
    fn purchase_keeps_kind_and_place() {
        let history = modern(&[&["", "02/11", "物販", "NewDays", "", "", "\\822", "-210"]]);
        let tx = &to_transactions(&history, feb_2024(), DEFAULT_TRANSPORT_PAYEE).unwrap()[0];
        assert_eq!(tx.payee.as_deref(), Some("物販 NewDays"));
        assert_eq!(tx.amount, amt("-210"));
    }

    #[test]
    fn row_without_location_has_amount_only() {
        let history = modern(&[&["", "02/01", "物販", "", "", "", "\\500", "-120"]]);
        let tx = &to_transactions(&history, feb_2024(), DEFAULT_TRANSPORT_PAYEE).unwrap()[0];
        assert_eq!(tx.payee, None);
        assert_eq!(tx.amount, amt("-120"));
    }

    #[test]
    fn later_month_belongs_to_previous_year() {
        let history = modern(&[&["", "12/28", "入", "上野", "出", "池袋", "\\0", "-200"]]);
        let tx = &to_transactions(&history, feb_2024(), DEFAULT_TRANSPORT_PAYEE).unwrap()[0];
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2023, 12, 28).unwrap());
    }

    #[test]
    fn legacy_rows_have_no_leading_cell() {
        let history = SuicaHistory {
            title: strings(&LEGACY_TITLE),
            rows: vec![strings(&["02/03", "入", "　横浜　", "出", "川崎", "\\900", "-230"])],
        };
        let tx = &to_transactions(&history, feb_2024(), "Transit").unwrap()[0];
        assert_eq!(tx.payee.as_deref(), Some("Transit"));
        assert_eq!(tx.memo.as_deref(), Some("入 横浜 出 川崎"));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let history = modern(&[&["", "2月3日", "入", "渋谷", "出", "新宿", "\\0", "-178"]]);
        assert!(matches!(
            to_transactions(&history, feb_2024(), DEFAULT_TRANSPORT_PAYEE),
            Err(ImportError::MalformedRow(_))
        ));
    }

    // ── filename ──────────────────────────────────────────────────────────────

    #[test]
    fn filenames() {
        assert_eq!(
            export_filename("https://www.mobilesuica.com", Some("2024/02"), Some("15"), today()),
            "suica-2024-02-15.qif"
        );
        assert_eq!(
            export_filename("https://www.pasmo-mobile.jp", Some("2024/02"), None, today()),
            "pasmo-2024-02-20.qif"
        );
        assert_eq!(export_filename("", None, Some("1"), today()), "suica.qif");
    }
}
