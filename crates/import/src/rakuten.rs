use kakeibo_core::{parse_date, Amount, Split, Transaction};

use crate::csv::{parse_records, Record};
use crate::error::ImportError;
use crate::util::{country_flag, parse_full_width_number};

// ── Statement columns ─────────────────────────────────────────────────────────

pub const COL_DATE: &str = "利用日";
pub const COL_PAYEE: &str = "利用店名・商品名";
pub const COL_PAYMENT_TYPE: &str = "支払方法";
pub const COL_BASE_AMOUNT: &str = "利用金額";
pub const COL_FEE: &str = "支払手数料";
pub const COL_TOTAL: &str = "支払総額";

const REVOLVING_PAYEE: &str = "Converted to Revolving";
const FEE_MEMO: &str = "Transaction Fee";

re!(re_installments, r"^分割([0-9]+)回払い\(([0-9]+)回目\)$");
re!(re_mastercard_domestic, r"^マスター国内利用\s+[A-Z]{3}\s+");
re!(re_visa_domestic, r"^ＶＩＳＡ国内利用\s+[A-Z]{2}\s+");
re!(re_jcb_quicpay, r"^ＪＣＢ国内利用\s+QP\s+");
re!(re_jcb_domestic, r"^ＪＣＢ国内利用\s+[A-Z]{2}\s+");
re!(re_overseas, r"^海外利用\s+[０-９]+\s+");
re!(re_repayment_change, r"^返済方法変更ＷＥＢ　[0-9]{1,6}|\(ﾍﾝｻｲﾍﾝｺｳ$");
re!(re_full_width_spaces, r"　{2,}");
re!(re_spaces, r"\s{2,}");
re!(re_statement_month, r"([0-9]{4})年([0-9]{2})月(以降)?分");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentType {
    /// `1回払い`
    Single,
    /// `リボ変更`
    ToRevolving,
    /// `分割N回払い(M回目)`
    Installments,
    Other(String),
}

impl PaymentType {
    fn from_raw(raw: &str) -> Self {
        match raw {
            "1回払い" => PaymentType::Single,
            "リボ変更" => PaymentType::ToRevolving,
            _ if re_installments().is_match(raw) => PaymentType::Installments,
            other => PaymentType::Other(other.to_string()),
        }
    }
}

/// One cleaned-up statement line.
#[derive(Debug, Clone, PartialEq)]
pub struct RakutenEntry {
    /// `YYYY-MM-DD`, Japan time.
    pub date: String,
    pub payee: String,
    pub payment_type: PaymentType,
    pub base_amount: Amount,
    pub transaction_fee: Amount,
    /// Base amount plus fee.
    pub total_amount: Amount,
    pub notes: String,
    pub country_code: Option<String>,
}

fn field<'a>(record: &'a Record, column: &str) -> &'a str {
    record.get(column).map(String::as_str).unwrap_or("")
}

fn amount_or_zero(raw: &str) -> Result<Amount, ImportError> {
    if raw.trim().is_empty() {
        Ok(Amount::zero())
    } else {
        Ok(raw.parse()?)
    }
}

/// Parses a downloaded statement CSV into entries.
///
/// Rows with neither a date nor a payment type are annotations of the row
/// above; they are folded into that entry's notes, not returned.
pub fn parse_statement(raw: &str) -> Result<Vec<RakutenEntry>, ImportError> {
    let records = parse_records(raw)?;
    let mut entries = Vec::new();

    for (i, record) in records.iter().enumerate() {
        let date = field(record, COL_DATE);
        let raw_payment_type = field(record, COL_PAYMENT_TYPE);
        if date.is_empty() && raw_payment_type.is_empty() {
            continue;
        }

        let payment_type = PaymentType::from_raw(raw_payment_type);
        let mut notes = Vec::new();
        if let Some(caps) = re_installments().captures(raw_payment_type) {
            notes.push(format!("Installment {} of {}", &caps[2], &caps[1]));
        }

        let (payee, country_code) = clean_payee(field(record, COL_PAYEE), &mut notes);

        if let Some(next) = records.get(i + 1) {
            if field(next, COL_DATE).is_empty() {
                if let Some(note) = conversion_note(field(next, COL_PAYEE)) {
                    notes.push(note);
                }
            }
        }

        let base_amount: Amount = field(record, COL_BASE_AMOUNT).parse()?;
        let entry = RakutenEntry {
            date: date.replace('/', "-"),
            payee,
            payment_type,
            base_amount,
            transaction_fee: amount_or_zero(field(record, COL_FEE))?,
            total_amount: amount_or_zero(field(record, COL_TOTAL))?,
            notes: notes.join(" - "),
            country_code,
        };

        if entry.payment_type == PaymentType::ToRevolving {
            // The statement only carries one line with a zero total. Emit the
            // purchase and a second line cancelling it into the revolving balance.
            let reversal_notes = std::iter::once(entry.payee.clone())
                .chain(notes.iter().cloned())
                .collect::<Vec<_>>()
                .join(" - ");
            let reversal = RakutenEntry {
                payee: REVOLVING_PAYEE.to_string(),
                notes: reversal_notes,
                base_amount: -entry.base_amount,
                total_amount: -entry.base_amount,
                ..entry.clone()
            };
            let total_amount = if entry.total_amount.is_zero() {
                entry.base_amount
            } else {
                entry.total_amount
            };
            entries.push(RakutenEntry {
                total_amount,
                ..entry
            });
            entries.push(reversal);
        } else {
            entries.push(entry);
        }
    }

    Ok(entries)
}

/// Strips the card-network prefixes Rakuten stuffs into the payee column.
fn clean_payee(raw: &str, notes: &mut Vec<String>) -> (String, Option<String>) {
    let mut payee = re_mastercard_domestic().replace(raw, "").into_owned();
    payee = re_visa_domestic().replace(&payee, "").into_owned();

    if re_jcb_quicpay().is_match(&payee) {
        notes.push("QuicPay".to_string());
        payee = re_jcb_quicpay().replace(&payee, "").into_owned();
    } else {
        payee = re_jcb_domestic().replace(&payee, "").into_owned();
    }

    payee = re_overseas().replace(&payee, "").into_owned();

    let mut country_code = None;
    if payee.contains("利用国") {
        let mut parts = payee.split("利用国");
        let name = parts.next().unwrap_or_default().to_string();
        country_code = parts.next().map(str::to_string);
        payee = name;
    }

    payee = re_repayment_change().replace(&payee, "").into_owned();
    payee = re_full_width_spaces().replace_all(&payee, "　").into_owned();
    payee = re_spaces().replace_all(&payee, " ").into_owned();

    (payee.trim().to_string(), country_code)
}

/// Reads a `現地利用額` annotation: the amount in local currency followed by
/// the conversion rate, both in full-width digits.
fn conversion_note(raw_note: &str) -> Option<String> {
    if !raw_note.starts_with("現地利用額") {
        tracing::warn!("Unknown statement note format: {raw_note}");
        return None;
    }

    let tokens: Vec<&str> = raw_note.split_whitespace().collect();
    let amount = tokens
        .get(1)
        .and_then(|t| t.split("変換レート").next())
        .and_then(parse_full_width_number);
    let rate = tokens
        .get(2)
        .and_then(|t| t.split('円').next())
        .and_then(parse_full_width_number);

    let (Some(amount), Some(rate)) = (amount, rate) else {
        tracing::warn!("Unreadable currency conversion note: {raw_note}");
        return None;
    };

    if rate == rust_decimal::Decimal::ONE {
        return None;
    }
    Some(format!("Converted {amount:.2} @ {} ¥ e.a.", rate.normalize()))
}

/// Turns entries into credit-card transactions. Charges are outflows, and a
/// non-zero fee is split out from the purchase itself.
pub fn to_transactions(entries: &[RakutenEntry]) -> Result<Vec<Transaction>, ImportError> {
    entries
        .iter()
        .map(|entry| -> Result<Transaction, ImportError> {
            let mut tx = Transaction::new(parse_date(&entry.date)?, -entry.total_amount)
                .with_payee(entry.payee.clone());

            let memo = match &entry.country_code {
                Some(code) if entry.notes.is_empty() => country_flag(code),
                Some(code) => format!("{} {}", country_flag(code), entry.notes),
                None => entry.notes.clone(),
            };
            if !memo.is_empty() {
                tx = tx.with_memo(memo);
            }

            if entry.transaction_fee.is_positive() {
                tx = tx.with_splits(vec![
                    Split::new(-entry.base_amount),
                    Split::new(-entry.transaction_fee).with_memo(FEE_MEMO),
                ]);
            }
            Ok(tx)
        })
        .collect()
}

/// `rakuten-<last four card digits>-<YYYY-MM>.qif`, dropping parts that could
/// not be read. A statement covering "this month onwards" gets a `~` suffix.
pub fn export_filename(card_number: Option<&str>, statement_month: Option<&str>) -> String {
    let card = card_number.map(str::trim).filter(|s| !s.is_empty()).map(|s| {
        let chars: Vec<char> = s.chars().collect();
        chars[chars.len().saturating_sub(4)..].iter().collect::<String>()
    });

    let period = statement_month
        .and_then(|text| re_statement_month().captures(text))
        .map(|caps| {
            let suffix = if caps.get(3).is_some() { "~" } else { "" };
            format!("{}-{}{}", &caps[1], &caps[2], suffix)
        });

    let parts: Vec<String> = std::iter::once("rakuten".to_string())
        .chain(card)
        .chain(period)
        .collect();
    format!("{}.qif", parts.join("-"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str = "利用日,利用店名・商品名,利用者,支払方法,利用金額,支払手数料,支払総額";

    fn csv(rows: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text.push('\n');
        text
    }

    fn amt(s: &str) -> Amount {
        s.parse().unwrap()
    }

    // ── parse_statement ───────────────────────────────────────────────────────

    #[test]
    fn single_payment_row() {
        let entries =
            parse_statement(&csv(&["2024/01/15,ＡＭＡＺＯＮ．ＣＯ．ＪＰ,本人,1回払い,1500,,1500"]))
                .unwrap();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.date, "2024-01-15");
        assert_eq!(e.payee, "ＡＭＡＺＯＮ．ＣＯ．ＪＰ");
        assert_eq!(e.payment_type, PaymentType::Single);
        assert_eq!(e.base_amount, amt("1500"));
        assert_eq!(e.transaction_fee, Amount::zero());
        assert_eq!(e.total_amount, amt("1500"));
        assert_eq!(e.notes, "");
        assert_eq!(e.country_code, None);
    }

    #[test]
    fn card_network_prefixes_are_stripped() {
        let entries = parse_statement(&csv(&[
            "2024/01/15,マスター国内利用　MZZ ローソン,本人,1回払い,300,,300",
            "2024/01/16,ＶＩＳＡ国内利用　VS セブン,本人,1回払い,200,,200",
            "2024/01/17,ＪＣＢ国内利用　QP ファミマ,本人,1回払い,100,,100",
            "2024/01/18,海外利用　１ AMAZON,本人,1回払い,900,,900",
        ]))
        .unwrap();
        assert_eq!(entries[0].payee, "ローソン");
        assert_eq!(entries[1].payee, "セブン");
        assert_eq!(entries[2].payee, "ファミマ");
        assert_eq!(entries[2].notes, "QuicPay");
        assert_eq!(entries[3].payee, "AMAZON");
    }

    #[test]
    fn country_code_is_split_from_payee() {
        let entries = parse_statement(&csv(&[
            "2024/02/01,STEAM GAMES 利用国USA,本人,1回払い,2000,,2000",
        ]))
        .unwrap();
        assert_eq!(entries[0].payee, "STEAM GAMES");
        assert_eq!(entries[0].country_code.as_deref(), Some("USA"));
    }

    #[test]
    fn whitespace_runs_are_collapsed() {
        let entries =
            parse_statement(&csv(&["2024/02/01,ＡＢＣ　　　ストア   本店,本人,1回払い,10,,10"]))
                .unwrap();
        assert_eq!(entries[0].payee, "ＡＢＣ　ストア 本店");
    }

    #[test]
    fn installments_add_a_note() {
        let entries = parse_statement(&csv(&[
            "2024/03/01,ビックカメラ,本人,分割12回払い(3回目),120000,500,10500",
        ]))
        .unwrap();
        assert_eq!(entries[0].payment_type, PaymentType::Installments);
        assert_eq!(entries[0].notes, "Installment 3 of 12");
        assert_eq!(entries[0].transaction_fee, amt("500"));
    }

    #[test]
    fn conversion_note_row_is_folded_into_previous_entry() {
        let entries = parse_statement(&csv(&[
            "2024/04/02,海外利用　１ HOTEL 利用国GBR,本人,1回払い,4970,,4970",
            ",現地利用額　　　　　　　　３５．０００変換レート　１４２．０２９円,,,,,",
        ]))
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].notes, "Converted 35.00 @ 142.029 ¥ e.a.");
        assert_eq!(entries[0].country_code.as_deref(), Some("GBR"));
    }

    #[test]
    fn unit_conversion_rate_adds_no_note() {
        let entries = parse_statement(&csv(&[
            "2024/04/02,SHOP,本人,1回払い,100,,100",
            ",現地利用額　１００．０００変換レート　１．０００円,,,,,",
        ]))
        .unwrap();
        assert_eq!(entries[0].notes, "");
    }

    #[test]
    fn unknown_note_rows_are_ignored() {
        let entries = parse_statement(&csv(&[
            "2024/04/02,SHOP,本人,1回払い,100,,100",
            ",何かのメモ,,,,,",
        ]))
        .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].notes, "");
    }

    #[test]
    fn revolving_conversion_emits_purchase_and_reversal() {
        let entries =
            parse_statement(&csv(&["2024/05/10,家電店,本人,リボ変更,30000,,0"])).unwrap();
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].payee, "家電店");
        assert_eq!(entries[0].total_amount, amt("30000"));

        assert_eq!(entries[1].payee, "Converted to Revolving");
        assert_eq!(entries[1].notes, "家電店");
        assert_eq!(entries[1].base_amount, amt("-30000"));
        assert_eq!(entries[1].total_amount, amt("-30000"));
    }

    #[test]
    fn bad_amount_fails() {
        let result = parse_statement(&csv(&["2024/05/10,SHOP,本人,1回払い,abc,,0"]));
        assert!(matches!(result, Err(ImportError::Parse(_))));
    }

    #[test]
    fn mixed_quoting_surfaces_as_csv_error() {
        let result = parse_statement(&format!("{HEADER}\n2024/05/10,SH\"OP\",本人\n"));
        assert!(matches!(result, Err(ImportError::Csv(_))));
    }

    // ── to_transactions ───────────────────────────────────────────────────────

    #[test]
    fn charges_become_outflows() {
        let entries =
            parse_statement(&csv(&["2024/01/15,SHOP,本人,1回払い,1500,,1500"])).unwrap();
        let txs = to_transactions(&entries).unwrap();
        assert_eq!(txs[0].date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(txs[0].amount, amt("-1500"));
        assert_eq!(txs[0].payee.as_deref(), Some("SHOP"));
        assert_eq!(txs[0].memo, None);
        assert!(txs[0].splits.is_empty());
    }

    #[test]
    fn fee_is_split_out() {
        let entries = parse_statement(&csv(&[
            "2024/03/01,ビックカメラ,本人,分割12回払い(3回目),10000,500,10500",
        ]))
        .unwrap();
        let tx = &to_transactions(&entries).unwrap()[0];
        assert_eq!(tx.amount, amt("-10500"));
        assert_eq!(tx.splits.len(), 2);
        assert_eq!(tx.splits[0].amount, amt("-10000"));
        assert_eq!(tx.splits[1].amount, amt("-500"));
        assert_eq!(tx.splits[1].memo.as_deref(), Some("Transaction Fee"));
        assert_eq!(tx.split_total(), Some(tx.amount));
    }

    #[test]
    fn memo_leads_with_country_flag() {
        let entries = parse_statement(&csv(&[
            "2024/04/02,HOTEL 利用国GBR,本人,1回払い,4970,,4970",
            ",現地利用額　３５．０００変換レート　１４２．０２９円,,,,,",
            "2024/04/03,CAFE 利用国ZZZ,本人,1回払い,500,,500",
        ]))
        .unwrap();
        let txs = to_transactions(&entries).unwrap();
        assert_eq!(
            txs[0].memo.as_deref(),
            Some("🇬🇧 Converted 35.00 @ 142.029 ¥ e.a.")
        );
        assert_eq!(txs[1].memo.as_deref(), Some("cc:ZZZ"));
    }

    // ── export_filename ───────────────────────────────────────────────────────

    #[test]
    fn filename_with_card_and_month() {
        assert_eq!(
            export_filename(Some(" ****-****-****-1234 "), Some("2024年01月分")),
            "rakuten-1234-2024-01.qif"
        );
    }

    #[test]
    fn filename_marks_open_ended_month() {
        assert_eq!(
            export_filename(None, Some("2024年02月以降分")),
            "rakuten-2024-02~.qif"
        );
    }

    #[test]
    fn filename_without_details() {
        assert_eq!(export_filename(None, None), "rakuten.qif");
        assert_eq!(export_filename(Some(""), Some("unknown")), "rakuten.qif");
    }
}
