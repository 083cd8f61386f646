use kakeibo_core::{Amount, Category, QifConfig, Split, Transaction};
use thiserror::Error;

pub const QIF_MIME: &str = "application/qif";
pub const QIF_EXTENSION: &str = "qif";

const RECORD_SEPARATOR: &str = "^";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QifError {
    #[error("invalid transaction valued at {expected} whose splits sum to {actual}")]
    UnbalancedSplits { expected: Amount, actual: Amount },
    #[error("invalid transaction valued at {expected} whose splits overflow when summed")]
    SplitSumOverflow { expected: Amount },
}

/// Renders `transactions` as a QIF document.
///
/// Each transaction becomes `D`, `T`, `P`, `L`, `M`, `N` lines (absent
/// fields omitted) followed by `$`, `S`, `E`, `N` lines per split. Records
/// are separated by `^`. Fails without output if any transaction's splits
/// do not add up to its amount.
pub fn generate(config: &QifConfig, transactions: &[Transaction]) -> Result<String, QifError> {
    let records = transactions
        .iter()
        .map(render_transaction)
        .collect::<Result<Vec<_>, _>>()?;

    let mut out = String::new();
    if let Some(name) = &config.account_name {
        out.push_str(&format!(
            "!Account\nN{name}\nT{}\n{RECORD_SEPARATOR}\n",
            config.account_type
        ));
    }
    out.push_str(&format!("!Type:{}\n", config.account_type));
    out.push_str(&records.join(&format!("\n{RECORD_SEPARATOR}\n")));
    Ok(out)
}

fn render_transaction(tx: &Transaction) -> Result<String, QifError> {
    let mut lines = vec![
        format!("D{}", tx.date.format("%Y-%m-%d")),
        format!("T{}", tx.amount),
    ];
    push_text(&mut lines, 'P', tx.payee.as_deref());
    push_category(&mut lines, 'L', tx.category.as_ref());
    push_text(&mut lines, 'M', tx.memo.as_deref());
    push_text(&mut lines, 'N', tx.check.as_deref());

    if !tx.splits.is_empty() {
        let actual = tx
            .split_total()
            .ok_or(QifError::SplitSumOverflow { expected: tx.amount })?;
        if actual != tx.amount {
            return Err(QifError::UnbalancedSplits {
                expected: tx.amount,
                actual,
            });
        }
        lines.extend(tx.splits.iter().flat_map(render_split));
    }

    Ok(lines.join("\n"))
}

fn render_split(split: &Split) -> Vec<String> {
    let mut lines = vec![format!("${}", split.amount)];
    push_category(&mut lines, 'S', split.category.as_ref());
    push_text(&mut lines, 'E', split.memo.as_deref());
    push_text(&mut lines, 'N', split.check.as_deref());
    lines
}

fn push_text(lines: &mut Vec<String>, prefix: char, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        lines.push(format!("{prefix}{value}"));
    }
}

fn push_category(lines: &mut Vec<String>, prefix: char, category: Option<&Category>) {
    if let Some(category) = category {
        lines.push(format!("{prefix}{category}"));
    }
}
