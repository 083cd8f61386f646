use std::collections::BTreeMap;
use thiserror::Error;

const SEPARATOR: char = ',';
const QUOTE: char = '"';

/// A data row keyed by the header row's column names.
pub type Record = BTreeMap<String, String>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsvError {
    /// A field must be either fully quoted or fully unquoted.
    #[error("Invalid CSV: mixed escaped and unescaped content in row {row}, column {column}")]
    MixedQuoting { row: usize, column: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCsv {
    Rows(Vec<Vec<String>>),
    Records(Vec<Record>),
}

/// Splits raw CSV text into rows of fields.
///
/// Rows end at `\n` or `\r\n`; a lone `\r` is ordinary field content.
/// Quoted fields may contain separators, doubled quotes and `\r\n`
/// (stored as `\n`). An unterminated quote runs to the end of input.
pub fn tokenize(raw: &str) -> Result<Vec<Vec<String>>, CsvError> {
    let mut tokenizer = Tokenizer::default();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if tokenizer.in_quotes {
            match c {
                QUOTE if chars.peek() == Some(&QUOTE) => {
                    chars.next();
                    tokenizer.token.push(QUOTE);
                }
                QUOTE => tokenizer.in_quotes = false,
                '\r' if chars.peek() == Some(&'\n') => {
                    chars.next();
                    tokenizer.token.push('\n');
                }
                _ => tokenizer.token.push(c),
            }
            continue;
        }

        match c {
            SEPARATOR => tokenizer.finish_field(),
            '\n' => tokenizer.finish_row(),
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                tokenizer.finish_row();
            }
            _ if tokenizer.quoted => return Err(tokenizer.mixed_quoting()),
            QUOTE if tokenizer.token.is_empty() => {
                tokenizer.quoted = true;
                tokenizer.in_quotes = true;
            }
            QUOTE => return Err(tokenizer.mixed_quoting()),
            _ => tokenizer.token.push(c),
        }
    }

    if !tokenizer.token.is_empty() || !tokenizer.fields.is_empty() {
        tokenizer.finish_row();
    }

    Ok(tokenizer.rows)
}

/// Tokenizes `raw` and maps every row after the first onto the first row's
/// column names.
///
/// Values beyond the header's width are dropped; columns a short row does
/// not reach are absent from its record. With duplicate column names the
/// rightmost value wins.
pub fn parse_records(raw: &str) -> Result<Vec<Record>, CsvError> {
    let mut rows = tokenize(raw)?.into_iter();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    Ok(rows
        .map(|row| header.iter().cloned().zip(row).collect())
        .collect())
}

pub fn parse(raw: &str, has_header: bool) -> Result<ParsedCsv, CsvError> {
    if has_header {
        parse_records(raw).map(ParsedCsv::Records)
    } else {
        tokenize(raw).map(ParsedCsv::Rows)
    }
}

#[derive(Default)]
struct Tokenizer {
    rows: Vec<Vec<String>>,
    fields: Vec<String>,
    token: String,
    /// The current field opened with a quote.
    quoted: bool,
    in_quotes: bool,
}

impl Tokenizer {
    fn finish_field(&mut self) {
        self.fields.push(std::mem::take(&mut self.token));
        self.quoted = false;
    }

    fn finish_row(&mut self) {
        self.finish_field();
        self.rows.push(std::mem::take(&mut self.fields));
    }

    fn mixed_quoting(&self) -> CsvError {
        CsvError::MixedQuoting {
            row: self.rows.len() + 1,
            column: self.fields.len() + 1,
        }
    }
}
