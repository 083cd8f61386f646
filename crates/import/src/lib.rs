// ── Compiled regex cache ─────────────────────────────────────────────────────

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static regex::Regex {
            static R: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
            R.get_or_init(|| regex::Regex::new($pat).expect("invalid regex"))
        }
    };
}

pub mod csv;
pub mod error;
pub mod jnb;
pub mod rakuten;
pub mod suica;
pub(crate) mod util;

pub use csv::{parse, parse_records, tokenize, CsvError, ParsedCsv, Record};
pub use error::ImportError;
pub use jnb::{DebitDetail, DebitDetails, StatementRow};
pub use rakuten::{PaymentType, RakutenEntry};
pub use suica::{StatementMonth, SuicaHistory, TableLayout};
