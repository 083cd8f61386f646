pub mod account;
pub mod amount;
pub mod date;
pub mod error;
pub mod transaction;

pub use account::{AccountType, QifConfig};
pub use amount::Amount;
pub use date::parse_date;
pub use error::ParseError;
pub use transaction::{Category, Cleared, Split, Transaction};
