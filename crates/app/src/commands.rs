use anyhow::{Context, Result};
use chrono::NaiveDate;
use kakeibo_core::{AccountType, QifConfig, Transaction};
use kakeibo_export::{generate, Downloader, FileDownloader, SavedDownload, QIF_MIME};
use kakeibo_import::jnb::{self, DebitCardEntry, StatementRow};
use kakeibo_import::suica::{self, StatementMonth, SuicaHistory};
use kakeibo_import::{rakuten, ParsedCsv};
use kakeibo_storage::JsonFileStore;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

use crate::config::AppConfig;

pub struct Session {
    pub config: AppConfig,
    pub out_dir: PathBuf,
}

impl Session {
    pub fn new(config: AppConfig, out_dir: Option<PathBuf>) -> Self {
        let out_dir = out_dir.unwrap_or_else(|| config.output_dir.clone());
        Self { config, out_dir }
    }

    fn save(
        &self,
        filename: &str,
        qif: QifConfig,
        transactions: &[Transaction],
    ) -> Result<SavedDownload> {
        let text = generate(&qif, transactions).context("generating QIF")?;
        let saved = FileDownloader::new(&self.out_dir)
            .download(filename, QIF_MIME, &text)
            .with_context(|| format!("saving {filename}"))?;
        tracing::info!(
            "Exported {} transactions to {}",
            transactions.len(),
            saved.path.display()
        );
        Ok(saved)
    }

    fn open_cache(&self) -> Result<JsonFileStore> {
        let path = self.config.cache_path();
        JsonFileStore::open(&path).with_context(|| format!("opening cache {}", path.display()))
    }
}

fn qif_config(account_type: AccountType, name: &Option<String>) -> QifConfig {
    let config = QifConfig::new(account_type);
    match name {
        Some(name) => config.with_account_name(name.clone()),
        None => config,
    }
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    serde_json::from_str(&read_text(path)?).with_context(|| format!("parsing {}", path.display()))
}

/// Returns the CSV file's rows (or header-keyed records) as pretty JSON.
pub fn tokenize(file: &Path, header: bool) -> Result<String> {
    let parsed = kakeibo_import::parse(&read_text(file)?, header)
        .with_context(|| format!("tokenizing {}", file.display()))?;
    let json = match parsed {
        ParsedCsv::Rows(rows) => serde_json::to_string_pretty(&rows)?,
        ParsedCsv::Records(records) => serde_json::to_string_pretty(&records)?,
    };
    Ok(json)
}

pub fn rakuten(
    ctx: &Session,
    file: &Path,
    card: Option<&str>,
    statement_month: Option<&str>,
) -> Result<SavedDownload> {
    let entries = rakuten::parse_statement(&read_text(file)?)
        .with_context(|| format!("reading Rakuten statement {}", file.display()))?;
    let transactions = rakuten::to_transactions(&entries)?;
    ctx.save(
        &rakuten::export_filename(card, statement_month),
        qif_config(AccountType::CreditCard, &ctx.config.accounts.rakuten),
        &transactions,
    )
}

/// Merges scraped debit card details into the cache; returns the cache size.
pub fn jnb_details(ctx: &Session, file: &Path) -> Result<usize> {
    let entries: Vec<DebitCardEntry> = read_json(file)?;
    let mut cache = ctx.open_cache()?;
    let count = jnb::remember_debit_details(&mut cache, jnb::collect_debit_details(&entries))?;
    Ok(count)
}

pub fn jnb(ctx: &Session, file: &Path, period: Option<&str>) -> Result<SavedDownload> {
    let rows: Vec<StatementRow> = read_json(file)?;
    let details = jnb::load_debit_details(&ctx.open_cache()?)?;
    let parsed = jnb::parse_rows(&rows, &details).context(
        "visit the debit card statement page and run `kakeibo jnb-details` to load missing details",
    )?;
    let transactions = jnb::to_transactions(&parsed)?;
    ctx.save(
        &jnb::export_filename(period),
        qif_config(AccountType::Bank, &ctx.config.accounts.jnb),
        &transactions,
    )
}

pub fn suica(
    ctx: &Session,
    file: &Path,
    selected_month: Option<&str>,
    selected_day: Option<&str>,
    origin: &str,
    today: NaiveDate,
) -> Result<SavedDownload> {
    let history: SuicaHistory = read_json(file)?;
    let month = StatementMonth::from_selector(selected_month, today)?;
    let transactions =
        suica::to_transactions(&history, month, &ctx.config.suica.transport_payee)?;
    ctx.save(
        &suica::export_filename(origin, selected_month, selected_day, today),
        qif_config(AccountType::Cash, &ctx.config.accounts.suica),
        &transactions,
    )
}
