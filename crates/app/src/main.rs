use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::Session;
use config::AppConfig;

#[derive(Parser)]
#[command(name = "kakeibo", version, about = "Convert Japanese bank and card statements to QIF")]
struct Cli {
    /// Config file (defaults to the per-user kakeibo.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory to write .qif files into
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a CSV file as JSON rows, or records keyed by the header row
    Tokenize {
        file: PathBuf,
        #[arg(long)]
        header: bool,
    },
    /// Convert a Rakuten Card statement CSV
    Rakuten {
        csv: PathBuf,
        /// Card number as shown on the statement page
        #[arg(long)]
        card: Option<String>,
        /// Statement month heading, e.g. 2024年01月分
        #[arg(long)]
        period: Option<String>,
    },
    /// Remember payees from the JNB debit card statement
    JnbDetails { json: PathBuf },
    /// Convert a JNB savings account statement
    Jnb {
        json: PathBuf,
        /// Statement period heading, e.g. 2024/01/01～2024/01/31
        #[arg(long)]
        period: Option<String>,
    },
    /// Convert a Suica or PASMO usage history
    Suica {
        json: PathBuf,
        /// Selected month, YYYY/MM
        #[arg(long)]
        year_month: Option<String>,
        #[arg(long)]
        day: Option<String>,
        /// Site the history was taken from
        #[arg(long, default_value = "")]
        origin: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let ctx = Session::new(config, cli.out);

    match cli.command {
        Command::Tokenize { file, header } => {
            println!("{}", commands::tokenize(&file, header)?);
        }
        Command::Rakuten { csv, card, period } => {
            commands::rakuten(&ctx, &csv, card.as_deref(), period.as_deref())?;
        }
        Command::JnbDetails { json } => {
            let count = commands::jnb_details(&ctx, &json)?;
            println!("{count} debit card details cached");
        }
        Command::Jnb { json, period } => {
            commands::jnb(&ctx, &json, period.as_deref())?;
        }
        Command::Suica {
            json,
            year_month,
            day,
            origin,
        } => {
            let today = chrono::Local::now().date_naive();
            commands::suica(
                &ctx,
                &json,
                year_month.as_deref(),
                day.as_deref(),
                &origin,
                today,
            )?;
        }
    }

    Ok(())
}
