//! CalcX command line
//!
//! Currency conversion against CLP plus the tax and retention calculators.

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calcx_calc::{CalcError, Calculator, InputMode, RetentionCalculator, TaxCalculator};
use calcx_common::CurrencyCode;
use calcx_fx::{cancellation, CancellationSignal, FxEngine, FxEngineConfig, FxError};

mod output;

/// CalcX CLI
#[derive(Parser, Debug)]
#[command(name = "calcx")]
#[command(about = "Currency conversion, tax and retention calculators")]
struct Args {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert an amount between currencies
    Convert {
        /// Amount to convert
        #[arg(allow_negative_numbers = true)]
        amount: Decimal,
        /// Source currency (CLP, UF, USD, EUR)
        from: CurrencyCode,
        /// Target currency (CLP, UF, USD, EUR)
        to: CurrencyCode,
        /// Ignore cached rates
        #[arg(long)]
        refresh: bool,
    },

    /// Show current reference rates in CLP
    Rates {
        /// Ignore cached rates
        #[arg(long)]
        refresh: bool,
    },

    /// Value added tax on an order
    Tax(CalcArgs),

    /// Withholding on professional fees
    Retention(CalcArgs),
}

#[derive(clap::Args, Debug)]
struct CalcArgs {
    /// Amount entered
    #[arg(allow_negative_numbers = true)]
    amount: Decimal,

    /// Whether the amount is gross or net
    #[arg(long, value_enum, default_value_t = Mode::Gross)]
    mode: Mode,

    /// Rate as a fraction, e.g. 0.19
    #[arg(long, allow_negative_numbers = true)]
    rate: Option<Decimal>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Gross,
    Net,
}

impl From<Mode> for InputMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Gross => InputMode::Gross,
            Mode::Net => InputMode::Net,
        }
    }
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Build the engine and a signal that fires on Ctrl+C.
fn rate_engine() -> anyhow::Result<(FxEngine, CancellationSignal)> {
    let config = FxEngineConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let engine = FxEngine::from_config(config).map_err(rate_failure)?;
    debug!(
        endpoint = %engine.config().endpoint,
        cache_path = %engine.config().cache_path.display(),
        "Rate engine configured"
    );
    let (handle, signal) = cancellation();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Cancellation requested");
            handle.cancel();
        }
    });

    Ok((engine, signal))
}

/// Log the stable code and, when the remote source failed, suggest a retry.
fn rate_failure(err: FxError) -> anyhow::Error {
    warn!(code = err.error_code(), retryable = err.is_retryable(), "Rate request failed");
    if err.is_retryable() {
        anyhow::Error::new(err).context("Rates are unavailable right now, try again later")
    } else {
        err.into()
    }
}

fn calc_failure(err: CalcError) -> anyhow::Error {
    warn!(code = err.error_code(), "Calculation rejected");
    err.into()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    let rendered = match args.command {
        Command::Convert {
            amount,
            from,
            to,
            refresh,
        } => {
            let (engine, signal) = rate_engine()?;
            let result = engine
                .convert(amount, from, to, refresh, &signal)
                .await
                .map_err(rate_failure)?;
            output::conversion(&result, args.json)?
        }
        Command::Rates { refresh } => {
            let (engine, signal) = rate_engine()?;
            let snapshot = engine
                .get_rates(refresh, &signal)
                .await
                .map_err(rate_failure)?;
            output::reference_rates(&snapshot, args.json)?
        }
        Command::Tax(calc) => {
            let result = TaxCalculator::new()
                .calculate(calc.amount, calc.mode.into(), calc.rate)
                .map_err(calc_failure)?;
            output::calculation("Tax", &result, args.json)?
        }
        Command::Retention(calc) => {
            let result = RetentionCalculator::new()
                .calculate(calc.amount, calc.mode.into(), calc.rate)
                .map_err(calc_failure)?;
            output::calculation("Retention", &result, args.json)?
        }
    };

    println!("{}", rendered);
    Ok(())
}
