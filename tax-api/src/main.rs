use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::debug;

use tax_api::{
    ApiContext, AppConfig, PaymentTracker, QuarterStatus, handle_calculate, handle_quarterly,
    logging,
};
use tax_core::calculations::common::{format_currency, format_percent, round_half_up};
use tax_core::calculations::{estimate, quarterly_due_dates_with_rule};
use tax_core::{
    BracketTableProvider, DeductionKind, FilingStatus, TaxCalculationInput, TaxCalculationResult,
};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Federal income tax and quarterly estimated payment calculator.
#[derive(Debug, Parser)]
#[command(name = "taxscope", version, about)]
struct Cli {
    /// TOML config file. Built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of config.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Calculate the tax for one year.
    Calculate {
        #[command(flatten)]
        input: InputArgs,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the estimated-payment schedule.
    Quarterly {
        /// Defaults to the configured year.
        #[arg(long)]
        year: Option<i32>,
    },
    /// Calculate, then track the quarterly payments.
    Plan {
        #[command(flatten)]
        input: InputArgs,

        /// Quarters already paid, e.g. `--paid 1,2`.
        #[arg(long, value_delimiter = ',')]
        paid: Vec<u8>,

        /// Reference date for statuses (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Run a JSON request body through a handler and print the response.
    Request {
        #[arg(value_enum)]
        endpoint: Endpoint,

        /// Body file. Reads stdin when omitted.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum Endpoint {
    Calculate,
    Quarterly,
}

#[derive(Debug, Args)]
struct InputArgs {
    /// single, married_joint, married_separate, head_of_household (or S, MFJ, MFS, HOH).
    #[arg(long, default_value = "single", value_parser = parse_filing_status)]
    filing_status: FilingStatus,

    #[arg(long, default_value = "0")]
    gross_income: Decimal,

    #[arg(long, default_value = "0")]
    self_employment_income: Decimal,

    /// Itemized deductions. The standard deduction applies when larger.
    #[arg(long, default_value = "0")]
    deductions: Decimal,

    #[arg(long, default_value = "0")]
    withholdings: Decimal,

    /// Defaults to the configured year.
    #[arg(long)]
    year: Option<i32>,
}

impl InputArgs {
    fn input(&self) -> TaxCalculationInput {
        TaxCalculationInput::new(self.filing_status, self.gross_income)
            .with_self_employment_income(self.self_employment_income)
            .with_deductions(self.deductions)
            .with_withholdings(self.withholdings)
    }
}

fn parse_filing_status(s: &str) -> Result<FilingStatus, String> {
    FilingStatus::parse(s).ok_or_else(|| format!("unknown filing status '{s}'"))
}

// ─── commands ────────────────────────────────────────────────────────────────

fn calculate(
    ctx: &ApiContext,
    args: &InputArgs,
) -> Result<TaxCalculationResult> {
    let year = args.year.unwrap_or(ctx.default_year);
    let result = estimate(&ctx.tables, &args.input(), year)
        .with_context(|| format!("Failed to calculate taxes for {year}"))?;
    Ok(result.normalized())
}

fn print_result(result: &TaxCalculationResult) {
    println!(
        "{} federal tax, {}",
        result.tax_year,
        result.filing_status.label()
    );
    println!("  Gross income          {:>14}", format_currency(result.gross_income));
    let deduction = match result.deduction_used {
        DeductionKind::Standard => "standard",
        DeductionKind::Itemized => "itemized",
    };
    println!(
        "  Deduction ({deduction:<8})  {:>14}",
        format_currency(result.deduction_applied())
    );
    println!(
        "  Half SE tax           {:>14}",
        format_currency(result.self_employment_deduction)
    );
    println!("  Taxable income        {:>14}", format_currency(result.taxable_income));
    for entry in &result.bracket_breakdown {
        println!("    {:<32} {:>12}", entry.bracket, format_currency(entry.tax));
    }
    println!("  Federal tax           {:>14}", format_currency(result.federal_tax));
    println!(
        "  Self-employment tax   {:>14}",
        format_currency(result.self_employment_tax)
    );
    println!("  Total tax             {:>14}", format_currency(result.total_tax));
    println!("  Effective rate        {:>14}", format_percent(result.effective_rate));
    println!("  Marginal rate         {:>14}", format_percent(result.marginal_rate));
    println!("  Withholdings          {:>14}", format_currency(result.withholdings));
    if result.is_refund() {
        println!("  Refund                {:>14}", format_currency(result.refund()));
    } else {
        println!("  Estimated owed        {:>14}", format_currency(result.estimated_owed));
    }
    println!(
        "  Quarterly payment     {:>14}",
        format_currency(result.quarterly_payment)
    );
}

fn quarterly(
    ctx: &ApiContext,
    year: Option<i32>,
) -> Result<()> {
    let year = year.unwrap_or(ctx.default_year);
    let quarters = quarterly_due_dates_with_rule(year, ctx.due_date_rule)
        .with_context(|| format!("Failed to build quarterly schedule for {year}"))?;
    for q in &quarters {
        println!(
            "Q{}  {:<16} due {}",
            q.quarter,
            q.period,
            q.due_date.format("%b %-d, %Y")
        );
    }
    Ok(())
}

fn status_text(status: QuarterStatus) -> String {
    match status {
        QuarterStatus::Paid => "Paid".to_string(),
        QuarterStatus::Overdue => "Overdue".to_string(),
        QuarterStatus::DueSoon { days } => format!("{days} days"),
        QuarterStatus::Upcoming => "Upcoming".to_string(),
    }
}

fn plan(
    ctx: &ApiContext,
    args: &InputArgs,
    paid: &[u8],
    today: NaiveDate,
) -> Result<()> {
    let result = calculate(ctx, args)?;
    let periods = quarterly_due_dates_with_rule(result.tax_year, ctx.due_date_rule)
        .context("Failed to build quarterly schedule")?;

    let mut tracker = PaymentTracker::new(periods, round_half_up(result.quarterly_payment));
    for &quarter in paid {
        tracker
            .toggle_paid(quarter)
            .with_context(|| format!("Cannot mark quarter {quarter} paid"))?;
    }

    println!("{} quarterly payments as of {today}", result.tax_year);
    for q in tracker.quarters() {
        println!(
            "Q{}  {:<16} due {:<13} {:>12}  {}",
            q.period.quarter,
            q.period.period,
            q.period.due_date.format("%b %-d, %Y").to_string(),
            format_currency(q.estimated_amount),
            status_text(q.status(today))
        );
    }
    println!("Total estimated {:>12}", format_currency(tracker.total_estimated()));
    println!("Total paid      {:>12}", format_currency(tracker.total_paid()));
    println!("Remaining       {:>12}", format_currency(tracker.remaining()));
    Ok(())
}

fn request(
    ctx: &ApiContext,
    endpoint: Endpoint,
    file: Option<&PathBuf>,
) -> Result<()> {
    let body = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {}", path.display()))?,
        None => {
            let mut body = String::new();
            std::io::stdin()
                .read_to_string(&mut body)
                .context("Failed to read stdin")?;
            body
        }
    };

    let response = match endpoint {
        Endpoint::Calculate => handle_calculate(ctx, &body),
        Endpoint::Quarterly => handle_quarterly(ctx, &body),
    };
    println!("{}", serde_json::to_string_pretty(&response.body)?);

    if !response.is_success() {
        anyhow::bail!("request failed with status {}", response.status);
    }
    Ok(())
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    logging::init_logging(&config.logging)?;
    if cli.verbose {
        logging::set_log_level("debug")?;
    }
    debug!(?config, "configuration loaded");

    let ctx = ApiContext::from_config(&config).context("Failed to load tax tables")?;
    debug!(years = ?ctx.tables.years(), "tax tables ready");

    match cli.command {
        Command::Calculate { input, json } => {
            let result = calculate(&ctx, &input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_result(&result);
            }
        }
        Command::Quarterly { year } => quarterly(&ctx, year)?,
        Command::Plan { input, paid, today } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            plan(&ctx, &input, &paid, today)?;
        }
        Command::Request { endpoint, file } => request(&ctx, endpoint, file.as_ref())?,
    }

    Ok(())
}
