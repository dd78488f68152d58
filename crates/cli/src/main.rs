use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use captable_cli::{
    canonicalize_or_current, infer_company_name, load_cap_table, load_round_terms,
    parse_instrument_arg, sample_cap_table, sample_round_yaml, sha256_file, RoundReport,
};
use captable_core::format::{format_currency, format_percentage, format_shares, instrument_label, instrument_labels};
use captable_core::model::{CapTable, DilutionResult, RoundTerms, Stakeholder};

/// Cap-table ownership and dilution CLI.
///
/// This CLI is a thin wrapper around `captable-core` (exposed in code as
/// `captable_core`). All substantive logic lives in the library so it can be
/// tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "captable",
    version,
    about = "Cap-table ownership and dilution calculator",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scaffold a working directory with a sample cap table and round terms.
    ///
    /// This will:
    /// - Create the root directory if needed.
    /// - Write a `captable.json` with two founders and a 10% ESOP pool.
    /// - Write a `round.yaml` with a priced seed round.
    Init {
        /// Root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional company name. If omitted, derived from the root directory.
        #[arg(long)]
        name: Option<String>,
    },

    /// Show the ownership table for a cap table file.
    Ownership {
        /// Path to the cap table JSON file.
        #[arg(long)]
        captable: String,

        /// Use the outstanding denominator (excludes the unissued pool and
        /// non-outstanding holdings) instead of fully diluted.
        #[arg(long, default_value_t = false)]
        outstanding: bool,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Compute a financing round and show the pre/post dilution comparison.
    ///
    /// Round terms come either from a --terms file (YAML or JSON) or from the
    /// inline flags below.
    Round {
        /// Path to the cap table JSON file.
        #[arg(long)]
        captable: String,

        /// Optional round terms file (yaml/yml/json). Overrides inline flags.
        #[arg(long)]
        terms: Option<String>,

        /// Display name for the round.
        #[arg(long, default_value = "Round")]
        name: String,

        /// Display name for the incoming investor.
        #[arg(long, default_value = "New investor")]
        investor: String,

        /// Amount raised. Required unless --terms is given.
        #[arg(long)]
        amount: Option<Decimal>,

        /// Instrument: equity, safe, or convertible_note.
        #[arg(long, default_value = "equity")]
        instrument: String,

        /// Pre-money valuation (priced rounds; exclusive with --post-money).
        #[arg(long)]
        pre_money: Option<Decimal>,

        /// Post-money valuation (priced rounds; exclusive with --pre-money).
        #[arg(long)]
        post_money: Option<Decimal>,

        /// Target post-round ESOP pool percentage (top-up applied pre-money).
        #[arg(long)]
        esop_target: Option<Decimal>,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Also write a JSON report (result plus timestamp and input hash).
        #[arg(long)]
        report: Option<String>,
    },

    /// List the supported financing instruments.
    Instruments,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init { root, name } => init_command(&root, name)?,
        Command::Ownership { captable, outstanding, json } => {
            ownership_command(&captable, outstanding, json)?
        }
        Command::Round {
            captable,
            terms,
            name,
            investor,
            amount,
            instrument,
            pre_money,
            post_money,
            esop_target,
            json,
            report,
        } => round_command(RoundArgs {
            captable,
            terms,
            name,
            investor,
            amount,
            instrument,
            pre_money,
            post_money,
            esop_target,
            json,
            report,
        })?,
        Command::Instruments => instruments_command(),
    }

    Ok(())
}

/// Scaffold a working directory with sample inputs.
fn init_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    fs::create_dir_all(&root_path)
        .with_context(|| format!("Failed to create root dir: {}", root_path.display()))?;

    let company = match name {
        Some(n) => n,
        None => infer_company_name(&root_path),
    };

    let captable_path = root_path.join("captable.json");
    let table = sample_cap_table(&company);
    let table_json = serde_json::to_string_pretty(&table)?;
    fs::write(&captable_path, table_json)
        .with_context(|| format!("Failed to write cap table: {}", captable_path.display()))?;

    let round_path = root_path.join("round.yaml");
    fs::write(&round_path, sample_round_yaml())
        .with_context(|| format!("Failed to write round terms: {}", round_path.display()))?;

    println!("Initialized cap-table workspace:");
    println!("  Company:   {}", company);
    println!("  Root:      {}", root_path.display());
    println!("  Cap table: {}", captable_path.display());
    println!("  Round:     {}", round_path.display());

    Ok(())
}

/// Show the ownership table for one snapshot of a cap table file.
fn ownership_command(captable: &str, outstanding: bool, json: bool) -> Result<()> {
    let path = Path::new(captable);
    let table = load_cap_table(path)?;

    let stakeholders = captable_core::engine::calculate_ownership(
        &table.stakeholders,
        table.issued_shares(),
        !outstanding,
        table.esop_pool_pct,
    )?;

    if json {
        let body = serde_json::to_string_pretty(&serde_json::json!({
            "name": table.name,
            "view": if outstanding { "outstanding" } else { "fully_diluted" },
            "stakeholders": stakeholders,
            "esop_pool_pct": table.esop_pool_pct,
            "fully_diluted_shares": table.fully_diluted_shares(),
        }))?;
        println!("{}", body);
        return Ok(());
    }

    println!("Cap table: {}", table.name);
    println!("View: {}", if outstanding { "outstanding" } else { "fully diluted" });
    print_stakeholder_rows(&stakeholders, None);
    if !outstanding {
        println!("  ESOP pool (unissued): {}", format_percentage(table.esop_pool_pct));
    }

    Ok(())
}

struct RoundArgs {
    captable: String,
    terms: Option<String>,
    name: String,
    investor: String,
    amount: Option<Decimal>,
    instrument: String,
    pre_money: Option<Decimal>,
    post_money: Option<Decimal>,
    esop_target: Option<Decimal>,
    json: bool,
    report: Option<String>,
}

/// Compute a round and render the pre/post comparison.
fn round_command(args: RoundArgs) -> Result<()> {
    let captable_path = Path::new(&args.captable);
    let table = load_cap_table(captable_path)?;

    let terms = match &args.terms {
        Some(file) => load_round_terms(Path::new(file))?,
        None => {
            let amount =
                args.amount.ok_or_else(|| anyhow!("Pass --amount or a --terms file"))?;
            RoundTerms {
                round_name: args.name,
                investor_name: args.investor,
                amount_raised: amount,
                instrument: parse_instrument_arg(
                    &args.instrument,
                    args.pre_money,
                    args.post_money,
                )?,
                esop_target_pct: args.esop_target,
            }
        }
    };

    let result =
        captable_core::engine::compute_round(&table, &terms).context("Round computation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_round(&table, &terms, &result);
    }

    if let Some(report_path) = args.report {
        let report = RoundReport {
            generated_at: Utc::now().to_rfc3339(),
            captable_path: captable_path.display().to_string(),
            captable_hash: sha256_file(captable_path)?,
            terms,
            result,
        };
        let body = serde_json::to_string_pretty(&report)?;
        fs::write(&report_path, body)
            .with_context(|| format!("Failed to write report at {report_path}"))?;
        if !args.json {
            println!();
            println!("Wrote report: {report_path}");
        }
    }

    Ok(())
}

/// List the supported instruments with their wire tags.
fn instruments_command() {
    println!("Supported instruments:");
    for (tag, label) in instrument_labels() {
        println!("  - {:<17} {}", tag, label);
    }
}

fn print_round(table: &CapTable, terms: &RoundTerms, result: &DilutionResult) {
    println!("Cap table: {}", table.name);
    println!();
    println!("Pre-round ownership (fully diluted):");
    print_stakeholder_rows(&result.pre_round.stakeholders, None);
    println!("  ESOP pool (unissued): {}", format_percentage(result.pre_round.esop_pool_pct));
    println!();

    println!(
        "Round: {} raising {} ({})",
        terms.round_name,
        format_currency(terms.amount_raised),
        instrument_label(&terms.instrument)
    );

    let post = &result.post_round;
    if post.converts_at_next_round {
        println!("  No immediate dilution; the instrument converts at the next priced round.");
    } else {
        if let Some(v) = post.post_money {
            println!("  Post-money valuation: {}", format_currency(v));
        }
        if let Some(v) = post.price_per_share {
            println!("  Price per share:      {}", format_currency(v));
        }
        if let Some(v) = post.new_investor_ownership_pct {
            println!("  New investor:         {} ({})", terms.investor_name, format_percentage(v));
        }
    }
    println!();

    println!("Post-round ownership:");
    print_stakeholder_rows(&post.stakeholders, Some(&result.dilution_pct));
    println!("  ESOP pool (unissued): {}", format_percentage(post.esop_pool_pct));
}

/// Print stakeholder rows; with a dilution map, annotate each row with its
/// delta (rows absent from the map are new this round).
fn print_stakeholder_rows(
    stakeholders: &[Stakeholder],
    dilution: Option<&BTreeMap<String, Decimal>>,
) {
    for s in stakeholders {
        let mut line = format!(
            "  - {:<24} {:>12} shares  {:>6}",
            s.name,
            format_shares(s.shares),
            format_percentage(s.ownership)
        );
        if let Some(map) = dilution {
            match map.get(&s.id) {
                Some(delta) if !delta.is_zero() => {
                    line.push_str(&format!("  (-{}pp)", delta.round_dp(1).normalize()));
                }
                Some(_) => {}
                None => line.push_str("  (new)"),
            }
        } else {
            line.push_str(&format!("  [{}]", s.stakeholder_type.as_str()));
        }
        println!("{line}");
    }
}
