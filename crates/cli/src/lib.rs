use std::env;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

use captable_core::model::{
    CapTable, DilutionResult, Instrument, RoundTerms, Stakeholder, StakeholderType, Valuation,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Canonicalize the root path if possible, falling back to the given string
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    if path == Path::new(".") {
        Ok(env::current_dir().context("Failed to get current directory")?)
    } else {
        // Try to canonicalize; if it fails (e.g., path does not yet exist),
        // join it with the current dir to get an absolute path.
        match path.canonicalize() {
            Ok(p) => Ok(p),
            Err(_) => {
                let cwd = env::current_dir().context("Failed to get current directory")?;
                Ok(cwd.join(path))
            }
        }
    }
}

/// Infer a company name from the root path.
///
/// If the root has no final component (e.g., `/`), fallback to `unnamed-company`.
pub fn infer_company_name(root: &Path) -> String {
    root.file_name().and_then(|os_str| os_str.to_str()).unwrap_or("unnamed-company").to_string()
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
///
/// Used to record which cap-table file a written report was computed from.
pub fn sha256_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open file for hashing: {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read file for hashing: {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    let digest = hasher.finalize();
    Ok(format!("{:x}", digest))
}

/// Load a cap table from a JSON file.
pub fn load_cap_table(path: &Path) -> Result<CapTable> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read cap table at {}", path.display()))?;
    CapTable::from_json(&body)
        .with_context(|| format!("Failed to parse cap table JSON at {}", path.display()))
}

/// Load round terms from a file; YAML or JSON decided by extension
/// (yaml/yml vs anything else).
pub fn load_round_terms(path: &Path) -> Result<RoundTerms> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read round terms at {}", path.display()))?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
    if matches!(ext, "yaml" | "yml") {
        // Bridge through a JSON value so plain-mapping YAML (no `!` variant
        // tags) deserializes exactly like the JSON format.
        let value: serde_yaml::Value = serde_yaml::from_str(&body)
            .with_context(|| format!("Failed to parse round terms YAML at {}", path.display()))?;
        let json = serde_json::to_value(&value)
            .with_context(|| format!("Failed to parse round terms YAML at {}", path.display()))?;
        serde_json::from_value(json)
            .with_context(|| format!("Failed to parse round terms YAML at {}", path.display()))
    } else {
        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse round terms JSON at {}", path.display()))
    }
}

/// Build an instrument from CLI flags.
///
/// A priced equity round takes exactly one of the two valuation flags; SAFE
/// and note rounds ignore valuation flags entirely (caps/discounts belong in
/// a terms file).
pub fn parse_instrument_arg(
    kind: &str,
    pre_money: Option<Decimal>,
    post_money: Option<Decimal>,
) -> Result<Instrument> {
    match kind {
        "equity" => {
            let valuation = match (pre_money, post_money) {
                (Some(p), None) => Valuation::PreMoney(p),
                (None, Some(p)) => Valuation::PostMoney(p),
                (Some(_), Some(_)) => {
                    return Err(anyhow!("Pass exactly one of --pre-money or --post-money, not both"))
                }
                (None, None) => {
                    return Err(anyhow!("A priced equity round needs --pre-money or --post-money"))
                }
            };
            Ok(Instrument::Equity { valuation })
        }
        "safe" => Ok(Instrument::Safe { valuation_cap: None, discount_pct: None }),
        "note" | "convertible_note" => Ok(Instrument::ConvertibleNote {
            valuation_cap: None,
            discount_pct: None,
            interest_rate_pct: None,
        }),
        other => Err(anyhow!(
            "Unrecognized instrument '{other}'; expected one of: equity, safe, convertible_note"
        )),
    }
}

/// A computed round plus provenance, written by `round --report`.
#[derive(Debug, Serialize)]
pub struct RoundReport {
    pub generated_at: String,
    pub captable_path: String,
    /// SHA-256 of the cap-table file the round was computed from.
    pub captable_hash: String,
    pub terms: RoundTerms,
    pub result: DilutionResult,
}

/// Sample cap table written by `init`: two founders and a 10% pool.
pub fn sample_cap_table(name: &str) -> CapTable {
    CapTable::new(name)
        .with_stakeholder(Stakeholder::new(
            "founder-a",
            "Founder A",
            StakeholderType::Founder,
            6_000_000,
        ))
        .with_stakeholder(Stakeholder::new(
            "founder-b",
            "Founder B",
            StakeholderType::Founder,
            4_000_000,
        ))
        .with_esop_pool(dec!(10))
}

/// Sample round terms written by `init`: €2M at €8M pre-money, as plain
/// YAML mappings (no variant tags) so it reads the same as the JSON format.
pub fn sample_round_yaml() -> String {
    let mut contents = String::new();
    contents.push_str("# Edit and re-run: captable round --captable captable.json --terms round.yaml\n");
    contents.push_str("round_name: Seed\n");
    contents.push_str("investor_name: Seed Fund I\n");
    contents.push_str("amount_raised: 2000000\n");
    contents.push_str("instrument:\n");
    contents.push_str("  kind: equity\n");
    contents.push_str("  valuation:\n");
    contents.push_str("    pre_money: 8000000\n");
    contents.push_str("# Uncomment to top the ESOP pool back up with the round (pre-money):\n");
    contents.push_str("# esop_target_pct: 10\n");
    contents
}
