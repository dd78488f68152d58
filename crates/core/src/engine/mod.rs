//! The dilution engine: pure, deterministic transformation from a pre-round
//! cap table plus round terms to a post-round ownership comparison.
//!
//! No side effects and no I/O. Invalid inputs fail fast with a descriptive
//! [`EngineError`] rather than producing a partially-computed result, and the
//! engine re-checks its own output (ownership conservation, non-negative
//! dilution deltas) before handing it back: silently wrong cap-table math is
//! worse than a visible error.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

use crate::model::{
    gross_up, CapTable, DilutionResult, Instrument, PostRoundSnapshot, RoundTerms, Snapshot,
    Stakeholder, StakeholderType, Valuation,
};

const HUNDRED: Decimal = dec!(100);

/// Tolerance for the ownership conservation check (percentage points).
const CONSERVATION_TOLERANCE: Decimal = dec!(0.000001);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("amount raised must be positive, got {0}")]
    AmountNotPositive(Decimal),
    #[error("valuation must be positive, got {0}")]
    ValuationNotPositive(Decimal),
    #[error("post-money valuation {post_money} must exceed the amount raised {amount}")]
    ValuationBelowAmount { post_money: Decimal, amount: Decimal },
    #[error("ESOP pool percentage must be in [0, 100), got {0}")]
    EsopPoolOutOfRange(Decimal),
    #[error("ESOP target percentage must be in [0, 100), got {0}")]
    EsopTargetOutOfRange(Decimal),
    #[error(
        "ESOP target of {target_pct}% is not attainable with a pre-money top-up \
         (maximum {max_pct}% at these terms)"
    )]
    EsopTargetUnattainable { target_pct: Decimal, max_pct: Decimal },
    #[error("duplicate stakeholder id: {0}")]
    DuplicateStakeholder(String),
    #[error("cannot price a round against a cap table with no issued shares")]
    EmptyCapTable,
    #[error("cap table invariant violated: {detail}")]
    InvariantViolation { detail: String },
}

/// Recompute per-stakeholder ownership percentages against a chosen denominator.
///
/// `fully_diluted` selects the fully diluted denominator (`total_shares`
/// grossed up by the unissued ESOP pool) versus the outstanding denominator
/// (sum of shares held by `is_outstanding` stakeholders only; holders outside
/// that view show 0%).
///
/// A zero denominator yields all-zero ownership, never a division error.
/// Input is not mutated; a fresh list is returned.
pub fn calculate_ownership(
    stakeholders: &[Stakeholder],
    total_shares: u64,
    fully_diluted: bool,
    esop_pool_pct: Decimal,
) -> Result<Vec<Stakeholder>, EngineError> {
    if esop_pool_pct < Decimal::ZERO || esop_pool_pct >= HUNDRED {
        return Err(EngineError::EsopPoolOutOfRange(esop_pool_pct));
    }

    let denominator = if fully_diluted {
        gross_up(Decimal::from(total_shares), esop_pool_pct)
    } else {
        let outstanding: u64 =
            stakeholders.iter().filter(|s| s.is_outstanding).map(|s| s.shares).sum();
        Decimal::from(outstanding)
    };

    Ok(stakeholders
        .iter()
        .map(|s| {
            let counted = fully_diluted || s.is_outstanding;
            let ownership = if denominator.is_zero() || !counted {
                Decimal::ZERO
            } else {
                Decimal::from(s.shares) / denominator * HUNDRED
            };
            Stakeholder { ownership, ..s.clone() }
        })
        .collect())
}

/// Compute the effect of a proposed round on a cap table.
///
/// For a priced equity round this produces the full post-round table with the
/// incoming investor appended; for SAFE / convertible-note rounds the table is
/// mirrored unchanged and flagged as converting at the next priced round. See
/// [`EngineError`] for the failure modes.
pub fn compute_round(
    cap_table: &CapTable,
    terms: &RoundTerms,
) -> Result<DilutionResult, EngineError> {
    validate_cap_table(cap_table)?;
    if terms.amount_raised <= Decimal::ZERO {
        return Err(EngineError::AmountNotPositive(terms.amount_raised));
    }

    let pre_stakeholders = calculate_ownership(
        &cap_table.stakeholders,
        cap_table.issued_shares(),
        true,
        cap_table.esop_pool_pct,
    )?;
    let pre_round = Snapshot {
        stakeholders: pre_stakeholders,
        esop_pool_pct: cap_table.esop_pool_pct,
        fully_diluted_shares: cap_table.fully_diluted_shares(),
    };
    if !pre_round.fully_diluted_shares.is_zero() {
        check_conservation(&pre_round.stakeholders, pre_round.esop_pool_pct, "pre-round")?;
    }

    match terms.instrument {
        Instrument::Equity { valuation } => priced_round(cap_table, terms, valuation, pre_round),
        Instrument::Safe { .. } | Instrument::ConvertibleNote { .. } => {
            Ok(deferred_round(terms, pre_round))
        }
    }
}

/// A priced equity round: set the share price, issue shares to the incoming
/// investor, grow the denominator for everyone else.
fn priced_round(
    cap_table: &CapTable,
    terms: &RoundTerms,
    valuation: Valuation,
    pre_round: Snapshot,
) -> Result<DilutionResult, EngineError> {
    let amount = terms.amount_raised;
    let (pre_money, post_money) = match valuation {
        Valuation::PreMoney(p) => {
            if p <= Decimal::ZERO {
                return Err(EngineError::ValuationNotPositive(p));
            }
            (p, p + amount)
        }
        Valuation::PostMoney(p) => {
            if p <= Decimal::ZERO {
                return Err(EngineError::ValuationNotPositive(p));
            }
            if p <= amount {
                return Err(EngineError::ValuationBelowAmount { post_money: p, amount });
            }
            (p - amount, p)
        }
    };

    if cap_table.issued_shares() == 0 {
        return Err(EngineError::EmptyCapTable);
    }

    // Pre-round fully diluted base, split into issued shares and unissued pool.
    let base = pre_round.fully_diluted_shares;
    let existing_pool = base - Decimal::from(cap_table.issued_shares());

    // ESOP top-up shares are added to the pre-money share count before
    // pricing: the expansion dilutes existing holders, never the incoming
    // investor. This ordering is the intended policy, not an accident.
    let added_pool = match terms.esop_target_pct {
        Some(target) => esop_top_up_shares(target, base, existing_pool, pre_money, post_money)?,
        None => Decimal::ZERO,
    };

    let priced_base = base + added_pool;
    let price_per_share = pre_money / priced_base;
    let new_shares = amount / price_per_share;
    let total = priced_base + new_shares;

    // Existing holders keep their share counts; only the denominator grows.
    let mut post_stakeholders: Vec<Stakeholder> = pre_round
        .stakeholders
        .iter()
        .map(|s| {
            Stakeholder { ownership: Decimal::from(s.shares) / total * HUNDRED, ..s.clone() }
        })
        .collect();

    let mut dilution_pct = BTreeMap::new();
    for (pre, post) in pre_round.stakeholders.iter().zip(post_stakeholders.iter()) {
        let delta = pre.ownership - post.ownership;
        if delta < -CONSERVATION_TOLERANCE {
            return Err(EngineError::InvariantViolation {
                detail: format!("negative dilution delta {delta} for stakeholder {}", pre.id),
            });
        }
        dilution_pct.insert(pre.id.clone(), delta);
    }

    post_stakeholders.push(Stakeholder {
        id: unique_investor_id(&pre_round.stakeholders, &terms.investor_name),
        name: terms.investor_name.clone(),
        stakeholder_type: StakeholderType::Investor,
        shares: new_shares.round().to_u64().unwrap_or(0),
        ownership: new_shares / total * HUNDRED,
        is_outstanding: true,
    });

    let esop_pool_pct = (existing_pool + added_pool) / total * HUNDRED;
    check_conservation(&post_stakeholders, esop_pool_pct, "post-round")?;

    Ok(DilutionResult {
        pre_round,
        post_round: PostRoundSnapshot {
            stakeholders: post_stakeholders,
            esop_pool_pct,
            fully_diluted_shares: total,
            instrument: terms.instrument.clone(),
            post_money: Some(post_money),
            new_investor_ownership_pct: Some(amount / post_money * HUNDRED),
            price_per_share: Some(price_per_share),
            converts_at_next_round: false,
        },
        dilution_pct,
    })
}

/// SAFE / convertible-note round: no immediate dilution. The post-round table
/// mirrors the pre-round table exactly and the result is flagged as
/// converting at the next priced round.
fn deferred_round(terms: &RoundTerms, pre_round: Snapshot) -> DilutionResult {
    let dilution_pct =
        pre_round.stakeholders.iter().map(|s| (s.id.clone(), Decimal::ZERO)).collect();

    DilutionResult {
        post_round: PostRoundSnapshot {
            stakeholders: pre_round.stakeholders.clone(),
            esop_pool_pct: pre_round.esop_pool_pct,
            fully_diluted_shares: pre_round.fully_diluted_shares,
            instrument: terms.instrument.clone(),
            post_money: None,
            new_investor_ownership_pct: None,
            price_per_share: None,
            converts_at_next_round: true,
        },
        pre_round,
        dilution_pct,
    }
}

/// Solve for the unissued pool shares to add pre-money so that the pool ends
/// at `target_pct` percent of the post-round fully diluted total.
///
/// With base `S`, existing pool `P`, and `k = target * post / pre`, the added
/// shares are `A = (k*S - P) / (1 - k)`. A target already met (or exceeded)
/// by the existing pool is a no-op, never a pool reduction.
fn esop_top_up_shares(
    target_pct: Decimal,
    base: Decimal,
    existing_pool: Decimal,
    pre_money: Decimal,
    post_money: Decimal,
) -> Result<Decimal, EngineError> {
    if target_pct < Decimal::ZERO || target_pct >= HUNDRED {
        return Err(EngineError::EsopTargetOutOfRange(target_pct));
    }
    let k = (target_pct / HUNDRED) * post_money / pre_money;
    if k >= Decimal::ONE {
        // As A grows without bound the post-round pool fraction approaches
        // pre/post; targets at or beyond that cannot be met pre-money.
        return Err(EngineError::EsopTargetUnattainable {
            target_pct,
            max_pct: pre_money / post_money * HUNDRED,
        });
    }
    let added = (k * base - existing_pool) / (Decimal::ONE - k);
    Ok(added.max(Decimal::ZERO))
}

fn validate_cap_table(cap_table: &CapTable) -> Result<(), EngineError> {
    if cap_table.esop_pool_pct < Decimal::ZERO || cap_table.esop_pool_pct >= HUNDRED {
        return Err(EngineError::EsopPoolOutOfRange(cap_table.esop_pool_pct));
    }
    let mut seen = std::collections::HashSet::new();
    for s in &cap_table.stakeholders {
        if !seen.insert(s.id.as_str()) {
            return Err(EngineError::DuplicateStakeholder(s.id.clone()));
        }
    }
    Ok(())
}

/// Defensive post-computation check: ownership plus the unissued pool must
/// sum to 100% within tolerance.
fn check_conservation(
    stakeholders: &[Stakeholder],
    esop_pool_pct: Decimal,
    phase: &str,
) -> Result<(), EngineError> {
    let sum: Decimal =
        stakeholders.iter().map(|s| s.ownership).sum::<Decimal>() + esop_pool_pct;
    if (sum - HUNDRED).abs() > CONSERVATION_TOLERANCE {
        return Err(EngineError::InvariantViolation {
            detail: format!("{phase} ownership sums to {sum}, expected 100"),
        });
    }
    Ok(())
}

/// Derive a unique id for the incoming investor from its display name,
/// avoiding collisions with existing stakeholder ids.
fn unique_investor_id(existing: &[Stakeholder], investor_name: &str) -> String {
    let mut slug = String::new();
    for c in investor_name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let base = slug.trim_matches('-').to_string();
    let base = if base.is_empty() { "new-investor".to_string() } else { base };

    let mut id = base.clone();
    let mut suffix = 2;
    while existing.iter().any(|s| s.id == id) {
        id = format!("{base}-{suffix}");
        suffix += 1;
    }
    id
}
