//! Data model for cap tables, stakeholders, financing instruments, and the
//! computed pre/post-round comparison.
//!
//! All currency and percentage values use [`rust_decimal::Decimal`] so that
//! repeated recomputation does not accumulate floating-point drift. Share
//! counts are plain integers.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Categorical tag for a stakeholder. Drives display color only; the engine
/// never branches on it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StakeholderType {
    Founder,
    Employee,
    Investor,
    /// Named holder of already-granted options out of the ESOP pool.
    Esop,
    Other,
}

impl StakeholderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StakeholderType::Founder => "founder",
            StakeholderType::Employee => "employee",
            StakeholderType::Investor => "investor",
            StakeholderType::Esop => "esop",
            StakeholderType::Other => "other",
        }
    }
}

/// A single entry on the cap table.
///
/// `ownership` is derived: the engine recomputes it on every snapshot and
/// callers should treat it as read-only output, not durable input.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stakeholder {
    /// Unique identifier within one cap table.
    pub id: String,
    /// Display label (e.g., "Founder A", "Seed Fund I").
    pub name: String,
    #[serde(rename = "type")]
    pub stakeholder_type: StakeholderType,
    /// Units held pre-round. Never changed by a round; only denominators grow.
    pub shares: u64,
    /// Derived percentage of the selected denominator.
    #[serde(default)]
    pub ownership: Decimal,
    /// Whether the holding counts toward the outstanding (non-fully-diluted) view.
    #[serde(default = "default_outstanding")]
    pub is_outstanding: bool,
}

fn default_outstanding() -> bool {
    true
}

impl Stakeholder {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        stakeholder_type: StakeholderType,
        shares: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            stakeholder_type,
            shares,
            ownership: Decimal::ZERO,
            is_outstanding: true,
        }
    }

    /// Builder-style helper for non-outstanding holdings (e.g., unexercised warrants).
    pub fn non_outstanding(mut self) -> Self {
        self.is_outstanding = false;
        self
    }
}

/// Pre-round capitalization state: who holds what, plus the unissued ESOP pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CapTable {
    /// Human-friendly name (typically the company name).
    pub name: String,
    pub stakeholders: Vec<Stakeholder>,
    /// Unissued option pool as a percentage of the fully diluted total.
    #[serde(default)]
    pub esop_pool_pct: Decimal,
    /// Portion of the pool already granted to named stakeholders. Display only;
    /// granted options appear as `esop`-typed stakeholder rows.
    #[serde(default)]
    pub esop_allocated_pct: Decimal,
}

impl CapTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stakeholders: Vec::new(),
            esop_pool_pct: Decimal::ZERO,
            esop_allocated_pct: Decimal::ZERO,
        }
    }

    /// Builder-style helper to add a stakeholder while constructing a table.
    pub fn with_stakeholder(mut self, stakeholder: Stakeholder) -> Self {
        self.stakeholders.push(stakeholder);
        self
    }

    /// Builder-style helper to set the unissued ESOP pool percentage.
    pub fn with_esop_pool(mut self, pct: Decimal) -> Self {
        self.esop_pool_pct = pct;
        self
    }

    /// Sum of all issued units across stakeholders.
    pub fn issued_shares(&self) -> u64 {
        self.stakeholders.iter().map(|s| s.shares).sum()
    }

    /// Issued shares grossed up by the unissued ESOP pool, as a decimal so the
    /// pool does not have to land on a whole unit.
    ///
    /// With pool `p` (percent of fully diluted), the total satisfies
    /// `pool_shares / total == p / 100`, i.e. `total = issued * 100 / (100 - p)`.
    pub fn fully_diluted_shares(&self) -> Decimal {
        gross_up(Decimal::from(self.issued_shares()), self.esop_pool_pct)
    }

    /// Parse a cap table from JSON text. Pure string-to-value; file handling
    /// stays with the caller.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Gross `issued` up so that `pool_pct` percent of the result is unissued pool.
///
/// A zero pool (or zero issued base) passes through unchanged.
pub(crate) fn gross_up(issued: Decimal, pool_pct: Decimal) -> Decimal {
    if pool_pct.is_zero() || issued.is_zero() {
        issued
    } else {
        issued * dec!(100) / (dec!(100) - pool_pct)
    }
}

/// The authoritative valuation input for a priced round. Exactly one of the
/// two is given; the other is derived from the amount raised.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Valuation {
    PreMoney(Decimal),
    PostMoney(Decimal),
}

/// Financing instrument for a round.
///
/// A tagged union rather than a string so an unrecognized instrument is
/// rejected at the parse boundary and can never reach the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Instrument {
    /// Priced equity round; dilutes the cap table immediately.
    Equity { valuation: Valuation },
    /// SAFE; converts at the next priced round, no immediate dilution.
    Safe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        valuation_cap: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discount_pct: Option<Decimal>,
    },
    /// Convertible note; converts at the next priced round, no immediate dilution.
    ConvertibleNote {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        valuation_cap: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discount_pct: Option<Decimal>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        interest_rate_pct: Option<Decimal>,
    },
}

impl Instrument {
    /// Whether this instrument prices and dilutes the cap table immediately.
    pub fn is_priced(&self) -> bool {
        matches!(self, Instrument::Equity { .. })
    }

    /// Stable wire tag, matching the serde representation.
    pub fn tag(&self) -> &'static str {
        match self {
            Instrument::Equity { .. } => "equity",
            Instrument::Safe { .. } => "safe",
            Instrument::ConvertibleNote { .. } => "convertible_note",
        }
    }
}

/// Terms of a proposed financing round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundTerms {
    /// Display label for the round (e.g., "Seed", "Series A").
    pub round_name: String,
    /// Display label for the incoming investor.
    pub investor_name: String,
    /// Cash coming in. Must be positive.
    pub amount_raised: Decimal,
    pub instrument: Instrument,
    /// Optional ESOP top-up: target unissued pool percentage of the
    /// post-round fully diluted total. Applied pre-money, so the expansion
    /// dilutes existing holders and not the incoming investor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub esop_target_pct: Option<Decimal>,
}

impl RoundTerms {
    pub fn priced(
        round_name: impl Into<String>,
        investor_name: impl Into<String>,
        amount_raised: Decimal,
        valuation: Valuation,
    ) -> Self {
        Self {
            round_name: round_name.into(),
            investor_name: investor_name.into(),
            amount_raised,
            instrument: Instrument::Equity { valuation },
            esop_target_pct: None,
        }
    }

    /// Builder-style helper to request an ESOP pool top-up with the round.
    pub fn with_esop_target(mut self, target_pct: Decimal) -> Self {
        self.esop_target_pct = Some(target_pct);
        self
    }

    /// Parse round terms from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// One ownership snapshot: stakeholders with derived percentages plus the
/// unissued pool, against a fully diluted denominator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub stakeholders: Vec<Stakeholder>,
    pub esop_pool_pct: Decimal,
    pub fully_diluted_shares: Decimal,
}

/// Post-round snapshot: the ownership table after the round, plus the round
/// economics that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostRoundSnapshot {
    pub stakeholders: Vec<Stakeholder>,
    pub esop_pool_pct: Decimal,
    pub fully_diluted_shares: Decimal,
    pub instrument: Instrument,
    /// Post-money valuation. `None` for instruments that defer pricing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_money: Option<Decimal>,
    /// Incoming investor's percentage of the post-round total. `None` for
    /// instruments that defer pricing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_investor_ownership_pct: Option<Decimal>,
    /// Price per share set by the round. `None` for instruments that defer pricing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_share: Option<Decimal>,
    /// True for SAFE / convertible-note rounds: the instrument sits outside
    /// the table until the next priced round.
    pub converts_at_next_round: bool,
}

/// Immutable output of one round computation: the pre/post comparison and the
/// per-stakeholder ownership deltas.
///
/// Created fresh on every call and never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DilutionResult {
    pub pre_round: Snapshot,
    pub post_round: PostRoundSnapshot,
    /// `pre ownership - post ownership` per pre-round stakeholder id.
    /// Non-negative under a priced round.
    pub dilution_pct: BTreeMap<String, Decimal>,
}
