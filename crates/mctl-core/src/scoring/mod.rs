//! Evidence tiers and settlement scoring.
//!
//! A fixed table maps event types to an integer credibility tier, increasing
//! with financial maturity: payment events rank lowest, settlement
//! confirmation highest, unknown event types get tier 0. The settlement
//! score is a linear scaling of the tier. Both are pure projections over the
//! latest-per-mission read model — no persisted state.
//!
//! The tier values and multiplier are configuration, not protocol, but
//! existing consumers depend on the score's numeric range: changing either
//! breaks compatibility.

use serde::Serialize;

use crate::ledger::StoredEnvelope;

/// Fixed mapping from event type to evidence tier.
pub const EVIDENCE_TIERS: &[(&str, u8)] = &[
    ("PAYMENT_SUCCEEDED", 1),
    ("PAYMENT_VERIFIED", 1),
    ("ORDER_TAGGED", 2),
    ("DELIVERY_DISPATCHED", 3),
    ("PROOF_MINTED", 3),
    ("SETTLEMENT_CONFIRMED", 4),
];

/// Score points per tier; tier 4 scores the ceiling of 100.
pub const SCORE_PER_TIER: u32 = 25;

/// Returns the evidence tier for an event type, 0 when unknown.
#[must_use]
pub fn tier_for(event_type: &str) -> u8 {
    EVIDENCE_TIERS
        .iter()
        .find(|(name, _)| *name == event_type)
        .map_or(0, |(_, tier)| *tier)
}

/// Returns the settlement score for a tier.
#[must_use]
pub const fn score_for(tier: u8) -> u32 {
    SCORE_PER_TIER * tier as u32
}

/// A latest-mission row annotated with its evidence tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TieredEnvelope {
    /// The underlying latest-per-mission row.
    #[serde(flatten)]
    pub envelope: StoredEnvelope,

    /// Evidence tier of the row's event type.
    pub tier: u8,
}

/// A latest-mission row annotated with tier and settlement score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredEnvelope {
    /// The underlying latest-per-mission row.
    #[serde(flatten)]
    pub envelope: StoredEnvelope,

    /// Evidence tier of the row's event type.
    pub tier: u8,

    /// `tier * 25`.
    pub score: u32,
}

/// Decorates latest-per-mission rows with their evidence tier.
#[must_use]
pub fn proof_matrix(rows: Vec<StoredEnvelope>) -> Vec<TieredEnvelope> {
    rows.into_iter()
        .map(|envelope| {
            let tier = tier_for(&envelope.event_type);
            TieredEnvelope { envelope, tier }
        })
        .collect()
}

/// Decorates latest-per-mission rows with tier and settlement score.
#[must_use]
pub fn settlement_score(rows: Vec<StoredEnvelope>) -> Vec<ScoredEnvelope> {
    rows.into_iter()
        .map(|envelope| {
            let tier = tier_for(&envelope.event_type);
            ScoredEnvelope {
                envelope,
                tier,
                score: score_for(tier),
            }
        })
        .collect()
}
