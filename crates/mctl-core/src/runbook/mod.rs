//! Operator runbook lookup.
//!
//! A static mapping from failure reason codes to a title and an ordered list
//! of remediation steps. Pure lookup with no ledger interaction; an unknown
//! code reports the full set of known codes rather than failing.

use serde::Serialize;

/// One remediation runbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Runbook {
    /// Stable reason code.
    pub reason_code: &'static str,

    /// Human-readable title.
    pub title: &'static str,

    /// Ordered remediation steps.
    pub steps: &'static [&'static str],
}

/// All known runbooks.
pub const RUNBOOKS: &[Runbook] = &[
    Runbook {
        reason_code: "webhook_invalid",
        title: "Webhook signature invalid",
        steps: &[
            "Confirm the webhook secret matches the provider settings.",
            "Rotate the webhook secret and update Secret Manager / env var.",
            "Replay the webhook event from the provider dashboard.",
        ],
    },
    Runbook {
        reason_code: "auth_failed",
        title: "Authorization failed",
        steps: &[
            "Confirm API token scopes (Shopify Admin, MoR provider).",
            "Rotate the token and redeploy the service.",
            "Verify env vars are present at runtime (not local-only).",
        ],
    },
    Runbook {
        reason_code: "tag_failed",
        title: "Shopify tagging failed",
        steps: &[
            "Check SHOPIFY_ADMIN_TOKEN scopes: write_orders/read_orders.",
            "Confirm SHOPIFY_STORE_URL is correct (myshop.myshopify.com).",
            "Retry tagging with exponential backoff; emit a FAILURE envelope on the final try.",
        ],
    },
    Runbook {
        reason_code: "delivery_failed",
        title: "Delivery dispatch failed",
        steps: &[
            "Verify the delivery asset exists and its URL is reachable.",
            "Check storage permissions (GCS signed URL or public object).",
            "Re-dispatch the delivery and emit DELIVERY_DISPATCHED once confirmed.",
        ],
    },
    Runbook {
        reason_code: "payout_pending",
        title: "Settlement pending",
        steps: &[
            "Record the expected payout date in meta.payout_expected_at.",
            "Run the daily payout scan job.",
            "Emit SETTLEMENT_CONFIRMED once the payout reference is observed.",
        ],
    },
];

/// Result of a runbook lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunbookLookup {
    /// The reason code is known.
    Found(&'static Runbook),

    /// The reason code is unknown; carries every known code.
    Unknown {
        /// All known reason codes, in table order.
        known_codes: Vec<&'static str>,
    },
}

/// Looks up a runbook by reason code.
#[must_use]
pub fn lookup(reason_code: &str) -> RunbookLookup {
    RUNBOOKS
        .iter()
        .find(|rb| rb.reason_code == reason_code)
        .map_or_else(
            || RunbookLookup::Unknown {
                known_codes: known_codes(),
            },
            RunbookLookup::Found,
        )
}

/// All known reason codes, in table order.
#[must_use]
pub fn known_codes() -> Vec<&'static str> {
    RUNBOOKS.iter().map(|rb| rb.reason_code).collect()
}
