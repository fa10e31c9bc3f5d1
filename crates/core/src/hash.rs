//! Canonical ticket hashing for idempotent deduplication.
//!
//! The hash is a deterministic function of the ticket's economic content
//! only: underlying, strategy label, legs sorted by strike then side then
//! option type, expiry, and the premium rounded to 2 decimals. Timestamps,
//! ids and scores never enter the digest, so two economically identical
//! proposals always collide.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::ticket::{Leg, StrategyKind};

/// Computes the canonical content hash of a ticket's economic fields.
#[must_use]
pub fn ticket_hash(
    underlying: &str,
    strategy: StrategyKind,
    legs: &[Leg],
    expiry: NaiveDate,
    credit_or_debit: Decimal,
) -> String {
    let mut sorted: Vec<&Leg> = legs.iter().collect();
    sorted.sort_by(|a, b| {
        a.strike
            .cmp(&b.strike)
            .then(a.side.cmp(&b.side))
            .then(a.option_type.cmp(&b.option_type))
    });

    let mut payload = format!("{underlying}|{}|{expiry}", strategy.label());
    for leg in sorted {
        // normalize() strips trailing zeros so 475 and 475.00 render identically
        payload.push_str(&format!(
            "|{}:{}:{}x{}",
            leg.side.label(),
            leg.option_type.label(),
            leg.strike.normalize(),
            leg.quantity
        ));
    }
    payload.push_str(&format!("|{}", credit_or_debit.round_dp(2).normalize()));

    let digest = Sha256::digest(payload.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
