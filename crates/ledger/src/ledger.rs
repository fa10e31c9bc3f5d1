//! The ticket state machine and idempotency authority.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use vol_desk_core::config::GateLimits;
use vol_desk_core::errors::EngineError;
use vol_desk_core::portfolio::PortfolioState;
use vol_desk_core::signal::RegimeSnapshot;
use vol_desk_core::ticket::{AuditAction, AuditEntry, TicketState, TradeTicket};
use vol_desk_risk::gates::{evaluate_regime_gate, evaluate_risk_gate};

/// Result of a transition request.
#[derive(Debug, Clone)]
pub enum LedgerOutcome {
    /// The transition committed now.
    Committed(TradeTicket),
    /// The ticket was already terminal; this is the prior resolution,
    /// returned unchanged so retries converge.
    AlreadyResolved(TradeTicket),
}

impl LedgerOutcome {
    #[must_use]
    pub fn ticket(&self) -> &TradeTicket {
        match self {
            Self::Committed(t) | Self::AlreadyResolved(t) => t,
        }
    }

    #[must_use]
    pub const fn committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }
}

#[derive(Default)]
struct LedgerState {
    tickets: HashMap<Uuid, TradeTicket>,
    by_hash: HashMap<String, Uuid>,
    audit: Vec<AuditEntry>,
}

/// Owned ticket store with single-writer discipline.
///
/// All transitions run under one mutex; gate re-evaluation inside the
/// critical section is pure CPU work over caller-supplied state; any
/// market-data refresh happens before entry. Tickets are retained
/// indefinitely; the audit log is append-only.
pub struct TicketLedger {
    limits: GateLimits,
    inner: Mutex<LedgerState>,
}

impl TicketLedger {
    #[must_use]
    pub fn new(limits: GateLimits) -> Self {
        Self {
            limits,
            inner: Mutex::new(LedgerState::default()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        // Poisoning means a prior transition panicked mid-commit; the store
        // can no longer guarantee audit consistency.
        self.inner.lock().expect("ticket ledger lock poisoned")
    }

    /// Inserts a `Proposed` ticket, or returns the existing non-terminal
    /// ticket with the same content hash unchanged (idempotent propose).
    pub fn propose(&self, ticket: TradeTicket) -> TradeTicket {
        let mut state = self.lock();

        if let Some(existing_id) = state.by_hash.get(&ticket.hash) {
            if let Some(existing) = state.tickets.get(existing_id) {
                if !existing.state.is_terminal() {
                    debug!(
                        ticket_id = %existing.id,
                        hash = %existing.hash,
                        "duplicate propose deduplicated"
                    );
                    return existing.clone();
                }
            }
        }

        info!(
            ticket_id = %ticket.id,
            underlying = %ticket.underlying,
            strategy = %ticket.strategy,
            "ticket proposed"
        );
        state.by_hash.insert(ticket.hash.clone(), ticket.id);
        state.tickets.insert(ticket.id, ticket.clone());
        ticket
    }

    /// Approves a proposed ticket after re-checking both gates against the
    /// supplied *current* regime and portfolio state.
    ///
    /// # Errors
    /// - `NotFound` for an unknown id.
    /// - `GateBlocked` when either gate fails now; the ticket stays
    ///   `Proposed` and may still be rejected explicitly.
    pub fn approve(
        &self,
        ticket_id: Uuid,
        actor: &str,
        snapshot: &RegimeSnapshot,
        portfolio: &PortfolioState,
    ) -> Result<LedgerOutcome, EngineError> {
        let mut state = self.lock();

        let Some(existing) = state.tickets.get(&ticket_id) else {
            return Err(EngineError::NotFound(ticket_id));
        };
        if existing.state.is_terminal() {
            debug!(ticket_id = %ticket_id, state = ?existing.state, "approve on resolved ticket");
            return Ok(LedgerOutcome::AlreadyResolved(existing.clone()));
        }

        let regime_gate = evaluate_regime_gate(existing.strategy, snapshot);
        let risk_gate = evaluate_risk_gate(
            &existing.underlying,
            &existing.legs,
            existing.max_loss,
            portfolio,
            &self.limits,
        );
        if !regime_gate.passed || !risk_gate.passed {
            let mut reasons = regime_gate.reasons;
            reasons.extend(risk_gate.reasons);
            warn!(ticket_id = %ticket_id, reasons = ?reasons, "approval blocked");
            return Err(EngineError::GateBlocked { reasons });
        }

        let entry = AuditEntry {
            ticket_id,
            ticket_hash: existing.hash.clone(),
            action: AuditAction::Approved,
            reason: None,
            timestamp: Utc::now(),
            actor: actor.to_string(),
        };

        if let Some(ticket) = state.tickets.get_mut(&ticket_id) {
            ticket.state = TicketState::Approved;
            // retain the approval-time gate evaluations on the ticket
            ticket.regime_gate = regime_gate;
            ticket.risk_gate = risk_gate;
            let committed = ticket.clone();
            state.audit.push(entry);
            info!(ticket_id = %ticket_id, actor, "ticket approved");
            Ok(LedgerOutcome::Committed(committed))
        } else {
            Err(EngineError::NotFound(ticket_id))
        }
    }

    /// Rejects a proposed ticket, recording the reason verbatim. Always
    /// permitted regardless of gate outcome; idempotent like `approve`.
    ///
    /// # Errors
    /// `NotFound` for an unknown id.
    pub fn reject(
        &self,
        ticket_id: Uuid,
        reason: &str,
        actor: &str,
    ) -> Result<LedgerOutcome, EngineError> {
        let mut state = self.lock();

        let Some(existing) = state.tickets.get(&ticket_id) else {
            return Err(EngineError::NotFound(ticket_id));
        };
        if existing.state.is_terminal() {
            debug!(ticket_id = %ticket_id, state = ?existing.state, "reject on resolved ticket");
            return Ok(LedgerOutcome::AlreadyResolved(existing.clone()));
        }

        let entry = AuditEntry {
            ticket_id,
            ticket_hash: existing.hash.clone(),
            action: AuditAction::Rejected,
            reason: Some(reason.to_string()),
            timestamp: Utc::now(),
            actor: actor.to_string(),
        };

        if let Some(ticket) = state.tickets.get_mut(&ticket_id) {
            ticket.state = TicketState::Rejected;
            let committed = ticket.clone();
            state.audit.push(entry);
            info!(ticket_id = %ticket_id, actor, reason, "ticket rejected");
            Ok(LedgerOutcome::Committed(committed))
        } else {
            Err(EngineError::NotFound(ticket_id))
        }
    }

    /// Fetches a ticket by id.
    #[must_use]
    pub fn get(&self, ticket_id: Uuid) -> Option<TradeTicket> {
        self.lock().tickets.get(&ticket_id).cloned()
    }

    /// All tickets still in `Proposed` state, newest first.
    #[must_use]
    pub fn pending(&self) -> Vec<TradeTicket> {
        let state = self.lock();
        let mut pending: Vec<TradeTicket> = state
            .tickets
            .values()
            .filter(|t| t.state == TicketState::Proposed)
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        pending
    }

    /// The full audit trail in chronological order.
    #[must_use]
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        let state = self.lock();
        let mut entries = state.audit.clone();
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        entries
    }
}
