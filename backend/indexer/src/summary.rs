//! Per-project ledger facts folded from indexed events.
//!
//! The summary only adds up what happened on chain. Project and phase status
//! depend on the ledger clock and vote resolution, so clients must ask the
//! contract (`project_status` / `phase_status`) for those.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, EventRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub creator: Option<String>,
    pub goal: Option<String>,
    pub funding_end: Option<i64>,
    /// Token amounts are `i128` on chain and travel as decimal strings.
    pub total_funded: String,
    pub total_reduced: String,
    pub funders: usize,
    pub phases_proposed: usize,
    pub reworks: usize,
    pub ballots: usize,
    pub claimed_total: String,
    pub refunded_total: String,
    /// What the contract should still hold for this project.
    pub held: String,
    pub last_ledger: i64,
}

#[derive(Default)]
struct Totals {
    funded: i128,
    reduced: i128,
    claimed: i128,
    refunded: i128,
}

impl Totals {
    fn held(&self) -> Option<i128> {
        self.funded
            .checked_sub(self.reduced)?
            .checked_sub(self.claimed)?
            .checked_sub(self.refunded)
    }
}

fn parse_amount(record: &EventRecord) -> Result<i128> {
    let raw = record.amount.as_deref().unwrap_or_default();
    raw.parse().map_err(|_| IndexerError::Amount {
        event_id: record.id,
        raw: raw.to_string(),
    })
}

fn add(project_id: &str, total: i128, amount: i128) -> Result<i128> {
    total.checked_add(amount).ok_or_else(|| IndexerError::Inconsistent {
        project_id: project_id.to_string(),
        reason: "amount total overflowed".to_string(),
    })
}

/// Fold a project's events, in ledger order, into a [`ProjectSummary`].
pub fn summarize(project_id: &str, events: &[EventRecord]) -> Result<ProjectSummary> {
    let mut totals = Totals::default();
    let mut creator = None;
    let mut goal = None;
    let mut funding_end = None;
    let mut funders = BTreeSet::new();
    let mut phases = BTreeSet::new();
    let mut reworks = BTreeSet::new();
    let mut ballots = 0usize;
    let mut last_ledger = 0i64;

    for record in events {
        last_ledger = last_ledger.max(record.ledger);
        match record.kind() {
            EventKind::ProjectCreated => {
                creator = record.actor.clone();
                goal = record.amount.clone();
                funding_end = record.end_time;
            }
            EventKind::ProjectFunded => {
                totals.funded = add(project_id, totals.funded, parse_amount(record)?)?;
                if let Some(actor) = &record.actor {
                    funders.insert(actor.clone());
                }
            }
            EventKind::FundingReduced => {
                totals.reduced = add(project_id, totals.reduced, parse_amount(record)?)?;
            }
            EventKind::PhaseProposed => {
                phases.insert(record.phase_id);
            }
            EventKind::PhaseReworked => {
                reworks.insert(record.phase_id);
            }
            EventKind::VoteCast | EventKind::VoteDelegated => ballots += 1,
            EventKind::FundsClaimed => {
                totals.claimed = add(project_id, totals.claimed, parse_amount(record)?)?;
            }
            kind if kind.is_refund() => {
                totals.refunded = add(project_id, totals.refunded, parse_amount(record)?)?;
            }
            _ => {}
        }
    }

    let held = totals
        .held()
        .filter(|held| *held >= 0)
        .ok_or_else(|| IndexerError::Inconsistent {
            project_id: project_id.to_string(),
            reason: "paid out more than it received".to_string(),
        })?;

    Ok(ProjectSummary {
        project_id: project_id.to_string(),
        creator,
        goal,
        funding_end,
        total_funded: totals.funded.to_string(),
        total_reduced: totals.reduced.to_string(),
        funders: funders.len(),
        phases_proposed: phases.len(),
        reworks: reworks.len(),
        ballots,
        claimed_total: totals.claimed.to_string(),
        refunded_total: totals.refunded.to_string(),
        held: held.to_string(),
        last_ledger,
    })
}
