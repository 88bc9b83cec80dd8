//! # Status projection
//!
//! Pure functions that turn stored timestamps, tallies and the current
//! ledger time into [`PhaseStatus`] / [`ProjectStatus`]. Every entry point that
//! depends on a phase's resolution goes through [`resolve_phase`], and the
//! read accessors return exactly what it computes, so the authoritative
//! resolution and the displayed status cannot drift apart.
//!
//! Windows are closed-open: a round is active while `now < end_time`.

use crate::types::{PhaseStatus, ProjectStatus, Round};

/// Timing and in-favour weight of one round, detached from storage.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RoundView {
    pub end_time: u64,
    pub in_favor: i128,
}

/// Everything [`resolve_phase`] needs about a phase.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PhaseView {
    pub proposal: RoundView,
    pub rework_deadline: u64,
    pub rework: Option<RoundView>,
}

/// Round currently accepting ballots, if any.
///
/// Depends only on timestamps, so callers can decide whether voting is open
/// without resolving delegations.
pub fn active_round(proposal_end: u64, rework_end: Option<u64>, now: u64) -> Option<Round> {
    if now < proposal_end {
        return Some(Round::Proposal);
    }
    match rework_end {
        Some(end) if now < end => Some(Round::Rework),
        _ => None,
    }
}

/// Resolve a phase against `threshold` at time `now`.
pub fn resolve_phase(view: &PhaseView, threshold: i128, now: u64) -> PhaseStatus {
    match active_round(
        view.proposal.end_time,
        view.rework.map(|r| r.end_time),
        now,
    ) {
        Some(Round::Proposal) => return PhaseStatus::Open,
        Some(Round::Rework) => return PhaseStatus::ReworkOpen,
        None => {}
    }

    if view.proposal.in_favor >= threshold {
        return PhaseStatus::Passed;
    }

    match view.rework {
        None if now < view.rework_deadline => PhaseStatus::AwaitingRework,
        None => PhaseStatus::Terminated,
        Some(rework) if rework.in_favor >= threshold => PhaseStatus::Passed,
        Some(_) => PhaseStatus::Terminated,
    }
}

/// Project-level status from its funding outcome and latest phase.
pub fn resolve_project(
    end_time: u64,
    goal: i128,
    current_amount: i128,
    latest_phase: Option<PhaseStatus>,
    now: u64,
) -> ProjectStatus {
    if now < end_time {
        return ProjectStatus::Funding;
    }
    match latest_phase {
        None if current_amount < goal => ProjectStatus::Terminated,
        None => ProjectStatus::WaitingForInitiation,
        Some(PhaseStatus::Terminated) => ProjectStatus::Terminated,
        Some(PhaseStatus::Passed) if current_amount == 0 => ProjectStatus::Completed,
        Some(_) => ProjectStatus::Developing,
    }
}

/// `ceil(total_ever_funded * threshold_bps / 10_000)`, or `None` on overflow.
pub fn threshold_for(total_ever_funded: i128, threshold_bps: u32) -> Option<i128> {
    let scaled = total_ever_funded.checked_mul(threshold_bps as i128)?;
    Some(scaled.checked_add(9_999)? / 10_000)
}
