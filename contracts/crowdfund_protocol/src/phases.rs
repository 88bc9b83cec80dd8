//! # Phase manager
//!
//! Owns the ordered phase sequence of each project: proposing a phase,
//! submitting its single rework, and claiming a passed phase's withdrawal.
//!
//! Resolution is lazy. [`resolve`] feeds the stored timestamps and tallies
//! (delegated weight is already folded in by the voting engine) into
//! [`status::resolve_phase`](crate::status::resolve_phase) on every call that
//! needs it; nothing about a phase's outcome is ever written back.

use soroban_sdk::{Address, Env, String, Vec};

use crate::events;
use crate::registry::pay_out;
use crate::status::{self, PhaseView, RoundView};
use crate::storage::{self, load_phase, load_project_pair, save_phase, save_project_state};
use crate::types::{Phase, PhaseStatus, ProjectConfig, ProjectState, ProposalRound, Tally};
use crate::Error;

/// Resolve `phase` at ledger time `now`.
pub fn resolve(phase: &Phase, threshold: i128, now: u64) -> PhaseStatus {
    let view = PhaseView {
        proposal: RoundView {
            end_time: phase.proposal.end_time,
            in_favor: phase.proposal.votes.in_favor,
        },
        rework_deadline: phase.proposal.rework_deadline,
        rework: phase.rework.as_ref().map(|round| RoundView {
            end_time: round.end_time,
            in_favor: round.votes.in_favor,
        }),
    };
    status::resolve_phase(&view, threshold, now)
}

/// Latest phase together with its resolved status, if any phase exists.
pub fn latest(
    env: &Env,
    project_id: u64,
    state: &ProjectState,
    now: u64,
) -> Result<Option<(Phase, PhaseStatus)>, Error> {
    if state.phase_count == 0 {
        return Ok(None);
    }
    let phase = load_phase(env, project_id, state.phase_count - 1)?;
    let status = resolve(&phase, state.threshold, now);
    Ok(Some((phase, status)))
}

fn require_creator(config: &ProjectConfig, caller: &Address) -> Result<(), Error> {
    if config.creator != *caller {
        return Err(Error::NotCreator);
    }
    Ok(())
}

fn new_round(env: &Env, start_time: u64, end_time: u64, rework_deadline: u64, detail: String) -> ProposalRound {
    ProposalRound {
        start_time,
        end_time,
        rework_deadline,
        reworked: false,
        detail,
        improvements: Vec::new(env),
        votes: Tally::default(),
    }
}

/// Open the next phase with a withdrawal request of `amount`.
///
/// The first call of a project snapshots the threshold from
/// `total_ever_funded`; later refunds never move it.
pub fn propose(
    env: &Env,
    project_id: u64,
    creator: Address,
    amount: i128,
    detail: String,
) -> Result<Phase, Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    let (config, mut state) = load_project_pair(env, project_id)?;
    require_creator(&config, &creator)?;

    let now = env.ledger().timestamp();
    if now < config.end_time {
        return Err(Error::FundingNotEnded);
    }
    if state.phase_count == 0 && state.current_amount < config.goal {
        return Err(Error::GoalNotReached);
    }
    if let Some((previous, status)) = latest(env, project_id, &state, now)? {
        if status != PhaseStatus::Passed {
            return Err(Error::PhaseNotPassed);
        }
        if !previous.claimed {
            return Err(Error::PhaseNotClaimed);
        }
    }
    if amount > state.current_amount {
        return Err(Error::InsufficientFunds);
    }

    let global = storage::get_config(env)?;
    if state.phase_count == 0 {
        state.threshold = status::threshold_for(state.total_ever_funded, global.threshold_bps)
            .ok_or(Error::ArithmeticOverflow)?;
    }

    let end_time = now
        .checked_add(global.voting_period)
        .ok_or(Error::ArithmeticOverflow)?;
    let rework_deadline = end_time
        .checked_add(global.rework_period)
        .ok_or(Error::ArithmeticOverflow)?;

    let phase = Phase {
        id: state.phase_count,
        withdraw_amount: amount,
        proposal: new_round(env, now, end_time, rework_deadline, detail),
        rework: None,
        claimed: false,
    };
    state.phase_count += 1;

    save_phase(env, project_id, &phase);
    save_project_state(env, project_id, &state);

    events::emit_phase_proposed(env, project_id, phase.id, amount, end_time);
    Ok(phase)
}

/// Open the one rework round of a phase whose proposal failed.
///
/// `new_amount` replaces the withdrawal request; `None` keeps it.
pub fn rework(
    env: &Env,
    project_id: u64,
    creator: Address,
    detail: String,
    new_amount: Option<i128>,
) -> Result<Phase, Error> {
    let (config, state) = load_project_pair(env, project_id)?;
    require_creator(&config, &creator)?;

    let now = env.ledger().timestamp();
    let (mut phase, status) = latest(env, project_id, &state, now)?.ok_or(Error::PhaseNotFound)?;
    if status != PhaseStatus::AwaitingRework {
        return Err(Error::ReworkUnavailable);
    }

    if let Some(amount) = new_amount {
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }
        if amount > state.current_amount {
            return Err(Error::InsufficientFunds);
        }
        phase.withdraw_amount = amount;
    }

    let global = storage::get_config(env)?;
    let end_time = now
        .checked_add(global.rework_period)
        .ok_or(Error::ArithmeticOverflow)?;

    phase.proposal.reworked = true;
    phase.rework = Some(new_round(env, now, end_time, end_time, detail));
    save_phase(env, project_id, &phase);

    events::emit_phase_reworked(env, project_id, phase.id, phase.withdraw_amount, end_time);
    Ok(phase)
}

/// Transfer the current phase's withdrawal to the creator and advance
/// `current_phase_index`. Returns the amount paid.
pub fn claim(env: &Env, project_id: u64, creator: Address) -> Result<i128, Error> {
    let (config, mut state) = load_project_pair(env, project_id)?;
    require_creator(&config, &creator)?;

    if state.phase_count == 0 {
        return Err(Error::PhaseNotFound);
    }
    if state.current_phase_index >= state.phase_count {
        return Err(Error::AlreadyClaimed);
    }

    let now = env.ledger().timestamp();
    let mut phase = load_phase(env, project_id, state.current_phase_index)?;
    if phase.claimed {
        return Err(Error::AlreadyClaimed);
    }
    if resolve(&phase, state.threshold, now) != PhaseStatus::Passed {
        return Err(Error::PhaseNotPassed);
    }
    if phase.withdraw_amount > state.current_amount {
        return Err(Error::InsufficientFunds);
    }

    let amount = phase.withdraw_amount;
    phase.claimed = true;
    state.current_amount -= amount;
    state.current_phase_index += 1;

    save_phase(env, project_id, &phase);
    save_project_state(env, project_id, &state);
    pay_out(env, &creator, amount)?;

    events::emit_funds_claimed(env, project_id, phase.id, creator, amount);
    Ok(amount)
}
