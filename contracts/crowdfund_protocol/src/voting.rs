//! # Voting engine
//!
//! Ballots are cast against the latest phase's active round, weighted by the
//! voter's `funded_amount` at the time of the ballot. Each identity gets one
//! immutable [`VoterRecord`] per round.
//!
//! The round's stored [`Tally`](crate::types::Tally) is always complete, so
//! reading it costs one entry however many delegations exist.
//!
//! Weight moves when a delegation is made. The delegator's weight, plus
//! anything already delegated to them, follows the chain to its end. If the
//! end has a direct ballot the weight is tallied there at once; otherwise it is
//! parked as pending weight on that address and tallied when that address
//! votes, or carried further when it delegates in turn. Weight parked on an
//! address that never votes is never counted. Chains are followed through
//! compressed `Link` pointers, and a delegation whose chain leads back to the
//! delegator is refused, so chains stay acyclic.

use soroban_sdk::{Address, Env, String, Vec};

use crate::events::{self, VoteCast, VoteDelegated};
use crate::status::active_round;
use crate::storage::{
    add_pending, load_funder, load_link, load_phase, load_project_state, load_voter, save_link,
    save_phase, save_voter, take_pending,
};
use crate::types::{Phase, ProposalRound, Round, VoteType, VoterRecord};
use crate::Error;

/// Latest phase and the round currently accepting ballots.
fn open_round(env: &Env, project_id: u64) -> Result<(Phase, Round), Error> {
    let state = load_project_state(env, project_id)?;
    if state.phase_count == 0 {
        return Err(Error::VotingClosed);
    }
    let phase = load_phase(env, project_id, state.phase_count - 1)?;
    let round = active_round(
        phase.proposal.end_time,
        phase.rework.as_ref().map(|r| r.end_time),
        env.ledger().timestamp(),
    )
    .ok_or(Error::VotingClosed)?;
    Ok((phase, round))
}

fn round_mut(phase: &mut Phase, round: Round) -> Result<&mut ProposalRound, Error> {
    match round {
        Round::Proposal => Ok(&mut phase.proposal),
        Round::Rework => phase.rework.as_mut().ok_or(Error::VotingClosed),
    }
}

/// Check the voter may still cast a ballot in `round`; returns their weight.
fn eligible_weight(
    env: &Env,
    project_id: u64,
    phase_id: u32,
    round: Round,
    voter: &Address,
) -> Result<i128, Error> {
    let funder = load_funder(env, project_id, voter);
    if !funder.has_funded {
        return Err(Error::NotFunder);
    }
    if load_voter(env, project_id, phase_id, round, voter).is_some() {
        return Err(Error::AlreadyVoted);
    }
    Ok(funder.funded_amount)
}

/// Record a direct ballot. `improvement` is appended to the round's
/// feedback list for `Against` ballots.
pub fn cast(
    env: &Env,
    project_id: u64,
    voter: Address,
    vote_type: VoteType,
    improvement: Option<String>,
) -> Result<(), Error> {
    if vote_type == VoteType::Delegate {
        return Err(Error::InvalidVoteType);
    }

    let (mut phase, round) = open_round(env, project_id)?;
    let weight = eligible_weight(env, project_id, phase.id, round, &voter)?;
    let credited = weight
        .checked_add(take_pending(env, project_id, phase.id, round, &voter))
        .ok_or(Error::ArithmeticOverflow)?;

    let target = round_mut(&mut phase, round)?;
    target.votes.add(vote_type, credited);
    if let Some(text) = improvement {
        target.improvements.push_back(text);
    }

    save_phase(env, project_id, &phase);
    save_voter(
        env,
        project_id,
        phase.id,
        round,
        &voter,
        &VoterRecord {
            voted: true,
            vote_type,
            delegatee: None,
            weight,
        },
    );

    events::emit_vote_cast(
        env,
        VoteCast {
            project_id,
            phase_id: phase.id,
            round,
            voter,
            vote_type,
            weight,
        },
    );
    Ok(())
}

/// Hand the voter's weight, and whatever was delegated to them, to `delegatee`
/// for the active round.
pub fn delegate(env: &Env, project_id: u64, voter: Address, delegatee: Address) -> Result<(), Error> {
    let (mut phase, round) = open_round(env, project_id)?;
    let weight = eligible_weight(env, project_id, phase.id, round, &voter)?;

    if delegatee == voter {
        return Err(Error::DelegationCycle);
    }
    let end = chain_end(env, project_id, phase.id, round, &delegatee);
    if end == voter {
        return Err(Error::DelegationCycle);
    }

    let carried = weight
        .checked_add(take_pending(env, project_id, phase.id, round, &voter))
        .ok_or(Error::ArithmeticOverflow)?;
    match load_voter(env, project_id, phase.id, round, &end) {
        // A chain end that has a record holds a direct ballot.
        Some(ballot) => {
            round_mut(&mut phase, round)?.votes.add(ballot.vote_type, carried);
            save_phase(env, project_id, &phase);
        }
        None => add_pending(env, project_id, phase.id, round, &end, carried)?,
    }

    save_voter(
        env,
        project_id,
        phase.id,
        round,
        &voter,
        &VoterRecord {
            voted: true,
            vote_type: VoteType::Delegate,
            delegatee: Some(delegatee.clone()),
            weight,
        },
    );
    save_link(env, project_id, phase.id, round, &voter, &end);

    events::emit_vote_delegated(
        env,
        VoteDelegated {
            project_id,
            phase_id: phase.id,
            round,
            voter,
            delegatee,
            weight,
        },
    );
    Ok(())
}

/// Address at the end of the delegation chain starting at `start`: the first
/// one without a delegation of its own. Every hop walked is re-pointed at the
/// end, so repeated walks over the same chain stay short.
fn chain_end(env: &Env, project_id: u64, phase_id: u32, round: Round, start: &Address) -> Address {
    let mut end = start.clone();
    let mut hops: Vec<Address> = Vec::new(env);
    while let Some(next) = load_link(env, project_id, phase_id, round, &end) {
        hops.push_back(end);
        end = next;
    }
    // The last hop already points at `end`.
    hops.pop_back();
    for hop in hops.iter() {
        save_link(env, project_id, phase_id, round, &hop, &end);
    }
    end
}
