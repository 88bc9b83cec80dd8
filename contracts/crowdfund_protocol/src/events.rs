//! # Events
//!
//! Every successful state change publishes one event. Topics are
//! `(symbol, project_id)` for project-scoped events and `(symbol,)` for
//! administrative ones; the data is one of the typed structs below so
//! off-chain consumers can decode it field by field.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

use crate::types::{Round, VoteType};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectCreated {
    pub project_id: u64,
    pub creator: Address,
    pub goal: i128,
    pub end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectFunded {
    pub project_id: u64,
    pub funder: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundingReduced {
    pub project_id: u64,
    pub funder: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PhaseProposed {
    pub project_id: u64,
    pub phase_id: u32,
    pub amount: i128,
    pub end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PhaseReworked {
    pub project_id: u64,
    pub phase_id: u32,
    pub amount: i128,
    pub end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoteCast {
    pub project_id: u64,
    pub phase_id: u32,
    pub round: Round,
    pub voter: Address,
    pub vote_type: VoteType,
    pub weight: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoteDelegated {
    pub project_id: u64,
    pub phase_id: u32,
    pub round: Round,
    pub voter: Address,
    pub delegatee: Address,
    pub weight: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FundsClaimed {
    pub project_id: u64,
    pub phase_id: u32,
    pub creator: Address,
    pub amount: i128,
}

/// Shared payload of `f_refund` and `d_refund`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Refunded {
    pub project_id: u64,
    pub funder: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeriodsUpdated {
    pub voting_period: u64,
    pub rework_period: u64,
}

pub fn emit_project_created(env: &Env, project_id: u64, creator: Address, goal: i128, end_time: u64) {
    env.events().publish(
        (symbol_short!("created"), project_id),
        ProjectCreated {
            project_id,
            creator,
            goal,
            end_time,
        },
    );
}

pub fn emit_project_funded(env: &Env, project_id: u64, funder: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("funded"), project_id),
        ProjectFunded {
            project_id,
            funder,
            amount,
        },
    );
}

pub fn emit_funding_reduced(env: &Env, project_id: u64, funder: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("reduced"), project_id),
        FundingReduced {
            project_id,
            funder,
            amount,
        },
    );
}

pub fn emit_phase_proposed(env: &Env, project_id: u64, phase_id: u32, amount: i128, end_time: u64) {
    env.events().publish(
        (symbol_short!("proposed"), project_id),
        PhaseProposed {
            project_id,
            phase_id,
            amount,
            end_time,
        },
    );
}

pub fn emit_phase_reworked(env: &Env, project_id: u64, phase_id: u32, amount: i128, end_time: u64) {
    env.events().publish(
        (symbol_short!("reworked"), project_id),
        PhaseReworked {
            project_id,
            phase_id,
            amount,
            end_time,
        },
    );
}

pub fn emit_vote_cast(env: &Env, event: VoteCast) {
    env.events()
        .publish((symbol_short!("voted"), event.project_id), event);
}

pub fn emit_vote_delegated(env: &Env, event: VoteDelegated) {
    env.events()
        .publish((symbol_short!("delegate"), event.project_id), event);
}

pub fn emit_funds_claimed(env: &Env, project_id: u64, phase_id: u32, creator: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("claimed"), project_id),
        FundsClaimed {
            project_id,
            phase_id,
            creator,
            amount,
        },
    );
}

pub fn emit_funding_refund(env: &Env, project_id: u64, funder: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("f_refund"), project_id),
        Refunded {
            project_id,
            funder,
            amount,
        },
    );
}

pub fn emit_development_refund(env: &Env, project_id: u64, funder: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("d_refund"), project_id),
        Refunded {
            project_id,
            funder,
            amount,
        },
    );
}

pub fn emit_periods_updated(env: &Env, voting_period: u64, rework_period: u64) {
    env.events().publish(
        (symbol_short!("periods"),),
        PeriodsUpdated {
            voting_period,
            rework_period,
        },
    );
}

pub fn emit_threshold_updated(env: &Env, threshold_bps: u32) {
    env.events()
        .publish((symbol_short!("threshold"),), threshold_bps);
}

pub fn emit_admin_transferred(env: &Env, previous: Address, admin: Address) {
    env.events()
        .publish((symbol_short!("admin"),), (previous, admin));
}
