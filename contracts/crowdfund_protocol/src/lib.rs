//! # Crowdfund Protocol Contract
//!
//! Milestone-based crowdfunding on Soroban. Funders back a project toward a
//! goal; once funded, the creator proposes withdrawal phases that funders vote
//! on, weighted by their contribution. A failed phase may be reworked once;
//! terminal outcomes open proportional refunds.
//!
//! | Stage        | Entry Point(s)                                              |
//! |--------------|-------------------------------------------------------------|
//! | Bootstrap    | [`CrowdfundProtocol::init`]                                 |
//! | Admin        | `set_periods`, `set_threshold`, `transfer_admin`            |
//! | Funding      | `create_project`, `fund`, `reduce_funding`                  |
//! | Phases       | `phase_proposal`, `rework_proposal`, `claim_funds`          |
//! | Voting       | `vote`, `against`, `delegate`                               |
//! | Refunds      | `funding_refund`, `development_refund`                      |
//! | Queries      | `get_project`, `get_phase`, `get_proposal`, `get_funder`, `get_voter`, `get_tally`, `project_status`, `phase_status`, ... |
//!
//! ## Architecture
//!
//! This file holds the public entry points and authentication only. Business
//! rules live in `registry`, `phases`, `voting` and `refunds`; storage
//! access is delegated to `storage`; status projection is the pure
//! [`status`] module shared by the engine and every read accessor.
//!
//! Every entry point returns `Result<_, Error>`. A failed invocation is rolled
//! back by the host, so no operation applies partially.

#![no_std]

use soroban_sdk::{contract, contracterror, contractimpl, Address, Env, String};

pub mod events;
mod phases;
mod refunds;
mod registry;
pub mod status;
mod storage;
mod types;
mod voting;

#[cfg(test)]
mod test_setup;
#[cfg(test)]
mod test_voting;
#[cfg(test)]
mod test_events;

pub use types::{
    FunderRecord, GlobalConfig, Phase, PhaseStatus, Project, ProjectStatus, ProposalRound, Round,
    Tally, VoteType, VoterRecord,
};

/// Upper bound for `threshold_bps`: 100%.
pub const MAX_THRESHOLD_BPS: u32 = 10_000;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // Validation
    InvalidAmount = 1,
    InvalidPeriod = 2,
    InvalidThreshold = 3,
    InvalidVoteType = 4,
    ArithmeticOverflow = 5,

    // Authorization
    NotAdmin = 10,
    NotCreator = 11,
    NotFunder = 12,

    // State
    AlreadyInitialized = 20,
    NotInitialized = 21,
    ProjectNotFound = 22,
    PhaseNotFound = 23,
    FundingClosed = 24,
    FundingNotEnded = 25,
    GoalNotReached = 26,
    PhaseNotPassed = 27,
    PhaseNotClaimed = 28,
    VotingClosed = 29,
    AlreadyVoted = 30,
    DelegationCycle = 31,
    ReworkUnavailable = 32,
    AlreadyClaimed = 33,
    RefundUnavailable = 34,
    AlreadyRefunded = 35,
    NothingToRefund = 36,

    // Funds
    InsufficientFunds = 40,
}

/// Coarse error classes reported to clients.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    State,
    InsufficientFunds,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match *self as u32 {
            1..=9 => ErrorKind::Validation,
            10..=19 => ErrorKind::Authorization,
            40..=u32::MAX => ErrorKind::InsufficientFunds,
            _ => ErrorKind::State,
        }
    }
}

#[contract]
pub struct CrowdfundProtocol;

#[contractimpl]
impl CrowdfundProtocol {
    // ─────────────────────────────────────────────────────────
    // Initialisation and administration
    // ─────────────────────────────────────────────────────────

    /// Initialise the contract.
    ///
    /// Must be called exactly once immediately after deployment. `admin`
    /// must sign; `token` is the funding asset for every project.
    pub fn init(
        env: Env,
        admin: Address,
        token: Address,
        voting_period: u64,
        rework_period: u64,
        threshold_bps: u32,
    ) -> Result<(), Error> {
        admin.require_auth();
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        Self::validate_periods(voting_period, rework_period)?;
        Self::validate_threshold(threshold_bps)?;

        storage::set_admin(&env, &admin);
        storage::set_token(&env, &token);
        storage::set_config(
            &env,
            &GlobalConfig {
                voting_period,
                rework_period,
                threshold_bps,
            },
        );
        Ok(())
    }

    /// Replace both periods. Rounds already opened keep their end times.
    pub fn set_periods(
        env: Env,
        admin: Address,
        voting_period: u64,
        rework_period: u64,
    ) -> Result<(), Error> {
        Self::require_admin(&env, &admin)?;
        Self::validate_periods(voting_period, rework_period)?;

        let mut config = storage::get_config(&env)?;
        config.voting_period = voting_period;
        config.rework_period = rework_period;
        storage::set_config(&env, &config);

        events::emit_periods_updated(&env, voting_period, rework_period);
        Ok(())
    }

    /// Replace the threshold fraction used by future threshold snapshots.
    pub fn set_threshold(env: Env, admin: Address, threshold_bps: u32) -> Result<(), Error> {
        Self::require_admin(&env, &admin)?;
        Self::validate_threshold(threshold_bps)?;

        let mut config = storage::get_config(&env)?;
        config.threshold_bps = threshold_bps;
        storage::set_config(&env, &config);

        events::emit_threshold_updated(&env, threshold_bps);
        Ok(())
    }

    /// Hand the admin role to `new_admin`.
    pub fn transfer_admin(env: Env, admin: Address, new_admin: Address) -> Result<(), Error> {
        Self::require_admin(&env, &admin)?;
        storage::set_admin(&env, &new_admin);
        events::emit_admin_transferred(&env, admin, new_admin);
        Ok(())
    }

    pub fn get_config(env: Env) -> Result<GlobalConfig, Error> {
        storage::get_config(&env)
    }

    pub fn get_admin(env: Env) -> Result<Address, Error> {
        storage::get_admin(&env)
    }

    pub fn funding_token(env: Env) -> Result<Address, Error> {
        storage::get_token(&env)
    }

    pub fn next_project_id(env: Env) -> u64 {
        storage::peek_next_project_id(&env)
    }

    // ─────────────────────────────────────────────────────────
    // Project registry
    // ─────────────────────────────────────────────────────────

    /// Create a project with a funding window of `period` seconds from now.
    pub fn create_project(env: Env, creator: Address, goal: i128, period: u64) -> Result<Project, Error> {
        creator.require_auth();
        registry::create_project(&env, creator, goal, period)
    }

    /// Contribute `amount` of the funding token.
    pub fn fund(env: Env, project_id: u64, funder: Address, amount: i128) -> Result<(), Error> {
        funder.require_auth();
        registry::fund(&env, project_id, funder, amount)
    }

    /// Take back part of a contribution while the funding window is open.
    pub fn reduce_funding(env: Env, project_id: u64, funder: Address, amount: i128) -> Result<(), Error> {
        funder.require_auth();
        registry::reduce_funding(&env, project_id, funder, amount)
    }

    // ─────────────────────────────────────────────────────────
    // Phases
    // ─────────────────────────────────────────────────────────

    /// Propose the next phase, requesting `amount` on approval.
    pub fn phase_proposal(
        env: Env,
        project_id: u64,
        creator: Address,
        amount: i128,
        detail: String,
    ) -> Result<Phase, Error> {
        creator.require_auth();
        phases::propose(&env, project_id, creator, amount, detail)
    }

    /// Submit the single rework of a failed phase. `None` keeps the amount.
    pub fn rework_proposal(
        env: Env,
        project_id: u64,
        creator: Address,
        detail: String,
        new_amount: Option<i128>,
    ) -> Result<Phase, Error> {
        creator.require_auth();
        phases::rework(&env, project_id, creator, detail, new_amount)
    }

    /// Withdraw the current passed phase's amount to the creator.
    pub fn claim_funds(env: Env, project_id: u64, creator: Address) -> Result<i128, Error> {
        creator.require_auth();
        phases::claim(&env, project_id, creator)
    }

    // ─────────────────────────────────────────────────────────
    // Voting
    // ─────────────────────────────────────────────────────────

    /// Cast an `Abstain` or `For` ballot in the active round.
    pub fn vote(env: Env, project_id: u64, voter: Address, vote_type: VoteType) -> Result<(), Error> {
        voter.require_auth();
        match vote_type {
            VoteType::Abstain | VoteType::For => {}
            VoteType::Against | VoteType::Delegate => return Err(Error::InvalidVoteType),
        }
        voting::cast(&env, project_id, voter, vote_type, None)
    }

    /// Vote against the active round, leaving improvement feedback.
    pub fn against(env: Env, project_id: u64, voter: Address, improvement: String) -> Result<(), Error> {
        voter.require_auth();
        voting::cast(&env, project_id, voter, VoteType::Against, Some(improvement))
    }

    /// Delegate the voter's weight in the active round to `delegatee`.
    pub fn delegate(env: Env, project_id: u64, voter: Address, delegatee: Address) -> Result<(), Error> {
        voter.require_auth();
        voting::delegate(&env, project_id, voter, delegatee)
    }

    // ─────────────────────────────────────────────────────────
    // Refunds
    // ─────────────────────────────────────────────────────────

    pub fn funding_refund(env: Env, project_id: u64, funder: Address) -> Result<i128, Error> {
        funder.require_auth();
        refunds::funding_refund(&env, project_id, funder)
    }

    pub fn development_refund(env: Env, project_id: u64, funder: Address) -> Result<i128, Error> {
        funder.require_auth();
        refunds::development_refund(&env, project_id, funder)
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_project(env: Env, project_id: u64) -> Result<Project, Error> {
        storage::load_project(&env, project_id)
    }

    pub fn get_phase(env: Env, project_id: u64, phase_id: u32) -> Result<Phase, Error> {
        storage::load_phase(&env, project_id, phase_id)
    }

    /// The proposal round of a phase, or its rework round when `rework` is set.
    pub fn get_proposal(
        env: Env,
        project_id: u64,
        phase_id: u32,
        rework: bool,
    ) -> Result<ProposalRound, Error> {
        let phase = storage::load_phase(&env, project_id, phase_id)?;
        phase
            .round(Round::from_rework_flag(rework))
            .cloned()
            .ok_or(Error::PhaseNotFound)
    }

    /// Funder ledger entry; all-zero for an address that never funded.
    pub fn get_funder(env: Env, project_id: u64, funder: Address) -> Result<FunderRecord, Error> {
        storage::load_project_config(&env, project_id)?;
        Ok(storage::load_funder(&env, project_id, &funder))
    }

    pub fn get_voter(
        env: Env,
        project_id: u64,
        phase_id: u32,
        rework: bool,
        voter: Address,
    ) -> Option<VoterRecord> {
        storage::load_voter(
            &env,
            project_id,
            phase_id,
            Round::from_rework_flag(rework),
            &voter,
        )
    }

    /// Weighted tally of a round, including delegations whose chain has
    /// reached a ballot.
    pub fn get_tally(env: Env, project_id: u64, phase_id: u32, rework: bool) -> Result<Tally, Error> {
        let phase = storage::load_phase(&env, project_id, phase_id)?;
        phase
            .round(Round::from_rework_flag(rework))
            .map(|round| round.votes.clone())
            .ok_or(Error::PhaseNotFound)
    }

    pub fn project_status(env: Env, project_id: u64) -> Result<ProjectStatus, Error> {
        let (config, state) = storage::load_project_pair(&env, project_id)?;
        let now = env.ledger().timestamp();
        let latest = phases::latest(&env, project_id, &state, now)?.map(|(_, status)| status);
        Ok(status::resolve_project(
            config.end_time,
            config.goal,
            state.current_amount,
            latest,
            now,
        ))
    }

    pub fn phase_status(env: Env, project_id: u64, phase_id: u32) -> Result<PhaseStatus, Error> {
        let state = storage::load_project_state(&env, project_id)?;
        let phase = storage::load_phase(&env, project_id, phase_id)?;
        Ok(phases::resolve(&phase, state.threshold, env.ledger().timestamp()))
    }

    // ─────────────────────────────────────────────────────────
    // Internal Helpers
    // ─────────────────────────────────────────────────────────

    fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
        caller.require_auth();
        if storage::get_admin(env)? != *caller {
            return Err(Error::NotAdmin);
        }
        Ok(())
    }

    fn validate_periods(voting_period: u64, rework_period: u64) -> Result<(), Error> {
        if voting_period == 0 || rework_period == 0 {
            return Err(Error::InvalidPeriod);
        }
        Ok(())
    }

    fn validate_threshold(threshold_bps: u32) -> Result<(), Error> {
        if threshold_bps == 0 || threshold_bps > MAX_THRESHOLD_BPS {
            return Err(Error::InvalidThreshold);
        }
        Ok(())
    }
}
