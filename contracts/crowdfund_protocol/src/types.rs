//! # Types
//!
//! Shared data structures used across all modules of the crowdfund protocol.
//!
//! ## Design decisions
//!
//! ### Config / State split
//!
//! A `Project` is internally stored as two separate ledger entries:
//!
//! - [`ProjectConfig`] — written once at creation; never mutated.
//! - [`ProjectState`] — written on every funding, claim and refund.
//!
//! The public API exposes the reconstructed [`Project`] struct for convenience.
//!
//! ### Derived status
//!
//! Neither [`ProjectStatus`] nor [`PhaseStatus`] is stored. Both are projected
//! from timestamps and tallies on every read by [`crate::status`], so a round
//! closes the moment the ledger clock passes its `end_time` without any
//! transaction having to "close" it.
//!
//! ```text
//! Phase:   Open ──► Passed
//!            └────► AwaitingRework ──► ReworkOpen ──► Passed
//!            │              │                  └────► Terminated
//!            └────► Terminated ◄┘
//!
//! Project: Funding ──► WaitingForInitiation ──► Developing ──► Completed
//!             └──────► Terminated                   └────────► Terminated
//! ```

use soroban_sdk::{contracttype, Address, String, Vec};

/// Lifecycle status of a project, derived from ledger time and its phases.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProjectStatus {
    /// Funding window still open.
    Funding,
    /// Goal reached; the creator has not proposed the first phase yet.
    WaitingForInitiation,
    /// At least one phase exists and the project is neither completed nor terminated.
    Developing,
    /// Latest phase passed and every token has been claimed.
    Completed,
    /// Funding failed, or the latest phase was terminated.
    Terminated,
}

/// Resolution state of a single phase.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PhaseStatus {
    /// Proposal round voting window active.
    Open,
    /// A round cleared the threshold.
    Passed,
    /// Proposal round failed; the creator may still submit one rework.
    AwaitingRework,
    /// Rework round voting window active.
    ReworkOpen,
    /// No round cleared the threshold and no further round is possible.
    Terminated,
}

/// Which of a phase's two rounds a record belongs to.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Round {
    Proposal,
    Rework,
}

impl Round {
    pub fn from_rework_flag(rework: bool) -> Self {
        if rework {
            Round::Rework
        } else {
            Round::Proposal
        }
    }
}

/// Closed set of ballot kinds.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoteType {
    Abstain,
    For,
    Against,
    Delegate,
}

/// Global periods and threshold fraction, mutable only by the admin.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GlobalConfig {
    /// Length of a proposal round, in seconds.
    pub voting_period: u64,
    /// Length of the rework window and of a rework round, in seconds.
    pub rework_period: u64,
    /// Threshold as a fraction of `total_ever_funded`, in basis points.
    pub threshold_bps: u32,
}

/// Immutable project configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectConfig {
    pub id: u64,
    pub creator: Address,
    pub goal: i128,
    pub start_time: u64,
    pub end_time: u64,
}

/// Mutable project state, updated by funding, phase and refund operations.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectState {
    pub current_amount: i128,
    pub total_ever_funded: i128,
    pub funder_count: u32,
    pub current_phase_index: u32,
    pub phase_count: u32,
    /// Zero until the first phase is proposed.
    pub threshold: i128,
    /// `current_amount` captured at the first development refund.
    pub refund_pool: Option<i128>,
}

/// Full on-chain representation of a crowdfunding project.
///
/// Used as the public API return type; reconstructed internally from
/// the split `ProjectConfig` + `ProjectState` storage entries.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    /// Unique identifier (auto-incremented).
    pub id: u64,
    /// Address that created the project and claims passed phases.
    pub creator: Address,
    /// Target funding amount.
    pub goal: i128,
    /// Amount currently held for the project.
    pub current_amount: i128,
    /// Sum of every contribution ever made; never decreases.
    pub total_ever_funded: i128,
    /// Distinct funders that ever contributed a positive amount.
    pub funder_count: u32,
    /// Ledger timestamp at creation.
    pub start_time: u64,
    /// End of the funding window (exclusive).
    pub end_time: u64,
    /// Index of the phase awaiting resolution or claim.
    pub current_phase_index: u32,
    /// Number of phases proposed so far.
    pub phase_count: u32,
    /// Votes a round needs in favour to pass; zero before development starts.
    pub threshold: i128,
}

/// Per project × funder ledger entry.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FunderRecord {
    /// Net contribution after reductions and refunds.
    pub funded_amount: i128,
    pub refunded: bool,
    /// Sticky once any positive contribution was made.
    pub has_funded: bool,
}

impl FunderRecord {
    pub fn empty() -> Self {
        FunderRecord {
            funded_amount: 0,
            refunded: false,
            has_funded: false,
        }
    }
}

/// Weighted running totals of a round.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tally {
    pub abstain: i128,
    pub in_favor: i128,
    pub against: i128,
}

impl Tally {
    pub fn add(&mut self, vote_type: VoteType, weight: i128) {
        match vote_type {
            VoteType::Abstain => self.abstain += weight,
            VoteType::For => self.in_favor += weight,
            VoteType::Against => self.against += weight,
            VoteType::Delegate => {}
        }
    }

    pub fn total(&self) -> i128 {
        self.abstain + self.in_favor + self.against
    }
}

/// One voting window of a phase.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProposalRound {
    pub start_time: u64,
    pub end_time: u64,
    /// Last instant (exclusive) at which a rework may be submitted.
    /// Equal to `end_time` for a rework round, which cannot be reworked.
    pub rework_deadline: u64,
    /// Set once when a rework round is created for this phase.
    pub reworked: bool,
    pub detail: String,
    /// Feedback appended by `against` votes, in arrival order.
    pub improvements: Vec<String>,
    /// Running weighted totals, delegated weight included once its chain
    /// reaches a ballot.
    pub votes: Tally,
}

/// One funded milestone with a single withdrawal request.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Phase {
    pub id: u32,
    pub withdraw_amount: i128,
    pub proposal: ProposalRound,
    pub rework: Option<ProposalRound>,
    pub claimed: bool,
}

impl Phase {
    pub fn round(&self, round: Round) -> Option<&ProposalRound> {
        match round {
            Round::Proposal => Some(&self.proposal),
            Round::Rework => self.rework.as_ref(),
        }
    }
}

/// A voter's single, immutable ballot in a round.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoterRecord {
    pub voted: bool,
    pub vote_type: VoteType,
    /// Present only when `vote_type` is `Delegate`.
    pub delegatee: Option<Address>,
    /// Voter's `funded_amount` when the record was created.
    pub weight: i128,
}
