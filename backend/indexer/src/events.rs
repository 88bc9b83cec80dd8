//! Canonical event types emitted by the crowdfund protocol contract.
//!
//! These mirror the Soroban contract events defined in
//! `contracts/crowdfund_protocol/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the crowdfund contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new project was created (`created` topic).
    ProjectCreated,
    /// A funder contributed to a project (`funded` topic).
    ProjectFunded,
    /// A funder withdrew part of a contribution (`reduced` topic).
    FundingReduced,
    /// The creator opened a phase (`proposed` topic).
    PhaseProposed,
    /// The creator submitted the phase's rework (`reworked` topic).
    PhaseReworked,
    /// A funder cast a direct ballot (`voted` topic).
    VoteCast,
    /// A funder delegated their ballot (`delegate` topic).
    VoteDelegated,
    /// A passed phase's withdrawal went to the creator (`claimed` topic).
    FundsClaimed,
    /// Refund after a failed funding window (`f_refund` topic).
    FundingRefund,
    /// Refund after a terminated phase (`d_refund` topic).
    DevelopmentRefund,
    /// Voting or rework period changed (`periods` topic).
    PeriodsUpdated,
    /// Pass threshold changed (`threshold` topic).
    ThresholdUpdated,
    /// Admin role moved to a new address (`admin` topic).
    AdminTransferred,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    const ALL: [EventKind; 14] = [
        Self::ProjectCreated,
        Self::ProjectFunded,
        Self::FundingReduced,
        Self::PhaseProposed,
        Self::PhaseReworked,
        Self::VoteCast,
        Self::VoteDelegated,
        Self::FundsClaimed,
        Self::FundingRefund,
        Self::DevelopmentRefund,
        Self::PeriodsUpdated,
        Self::ThresholdUpdated,
        Self::AdminTransferred,
        Self::Unknown,
    ];

    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::ProjectCreated,
            "funded" => Self::ProjectFunded,
            "reduced" => Self::FundingReduced,
            "proposed" => Self::PhaseProposed,
            "reworked" => Self::PhaseReworked,
            "voted" => Self::VoteCast,
            "delegate" => Self::VoteDelegated,
            "claimed" => Self::FundsClaimed,
            "f_refund" => Self::FundingRefund,
            "d_refund" => Self::DevelopmentRefund,
            "periods" => Self::PeriodsUpdated,
            "threshold" => Self::ThresholdUpdated,
            "admin" => Self::AdminTransferred,
            _ => Self::Unknown,
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectCreated => "project_created",
            Self::ProjectFunded => "project_funded",
            Self::FundingReduced => "funding_reduced",
            Self::PhaseProposed => "phase_proposed",
            Self::PhaseReworked => "phase_reworked",
            Self::VoteCast => "vote_cast",
            Self::VoteDelegated => "vote_delegated",
            Self::FundsClaimed => "funds_claimed",
            Self::FundingRefund => "funding_refund",
            Self::DevelopmentRefund => "development_refund",
            Self::PeriodsUpdated => "periods_updated",
            Self::ThresholdUpdated => "threshold_updated",
            Self::AdminTransferred => "admin_transferred",
            Self::Unknown => "unknown",
        }
    }

    /// Inverse of [`EventKind::as_str`], used when folding stored rows.
    pub fn from_stored(event_type: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == event_type)
            .unwrap_or(Self::Unknown)
    }

    /// Both refund paths, which share a payload shape.
    pub fn is_refund(&self) -> bool {
        matches!(self, Self::FundingRefund | Self::DevelopmentRefund)
    }
}

/// A fully decoded crowdfund event, ready to be stored in the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdfundEvent {
    pub event_type: String,
    pub project_id: Option<String>,
    /// Set for phase-scoped events (proposals, ballots, claims).
    pub phase_id: Option<i64>,
    pub actor: Option<String>,
    /// Token amount or vote weight, kept as a decimal string since it is an `i128` on chain.
    pub amount: Option<String>,
    /// Funding window or voting round end, where the event carries one.
    pub end_time: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub project_id: Option<String>,
    pub phase_id: Option<i64>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub end_time: Option<i64>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        EventKind::from_stored(&self.event_type)
    }
}
