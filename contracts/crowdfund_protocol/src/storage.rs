//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the protocol:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key            | Type           | Description                          |
//! |----------------|----------------|--------------------------------------|
//! | `ProjectCount` | `u64`          | Auto-increment project ID counter    |
//! | `Admin`        | `Address`      | Administrator allowed to set periods |
//! | `Token`        | `Address`      | Funding asset                        |
//! | `Config`       | `GlobalConfig` | Voting/rework periods and threshold  |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                          | Type            | Description                     |
//! |------------------------------|-----------------|---------------------------------|
//! | `ProjConfig(id)`             | `ProjectConfig` | Immutable project configuration |
//! | `ProjState(id)`              | `ProjectState`  | Mutable project state           |
//! | `Funder(id, addr)`           | `FunderRecord`  | Contribution ledger entry       |
//! | `Phase(id, phase)`           | `Phase`         | Phase with its rounds           |
//! | `Voter(id, phase, round, a)` | `VoterRecord`   | Ballot of `a` in one round      |
//! | `Pending(id, phase, round, a)` | `i128`        | Delegated weight parked at `a`  |
//! | `Link(id, phase, round, a)`  | `Address`       | Where `a`'s delegation leads    |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.

use soroban_sdk::{contracttype, Address, Env};

use crate::types::{
    FunderRecord, GlobalConfig, Phase, Project, ProjectConfig, ProjectState, Round, VoterRecord,
};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

/// All contract storage keys.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Global auto-increment counter for project IDs (Instance).
    ProjectCount,
    /// Administrator address (Instance).
    Admin,
    /// Funding token address (Instance).
    Token,
    /// Periods and threshold fraction (Instance).
    Config,
    /// Immutable project configuration keyed by ID (Persistent).
    ProjConfig(u64),
    /// Mutable project state keyed by ID (Persistent).
    ProjState(u64),
    /// Funder ledger entry (Persistent).
    Funder(u64, Address),
    /// Phase keyed by project and phase index (Persistent).
    Phase(u64, u32),
    /// Ballot of one voter in one round (Persistent).
    Voter(u64, u32, Round, Address),
    /// Weight delegated to an address that has not cast a ballot yet (Persistent).
    Pending(u64, u32, Round, Address),
    /// Compressed delegation pointer; absent for addresses that did not delegate (Persistent).
    Link(u64, u32, Round, Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

/// Extend instance storage TTL if it falls below the threshold.
fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Atomically reads, increments, and stores the project counter.
/// Returns the ID to use for the *current* project (pre-increment value).
pub fn get_and_increment_project_id(env: &Env) -> u64 {
    bump_instance(env);
    let current = peek_next_project_id(env);
    env.storage()
        .instance()
        .set(&DataKey::ProjectCount, &(current + 1));
    current
}

/// The ID the next `create_project` call will receive.
pub fn peek_next_project_id(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::ProjectCount)
        .unwrap_or(0)
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    bump_instance(env);
}

pub fn get_admin(env: &Env) -> Result<Address, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

pub fn set_token(env: &Env, token: &Address) {
    env.storage().instance().set(&DataKey::Token, token);
    bump_instance(env);
}

pub fn get_token(env: &Env) -> Result<Address, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Token)
        .ok_or(Error::NotInitialized)
}

pub fn set_config(env: &Env, config: &GlobalConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn get_config(env: &Env) -> Result<GlobalConfig, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

/// Extend the TTL for a persistent storage key.
fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

fn read_persistent<T>(env: &Env, key: &DataKey) -> Option<T>
where
    T: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>,
{
    let value: Option<T> = env.storage().persistent().get(key);
    if value.is_some() {
        bump_persistent(env, key);
    }
    value
}

fn write_persistent<T>(env: &Env, key: &DataKey, value: &T)
where
    T: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    bump_persistent(env, key);
}

/// Save the immutable config and the initial state of a new project.
pub fn save_new_project(env: &Env, config: &ProjectConfig, state: &ProjectState) {
    write_persistent(env, &DataKey::ProjConfig(config.id), config);
    write_persistent(env, &DataKey::ProjState(config.id), state);
}

/// Load the full `Project` by combining config and state.
pub fn load_project(env: &Env, id: u64) -> Result<Project, Error> {
    let (config, state) = load_project_pair(env, id)?;
    Ok(Project {
        id: config.id,
        creator: config.creator,
        goal: config.goal,
        current_amount: state.current_amount,
        total_ever_funded: state.total_ever_funded,
        funder_count: state.funder_count,
        start_time: config.start_time,
        end_time: config.end_time,
        current_phase_index: state.current_phase_index,
        phase_count: state.phase_count,
        threshold: state.threshold,
    })
}

/// Load config and state together; the common read pattern for entry points.
pub fn load_project_pair(env: &Env, id: u64) -> Result<(ProjectConfig, ProjectState), Error> {
    Ok((load_project_config(env, id)?, load_project_state(env, id)?))
}

/// Load only the immutable project configuration.
pub fn load_project_config(env: &Env, id: u64) -> Result<ProjectConfig, Error> {
    read_persistent(env, &DataKey::ProjConfig(id)).ok_or(Error::ProjectNotFound)
}

/// Load only the mutable project state.
pub fn load_project_state(env: &Env, id: u64) -> Result<ProjectState, Error> {
    read_persistent(env, &DataKey::ProjState(id)).ok_or(Error::ProjectNotFound)
}

/// Save only the mutable project state.
pub fn save_project_state(env: &Env, id: u64, state: &ProjectState) {
    write_persistent(env, &DataKey::ProjState(id), state);
}

/// Funder entry, or an all-zero record for an address that never funded.
pub fn load_funder(env: &Env, id: u64, funder: &Address) -> FunderRecord {
    read_persistent(env, &DataKey::Funder(id, funder.clone())).unwrap_or_else(FunderRecord::empty)
}

pub fn save_funder(env: &Env, id: u64, funder: &Address, record: &FunderRecord) {
    write_persistent(env, &DataKey::Funder(id, funder.clone()), record);
}

pub fn load_phase(env: &Env, id: u64, phase_id: u32) -> Result<Phase, Error> {
    read_persistent(env, &DataKey::Phase(id, phase_id)).ok_or(Error::PhaseNotFound)
}

pub fn save_phase(env: &Env, id: u64, phase: &Phase) {
    write_persistent(env, &DataKey::Phase(id, phase.id), phase);
}

pub fn load_voter(
    env: &Env,
    id: u64,
    phase_id: u32,
    round: Round,
    voter: &Address,
) -> Option<VoterRecord> {
    read_persistent(env, &DataKey::Voter(id, phase_id, round, voter.clone()))
}

pub fn save_voter(
    env: &Env,
    id: u64,
    phase_id: u32,
    round: Round,
    voter: &Address,
    record: &VoterRecord,
) {
    write_persistent(env, &DataKey::Voter(id, phase_id, round, voter.clone()), record);
}

/// Remove and return the weight parked at `voter`.
pub fn take_pending(env: &Env, id: u64, phase_id: u32, round: Round, voter: &Address) -> i128 {
    let key = DataKey::Pending(id, phase_id, round, voter.clone());
    let pending: Option<i128> = env.storage().persistent().get(&key);
    if pending.is_some() {
        env.storage().persistent().remove(&key);
    }
    pending.unwrap_or(0)
}

pub fn add_pending(
    env: &Env,
    id: u64,
    phase_id: u32,
    round: Round,
    voter: &Address,
    weight: i128,
) -> Result<(), Error> {
    let key = DataKey::Pending(id, phase_id, round, voter.clone());
    let pending: i128 = read_persistent(env, &key).unwrap_or(0);
    let total = pending.checked_add(weight).ok_or(Error::ArithmeticOverflow)?;
    write_persistent(env, &key, &total);
    Ok(())
}

pub fn load_link(env: &Env, id: u64, phase_id: u32, round: Round, voter: &Address) -> Option<Address> {
    read_persistent(env, &DataKey::Link(id, phase_id, round, voter.clone()))
}

pub fn save_link(env: &Env, id: u64, phase_id: u32, round: Round, voter: &Address, to: &Address) {
    write_persistent(env, &DataKey::Link(id, phase_id, round, voter.clone()), to);
}
