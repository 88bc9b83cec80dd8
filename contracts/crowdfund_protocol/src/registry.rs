//! # Project registry
//!
//! Project creation and the funding-stage ledger: contributions and
//! reductions while the funding window is open. Token movements in and out
//! of the contract are funnelled through [`collect`] and [`pay_out`].

use soroban_sdk::{token, Address, Env};

use crate::events;
use crate::storage::{
    self, get_and_increment_project_id, load_funder, load_project_pair, save_funder,
    save_new_project, save_project_state,
};
use crate::types::{Project, ProjectConfig, ProjectState};
use crate::Error;

/// Pull `amount` of the funding token from `from` into the contract.
pub(crate) fn collect(env: &Env, from: &Address, amount: i128) -> Result<(), Error> {
    let token = storage::get_token(env)?;
    token::Client::new(env, &token).transfer(from, &env.current_contract_address(), &amount);
    Ok(())
}

/// Send `amount` of the funding token from the contract to `to`.
pub(crate) fn pay_out(env: &Env, to: &Address, amount: i128) -> Result<(), Error> {
    if amount == 0 {
        return Ok(());
    }
    let token = storage::get_token(env)?;
    token::Client::new(env, &token).transfer(&env.current_contract_address(), to, &amount);
    Ok(())
}

pub fn create_project(env: &Env, creator: Address, goal: i128, period: u64) -> Result<Project, Error> {
    if !storage::is_initialized(env) {
        return Err(Error::NotInitialized);
    }
    if goal <= 0 {
        return Err(Error::InvalidAmount);
    }
    if period == 0 {
        return Err(Error::InvalidPeriod);
    }

    let now = env.ledger().timestamp();
    let end_time = now.checked_add(period).ok_or(Error::ArithmeticOverflow)?;
    let id = get_and_increment_project_id(env);

    let config = ProjectConfig {
        id,
        creator: creator.clone(),
        goal,
        start_time: now,
        end_time,
    };
    let state = ProjectState {
        current_amount: 0,
        total_ever_funded: 0,
        funder_count: 0,
        current_phase_index: 0,
        phase_count: 0,
        threshold: 0,
        refund_pool: None,
    };
    save_new_project(env, &config, &state);

    events::emit_project_created(env, id, creator, goal, end_time);
    storage::load_project(env, id)
}

/// Contribute `amount` while the funding window is open.
pub fn fund(env: &Env, project_id: u64, funder: Address, amount: i128) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    let (config, mut state) = load_project_pair(env, project_id)?;
    if env.ledger().timestamp() >= config.end_time || state.phase_count > 0 {
        return Err(Error::FundingClosed);
    }

    let mut record = load_funder(env, project_id, &funder);
    record.funded_amount = record
        .funded_amount
        .checked_add(amount)
        .ok_or(Error::ArithmeticOverflow)?;
    state.current_amount = state
        .current_amount
        .checked_add(amount)
        .ok_or(Error::ArithmeticOverflow)?;
    state.total_ever_funded = state
        .total_ever_funded
        .checked_add(amount)
        .ok_or(Error::ArithmeticOverflow)?;
    if !record.has_funded {
        record.has_funded = true;
        state.funder_count += 1;
    }

    collect(env, &funder, amount)?;

    save_funder(env, project_id, &funder, &record);
    save_project_state(env, project_id, &state);

    events::emit_project_funded(env, project_id, funder, amount);
    Ok(())
}

/// Withdraw part of a contribution before the funding window closes.
///
/// `total_ever_funded` is left untouched so vote weight denominators never
/// shrink.
pub fn reduce_funding(env: &Env, project_id: u64, funder: Address, amount: i128) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }

    let (config, mut state) = load_project_pair(env, project_id)?;
    if env.ledger().timestamp() >= config.end_time || state.phase_count > 0 {
        return Err(Error::FundingClosed);
    }

    let mut record = load_funder(env, project_id, &funder);
    if !record.has_funded {
        return Err(Error::NotFunder);
    }
    if amount > record.funded_amount {
        return Err(Error::InsufficientFunds);
    }

    record.funded_amount -= amount;
    state.current_amount -= amount;

    save_funder(env, project_id, &funder, &record);
    save_project_state(env, project_id, &state);
    pay_out(env, &funder, amount)?;

    events::emit_funding_reduced(env, project_id, funder, amount);
    Ok(())
}
