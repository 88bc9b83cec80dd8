//! # Refund engine
//!
//! Two mutually exclusive refund paths:
//!
//! - **Funding refund**: the funding window closed below the goal. Each funder
//!   gets back exactly their net contribution.
//! - **Development refund**: the latest phase was terminated. Each funder gets
//!   `funded_amount * pool / total_ever_funded`, rounded down, where `pool` is
//!   `current_amount` as it stood at the first development refund.
//!
//! Both mark the funder `refunded`, so a retried call fails instead of paying
//! twice.

use soroban_sdk::{Address, Env, I256};

use crate::events;
use crate::phases;
use crate::registry::pay_out;
use crate::storage::{load_funder, load_project_pair, save_funder, save_project_state};
use crate::types::{FunderRecord, PhaseStatus};
use crate::Error;

fn take_record(env: &Env, project_id: u64, funder: &Address) -> Result<FunderRecord, Error> {
    let record = load_funder(env, project_id, funder);
    if record.refunded {
        return Err(Error::AlreadyRefunded);
    }
    if record.funded_amount <= 0 {
        return Err(Error::NothingToRefund);
    }
    Ok(record)
}

/// `floor(amount * pool / total)` with a 256-bit intermediate product.
pub(crate) fn proportional_share(env: &Env, amount: i128, pool: i128, total: i128) -> Result<i128, Error> {
    if total <= 0 {
        return Err(Error::ArithmeticOverflow);
    }
    I256::from_i128(env, amount)
        .mul(&I256::from_i128(env, pool))
        .div(&I256::from_i128(env, total))
        .to_i128()
        .ok_or(Error::ArithmeticOverflow)
}

pub fn funding_refund(env: &Env, project_id: u64, funder: Address) -> Result<i128, Error> {
    let (config, mut state) = load_project_pair(env, project_id)?;
    let funding_failed = env.ledger().timestamp() >= config.end_time
        && state.phase_count == 0
        && state.current_amount < config.goal;
    if !funding_failed {
        return Err(Error::RefundUnavailable);
    }

    let mut record = take_record(env, project_id, &funder)?;
    let amount = record.funded_amount;
    record.funded_amount = 0;
    record.refunded = true;
    state.current_amount -= amount;

    save_funder(env, project_id, &funder, &record);
    save_project_state(env, project_id, &state);
    pay_out(env, &funder, amount)?;

    events::emit_funding_refund(env, project_id, funder, amount);
    Ok(amount)
}

pub fn development_refund(env: &Env, project_id: u64, funder: Address) -> Result<i128, Error> {
    let (_, mut state) = load_project_pair(env, project_id)?;
    let now = env.ledger().timestamp();
    match phases::latest(env, project_id, &state, now)? {
        Some((_, PhaseStatus::Terminated)) => {}
        _ => return Err(Error::RefundUnavailable),
    }

    let mut record = take_record(env, project_id, &funder)?;
    let pool = state.refund_pool.unwrap_or(state.current_amount);
    let amount = proportional_share(env, record.funded_amount, pool, state.total_ever_funded)?;
    if amount > state.current_amount {
        return Err(Error::InsufficientFunds);
    }

    record.funded_amount = 0;
    record.refunded = true;
    state.refund_pool = Some(pool);
    state.current_amount -= amount;

    save_funder(env, project_id, &funder, &record);
    save_project_state(env, project_id, &state);
    pay_out(env, &funder, amount)?;

    events::emit_development_refund(env, project_id, funder, amount);
    Ok(amount)
}
