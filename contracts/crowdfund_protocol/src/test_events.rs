extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, IntoVal, TryIntoVal, Val, Vec,
};

use crate::events::{
    FundingReduced, FundsClaimed, PeriodsUpdated, PhaseProposed, PhaseReworked, ProjectCreated,
    ProjectFunded, Refunded, VoteCast, VoteDelegated,
};
use crate::test_setup::{setup, TestContext, FUNDING_PERIOD, REWORK_PERIOD, START, VOTING_PERIOD};
use crate::{Round, VoteType};

/// Topics and data of the most recent event, asserting it came from the protocol.
fn last_event(ctx: &TestContext) -> (Vec<Val>, Val) {
    let all_events = ctx.env.events().all();
    let last_event = all_events.last().expect("No events found");
    assert_eq!(last_event.0, ctx.client.address);
    (last_event.1, last_event.2)
}

#[test]
fn test_project_created_event() {
    let ctx = setup();
    let creator = Address::generate(&ctx.env);
    let project = ctx.client.create_project(&creator, &5_000, &FUNDING_PERIOD);

    let (topics, data) = last_event(&ctx);

    // Topic: (symbol_short!("created"), project_id)
    let expected_topics = vec![
        &ctx.env,
        symbol_short!("created").into_val(&ctx.env),
        project.id.into_val(&ctx.env),
    ];
    assert_eq!(topics, expected_topics);

    let event_data: ProjectCreated = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(
        event_data,
        ProjectCreated {
            project_id: project.id,
            creator,
            goal: 5_000,
            end_time: START + FUNDING_PERIOD,
        }
    );
}

#[test]
fn test_project_funded_event() {
    let ctx = setup();
    let (id, _) = ctx.project(10_000, FUNDING_PERIOD);
    let funder = ctx.account(1_000);
    ctx.client.fund(&id, &funder, &1_000);

    let (topics, data) = last_event(&ctx);
    let expected_topics = vec![
        &ctx.env,
        symbol_short!("funded").into_val(&ctx.env),
        id.into_val(&ctx.env),
    ];
    assert_eq!(topics, expected_topics);

    let event_data: ProjectFunded = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(
        event_data,
        ProjectFunded {
            project_id: id,
            funder,
            amount: 1_000,
        }
    );
}

#[test]
fn test_funding_reduced_event() {
    let ctx = setup();
    let (id, _, funders) = ctx.funded_project(1_000, &[400]);
    ctx.client.reduce_funding(&id, &funders[0], &150);

    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![
            &ctx.env,
            symbol_short!("reduced").into_val(&ctx.env),
            id.into_val(&ctx.env),
        ]
    );
    let event_data: FundingReduced = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(event_data.funder, funders[0]);
    assert_eq!(event_data.amount, 150);
}

#[test]
fn test_phase_proposed_and_reworked_events() {
    let ctx = setup();
    let (id, creator, funders) = ctx.developing_project(1_000, &[1_000], 250);
    let proposal_end = ctx.now() + VOTING_PERIOD;

    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![
            &ctx.env,
            symbol_short!("proposed").into_val(&ctx.env),
            id.into_val(&ctx.env),
        ]
    );
    let proposed: PhaseProposed = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(
        proposed,
        PhaseProposed {
            project_id: id,
            phase_id: 0,
            amount: 250,
            end_time: proposal_end,
        }
    );

    ctx.client.against(&id, &funders[0], &ctx.text("too much"));
    ctx.close_proposal(id, 0);
    ctx.client
        .rework_proposal(&id, &creator, &ctx.text("smaller"), &Some(200));

    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![
            &ctx.env,
            symbol_short!("reworked").into_val(&ctx.env),
            id.into_val(&ctx.env),
        ]
    );
    let reworked: PhaseReworked = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(
        reworked,
        PhaseReworked {
            project_id: id,
            phase_id: 0,
            amount: 200,
            end_time: proposal_end + REWORK_PERIOD,
        }
    );
}

#[test]
fn test_vote_events_carry_weight() {
    let ctx = setup();
    let (id, _, funders) = ctx.developing_project(1_000, &[700, 300], 100);

    ctx.client.delegate(&id, &funders[1], &funders[0]);
    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![
            &ctx.env,
            symbol_short!("delegate").into_val(&ctx.env),
            id.into_val(&ctx.env),
        ]
    );
    let delegated: VoteDelegated = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(
        delegated,
        VoteDelegated {
            project_id: id,
            phase_id: 0,
            round: Round::Proposal,
            voter: funders[1].clone(),
            delegatee: funders[0].clone(),
            weight: 300,
        }
    );

    ctx.client.vote(&id, &funders[0], &VoteType::For);
    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![
            &ctx.env,
            symbol_short!("voted").into_val(&ctx.env),
            id.into_val(&ctx.env),
        ]
    );
    let cast: VoteCast = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(
        cast,
        VoteCast {
            project_id: id,
            phase_id: 0,
            round: Round::Proposal,
            voter: funders[0].clone(),
            vote_type: VoteType::For,
            weight: 700,
        }
    );
}

#[test]
fn test_funds_claimed_event() {
    let ctx = setup();
    let (id, creator, funders) = ctx.developing_project(1_000, &[1_000], 400);
    ctx.client.vote(&id, &funders[0], &VoteType::For);
    ctx.close_proposal(id, 0);
    ctx.client.claim_funds(&id, &creator);

    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![
            &ctx.env,
            symbol_short!("claimed").into_val(&ctx.env),
            id.into_val(&ctx.env),
        ]
    );
    let claimed: FundsClaimed = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(
        claimed,
        FundsClaimed {
            project_id: id,
            phase_id: 0,
            creator,
            amount: 400,
        }
    );
}

#[test]
fn test_refund_events_are_distinguished() {
    let ctx = setup();
    let (failed, _, funders) = ctx.funded_project(1_000, &[300]);
    ctx.close_funding(failed);
    ctx.client.funding_refund(&failed, &funders[0]);

    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![
            &ctx.env,
            symbol_short!("f_refund").into_val(&ctx.env),
            failed.into_val(&ctx.env),
        ]
    );
    let refunded: Refunded = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(refunded.amount, 300);

    let (id, _, funders) = ctx.developing_project(500, &[500], 100);
    ctx.close_proposal(id, 0);
    ctx.advance(REWORK_PERIOD);
    ctx.client.development_refund(&id, &funders[0]);

    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![
            &ctx.env,
            symbol_short!("d_refund").into_val(&ctx.env),
            id.into_val(&ctx.env),
        ]
    );
    let refunded: Refunded = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(
        refunded,
        Refunded {
            project_id: id,
            funder: funders[0].clone(),
            amount: 500,
        }
    );
}

#[test]
fn test_admin_events() {
    let ctx = setup();
    ctx.client.set_periods(&ctx.admin, &90, &45);

    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![&ctx.env, symbol_short!("periods").into_val(&ctx.env)]
    );
    let updated: PeriodsUpdated = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(
        updated,
        PeriodsUpdated {
            voting_period: 90,
            rework_period: 45,
        }
    );

    ctx.client.set_threshold(&ctx.admin, &7_500);
    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![&ctx.env, symbol_short!("threshold").into_val(&ctx.env)]
    );
    let bps: u32 = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(bps, 7_500);

    let next = Address::generate(&ctx.env);
    ctx.client.transfer_admin(&ctx.admin, &next);
    let (topics, data) = last_event(&ctx);
    assert_eq!(
        topics,
        vec![&ctx.env, symbol_short!("admin").into_val(&ctx.env)]
    );
    let (previous, admin): (Address, Address) = data.try_into_val(&ctx.env).unwrap();
    assert_eq!(previous, ctx.admin);
    assert_eq!(admin, next);
}

#[test]
fn test_failed_call_publishes_nothing() {
    let ctx = setup();
    let (id, _, funders) = ctx.funded_project(1_000, &[100]);
    let before = ctx.env.events().all().len();
    assert!(ctx.client.try_fund(&id, &funders[0], &0).is_err());
    // A rolled-back invocation leaves no events behind.
    assert!(ctx.env.events().all().len() <= before);
}
