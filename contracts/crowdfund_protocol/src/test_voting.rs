extern crate std;

use soroban_sdk::{testutils::Address as _, Address};

use crate::invariants::assert_tally_within_total;
use crate::test_setup::{setup, REWORK_PERIOD};
use crate::{Error, ErrorKind, PhaseStatus, Tally, VoteType};

#[test]
fn test_vote_adds_weight_once() {
    let ctx = setup();
    let (id, _, funders) = ctx.developing_project(1_000, &[600, 400], 100);

    ctx.client.vote(&id, &funders[0], &VoteType::For);
    ctx.client.vote(&id, &funders[1], &VoteType::Abstain);

    let tally = ctx.client.get_tally(&id, &0, &false);
    assert_eq!(
        tally,
        Tally {
            abstain: 400,
            in_favor: 600,
            against: 0,
        }
    );
    assert_tally_within_total(&ctx.client.get_project(&id), &tally);

    assert_eq!(
        ctx.client.try_vote(&id, &funders[0], &VoteType::Abstain),
        Err(Ok(Error::AlreadyVoted))
    );
    assert_eq!(
        ctx.client.try_against(&id, &funders[0], &ctx.text("changed my mind")),
        Err(Ok(Error::AlreadyVoted))
    );
    assert_eq!(Error::AlreadyVoted.kind(), ErrorKind::State);
}

#[test]
fn test_voter_record_stored() {
    let ctx = setup();
    let (id, _, funders) = ctx.developing_project(1_000, &[1_000], 100);
    assert_eq!(ctx.client.get_voter(&id, &0, &false, &funders[0]), None);

    ctx.client.vote(&id, &funders[0], &VoteType::For);
    let record = ctx.client.get_voter(&id, &0, &false, &funders[0]).unwrap();
    assert!(record.voted);
    assert_eq!(record.vote_type, VoteType::For);
    assert_eq!(record.delegatee, None);
    assert_eq!(record.weight, 1_000);
}

#[test]
fn test_vote_type_must_be_direct_choice() {
    let ctx = setup();
    let (id, _, funders) = ctx.developing_project(1_000, &[1_000], 100);
    assert_eq!(
        ctx.client.try_vote(&id, &funders[0], &VoteType::Against),
        Err(Ok(Error::InvalidVoteType))
    );
    assert_eq!(
        ctx.client.try_vote(&id, &funders[0], &VoteType::Delegate),
        Err(Ok(Error::InvalidVoteType))
    );
}

#[test]
fn test_non_funder_cannot_vote() {
    let ctx = setup();
    let (id, creator, _) = ctx.developing_project(1_000, &[1_000], 100);
    let stranger = Address::generate(&ctx.env);
    assert_eq!(
        ctx.client.try_vote(&id, &stranger, &VoteType::For),
        Err(Ok(Error::NotFunder))
    );
    assert_eq!(
        ctx.client.try_vote(&id, &creator, &VoteType::For),
        Err(Ok(Error::NotFunder))
    );
    assert_eq!(
        ctx.client.try_delegate(&id, &stranger, &creator),
        Err(Ok(Error::NotFunder))
    );
}

#[test]
fn test_voting_window_is_closed_open() {
    let ctx = setup();
    let (id, _, funders) = ctx.developing_project(1_000, &[500, 500], 100);
    let phase = ctx.client.get_phase(&id, &0);

    ctx.set_time(phase.proposal.end_time - 1);
    ctx.client.vote(&id, &funders[0], &VoteType::For);

    ctx.set_time(phase.proposal.end_time);
    assert_eq!(
        ctx.client.try_vote(&id, &funders[1], &VoteType::For),
        Err(Ok(Error::VotingClosed))
    );
}

#[test]
fn test_voting_before_any_phase() {
    let ctx = setup();
    let (id, _, funders) = ctx.funded_project(1_000, &[1_000]);
    assert_eq!(
        ctx.client.try_vote(&id, &funders[0], &VoteType::For),
        Err(Ok(Error::VotingClosed))
    );
}

#[test]
fn test_against_records_improvements_in_order() {
    let ctx = setup();
    let (id, _, funders) = ctx.developing_project(1_000, &[300, 300, 400], 100);
    ctx.client.against(&id, &funders[0], &ctx.text("add milestones"));
    ctx.client.against(&id, &funders[1], &ctx.text(""));
    ctx.client.against(&id, &funders[2], &ctx.text("lower the ask"));

    let proposal = ctx.client.get_proposal(&id, &0, &false);
    assert_eq!(proposal.votes.against, 1_000);
    assert_eq!(proposal.improvements.len(), 3);
    assert_eq!(proposal.improvements.get(0).unwrap(), ctx.text("add milestones"));
    assert_eq!(proposal.improvements.get(1).unwrap(), ctx.text(""));
    assert_eq!(proposal.improvements.get(2).unwrap(), ctx.text("lower the ask"));
}

#[test]
fn test_rework_round_has_its_own_ballots() {
    let ctx = setup();
    let (id, creator, funders) = ctx.developing_project(1_000, &[1_000], 100);
    ctx.client.against(&id, &funders[0], &ctx.text("no"));
    ctx.close_proposal(id, 0);

    assert_eq!(
        ctx.client.try_vote(&id, &funders[0], &VoteType::For),
        Err(Ok(Error::VotingClosed))
    );

    ctx.client.rework_proposal(&id, &creator, &ctx.text("v2"), &None);
    ctx.client.against(&id, &funders[0], &ctx.text("still no"));

    let rework = ctx.client.get_proposal(&id, &0, &true);
    assert_eq!(rework.votes.against, 1_000);
    assert_eq!(rework.improvements.get(0).unwrap(), ctx.text("still no"));
    assert_eq!(ctx.client.get_proposal(&id, &0, &false).improvements.len(), 1);
    assert!(ctx.client.get_voter(&id, &0, &true, &funders[0]).is_some());
}

#[test]
fn test_delegation_resolves_to_terminal_vote() {
    let ctx = setup();
    let (id, _, funders) = ctx.developing_project(1_000, &[600, 400], 100);

    ctx.client.delegate(&id, &funders[1], &funders[0]);
    let record = ctx.client.get_voter(&id, &0, &false, &funders[1]).unwrap();
    assert_eq!(record.vote_type, VoteType::Delegate);
    assert_eq!(record.delegatee, Some(funders[0].clone()));

    // Not tallied until the delegatee votes.
    assert_eq!(ctx.client.get_tally(&id, &0, &false).total(), 0);

    ctx.client.vote(&id, &funders[0], &VoteType::For);
    let tally = ctx.client.get_tally(&id, &0, &false);
    assert_eq!(tally.in_favor, 1_000);
    assert_tally_within_total(&ctx.client.get_project(&id), &tally);

    // The stored round carries the same totals.
    assert_eq!(ctx.client.get_proposal(&id, &0, &false).votes, tally);
}

#[test]
fn test_delegation_chain_follows_every_hop() {
    let ctx = setup();
    let (id, _, f) = ctx.developing_project(1_000, &[100, 200, 300, 400], 100);

    ctx.client.delegate(&id, &f[0], &f[1]);
    ctx.client.delegate(&id, &f[1], &f[2]);
    ctx.client.against(&id, &f[2], &ctx.text("scope creep"));
    ctx.client.vote(&id, &f[3], &VoteType::For);

    let tally = ctx.client.get_tally(&id, &0, &false);
    assert_eq!(tally.against, 600);
    assert_eq!(tally.in_favor, 400);
    assert_eq!(tally.total(), 1_000);

    ctx.close_proposal(id, 0);
    assert_eq!(ctx.client.phase_status(&id, &0), PhaseStatus::AwaitingRework);
}

#[test]
fn test_dangling_delegation_counts_nothing() {
    let ctx = setup();
    let (id, _, funders) = ctx.developing_project(1_000, &[600, 400], 100);
    let outsider = Address::generate(&ctx.env);

    ctx.client.delegate(&id, &funders[0], &outsider);
    ctx.client.vote(&id, &funders[1], &VoteType::For);
    ctx.close_proposal(id, 0);

    let tally = ctx.client.get_tally(&id, &0, &false);
    assert_eq!(tally.in_favor, 400);
    assert_eq!(tally.total(), 400);
    assert_eq!(ctx.client.phase_status(&id, &0), PhaseStatus::AwaitingRework);
}

#[test]
fn test_delegation_cycles_rejected() {
    let ctx = setup();
    let (id, _, f) = ctx.developing_project(1_000, &[250, 250, 250, 250], 100);

    assert_eq!(
        ctx.client.try_delegate(&id, &f[0], &f[0]),
        Err(Ok(Error::DelegationCycle))
    );

    ctx.client.delegate(&id, &f[0], &f[1]);
    ctx.client.delegate(&id, &f[1], &f[2]);
    assert_eq!(
        ctx.client.try_delegate(&id, &f[2], &f[0]),
        Err(Ok(Error::DelegationCycle))
    );
    assert_eq!(Error::DelegationCycle.kind(), ErrorKind::State);

    // f[2] is still free to vote or delegate elsewhere.
    ctx.client.delegate(&id, &f[2], &f[3]);
    ctx.client.vote(&id, &f[3], &VoteType::For);
    assert_eq!(ctx.client.get_tally(&id, &0, &false).in_favor, 1_000);
}

#[test]
fn test_cannot_vote_after_delegating() {
    let ctx = setup();
    let (id, _, funders) = ctx.developing_project(1_000, &[600, 400], 100);
    ctx.client.delegate(&id, &funders[1], &funders[0]);
    assert_eq!(
        ctx.client.try_vote(&id, &funders[1], &VoteType::For),
        Err(Ok(Error::AlreadyVoted))
    );
    assert_eq!(
        ctx.client.try_delegate(&id, &funders[1], &funders[0]),
        Err(Ok(Error::AlreadyVoted))
    );
}

#[test]
fn test_delegation_in_rework_round() {
    let ctx = setup();
    let (id, creator, funders) = ctx.developing_project(1_000, &[300, 700], 100);
    ctx.client.delegate(&id, &funders[1], &funders[0]);
    ctx.client.against(&id, &funders[0], &ctx.text("no"));
    ctx.close_proposal(id, 0);
    assert_eq!(ctx.client.get_tally(&id, &0, &false).against, 1_000);

    ctx.client.rework_proposal(&id, &creator, &ctx.text("v2"), &None);
    ctx.client.delegate(&id, &funders[0], &funders[1]);
    ctx.client.vote(&id, &funders[1], &VoteType::For);
    ctx.advance(REWORK_PERIOD);

    assert_eq!(ctx.client.get_tally(&id, &0, &true).in_favor, 1_000);
    assert_eq!(ctx.client.phase_status(&id, &0), PhaseStatus::Passed);
}

#[test]
fn test_closed_round_tally_is_stable_after_refunds() {
    let ctx = setup();
    let (id, _, funders) = ctx.developing_project(1_000, &[600, 400], 100);
    ctx.client.delegate(&id, &funders[1], &funders[0]);
    ctx.client.against(&id, &funders[0], &ctx.text("no"));
    ctx.close_proposal(id, 0);
    ctx.advance(REWORK_PERIOD);
    assert_eq!(ctx.client.phase_status(&id, &0), PhaseStatus::Terminated);

    let before = ctx.client.get_tally(&id, &0, &false);
    ctx.client.development_refund(&id, &funders[0]);
    ctx.client.development_refund(&id, &funders[1]);
    assert_eq!(ctx.client.get_tally(&id, &0, &false), before);
    assert_eq!(ctx.client.phase_status(&id, &0), PhaseStatus::Terminated);
}

#[test]
fn test_delegation_to_cast_ballot_counts_at_once() {
    let ctx = setup();
    let (id, _, f) = ctx.developing_project(1_000, &[500, 300, 200], 100);

    ctx.client.vote(&id, &f[0], &VoteType::Against);
    ctx.client.delegate(&id, &f[1], &f[0]);
    assert_eq!(ctx.client.get_proposal(&id, &0, &false).votes.against, 800);

    // Joins the chain halfway and still lands on f[0]'s ballot.
    ctx.client.delegate(&id, &f[2], &f[1]);
    let tally = ctx.client.get_tally(&id, &0, &false);
    assert_eq!(tally.against, 1_000);
    assert_eq!(tally.total(), 1_000);
}

#[test]
fn test_long_delegation_chain_still_claimable() {
    let ctx = setup();
    let amounts = [10i128; 120];
    let (id, creator, f) = ctx.developing_project(1_200, &amounts, 300);

    for i in 0..f.len() - 1 {
        ctx.client.delegate(&id, &f[i], &f[i + 1]);
    }
    ctx.client.vote(&id, &f[f.len() - 1], &VoteType::For);
    ctx.close_proposal(id, 0);

    ctx.env.cost_estimate().budget().reset_default();
    assert_eq!(ctx.client.try_claim_funds(&id, &creator), Ok(Ok(300)));
    assert_eq!(ctx.client.get_tally(&id, &0, &false).in_favor, 1_200);
}

#[test]
fn test_chain_built_back_to_front() {
    let ctx = setup();
    let amounts = [10i128; 120];
    let (id, creator, f) = ctx.developing_project(1_200, &amounts, 300);

    ctx.client.vote(&id, &f[f.len() - 1], &VoteType::For);
    for i in (0..f.len() - 1).rev() {
        ctx.client.delegate(&id, &f[i], &f[i + 1]);
    }
    assert_eq!(ctx.client.get_tally(&id, &0, &false).in_favor, 1_200);

    ctx.close_proposal(id, 0);
    ctx.env.cost_estimate().budget().reset_default();
    assert_eq!(ctx.client.try_claim_funds(&id, &creator), Ok(Ok(300)));
}
