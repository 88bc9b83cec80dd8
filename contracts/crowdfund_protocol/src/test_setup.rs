extern crate std;

use soroban_sdk::{
    testutils::{Address as _, Ledger},
    token, Address, Env, String,
};

use crate::{CrowdfundProtocol, CrowdfundProtocolClient};

pub const START: u64 = 1_000;
pub const VOTING_PERIOD: u64 = 300;
pub const REWORK_PERIOD: u64 = 200;
pub const THRESHOLD_BPS: u32 = 5_000;
pub const FUNDING_PERIOD: u64 = 600;

pub struct TestContext {
    pub env: Env,
    pub client: CrowdfundProtocolClient<'static>,
    pub admin: Address,
    pub token: token::Client<'static>,
    pub token_sac: token::StellarAssetClient<'static>,
}

pub fn setup() -> TestContext {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(START);

    let contract_id = env.register(CrowdfundProtocol, ());
    let client = CrowdfundProtocolClient::new(&env, &contract_id);

    let admin = Address::generate(&env);
    let issuer = Address::generate(&env);
    let asset = env.register_stellar_asset_contract_v2(issuer);
    let token = token::Client::new(&env, &asset.address());
    let token_sac = token::StellarAssetClient::new(&env, &asset.address());

    client.init(
        &admin,
        &asset.address(),
        &VOTING_PERIOD,
        &REWORK_PERIOD,
        &THRESHOLD_BPS,
    );

    TestContext {
        env,
        client,
        admin,
        token,
        token_sac,
    }
}

impl TestContext {
    pub fn now(&self) -> u64 {
        self.env.ledger().timestamp()
    }

    pub fn advance(&self, seconds: u64) {
        self.env.ledger().set_timestamp(self.now() + seconds);
    }

    pub fn set_time(&self, timestamp: u64) {
        self.env.ledger().set_timestamp(timestamp);
    }

    pub fn text(&self, s: &str) -> String {
        String::from_str(&self.env, s)
    }

    /// A fresh address holding `balance` of the funding token.
    pub fn account(&self, balance: i128) -> Address {
        let address = Address::generate(&self.env);
        if balance > 0 {
            self.token_sac.mint(&address, &balance);
        }
        address
    }

    /// Create a project and return `(project_id, creator)`.
    pub fn project(&self, goal: i128, period: u64) -> (u64, Address) {
        let creator = Address::generate(&self.env);
        let project = self.client.create_project(&creator, &goal, &period);
        (project.id, creator)
    }

    /// Create a project, fund it from new accounts, and return
    /// `(project_id, creator, funders)` with the clock still inside the window.
    pub fn funded_project(&self, goal: i128, amounts: &[i128]) -> (u64, Address, std::vec::Vec<Address>) {
        let (id, creator) = self.project(goal, FUNDING_PERIOD);
        let funders = amounts
            .iter()
            .map(|amount| {
                let funder = self.account(*amount);
                self.client.fund(&id, &funder, amount);
                funder
            })
            .collect();
        (id, creator, funders)
    }

    /// Jump to the end of the funding window of `project_id`.
    pub fn close_funding(&self, project_id: u64) {
        let project = self.client.get_project(&project_id);
        self.set_time(project.end_time);
    }

    /// Funded, closed project with phase 0 proposed for `withdraw`.
    pub fn developing_project(
        &self,
        goal: i128,
        amounts: &[i128],
        withdraw: i128,
    ) -> (u64, Address, std::vec::Vec<Address>) {
        let (id, creator, funders) = self.funded_project(goal, amounts);
        self.close_funding(id);
        self.client
            .phase_proposal(&id, &creator, &withdraw, &self.text("phase 0"));
        (id, creator, funders)
    }

    /// Move past the proposal round of `phase_id`.
    pub fn close_proposal(&self, project_id: u64, phase_id: u32) {
        let phase = self.client.get_phase(&project_id, &phase_id);
        self.set_time(phase.proposal.end_time);
    }

    pub fn balance(&self, address: &Address) -> i128 {
        self.token.balance(address)
    }
}
