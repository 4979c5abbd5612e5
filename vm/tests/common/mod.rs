#![allow(dead_code)]

pub mod programs;

use {
  defisim_primitives::{
    Action,
    Address,
    Amount,
    Asset,
    CallbackContext,
    FeePolicy,
    Operation,
    Transaction,
  },
  defisim_vm::Simulator,
};

/// Initial liquidity of the lending pool in every scenario.
pub const POOL_LIQUIDITY: Amount = 1_000_000;

/// A simulator with one token, a funded lending pool for it and a
/// player account that holds nothing.
pub struct LendingSetup {
  pub sim: Simulator,
  pub token: Asset,
  pub pool: Address,
  pub player: Address,
}

pub fn lending_setup(
  fee: FeePolicy,
  callback_context: CallbackContext,
) -> LendingSetup {
  let mut sim = Simulator::default();
  let token = sim.create_token();
  let pool = sim.deploy_pool(token, fee, callback_context);
  let player = sim.new_account();
  sim
    .mint(&pool, &token, POOL_LIQUIDITY)
    .expect("fresh pool cannot overflow");
  LendingSetup {
    sim,
    token,
    pool,
    player,
  }
}

pub fn single(origin: Address, operation: Operation) -> Transaction {
  Transaction::new(vec![Action::new(origin, operation)])
}

pub fn transfer(
  origin: Address,
  asset: Asset,
  to: Address,
  amount: Amount,
) -> Action {
  Action::new(origin, Operation::Transfer { asset, to, amount })
}
