mod action;
mod address;
mod asset;
mod b58;
mod pool;
mod timelock;
mod transaction;

pub use {
  action::{Action, Callback, Operation},
  address::Address,
  asset::{Amount, Asset, UNLIMITED_ALLOWANCE},
  b58::ToBase58String,
  pool::{CallbackContext, FeePolicy, BPS_DENOMINATOR},
  timelock::{OperationId, OperationState, Proposal, Role},
  transaction::Transaction,
};
