mod config;
mod execution;
mod flashloan;
mod ledger;
mod program;
mod registry;
mod runtime;
mod state;
mod timelock;

pub use {
  config::Config,
  execution::{execute, Context, Environment, Error, Event, Receipt},
  flashloan::{FlashLoan, LoanStatus},
  program::Program,
  registry::{PoolConfig, Registry},
  runtime::Simulator,
  state::{InMemoryStateStore, Overlay, State, StateDiff},
};
