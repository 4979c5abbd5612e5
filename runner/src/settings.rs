use {
  clap::{Parser, ValueEnum},
  defisim_primitives::Amount,
  defisim_vm::Config,
  humantime::Duration,
};

/// DeFi Simulator
///
/// Replays flash loan and governance scenarios against a
/// deterministic in-memory ledger and reports their outcome.
#[derive(Debug, Parser)]
pub struct Settings {
  /// Scenario to replay
  #[clap(long, short,
    value_enum,
    default_value = "all",
    value_name = "SCENARIO")]
  scenario: Scenario,

  /// Maximum number of nested call frames per transaction
  #[clap(long, short = 'd',
    default_value = "64",
    value_name = "FRAMES")]
  max_call_depth: usize,

  /// Minimum delay between scheduling and executing a proposal
  #[clap(long, short = 't',
    default_value = "1h",
    value_name = "DURATION")]
  delay: Duration,

  /// Token units each lending pool starts with
  #[clap(long, short,
    default_value = "1000000",
    value_name = "AMOUNT")]
  liquidity: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
  All,
  ZeroLoan,
  NaiveReceiver,
  Truster,
  SideEntrance,
  Timelock,
  Climber,
}

impl Settings {
  pub fn scenarios(&self) -> Vec<Scenario> {
    match self.scenario {
      Scenario::All => vec![
        Scenario::ZeroLoan,
        Scenario::NaiveReceiver,
        Scenario::Truster,
        Scenario::SideEntrance,
        Scenario::Timelock,
        Scenario::Climber,
      ],
      one => vec![one],
    }
  }

  pub fn vm_config(&self) -> Config {
    Config {
      max_call_depth: self.max_call_depth,
    }
  }

  pub fn delay(&self) -> std::time::Duration {
    self.delay.into()
  }

  pub fn liquidity(&self) -> Amount {
    self.liquidity
  }
}
