use {
  crate::Address,
  serde::{Deserialize, Serialize},
  std::fmt::Display,
};

/// Quantity of an asset. Balances and allowances never go negative
/// and never wrap, every arithmetic on amounts is checked.
pub type Amount = u128;

/// Allowance value that is never decremented by `TransferFrom`.
pub const UNLIMITED_ALLOWANCE: Amount = Amount::MAX;

/// A fungible asset tracked by the ledger.
#[derive(
  Debug,
  Copy,
  Clone,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
)]
pub enum Asset {
  /// The native currency of the simulated chain.
  Native,

  /// A token identified by the address of its definition.
  Token(Address),
}

impl Display for Asset {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Asset::Native => write!(f, "native"),
      Asset::Token(addr) => write!(f, "token({addr})"),
    }
  }
}
