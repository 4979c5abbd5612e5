use {
  crate::Amount,
  serde::{Deserialize, Serialize},
};

/// Basis points denominator used by [`FeePolicy::Bps`].
pub const BPS_DENOMINATOR: Amount = 10_000;

/// How a lending pool prices a flash loan.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeePolicy {
  /// The same fee regardless of the borrowed amount.
  Fixed(Amount),

  /// `amount * rate / 10_000`, rounded down.
  Bps(u32),
}

impl FeePolicy {
  /// Computes the fee for a loan of `amount`.
  ///
  /// Returns `None` if the computation overflows.
  pub fn fee(&self, amount: Amount) -> Option<Amount> {
    match self {
      FeePolicy::Fixed(fee) => Some(*fee),
      FeePolicy::Bps(rate) => amount
        .checked_mul(Amount::from(*rate))
        .map(|v| v / BPS_DENOMINATOR),
    }
  }
}

impl Default for FeePolicy {
  fn default() -> Self {
    FeePolicy::Fixed(0)
  }
}

/// Whose authority a pool grants to inline flash-loan callbacks.
#[derive(
  Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum CallbackContext {
  /// Callbacks run as the receiver of the loan, and only the receiver
  /// itself may supply inline callback actions.
  #[default]
  Receiver,

  /// Callbacks run as the pool itself, anyone may supply them.
  ///
  /// This reproduces lending pools that perform an arbitrary call
  /// requested by the borrower from their own context.
  Pool,
}
