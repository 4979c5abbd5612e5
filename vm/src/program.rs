use {
  crate::{execution::Context, flashloan::FlashLoan, Error},
  defisim_primitives::Address,
};

/// Scenario logic deployed at an address.
///
/// Programs stand in for the player and victim contracts of a
/// scenario. They run in a frame whose principal is their own
/// address, so actions they submit through the context carry their
/// authority. Programs hold no state of their own, everything they
/// need to remember goes through the ledger.
pub trait Program {
  /// Handles `Operation::Call` addressed to this program.
  fn call(
    &self,
    ctx: &mut Context<'_>,
    caller: Address,
    payload: &[u8],
  ) -> Result<(), Error>;

  /// Handles a flash loan received with `Callback::Program`.
  ///
  /// The loaned funds are already credited when this runs. Programs
  /// that do not lend themselves to flash loans keep the default,
  /// which does nothing and therefore never repays.
  fn on_flash_loan(
    &self,
    ctx: &mut Context<'_>,
    loan: &FlashLoan,
  ) -> Result<(), Error> {
    let _ = (ctx, loan);
    Ok(())
  }
}
