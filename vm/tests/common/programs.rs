use {
  defisim_primitives::{Address, Operation},
  defisim_vm::{Context, Error, FlashLoan, Program},
  rmp_serde::from_slice,
};

/// A flash loan receiver that always pays back principal and fee
/// from its own balance, without checking who asked for the loan.
pub struct NaiveReceiver;

impl Program for NaiveReceiver {
  fn call(
    &self,
    _ctx: &mut Context<'_>,
    _caller: Address,
    _payload: &[u8],
  ) -> Result<(), Error> {
    Ok(())
  }

  fn on_flash_loan(
    &self,
    ctx: &mut Context<'_>,
    loan: &FlashLoan,
  ) -> Result<(), Error> {
    ctx.invoke(Operation::Transfer {
      asset: loan.asset,
      to: loan.pool,
      amount: loan.amount.saturating_add(loan.fee),
    })
  }
}

/// Calls itself until the call stack gives up.
pub struct Recursive;

impl Program for Recursive {
  fn call(
    &self,
    ctx: &mut Context<'_>,
    _caller: Address,
    payload: &[u8],
  ) -> Result<(), Error> {
    let target = ctx.self_address();
    ctx.invoke(Operation::Call {
      target,
      payload: payload.to_vec(),
    })
  }
}

/// Forwards a msgpack encoded operation, running it as itself.
pub struct Forwarder;

impl Program for Forwarder {
  fn call(
    &self,
    ctx: &mut Context<'_>,
    _caller: Address,
    payload: &[u8],
  ) -> Result<(), Error> {
    let operation: Operation =
      from_slice(payload).map_err(|e| Error::Program {
        program: ctx.self_address(),
        reason: e.to_string(),
      })?;
    ctx.invoke(operation)
  }
}

/// Runs a msgpack encoded list of operations as itself and ignores
/// whether any of them failed.
pub struct Reckless;

impl Program for Reckless {
  fn call(
    &self,
    ctx: &mut Context<'_>,
    _caller: Address,
    payload: &[u8],
  ) -> Result<(), Error> {
    let operations: Vec<Operation> =
      from_slice(payload).map_err(|e| Error::Program {
        program: ctx.self_address(),
        reason: e.to_string(),
      })?;
    for operation in operations {
      let _ = ctx.invoke(operation);
    }
    Ok(())
  }
}
