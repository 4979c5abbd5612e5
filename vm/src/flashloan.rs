use {
  crate::execution::{Context, Error, Event},
  defisim_primitives::{Address, Amount, Asset, Callback, CallbackContext},
  tracing::debug,
};

/// Lifecycle of a single flash loan.
///
/// `Borrowed -> Repaid` on success, `Borrowed -> Defaulted` when the
/// callback fails or does not repay, which fails the whole transaction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoanStatus {
  Borrowed,
  Repaid,
  Defaulted,
}

/// A loan taken during a transaction. Lives exactly as long as the
/// transaction and is reported in its receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashLoan {
  pub pool: Address,
  pub asset: Asset,
  pub amount: Amount,
  pub fee: Amount,
  pub receiver: Address,
  pub initiator: Address,
  pub status: LoanStatus,
}

impl Context<'_> {
  /// How much a pool is able to lend right now.
  pub fn max_loanable(&self, pool: &Address) -> Result<Amount, Error> {
    let registry = self.env.registry;
    let config = registry.pool(pool)?;
    Ok(self.overlay.balance(pool, &config.asset))
  }

  /// Lends pool funds to `receiver` for the duration of the callback.
  ///
  /// The pool balance right before the loan plus the fee must be back
  /// in the pool once the callback returns. Repayment is measured on
  /// the pool balance only, so any path that ends up increasing it,
  /// including deposits, counts as repayment.
  ///
  /// Loans of zero units skip both the liquidity and the repayment
  /// checks and are never charged a fee.
  pub(crate) fn flash_loan(
    &mut self,
    initiator: Address,
    pool: &Address,
    amount: Amount,
    receiver: &Address,
    callback: &Callback,
  ) -> Result<(), Error> {
    let registry = self.env.registry;
    let config = registry.pool(pool)?;
    let asset = config.asset;

    let before = self.overlay.balance(pool, &asset);
    if amount != 0 && before < amount {
      return Err(Error::ExceedsAvailableLiquidity {
        pool: *pool,
        available: before,
        requested: amount,
      });
    }

    let fee = match amount {
      0 => 0,
      _ => config.fee.fee(amount).ok_or(Error::BalanceOverflow {
        account: *pool,
        asset,
        amount,
      })?,
    };

    let index = self.loans.len();
    self.loans.push(FlashLoan {
      pool: *pool,
      asset,
      amount,
      fee,
      receiver: *receiver,
      initiator,
      status: LoanStatus::Borrowed,
    });
    debug!("lending {amount} of {asset} from {pool} to {receiver}, fee {fee}");

    self.transfer(pool, receiver, &asset, amount)?;

    let principal = match (callback, config.callback_context) {
      (_, CallbackContext::Pool) => *pool,
      (Callback::Actions(_), CallbackContext::Receiver)
        if *receiver != initiator =>
      {
        self.loans[index].status = LoanStatus::Defaulted;
        return Err(Error::Unauthorized {
          principal: initiator,
          what: format!("run callback actions as {receiver}"),
        });
      }
      _ => *receiver,
    };

    let outcome = self.with_frame(principal, |ctx| match callback {
      Callback::None => Ok(()),
      Callback::Actions(actions) => {
        for action in actions {
          ctx.run(action)?;
        }
        Ok(())
      }
      Callback::Program => {
        let program = registry.program(receiver)?;
        let loan = ctx.loans[index].clone();
        program.on_flash_loan(ctx, &loan)
      }
    });

    if let Err(e) = outcome {
      self.loans[index].status = LoanStatus::Defaulted;
      return Err(e);
    }

    if amount != 0 {
      let after = self.overlay.balance(pool, &asset);
      let expected = before.checked_add(fee).ok_or(Error::BalanceOverflow {
        account: *pool,
        asset,
        amount: fee,
      })?;

      if after < expected {
        self.loans[index].status = LoanStatus::Defaulted;
        return Err(Error::RepaymentShortfall {
          pool: *pool,
          expected,
          actual: after,
        });
      }
    }

    self.loans[index].status = LoanStatus::Repaid;
    self.events.push(Event::LoanRepaid {
      pool: *pool,
      receiver: *receiver,
      amount,
      fee,
    });
    Ok(())
  }

  /// Moves pool funds from the sender into the pool and credits the
  /// sender's withdrawable deposit.
  pub(crate) fn deposit(
    &mut self,
    account: &Address,
    pool: &Address,
    amount: Amount,
  ) -> Result<(), Error> {
    let registry = self.env.registry;
    let asset = registry.pool(pool)?.asset;

    self.transfer(account, pool, &asset, amount)?;
    let deposited =
      self
        .overlay
        .deposit(pool, account)
        .checked_add(amount)
        .ok_or(Error::BalanceOverflow {
          account: *account,
          asset,
          amount,
        })?;
    self.overlay.diff_mut().set_deposit(*pool, *account, deposited);
    self.events.push(Event::Deposit {
      pool: *pool,
      account: *account,
      amount,
    });
    Ok(())
  }

  /// Pays out everything the sender deposited.
  pub(crate) fn withdraw(
    &mut self,
    account: &Address,
    pool: &Address,
  ) -> Result<(), Error> {
    let registry = self.env.registry;
    let asset = registry.pool(pool)?.asset;

    let amount = self.overlay.deposit(pool, account);
    self.overlay.diff_mut().set_deposit(*pool, *account, 0);
    self.transfer(pool, account, &asset, amount)?;
    self.events.push(Event::Withdrawal {
      pool: *pool,
      account: *account,
      amount,
    });
    Ok(())
  }
}
