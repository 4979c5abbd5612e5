use {
  crate::{
    execution::{Context, Error, Event},
    Overlay,
  },
  defisim_primitives::{Address, Amount, Asset, UNLIMITED_ALLOWANCE},
};

impl Overlay<'_> {
  /// Adds `amount` to an account balance, failing instead of wrapping.
  pub fn credit(
    &mut self,
    account: &Address,
    asset: &Asset,
    amount: Amount,
  ) -> Result<(), Error> {
    let balance = self
      .balance(account, asset)
      .checked_add(amount)
      .ok_or(Error::BalanceOverflow {
        account: *account,
        asset: *asset,
        amount,
      })?;
    self.diff_mut().set_balance(*account, *asset, balance);
    Ok(())
  }

  /// Moves funds between two accounts. Both sides are checked before
  /// either balance is written.
  pub fn transfer(
    &mut self,
    from: &Address,
    to: &Address,
    asset: &Asset,
    amount: Amount,
  ) -> Result<(), Error> {
    let available = self.balance(from, asset);
    let debited =
      available
        .checked_sub(amount)
        .ok_or(Error::InsufficientBalance {
          account: *from,
          asset: *asset,
          available,
          required: amount,
        })?;

    if from == to {
      return Ok(());
    }

    let credited = self
      .balance(to, asset)
      .checked_add(amount)
      .ok_or(Error::BalanceOverflow {
        account: *to,
        asset: *asset,
        amount,
      })?;

    let diff = self.diff_mut();
    diff.set_balance(*from, *asset, debited);
    diff.set_balance(*to, *asset, credited);
    Ok(())
  }
}

/// Ledger operations reachable from actions.
impl Context<'_> {
  pub(crate) fn transfer(
    &mut self,
    from: &Address,
    to: &Address,
    asset: &Asset,
    amount: Amount,
  ) -> Result<(), Error> {
    self.overlay.transfer(from, to, asset, amount)?;
    self.events.push(Event::Transfer {
      asset: *asset,
      from: *from,
      to: *to,
      amount,
    });
    Ok(())
  }

  pub(crate) fn approve(
    &mut self,
    owner: &Address,
    spender: &Address,
    asset: &Asset,
    amount: Amount,
  ) -> Result<(), Error> {
    self
      .overlay
      .diff_mut()
      .set_allowance(*owner, *spender, *asset, amount);
    self.events.push(Event::Approval {
      asset: *asset,
      owner: *owner,
      spender: *spender,
      amount,
    });
    Ok(())
  }

  /// Moves funds on behalf of `owner`.
  ///
  /// The allowance is checked before the balance, and is consumed
  /// only when the transfer goes through, unless it is unlimited.
  pub(crate) fn transfer_from(
    &mut self,
    spender: &Address,
    owner: &Address,
    to: &Address,
    asset: &Asset,
    amount: Amount,
  ) -> Result<(), Error> {
    let allowance = self.overlay.allowance(owner, spender, asset);
    if allowance < amount {
      return Err(Error::InsufficientAllowance {
        owner: *owner,
        spender: *spender,
        asset: *asset,
        available: allowance,
        required: amount,
      });
    }

    self.transfer(owner, to, asset, amount)?;

    if allowance != UNLIMITED_ALLOWANCE {
      self.overlay.diff_mut().set_allowance(
        *owner,
        *spender,
        *asset,
        allowance - amount,
      );
    }
    Ok(())
  }
}
