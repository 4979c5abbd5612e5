use {
  crate::execution::{Context, Error, Event},
  defisim_primitives::{
    Address,
    Asset,
    OperationId,
    OperationState,
    Proposal,
    Role,
  },
  tracing::info,
};

/// Timelock operations reachable from actions.
///
/// Every state check happens before any side effect. An operation
/// is marked executed before its payload runs, so a payload that
/// re-enters `execute` for its own id fails with `NotScheduled`.
impl Context<'_> {
  fn ensure_timelock(&self, timelock: &Address) -> Result<(), Error> {
    match self.env.registry.is_timelock(timelock) {
      true => Ok(()),
      false => Err(Error::UnknownTimelock(*timelock)),
    }
  }

  fn ensure_role(
    &self,
    timelock: &Address,
    role: Role,
    account: &Address,
  ) -> Result<(), Error> {
    match self.overlay.has_role(timelock, role, account) {
      true => Ok(()),
      false => Err(Error::Unauthorized {
        principal: *account,
        what: format!("act as {role:?} of timelock {timelock}"),
      }),
    }
  }

  pub(crate) fn schedule(
    &mut self,
    proposer: &Address,
    timelock: &Address,
    proposal: &Proposal,
  ) -> Result<(), Error> {
    self.ensure_timelock(timelock)?;
    self.ensure_role(timelock, Role::Proposer, proposer)?;

    let id = proposal.id();
    if self.overlay.operation(timelock, &id) != OperationState::Unset {
      return Err(Error::AlreadyScheduled(id));
    }

    let ready_at = self.now().saturating_add(self.overlay.delay(timelock));
    self.overlay.diff_mut().set_operation(
      *timelock,
      id,
      OperationState::Scheduled {
        ready_at,
        proposer: *proposer,
      },
    );
    self.events.push(Event::Scheduled {
      timelock: *timelock,
      id,
      ready_at,
    });
    Ok(())
  }

  pub(crate) fn execute_proposal(
    &mut self,
    caller: &Address,
    timelock: &Address,
    proposal: &Proposal,
  ) -> Result<(), Error> {
    self.ensure_timelock(timelock)?;

    let id = proposal.id();
    match self.overlay.operation(timelock, &id) {
      OperationState::Scheduled { ready_at, .. } if self.now() < ready_at => {
        return Err(Error::TooEarly {
          id,
          now: self.now(),
          ready_at,
        });
      }
      OperationState::Scheduled { .. } => {}
      _ => return Err(Error::NotScheduled(id)),
    }

    info!("{caller} executes operation {id} on timelock {timelock}");
    self
      .overlay
      .diff_mut()
      .set_operation(*timelock, id, OperationState::Executed);
    self.events.push(Event::Executed {
      timelock: *timelock,
      id,
    });

    if proposal.value != 0 {
      let value = proposal.value;
      self.transfer(timelock, &proposal.target, &Asset::Native, value)?;
    }

    self.with_frame(*timelock, |ctx| {
      for action in &proposal.payload {
        ctx.run(action)?;
      }
      Ok(())
    })
  }

  pub(crate) fn cancel(
    &mut self,
    caller: &Address,
    timelock: &Address,
    id: &OperationId,
  ) -> Result<(), Error> {
    self.ensure_timelock(timelock)?;
    self.ensure_role(timelock, Role::Proposer, caller)?;

    if !self.overlay.operation(timelock, id).is_scheduled() {
      return Err(Error::NotScheduled(*id));
    }

    self
      .overlay
      .diff_mut()
      .set_operation(*timelock, *id, OperationState::Unset);
    self.events.push(Event::Cancelled {
      timelock: *timelock,
      id: *id,
    });
    Ok(())
  }

  /// The delay may only change through an operation that the
  /// timelock itself executes, so every change waits out the
  /// current delay first.
  pub(crate) fn update_delay(
    &mut self,
    caller: &Address,
    timelock: &Address,
    delay: u64,
  ) -> Result<(), Error> {
    self.ensure_timelock(timelock)?;
    if caller != timelock {
      return Err(Error::CallerNotTimelock {
        caller: *caller,
        timelock: *timelock,
      });
    }
    self.ensure_role(timelock, Role::Admin, caller)?;

    self.overlay.diff_mut().set_delay(*timelock, delay);
    self.events.push(Event::DelayUpdated {
      timelock: *timelock,
      delay,
    });
    Ok(())
  }

  pub(crate) fn set_role(
    &mut self,
    caller: &Address,
    timelock: &Address,
    role: Role,
    account: &Address,
    granted: bool,
  ) -> Result<(), Error> {
    self.ensure_timelock(timelock)?;
    self.ensure_role(timelock, Role::Admin, caller)?;

    self
      .overlay
      .diff_mut()
      .set_role(*timelock, role, *account, granted);
    self.events.push(Event::RoleChanged {
      timelock: *timelock,
      role,
      account: *account,
      granted,
    });
    Ok(())
  }
}
