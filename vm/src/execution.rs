use {
  crate::{
    flashloan::FlashLoan,
    registry::Registry,
    Config,
    Overlay,
    State,
    StateDiff,
  },
  defisim_primitives::{
    Action,
    Address,
    Amount,
    Asset,
    OperationId,
    Operation,
    Role,
    ToBase58String,
    Transaction,
  },
  multihash::Multihash,
  thiserror::Error,
  tracing::{debug, warn},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("{account} holds {available} of {asset} but {required} is needed")]
  InsufficientBalance {
    account: Address,
    asset: Asset,
    available: Amount,
    required: Amount,
  },

  #[error(
    "{spender} may spend {available} of {owner}'s {asset} but {required} is \
     needed"
  )]
  InsufficientAllowance {
    owner: Address,
    spender: Address,
    asset: Asset,
    available: Amount,
    required: Amount,
  },

  #[error("Crediting {amount} of {asset} to {account} overflows its balance")]
  BalanceOverflow {
    account: Address,
    asset: Asset,
    amount: Amount,
  },

  #[error("Pool {pool} can lend at most {available}, {requested} requested")]
  ExceedsAvailableLiquidity {
    pool: Address,
    available: Amount,
    requested: Amount,
  },

  #[error(
    "Pool {pool} holds {actual} after the loan callback, at least {expected} \
     is required"
  )]
  RepaymentShortfall {
    pool: Address,
    expected: Amount,
    actual: Amount,
  },

  #[error("{principal} is not authorized to {what}")]
  Unauthorized { principal: Address, what: String },

  #[error("Operation {0} is already scheduled or executed")]
  AlreadyScheduled(OperationId),

  #[error("Operation {0} is not scheduled")]
  NotScheduled(OperationId),

  #[error("Operation {id} becomes ready at {ready_at}, now is {now}")]
  TooEarly {
    id: OperationId,
    now: u64,
    ready_at: u64,
  },

  #[error("{caller} is not the timelock {timelock}")]
  CallerNotTimelock { caller: Address, timelock: Address },

  #[error("Call depth exceeds the limit of {0} frames")]
  StackOverflow(usize),

  #[error("No lending pool is deployed at {0}")]
  UnknownPool(Address),

  #[error("No timelock is deployed at {0}")]
  UnknownTimelock(Address),

  #[error("No program is deployed at {0}")]
  UnknownProgram(Address),

  #[error("Transaction aborted: {0}")]
  Aborted(String),

  #[error("Program {program} failed: {reason}")]
  Program { program: Address, reason: String },
}

/// Something observable that happened during a committed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  Transfer {
    asset: Asset,
    from: Address,
    to: Address,
    amount: Amount,
  },
  Approval {
    asset: Asset,
    owner: Address,
    spender: Address,
    amount: Amount,
  },
  Deposit {
    pool: Address,
    account: Address,
    amount: Amount,
  },
  Withdrawal {
    pool: Address,
    account: Address,
    amount: Amount,
  },
  LoanRepaid {
    pool: Address,
    receiver: Address,
    amount: Amount,
    fee: Amount,
  },
  Scheduled {
    timelock: Address,
    id: OperationId,
    ready_at: u64,
  },
  Executed {
    timelock: Address,
    id: OperationId,
  },
  Cancelled {
    timelock: Address,
    id: OperationId,
  },
  DelayUpdated {
    timelock: Address,
    delay: u64,
  },
  RoleChanged {
    timelock: Address,
    role: Role,
    account: Address,
    granted: bool,
  },
}

/// The outcome of a committed transaction.
#[derive(Debug, Clone)]
pub struct Receipt {
  /// Hash of the executed transaction.
  pub transaction: Multihash,

  /// Every state change made by the transaction.
  pub diff: StateDiff,

  /// All flash loans taken during the transaction, in borrow order.
  pub loans: Vec<FlashLoan>,

  pub events: Vec<Event>,

  /// Number of actions run, including nested ones.
  pub actions: usize,

  /// Deepest call stack reached.
  pub max_depth: usize,
}

/// Everything outside of mutable state that a transaction runs against.
#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
  pub registry: &'a Registry,
  pub config: &'a Config,

  /// Logical time in seconds.
  pub now: u64,
}

/// Executes a transaction
///
/// All actions run in order against an overlay of the given state.
/// If every action succeeds, the receipt carries a StateDiff that
/// can be applied to the state store. If any action fails, nested
/// or not, the overlay is dropped and the first error is returned,
/// so nothing the transaction did is observable. A program that
/// discards the error of a nested action does not change that.
pub fn execute(
  transaction: &Transaction,
  state: &dyn State,
  env: Environment<'_>,
) -> Result<Receipt, Error> {
  let mut context = Context::new(state, env);
  for action in &transaction.actions {
    let result = context.with_frame(action.origin, |ctx| ctx.run(action));
    if let Some(e) = context.failure.take().or(result.err()) {
      warn!(
        "transaction {} rolled back after {} actions: {e}",
        transaction.hash().to_b58(),
        context.actions
      );
      return Err(e);
    }
  }

  Ok(Receipt {
    transaction: *transaction.hash(),
    diff: context.overlay.into_diff(),
    loans: context.loans,
    events: context.events,
    actions: context.actions,
    max_depth: context.max_depth,
  })
}

/// The in-flight state of one transaction.
///
/// Programs receive a mutable reference to the context when they are
/// invoked and may use it to inspect balances and run nested actions
/// on the same call stack.
pub struct Context<'a> {
  pub(crate) overlay: Overlay<'a>,
  pub(crate) env: Environment<'a>,
  pub(crate) loans: Vec<FlashLoan>,
  pub(crate) events: Vec<Event>,
  frames: Vec<Address>,
  actions: usize,
  max_depth: usize,

  /// First error raised by any action. Once set, the transaction
  /// fails regardless of what callers do with the error.
  failure: Option<Error>,
}

impl<'a> Context<'a> {
  fn new(state: &'a dyn State, env: Environment<'a>) -> Self {
    Self {
      overlay: Overlay::new(state),
      env,
      loans: vec![],
      events: vec![],
      frames: vec![],
      actions: 0,
      max_depth: 0,
      failure: None,
    }
  }

  /// The principal of the innermost frame.
  pub fn self_address(&self) -> Address {
    self.frames.last().copied().unwrap_or_default()
  }

  /// Current logical time.
  pub fn now(&self) -> u64 {
    self.env.now
  }

  pub fn depth(&self) -> usize {
    self.frames.len()
  }

  pub fn balance(&self, account: &Address, asset: &Asset) -> Amount {
    self.overlay.balance(account, asset)
  }

  pub fn allowance(
    &self,
    owner: &Address,
    spender: &Address,
    asset: &Asset,
  ) -> Amount {
    self.overlay.allowance(owner, spender, asset)
  }

  /// Runs an operation with the authority of the innermost frame.
  pub fn invoke(&mut self, operation: Operation) -> Result<(), Error> {
    let action = Action::new(self.self_address(), operation);
    self.run(&action)
  }

  /// Runs a nested action on the current call stack.
  ///
  /// Actions always run with the authority of the innermost frame.
  /// An action without a delegated context must originate from that
  /// frame's principal. An action with one must name that principal
  /// in `acting_as`, and may then originate from any principal on
  /// the stack.
  ///
  /// A failed action fails the whole transaction. After the first
  /// failure every further action is refused with the same error.
  pub fn run(&mut self, action: &Action) -> Result<(), Error> {
    if let Some(e) = &self.failure {
      return Err(e.clone());
    }

    let result = self.authorize_and_dispatch(action);
    if let Err(e) = &result {
      self.failure.get_or_insert_with(|| e.clone());
    }
    result
  }

  fn authorize_and_dispatch(&mut self, action: &Action) -> Result<(), Error> {
    let context = self.self_address();
    match &action.acting_as {
      None if action.origin != context => {
        return Err(Error::Unauthorized {
          principal: action.origin,
          what: format!("submit actions in the context of {context}"),
        });
      }
      None => {}
      Some(principal) => {
        if !self.frames.contains(&action.origin) {
          return Err(Error::Unauthorized {
            principal: action.origin,
            what: "submit actions from outside the call stack".into(),
          });
        }
        if *principal != context {
          return Err(Error::Unauthorized {
            principal: *principal,
            what: format!("be acted as from the context of {context}"),
          });
        }
      }
    }

    self.actions += 1;
    let sender = action.sender();
    debug!(
      depth = self.depth(),
      %sender,
      "running {:?}",
      action.operation
    );
    self.dispatch(sender, &action.operation)
  }

  /// Pushes a frame for `principal`, runs `f` in it and pops it.
  pub(crate) fn with_frame<T>(
    &mut self,
    principal: Address,
    f: impl FnOnce(&mut Self) -> Result<T, Error>,
  ) -> Result<T, Error> {
    let limit = self.env.config.max_call_depth;
    if self.frames.len() >= limit {
      return Err(Error::StackOverflow(limit));
    }

    self.frames.push(principal);
    self.max_depth = self.max_depth.max(self.frames.len());
    let result = f(self);
    self.frames.pop();
    result
  }

  fn dispatch(
    &mut self,
    sender: Address,
    operation: &Operation,
  ) -> Result<(), Error> {
    match operation {
      Operation::Transfer { asset, to, amount } => {
        self.transfer(&sender, to, asset, *amount)
      }
      Operation::TransferFrom {
        asset,
        owner,
        to,
        amount,
      } => self.transfer_from(&sender, owner, to, asset, *amount),
      Operation::Approve {
        asset,
        spender,
        amount,
      } => self.approve(&sender, spender, asset, *amount),
      Operation::FlashLoan {
        pool,
        amount,
        receiver,
        callback,
      } => self.flash_loan(sender, pool, *amount, receiver, callback),
      Operation::Deposit { pool, amount } => {
        self.deposit(&sender, pool, *amount)
      }
      Operation::Withdraw { pool } => self.withdraw(&sender, pool),
      Operation::Schedule { timelock, proposal } => {
        self.schedule(&sender, timelock, proposal)
      }
      Operation::Execute { timelock, proposal } => {
        self.execute_proposal(&sender, timelock, proposal)
      }
      Operation::Cancel { timelock, id } => self.cancel(&sender, timelock, id),
      Operation::UpdateDelay { timelock, delay } => {
        self.update_delay(&sender, timelock, *delay)
      }
      Operation::GrantRole {
        timelock,
        role,
        account,
      } => self.set_role(&sender, timelock, *role, account, true),
      Operation::RevokeRole {
        timelock,
        role,
        account,
      } => self.set_role(&sender, timelock, *role, account, false),
      Operation::Call { target, payload } => {
        self.call(sender, target, payload)
      }
      Operation::Abort { reason } => Err(Error::Aborted(reason.clone())),
    }
  }

  fn call(
    &mut self,
    caller: Address,
    target: &Address,
    payload: &[u8],
  ) -> Result<(), Error> {
    let registry = self.env.registry;
    let program = registry.program(target)?;
    self.with_frame(*target, |ctx| program.call(ctx, caller, payload))
  }
}
