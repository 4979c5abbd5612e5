use {
  crate::{Address, Amount, Asset, OperationId, Proposal, Role},
  serde::{Deserialize, Serialize},
};

/// A single state-changing step of a transaction.
///
/// Actions submitted at the top level of a transaction are signed by
/// their `origin`. Every action runs with the authority of the
/// innermost frame of the call stack: either `origin` is that frame's
/// principal, or `acting_as` names it and `origin` is some principal
/// further down the stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
  /// The principal submitting this action.
  pub origin: Address,

  /// Delegated call context. When set, the operation runs with the
  /// authority of this principal instead of `origin`.
  pub acting_as: Option<Address>,

  /// What this action does, including its target and payload.
  pub operation: Operation,
}

impl Action {
  pub fn new(origin: Address, operation: Operation) -> Self {
    Self {
      origin,
      acting_as: None,
      operation,
    }
  }

  /// Runs `operation` submitted by `origin` in the context of `principal`.
  pub fn acting_as(
    origin: Address,
    principal: Address,
    operation: Operation,
  ) -> Self {
    Self {
      origin,
      acting_as: Some(principal),
      operation,
    }
  }

  /// The principal whose authority this action carries.
  pub fn sender(&self) -> Address {
    self.acting_as.unwrap_or(self.origin)
  }
}

/// What runs when a flash loan is handed to its receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Callback {
  /// The receiver gets the funds and nothing runs before the
  /// repayment check.
  None,

  /// Inline actions supplied by the initiator of the loan.
  Actions(Vec<Action>),

  /// The program deployed at the receiver address handles the loan.
  Program,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
  /// Moves `amount` of `asset` from the sender to `to`.
  Transfer {
    asset: Asset,
    to: Address,
    amount: Amount,
  },

  /// Moves `amount` of `asset` from `owner` to `to` using an allowance
  /// granted by `owner` to the sender.
  TransferFrom {
    asset: Asset,
    owner: Address,
    to: Address,
    amount: Amount,
  },

  /// Sets the allowance of `spender` over the sender's `asset`.
  Approve {
    asset: Asset,
    spender: Address,
    amount: Amount,
  },

  /// Borrows `amount` of the pool asset for `receiver`, runs the
  /// callback and checks repayment.
  FlashLoan {
    pool: Address,
    amount: Amount,
    receiver: Address,
    callback: Callback,
  },

  /// Deposits `amount` of the pool asset and credits the sender.
  Deposit { pool: Address, amount: Amount },

  /// Withdraws everything the sender deposited in the pool.
  Withdraw { pool: Address },

  /// Queues a proposal on a timelock.
  Schedule {
    timelock: Address,
    proposal: Proposal,
  },

  /// Runs a ready proposal on a timelock.
  Execute {
    timelock: Address,
    proposal: Proposal,
  },

  /// Removes a scheduled but not yet executed operation.
  Cancel { timelock: Address, id: OperationId },

  /// Changes the timelock delay. Only the timelock itself may do that.
  UpdateDelay { timelock: Address, delay: u64 },

  GrantRole {
    timelock: Address,
    role: Role,
    account: Address,
  },

  RevokeRole {
    timelock: Address,
    role: Role,
    account: Address,
  },

  /// Invokes the program deployed at `target`.
  Call { target: Address, payload: Vec<u8> },

  /// Fails the whole transaction.
  Abort { reason: String },
}
