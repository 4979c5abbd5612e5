use {
  crate::{Action, Address, Amount, ToBase58String},
  multihash::{Hasher, Sha3_256},
  serde::{Deserialize, Serialize},
  std::fmt::{Debug, Display},
};

/// Privileges a principal may hold on a timelock.
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
pub enum Role {
  /// May grant and revoke roles and change the delay.
  Admin,

  /// May schedule and cancel operations.
  Proposer,
}

/// Identifies a timelock operation by the hash of its contents.
#[derive(
  Copy,
  Clone,
  Default,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
)]
pub struct OperationId([u8; 32]);

impl Display for OperationId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0.to_b58())
  }
}

impl Debug for OperationId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "operation({})", self.0.to_b58())
  }
}

/// Lifecycle of a timelock operation.
///
/// `Unset -> Scheduled(ready_at) -> Executed`, where `Executed`
/// is terminal. Cancelling moves a scheduled operation back to
/// `Unset`.
#[derive(
  Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub enum OperationState {
  #[default]
  Unset,
  Scheduled {
    ready_at: u64,
    proposer: Address,
  },
  Executed,
}

impl OperationState {
  pub fn is_scheduled(&self) -> bool {
    matches!(self, OperationState::Scheduled { .. })
  }
}

/// A privileged operation routed through a timelock.
///
/// When executed, `value` units of the native currency are sent from
/// the timelock to `target` and then `payload` runs with the timelock
/// on the call stack, so its actions may act as the timelock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
  pub target: Address,
  pub value: Amount,
  pub payload: Vec<Action>,
  pub salt: [u8; 32],
}

impl Proposal {
  /// The operation id, `sha3-256(target, value, payload, salt)`.
  ///
  /// Two proposals with identical contents and salt share an id, so
  /// the same operation can only be queued once.
  pub fn id(&self) -> OperationId {
    let mut hasher = Sha3_256::default();
    hasher.update(&self.target);
    hasher.update(&self.value.to_le_bytes());
    hasher.update(
      &rmp_serde::to_vec(&self.payload).expect("actions are serializable"),
    );
    hasher.update(&self.salt);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(hasher.finalize());
    OperationId(bytes)
  }
}

#[cfg(test)]
mod tests {
  use {
    super::Proposal,
    crate::{Action, Address, Operation},
  };

  fn proposal(salt: u8) -> Proposal {
    Proposal {
      target: Address::labeled("target"),
      value: 0,
      payload: vec![Action::new(
        Address::labeled("timelock"),
        Operation::UpdateDelay {
          timelock: Address::labeled("timelock"),
          delay: 0,
        },
      )],
      salt: [salt; 32],
    }
  }

  #[test]
  fn operation_id_depends_on_every_field() {
    let base = proposal(0);
    assert_eq!(base.id(), proposal(0).id());
    assert_ne!(base.id(), proposal(1).id());

    let mut valued = proposal(0);
    valued.value = 1;
    assert_ne!(base.id(), valued.id());

    let mut retargeted = proposal(0);
    retargeted.target = Address::labeled("other");
    assert_ne!(base.id(), retargeted.id());

    let mut empty = proposal(0);
    empty.payload.clear();
    assert_ne!(base.id(), empty.id());
  }
}
