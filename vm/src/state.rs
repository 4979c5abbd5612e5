use {
  defisim_primitives::{
    Address,
    Amount,
    Asset,
    OperationId,
    OperationState,
    Role,
  },
  serde::{Deserialize, Serialize},
  std::collections::BTreeMap,
};

/// Represents a change in the simulated ledger state.
///
/// Statediffs are meant to be accumulated and logically the entire
/// state of the simulator is the result of cumulative application
/// of consecutive state diffs.
///
/// A transaction produces a statediff while it executes. The diff is
/// applied to the committed store only if every action succeeded,
/// otherwise it is dropped, which makes rollback free.
///
/// Each component owns its own named table, there is no shared raw
/// storage between them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDiff {
  balances: BTreeMap<(Address, Asset), Amount>,
  allowances: BTreeMap<(Address, Address, Asset), Amount>,
  roles: BTreeMap<(Address, Role, Address), bool>,
  delays: BTreeMap<Address, u64>,
  operations: BTreeMap<(Address, OperationId), OperationState>,
  deposits: BTreeMap<(Address, Address), Amount>,
}

impl StateDiff {
  pub fn set_balance(
    &mut self,
    account: Address,
    asset: Asset,
    amount: Amount,
  ) {
    self.balances.insert((account, asset), amount);
  }

  pub fn set_allowance(
    &mut self,
    owner: Address,
    spender: Address,
    asset: Asset,
    amount: Amount,
  ) {
    self.allowances.insert((owner, spender, asset), amount);
  }

  pub fn set_role(
    &mut self,
    timelock: Address,
    role: Role,
    account: Address,
    granted: bool,
  ) {
    self.roles.insert((timelock, role, account), granted);
  }

  pub fn set_delay(&mut self, timelock: Address, delay: u64) {
    self.delays.insert(timelock, delay);
  }

  pub fn set_operation(
    &mut self,
    timelock: Address,
    id: OperationId,
    state: OperationState,
  ) {
    self.operations.insert((timelock, id), state);
  }

  pub fn set_deposit(
    &mut self,
    pool: Address,
    account: Address,
    amount: Amount,
  ) {
    self.deposits.insert((pool, account), amount);
  }

  /// Merges a state diff with a newer diff.
  ///
  /// Applying the resulting diff is equivalent to
  /// applying the two merged diffs consecutively on
  /// any state store.
  pub fn merge(self, newer: StateDiff) -> StateDiff {
    let mut merged = self;
    merged.balances.extend(newer.balances);
    merged.allowances.extend(newer.allowances);
    merged.roles.extend(newer.roles);
    merged.delays.extend(newer.delays);
    merged.operations.extend(newer.operations);
    merged.deposits.extend(newer.deposits);
    merged
  }

  /// Number of entries written by this diff across all tables.
  pub fn len(&self) -> usize {
    self.balances.len()
      + self.allowances.len()
      + self.roles.len()
      + self.delays.len()
      + self.operations.len()
      + self.deposits.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Iterate over all balance entries in this diff.
  pub fn balances(&self) -> impl Iterator<Item = (&Address, &Asset, Amount)> {
    self
      .balances
      .iter()
      .map(|((account, asset), amount)| (account, asset, *amount))
  }
}

/// Read access to a layer of ledger state.
///
/// Getters return `None` when the layer has no entry for the key,
/// which lets overlays fall through to the layer below.
pub trait State {
  fn balance(&self, account: &Address, asset: &Asset) -> Option<Amount>;

  fn allowance(
    &self,
    owner: &Address,
    spender: &Address,
    asset: &Asset,
  ) -> Option<Amount>;

  fn role(&self, timelock: &Address, role: Role, account: &Address)
    -> Option<bool>;

  fn delay(&self, timelock: &Address) -> Option<u64>;

  fn operation(
    &self,
    timelock: &Address,
    id: &OperationId,
  ) -> Option<OperationState>;

  fn deposit(&self, pool: &Address, account: &Address) -> Option<Amount>;

  fn apply(&mut self, diff: StateDiff);
}

impl State for StateDiff {
  fn balance(&self, account: &Address, asset: &Asset) -> Option<Amount> {
    self.balances.get(&(*account, *asset)).copied()
  }

  fn allowance(
    &self,
    owner: &Address,
    spender: &Address,
    asset: &Asset,
  ) -> Option<Amount> {
    self.allowances.get(&(*owner, *spender, *asset)).copied()
  }

  fn role(
    &self,
    timelock: &Address,
    role: Role,
    account: &Address,
  ) -> Option<bool> {
    self.roles.get(&(*timelock, role, *account)).copied()
  }

  fn delay(&self, timelock: &Address) -> Option<u64> {
    self.delays.get(timelock).copied()
  }

  fn operation(
    &self,
    timelock: &Address,
    id: &OperationId,
  ) -> Option<OperationState> {
    self.operations.get(&(*timelock, *id)).copied()
  }

  fn deposit(&self, pool: &Address, account: &Address) -> Option<Amount> {
    self.deposits.get(&(*pool, *account)).copied()
  }

  fn apply(&mut self, diff: StateDiff) {
    *self = std::mem::take(self).merge(diff);
  }
}

/// The committed state of the simulator, kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
  data: StateDiff,
}

impl InMemoryStateStore {
  pub fn balances(&self) -> impl Iterator<Item = (&Address, &Asset, Amount)> {
    self.data.balances()
  }
}

impl State for InMemoryStateStore {
  fn balance(&self, account: &Address, asset: &Asset) -> Option<Amount> {
    self.data.balance(account, asset)
  }

  fn allowance(
    &self,
    owner: &Address,
    spender: &Address,
    asset: &Asset,
  ) -> Option<Amount> {
    self.data.allowance(owner, spender, asset)
  }

  fn role(
    &self,
    timelock: &Address,
    role: Role,
    account: &Address,
  ) -> Option<bool> {
    self.data.role(timelock, role, account)
  }

  fn delay(&self, timelock: &Address) -> Option<u64> {
    self.data.delay(timelock)
  }

  fn operation(
    &self,
    timelock: &Address,
    id: &OperationId,
  ) -> Option<OperationState> {
    self.data.operation(timelock, id)
  }

  fn deposit(&self, pool: &Address, account: &Address) -> Option<Amount> {
    self.data.deposit(pool, account)
  }

  fn apply(&mut self, diff: StateDiff) {
    self.data.apply(diff);
  }
}

/// A writable view over a read-only base state.
///
/// Reads check the pending diff first and then the base layer, writes
/// only ever touch the pending diff. The base is never mutated, so
/// dropping an overlay discards everything written through it.
pub struct Overlay<'a> {
  base: &'a dyn State,
  diff: StateDiff,
}

impl<'a> Overlay<'a> {
  pub fn new(base: &'a dyn State) -> Self {
    Self {
      base,
      diff: StateDiff::default(),
    }
  }

  pub fn balance(&self, account: &Address, asset: &Asset) -> Amount {
    self
      .diff
      .balance(account, asset)
      .or_else(|| self.base.balance(account, asset))
      .unwrap_or_default()
  }

  pub fn allowance(
    &self,
    owner: &Address,
    spender: &Address,
    asset: &Asset,
  ) -> Amount {
    self
      .diff
      .allowance(owner, spender, asset)
      .or_else(|| self.base.allowance(owner, spender, asset))
      .unwrap_or_default()
  }

  pub fn has_role(
    &self,
    timelock: &Address,
    role: Role,
    account: &Address,
  ) -> bool {
    self
      .diff
      .role(timelock, role, account)
      .or_else(|| self.base.role(timelock, role, account))
      .unwrap_or_default()
  }

  pub fn delay(&self, timelock: &Address) -> u64 {
    self
      .diff
      .delay(timelock)
      .or_else(|| self.base.delay(timelock))
      .unwrap_or_default()
  }

  pub fn operation(
    &self,
    timelock: &Address,
    id: &OperationId,
  ) -> OperationState {
    self
      .diff
      .operation(timelock, id)
      .or_else(|| self.base.operation(timelock, id))
      .unwrap_or_default()
  }

  pub fn deposit(&self, pool: &Address, account: &Address) -> Amount {
    self
      .diff
      .deposit(pool, account)
      .or_else(|| self.base.deposit(pool, account))
      .unwrap_or_default()
  }

  pub(crate) fn diff_mut(&mut self) -> &mut StateDiff {
    &mut self.diff
  }

  pub fn into_diff(self) -> StateDiff {
    self.diff
  }
}
