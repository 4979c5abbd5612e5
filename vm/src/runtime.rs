use {
  crate::{
    execution::{execute, Environment, Error, Receipt},
    program::Program,
    registry::{PoolConfig, Registry},
    Config,
    InMemoryStateStore,
    Overlay,
    State,
    StateDiff,
  },
  defisim_primitives::{
    Address,
    Amount,
    Asset,
    CallbackContext,
    FeePolicy,
    OperationId,
    OperationState,
    Role,
    ToBase58String,
    Transaction,
  },
  std::{sync::Arc, time::Duration},
  tracing::{debug, info},
};

/// Driver-facing entry point of the simulator.
///
/// Owns the committed state, everything deployed during setup and a
/// logical clock. Exactly one transaction runs at a time, and a
/// failed transaction leaves the simulator exactly as it was.
#[derive(Debug)]
pub struct Simulator {
  store: InMemoryStateStore,
  registry: Registry,
  config: Config,
  now: u64,
  nonce: u64,
}

impl Default for Simulator {
  fn default() -> Self {
    Self::new(Config::default())
  }
}

impl Simulator {
  pub fn new(config: Config) -> Self {
    Self {
      store: InMemoryStateStore::default(),
      registry: Registry::default(),
      config,
      now: 0,
      nonce: 0,
    }
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  fn next_address(&mut self, kind: &[u8]) -> Address {
    self.nonce += 1;
    Address::ZERO.derive(&[kind, &self.nonce.to_le_bytes()])
  }

  /// Creates a fresh account with no balances.
  pub fn new_account(&mut self) -> Address {
    self.next_address(b"account")
  }

  /// Defines a new token with zero supply.
  pub fn create_token(&mut self) -> Asset {
    Asset::Token(self.next_address(b"token"))
  }

  /// Deploys a lending pool for `asset`. The pool starts empty, its
  /// liquidity is whatever balance of `asset` it holds.
  pub fn deploy_pool(
    &mut self,
    asset: Asset,
    fee: FeePolicy,
    callback_context: CallbackContext,
  ) -> Address {
    let address = self.next_address(b"pool");
    self.registry.add_pool(address, PoolConfig {
      asset,
      fee,
      callback_context,
    });
    debug!("deployed pool {address} lending {asset} with {fee:?}");
    address
  }

  /// Deploys a timelock. `admin` and the timelock itself receive the
  /// admin role, `proposer` receives the proposer role.
  pub fn deploy_timelock(
    &mut self,
    admin: Address,
    proposer: Address,
    delay: Duration,
  ) -> Address {
    let address = self.next_address(b"timelock");
    self.registry.add_timelock(address);

    let mut setup = StateDiff::default();
    setup.set_delay(address, delay.as_secs());
    setup.set_role(address, Role::Admin, admin, true);
    setup.set_role(address, Role::Admin, address, true);
    setup.set_role(address, Role::Proposer, proposer, true);
    self.store.apply(setup);

    debug!("deployed timelock {address} with delay {}s", delay.as_secs());
    address
  }

  /// Deploys a program at a fresh address.
  pub fn deploy_program(&mut self, program: impl Program + 'static) -> Address {
    let address = self.next_address(b"program");
    self.deploy_program_at(address, program);
    address
  }

  /// Installs a program at a known address, for example an account
  /// that already holds funds.
  pub fn deploy_program_at(
    &mut self,
    address: Address,
    program: impl Program + 'static,
  ) {
    self.registry.add_program(address, Arc::new(program));
  }

  /// Creates `amount` of `asset` out of thin air. Setup only, this
  /// is the one way total supply changes.
  pub fn mint(
    &mut self,
    account: &Address,
    asset: &Asset,
    amount: Amount,
  ) -> Result<(), Error> {
    let mut overlay = Overlay::new(&self.store);
    overlay.credit(account, asset, amount)?;
    let diff = overlay.into_diff();
    self.store.apply(diff);
    Ok(())
  }

  /// Runs a transaction atomically.
  ///
  /// On success the state changes are committed and returned in the
  /// receipt, on failure nothing changes and the triggering error is
  /// returned.
  pub fn run_transaction(
    &mut self,
    transaction: Transaction,
  ) -> Result<Receipt, Error> {
    let env = Environment {
      registry: &self.registry,
      config: &self.config,
      now: self.now,
    };

    let receipt = execute(&transaction, &self.store, env)?;
    info!(
      "transaction {} committed: {} actions, {} state changes, {} loans",
      transaction.hash().to_b58(),
      receipt.actions,
      receipt.diff.len(),
      receipt.loans.len()
    );
    self.store.apply(receipt.diff.clone());
    Ok(receipt)
  }

  /// Moves the logical clock forward.
  pub fn advance_clock(&mut self, duration: Duration) {
    self.now = self.now.saturating_add(duration.as_secs());
  }

  /// Current logical time in seconds.
  pub fn now(&self) -> u64 {
    self.now
  }

  pub fn query_balance(&self, account: &Address, asset: &Asset) -> Amount {
    self.store.balance(account, asset).unwrap_or_default()
  }

  pub fn query_allowance(
    &self,
    owner: &Address,
    spender: &Address,
    asset: &Asset,
  ) -> Amount {
    self.store.allowance(owner, spender, asset).unwrap_or_default()
  }

  pub fn query_timelock_state(
    &self,
    timelock: &Address,
    id: &OperationId,
  ) -> OperationState {
    self.store.operation(timelock, id).unwrap_or_default()
  }

  pub fn query_delay(&self, timelock: &Address) -> Option<Duration> {
    self.store.delay(timelock).map(Duration::from_secs)
  }

  pub fn query_deposit(&self, pool: &Address, account: &Address) -> Amount {
    self.store.deposit(pool, account).unwrap_or_default()
  }

  pub fn has_role(
    &self,
    timelock: &Address,
    role: Role,
    account: &Address,
  ) -> bool {
    self.store.role(timelock, role, account).unwrap_or_default()
  }

  /// Sum of all balances of `asset`, or `None` when balances spread
  /// over several accounts add up to more than an `Amount` can hold.
  pub fn total_supply(&self, asset: &Asset) -> Option<Amount> {
    self
      .store
      .balances()
      .filter(|(_, a, _)| *a == asset)
      .try_fold(0, |acc: Amount, (_, _, amount)| acc.checked_add(amount))
  }
}
