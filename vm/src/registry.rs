use {
  crate::{program::Program, Error},
  defisim_primitives::{Address, Asset, CallbackContext, FeePolicy},
  std::{
    collections::{BTreeMap, BTreeSet},
    fmt::Debug,
    sync::Arc,
  },
};

/// Static configuration of a deployed lending pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
  /// The only asset this pool lends.
  pub asset: Asset,
  pub fee: FeePolicy,
  pub callback_context: CallbackContext,
}

/// Everything deployed during setup.
///
/// The registry does not change while transactions run, mutable
/// protocol state such as timelock delays and roles lives in the
/// state store instead.
#[derive(Default)]
pub struct Registry {
  pools: BTreeMap<Address, PoolConfig>,
  timelocks: BTreeSet<Address>,
  programs: BTreeMap<Address, Arc<dyn Program>>,
}

impl Registry {
  pub fn add_pool(&mut self, address: Address, config: PoolConfig) {
    self.pools.insert(address, config);
  }

  pub fn add_timelock(&mut self, address: Address) {
    self.timelocks.insert(address);
  }

  pub fn add_program(&mut self, address: Address, program: Arc<dyn Program>) {
    self.programs.insert(address, program);
  }

  pub fn pool(&self, address: &Address) -> Result<&PoolConfig, Error> {
    self.pools.get(address).ok_or(Error::UnknownPool(*address))
  }

  pub fn is_timelock(&self, address: &Address) -> bool {
    self.timelocks.contains(address)
  }

  pub fn program(&self, address: &Address) -> Result<&dyn Program, Error> {
    self
      .programs
      .get(address)
      .map(|program| program.as_ref())
      .ok_or(Error::UnknownProgram(*address))
  }
}

impl Debug for Registry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Registry")
      .field("pools", &self.pools)
      .field("timelocks", &self.timelocks)
      .field("programs", &self.programs.keys().collect::<Vec<_>>())
      .finish()
  }
}
