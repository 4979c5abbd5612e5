use {
  crate::{b58::ToBase58String, Action},
  core::fmt::Debug,
  multihash::{Hasher, Multihash, MultihashDigest, Sha3_256},
  once_cell::sync::OnceCell,
  serde::{Deserialize, Serialize},
};

/// An ordered list of actions that either all take effect or none do.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
  pub actions: Vec<Action>,

  #[serde(skip)]
  hash_cache: OnceCell<Multihash>,
}

impl Transaction {
  pub fn new(actions: Vec<Action>) -> Self {
    Self {
      actions,
      hash_cache: OnceCell::new(),
    }
  }

  /// Hash of the transaction contents that uniquely identifies it.
  pub fn hash(&self) -> &Multihash {
    self.hash_cache.get_or_init(|| {
      let mut hasher = Sha3_256::default();
      hasher.update(
        &rmp_serde::to_vec(&self.actions).expect("actions are serializable"),
      );
      multihash::Code::Sha3_256
        .wrap(hasher.finalize())
        .expect("sha3-256 digest fits a multihash")
    })
  }
}

impl From<Vec<Action>> for Transaction {
  fn from(actions: Vec<Action>) -> Self {
    Self::new(actions)
  }
}

impl Debug for Transaction {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Transaction")
      .field("hash", &self.hash().to_b58())
      .field("actions", &self.actions)
      .finish()
  }
}
