use {
  multihash::{Hasher, Sha3_256},
  serde::{Deserialize, Serialize},
  std::{
    fmt::{Debug, Display},
    ops::Deref,
    str::FromStr,
  },
};

/// Represents the identity of a principal in the simulator.
///
/// The same address type is used for externally controlled accounts
/// (players, victims), for deployed protocol instances (lending pools,
/// timelocks), for programs and for token definitions. The simulator
/// never interprets the bytes, it only compares them.
///
/// Addresses are usually derived, never random, so that every scenario
/// run produces the same identities:
///
///   - `Address::labeled("player")` gives a stable address for a name
///   - `simulator.new_account()` derives a fresh address from a counter
///   - `address.derive(&[b"pool", &nonce])` gives addresses owned by
///     some other address
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
pub struct Address([u8; 32]);

impl Address {
  /// The all-zeroes address. Used as the root of all derivations.
  pub const ZERO: Address = Address([0u8; 32]);

  /// Given a list of seeds this method will generate a new
  /// derived address.
  ///
  /// The same set of seeds will always return the same
  /// derived address, so it can be used to build stable
  /// identities for accounts created during setup.
  pub fn derive(&self, seeds: &[&[u8]]) -> Self {
    let mut hasher = Sha3_256::default();
    hasher.update(&self.0);
    for seed in seeds.iter() {
      hasher.update(seed);
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(hasher.finalize());
    Address(bytes)
  }

  /// A stable address for a human readable name.
  pub fn labeled(label: &str) -> Self {
    Self::ZERO.derive(&[b"label", label.as_bytes()])
  }
}

impl AsRef<[u8]> for Address {
  fn as_ref(&self) -> &[u8] {
    &self.0
  }
}

impl Deref for Address {
  type Target = [u8];

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl Display for Address {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", bs58::encode(self.0).into_string())
  }
}

impl Debug for Address {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "address({})", bs58::encode(self.0).into_string())
  }
}

impl From<Address> for String {
  fn from(addr: Address) -> Self {
    bs58::encode(addr.0).into_string()
  }
}

impl FromStr for Address {
  type Err = bs58::decode::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut bytes = [0u8; 32];
    bs58::decode(s).into(&mut bytes)?;
    Ok(Self(bytes))
  }
}

impl TryFrom<&str> for Address {
  type Error = bs58::decode::Error;

  fn try_from(value: &str) -> Result<Self, Self::Error> {
    FromStr::from_str(value)
  }
}
