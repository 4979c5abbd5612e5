/// Execution limits of the simulator.
#[derive(Debug, Clone)]
pub struct Config {
  /// Maximum number of frames on the call stack, top-level actions
  /// included. Re-entrant calls beyond this fail with
  /// `Error::StackOverflow`.
  pub max_call_depth: usize,
}

impl Default for Config {
  fn default() -> Self {
    Self { max_call_depth: 64 }
  }
}
