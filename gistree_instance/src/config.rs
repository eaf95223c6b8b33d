//! Configuration ingestion (§6.1, §7). Reading from a file is an
//! explicit non-goal; `Config::from_options` takes the in-memory
//! key/value pairs a caller's own file parser would already have
//! produced, and drops unknown keys or out-of-range values rather than
//! erroring — a lenient, best-effort policy per §7.

/// Replication mode for an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No replicator attached; the snapshot is the sole source of truth.
    Standalone,
    /// Snapshot is wrapped in a Merkle map and mutations are pushed to a
    /// `ReplicatedMap` backend.
    Distributed,
}

/// One raw configuration value, as an un-typed option parser would hand
/// it over.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// An integer-valued option.
    Int(i64),
    /// A string-valued option.
    Text(String),
    /// A boolean-valued option.
    Bool(bool),
}

/// Resolved instance configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Maximum children per internal node (§3 invariant 5).
    pub width: usize,
    /// Fixed dimensionality of every box this instance's tree stores.
    pub dimensionality: usize,
    /// Seed for the tree's internal-node id generator.
    pub seed: u64,
    /// Standalone or distributed.
    pub mode: Mode,
    /// Whether to log at `DEBUG` instead of `INFO`.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { width: 6, dimensionality: 2, seed: 0, mode: Mode::Standalone, verbose: false }
    }
}

impl Config {
    /// Build a config from unordered `(key, value)` options, starting
    /// from [`Config::default`] and overriding only the keys recognized
    /// with an in-range value. Unknown keys and invalid values (e.g. a
    /// non-positive `width`) are silently dropped rather than rejected.
    pub fn from_options(options: &[(String, ConfigValue)]) -> Self {
        let mut cfg = Config::default();
        for (key, value) in options {
            match (key.as_str(), value) {
                ("width", ConfigValue::Int(n)) if *n > 0 => cfg.width = *n as usize,
                ("dimensionality", ConfigValue::Int(n)) if *n > 0 => cfg.dimensionality = *n as usize,
                ("seed", ConfigValue::Int(n)) => cfg.seed = *n as u64,
                ("verbose", ConfigValue::Bool(b)) => cfg.verbose = *b,
                ("mode", ConfigValue::Text(s)) if s == "distributed" => cfg.mode = Mode::Distributed,
                ("mode", ConfigValue::Text(s)) if s == "standalone" => cfg.mode = Mode::Standalone,
                _ => {}
            }
        }
        cfg
    }
}
