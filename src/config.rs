//! Configuration for trace formatting and network construction.
//!
//! Both configs have sensible defaults and can be overridden from the
//! environment with [`TraceConfig::from_env`] / [`MlpConfig::from_env`]:
//!
//! | variable               | meaning                                  |
//! |------------------------|------------------------------------------|
//! | `GRADSCOPE_PRECISION`  | decimals in contribution descriptions    |
//! | `GRADSCOPE_SEED`       | seed for parameter initialization        |
//! | `GRADSCOPE_INPUT_SIZE` | network input width                      |
//! | `GRADSCOPE_LAYERS`     | comma separated layer sizes, e.g. `4,4,1`|

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{GradError, Result};

pub const ENV_PREFIX: &str = "GRADSCOPE_";

pub const DEFAULT_PRECISION: usize = 2;
pub const DEFAULT_INPUT_SIZE: usize = 2;
pub const DEFAULT_LAYER_SIZES: [usize; 3] = [2, 2, 1];

/// Full environment variable name for `suffix`.
pub fn env_key(suffix: &str) -> String {
    format!("{ENV_PREFIX}{suffix}")
}

/// Reads an environment variable and parses it into `T`.
///
/// `Ok(None)` if unset, `Err(GradError::Config)` if set but unreadable or unparsable.
pub fn env_parsed<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = match std::env::var(key) {
        Ok(raw) => raw,
        Err(std::env::VarError::NotPresent) => return Ok(None),
        Err(e) => return Err(GradError::config(key, e.to_string())),
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| GradError::config(key, format!("{raw:?}: {e}")))
}

/// Parses `"2,2,1"` into `[2, 2, 1]`.
pub fn parse_layer_sizes(raw: &str) -> Result<Vec<usize>> {
    raw.split(',')
        .map(|part| {
            part.trim().parse::<usize>().map_err(|e| {
                GradError::config(env_key("LAYERS"), format!("{part:?} in {raw:?}: {e}"))
            })
        })
        .collect()
}

/// Formatting of contribution descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    /// Decimal places used for numbers in descriptions.
    pub precision: usize,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

impl TraceConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(precision) = env_parsed(&env_key("PRECISION"))? {
            config.precision = precision;
        }
        Ok(config)
    }
}

/// Shape and seeding of a multi-layer perceptron.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MlpConfig {
    pub input_size: usize,
    pub layer_sizes: Vec<usize>,
    /// Fixed seed for reproducible parameters; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            input_size: DEFAULT_INPUT_SIZE,
            layer_sizes: DEFAULT_LAYER_SIZES.to_vec(),
            seed: None,
        }
    }
}

impl MlpConfig {
    pub fn new(input_size: usize, layer_sizes: Vec<usize>) -> Self {
        Self {
            input_size,
            layer_sizes,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Same rules as network construction: at least one layer, no zero sizes.
    pub fn validate(&self) -> Result<()> {
        if self.input_size == 0 {
            return Err(GradError::invalid_argument("input size must be greater than 0"));
        }
        if self.layer_sizes.is_empty() {
            return Err(GradError::invalid_argument("at least one layer size is required"));
        }
        if let Some(i) = self.layer_sizes.iter().position(|&size| size == 0) {
            return Err(GradError::invalid_argument(format!(
                "layer {i} has size 0; every layer needs at least one neuron"
            )));
        }
        Ok(())
    }

    /// Random source for parameter initialization.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }

    /// Total number of weights and biases the network will own.
    pub fn num_parameters(&self) -> usize {
        let mut fan_in = self.input_size;
        let mut total = 0;
        for &size in &self.layer_sizes {
            total += size * (fan_in + 1);
            fan_in = size;
        }
        total
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(input_size) = env_parsed(&env_key("INPUT_SIZE"))? {
            config.input_size = input_size;
        }
        if let Some(raw) = env_parsed::<String>(&env_key("LAYERS"))? {
            config.layer_sizes = parse_layer_sizes(&raw)?;
        }
        config.seed = env_parsed(&env_key("SEED"))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_default_mlp_config_is_valid() {
        let config = MlpConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_parameters(), 15);
    }

    #[test]
    fn test_validate_rejects_bad_shapes() {
        assert!(MlpConfig::new(2, vec![]).validate().is_err());
        assert!(MlpConfig::new(2, vec![3, 0, 1]).validate().is_err());
        assert!(MlpConfig::new(0, vec![1]).validate().is_err());
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let config = MlpConfig::default().with_seed(7);
        let a: f64 = config.rng().random();
        let b: f64 = config.rng().random();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_layer_sizes() {
        assert_eq!(parse_layer_sizes("4, 4,1").unwrap(), vec![4, 4, 1]);
        assert!(parse_layer_sizes("4,x").is_err());
    }

    #[test]
    fn test_env_parsed_unset_is_none() {
        let value: Option<u64> = env_parsed("GRADSCOPE_TEST_SURELY_UNSET_KEY").unwrap();
        assert_eq!(value, None);
    }
}
