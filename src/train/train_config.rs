use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hyperparameters for a `train_loop` run.
///
/// # Fields
/// - `epochs`        — full passes over the training data
/// - `batch_size`    — examples per `apply`; capped by the number of contexts
/// - `learning_rate` — step size handed to `Sgd`
/// - `seed`          — seeds the per-epoch shuffle
///
/// ```json
/// { "epochs": 10, "batch_size": 8, "learning_rate": 0.03, "seed": 1 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    #[serde(default)]
    pub seed: u64,
}

impl TrainConfig {
    pub fn new(epochs: usize, batch_size: usize, learning_rate: f32) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            learning_rate,
            seed: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::Config("batch_size must be at least 1".to_string()));
        }
        if !self.learning_rate.is_finite() || self.learning_rate < 0.0 {
            return Err(Error::Config(format!(
                "learning_rate must be finite and non-negative, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    pub fn load_json(path: &str) -> Result<TrainConfig> {
        let contents = std::fs::read_to_string(path)?;
        let config: TrainConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }
}
