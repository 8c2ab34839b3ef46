use log::info;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::activation::Activation;
use crate::error::{Error, Result};
use crate::network::network::Network;
use crate::network::topology::Topology;

/// JSON description of a network: layer widths, optional per-layer
/// activations (one per parameter layer) and an optional init seed.
///
/// ```json
/// { "layers": [784, 32, 10], "activations": ["swish", "sigmoid"], "seed": 1 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub layers: Vec<usize>,
    #[serde(default)]
    pub activations: Option<Vec<Activation>>,
    /// Missing seeds are drawn from the thread RNG and logged.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl NetworkSpec {
    /// Creates and Xavier-initializes the described network.
    pub fn build(&self) -> Result<Network> {
        let mut network = Network::new(Topology::new(&self.layers)?)?;

        if let Some(activations) = &self.activations {
            Error::check_len("activations", self.layers.len() - 1, activations.len())?;
            for (i, activation) in activations.iter().enumerate() {
                network.set_activation(i + 1, activation.clone())?;
            }
        }

        let seed = match self.seed {
            Some(seed) => seed,
            None => {
                let seed: u64 = rand::thread_rng().gen();
                info!("no seed configured, using {seed}");
                seed
            }
        };
        network.initialize_seeded(seed);
        Ok(network)
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
