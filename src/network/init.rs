use std::f32::consts::PI;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::network::network::Network;

/// Standard normal density.
fn normal_density(x: f32) -> f32 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// One Xavier-scaled weight for a layer with `fan_in` inputs.
///
/// A magnitude in `[0, 1)` is drawn by rejection against the standard
/// normal density, given a random sign, then scaled by `1/sqrt(fan_in)`.
pub fn xavier_sample<R: Rng + ?Sized>(rng: &mut R, fan_in: usize) -> f32 {
    let mut magnitude: f32 = rng.gen();
    while normal_density(rng.gen::<f32>()) > normal_density(magnitude) {
        magnitude = rng.gen();
    }
    if rng.gen::<bool>() {
        magnitude = -magnitude;
    }
    magnitude / (fan_in as f32).sqrt()
}

/// Xavier initialization: biases to zero, weights from [`xavier_sample`].
pub fn initialize<R: Rng + ?Sized>(network: &mut Network, rng: &mut R) {
    for layer in network.layers_mut() {
        let fan_in = layer.input_size();
        layer.biases_mut().fill(0.0);
        for w in layer.weights_mut() {
            *w = xavier_sample(rng, fan_in);
        }
    }
}

/// [`initialize`] with a `StdRng` seeded from `seed`; equal seeds give
/// bit-identical networks.
pub fn initialize_seeded(network: &mut Network, seed: u64) {
    debug!("xavier init of network #{} with seed {seed}", network.id());
    let mut rng = StdRng::seed_from_u64(seed);
    initialize(network, &mut rng);
}

impl Network {
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        initialize(self, rng);
    }

    pub fn initialize_seeded(&mut self, seed: u64) {
        initialize_seeded(self, seed);
    }
}
