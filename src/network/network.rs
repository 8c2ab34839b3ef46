use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;

use crate::activation::activation::Activation;
use crate::error::{Error, Result};
use crate::layers::dense::Layer;
use crate::network::topology::Topology;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The parameter store: weights, biases and activation choice for every
/// layer after the input.
///
/// Training contexts read it through `&Network`; only
/// [`Sgd::apply`](crate::optim::sgd::Sgd::apply) takes `&mut Network`, so
/// the borrow checker keeps updates from overlapping a forward or backward
/// pass.
#[derive(Debug)]
pub struct Network {
    id: u64,
    topology: Topology,
    /// `layers[i - 1]` holds layer `i`.
    layers: Vec<Layer>,
}

impl Network {
    /// Allocates parameter storage for `topology`. Values are zero until an
    /// initializer runs.
    pub fn new(topology: Topology) -> Result<Network> {
        let sizes = topology.sizes();
        let mut layers = Vec::new();
        layers.try_reserve_exact(sizes.len() - 1)?;
        for pair in sizes.windows(2) {
            layers.push(Layer::new(pair[1], pair[0])?);
        }

        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        debug!("created network #{id} with layer sizes {sizes:?}");
        Ok(Network { id, topology, layers })
    }

    pub fn from_sizes(sizes: &[usize]) -> Result<Network> {
        Network::new(Topology::new(sizes)?)
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Parameter layers in order; element 0 is layer 1.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    /// Layer `index` in `[1, layer_count - 1]`.
    pub fn layer(&self, index: usize) -> Result<&Layer> {
        self.topology.check_layer(index)?;
        Ok(&self.layers[index - 1])
    }

    /// Mutable access for fixing parameters by hand. Shapes cannot change.
    pub fn layer_mut(&mut self, index: usize) -> Result<&mut Layer> {
        self.topology.check_layer(index)?;
        Ok(&mut self.layers[index - 1])
    }

    pub fn set_activation(&mut self, index: usize, activation: Activation) -> Result<()> {
        self.topology.check_layer(index)?;
        debug!("network #{}: layer {index} activation -> {activation:?}", self.id);
        self.layers[index - 1].set_activation(activation);
        Ok(())
    }

    pub fn activation(&self, index: usize) -> Result<&Activation> {
        Ok(self.layer(index)?.activation())
    }

    /// Forward evaluation of one input vector.
    ///
    /// Pure: it may run concurrently with other `infer` and `train_step`
    /// calls against the same network.
    pub fn infer(&self, input: &[f32]) -> Result<Vec<f32>> {
        Error::check_len("input", self.topology.input_size(), input.len())?;

        let mut act = input.to_vec();
        for layer in &self.layers {
            let mut preact = vec![0.0; layer.size()];
            let mut next = vec![0.0; layer.size()];
            layer.feed(&act, &mut preact, &mut next);
            act = next;
        }
        Ok(act)
    }
}

impl Clone for Network {
    /// The clone is a distinct store: contexts created for `self` are not
    /// accepted by the copy.
    fn clone(&self) -> Self {
        Network {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            topology: self.topology.clone(),
            layers: self.layers.clone(),
        }
    }
}
