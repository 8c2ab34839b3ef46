use log::{debug, trace};

use crate::error::{Error, Result};
use crate::network::network::Network;
use crate::train::context::TrainingContext;

/// Plain mini-batch gradient descent.
#[derive(Debug, Clone, Copy)]
pub struct Sgd {
    pub learning_rate: f32,
}

impl Sgd {
    pub fn new(learning_rate: f32) -> Sgd {
        Sgd { learning_rate }
    }

    /// Subtracts `learning_rate` times the batch-mean gradient from every
    /// weight and bias of `network`.
    ///
    /// Every context must have been created from `network`; an empty batch
    /// or a foreign context fails with `Mismatch` before anything changes.
    /// A context that never ran `train_step` contributes a zero gradient.
    pub fn apply(&self, network: &mut Network, batch: &[TrainingContext]) -> Result<()> {
        if batch.is_empty() {
            return Err(Error::Mismatch("empty batch".to_string()));
        }
        if let Some(pos) = batch.iter().position(|ctx| !ctx.is_bound_to(network)) {
            return Err(Error::Mismatch(format!(
                "context {pos} belongs to network #{}, not #{}",
                batch[pos].network_id(),
                network.id()
            )));
        }

        let n = batch.len() as f32;
        let lr = self.learning_rate;
        let mut grads: Vec<_> = batch.iter().map(|ctx| ctx.gradients()).collect();

        for (index, layer) in network.layers_mut().iter_mut().enumerate() {
            let per_ctx: Vec<_> = grads.iter_mut().filter_map(|g| g.next()).collect();

            for (i, w) in layer.weights_mut().iter_mut().enumerate() {
                let sum: f32 = per_ctx.iter().map(|(dw, _)| dw.as_slice()[i]).sum();
                *w -= lr * (sum / n);
            }
            for (i, b) in layer.biases_mut().iter_mut().enumerate() {
                let sum: f32 = per_ctx.iter().map(|(_, db)| db[i]).sum();
                *b -= lr * (sum / n);
            }
            trace!("updated layer {}", index + 1);
        }

        debug!(
            "applied batch of {} to network #{} (lr {lr})",
            batch.len(),
            network.id()
        );
        Ok(())
    }
}

/// Shorthand for `Sgd::new(learning_rate).apply(network, batch)`.
pub fn apply(network: &mut Network, batch: &[TrainingContext], learning_rate: f32) -> Result<()> {
    Sgd::new(learning_rate).apply(network, batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_batch_is_rejected() {
        let mut net = Network::from_sizes(&[2, 1]).unwrap();
        assert!(matches!(apply(&mut net, &[], 0.1), Err(Error::Mismatch(_))));
    }

    #[test]
    fn foreign_context_is_rejected_without_changes() {
        let mut net = Network::from_sizes(&[2, 1]).unwrap();
        net.initialize_seeded(1);
        let other = Network::from_sizes(&[2, 1]).unwrap();

        let mut mine = TrainingContext::new(&net).unwrap();
        mine.train_step(&net, &[1.0, 1.0], &[1.0]).unwrap();
        let foreign = TrainingContext::new(&other).unwrap();

        let before = net.layer(1).unwrap().weights().clone();
        assert!(matches!(
            apply(&mut net, &[mine, foreign], 0.1),
            Err(Error::Mismatch(_))
        ));
        assert_eq!(net.layer(1).unwrap().weights(), &before);
    }
}
