use std::time::Instant;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::network::network::Network;
use crate::optim::sgd::Sgd;
use crate::train::context::TrainingContext;
use crate::train::train_config::TrainConfig;

/// Trains `network` with mini-batch SGD for `config.epochs` epochs and
/// returns the mean loss of the last epoch.
///
/// Each batch fills up to `min(batch_size, contexts.len())` contexts, one
/// example each, then applies them in one step. Examples run one after
/// another on the calling thread; callers wanting parallelism drive
/// `TrainingContext::train_step` from their own threads instead.
pub fn train_loop(
    network: &mut Network,
    contexts: &mut [TrainingContext],
    inputs: &[Vec<f32>],
    targets: &[Vec<f32>],
    config: &TrainConfig,
) -> Result<f32> {
    config.validate()?;
    if contexts.is_empty() {
        return Err(Error::Mismatch("no training contexts".to_string()));
    }
    Error::check_len("targets", inputs.len(), targets.len())?;
    if inputs.is_empty() {
        warn!("train_loop called with an empty training set");
        return Ok(0.0);
    }

    let width = config.batch_size.min(contexts.len());
    let optimizer = Sgd::new(config.learning_rate);
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut indices: Vec<usize> = (0..inputs.len()).collect();
    let mut last_loss = 0.0;

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();
        indices.shuffle(&mut rng);
        let mut total_loss = 0.0;

        for batch in indices.chunks(width) {
            for (ctx, &idx) in contexts.iter_mut().zip(batch) {
                ctx.train_step(network, &inputs[idx], &targets[idx])?;
                total_loss += ctx.loss(&targets[idx]);
            }
            optimizer.apply(network, &contexts[..batch.len()])?;
        }

        last_loss = total_loss / inputs.len() as f32;
        info!(
            "epoch {epoch}/{}: loss {last_loss:.6} ({} ms)",
            config.epochs,
            t_start.elapsed().as_millis()
        );
    }

    Ok(last_loss)
}
