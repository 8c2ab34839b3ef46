use std::thread;

use danknn::{Activation, Network, NetworkSpec, Sgd, TrainingContext};

fn main() -> danknn::Result<()> {
    env_logger::init();

    let spec = NetworkSpec {
        layers: vec![2, 4, 1],
        activations: Some(vec![Activation::Swish, Activation::Sigmoid]),
        seed: Some(2020),
    };
    let mut network = spec.build()?;

    let inputs = [[1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
    let targets = [[1.0], [0.0], [1.0], [0.0]];

    // One context per worker thread; the whole data set is one batch.
    let mut contexts = (0..inputs.len())
        .map(|_| TrainingContext::new(&network))
        .collect::<danknn::Result<Vec<_>>>()?;
    let optimizer = Sgd::new(0.5);

    for epoch in 0..5000 {
        let net = &network;
        thread::scope(|s| {
            let handles: Vec<_> = contexts
                .iter_mut()
                .zip(inputs.iter().zip(&targets))
                .map(|(ctx, (input, target))| s.spawn(move || ctx.train_step(net, input, target)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("training thread panicked"))
                .collect::<danknn::Result<()>>()
        })?;

        if epoch % 1000 == 0 {
            let loss: f32 = contexts.iter().zip(&targets).map(|(c, t)| c.loss(t)).sum();
            println!("Epoch {epoch}: loss = {:.6}", loss / inputs.len() as f32);
        }
        optimizer.apply(&mut network, &contexts)?;
    }

    let path = std::env::temp_dir().join("xor.dnn");
    network.save(&path)?;
    let mut restored = Network::load(&path)?;
    // activations are not stored in the file
    restored.set_activation(2, Activation::Sigmoid)?;

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, restored.infer(input)?[0]);
    }
    Ok(())
}
