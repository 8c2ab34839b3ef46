//! Fully-connected feedforward networks with explicit training contexts.
//!
//! A [`Network`] owns the parameters. Each concurrently running example gets
//! its own [`TrainingContext`], which caches the forward pass and holds that
//! example's gradient after [`TrainingContext::train_step`]. [`Sgd::apply`]
//! averages a batch of contexts into one update. Because `train_step` and
//! [`Network::infer`] borrow the network shared and `apply` borrows it
//! exclusively, a batch must finish before its update runs.
//!
//! ```no_run
//! use danknn::{Activation, Network, Sgd, TrainingContext};
//!
//! let mut net = Network::from_sizes(&[2, 3, 1])?;
//! net.set_activation(2, Activation::Sigmoid)?;
//! net.initialize_seeded(1);
//!
//! let mut ctx = TrainingContext::new(&net)?;
//! ctx.train_step(&net, &[1.0, 0.0], &[1.0])?;
//! Sgd::new(0.1).apply(&mut net, std::slice::from_ref(&ctx))?;
//!
//! net.save("xor.dnn")?;
//! let back = Network::load("xor.dnn")?;
//! println!("{:?}", back.infer(&[1.0, 0.0])?);
//! # Ok::<(), danknn::Error>(())
//! ```

pub mod activation;
pub mod error;
pub mod layers;
pub mod loss;
pub mod math;
pub mod network;
pub mod optim;
pub mod persist;
pub mod train;

// Convenience re-exports
pub use activation::activation::{Activation, ActivationFn};
pub use error::{Error, Result};
pub use layers::dense::Layer;
pub use loss::cost::{Cost, CostFn};
pub use math::matrix::Matrix;
pub use network::network::Network;
pub use network::spec::NetworkSpec;
pub use network::topology::Topology;
pub use optim::sgd::Sgd;
pub use train::context::{BackpropMode, TrainingContext};
pub use train::loop_fn::train_loop;
pub use train::train_config::TrainConfig;
