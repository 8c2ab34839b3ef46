pub mod context;
pub mod loop_fn;
pub mod train_config;

pub use context::{BackpropMode, TrainingContext};
pub use loop_fn::train_loop;
pub use train_config::TrainConfig;
