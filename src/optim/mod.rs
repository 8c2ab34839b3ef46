pub mod sgd;

pub use sgd::{apply, Sgd};
