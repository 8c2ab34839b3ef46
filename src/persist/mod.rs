pub mod binary;

pub use binary::{load, read_from, save, write_to};
