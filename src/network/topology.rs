use crate::error::{Error, Result};

/// Ordered layer widths; `sizes[0]` is the input width and the last entry
/// the output width. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Topology {
    sizes: Vec<usize>,
}

impl Topology {
    pub fn new(sizes: &[usize]) -> Result<Topology> {
        if sizes.len() < 2 {
            return Err(Error::InvalidTopology(format!(
                "need at least 2 layers, got {}",
                sizes.len()
            )));
        }
        if let Some(i) = sizes.iter().position(|&s| s == 0) {
            return Err(Error::InvalidTopology(format!("layer {i} has size 0")));
        }
        Ok(Topology { sizes: sizes.to_vec() })
    }

    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Total layers, input included.
    pub fn layer_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn input_size(&self) -> usize {
        self.sizes[0]
    }

    pub fn output_size(&self) -> usize {
        self.sizes[self.sizes.len() - 1]
    }

    /// Fails with `Range` unless `layer` names a layer that owns parameters.
    pub fn check_layer(&self, layer: usize) -> Result<()> {
        if layer == 0 || layer >= self.sizes.len() {
            Err(Error::Range { index: layer, layer_count: self.sizes.len() })
        } else {
            Ok(())
        }
    }
}
