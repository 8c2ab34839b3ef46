use crate::{activation::activation::Activation, error::Result, math::matrix::Matrix};

/// Parameters of one fully-connected layer.
///
/// `weights` is `[size × input_size]`: one row per output node.
#[derive(Debug, Clone)]
pub struct Layer {
    weights: Matrix,
    biases: Vec<f32>,
    activation: Activation,
}

impl Layer {
    /// Allocates a zeroed layer with the default activation.
    pub fn new(size: usize, input_size: usize) -> Result<Layer> {
        let weights = Matrix::try_zeros(size, input_size)?;
        let mut biases = Vec::new();
        biases.try_reserve_exact(size)?;
        biases.resize(size, 0.0);

        Ok(Layer {
            weights,
            biases,
            activation: Activation::default(),
        })
    }

    pub fn size(&self) -> usize {
        self.biases.len()
    }

    pub fn input_size(&self) -> usize {
        self.weights.cols()
    }

    pub fn weights(&self) -> &Matrix {
        &self.weights
    }

    /// Row-major weights (output node, then input node).
    pub fn weights_mut(&mut self) -> &mut [f32] {
        self.weights.as_mut_slice()
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    pub fn biases_mut(&mut self) -> &mut [f32] {
        &mut self.biases
    }

    pub fn activation(&self) -> &Activation {
        &self.activation
    }

    pub(crate) fn set_activation(&mut self, activation: Activation) {
        self.activation = activation;
    }

    /// `preact = W·input + b`, `act = f(preact)`.
    ///
    /// Slice lengths must already match the layer.
    pub fn feed(&self, input: &[f32], preact: &mut [f32], act: &mut [f32]) {
        self.weights.mul_vec(input, preact);
        for ((z, a), b) in preact.iter_mut().zip(act.iter_mut()).zip(&self.biases) {
            *z += b;
            *a = self.activation.function(*z);
        }
    }
}
