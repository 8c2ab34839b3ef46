use crate::error::{Error, Result};
use crate::loss::cost::Cost;
use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// How the activation gradient is carried back into the previous layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackpropMode {
    /// `dAct[i-1][k] = Σ_j dPreact[i][j] · W[i][j][k]`.
    #[default]
    Accumulate,
    /// Keeps only the last output node's term, `dPreact[i][n-1] · W[i][n-1][k]`.
    /// Mathematically wrong for layers wider than one node; it reproduces
    /// gradient traces recorded with older builds of this engine.
    LegacyOverwrite,
}

/// Cached forward values and gradients for one parameter layer.
#[derive(Debug, Clone)]
struct GradLayer {
    preact: Vec<f32>,
    act: Vec<f32>,
    d_act: Vec<f32>,
    d_preact: Vec<f32>,
    d_bias: Vec<f32>,
    d_weights: Matrix,
}

/// Zeroed buffer of length `n`; reports allocation failure.
fn zeros(n: usize) -> Result<Vec<f32>> {
    let mut v = Vec::new();
    v.try_reserve_exact(n)?;
    v.resize(n, 0.0);
    Ok(v)
}

impl GradLayer {
    fn new(size: usize, input_size: usize) -> Result<GradLayer> {
        Ok(GradLayer {
            preact: zeros(size)?,
            act: zeros(size)?,
            d_act: zeros(size)?,
            d_preact: zeros(size)?,
            d_bias: zeros(size)?,
            d_weights: Matrix::try_zeros(size, input_size)?,
        })
    }
}

/// Scratch space for one in-flight training example.
///
/// A context is bound to the network it was created from and is reused
/// across examples: every [`train_step`](Self::train_step) overwrites the
/// previous example's gradient, nothing accumulates. Contexts own all their
/// buffers, so any number of them may run against one `&Network` in
/// parallel.
#[derive(Debug, Clone)]
pub struct TrainingContext {
    network_id: u64,
    input: Vec<f32>,
    d_input: Vec<f32>,
    layers: Vec<GradLayer>,
    cost: Cost,
    mode: BackpropMode,
}

impl TrainingContext {
    pub fn new(network: &Network) -> Result<TrainingContext> {
        let sizes = network.topology().sizes();
        let mut layers = Vec::new();
        layers.try_reserve_exact(sizes.len() - 1)?;
        for pair in sizes.windows(2) {
            layers.push(GradLayer::new(pair[1], pair[0])?);
        }

        Ok(TrainingContext {
            network_id: network.id(),
            input: zeros(sizes[0])?,
            d_input: zeros(sizes[0])?,
            layers,
            cost: Cost::default(),
            mode: BackpropMode::default(),
        })
    }

    pub(crate) fn network_id(&self) -> u64 {
        self.network_id
    }

    pub fn is_bound_to(&self, network: &Network) -> bool {
        self.network_id == network.id()
    }

    pub fn cost(&self) -> &Cost {
        &self.cost
    }

    pub fn set_cost(&mut self, cost: Cost) {
        self.cost = cost;
    }

    pub fn backprop_mode(&self) -> BackpropMode {
        self.mode
    }

    pub fn set_backprop_mode(&mut self, mode: BackpropMode) {
        self.mode = mode;
    }

    /// Runs one forward and backward pass, leaving this example's gradient
    /// in the context. Never touches `network`.
    ///
    /// Fails without modifying any buffer if `network` is not the one the
    /// context was created for or the vector lengths are wrong.
    pub fn train_step(&mut self, network: &Network, input: &[f32], target: &[f32]) -> Result<()> {
        if !self.is_bound_to(network) {
            return Err(Error::Mismatch(format!(
                "context belongs to network #{}, not #{}",
                self.network_id,
                network.id()
            )));
        }
        let topology = network.topology();
        Error::check_len("input", topology.input_size(), input.len())?;
        Error::check_len("target", topology.output_size(), target.len())?;

        self.forward(network, input);

        let last = self.layers.len() - 1;
        let out = &mut self.layers[last];
        for ((d, &a), &want) in out.d_act.iter_mut().zip(&out.act).zip(target) {
            *d = self.cost.derivative(a, want);
        }

        self.backward(network);
        Ok(())
    }

    fn forward(&mut self, network: &Network, input: &[f32]) {
        self.input.copy_from_slice(input);
        for (i, layer) in network.layers().iter().enumerate() {
            let (done, rest) = self.layers.split_at_mut(i);
            let prev = match done.last() {
                Some(p) => &p.act[..],
                None => &self.input[..],
            };
            let cur = &mut rest[0];
            layer.feed(prev, &mut cur.preact, &mut cur.act);
        }
    }

    fn backward(&mut self, network: &Network) {
        for (i, layer) in network.layers().iter().enumerate().rev() {
            let (before, rest) = self.layers.split_at_mut(i);
            let cur = &mut rest[0];
            let (prev_act, prev_d_act) = match before.last_mut() {
                Some(p) => (&p.act[..], &mut p.d_act[..]),
                None => (&self.input[..], &mut self.d_input[..]),
            };

            let activation = layer.activation();
            for (j, (dz, &z)) in cur.d_preact.iter_mut().zip(&cur.preact).enumerate() {
                *dz = activation.derivative(z) * cur.d_act[j];
            }
            cur.d_bias.copy_from_slice(&cur.d_preact);

            for (j, &dz) in cur.d_preact.iter().enumerate() {
                for (dw, &a) in cur.d_weights.row_mut(j).iter_mut().zip(prev_act) {
                    *dw = dz * a;
                }
            }

            let weights = layer.weights();
            match self.mode {
                BackpropMode::Accumulate => {
                    prev_d_act.fill(0.0);
                    for (j, &dz) in cur.d_preact.iter().enumerate() {
                        for (d, &w) in prev_d_act.iter_mut().zip(weights.row(j)) {
                            *d += dz * w;
                        }
                    }
                }
                BackpropMode::LegacyOverwrite => {
                    let j = cur.d_preact.len() - 1;
                    let dz = cur.d_preact[j];
                    for (d, &w) in prev_d_act.iter_mut().zip(weights.row(j)) {
                        *d = dz * w;
                    }
                }
            }
        }
    }

    /// Network output from the most recent `train_step`.
    pub fn output(&self) -> &[f32] {
        &self.layers[self.layers.len() - 1].act
    }

    /// Cost of the most recent example under this context's cost.
    pub fn loss(&self, target: &[f32]) -> f32 {
        self.cost.loss(self.output(), target)
    }

    /// d(cost)/d(input) from the most recent `train_step`. Feed it to an
    /// upstream network to chain two networks together.
    pub fn input_gradient(&self) -> &[f32] {
        &self.d_input
    }

    /// Activation gradient of layer `index` in `[0, layer_count - 1]`.
    pub fn activation_gradient(&self, index: usize) -> Result<&[f32]> {
        if index == 0 {
            return Ok(&self.d_input);
        }
        self.grad_layer(index).map(|g| &g.d_act[..])
    }

    /// Weight gradient of parameter layer `index`, shaped like its weights.
    pub fn weight_gradient(&self, index: usize) -> Result<&Matrix> {
        self.grad_layer(index).map(|g| &g.d_weights)
    }

    pub fn bias_gradient(&self, index: usize) -> Result<&[f32]> {
        self.grad_layer(index).map(|g| &g.d_bias[..])
    }

    fn grad_layer(&self, index: usize) -> Result<&GradLayer> {
        if index == 0 || index > self.layers.len() {
            return Err(Error::Range { index, layer_count: self.layers.len() + 1 });
        }
        Ok(&self.layers[index - 1])
    }

    /// Per-layer `(weights, biases)` gradients, layer 1 first.
    pub(crate) fn gradients(&self) -> impl Iterator<Item = (&Matrix, &[f32])> {
        self.layers.iter().map(|g| (&g.d_weights, &g.d_bias[..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::Activation;

    fn fixed_network() -> Network {
        let mut net = Network::from_sizes(&[2, 2, 1]).unwrap();
        net.set_activation(1, Activation::Identity).unwrap();
        net.set_activation(2, Activation::Identity).unwrap();
        net.layer_mut(1).unwrap().weights_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        net.layer_mut(2).unwrap().weights_mut().copy_from_slice(&[0.5, -1.0]);
        net
    }

    #[test]
    fn rejects_foreign_network() {
        let net = fixed_network();
        let other = fixed_network();
        let mut ctx = TrainingContext::new(&net).unwrap();
        assert!(matches!(
            ctx.train_step(&other, &[1.0, 1.0], &[0.0]),
            Err(Error::Mismatch(_))
        ));
    }

    #[test]
    fn rejects_wrong_lengths() {
        let net = fixed_network();
        let mut ctx = TrainingContext::new(&net).unwrap();
        assert!(matches!(
            ctx.train_step(&net, &[1.0], &[0.0]),
            Err(Error::Shape { what: "input", .. })
        ));
        assert!(matches!(
            ctx.train_step(&net, &[1.0, 1.0], &[0.0, 1.0]),
            Err(Error::Shape { what: "target", .. })
        ));
    }

    #[test]
    fn linear_network_gradients_by_hand() {
        let net = fixed_network();
        let mut ctx = TrainingContext::new(&net).unwrap();
        ctx.train_step(&net, &[1.0, 1.0], &[0.0]).unwrap();

        // hidden = [3, 7], out = 0.5*3 - 7 = -5.5, dOut = 2 * -5.5 = -11
        assert_eq!(ctx.output(), &[-5.5]);
        assert_eq!(ctx.bias_gradient(2).unwrap(), &[-11.0]);
        assert_eq!(ctx.weight_gradient(2).unwrap().as_slice(), &[-33.0, -77.0]);
        // dHidden = [-5.5, 11]
        assert_eq!(ctx.activation_gradient(1).unwrap(), &[-5.5, 11.0]);
        assert_eq!(ctx.weight_gradient(1).unwrap().as_slice(), &[-5.5, -5.5, 11.0, 11.0]);
        // dInput[k] = -5.5*W[0][k] + 11*W[1][k]
        assert_eq!(ctx.input_gradient(), &[27.5, 33.0]);
    }

    #[test]
    fn legacy_mode_keeps_only_last_output_node() {
        let net = fixed_network();
        let mut ctx = TrainingContext::new(&net).unwrap();
        ctx.set_backprop_mode(BackpropMode::LegacyOverwrite);
        ctx.train_step(&net, &[1.0, 1.0], &[0.0]).unwrap();
        assert_eq!(ctx.input_gradient(), &[33.0, 44.0]);
    }

    #[test]
    fn steps_overwrite_rather_than_accumulate() {
        let net = fixed_network();
        let mut ctx = TrainingContext::new(&net).unwrap();
        ctx.train_step(&net, &[1.0, 1.0], &[0.0]).unwrap();
        let first = ctx.weight_gradient(1).unwrap().clone();
        ctx.train_step(&net, &[1.0, 1.0], &[0.0]).unwrap();
        assert_eq!(ctx.weight_gradient(1).unwrap(), &first);
    }

    #[test]
    fn new_context_buffers_match_topology() {
        let net = Network::from_sizes(&[5, 3, 2]).unwrap();
        let ctx = TrainingContext::new(&net).unwrap();
        assert_eq!(ctx.input_gradient(), &[0.0; 5]);
        assert_eq!(ctx.output(), &[0.0; 2]);
        assert_eq!(ctx.weight_gradient(1).unwrap().cols(), 5);
    }

    #[test]
    fn gradient_accessors_range_check() {
        let net = fixed_network();
        let ctx = TrainingContext::new(&net).unwrap();
        assert!(matches!(ctx.weight_gradient(0), Err(Error::Range { .. })));
        assert!(matches!(ctx.bias_gradient(3), Err(Error::Range { .. })));
        assert!(ctx.activation_gradient(0).is_ok());
    }
}
