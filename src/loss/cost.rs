use std::fmt;
use std::sync::Arc;

use super::cross_entropy::CrossEntropyLoss;
use super::mse::MseLoss;

/// User-supplied cost for training contexts.
pub trait CostFn: Send + Sync {
    /// Scalar cost of one example.
    fn loss(&self, outputs: &[f32], targets: &[f32]) -> f32;

    /// d(cost)/d(out) for one output node.
    fn derivative(&self, out: f32, want: f32) -> f32;
}

/// Selects the cost a training context differentiates.
///
/// - `Mse`          — sum of squared errors; derivative `2·(out - want)`.
/// - `CrossEntropy` — elementwise binary cross-entropy; pair with a sigmoid output.
/// - `Custom`       — any `CostFn`.
#[derive(Clone, Default)]
pub enum Cost {
    #[default]
    Mse,
    CrossEntropy,
    Custom(Arc<dyn CostFn>),
}

impl Cost {
    pub fn custom<C: CostFn + 'static>(c: C) -> Cost {
        Cost::Custom(Arc::new(c))
    }

    pub fn loss(&self, outputs: &[f32], targets: &[f32]) -> f32 {
        match self {
            Cost::Mse => MseLoss::loss(outputs, targets),
            Cost::CrossEntropy => CrossEntropyLoss::loss(outputs, targets),
            Cost::Custom(c) => c.loss(outputs, targets),
        }
    }

    pub fn derivative(&self, out: f32, want: f32) -> f32 {
        match self {
            Cost::Mse => MseLoss::derivative(out, want),
            Cost::CrossEntropy => CrossEntropyLoss::derivative(out, want),
            Cost::Custom(c) => c.derivative(out, want),
        }
    }
}

impl fmt::Debug for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Mse => f.write_str("Mse"),
            Cost::CrossEntropy => f.write_str("CrossEntropy"),
            Cost::Custom(_) => f.write_str("Custom"),
        }
    }
}
