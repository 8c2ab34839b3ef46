use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// User-supplied nonlinearity for layers the named variants don't cover.
///
/// `derivative` is taken with respect to the weighted sum, i.e. it receives
/// the same `x` that `function` does.
pub trait ActivationFn: Send + Sync {
    fn function(&self, x: f32) -> f32;
    fn derivative(&self, x: f32) -> f32;

    fn name(&self) -> &str {
        "custom"
    }
}

/// Per-layer nonlinearity.
///
/// Each variant carries both the function and its derivative, so a training
/// context always differentiates the activation the network actually used.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Sigmoid,
    #[default]
    Swish,
    Identity,
    Tanh,
    Relu,
    #[serde(skip)]
    Custom(Arc<dyn ActivationFn>),
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

impl Activation {
    pub fn custom<F: ActivationFn + 'static>(f: F) -> Activation {
        Activation::Custom(Arc::new(f))
    }

    pub fn function(&self, x: f32) -> f32 {
        match self {
            Activation::Sigmoid => sigmoid(x),
            Activation::Swish => x * sigmoid(x),
            Activation::Identity => x,
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
            Activation::Custom(f) => f.function(x),
        }
    }

    pub fn derivative(&self, x: f32) -> f32 {
        match self {
            Activation::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            // swish(x) + σ(x)(1 - swish(x))
            Activation::Swish => {
                let s = sigmoid(x);
                let sw = x * s;
                sw + s * (1.0 - sw)
            }
            Activation::Identity => 1.0,
            Activation::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            Activation::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Custom(f) => f.derivative(x),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Swish => "swish",
            Activation::Identity => "identity",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
            Activation::Custom(f) => f.name(),
        }
    }
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Custom(c) => write!(f, "Custom({})", c.name()),
            other => f.write_str(other.name()),
        }
    }
}

impl PartialEq for Activation {
    /// Custom strategies compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Activation::Custom(a), Activation::Custom(b)) => Arc::ptr_eq(a, b),
            (Activation::Sigmoid, Activation::Sigmoid)
            | (Activation::Swish, Activation::Swish)
            | (Activation::Identity, Activation::Identity)
            | (Activation::Tanh, Activation::Tanh)
            | (Activation::Relu, Activation::Relu) => true,
            _ => false,
        }
    }
}
