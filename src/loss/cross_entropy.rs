/// Elementwise binary cross-entropy, for sigmoid-style outputs in [0, 1].
pub struct CrossEntropyLoss;

/// Keeps log() and the derivative's denominator away from zero.
const EPS: f32 = 1e-7;

impl CrossEntropyLoss {
    /// -Σ (want·ln(out + ε) + (1 - want)·ln(1 - out + ε))
    pub fn loss(predicted: &[f32], expected: &[f32]) -> f32 {
        predicted.iter().zip(expected)
            .map(|(p, y)| -(y * (p + EPS).ln() + (1.0 - y) * (1.0 - p + EPS).ln()))
            .sum()
    }

    /// (out - want) / ((out + ε)·(1 - out + ε))
    pub fn derivative(out: f32, want: f32) -> f32 {
        (out - want) / ((out + EPS) * (1.0 - out + EPS))
    }
}
