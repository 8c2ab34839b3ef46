pub struct MseLoss;

impl MseLoss {
    /// Sum of squared errors: Σ (out - want)²
    pub fn loss(predicted: &[f32], expected: &[f32]) -> f32 {
        predicted.iter().zip(expected)
            .map(|(a, b)| (a - b).powi(2))
            .sum()
    }

    /// d/d(out) of the squared error: 2·(out - want)
    pub fn derivative(out: f32, want: f32) -> f32 {
        2.0 * (out - want)
    }
}
