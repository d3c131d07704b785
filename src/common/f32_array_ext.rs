//! `[f32]` extensions.

/// `[f32]` extensions.
pub trait F32ArrayExt {
    /// Returns the maximum absolute value.
    fn peak_level(&self) -> f32;
    /// Returns the sum of squared values, i.e the autocorrelation at lag 0.
    fn energy(&self) -> f32;
    /// Returns the [root mean square](https://en.wikipedia.org/wiki/Root_mean_square)
    /// level.
    fn rms_level(&self) -> f32;
}

impl F32ArrayExt for [f32] {
    fn peak_level(&self) -> f32 {
        self.iter().fold(0.0_f32, |max, sample| max.max(sample.abs()))
    }

    fn energy(&self) -> f32 {
        self.iter().map(|sample| sample * sample).sum()
    }

    fn rms_level(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        };
        (self.energy() / (self.len() as f32)).sqrt()
    }
}
