/// Computes the [autocorrelation](https://en.wikipedia.org/wiki/Autocorrelation)
/// of a window at a single lag, summing `len` lagged products,
/// i.e `window[j] * window[j + lag]` for `j` in `0..len`.
///
/// Returns 0 if the lagged range does not fit in the window.
pub fn lagged_sum(window: &[f32], lag: usize, len: usize) -> f32 {
    match lag.checked_add(len) {
        Some(end) if end <= window.len() => window[lag..end]
            .iter()
            .zip(window[..len].iter())
            .map(|(lagged, sample)| lagged * sample)
            .sum(),
        _ => 0.0,
    }
}

/// The number of bits needed to represent `x - 1`, i.e `ceil(log2(x))`.
/// Returns 0 for `x <= 1`.
pub fn log2_ceil(x: usize) -> u32 {
    if x <= 1 {
        return 0;
    }
    x.checked_next_power_of_two()
        .map(|p| p.trailing_zeros())
        .unwrap_or(usize::BITS)
}

/// The lag increment to use after evaluating `lag` when searching
/// for autocorrelation peaks. Lags are visited one at a time
/// up to `2^max_log2_bins`, after which the step doubles every octave.
/// This keeps the number of evaluated lags per octave bounded.
pub fn octave_step(lag: usize, max_log2_bins: u32) -> usize {
    let octave = log2_ceil(lag);
    if octave <= max_log2_bins {
        1
    } else {
        1_usize
            .checked_shl(octave - max_log2_bins)
            .unwrap_or(usize::MAX)
    }
}
