//! First differences on non-uniform grids.

/// `(v[i+1] - v[i]) / (t[i+1] - t[i])` for every interval of the grid.
///
/// Returns one value per interval (`n - 1` values for `n` samples). Empty for
/// fewer than two samples.
pub fn forward_differences(t: &[f64], v: &[f64]) -> Vec<f64> {
    t.windows(2)
        .zip(v.windows(2))
        .map(|(tw, vw)| (vw[1] - vw[0]) / (tw[1] - tw[0]))
        .collect()
}
