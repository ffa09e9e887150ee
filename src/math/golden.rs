//! Golden-section search for the maximum of a unimodal function.

const INV_PHI: f64 = 0.618_033_988_749_894_8;

/// Maximise `f` on `[lo, hi]` and return the abscissa of the maximum.
///
/// The bracket shrinks by the golden ratio each step until it is narrower than
/// `tol`. Reused interior evaluations keep the cost at one `f` call per step.
/// If `f` is not unimodal on the bracket, a local maximum is returned.
pub fn maximize_bounded<F>(f: F, lo: f64, hi: f64, tol: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let (mut a, mut b) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    let tol = tol.max(f64::EPSILON * b.abs().max(1.0));

    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let mut fc = f(c);
    let mut fd = f(d);

    while b - a > tol {
        if fc > fd {
            b = d;
            d = c;
            fd = fc;
            c = b - INV_PHI * (b - a);
            fc = f(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + INV_PHI * (b - a);
            fd = f(d);
        }
    }

    0.5 * (a + b)
}
