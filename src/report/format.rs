//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the solver/fitting code stays clean and testable
//! - output changes are localized (snapshot-style tests below)

use crate::domain::{FitResult, ModelParameters, Observation, Transition};

/// Fit summary: predicted parameters followed by optimizer diagnostics.
pub fn format_fit_report(
    source: &str,
    observations: &[Observation],
    initial: &ModelParameters,
    result: &FitResult,
) -> String {
    let mut out = String::new();
    let p = &result.params;
    let range = result.active_range;

    out.push_str(&format!("=== sco - parameter fit ({source}) ===\n"));
    out.push_str(&format!(
        "Samples: n={} | active range {}..={} (T = {:.2} .. {:.2} K, {} points)\n",
        observations.len(),
        range.start,
        range.end,
        observations[range.start].temperature,
        observations[range.end].temperature,
        range.len()
    ));
    out.push_str(&format!(
        "Initial: dH={:.3} dS={:.4} W={:.3} gamma={:.3}\n\n",
        initial.dh, initial.ds, initial.w, initial.gamma
    ));

    out.push_str("*** Predicted parameters ***\n");
    out.push_str(&format!("dH = {}  J/mol\n", p.dh.round()));
    out.push_str(&format!("dS = {:.2}  J/Kmol\n", p.ds));
    out.push_str(&format!("W = {:.2}  J/mol\n", p.w));
    out.push_str(&format!("\u{3b3} = {:.2}  J/mol\n\n", p.gamma));

    out.push_str(&format!(
        "Fit: SSE={:.6e} RMSE={:.6e} | iterations={} sweeps={} penalized={} | stop={:?}\n",
        result.cost,
        result.rmse,
        result.iterations,
        result.evaluations,
        result.penalized_trials,
        result.termination
    ));
    out
}

/// The `top_n` samples with the largest absolute residual.
pub fn format_worst_residuals(
    observations: &[Observation],
    result: &FitResult,
    top_n: usize,
) -> String {
    let window = result.active_range.slice(observations);
    let mut rows: Vec<(&Observation, f64)> = window
        .iter()
        .zip(result.residuals.iter().copied())
        .collect();
    rows.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

    let mut out = String::new();
    out.push_str("Largest residuals (predicted - observed):\n");
    out.push_str(
        format!(
            "{:>10} {:>12} {:>12} {:>12}",
            "T", "chi_t_obs", "chi_t_fit", "residual"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:->10} {:->12} {:->12} {:->12}", "", "", "", "").trim_end());
    out.push('\n');
    for (o, r) in rows.into_iter().take(top_n) {
        out.push_str(&format!(
            "{:>10.2} {:>12.6} {:>12.6} {:>12.3e}\n",
            o.temperature,
            o.chi_t,
            o.chi_t + r,
            r
        ));
    }
    out
}

/// Transition temperatures of one system, truncated to whole kelvin.
pub fn format_transition(name: &str, transition: &Transition) -> String {
    let mut out = String::new();
    out.push_str(&format!("*** {name} ***\n"));
    out.push_str("------------------\n");
    out.push_str(&format!("T\u{bd} = {}\n", transition.t_half() as i64));
    if let Transition::TwoStep { lower, upper, .. } = transition {
        out.push_str(&format!("T\u{bd} (SS-SQ) = {}\n", lower.trunc() as i64));
        out.push_str(&format!("T\u{bd} (SQ-QQ) = {}\n", upper.trunc() as i64));
    }
    out
}

/// One-line description of a parameter set.
pub fn format_parameters(params: &ModelParameters) -> String {
    format!(
        "dH={:.3} J/mol, dS={:.4} J/(K·mol), W={:.3} J/mol, gamma={:.3} J/mol",
        params.dh, params.ds, params.w, params.gamma
    )
}
