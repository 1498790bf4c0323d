//! Closed-form kinetics shared by the reference mechanisms.

/// Exact solution of `dS/dt = k_on·f·(1 − S) − k_off·S` for constant `f`.
///
/// `S(t0 + dt) = S* + (S0 − S*)·exp(−(k_on·f + k_off)·dt)` with
/// `S* = k_on·f / (k_on·f + k_off)`. The result stays in `[0, 1]` for
/// `S0, f ∈ [0, 1]` and is exact for any `dt`, so the axis itself has
/// no step-size error.
pub fn relax_stress(s0: f64, stimulus: f64, k_on: f64, k_off: f64, dt: f64) -> f64 {
    let drive = k_on * stimulus;
    let total = drive + k_off;
    if total <= 0.0 || dt <= 0.0 {
        return s0;
    }
    let steady = drive / total;
    let s1 = steady + (s0 - steady) * (-total * dt).exp();
    s1.clamp(0.0, 1.0)
}

/// Saturating combination of independent stimuli: `1 − Π(1 − f_i)`.
pub fn combine_stimuli(terms: impl IntoIterator<Item = f64>) -> f64 {
    let miss: f64 = terms
        .into_iter()
        .map(|f| 1.0 - f.clamp(0.0, 1.0))
        .product();
    1.0 - miss
}

/// Normalized excess of `level` over `threshold`: `((x − θ)/(1 − θ))⁺`.
pub fn excess_over(level: f64, threshold: f64) -> f64 {
    if threshold >= 1.0 {
        return 0.0;
    }
    ((level - threshold) / (1.0 - threshold)).clamp(0.0, 1.0)
}

/// Fractional shortfall of `level` below `critical`: `(1 − x/c)⁺`.
pub fn shortfall_below(level: f64, critical: f64) -> f64 {
    if critical <= 0.0 {
        return 0.0;
    }
    (1.0 - level / critical).clamp(0.0, 1.0)
}
