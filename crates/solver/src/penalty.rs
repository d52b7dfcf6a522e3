//! Penalty shaping: maps a signed violation onto a smooth, bounded loss.

/// Violation magnitude, in units of the scale, where the exponential regime
/// hands over to polynomial growth.
const DEFAULT_KNEE: f64 = 1.0;

/// Smooth, monotonic penalty for a signed violation `x` (positive = bad),
/// with the knee fixed at one scale unit.
pub fn safe_exp_penalty(x: f64, scale: f64) -> f64 {
    safe_exp_penalty_with_knee(x, scale, DEFAULT_KNEE)
}

/// General form of the shaped penalty.
///
/// Below the knee the loss is `exp(x / scale)`: fine-grained exponential
/// sensitivity near the safety boundary. Past the knee the exponential is
/// frozen at its knee value and extended by a matching linear term plus a
/// quadratic correction, so the value and first derivative stay continuous
/// while gross violations can neither overflow nor produce runaway update
/// steps.
pub fn safe_exp_penalty_with_knee(x: f64, scale: f64, knee: f64) -> f64 {
    let u = x / scale;
    let over = (u - knee).max(0.0);
    u.min(knee).exp() + knee.exp() * over + over * over / 2.0
}
