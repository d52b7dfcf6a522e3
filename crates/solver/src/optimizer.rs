//! Adaptive gradient-descent placement loop.
//!
//! Drives the composed objective with a hand-rolled, bias-corrected
//! Adam-style update over item positions until the loss plateaus or an
//! iteration cap is hit. Masses and geometry stay fixed; only positions
//! move. The loop is single-threaded and deterministic for given initial
//! positions; it generates no randomness of its own.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace, warn};

use crate::item::{ItemSet, PlacementError};
use crate::objective::{self, ObjectiveParams};

/// Caller-visible tuning for one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Safety radius of the penalty shaping, meters. Doubles as the Adam
    /// learning rate, so step sizes stay commensurate with the distance
    /// scale the penalties react over.
    pub safe_distance: f64,
    /// Relative plateau tolerance: stop once the loss window's standard
    /// deviation drops to this fraction of its mean.
    pub tolerance: f64,
    /// Length of the rolling loss window the plateau test runs over.
    pub history_len: usize,
    /// Hard iteration cap. Hitting it without a plateau yields
    /// [`PlacementStatus::Capped`].
    pub max_iterations: usize,
    /// Axis whose absolute coordinate is penalized for centering.
    pub lateral_axis: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            safe_distance: 0.1,
            tolerance: 1e-3,
            history_len: 100,
            max_iterations: 10_000,
            lateral_axis: 0,
        }
    }
}

impl OptimizerConfig {
    fn validate(&self) -> Result<(), PlacementError> {
        if !(self.safe_distance > 0.0 && self.safe_distance.is_finite()) {
            return Err(PlacementError::InvalidConfig {
                reason: "safe_distance must be positive and finite".into(),
            });
        }
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(PlacementError::InvalidConfig {
                reason: "tolerance must be non-negative and finite".into(),
            });
        }
        if self.history_len < 2 {
            return Err(PlacementError::InvalidConfig {
                reason: "history_len must be at least 2".into(),
            });
        }
        if self.max_iterations == 0 {
            return Err(PlacementError::InvalidConfig {
                reason: "max_iterations must be at least 1".into(),
            });
        }
        if self.lateral_axis >= 3 {
            return Err(PlacementError::InvalidConfig {
                reason: "lateral_axis must be 0, 1 or 2".into(),
            });
        }
        Ok(())
    }
}

/// How a run terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementStatus {
    /// The loss plateaued within tolerance.
    Converged,
    /// The iteration cap was hit before a plateau. Callers should surface
    /// this as "no feasible arrangement found", never as a valid layout.
    Capped,
}

/// Result of one optimization run. The finalized positions live in the
/// [`ItemSet`] the run mutated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlacementResult {
    pub status: PlacementStatus,
    /// Number of update steps performed.
    pub iterations: usize,
    /// Objective value of the finalized configuration.
    pub final_loss: f64,
}

/// Read-only view of one iteration, handed to observers for diagnostics.
#[derive(Debug)]
pub struct IterationSnapshot<'a> {
    pub iteration: usize,
    pub loss: f64,
    pub positions: &'a [Vector3<f64>],
    pub extents: &'a [Vector3<f64>],
    pub item_losses: &'a [f64],
}

/// Per-iteration diagnostic hook, e.g. a renderer. Observers must not feed
/// anything back into the run; their latency is on the caller.
pub trait PlacementObserver {
    fn on_iteration(&mut self, snapshot: &IterationSnapshot<'_>);
}

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPS: f64 = 1e-8;

/// Per-parameter running first/second moment estimates with bias
/// correction.
struct AdamState {
    first: Vec<f64>,
    second: Vec<f64>,
    step: u32,
    learning_rate: f64,
}

impl AdamState {
    fn new(param_count: usize, learning_rate: f64) -> Self {
        Self {
            first: vec![0.0; param_count],
            second: vec![0.0; param_count],
            step: 0,
            learning_rate,
        }
    }

    fn apply(&mut self, params: &mut [f64], gradient: &[f64]) {
        self.step += 1;
        let bias1 = 1.0 - ADAM_BETA1.powi(self.step as i32);
        let bias2 = 1.0 - ADAM_BETA2.powi(self.step as i32);
        for i in 0..params.len() {
            self.first[i] = ADAM_BETA1 * self.first[i] + (1.0 - ADAM_BETA1) * gradient[i];
            self.second[i] =
                ADAM_BETA2 * self.second[i] + (1.0 - ADAM_BETA2) * gradient[i] * gradient[i];
            let first_hat = self.first[i] / bias1;
            let second_hat = self.second[i] / bias2;
            params[i] -= self.learning_rate * first_hat / (second_hat.sqrt() + ADAM_EPS);
        }
    }
}

/// Central-difference gradient of the composed loss with respect to item
/// positions. Analytic derivatives would be faster, but the loss is a small
/// closed-form composition and the sets are a handful of items, so finite
/// differences are reliable and cheap enough.
fn compute_gradient(set: &ItemSet, params: &mut [f64], obj: &ObjectiveParams) -> Vec<f64> {
    let h = 1e-8;
    let mut gradient = vec![0.0; params.len()];
    for i in 0..params.len() {
        let orig = params[i];
        params[i] = orig + h;
        let loss_plus = objective::total_loss(set, params, obj);
        params[i] = orig - h;
        let loss_minus = objective::total_loss(set, params, obj);
        params[i] = orig;
        gradient[i] = (loss_plus - loss_minus) / (2.0 * h);
    }
    gradient
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    (values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64).sqrt()
}

fn write_back(set: &mut ItemSet, params: &[f64]) {
    for (i, item) in set.items_mut().iter_mut().enumerate() {
        item.position = Vector3::new(params[3 * i], params[3 * i + 1], params[3 * i + 2]);
    }
}

/// Optimize item positions in place. See [`solve_placement_observed`] for
/// the variant with a per-iteration observer.
pub fn solve_placement(
    set: &mut ItemSet,
    config: &OptimizerConfig,
) -> Result<PlacementResult, PlacementError> {
    run(set, config, None)
}

/// Optimize item positions in place, invoking `observer` after every update
/// step with a read-only snapshot of the new state.
pub fn solve_placement_observed(
    set: &mut ItemSet,
    config: &OptimizerConfig,
    observer: &mut dyn PlacementObserver,
) -> Result<PlacementResult, PlacementError> {
    run(set, config, Some(observer))
}

#[instrument(skip_all, fields(items = set.len()))]
fn run(
    set: &mut ItemSet,
    config: &OptimizerConfig,
    mut observer: Option<&mut dyn PlacementObserver>,
) -> Result<PlacementResult, PlacementError> {
    config.validate()?;

    // With no items the center-of-mass term would divide by zero; there is
    // nothing to place, so the run is a no-op success.
    if set.is_empty() {
        return Ok(PlacementResult {
            status: PlacementStatus::Converged,
            iterations: 0,
            final_loss: 0.0,
        });
    }

    let obj = ObjectiveParams {
        safe_distance: config.safe_distance,
        lateral_axis: config.lateral_axis,
    };

    let mut params: Vec<f64> = set
        .items()
        .iter()
        .flat_map(|item| [item.position.x, item.position.y, item.position.z])
        .collect();

    let initial = objective::total_loss(set, &params, &obj);
    if !initial.is_finite() {
        return Err(PlacementError::NonFiniteLoss { iteration: 0 });
    }

    let mut history = Vec::with_capacity(config.history_len + 1);
    history.push(initial);

    let extents: Vec<Vector3<f64>> = set.items().iter().map(|item| item.extents).collect();
    let mut adam = AdamState::new(params.len(), config.safe_distance);

    for iteration in 0..config.max_iterations {
        let loss = objective::total_loss(set, &params, &obj);
        let gradient = compute_gradient(set, &mut params, &obj);
        if !loss.is_finite() || gradient.iter().any(|g| !g.is_finite()) {
            return Err(PlacementError::NonFiniteLoss { iteration });
        }

        adam.apply(&mut params, &gradient);

        history.push(loss);
        if history.len() > config.history_len {
            history.remove(0);
        }

        trace!(iteration, loss, "placement step");

        if let Some(observer) = observer.as_deref_mut() {
            let positions: Vec<Vector3<f64>> = (0..set.len())
                .map(|i| Vector3::new(params[3 * i], params[3 * i + 1], params[3 * i + 2]))
                .collect();
            let item_losses = objective::item_losses(set, &params, &obj);
            observer.on_iteration(&IterationSnapshot {
                iteration,
                loss,
                positions: &positions,
                extents: &extents,
                item_losses: &item_losses,
            });
        }

        // Relative plateau test over the full window: tolerant of different
        // problem scales, unlike an absolute loss threshold.
        if history.len() == config.history_len
            && std_dev(&history) <= config.tolerance * mean(&history)
        {
            write_back(set, &params);
            let final_loss = objective::total_loss(set, &params, &obj);
            let result = PlacementResult {
                status: PlacementStatus::Converged,
                iterations: iteration + 1,
                final_loss,
            };
            info!(
                iterations = result.iterations,
                final_loss = result.final_loss,
                "placement converged"
            );
            return Ok(result);
        }
    }

    write_back(set, &params);
    let final_loss = objective::total_loss(set, &params, &obj);
    warn!(
        max_iterations = config.max_iterations,
        final_loss, "iteration cap hit before plateau; no feasible arrangement found"
    );
    Ok(PlacementResult {
        status: PlacementStatus::Capped,
        iterations: config.max_iterations,
        final_loss,
    })
}
