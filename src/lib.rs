#![doc = include_str!("../README.md")]

mod common;
mod constraint;
#[cfg(feature = "debug")]
pub mod debug;
mod error;
mod linear_programming;

use std::borrow::Cow;

pub use common::determinant;
pub use constraint::build_constraint;
pub use error::{AvoidanceError, AvoidanceResult};
pub use glam::Vec2;
pub use linear_programming::{
  solve_linear_program, solve_linear_program_with_fallback,
  InfeasibleFallback, KeepPartialValue, Line, LinearProgramResult,
  RVO_EPSILON,
};

/// A single agent: either the one computing a new velocity, or one of its
/// neighbours.
#[derive(Clone, PartialEq, Debug)]
pub struct Agent {
  /// The position of the agent.
  pub position: Vec2,
  /// The current velocity of the agent.
  pub velocity: Vec2,

  /// The radius of the agent. Agents will use this to avoid bumping into each
  /// other. Must be positive.
  pub radius: f32,
  /// The maximum speed the agent is allowed to move at. Must be non-negative.
  pub max_speed: f32,
  /// The velocity the agent would take with nobody around (usually the
  /// direction to its current goal/waypoint).
  pub preferred_velocity: Vec2,
}

/// The order in which neighbour constraints are handed to the solver. The
/// optimal velocity does not depend on it, but when not every neighbour can be
/// avoided, earlier neighbours take priority over later ones.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub enum NeighbourOrder {
  /// Keep the order of the `neighbours` slice.
  #[default]
  AsGiven,
  /// Sort neighbours by distance to the agent, closest first. Neighbours at
  /// the same distance keep their relative order. Reported line indices refer
  /// to this sorted order.
  NearestFirst,
}

/// Parameters for computing the avoidance vector.
#[derive(Clone, PartialEq, Debug)]
pub struct AvoidanceOptions {
  /// How long in the future should collisions be considered between agents.
  pub time_horizon: f32,
  /// How quickly agents that already overlap should separate. `None` uses the
  /// time step.
  pub overlap_time_horizon: Option<f32>,
  /// The priority of neighbours when not all of them can be avoided.
  pub neighbour_order: NeighbourOrder,
}

impl AvoidanceOptions {
  /// Creates options with `time_horizon`, separating overlapping agents within
  /// one time step and keeping the given neighbour order.
  pub fn new(time_horizon: f32) -> Self {
    Self {
      time_horizon,
      overlap_time_horizon: None,
      neighbour_order: NeighbourOrder::AsGiven,
    }
  }
}

impl Agent {
  /// Computes a velocity based off the agent's preferred velocity. This new
  /// velocity is intended to avoid running into the agent's `neighbours`. This
  /// is not always possible; when it is not, the best velocity found before
  /// the first unavoidable neighbour is returned. The result is at most
  /// `max_speed` in length. The `time_step` helps determine the velocity in
  /// cases of existing collisions, and must be positive.
  ///
  /// All agents of a simulation must compute their new velocity from the same
  /// snapshot before any of them moves.
  pub fn compute_new_velocity(
    &self,
    neighbours: &[Cow<'_, Agent>],
    time_step: f32,
    avoidance_options: &AvoidanceOptions,
  ) -> AvoidanceResult<Vec2> {
    self.compute_new_velocity_with_fallback(
      neighbours,
      time_step,
      avoidance_options,
      &KeepPartialValue,
    )
  }

  /// Same as [`Agent::compute_new_velocity`], but `fallback` decides the
  /// velocity when not all `neighbours` can be avoided.
  pub fn compute_new_velocity_with_fallback(
    &self,
    neighbours: &[Cow<'_, Agent>],
    time_step: f32,
    avoidance_options: &AvoidanceOptions,
    fallback: &impl InfeasibleFallback,
  ) -> AvoidanceResult<Vec2> {
    let constraints =
      self.get_constraints(neighbours, time_step, avoidance_options)?;

    Ok(solve_linear_program_with_fallback(
      &constraints,
      self.max_speed,
      self.preferred_velocity,
      fallback,
    ))
  }

  /// Same as [`Agent::compute_new_velocity`], but reports whether every
  /// neighbour could be avoided, and if not, which constraint failed.
  ///
  /// The reported index is in solve order. With
  /// [`NeighbourOrder::AsGiven`] that is the index into `neighbours`. With
  /// [`NeighbourOrder::NearestFirst`] it is the index into `neighbours` after
  /// a stable sort by distance to this agent.
  pub fn compute_avoidance(
    &self,
    neighbours: &[Cow<'_, Agent>],
    time_step: f32,
    avoidance_options: &AvoidanceOptions,
  ) -> AvoidanceResult<LinearProgramResult> {
    let constraints =
      self.get_constraints(neighbours, time_step, avoidance_options)?;

    Ok(solve_linear_program(
      &constraints,
      self.max_speed,
      self.preferred_velocity,
    ))
  }

  /// Same as [`Agent::compute_new_velocity`], but also returns the internal
  /// data used to compute the velocity.
  #[cfg(feature = "debug")]
  pub fn compute_new_velocity_with_debug(
    &self,
    neighbours: &[Cow<'_, Agent>],
    time_step: f32,
    avoidance_options: &AvoidanceOptions,
  ) -> AvoidanceResult<(Vec2, debug::DebugData)> {
    let constraints =
      self.get_constraints(neighbours, time_step, avoidance_options)?;

    let result = solve_linear_program(
      &constraints,
      self.max_speed,
      self.preferred_velocity,
    );

    let debug_data = match result {
      LinearProgramResult::Feasible(_) => {
        debug::DebugData::Satisfied { constraints }
      }
      LinearProgramResult::Infeasible {
        index_of_failed_line,
        partial_value,
      } => debug::DebugData::Infeasible {
        constraints,
        index_of_failed_line,
        partial_value,
      },
    };

    Ok((result.value(), debug_data))
  }

  /// Validates the inputs and creates one constraint per neighbour, in the
  /// order requested by `avoidance_options`.
  fn get_constraints(
    &self,
    neighbours: &[Cow<'_, Agent>],
    time_step: f32,
    avoidance_options: &AvoidanceOptions,
  ) -> AvoidanceResult<Vec<Line>> {
    let overlap_time_horizon =
      self.validate(neighbours, time_step, avoidance_options)?;

    tracing::trace!(
      neighbour_count = neighbours.len(),
      "computing avoiding velocity"
    );

    let mut neighbours =
      neighbours.iter().map(|neighbour| neighbour.as_ref()).collect::<Vec<_>>();

    if avoidance_options.neighbour_order == NeighbourOrder::NearestFirst {
      neighbours.sort_by(|a, b| {
        self
          .position
          .distance_squared(a.position)
          .total_cmp(&self.position.distance_squared(b.position))
      });
    }

    Ok(
      neighbours
        .into_iter()
        .map(|neighbour| {
          build_constraint(
            self,
            neighbour,
            avoidance_options.time_horizon,
            overlap_time_horizon,
          )
        })
        .collect(),
    )
  }

  /// Checks the invariants of the inputs. Returns the time horizon to use for
  /// overlapping agents.
  fn validate(
    &self,
    neighbours: &[Cow<'_, Agent>],
    time_step: f32,
    avoidance_options: &AvoidanceOptions,
  ) -> AvoidanceResult<f32> {
    // Negated comparisons so that NaN is rejected too.
    if !(time_step > 0.0) {
      return Err(AvoidanceError::NonPositiveTimeStep(time_step));
    }
    if !(avoidance_options.time_horizon > 0.0) {
      return Err(AvoidanceError::NonPositiveTimeHorizon(
        avoidance_options.time_horizon,
      ));
    }
    let overlap_time_horizon =
      avoidance_options.overlap_time_horizon.unwrap_or(time_step);
    if !(overlap_time_horizon > 0.0) {
      return Err(AvoidanceError::NonPositiveOverlapTimeHorizon(
        overlap_time_horizon,
      ));
    }

    if !(self.radius > 0.0) {
      return Err(AvoidanceError::NonPositiveRadius(self.radius));
    }
    if !(self.max_speed >= 0.0) {
      return Err(AvoidanceError::NegativeMaxSpeed(self.max_speed));
    }
    if !self.is_finite()
      || !self.max_speed.is_finite()
      || !self.preferred_velocity.is_finite()
    {
      return Err(AvoidanceError::NonFiniteAgent);
    }

    for (index, neighbour) in neighbours.iter().enumerate() {
      if !(neighbour.radius > 0.0) {
        return Err(AvoidanceError::NonPositiveNeighbourRadius {
          index,
          radius: neighbour.radius,
        });
      }
      if !neighbour.is_finite() {
        return Err(AvoidanceError::NonFiniteNeighbour { index });
      }
    }

    Ok(overlap_time_horizon)
  }

  /// Whether the state other agents read from this agent is finite.
  fn is_finite(&self) -> bool {
    self.position.is_finite()
      && self.velocity.is_finite()
      && self.radius.is_finite()
  }
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod test;
