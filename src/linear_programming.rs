// The contents of this file were primarily ported from Agent.cc from RVO2 with
// significant alterations. As per the Apache-2.0 license, the original
// copyright notice has been included, excluding those notices that do not
// pertain to the derivate work:
//
// Agent.cc
// RVO2 Library
//
// SPDX-FileCopyrightText: 2008 University of North Carolina at Chapel Hill
//
// The authors may be contacted via:
//
// Jur van den Berg, Stephen J. Guy, Jamie Snape, Ming C. Lin, Dinesh Manocha
// Dept. of Computer Science
// 201 S. Columbia St.
// Frederick P. Brooks, Jr. Computer Science Bldg.
// Chapel Hill, N.C. 27599-3175
// United States of America
//
// <https://gamma.cs.unc.edu/RVO2/>

use std::borrow::Cow;

use glam::Vec2;

use crate::common::determinant;

/// A half-plane to act as a constraint on the linear program. This is
/// represented as a point and a direction, where the valid half-plane resides
/// on the counter-clockwise side of `direction` and `point`.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Line {
  pub point: Vec2,
  /// Does not need to have length = 1; the solver normalizes it. Note that
  /// [`Line::signed_distance`] is scaled by the length of `direction`.
  pub direction: Vec2,
}

impl Line {
  /// Creates a line through `point` along `direction`, normalizing
  /// `direction`. Returns `None` if `direction` has no usable length.
  pub fn new(point: Vec2, direction: Vec2) -> Option<Self> {
    direction.try_normalize().map(|direction| Self { point, direction })
  }

  /// The signed distance from `value` to the line (multiplied by the length
  /// of `direction`). Positive values are on the valid side of the half-plane.
  pub fn signed_distance(&self, value: Vec2) -> f32 {
    determinant(self.direction, value - self.point)
  }

  /// Whether `value` is on the valid side of the half-plane. Values within
  /// [`RVO_EPSILON`] of the line count as valid.
  pub fn contains(&self, value: Vec2) -> bool {
    self.signed_distance(value) >= -RVO_EPSILON
  }

  /// The same half-plane with a unit `direction`. A zero `direction` stays
  /// zero, and such a line contains every value.
  pub fn normalized(&self) -> Self {
    Self { point: self.point, direction: self.direction.normalize_or_zero() }
  }
}

/// Tolerance used for near-parallel lines, near-tangent circles, and values
/// sitting on a constraint line.
pub const RVO_EPSILON: f32 = 0.00001;

/// The result of the 2D linear program.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum LinearProgramResult {
  /// The linear program was feasible and holds the optimal value.
  Feasible(Vec2),
  /// The linear program was infeasible.
  Infeasible {
    /// The index of the line which caused the linear program to be invalid.
    index_of_failed_line: usize,
    /// The value at the time that the linear program was determined to be
    /// invalid. The value is "partial" in the sense that it is partially
    /// constrained by the lines prior to `index_of_failed_line`.
    partial_value: Vec2,
  },
}

impl LinearProgramResult {
  /// The optimal value if feasible, otherwise the partial value.
  pub fn value(&self) -> Vec2 {
    match *self {
      Self::Feasible(value) => value,
      Self::Infeasible { partial_value, .. } => partial_value,
    }
  }

  /// Whether every constraint was satisfied.
  pub fn used_all(&self) -> bool {
    matches!(self, Self::Feasible(_))
  }

  /// The index of the line that could not be satisfied, if any.
  pub fn index_of_failed_line(&self) -> Option<usize> {
    match *self {
      Self::Feasible(_) => None,
      Self::Infeasible { index_of_failed_line, .. } => {
        Some(index_of_failed_line)
      }
    }
  }
}

/// Decides the final value when the 2D linear program is infeasible. The
/// crate does not pick a relaxation itself; implement this to layer one on top
/// of [`solve_linear_program`].
pub trait InfeasibleFallback {
  /// Produces a value for the program defined by `constraints`, `radius` and
  /// `preferred_value`, knowing that `constraints[index_of_failed_line]` could
  /// not be satisfied together with the lines before it. `partial_value`
  /// satisfies `constraints[0..index_of_failed_line]`.
  fn resolve(
    &self,
    constraints: &[Line],
    radius: f32,
    preferred_value: Vec2,
    index_of_failed_line: usize,
    partial_value: Vec2,
  ) -> Vec2;
}

/// Keeps the partial value of an infeasible program, ignoring the failed line
/// and every line after it.
#[derive(Clone, Copy, Default, Debug)]
pub struct KeepPartialValue;

impl InfeasibleFallback for KeepPartialValue {
  fn resolve(
    &self,
    _constraints: &[Line],
    _radius: f32,
    _preferred_value: Vec2,
    _index_of_failed_line: usize,
    partial_value: Vec2,
  ) -> Vec2 {
    partial_value
  }
}

impl<F> InfeasibleFallback for F
where
  F: Fn(&[Line], f32, Vec2, usize, Vec2) -> Vec2,
{
  fn resolve(
    &self,
    constraints: &[Line],
    radius: f32,
    preferred_value: Vec2,
    index_of_failed_line: usize,
    partial_value: Vec2,
  ) -> Vec2 {
    self(
      constraints,
      radius,
      preferred_value,
      index_of_failed_line,
      partial_value,
    )
  }
}

/// Solves the linear program defined as finding the value closest to
/// `preferred_value` under the constraints that the value has a length less
/// than `radius`, and is inside all half-planes defined by `constraints`.
/// Constraints are added in order, so when the program is infeasible the
/// reported line (and the partial value) depends on the order of
/// `constraints`. When the program is feasible the optimal value does not.
pub fn solve_linear_program(
  constraints: &[Line],
  radius: f32,
  preferred_value: Vec2,
) -> LinearProgramResult {
  let all_normalized =
    constraints.iter().all(|constraint| constraint.direction.is_normalized());
  let constraints: Cow<[Line]> = if all_normalized {
    Cow::Borrowed(constraints)
  } else {
    Cow::Owned(constraints.iter().map(Line::normalized).collect())
  };

  let mut best_value = clamp_to_circle(preferred_value, radius);

  for (index, constraint) in constraints.iter().enumerate() {
    if constraint.contains(best_value) {
      // If the current best value is already on the valid side of the
      // half-plane defined by `constraint`, there is nothing to do.
      continue;
    }

    // Since the current `best_value` violates `constraint`, the new best value
    // must reside somewhere on the line defined by `constraint`.
    match solve_linear_program_along_line(
      constraint,
      radius,
      &constraints[0..index],
      preferred_value,
    ) {
      Some(new_value) => best_value = new_value,
      None => {
        tracing::trace!(
          index_of_failed_line = index,
          constraint_count = constraints.len(),
          "linear program is infeasible"
        );
        return LinearProgramResult::Infeasible {
          index_of_failed_line: index,
          partial_value: best_value,
        };
      }
    }
  }

  LinearProgramResult::Feasible(best_value)
}

/// Clamps `value` to the circle with `radius`, keeping its direction.
fn clamp_to_circle(value: Vec2, radius: f32) -> Vec2 {
  let length_squared = value.length_squared();
  if length_squared <= radius * radius {
    return value;
  }

  if length_squared.is_finite() {
    value.normalize() * radius
  } else {
    // The squared length overflowed, so normalize a scaled down copy instead.
    (value / value.abs().max_element()).normalize() * radius
  }
}

/// Solves the linear program like [`solve_linear_program`], handing an
/// infeasible program to `fallback`.
pub fn solve_linear_program_with_fallback(
  constraints: &[Line],
  radius: f32,
  preferred_value: Vec2,
  fallback: &impl InfeasibleFallback,
) -> Vec2 {
  match solve_linear_program(constraints, radius, preferred_value) {
    LinearProgramResult::Feasible(value) => value,
    LinearProgramResult::Infeasible { index_of_failed_line, partial_value } => {
      fallback.resolve(
        constraints,
        radius,
        preferred_value,
        index_of_failed_line,
        partial_value,
      )
    }
  }
}

/// Solves the linear program restricted to `line`, and within the circle
/// defined by `radius`. In addition, all `constraints` are used to further
/// restrict the resulting value. The best value is the one nearest to
/// `preferred_value`. Returns `None` if no value on `line` is valid.
fn solve_linear_program_along_line(
  line: &Line,
  radius: f32,
  constraints: &[Line],
  preferred_value: Vec2,
) -> Option<Vec2> {
  // Find the intersecting "times" of the line between `line` and the circle
  // with `radius`. This is fairly straightforward by using the equation of ray
  // and a circle and solving. Note that `line.direction` is a unit vector. The
  // following is the result of expanding out the quadratic equation.

  let line_dot_product = line.point.dot(line.direction);
  let discriminant = line_dot_product * line_dot_product + radius * radius
    - line.point.length_squared();

  if discriminant < -RVO_EPSILON {
    // `line` does not intersect the circle with `radius`, so the linear program
    // is infeasible.
    return None;
  }

  // A barely negative discriminant is a tangent line that lost precision.
  let discriminant = discriminant.max(0.0).sqrt();
  // The right time is the furthest distance in `line.direction` still in the
  // circle, and the left time is the furthest distance in the opposite
  // direction.
  let mut t_left = -line_dot_product - discriminant;
  let mut t_right = -line_dot_product + discriminant;

  for constraint in constraints {
    // `line.point + t * line.direction` crosses `constraint` where
    // `det(constraint.direction, line.point - constraint.point) +
    // t * det(constraint.direction, line.direction) == 0`.
    let denominator = determinant(line.direction, constraint.direction);
    let offset =
      determinant(constraint.direction, line.point - constraint.point);

    if denominator.abs() <= RVO_EPSILON {
      // Parallel: `constraint` either rejects all of `line` or none of it.
      if offset < -RVO_EPSILON {
        return None;
      }
      continue;
    }

    let crossing = offset / denominator;
    // A positive denominator means `constraint` keeps the part of `line`
    // before the crossing, otherwise the part after it.
    if denominator > 0.0 {
      t_right = t_right.min(crossing);
    } else {
      t_left = t_left.max(crossing);
    }

    if t_left > t_right {
      return None;
    }
  }

  // Project `preferred_value` to the line unconstrained, then clamp it to the
  // remaining segment [t_left, t_right].
  let t = line.direction.dot(preferred_value - line.point);
  let t = t.clamp(t_left, t_right);

  Some(line.point + t * line.direction)
}

#[cfg(test)]
#[path = "linear_programming_test.rs"]
mod test;
