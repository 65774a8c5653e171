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

use std::f32::consts::TAU;

use glam::Vec2;

use crate::{common::determinant, linear_programming::Line, Agent};

/// Creates a line to describe the half-plane of valid velocities for `agent`
/// that should not collide with `neighbour` within `time_horizon`. If the
/// agents already overlap, the line instead describes the velocities that
/// separate them within `overlap_time_horizon` (usually the simulation time
/// step). Each agent takes half the responsibility for avoiding the other, so
/// `neighbour` is expected to compute the mirrored line for itself.
pub fn build_constraint(
  agent: &Agent,
  neighbour: &Agent,
  time_horizon: f32,
  overlap_time_horizon: f32,
) -> Line {
  // There are two parts to the velocity obstacle induced by `neighbour`.
  // 1) The cut-off circle. This is where the agent collides with `neighbour`
  // after some time (either `time_horizon` or `overlap_time_horizon`).
  // 2) The cut-off shadow. Any velocity that is just scaled up from a
  // velocity in the cut-off circle will also hit `neighbour`.
  //
  // If the relative position and velocity is used, the cut-off for the shadow
  // will be directed toward the origin.

  let relative_neighbour_position = neighbour.position - agent.position;
  let relative_agent_velocity = agent.velocity - neighbour.velocity;

  let distance_squared = relative_neighbour_position.length_squared();

  let sum_radius = agent.radius + neighbour.radius;
  let sum_radius_squared = sum_radius * sum_radius;

  let (direction, u) = if distance_squared > sum_radius_squared {
    // No collision, so either project on to the cut-off circle, or the
    // cut-off shadow.
    //
    // The edges of the cut-off shadow lies along the tangents of the circle
    // that intersects the origin. Velocities are projected to the cut-off
    // circle when they are on the near side of the tangent points, and to the
    // shadow otherwise.

    let cutoff_circle_center = relative_neighbour_position / time_horizon;
    let cutoff_circle_center_to_relative_velocity =
      relative_agent_velocity - cutoff_circle_center;
    let cutoff_circle_center_to_relative_velocity_length_squared =
      cutoff_circle_center_to_relative_velocity.length_squared();

    let dot = cutoff_circle_center_to_relative_velocity
      .dot(relative_neighbour_position);

    // The tangent points split the circle where the angle between
    // `relative_neighbour_position` and the vector from the circle center
    // equals the angle of the tangent triangle. Comparing squared cosines
    // avoids any square roots.
    if dot < 0.0
      && dot * dot
        > sum_radius_squared
          * cutoff_circle_center_to_relative_velocity_length_squared
    {
      project_on_cutoff_circle(
        cutoff_circle_center_to_relative_velocity,
        sum_radius / time_horizon,
      )
    } else {
      // The relative velocity is past the cut-off circle tangent points, so
      // project onto the shadow.

      let tangent_triangle_leg = (distance_squared - sum_radius_squared).sqrt();

      // Determine whether the relative velocity is nearer the left or right
      // side of the shadow.
      let tangent_side = if determinant(
        relative_neighbour_position,
        cutoff_circle_center_to_relative_velocity,
      ) > 0.0
      {
        1.0
      } else {
        -1.0
      };

      // Rotate `relative_neighbour_position` by the tangent angle towards the
      // chosen side. The result is oriented so the velocity obstacle is on the
      // invalid side of the line.
      let shadow_direction = (relative_neighbour_position
        * tangent_triangle_leg
        * tangent_side
        + relative_neighbour_position.perp() * sum_radius)
        / distance_squared;

      (
        shadow_direction,
        relative_agent_velocity.project_onto_normalized(shadow_direction)
          - relative_agent_velocity,
      )
    }
  } else {
    // Collision. Project on cut-off circle at time `overlap_time_horizon`.
    // The shadow does not exist here since the tangent legs are imaginary.

    let cutoff_circle_center =
      relative_neighbour_position / overlap_time_horizon;

    project_on_cutoff_circle(
      relative_agent_velocity - cutoff_circle_center,
      sum_radius / overlap_time_horizon,
    )
  };

  Line { point: agent.velocity + u * 0.5, direction }
}

/// Projects the relative velocity onto the cut-off circle with radius
/// `cutoff_circle_radius`, given the vector from the circle's center to the
/// relative velocity. Returns the line direction and `u`, the smallest change
/// to the relative velocity that reaches the circle.
fn project_on_cutoff_circle(
  cutoff_circle_center_to_relative_velocity: Vec2,
  cutoff_circle_radius: f32,
) -> (Vec2, Vec2) {
  let length = cutoff_circle_center_to_relative_velocity.length();

  let vo_normal = if length > 0.0 {
    cutoff_circle_center_to_relative_velocity / length
  } else {
    // The relative velocity is exactly at the center of the circle (e.g. the
    // agents are on top of each other and moving together), so there is no
    // preferred way out. Pick one at random.
    let angle = rand::random::<f32>() * TAU;
    tracing::debug!(angle, "relative velocity at cut-off circle center");
    Vec2::from_angle(angle)
  };

  (-vo_normal.perp(), vo_normal * (cutoff_circle_radius - length))
}

#[cfg(test)]
#[path = "constraint_test.rs"]
mod test;
