use thiserror::Error;

/// Invalid inputs to an avoidance computation. These are caller bugs, so they
/// are reported up front rather than producing a meaningless velocity.
#[derive(Clone, Copy, PartialEq, Debug, Error)]
pub enum AvoidanceError {
  #[error("agent radius must be positive, was {0}")]
  NonPositiveRadius(f32),

  #[error("radius of neighbour {index} must be positive, was {radius}")]
  NonPositiveNeighbourRadius { index: usize, radius: f32 },

  #[error("max speed must be non-negative, was {0}")]
  NegativeMaxSpeed(f32),

  #[error("time horizon must be positive, was {0}")]
  NonPositiveTimeHorizon(f32),

  #[error("overlap time horizon must be positive, was {0}")]
  NonPositiveOverlapTimeHorizon(f32),

  #[error("time step must be positive, was {0}")]
  NonPositiveTimeStep(f32),

  #[error("agent position, velocities, radius and max speed must be finite")]
  NonFiniteAgent,

  #[error("position and velocity of neighbour {index} must be finite")]
  NonFiniteNeighbour { index: usize },
}

/// Shorthand result type for avoidance computations.
pub type AvoidanceResult<T> = Result<T, AvoidanceError>;
