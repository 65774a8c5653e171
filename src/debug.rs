use glam::Vec2;

// Re-export Line so we can use it to provide debug data.
pub use crate::linear_programming::Line;

/// Internal data that is used to generate the final suggested velocity.
#[derive(Debug, Clone)]
pub enum DebugData {
  /// Every constraint was satisfied.
  Satisfied {
    /// The constraints that needed to be satisfied, in solve order.
    constraints: Vec<Line>,
  },
  /// Not every constraint could be satisfied, so the velocity only avoids the
  /// neighbours before `index_of_failed_line`.
  Infeasible {
    /// The constraints that needed to be satisfied, in solve order.
    constraints: Vec<Line>,
    /// The index (into `constraints`) of the first constraint that could not
    /// be satisfied.
    index_of_failed_line: usize,
    /// The velocity satisfying every constraint before `index_of_failed_line`.
    partial_value: Vec2,
  },
}
