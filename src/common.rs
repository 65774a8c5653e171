use glam::Vec2;

/// Computes the 2D determinant of `a` and `b`, aka the 2D cross product.
pub fn determinant(a: Vec2, b: Vec2) -> f32 {
  a.x * b.y - a.y * b.x
}

#[cfg(test)]
#[path = "common_test.rs"]
mod test;
