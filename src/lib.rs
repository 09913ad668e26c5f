//! Storm Arena - shrinking-zone mass arena simulation
//!
//! Core modules:
//! - `sim`: Step-driven simulation (entities, combat, zone, progression, bots)
//! - `config`: Data-driven tuning tables, loadable from JSON

pub mod config;
pub mod sim;

pub use config::{ConfigError, SimConfig};

use glam::Vec2;
use rand::Rng;

/// Driver timing constants
pub mod consts {
    /// Fixed driver timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Upper bound on a single frame's wall-clock delta fed to the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;
}

/// Clamp a circle's center so the whole circle stays inside a `size` world
#[inline]
pub fn clamp_to_world(pos: Vec2, radius: f32, size: Vec2) -> Vec2 {
    Vec2::new(
        pos.x.max(radius).min(size.x - radius),
        pos.y.max(radius).min(size.y - radius),
    )
}

/// Uniform random point inside the world, keeping `margin` away from the edges
pub fn random_point(rng: &mut impl Rng, size: Vec2, margin: f32) -> Vec2 {
    Vec2::new(
        random_range(rng, margin, size.x - margin),
        random_range(rng, margin, size.y - margin),
    )
}

/// Random unit vector (uniform angle)
pub fn random_unit(rng: &mut impl Rng) -> Vec2 {
    let theta = rng.random::<f32>() * std::f32::consts::TAU;
    Vec2::new(theta.cos(), theta.sin())
}

/// Uniform float in `[min, max)`; degenerate ranges collapse to `min`
#[inline]
pub fn random_range(rng: &mut impl Rng, min: f32, max: f32) -> f32 {
    if max <= min {
        return min;
    }
    min + rng.random::<f32>() * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_clamp_to_world() {
        let size = Vec2::new(100.0, 100.0);
        assert_eq!(clamp_to_world(Vec2::new(-5.0, 50.0), 10.0, size), Vec2::new(10.0, 50.0));
        assert_eq!(clamp_to_world(Vec2::new(50.0, 99.0), 10.0, size), Vec2::new(50.0, 90.0));
    }

    #[test]
    fn test_random_point_respects_margin() {
        let mut rng = Pcg32::seed_from_u64(7);
        let size = Vec2::new(500.0, 300.0);
        for _ in 0..200 {
            let p = random_point(&mut rng, size, 50.0);
            assert!(p.x >= 50.0 && p.x <= 450.0);
            assert!(p.y >= 50.0 && p.y <= 250.0);
        }
    }

    #[test]
    fn test_random_unit_is_normalized() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            assert!((random_unit(&mut rng).length() - 1.0).abs() < 1e-4);
        }
    }
}
