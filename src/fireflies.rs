//! Firefly particle fields.
//!
//! Each point cloud is generated once at startup from a particle count and a
//! [`FieldPolicy`]. The result is a flat position buffer (`x, y, z` per
//! particle) and a matching scale buffer, laid out the way a point-sprite
//! vertex stream expects them.
//!
//! ```ignore
//! use portal_scene::fireflies::{FieldPolicy, ParticleField};
//!
//! let field = ParticleField::generate(30, FieldPolicy::Ambient { half_extent: 2.0, height: 1.2 });
//! assert_eq!(field.positions().len(), 90);
//! assert_eq!(field.scales().len(), 30);
//! ```

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of components in one position.
pub const POSITION_COMPONENTS: usize = 3;

/// Spatial distribution of a firefly field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FieldPolicy {
    /// Scene-filling cloud: X and Z in `[-half_extent, half_extent)`, Y in `[0, height)`.
    Ambient { half_extent: f32, height: f32 },
    /// Flat cluster near a landmark: X and Z in `[min, max)`, Y fixed.
    Cluster { min: f32, max: f32, y: f32 },
}

impl FieldPolicy {
    /// Draw one position according to this policy.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec3 {
        match *self {
            FieldPolicy::Ambient { half_extent, height } => Vec3::new(
                uniform(rng, -half_extent, half_extent),
                uniform(rng, 0.0, height),
                uniform(rng, -half_extent, half_extent),
            ),
            FieldPolicy::Cluster { min, max, y } => {
                Vec3::new(uniform(rng, min, max), y, uniform(rng, min, max))
            }
        }
    }
}

/// Uniform draw in `[lo, hi)`; collapses to `lo` for an empty interval.
fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Per-instance data uploaded for one firefly sprite.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FireflyInstance {
    pub position: [f32; 3],
    pub scale: f32,
}

/// Static attribute buffers for one point cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleField {
    positions: Vec<f32>,
    scales: Vec<f32>,
}

impl ParticleField {
    /// Generate a field using the thread-local random generator.
    pub fn generate(count: u32, policy: FieldPolicy) -> Self {
        Self::generate_with(count, policy, &mut rand::thread_rng())
    }

    /// Generate a field from the given random source.
    pub fn generate_with<R: Rng + ?Sized>(count: u32, policy: FieldPolicy, rng: &mut R) -> Self {
        let count = count as usize;
        let mut positions = Vec::with_capacity(count * POSITION_COMPONENTS);
        let mut scales = Vec::with_capacity(count);

        for _ in 0..count {
            let p = policy.sample(rng);
            positions.extend_from_slice(&[p.x, p.y, p.z]);
            scales.push(rng.gen::<f32>());
        }

        Self { positions, scales }
    }

    /// Number of particles.
    #[inline]
    pub fn len(&self) -> usize {
        self.scales.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    /// Flat `x, y, z` positions, `3 * len()` values.
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    /// Size factors in `[0, 1)`, `len()` values.
    pub fn scales(&self) -> &[f32] {
        &self.scales
    }

    /// Position of particle `i`.
    pub fn position(&self, i: usize) -> Vec3 {
        let base = i * POSITION_COMPONENTS;
        Vec3::from_slice(&self.positions[base..base + POSITION_COMPONENTS])
    }

    /// Interleave positions and scales for instanced drawing.
    pub fn instances(&self) -> Vec<FireflyInstance> {
        self.positions
            .chunks_exact(POSITION_COMPONENTS)
            .zip(&self.scales)
            .map(|(p, &scale)| FireflyInstance {
                position: [p[0], p[1], p[2]],
                scale,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const AMBIENT: FieldPolicy = FieldPolicy::Ambient {
        half_extent: 2.0,
        height: 1.2,
    };
    const HANDLE: FieldPolicy = FieldPolicy::Cluster {
        min: 1.0,
        max: 2.0,
        y: 0.0,
    };

    #[test]
    fn test_ambient_field_lengths_and_bounds() {
        let field = ParticleField::generate(30, AMBIENT);
        assert_eq!(field.positions().len(), 90);
        assert_eq!(field.scales().len(), 30);

        for i in 0..field.len() {
            let p = field.position(i);
            assert!((-2.0..2.0).contains(&p.x), "x out of range: {}", p.x);
            assert!((0.0..1.2).contains(&p.y), "y out of range: {}", p.y);
            assert!((-2.0..2.0).contains(&p.z), "z out of range: {}", p.z);
        }
        assert!(field.scales().iter().all(|s| (0.0..1.0).contains(s)));
    }

    #[test]
    fn test_cluster_field_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = ParticleField::generate_with(10, HANDLE, &mut rng);
        assert_eq!(field.positions().len(), 30);
        assert_eq!(field.scales().len(), 10);

        for i in 0..field.len() {
            let p = field.position(i);
            assert!((1.0..2.0).contains(&p.x));
            assert_eq!(p.y, 0.0);
            assert!((1.0..2.0).contains(&p.z));
        }
        assert!(field.scales().iter().all(|s| (0.0..1.0).contains(s)));
    }

    #[test]
    fn test_large_field_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(1234);
        let field = ParticleField::generate_with(10_000, AMBIENT, &mut rng);
        let (mut min_x, mut max_x) = (f32::MAX, f32::MIN);
        for i in 0..field.len() {
            let p = field.position(i);
            min_x = min_x.min(p.x);
            max_x = max_x.max(p.x);
        }
        assert!(min_x >= -2.0 && max_x < 2.0);
        // With this many draws both halves of the interval are populated.
        assert!(min_x < -1.5 && max_x > 1.5);
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = ParticleField::generate_with(16, AMBIENT, &mut StdRng::seed_from_u64(3));
        let b = ParticleField::generate_with(16, AMBIENT, &mut StdRng::seed_from_u64(3));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_field() {
        let field = ParticleField::generate(0, AMBIENT);
        assert!(field.is_empty());
        assert!(field.positions().is_empty());
        assert!(field.instances().is_empty());
    }

    #[test]
    fn test_degenerate_interval_uses_lower_bound() {
        let policy = FieldPolicy::Cluster {
            min: 1.5,
            max: 1.5,
            y: 0.3,
        };
        let field = ParticleField::generate(4, policy);
        for i in 0..field.len() {
            assert_eq!(field.position(i), Vec3::new(1.5, 0.3, 1.5));
        }
    }

    #[test]
    fn test_instances_interleave() {
        let field = ParticleField::generate(5, HANDLE);
        let instances = field.instances();
        assert_eq!(instances.len(), 5);
        for (i, inst) in instances.iter().enumerate() {
            assert_eq!(Vec3::from(inst.position), field.position(i));
            assert_eq!(inst.scale, field.scales()[i]);
        }
        assert_eq!(std::mem::size_of::<FireflyInstance>(), 16);
    }
}
