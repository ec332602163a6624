//! Time-driven shader parameters.
//!
//! Two shader programs read named uniforms from the CPU side:
//!
//! | Program  | Uniforms                                              |
//! |----------|-------------------------------------------------------|
//! | fireflies | `u_time`, `u_pixel_ratio`, `u_size`, `u_resolution`  |
//! | portal   | `u_time`                                              |
//!
//! Each program's values live in an ordered [`UniformSet`]. The set generates
//! the WGSL struct body for its fields and serializes the values with the
//! matching alignment, so shader and buffer layouts cannot drift apart.

use glam::{Vec2, Vec3, Vec4};
use std::collections::HashMap;

/// Elapsed seconds since the render loop started.
pub const TIME: &str = "u_time";
/// Clamped device pixel ratio.
pub const PIXEL_RATIO: &str = "u_pixel_ratio";
/// Base firefly point size.
pub const SIZE: &str = "u_size";
/// Drawing-buffer size in physical pixels.
pub const RESOLUTION: &str = "u_resolution";

/// Supported uniform value types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UniformValue {
    F32(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
}

impl UniformValue {
    /// Get the WGSL type name for this value.
    pub fn wgsl_type(&self) -> &'static str {
        match self {
            UniformValue::F32(_) => "f32",
            UniformValue::Vec2(_) => "vec2<f32>",
            UniformValue::Vec3(_) => "vec3<f32>",
            UniformValue::Vec4(_) => "vec4<f32>",
        }
    }

    /// Required alignment in the uniform address space.
    fn align(&self) -> usize {
        match self {
            UniformValue::F32(_) => 4,
            UniformValue::Vec2(_) => 8,
            UniformValue::Vec3(_) | UniformValue::Vec4(_) => 16,
        }
    }

    /// Write this value to a byte buffer.
    fn write_bytes(&self, buf: &mut Vec<u8>) {
        let mut push = |c: f32| buf.extend_from_slice(&c.to_le_bytes());
        match *self {
            UniformValue::F32(v) => push(v),
            UniformValue::Vec2(v) => v.to_array().into_iter().for_each(&mut push),
            UniformValue::Vec3(v) => v.to_array().into_iter().for_each(&mut push),
            UniformValue::Vec4(v) => v.to_array().into_iter().for_each(&mut push),
        }
    }

    /// The scalar payload, if this is an `F32`.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            UniformValue::F32(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::F32(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

/// Ordered collection of named uniform values for one shader program.
#[derive(Clone, Debug, Default)]
pub struct UniformSet {
    /// Order matters for WGSL struct layout.
    values: Vec<(String, UniformValue)>,
    indices: HashMap<String, usize>,
}

impl UniformSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    pub fn with<V: Into<UniformValue>>(mut self, name: &str, value: V) -> Self {
        self.set(name, value);
        self
    }

    /// Add or overwrite a uniform value.
    pub fn set<V: Into<UniformValue>>(&mut self, name: &str, value: V) {
        let value = value.into();
        if let Some(&idx) = self.indices.get(name) {
            self.values[idx].1 = value;
        } else {
            let idx = self.values.len();
            self.values.push((name.to_string(), value));
            self.indices.insert(name.to_string(), idx);
        }
    }

    /// Get a uniform value by name.
    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.indices.get(name).map(|&idx| &self.values[idx].1)
    }

    /// Get a scalar uniform by name.
    pub fn get_f32(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(UniformValue::as_f32)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// WGSL struct fields matching [`to_bytes`](Self::to_bytes).
    pub fn to_wgsl_fields(&self) -> String {
        self.values
            .iter()
            .map(|(name, value)| format!("    {}: {},", name, value.wgsl_type()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialize all values for upload, padded to a 16-byte multiple.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for (_, value) in &self.values {
            while buf.len() % value.align() != 0 {
                buf.push(0);
            }
            value.write_bytes(&mut buf);
        }
        let padded = (buf.len().max(1) + 15) & !15;
        buf.resize(padded, 0);
        buf
    }

    /// Size of the serialized block in bytes.
    pub fn byte_size(&self) -> usize {
        self.to_bytes().len()
    }
}

/// Uniform values for the firefly and portal programs.
///
/// The portal program exists from the start. The firefly uniforms are
/// installed once the point clouds are built; until then pixel-density
/// updates are ignored.
#[derive(Clone, Debug)]
pub struct ShaderParameters {
    portal: UniformSet,
    fireflies: Option<UniformSet>,
}

impl Default for ShaderParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderParameters {
    pub fn new() -> Self {
        Self {
            portal: UniformSet::new().with(TIME, 0.0),
            fireflies: None,
        }
    }

    /// Create the firefly uniforms with their initial values.
    pub fn install_fireflies(&mut self, pixel_ratio: f32, size: f32, resolution: Vec2) {
        let elapsed = self.time();
        self.fireflies = Some(
            UniformSet::new()
                .with(TIME, elapsed)
                .with(PIXEL_RATIO, pixel_ratio)
                .with(SIZE, size)
                .with(RESOLUTION, resolution),
        );
    }

    /// Whether the firefly uniforms exist yet.
    pub fn has_fireflies(&self) -> bool {
        self.fireflies.is_some()
    }

    /// Push the elapsed time into both programs.
    pub fn advance_time(&mut self, elapsed: f32) {
        self.portal.set(TIME, elapsed);
        if let Some(fireflies) = &mut self.fireflies {
            fireflies.set(TIME, elapsed);
        }
    }

    /// Set the firefly pixel ratio. Returns `false` if the firefly uniforms
    /// are not installed.
    pub fn set_pixel_density(&mut self, ratio: f32) -> bool {
        match &mut self.fireflies {
            Some(fireflies) => {
                fireflies.set(PIXEL_RATIO, ratio);
                true
            }
            None => false,
        }
    }

    /// Set the firefly drawing-buffer resolution. Same guard as
    /// [`set_pixel_density`](Self::set_pixel_density).
    pub fn set_resolution(&mut self, resolution: Vec2) -> bool {
        match &mut self.fireflies {
            Some(fireflies) => {
                fireflies.set(RESOLUTION, resolution);
                true
            }
            None => false,
        }
    }

    /// Current shared time value.
    pub fn time(&self) -> f32 {
        self.portal.get_f32(TIME).unwrap_or(0.0)
    }

    /// Current firefly pixel ratio, if installed.
    pub fn pixel_density(&self) -> Option<f32> {
        self.fireflies.as_ref().and_then(|f| f.get_f32(PIXEL_RATIO))
    }

    pub fn portal(&self) -> &UniformSet {
        &self.portal
    }

    pub fn fireflies(&self) -> Option<&UniformSet> {
        self.fireflies.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_in_place() {
        let mut set = UniformSet::new().with("a", 1.0).with("b", 2.0);
        set.set("a", 5.0);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get_f32("a"), Some(5.0));
        let names: Vec<_> = set.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_layout_pads_vec2() {
        let set = UniformSet::new()
            .with(TIME, 1.0)
            .with(PIXEL_RATIO, 2.0)
            .with(SIZE, 100.0)
            .with(RESOLUTION, Vec2::new(800.0, 600.0));
        let bytes = set.to_bytes();
        assert_eq!(bytes.len(), 32);

        let floats: Vec<f32> = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        assert_eq!(floats[0], 1.0);
        assert_eq!(floats[1], 2.0);
        assert_eq!(floats[2], 100.0);
        // vec2 aligned to 8 bytes: one pad float at index 3
        assert_eq!(floats[3], 0.0);
        assert_eq!(floats[4], 800.0);
        assert_eq!(floats[5], 600.0);
    }

    #[test]
    fn test_single_scalar_pads_to_16() {
        let set = UniformSet::new().with(TIME, 3.0);
        assert_eq!(set.byte_size(), 16);
        assert_eq!(UniformSet::new().byte_size(), 16);
    }

    #[test]
    fn test_wgsl_fields() {
        let set = UniformSet::new().with(TIME, 0.0).with(RESOLUTION, Vec2::ONE);
        assert_eq!(
            set.to_wgsl_fields(),
            "    u_time: f32,\n    u_resolution: vec2<f32>,"
        );
    }

    #[test]
    fn test_advance_time_updates_both_programs() {
        let mut params = ShaderParameters::new();
        params.install_fireflies(1.0, 100.0, Vec2::new(800.0, 600.0));
        params.advance_time(2.5);
        assert_eq!(params.portal().get_f32(TIME), Some(2.5));
        assert_eq!(params.fireflies().unwrap().get_f32(TIME), Some(2.5));
    }

    #[test]
    fn test_pixel_density_guarded_until_installed() {
        let mut params = ShaderParameters::new();
        assert!(!params.set_pixel_density(2.0));
        assert!(!params.set_resolution(Vec2::ONE));
        assert_eq!(params.pixel_density(), None);

        params.install_fireflies(1.0, 100.0, Vec2::ONE);
        assert!(params.set_pixel_density(2.0));
        assert_eq!(params.pixel_density(), Some(2.0));
    }

    #[test]
    fn test_install_carries_current_time() {
        let mut params = ShaderParameters::new();
        params.advance_time(4.0);
        params.install_fireflies(1.0, 100.0, Vec2::ONE);
        assert_eq!(params.fireflies().unwrap().get_f32(TIME), Some(4.0));
    }

    #[test]
    fn test_portal_has_only_time() {
        let params = ShaderParameters::new();
        assert_eq!(params.portal().len(), 1);
        assert!(params.portal().get(PIXEL_RATIO).is_none());
    }
}
