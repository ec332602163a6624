//! Scene contents and name-based material dispatch.
//!
//! A loaded model is a flat list of named meshes. Each mesh is assigned a
//! [`MaterialKind`] by looking its node name up in a [`MaterialPolicy`];
//! unknown names fall back to the policy's default (the baked texture).

use std::collections::{HashMap, HashSet};

use crate::assets::TextureData;
use crate::config::FireflyConfig;
use crate::fireflies::ParticleField;

/// How a mesh is shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    /// Unlit, colored by the baked lighting texture.
    Baked,
    /// Flat emissive pole light color.
    PoleLight,
    /// Animated portal surface shader.
    Portal,
}

/// Mapping from node name to material, with a default for everything else.
#[derive(Debug, Clone)]
pub struct MaterialPolicy {
    table: HashMap<String, MaterialKind>,
    default: MaterialKind,
}

impl MaterialPolicy {
    /// An empty policy that assigns `default` to every node.
    pub fn new(default: MaterialKind) -> Self {
        Self {
            table: HashMap::new(),
            default,
        }
    }

    /// Map an exact node name to a material.
    pub fn with(mut self, name: &str, kind: MaterialKind) -> Self {
        self.table.insert(name.to_string(), kind);
        self
    }

    /// Material for a node name. Matching is exact and case-sensitive.
    pub fn select(&self, name: &str) -> MaterialKind {
        self.table.get(name).copied().unwrap_or(self.default)
    }

    pub fn default_kind(&self) -> MaterialKind {
        self.default
    }
}

impl Default for MaterialPolicy {
    /// The portal model's light nodes; everything else is baked.
    fn default() -> Self {
        Self::new(MaterialKind::Baked)
            .with("poleLightA", MaterialKind::PoleLight)
            .with("poleLightB", MaterialKind::PoleLight)
            .with("portalLight", MaterialKind::Portal)
    }
}

/// One vertex of a static mesh.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// World-space triangle mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A named mesh as it comes out of the model loader.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    pub name: String,
    pub mesh: MeshData,
}

/// Everything a model loader produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedModel {
    pub nodes: Vec<ModelNode>,
}

/// A mesh with its material decided.
#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub name: String,
    pub material: MaterialKind,
    pub mesh: MeshData,
}

/// A firefly point cloud.
#[derive(Debug, Clone)]
pub struct PointCloud {
    pub name: &'static str,
    pub field: ParticleField,
}

/// The renderable contents of the diorama.
#[derive(Debug, Default)]
pub struct Scene {
    pub meshes: Vec<SceneMesh>,
    pub fireflies: Vec<PointCloud>,
    /// Texture for [`MaterialKind::Baked`] meshes.
    pub baked_texture: Option<TextureData>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every node of `model`, assigning materials through `policy`.
    ///
    /// Names are made unique within the model: a repeated name gets a `_N`
    /// suffix (`portalLight`, `portalLight_1`, ...), so only the first
    /// occurrence matches an exact policy entry and repeats take the
    /// default. Returns the number of meshes added.
    pub fn add_model(&mut self, model: LoadedModel, policy: &MaterialPolicy) -> usize {
        let before = self.meshes.len();
        let mut seen = HashSet::new();
        for node in model.nodes {
            let name = unique_name(&mut seen, node.name);
            if node.mesh.is_empty() {
                continue;
            }
            self.meshes.push(SceneMesh {
                material: policy.select(&name),
                name,
                mesh: node.mesh,
            });
        }
        self.meshes.len() - before
    }

    /// Generate both firefly clouds. Replaces any existing clouds.
    pub fn spawn_fireflies(&mut self, config: &FireflyConfig) {
        self.fireflies = vec![
            PointCloud {
                name: "fireflies",
                field: ParticleField::generate(config.ambient_count, config.ambient),
            },
            PointCloud {
                name: "fireflies_around_handle",
                field: ParticleField::generate(config.handle_count, config.handle),
            },
        ];
    }

    /// Meshes using the given material.
    pub fn meshes_with(&self, kind: MaterialKind) -> impl Iterator<Item = &SceneMesh> {
        self.meshes.iter().filter(move |m| m.material == kind)
    }

    /// Total firefly count across clouds.
    pub fn firefly_count(&self) -> usize {
        self.fireflies.iter().map(|c| c.field.len()).sum()
    }
}

fn unique_name(seen: &mut HashSet<String>, name: String) -> String {
    let mut candidate = name.clone();
    let mut n = 0;
    while seen.contains(&candidate) {
        n += 1;
        candidate = format!("{}_{}", name, n);
    }
    seen.insert(candidate.clone());
    candidate
}
