//! Model and texture loading.
//!
//! Loading is asynchronous behind the [`AssetLoader`] trait so the startup
//! path can be driven with `pollster::block_on` in the application and with
//! in-memory fakes in tests.
//!
//! # Supported formats
//!
//! - Models: glTF 2.0 (`.gltf` with external or embedded buffers, `.glb`).
//!   Draco-compressed meshes are not supported.
//! - Textures: PNG, JPEG

use std::future::Future;
use std::path::Path;

use glam::{Mat4, Vec3};

use crate::error::AssetError;
use crate::scene::{LoadedModel, MeshData, MeshVertex, ModelNode};

/// Decoded RGBA8 image destined for an sRGB texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    /// Raw RGBA pixel data (width * height * 4 bytes), first row on top.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl TextureData {
    /// Load a texture from an image file.
    ///
    /// Rows keep their stored order. glTF UVs put `v = 0` on the first row,
    /// so the image must not be flipped.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|source| AssetError::Image {
                path: path.to_path_buf(),
                source,
            })?
            .into_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            data: img.into_raw(),
            width,
            height,
        })
    }

    /// Create a solid color texture (1x1 pixel).
    pub fn solid(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            data: vec![r, g, b, a],
            width: 1,
            height: 1,
        }
    }

    /// Stand-in used when the baked texture cannot be loaded.
    pub fn fallback() -> Self {
        Self::solid(128, 128, 128, 255)
    }
}

/// Asynchronous source of scene assets.
pub trait AssetLoader {
    fn load_model(&self, path: &Path) -> impl Future<Output = Result<LoadedModel, AssetError>>;

    fn load_texture(&self, path: &Path) -> impl Future<Output = Result<TextureData, AssetError>>;
}

/// Loads assets from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl AssetLoader for FileLoader {
    fn load_model(&self, path: &Path) -> impl Future<Output = Result<LoadedModel, AssetError>> {
        let path = path.to_path_buf();
        async move {
            let (document, buffers, _images) =
                gltf::import(&path).map_err(|source| AssetError::Gltf {
                    path: path.clone(),
                    source,
                })?;
            flatten_document(&document, &buffers)
        }
    }

    fn load_texture(&self, path: &Path) -> impl Future<Output = Result<TextureData, AssetError>> {
        let path = path.to_path_buf();
        async move { TextureData::from_file(path) }
    }
}

/// Parse a glTF or GLB document held in memory.
pub fn parse_model(bytes: &[u8]) -> Result<LoadedModel, AssetError> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).map_err(|source| AssetError::Gltf {
            path: "<memory>".into(),
            source,
        })?;
    flatten_document(&document, &buffers)
}

/// Collect every mesh node of the default scene with world transforms baked in.
fn flatten_document(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
) -> Result<LoadedModel, AssetError> {
    let mut model = LoadedModel::default();
    let Some(scene) = document.default_scene().or_else(|| document.scenes().next()) else {
        log::warn!("model contains no scenes");
        return Ok(model);
    };

    for node in scene.nodes() {
        collect_node(&node, Mat4::IDENTITY, buffers, &mut model.nodes)?;
    }
    Ok(model)
}

fn collect_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<ModelNode>,
) -> Result<(), AssetError> {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    // Mirroring transforms reverse winding once baked into positions.
    let mirrored = world.determinant() < 0.0;

    if let Some(mesh) = node.mesh() {
        let name = node.name().or(mesh.name()).unwrap_or_default().to_string();
        let mut data = MeshData::default();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("skipping non-triangle primitive in '{}'", name);
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &d[..]));
            let positions = reader
                .read_positions()
                .ok_or_else(|| AssetError::MissingPositions(name.clone()))?;
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|t| t.into_f32().collect())
                .unwrap_or_default();

            let base = data.vertices.len() as u32;
            for (i, p) in positions.enumerate() {
                data.vertices.push(MeshVertex {
                    position: world.transform_point3(Vec3::from(p)).to_array(),
                    uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                });
            }

            let end = data.vertices.len() as u32;
            let mut indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().map(|i| base + i).collect(),
                None => (base..end).collect(),
            };
            if mirrored {
                for triangle in indices.chunks_exact_mut(3) {
                    triangle.swap(1, 2);
                }
            }
            data.indices.extend(indices);
        }

        out.push(ModelNode { name, mesh: data });
    }

    for child in node.children() {
        collect_node(&child, world, buffers, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // One triangle under a translated parent; positions (0,0,0) (1,0,0) (0,1,0).
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [ { "nodes": [0] } ],
        "nodes": [
            { "name": "root", "children": [1], "translation": [0.0, 1.0, 0.0] },
            { "name": "portalLight", "mesh": 0, "translation": [1.0, 0.0, 0.0] }
        ],
        "meshes": [ { "primitives": [ { "attributes": { "POSITION": 0 }, "indices": 1 } ] } ],
        "buffers": [ {
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA="
        } ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    #[test]
    fn test_parse_model_bakes_world_transform() {
        let model = parse_model(TRIANGLE_GLTF.as_bytes()).unwrap();
        assert_eq!(model.nodes.len(), 1);

        let node = &model.nodes[0];
        assert_eq!(node.name, "portalLight");
        assert_eq!(node.mesh.indices, vec![0, 1, 2]);

        let positions: Vec<[f32; 3]> = node.mesh.vertices.iter().map(|v| v.position).collect();
        assert_eq!(positions, vec![[1.0, 1.0, 0.0], [2.0, 1.0, 0.0], [1.0, 2.0, 0.0]]);
        assert!(node.mesh.vertices.iter().all(|v| v.uv == [0.0, 0.0]));
    }

    fn face_normal(mesh: &MeshData) -> Vec3 {
        let p = |i: usize| Vec3::from(mesh.vertices[mesh.indices[i] as usize].position);
        (p(1) - p(0)).cross(p(2) - p(0)).normalize()
    }

    #[test]
    fn test_mirrored_node_keeps_facing() {
        let mirrored = TRIANGLE_GLTF.replace(
            r#""translation": [1.0, 0.0, 0.0]"#,
            r#""scale": [-1.0, 1.0, 1.0]"#,
        );
        let model = parse_model(mirrored.as_bytes()).unwrap();
        let mesh = &model.nodes[0].mesh;

        assert_eq!(mesh.indices, vec![0, 2, 1]);
        assert_eq!(mesh.vertices[1].position, [-1.0, 1.0, 0.0]);
        assert_eq!(face_normal(mesh), Vec3::Z);
    }

    #[test]
    fn test_unmirrored_node_winding_unchanged() {
        let model = parse_model(TRIANGLE_GLTF.as_bytes()).unwrap();
        assert_eq!(face_normal(&model.nodes[0].mesh), Vec3::Z);
    }

    #[test]
    fn test_parse_model_rejects_garbage() {
        let err = parse_model(b"not a model").unwrap_err();
        assert!(matches!(err, AssetError::Gltf { .. }));
    }

    #[test]
    fn test_missing_model_file() {
        let result = pollster::block_on(FileLoader.load_model(Path::new("does/not/exist.glb")));
        assert!(matches!(result, Err(AssetError::Gltf { .. })));
    }

    #[test]
    fn test_texture_rows_not_flipped() {
        let path = std::env::temp_dir().join(format!("portal_scene_rows_{}.png", std::process::id()));
        let mut img = image::RgbaImage::new(1, 2);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        img.save(&path).unwrap();

        let tex = pollster::block_on(FileLoader.load_texture(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!((tex.width, tex.height), (1, 2));
        assert_eq!(&tex.data[0..4], &[255, 0, 0, 255]);
        assert_eq!(&tex.data[4..8], &[0, 0, 255, 255]);
    }

    #[test]
    fn test_missing_texture_file() {
        let err = TextureData::from_file("does/not/exist.jpg").unwrap_err();
        assert!(matches!(err, AssetError::Image { .. }));
    }

    #[test]
    fn test_fallback_texture() {
        let tex = TextureData::fallback();
        assert_eq!((tex.width, tex.height), (1, 1));
        assert_eq!(tex.data.len(), 4);
    }
}
