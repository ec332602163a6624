//! WGSL sources for the four mesh and sprite pipelines.
//!
//! All programs share the camera block at `@group(0) @binding(0)`.
//! Per-material data lives at `@group(1)`. The portal and firefly uniform
//! structs are generated from their [`UniformSet`] so the struct always
//! matches [`UniformSet::to_bytes`].

use crate::uniforms::UniformSet;

/// Camera block shared by every program.
const CAMERA: &str = r#"struct Camera {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> camera: Camera;
"#;

/// Vertex stage shared by the mesh programs.
const MESH_VERTEX: &str = r#"struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = camera.proj * camera.view * vec4<f32>(position, 1.0);
    out.uv = uv;
    return out;
}
"#;

/// Unlit meshes colored by the baked lighting texture.
pub fn baked() -> String {
    format!(
        r#"{CAMERA}
@group(1) @binding(0)
var t_baked: texture_2d<f32>;
@group(1) @binding(1)
var s_baked: sampler;

{MESH_VERTEX}
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    return textureSample(t_baked, s_baked, in.uv);
}}
"#
    )
}

/// Flat emissive color.
pub fn pole_light() -> String {
    format!(
        r#"{CAMERA}
struct Material {{
    color: vec4<f32>,
}};

@group(1) @binding(0)
var<uniform> material: Material;

{MESH_VERTEX}
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    return material.color;
}}
"#
    )
}

/// Animated portal surface. Two layers of value noise scroll with `u_time`
/// and a radial term brightens the rim.
pub fn portal(uniforms: &UniformSet) -> String {
    let fields = uniforms.to_wgsl_fields();
    format!(
        r#"{CAMERA}
struct PortalUniforms {{
{fields}
}};

@group(1) @binding(0)
var<uniform> params: PortalUniforms;

const COLOR_START: vec3<f32> = vec3<f32>(0.0, 0.0, 0.0);
const COLOR_END: vec3<f32> = vec3<f32>(1.0, 1.0, 1.0);

fn hash3(p: vec3<f32>) -> f32 {{
    return fract(sin(dot(p, vec3<f32>(127.1, 311.7, 74.7))) * 43758.5453);
}}

// Trilinear value noise in [-1, 1].
fn noise3(p: vec3<f32>) -> f32 {{
    let i = floor(p);
    let f = fract(p);
    let u = f * f * (3.0 - 2.0 * f);

    let x00 = mix(hash3(i), hash3(i + vec3<f32>(1.0, 0.0, 0.0)), u.x);
    let x10 = mix(hash3(i + vec3<f32>(0.0, 1.0, 0.0)), hash3(i + vec3<f32>(1.0, 1.0, 0.0)), u.x);
    let x01 = mix(hash3(i + vec3<f32>(0.0, 0.0, 1.0)), hash3(i + vec3<f32>(1.0, 0.0, 1.0)), u.x);
    let x11 = mix(hash3(i + vec3<f32>(0.0, 1.0, 1.0)), hash3(i + vec3<f32>(1.0, 1.0, 1.0)), u.x);

    let y0 = mix(x00, x10, u.y);
    let y1 = mix(x01, x11, u.y);
    return mix(y0, y1, u.z) * 2.0 - 1.0;
}}

{MESH_VERTEX}
@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let t = params.u_time;

    let displaced_uv = in.uv + vec2<f32>(noise3(vec3<f32>(in.uv * 5.0, t * 0.1)));
    var strength = noise3(vec3<f32>(displaced_uv * 5.0, t * 0.2));

    let outer_glow = distance(in.uv, vec2<f32>(0.5)) * 5.0 - 1.4;
    strength += outer_glow;
    strength += step(-0.2, strength) * 0.8;
    strength = clamp(strength, 0.0, 1.0);

    return vec4<f32>(mix(COLOR_START, COLOR_END, strength), 1.0);
}}
"#
    )
}

/// Instanced firefly sprites.
///
/// Each instance is a camera-facing quad whose pixel size shrinks with view
/// depth. Particles bob vertically with a phase taken from their X position.
pub fn fireflies(uniforms: &UniformSet) -> String {
    let fields = uniforms.to_wgsl_fields();
    format!(
        r#"{CAMERA}
struct FireflyUniforms {{
{fields}
}};

@group(1) @binding(0)
var<uniform> params: FireflyUniforms;

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) scale: f32,
) -> VertexOutput {{
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let corner = quad_vertices[vertex_index];

    var world = position;
    world.y += sin(params.u_time + world.x * 100.0) * scale * 0.2;

    let view_pos = camera.view * vec4<f32>(world, 1.0);
    var clip_pos = camera.proj * view_pos;

    // Diameter in drawing-buffer pixels.
    let point_size = params.u_size * scale * params.u_pixel_ratio / max(-view_pos.z, 0.0001);
    clip_pos.x += corner.x * point_size / params.u_resolution.x * clip_pos.w;
    clip_pos.y += corner.y * point_size / params.u_resolution.y * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.uv = corner * 0.5 + 0.5;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let dist = max(distance(in.uv, vec2<f32>(0.5)), 0.0001);
    let strength = clamp(0.05 / dist - 0.1, 0.0, 1.0);
    return vec4<f32>(1.0, 1.0, 1.0, strength);
}}
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::ShaderParameters;
    use glam::Vec2;

    #[test]
    fn test_generated_structs_embed_fields() {
        let mut params = ShaderParameters::new();
        params.install_fireflies(2.0, 100.0, Vec2::new(800.0, 600.0));

        let src = fireflies(params.fireflies().unwrap());
        assert!(src.contains("struct FireflyUniforms {\n    u_time: f32,"));
        assert!(src.contains("u_resolution: vec2<f32>,"));

        let src = portal(params.portal());
        assert!(src.contains("struct PortalUniforms {\n    u_time: f32,\n};"));
    }

    #[test]
    fn test_every_program_has_both_stages() {
        let params = ShaderParameters::new();
        for src in [baked(), pole_light(), portal(params.portal())] {
            assert!(src.contains("fn vs_main"));
            assert!(src.contains("fn fs_main"));
            assert!(src.contains("var<uniform> camera: Camera;"));
        }
    }
}
