//! Validation of the generated WGSL programs.
//!
//! Every program is parsed and validated with naga, and the generated
//! uniform structs are checked against the serialized byte layout.

use portal_scene::gpu::shaders;
use portal_scene::uniforms::{PIXEL_RATIO, RESOLUTION, SIZE, TIME};
use portal_scene::{ShaderParameters, Vec2};

fn validate_wgsl(code: &str) -> Result<naga::Module, String> {
    let module = naga::front::wgsl::parse_str(code).map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(module)
}

fn installed_params() -> ShaderParameters {
    let mut params = ShaderParameters::new();
    params.install_fireflies(2.0, 100.0, Vec2::new(1600.0, 1200.0));
    params
}

/// Byte size and member offsets of a named struct in `module`.
fn struct_layout(module: &naga::Module, name: &str) -> (u32, Vec<(String, u32)>) {
    let ty = module
        .types
        .iter()
        .find(|(_, ty)| ty.name.as_deref() == Some(name))
        .map(|(_, ty)| ty)
        .unwrap_or_else(|| panic!("struct {} not found", name));

    match &ty.inner {
        naga::TypeInner::Struct { members, span } => (
            *span,
            members
                .iter()
                .map(|m| (m.name.clone().unwrap_or_default(), m.offset))
                .collect(),
        ),
        other => panic!("{} is not a struct: {:?}", name, other),
    }
}

#[test]
fn test_baked_shader_valid() {
    validate_wgsl(&shaders::baked()).expect("baked WGSL should be valid");
}

#[test]
fn test_pole_light_shader_valid() {
    validate_wgsl(&shaders::pole_light()).expect("pole light WGSL should be valid");
}

#[test]
fn test_portal_shader_valid() {
    let params = installed_params();
    validate_wgsl(&shaders::portal(params.portal())).expect("portal WGSL should be valid");
}

#[test]
fn test_firefly_shader_valid() {
    let params = installed_params();
    let uniforms = params.fireflies().expect("fireflies installed");
    validate_wgsl(&shaders::fireflies(uniforms)).expect("firefly WGSL should be valid");
}

#[test]
fn test_firefly_struct_matches_bytes() {
    let params = installed_params();
    let uniforms = params.fireflies().expect("fireflies installed");
    let module = validate_wgsl(&shaders::fireflies(uniforms)).unwrap();

    let (span, members) = struct_layout(&module, "FireflyUniforms");
    let bytes = uniforms.to_bytes();
    assert!(span as usize <= bytes.len());
    assert_eq!(bytes.len() % 16, 0);

    let expected = [(TIME, 0), (PIXEL_RATIO, 4), (SIZE, 8), (RESOLUTION, 16)];
    for ((name, offset), (want_name, want_offset)) in members.iter().zip(expected) {
        assert_eq!(name, want_name);
        assert_eq!(*offset, want_offset);
    }

    // Values sit where the shader reads them.
    let read = |offset: usize| f32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]]);
    assert_eq!(read(4), 2.0);
    assert_eq!(read(8), 100.0);
    assert_eq!(read(16), 1600.0);
    assert_eq!(read(20), 1200.0);
}

#[test]
fn test_portal_struct_matches_bytes() {
    let params = ShaderParameters::new();
    let module = validate_wgsl(&shaders::portal(params.portal())).unwrap();

    let (span, members) = struct_layout(&module, "PortalUniforms");
    assert_eq!(members, vec![(TIME.to_string(), 0)]);
    assert!(span as usize <= params.portal().byte_size());
}
