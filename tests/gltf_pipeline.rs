mod common;

use std::cell::RefCell;
use std::io::Cursor;

use anyhow::bail;
use glam::{Vec2, Vec3, Vec4};

use daekit::texture::TextureFormat;
use daekit::{
    BaseColor, Converter, CpuMeshFactory, CpuTextureFactory, Diagnostic, GltfSceneParser,
    PbrValue, Scene, SceneParser,
};

use common::{glb, init_logging};

struct Rejecting;

impl SceneParser for Rejecting {
    fn parse(&self, _bytes: &[u8]) -> anyhow::Result<Scene> {
        bail!("not a COLLADA document")
    }
}

fn png_bytes() -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 128, 255, 255]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

/// A textured quad stored as an interleaved position/normal view, a texcoord
/// view, a 16-bit index view and an embedded PNG, under a translated parent.
fn textured_quad_glb() -> Vec<u8> {
    let positions = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
    ];
    let texcoords = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
    ];

    let mut bin = Vec::new();
    for position in positions {
        bin.extend_from_slice(bytemuck::bytes_of(&position));
        bin.extend_from_slice(bytemuck::bytes_of(&Vec3::Z));
    }
    bin.extend_from_slice(bytemuck::cast_slice::<Vec2, u8>(&texcoords));
    bin.extend_from_slice(bytemuck::cast_slice::<u16, u8>(&[0, 1, 2, 1, 2, 3]));
    assert_eq!(bin.len(), 140);

    let png = png_bytes();
    let png_offset = bin.len();
    bin.extend_from_slice(&png);

    let json = format!(
        r#"{{
        "asset": {{"version": "2.0"}},
        "scene": 0,
        "scenes": [{{"name": "Stage", "nodes": [0]}}],
        "nodes": [
            {{"name": "Root", "translation": [1.0, 2.0, 3.0], "children": [1]}},
            {{"name": "Box", "scale": [2.0, 2.0, 2.0], "mesh": 0}}
        ],
        "meshes": [{{"name": "Quad", "primitives": [{{
            "attributes": {{"POSITION": 0, "NORMAL": 1, "TEXCOORD_0": 2}},
            "indices": 3,
            "material": 0
        }}]}}],
        "materials": [{{
            "name": "Painted",
            "pbrMetallicRoughness": {{
                "baseColorTexture": {{"index": 0}},
                "metallicFactor": 0.25,
                "roughnessFactor": 0.75
            }}
        }}],
        "textures": [{{"source": 0}}],
        "images": [{{"bufferView": 3, "mimeType": "image/png"}}],
        "buffers": [{{"byteLength": {total}}}],
        "bufferViews": [
            {{"buffer": 0, "byteOffset": 0, "byteLength": 96, "byteStride": 24}},
            {{"buffer": 0, "byteOffset": 96, "byteLength": 32}},
            {{"buffer": 0, "byteOffset": 128, "byteLength": 12}},
            {{"buffer": 0, "byteOffset": {png_offset}, "byteLength": {png_length}}}
        ],
        "accessors": [
            {{"bufferView": 0, "byteOffset": 0, "componentType": 5126, "count": 4,
              "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}},
            {{"bufferView": 0, "byteOffset": 12, "componentType": 5126, "count": 4,
              "type": "VEC3"}},
            {{"bufferView": 1, "componentType": 5126, "count": 4, "type": "VEC2"}},
            {{"bufferView": 2, "componentType": 5123, "count": 6, "type": "SCALAR"}}
        ]
    }}"#,
        total = bin.len(),
        png_offset = png_offset,
        png_length = png.len(),
    );

    glb(&json, &bin)
}

#[test]
fn glb_converts_end_to_end() {
    init_logging();

    let converter = Converter::new(&CpuMeshFactory, &CpuTextureFactory);
    let bytes = textured_quad_glb();

    let entity = pollster::block_on(converter.convert_bytes(&GltfSceneParser, &bytes)).unwrap();

    assert_eq!(entity.name.as_deref(), Some("Stage"));
    assert_eq!(entity.entity_count(), 3);

    let parent = entity.find("Root").unwrap();
    assert_eq!(parent.transform.translation(), Vec3::new(1.0, 2.0, 3.0));
    assert!(parent.model.is_none());

    let quad = entity.find("Box").unwrap();
    assert_eq!(quad.transform.scale(), Vec3::splat(2.0));

    let model = quad.model.as_ref().unwrap();
    let primitive = &model.mesh.primitives[0];
    assert_eq!(primitive.name, "Quad_0");
    assert_eq!(primitive.vertices.len(), 4);
    assert_eq!(primitive.vertices[3].position, Vec3::new(1.0, 1.0, 0.0));
    assert_eq!(primitive.vertices[3].normal, Vec3::Z);
    assert_eq!(primitive.vertices[3].tex_coords, Vec2::new(1.0, 1.0));
    assert_eq!(primitive.indices, vec![0, 1, 2, 1, 2, 3]);

    let material = model.materials[0].as_ref().unwrap();
    assert_eq!(material.name.as_deref(), Some("Painted"));
    assert_eq!(material.metallic, Some(PbrValue::Scalar(0.25)));
    assert_eq!(material.roughness, Some(PbrValue::Scalar(0.75)));

    let Some(BaseColor::Texture(texture)) = &material.base_color else {
        panic!("base color should be a texture");
    };
    assert_eq!((texture.width, texture.height), (2, 2));
    assert_eq!(texture.format, TextureFormat::Rgba8);
    assert_eq!(&texture.pixels[..4], &[0, 128, 255, 255]);

    let world = entity.world_transforms();
    let corner = world[2].transform_point3(Vec3::new(1.0, 1.0, 0.0));
    assert_eq!(corner, Vec3::new(3.0, 4.0, 3.0));
}

#[test]
fn parse_failure_yields_nothing() {
    init_logging();

    let events = RefCell::new(Vec::new());
    let sink = |diagnostic: &Diagnostic| events.borrow_mut().push(diagnostic.clone());
    let converter = Converter::new(&CpuMeshFactory, &CpuTextureFactory).with_diagnostics(&sink);

    let entity = pollster::block_on(converter.convert_bytes(&GltfSceneParser, b"<COLLADA/>"));

    assert!(entity.is_none());
    assert!(matches!(
        events.borrow().as_slice(),
        [Diagnostic::ParseFailed { .. }]
    ));
}

#[test]
fn fallback_parser_is_used_when_primary_fails() {
    let converter = Converter::new(&CpuMeshFactory, &CpuTextureFactory);
    let bytes = textured_quad_glb();

    let entity = pollster::block_on(converter.convert_bytes_with_fallback(
        &Rejecting,
        &GltfSceneParser,
        &bytes,
    ));
    assert!(entity.is_some());

    let entity = pollster::block_on(converter.convert_bytes_with_fallback(
        &Rejecting,
        &Rejecting,
        &bytes,
    ));
    assert!(entity.is_none());
}

#[test]
fn byte_indices_leave_mesh_without_faces() {
    init_logging();

    let mut bin = bytemuck::cast_slice::<Vec3, u8>(&[Vec3::ZERO, Vec3::X, Vec3::Y]).to_vec();
    bin.extend_from_slice(&[0, 1, 2]);

    let json = r#"{
        "asset": {"version": "2.0"},
        "scenes": [{"nodes": [0]}],
        "nodes": [{"name": "Tri", "mesh": 0}],
        "meshes": [{"primitives": [{"attributes": {"POSITION": 0}, "indices": 1}]}],
        "buffers": [{"byteLength": 39}],
        "bufferViews": [
            {"buffer": 0, "byteOffset": 0, "byteLength": 36},
            {"buffer": 0, "byteOffset": 36, "byteLength": 3}
        ],
        "accessors": [
            {"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
             "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]},
            {"bufferView": 1, "componentType": 5121, "count": 3, "type": "SCALAR"}
        ]
    }"#;

    let events = RefCell::new(Vec::new());
    let sink = |diagnostic: &Diagnostic| events.borrow_mut().push(diagnostic.clone());
    let converter = Converter::new(&CpuMeshFactory, &CpuTextureFactory).with_diagnostics(&sink);

    let entity =
        pollster::block_on(converter.convert_bytes(&GltfSceneParser, &glb(json, &bin))).unwrap();

    let model = entity.find("Tri").unwrap().model.as_ref().unwrap();
    assert_eq!(model.mesh.primitives[0].vertices.len(), 3);
    assert!(model.mesh.primitives[0].indices.is_empty());
    assert!(events
        .borrow()
        .iter()
        .any(|event| matches!(event, Diagnostic::IndexDecodeFailed { .. })));

    // The glTF default material has a white base color and scalar factors.
    let material = model.materials[0].as_ref().unwrap();
    assert_eq!(material.base_color, Some(BaseColor::Tint(Vec4::ONE)));
}
