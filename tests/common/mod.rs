#![allow(dead_code)]

use glam::{Vec2, Vec3};

use daekit::geometry::{Geometry, GeometryElement, GeometrySource, PrimitiveType};

pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}

pub fn quad_positions() -> Vec<Vec3> {
    vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(1.0, 1.0, 0.0),
    ]
}

/// Two triangles over four vertices with normals and texcoords.
pub fn quad_geometry(name: &str) -> Geometry {
    let texcoords = [
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(0.0, 1.0),
        Vec2::new(1.0, 1.0),
    ];

    Geometry::new(name)
        .with_source(GeometrySource::from_positions(&quad_positions()))
        .with_source(GeometrySource::from_normals(&[Vec3::Z; 4]))
        .with_source(GeometrySource::from_texcoords(&texcoords))
        .with_element(GeometryElement::from_u16_indices(
            PrimitiveType::Triangles,
            2,
            &[0, 1, 2, 1, 2, 3],
        ))
}

/// Wraps a JSON document and its binary chunk into a GLB container.
pub fn glb(json: &str, bin: &[u8]) -> Vec<u8> {
    let mut json = json.as_bytes().to_vec();
    while json.len() % 4 != 0 {
        json.push(b' ');
    }
    let mut bin = bin.to_vec();
    while bin.len() % 4 != 0 {
        bin.push(0);
    }

    let total = 12 + 8 + json.len() + 8 + bin.len();
    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&(total as u32).to_le_bytes());
    out.extend_from_slice(&(json.len() as u32).to_le_bytes());
    out.extend_from_slice(b"JSON");
    out.extend_from_slice(&json);
    out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
    out.extend_from_slice(b"BIN\0");
    out.extend_from_slice(&bin);
    out
}
