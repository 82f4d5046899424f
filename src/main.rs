use anyhow::{bail, Context, Result};
use daekit::{
    BaseColor, CpuMeshFactory, CpuTextureFactory, GltfSceneParser, Model, PbrMaterial, TextureRef,
};

type Entity = daekit::RenderEntity<Model, TextureRef>;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let mut path = None;
    let mut flatten = false;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--flatten" => flatten = true,
            _ if path.is_none() => path = Some(arg),
            _ => bail!("Unexpected argument: {}", arg),
        }
    }

    let Some(path) = path else {
        bail!("Usage: daekit <file.gltf|file.glb> [--flatten]");
    };

    let bytes = std::fs::read(&path).with_context(|| format!("Failed to read {}", path))?;

    pollster::block_on(run(&bytes, flatten))
}

async fn run(bytes: &[u8], flatten: bool) -> Result<()> {
    let converter = daekit::Converter::new(&CpuMeshFactory, &CpuTextureFactory);

    let entity = if flatten {
        let scene = daekit::SceneParser::parse(&GltfSceneParser, bytes)?;
        converter.convert_flattened(&scene, scene.root()).await
    } else {
        converter.convert_bytes(&GltfSceneParser, bytes).await
    };

    let Some(entity) = entity else {
        bail!("Nothing to convert");
    };

    print_tree(&entity);
    print_bounds(&entity);

    Ok(())
}

fn print_tree(root: &Entity) {
    let mut stack = vec![(root, 0)];

    while let Some((entity, depth)) = stack.pop() {
        let name = entity.name.as_deref().unwrap_or("unnamed");

        match &entity.model {
            Some(model) => {
                let vertices: usize = model.mesh.primitives.iter().map(|p| p.vertices.len()).sum();
                let triangles: usize = model.mesh.primitives.iter().map(|p| p.num_triangles()).sum();
                let materials: Vec<_> = model
                    .materials
                    .iter()
                    .map(|material| material.as_ref().map_or("-".to_string(), describe_material))
                    .collect();

                println!(
                    "{:indent$}{} [{} submeshes, {} vertices, {} triangles] {}",
                    "",
                    name,
                    model.mesh.primitives.len(),
                    vertices,
                    triangles,
                    materials.join(", "),
                    indent = depth * 2
                );
            }
            None => println!("{:indent$}{}", "", name, indent = depth * 2),
        }

        for child in entity.children.iter().rev() {
            stack.push((child, depth + 1));
        }
    }
}

fn describe_material(material: &PbrMaterial<TextureRef>) -> String {
    let base_color = match &material.base_color {
        Some(BaseColor::Tint(color)) => format!("tint {:.2?}", color.to_array()),
        Some(BaseColor::Texture(texture)) => format!("{}x{} texture", texture.width, texture.height),
        None => "no base color".to_string(),
    };

    format!(
        "{} ({}, roughness {:?}, metallic {:?})",
        material.name.as_deref().unwrap_or("unnamed"),
        base_color,
        material.roughness.as_ref().and_then(|value| value.scalar()),
        material.metallic.as_ref().and_then(|value| value.scalar()),
    )
}

fn print_bounds(root: &Entity) {
    for (entity, world_matrix) in root.iter().zip(root.world_transforms()) {
        let Some(model) = &entity.model else {
            continue;
        };

        let min = world_matrix.transform_point3(model.mesh.bounds.min);
        let max = world_matrix.transform_point3(model.mesh.bounds.max);

        println!(
            "{}: world bounds {:.3?} .. {:.3?}",
            entity.name.as_deref().unwrap_or("unnamed"),
            min.min(max).to_array(),
            min.max(max).to_array()
        );
    }
}
