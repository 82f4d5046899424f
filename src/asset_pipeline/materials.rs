use std::sync::Arc;

use glam::Vec4;
use id_arena::Id;
use image::DynamicImage;

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::texture::{TextureResourceFactory, TextureSemantic};

pub type MaterialId = Id<ReflectanceMaterial>;

/// Image contents of a material channel, either decoded by the parser or
/// still in its file encoding (PNG, JPEG, ...).
#[derive(Debug, Clone)]
pub enum MaterialImage {
    Decoded(Arc<DynamicImage>),
    Encoded(Arc<[u8]>),
}

impl MaterialImage {
    pub fn decode(&self) -> image::ImageResult<Arc<DynamicImage>> {
        match self {
            MaterialImage::Decoded(image) => Ok(image.clone()),
            MaterialImage::Encoded(bytes) => image::load_from_memory(bytes).map(Arc::new),
        }
    }
}

impl From<DynamicImage> for MaterialImage {
    fn from(image: DynamicImage) -> Self {
        MaterialImage::Decoded(Arc::new(image))
    }
}

#[derive(Debug, Clone, Default)]
pub enum MaterialChannel {
    #[default]
    Absent,
    Scalar(f32),
    Color(Vec4),
    Image(MaterialImage),
}

impl MaterialChannel {
    pub fn is_absent(&self) -> bool {
        matches!(self, MaterialChannel::Absent)
    }
}

/// Diffuse/specular/shininess material as found in COLLADA documents.
#[derive(Debug, Clone)]
pub struct ReflectanceMaterial {
    pub name: Option<String>,
    pub diffuse: MaterialChannel,
    pub specular: MaterialChannel,
    pub reflective: MaterialChannel,
    pub emission: MaterialChannel,
    pub transparent: MaterialChannel,
    pub metalness: MaterialChannel,
    pub roughness: MaterialChannel,
    pub normal: MaterialChannel,
    pub ambient_occlusion: MaterialChannel,
    pub self_illumination: MaterialChannel,
    pub multiply: MaterialChannel,
    /// Zero or below means no shininess was authored.
    pub shininess: f32,
    pub transparency: f32,
}

impl Default for ReflectanceMaterial {
    fn default() -> Self {
        Self {
            name: None,
            diffuse: MaterialChannel::Absent,
            specular: MaterialChannel::Absent,
            reflective: MaterialChannel::Absent,
            emission: MaterialChannel::Absent,
            transparent: MaterialChannel::Absent,
            metalness: MaterialChannel::Absent,
            roughness: MaterialChannel::Absent,
            normal: MaterialChannel::Absent,
            ambient_occlusion: MaterialChannel::Absent,
            self_illumination: MaterialChannel::Absent,
            multiply: MaterialChannel::Absent,
            shininess: 0.0,
            transparency: 1.0,
        }
    }
}

impl ReflectanceMaterial {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BaseColor<T> {
    Tint(Vec4),
    Texture(T),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PbrValue<T> {
    Scalar(f32),
    Texture(T),
}

impl<T> PbrValue<T> {
    pub fn scalar(&self) -> Option<f32> {
        match self {
            PbrValue::Scalar(value) => Some(*value),
            PbrValue::Texture(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PbrMaterial<T> {
    pub name: Option<String>,
    pub base_color: Option<BaseColor<T>>,
    pub normal: Option<T>,
    pub roughness: Option<PbrValue<T>>,
    pub metallic: Option<PbrValue<T>>,
    pub specular: Option<PbrValue<T>>,
    pub clearcoat: Option<PbrValue<T>>,
}

impl<T> PbrMaterial<T> {
    fn has_any_property(&self) -> bool {
        self.base_color.is_some()
            || self.normal.is_some()
            || self.roughness.is_some()
            || self.metallic.is_some()
            || self.specular.is_some()
            || self.clearcoat.is_some()
    }
}

/// Maps reflectance materials onto the physically based model.
///
/// Every output channel takes the first representation its source channel
/// offers, in the order scalar, color, image (base color: color, image).
/// A texture that cannot be built leaves its channel unresolved.
///
/// Roughness has two extra sources, applied in this order:
/// 1. `1 - specular` when the roughness channel is empty, no shininess was
///    authored and specular is a scalar.
/// 2. `1 - min(shininess / range, 1)` whenever shininess is positive. This
///    replaces any roughness resolved before it, including an explicit one.
pub struct MaterialResolver<'a, F> {
    textures: &'a F,
    shininess_range: f32,
    diagnostics: Diagnostics<'a>,
}

impl<'a, F: TextureResourceFactory> MaterialResolver<'a, F> {
    pub fn new(textures: &'a F, shininess_range: f32, diagnostics: Diagnostics<'a>) -> Self {
        Self {
            textures,
            shininess_range,
            diagnostics,
        }
    }

    pub fn resolve(&self, material: &ReflectanceMaterial) -> Option<PbrMaterial<F::Texture>> {
        let label = material.name.as_deref().unwrap_or("unnamed");

        let base_color = match &material.diffuse {
            MaterialChannel::Color(color) => Some(BaseColor::Tint(*color)),
            MaterialChannel::Image(image) => self
                .texture(label, "diffuse", image, TextureSemantic::Color)
                .map(BaseColor::Texture),
            _ => None,
        };

        let normal = match &material.normal {
            MaterialChannel::Image(image) => {
                self.texture(label, "normal", image, TextureSemantic::Normal)
            }
            _ => None,
        };

        let mut roughness = self.scalar_channel(label, "roughness", &material.roughness);

        if let MaterialChannel::Scalar(specular) = material.specular {
            if material.roughness.is_absent() && material.shininess <= 0.0 {
                roughness = Some(PbrValue::Scalar(1.0 - specular));
                log::trace!("{}: roughness from specular {}", label, specular);
            }
        }

        let specular = self.scalar_channel(label, "specular", &material.specular);
        let clearcoat = self.scalar_channel(label, "reflective", &material.reflective);
        let metallic = self.scalar_channel(label, "metalness", &material.metalness);

        if material.shininess > 0.0 {
            let normalized = (material.shininess / self.shininess_range).min(1.0);
            roughness = Some(PbrValue::Scalar(1.0 - normalized));
            log::trace!(
                "{}: roughness {} from shininess {}",
                label,
                1.0 - normalized,
                material.shininess
            );
        }

        let resolved = PbrMaterial {
            name: material.name.clone(),
            base_color,
            normal,
            roughness,
            metallic,
            specular,
            clearcoat,
        };

        if !resolved.has_any_property() {
            self.diagnostics.report(Diagnostic::NoMaterialProperties {
                material: label.to_string(),
            });
            return None;
        }

        Some(resolved)
    }

    /// Scalar, else the red component of a color, else a linear texture.
    fn scalar_channel(
        &self,
        label: &str,
        channel: &'static str,
        source: &MaterialChannel,
    ) -> Option<PbrValue<F::Texture>> {
        match source {
            MaterialChannel::Scalar(value) => Some(PbrValue::Scalar(*value)),
            MaterialChannel::Color(color) => Some(PbrValue::Scalar(color.x)),
            MaterialChannel::Image(image) => self
                .texture(label, channel, image, TextureSemantic::Raw)
                .map(PbrValue::Texture),
            MaterialChannel::Absent => None,
        }
    }

    fn texture(
        &self,
        label: &str,
        channel: &'static str,
        image: &MaterialImage,
        semantic: TextureSemantic,
    ) -> Option<F::Texture> {
        let result = image
            .decode()
            .map_err(anyhow::Error::from)
            .and_then(|image| {
                self.textures
                    .create_texture(&image, semantic, &format!("{} ({})", label, channel))
            });

        match result {
            Ok(texture) => Some(texture),
            Err(error) => {
                self.diagnostics.report(Diagnostic::TextureFailed {
                    material: label.to_string(),
                    channel,
                    reason: format!("{:#}", error),
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{Luma, RgbaImage};

    use super::*;
    use crate::texture::{CpuTextureFactory, TextureRef};

    fn resolve(material: &ReflectanceMaterial) -> Option<PbrMaterial<TextureRef>> {
        MaterialResolver::new(&CpuTextureFactory, 1000.0, Diagnostics::default()).resolve(material)
    }

    fn gray_image() -> MaterialImage {
        DynamicImage::ImageLuma8(image::GrayImage::from_pixel(2, 2, Luma([128]))).into()
    }

    fn roughness_of(material: &PbrMaterial<TextureRef>) -> Option<f32> {
        material.roughness.as_ref().and_then(PbrValue::scalar)
    }

    #[test]
    fn empty_material_resolves_to_nothing() {
        assert!(resolve(&ReflectanceMaterial::named("blank")).is_none());
    }

    #[test]
    fn unused_channels_do_not_count() {
        let material = ReflectanceMaterial {
            emission: MaterialChannel::Color(Vec4::ONE),
            ambient_occlusion: MaterialChannel::Scalar(0.5),
            transparency: 0.5,
            ..Default::default()
        };

        assert!(resolve(&material).is_none());
    }

    #[test]
    fn shininess_overrides_explicit_roughness() {
        let material = ReflectanceMaterial {
            roughness: MaterialChannel::Scalar(0.3),
            shininess: 500.0,
            ..Default::default()
        };

        let resolved = resolve(&material).unwrap();
        assert_eq!(roughness_of(&resolved), Some(0.5));
    }

    #[test]
    fn shininess_is_clamped_to_range() {
        let material = ReflectanceMaterial {
            shininess: 4000.0,
            ..Default::default()
        };

        assert_eq!(roughness_of(&resolve(&material).unwrap()), Some(0.0));
    }

    #[test]
    fn explicit_roughness_without_shininess() {
        let material = ReflectanceMaterial {
            roughness: MaterialChannel::Scalar(0.3),
            specular: MaterialChannel::Scalar(0.9),
            ..Default::default()
        };

        let resolved = resolve(&material).unwrap();
        assert_eq!(roughness_of(&resolved), Some(0.3));
        assert_eq!(resolved.specular, Some(PbrValue::Scalar(0.9)));
    }

    #[test]
    fn roughness_from_specular_only_without_other_signals() {
        let material = ReflectanceMaterial {
            specular: MaterialChannel::Scalar(0.75),
            ..Default::default()
        };

        let resolved = resolve(&material).unwrap();
        assert_eq!(roughness_of(&resolved), Some(0.25));
        assert_eq!(resolved.specular, Some(PbrValue::Scalar(0.75)));

        let with_shininess = ReflectanceMaterial {
            specular: MaterialChannel::Scalar(0.75),
            shininess: 100.0,
            ..Default::default()
        };
        let resolved = resolve(&with_shininess).unwrap();
        assert!((roughness_of(&resolved).unwrap() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn color_channels_use_red_component() {
        let material = ReflectanceMaterial {
            roughness: MaterialChannel::Color(Vec4::new(0.4, 0.4, 0.4, 1.0)),
            metalness: MaterialChannel::Color(Vec4::new(0.8, 0.1, 0.1, 1.0)),
            reflective: MaterialChannel::Color(Vec4::new(0.2, 0.9, 0.9, 1.0)),
            specular: MaterialChannel::Color(Vec4::new(0.6, 0.0, 0.0, 1.0)),
            ..Default::default()
        };

        let resolved = resolve(&material).unwrap();
        assert_eq!(roughness_of(&resolved), Some(0.4));
        assert_eq!(resolved.metallic, Some(PbrValue::Scalar(0.8)));
        assert_eq!(resolved.clearcoat, Some(PbrValue::Scalar(0.2)));
        assert_eq!(resolved.specular, Some(PbrValue::Scalar(0.6)));
    }

    #[test]
    fn diffuse_color_becomes_tint() {
        let tint = Vec4::new(0.9, 0.2, 0.1, 1.0);
        let material = ReflectanceMaterial {
            diffuse: MaterialChannel::Color(tint),
            ..Default::default()
        };

        assert_eq!(
            resolve(&material).unwrap().base_color,
            Some(BaseColor::Tint(tint))
        );
    }

    #[test]
    fn image_channels_become_textures() {
        let material = ReflectanceMaterial {
            name: Some("bricks".to_string()),
            diffuse: MaterialChannel::Image(gray_image()),
            normal: MaterialChannel::Image(gray_image()),
            metalness: MaterialChannel::Image(gray_image()),
            ..Default::default()
        };

        let resolved = resolve(&material).unwrap();

        let Some(BaseColor::Texture(base_color)) = &resolved.base_color else {
            panic!("expected a base color texture");
        };
        assert_eq!(base_color.semantic, TextureSemantic::Color);
        assert_eq!(base_color.label, "bricks (diffuse)");
        assert_eq!(resolved.normal.as_ref().unwrap().semantic, TextureSemantic::Normal);
        let Some(PbrValue::Texture(metallic)) = &resolved.metallic else {
            panic!("expected a metallic texture");
        };
        assert_eq!(metallic.pixels, vec![128; 4]);
    }

    #[test]
    fn encoded_images_are_decoded() {
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(1, 1, image::Rgba([1, 2, 3, 4])))
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let material = ReflectanceMaterial {
            diffuse: MaterialChannel::Image(MaterialImage::Encoded(png.into())),
            ..Default::default()
        };

        let resolved = resolve(&material).unwrap();
        let Some(BaseColor::Texture(texture)) = resolved.base_color else {
            panic!("expected a base color texture");
        };
        assert_eq!(texture.pixels, vec![1, 2, 3, 4]);
    }

    #[test]
    fn broken_texture_leaves_channel_unresolved() {
        let material = ReflectanceMaterial {
            diffuse: MaterialChannel::Image(MaterialImage::Encoded(Arc::from(&b"not an image"[..]))),
            metalness: MaterialChannel::Scalar(1.0),
            ..Default::default()
        };

        let resolved = resolve(&material).unwrap();
        assert!(resolved.base_color.is_none());
        assert_eq!(resolved.metallic, Some(PbrValue::Scalar(1.0)));
    }

    #[test]
    fn broken_roughness_texture_does_not_fall_back_to_specular() {
        let material = ReflectanceMaterial {
            roughness: MaterialChannel::Image(MaterialImage::Encoded(Arc::from(&b"??"[..]))),
            specular: MaterialChannel::Scalar(0.75),
            ..Default::default()
        };

        let resolved = resolve(&material).unwrap();
        assert!(resolved.roughness.is_none());
    }

    #[test]
    fn only_failed_textures_means_no_material() {
        let material = ReflectanceMaterial {
            normal: MaterialChannel::Image(MaterialImage::Encoded(Arc::from(&b"??"[..]))),
            ..Default::default()
        };

        assert!(resolve(&material).is_none());
    }
}
