use std::sync::Arc;

use anyhow::bail;
use image::DynamicImage;

/// How a texture's texels are meant to be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureSemantic {
    Color,
    Normal,
    /// Linear single-channel data such as roughness or metalness.
    Raw,
}

/// Builds texture resources out of decoded images.
pub trait TextureResourceFactory {
    type Texture: Clone;

    fn create_texture(
        &self,
        image: &DynamicImage,
        semantic: TextureSemantic,
        label: &str,
    ) -> anyhow::Result<Self::Texture>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    R8,
}

/// Texture pixels kept in memory, ready to be uploaded by a renderer.
#[derive(Debug, PartialEq)]
pub struct Texture {
    pub label: String,
    pub semantic: TextureSemantic,
    pub format: TextureFormat,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Texture {
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            TextureFormat::Rgba8 => 4,
            TextureFormat::R8 => 1,
        }
    }
}

pub type TextureRef = Arc<Texture>;

#[derive(Debug, Clone, Copy, Default)]
pub struct CpuTextureFactory;

impl TextureResourceFactory for CpuTextureFactory {
    type Texture = TextureRef;

    fn create_texture(
        &self,
        image: &DynamicImage,
        semantic: TextureSemantic,
        label: &str,
    ) -> anyhow::Result<TextureRef> {
        if image.width() == 0 || image.height() == 0 {
            bail!("Texture {} has no pixels", label);
        }

        let rgba = image.to_rgba8();
        let (format, pixels) = match semantic {
            TextureSemantic::Color | TextureSemantic::Normal => {
                (TextureFormat::Rgba8, rgba.into_raw())
            }
            // Grayscale data is expected, so the red channel carries the value
            TextureSemantic::Raw => (
                TextureFormat::R8,
                rgba.pixels().map(|pixel| pixel[0]).collect(),
            ),
        };

        Ok(Arc::new(Texture {
            label: label.to_string(),
            semantic,
            format,
            width: image.width(),
            height: image.height(),
            pixels,
        }))
    }
}
