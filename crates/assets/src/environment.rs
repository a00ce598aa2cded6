use crate::AssetError;
use image::ImageFormat;
use std::path::Path;

/// How an environment texture is projected onto directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mapping {
    /// Longitude/latitude panorama, used for reflections and the background.
    EquirectangularReflection,
}

/// Container formats accepted for environment maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentFormat {
    OpenExr,
    Radiance,
}

impl EnvironmentFormat {
    pub fn from_path(path: &Path) -> Result<Self, AssetError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            Some("exr") => Ok(Self::OpenExr),
            Some("hdr") => Ok(Self::Radiance),
            _ => Err(AssetError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            Self::OpenExr => ImageFormat::OpenExr,
            Self::Radiance => ImageFormat::Hdr,
        }
    }
}

/// Linear-light RGBA float panorama.
#[derive(Clone, PartialEq)]
pub struct EnvironmentMap {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<f32>,
    pub mapping: Mapping,
}

impl std::fmt::Debug for EnvironmentMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mapping", &self.mapping)
            .finish_non_exhaustive()
    }
}

impl EnvironmentMap {
    /// Texel at integer coordinates, `[r, g, b, a]`.
    pub fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.texels[i],
            self.texels[i + 1],
            self.texels[i + 2],
            self.texels[i + 3],
        ]
    }

    /// Size of the texel payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.texels.len() * std::mem::size_of::<f32>()
    }
}

/// Decode an in-memory EXR or HDR file. `path` is only used for errors.
pub fn decode_environment(
    bytes: &[u8],
    format: EnvironmentFormat,
    path: &Path,
) -> Result<EnvironmentMap, AssetError> {
    let _span = tracing::info_span!("decode_environment", path = %path.display()).entered();
    let image = image::load_from_memory_with_format(bytes, format.image_format()).map_err(
        |source| AssetError::Decode {
            path: path.to_path_buf(),
            source,
        },
    )?;
    let rgba = image.into_rgba32f();
    let (width, height) = rgba.dimensions();
    tracing::debug!(width, height, "environment decoded");
    Ok(EnvironmentMap {
        width,
        height,
        texels: rgba.into_raw(),
        mapping: Mapping::EquirectangularReflection,
    })
}
