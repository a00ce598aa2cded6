use crate::AssetError;
use std::path::Path;

/// Decoded 8-bit RGBA image, rows top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct Texture {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("label", &self.label)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Texture {
    /// A 1x1 texture of a single color.
    pub fn solid(label: impl Into<String>, rgba: [u8; 4]) -> Self {
        Self {
            label: label.into(),
            width: 1,
            height: 1,
            pixels: rgba.to_vec(),
        }
    }
}

/// Load and decode an image file into RGBA8.
pub fn load_texture(path: impl AsRef<Path>) -> Result<Texture, AssetError> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| match source {
        image::ImageError::IoError(source) => AssetError::Io {
            path: path.to_path_buf(),
            source,
        },
        source => AssetError::Decode {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    tracing::debug!(path = %path.display(), width, height, "texture decoded");
    Ok(Texture {
        label: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Load a texture, substituting opaque white when it cannot be read.
pub fn load_texture_or_blank(path: impl AsRef<Path>) -> Texture {
    let path = path.as_ref();
    match load_texture(path) {
        Ok(texture) => texture,
        Err(e) => {
            tracing::warn!("{e}; using a blank texture");
            Texture::solid(path.display().to_string(), [255, 255, 255, 255])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_png_as_rgba8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card_top.png");
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 128]));
        img.save(&path).unwrap();

        let tex = load_texture(&path).unwrap();
        assert_eq!(tex.label, "card_top.png");
        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(tex.pixels.len(), 3 * 2 * 4);
        assert_eq!(&tex.pixels[..4], &[10, 20, 30, 128]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_texture(dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = load_texture(&path).unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
    }

    #[test]
    fn blank_fallback_is_white() {
        let tex = load_texture_or_blank("/definitely/missing/card.png");
        assert_eq!((tex.width, tex.height), (1, 1));
        assert_eq!(tex.pixels, vec![255, 255, 255, 255]);
    }
}
