//! Asset loading: card textures, HDR environment maps, progress reporting.
//!
//! Decoding is delegated to the `image` crate. Textures are loaded
//! synchronously; the environment map is large and is loaded on a worker
//! thread that reports progress and completion as [`LoadEvent`]s.

use std::path::PathBuf;

mod environment;
mod loader;
mod progress;
mod texture;

pub use environment::{EnvironmentFormat, EnvironmentMap, Mapping, decode_environment};
pub use loader::{EnvironmentLoader, LoadEvent};
pub use progress::{LoadProgress, ProgressReader};
pub use texture::{Texture, load_texture, load_texture_or_blank};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("unsupported environment format: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

pub fn crate_info() -> &'static str {
    "vitrine-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }

    #[test]
    fn errors_name_the_path() {
        let err = AssetError::UnsupportedFormat(PathBuf::from("sky.jpg"));
        assert!(err.to_string().contains("sky.jpg"));
    }
}
