use crate::environment::{EnvironmentFormat, EnvironmentMap, decode_environment};
use crate::progress::{LoadProgress, ProgressReader};
use crate::AssetError;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::thread::JoinHandle;

/// Events emitted by an environment load, in order: zero or more
/// `Progress`, then exactly one `Loaded` or `Failed`.
#[derive(Debug)]
pub enum LoadEvent {
    Progress(LoadProgress),
    Loaded(EnvironmentMap),
    Failed(AssetError),
}

/// Reads and decodes one environment map, reporting progress as it goes.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    path: PathBuf,
    chunk_size: usize,
}

impl EnvironmentLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            chunk_size: 256 * 1024,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Run the load on a named worker thread. Events are handed to `on_event`
    /// on that thread; the caller forwards them to wherever state lives.
    pub fn spawn<F>(self, on_event: F) -> std::io::Result<JoinHandle<()>>
    where
        F: FnMut(LoadEvent) + Send + 'static,
    {
        std::thread::Builder::new()
            .name("environment-loader".into())
            .spawn(move || self.load_blocking(on_event))
    }

    /// Run the load on the current thread.
    pub fn load_blocking(&self, mut on_event: impl FnMut(LoadEvent)) {
        tracing::info!(path = %self.path.display(), "loading environment");
        let result = EnvironmentFormat::from_path(&self.path).and_then(|format| {
            let bytes = self.read_with_progress(&mut |p| on_event(LoadEvent::Progress(p)))?;
            decode_environment(&bytes, format, &self.path)
        });
        match result {
            Ok(env) => {
                tracing::info!(width = env.width, height = env.height, "environment ready");
                on_event(LoadEvent::Loaded(env));
            }
            Err(e) => {
                tracing::error!("environment load failed: {e}");
                on_event(LoadEvent::Failed(e));
            }
        }
    }

    /// Read the whole file. Progress is reported whenever the whole-percent
    /// value advances, and once more when the read finishes.
    fn read_with_progress(
        &self,
        on_progress: &mut dyn FnMut(LoadProgress),
    ) -> Result<Vec<u8>, AssetError> {
        let io_err = |source| AssetError::Io {
            path: self.path.clone(),
            source,
        };
        let file = File::open(&self.path).map_err(io_err)?;
        let total = file.metadata().map(|m| m.len()).ok();

        let mut last_whole = 0u32;
        let mut reader = ProgressReader::new(file, |loaded| {
            let progress = LoadProgress { loaded, total };
            let whole = progress.percent() as u32;
            if whole > last_whole && !progress.is_complete() {
                last_whole = whole;
                on_progress(progress);
            }
        });

        let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
        let mut chunk = vec![0u8; self.chunk_size];
        loop {
            let n = reader.read(&mut chunk).map_err(io_err)?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&chunk[..n]);
        }
        let loaded = reader.loaded();
        drop(reader);

        on_progress(LoadProgress {
            loaded,
            total: total.or(Some(loaded)),
        });
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::mpsc;

    fn write_exr(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let img = image::Rgba32FImage::from_pixel(width, height, image::Rgba([1.5, 1.0, 0.5, 1.0]));
        image::DynamicImage::ImageRgba32F(img).save(&path).unwrap();
        path
    }

    fn collect(loader: EnvironmentLoader) -> Vec<LoadEvent> {
        let (tx, rx) = mpsc::channel();
        let handle = loader
            .spawn(move |event| {
                let _ = tx.send(event);
            })
            .unwrap();
        handle.join().unwrap();
        rx.into_iter().collect()
    }

    #[test]
    fn progress_then_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_exr(dir.path(), "sky.exr", 32, 16);
        let events = collect(EnvironmentLoader::new(&path).with_chunk_size(16));

        let percents: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                LoadEvent::Progress(p) => Some(p.percent()),
                _ => None,
            })
            .collect();
        assert!(percents.len() > 1, "small chunks give several updates");
        assert!(percents.windows(2).all(|w| w[0] <= w[1]), "{percents:?}");
        assert!(percents.iter().all(|p| (0.0..=100.0).contains(p)));
        assert_eq!(percents.last().copied(), Some(100.0));

        match events.last() {
            Some(LoadEvent::Loaded(env)) => assert_eq!((env.width, env.height), (32, 16)),
            other => panic!("expected Loaded, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_fails_without_progress() {
        let dir = tempfile::tempdir().unwrap();
        let events = collect(EnvironmentLoader::new(dir.path().join("gone.exr")));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LoadEvent::Failed(AssetError::Io { .. })));
    }

    #[test]
    fn unsupported_extension_fails_fast() {
        let mut events = Vec::new();
        EnvironmentLoader::new("sky.jpg").load_blocking(|e| events.push(e));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            LoadEvent::Failed(AssetError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn corrupt_file_reports_full_progress_then_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.exr");
        std::fs::write(&path, vec![0u8; 1000]).unwrap();
        let mut events = Vec::new();
        EnvironmentLoader::new(&path).load_blocking(|e| events.push(e));
        assert!(matches!(events.first(), Some(LoadEvent::Progress(p)) if p.is_complete()));
        assert!(matches!(events.last(), Some(LoadEvent::Failed(AssetError::Decode { .. }))));
    }
}
