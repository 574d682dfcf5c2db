//! Asynchronous model loading.
//!
//! Natively the glTF file is parsed on a worker thread; in the browser
//! the asset is fetched and parsed from a local future. Either way the
//! result arrives on a channel that the event loop polls once per frame.

pub mod gltf_loader;

use crossbeam_channel::{Receiver, Sender};

use crate::core::error::DisplayResult;
use crate::core::scene::Scene;

pub use gltf_loader::{load_gltf, load_gltf_from_bytes};

/// A finished load request.
pub struct LoadedModel {
    pub path: String,
    pub result: DisplayResult<Scene>,
}

/// Loads models in the background and hands them back to the event loop.
pub struct ModelLoader {
    /// Channel to send finished loads
    tx: Sender<LoadedModel>,
    /// Channel to receive finished loads
    rx: Receiver<LoadedModel>,
}

impl ModelLoader {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self { tx, rx }
    }

    /// Start loading `path`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(&mut self, path: &str) {
        let tx = self.tx.clone();
        let path = path.to_string();
        log::info!("ModelLoader: queued {}", path);

        let spawned = std::thread::Builder::new()
            .name("model-loader".to_string())
            .spawn({
                let path = path.clone();
                let tx = tx.clone();
                move || {
                    let result = load_gltf(&path);
                    let _ = tx.send(LoadedModel { path, result });
                }
            });

        if let Err(e) = spawned {
            // No worker available: load inline.
            log::warn!("ModelLoader: failed to spawn worker ({}), loading inline", e);
            let result = load_gltf(&path);
            let _ = tx.send(LoadedModel { path, result });
        }
    }

    /// Start fetching and loading `url`.
    #[cfg(all(target_arch = "wasm32", feature = "web"))]
    pub fn load(&mut self, url: &str) {
        let tx = self.tx.clone();
        let path = url.to_string();
        log::info!("ModelLoader: fetching {}", path);

        wasm_bindgen_futures::spawn_local(async move {
            let result = match crate::web::fetch_bytes(&path).await {
                Ok(bytes) => load_gltf_from_bytes(&bytes),
                Err(e) => Err(e),
            };
            let _ = tx.send(LoadedModel { path, result });
        });
    }

    /// Take a finished load, if any.
    pub fn poll(&mut self) -> Option<LoadedModel> {
        self.rx.try_recv().ok()
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DisplayError;
    use std::time::{Duration, Instant};

    fn wait_for(loader: &mut ModelLoader) -> LoadedModel {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            if let Some(loaded) = loader.poll() {
                return loaded;
            }
            assert!(Instant::now() < deadline, "model load timed out");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_failed_load_is_reported() {
        let mut loader = ModelLoader::new();
        loader.load("no/such/clock.gltf");

        let loaded = wait_for(&mut loader);
        assert_eq!(loaded.path, "no/such/clock.gltf");
        assert!(matches!(loaded.result, Err(DisplayError::Io(_))));
        assert!(loader.poll().is_none());
    }

    #[test]
    fn test_poll_without_requests() {
        let mut loader = ModelLoader::new();
        assert!(loader.poll().is_none());
    }
}
