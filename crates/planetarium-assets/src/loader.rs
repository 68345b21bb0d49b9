//! Background fetch-and-decode worker pool.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crate::decode::{DecodedImage, ImageKind, decode_image};
use crate::error::AssetError;
use crate::source::AssetSource;

/// Caller-chosen identifier used to match results to requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u32);

/// One queued load.
#[derive(Clone, Debug)]
pub struct AssetRequest {
    /// Identifier echoed back in the result.
    pub id: AssetId,
    /// Where to fetch from.
    pub source: AssetSource,
    /// Target pixel layout.
    pub kind: ImageKind,
}

/// A finished load, successful or not.
#[derive(Debug)]
pub struct AssetEvent {
    /// Identifier from the request.
    pub id: AssetId,
    /// Source label for logs and progress.
    pub label: String,
    /// Decoded image or the reason it is missing.
    pub result: Result<DecodedImage, AssetError>,
}

/// Loads images on worker threads.
///
/// Requests go in through [`request`](Self::request); results are collected
/// with [`drain`](Self::drain), once per frame, on the thread that owns the
/// scene. Workers never touch scene state.
pub struct AssetLoader {
    request_sender: Option<crossbeam_channel::Sender<AssetRequest>>,
    event_receiver: crossbeam_channel::Receiver<AssetEvent>,
    worker_handles: Vec<JoinHandle<()>>,
    in_flight: Arc<AtomicUsize>,
}

impl AssetLoader {
    /// Spawn `worker_count` workers. Zero picks a count from the CPU count.
    pub fn new(worker_count: usize) -> Self {
        let worker_count = if worker_count == 0 {
            num_cpus::get().clamp(1, 4)
        } else {
            worker_count
        };
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<AssetRequest>();
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let in_flight = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::with_capacity(worker_count);
        for i in 0..worker_count {
            let rx = request_rx.clone();
            let tx = event_tx.clone();
            let flight = Arc::clone(&in_flight);

            let spawned = std::thread::Builder::new()
                .name(format!("asset-loader-{i}"))
                .spawn(move || {
                    while let Ok(request) = rx.recv() {
                        let label = request.source.label();
                        let result = load(&request.source, request.kind, &label);
                        flight.fetch_sub(1, Ordering::Relaxed);
                        let _ = tx.send(AssetEvent {
                            id: request.id,
                            label,
                            result,
                        });
                    }
                });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => tracing::error!("failed to spawn asset worker {i}: {e}"),
            }
        }
        tracing::debug!(workers = handles.len(), "asset loader started");

        Self {
            request_sender: Some(request_tx),
            event_receiver: event_rx,
            worker_handles: handles,
            in_flight,
        }
    }

    /// Queue a request. Fails only after shutdown.
    pub fn request(&self, request: AssetRequest) -> Result<(), AssetError> {
        let sender = self.request_sender.as_ref().ok_or(AssetError::Shutdown)?;
        if self.worker_handles.is_empty() {
            return Err(AssetError::Shutdown);
        }
        tracing::info!(id = request.id.0, source = %request.source.label(), "queued asset");
        self.in_flight.fetch_add(1, Ordering::Relaxed);
        if sender.send(request).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            return Err(AssetError::Shutdown);
        }
        Ok(())
    }

    /// Collect every finished load without blocking.
    pub fn drain(&self) -> Vec<AssetEvent> {
        self.event_receiver.try_iter().collect()
    }

    /// Requests queued or being processed.
    pub fn pending(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Close the queue and join the workers. In-flight requests finish first.
    pub fn shutdown(&mut self) {
        self.request_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Drop for AssetLoader {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn load(source: &AssetSource, kind: ImageKind, label: &str) -> Result<DecodedImage, AssetError> {
    let bytes = source.fetch()?;
    decode_image(&bytes, kind, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::Path;
    use std::time::{Duration, Instant};

    fn write_png(dir: &Path, name: &str) -> AssetSource {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([0, 128, 255, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, out.into_inner()).unwrap();
        AssetSource::Local(path)
    }

    fn wait_for(loader: &AssetLoader, count: usize) -> Vec<AssetEvent> {
        let start = Instant::now();
        let mut events = Vec::new();
        while events.len() < count {
            events.extend(loader.drain());
            assert!(start.elapsed() < Duration::from_secs(10), "timed out");
            std::thread::sleep(Duration::from_millis(1));
        }
        events
    }

    #[test]
    fn test_loads_local_png() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(2);
        loader
            .request(AssetRequest {
                id: AssetId(7),
                source: write_png(dir.path(), "a.png"),
                kind: ImageKind::Color,
            })
            .unwrap();

        let events = wait_for(&loader, 1);
        assert_eq!(events[0].id, AssetId(7));
        let img = events[0].result.as_ref().unwrap();
        assert_eq!((img.width, img.height), (2, 2));
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn test_missing_file_reports_error_event() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(1);
        loader
            .request(AssetRequest {
                id: AssetId(1),
                source: AssetSource::Local(dir.path().join("nope.png")),
                kind: ImageKind::Color,
            })
            .unwrap();
        let events = wait_for(&loader, 1);
        assert!(matches!(events[0].result, Err(AssetError::Io { .. })));
        assert!(events[0].label.ends_with("nope.png"));
    }

    #[test]
    fn test_many_requests_all_complete() {
        let dir = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(0);
        for i in 0..8 {
            loader
                .request(AssetRequest {
                    id: AssetId(i),
                    source: write_png(dir.path(), &format!("{i}.png")),
                    kind: ImageKind::Color,
                })
                .unwrap();
        }
        let mut ids: Vec<u32> = wait_for(&loader, 8).iter().map(|e| e.id.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn test_request_after_shutdown_fails() {
        let mut loader = AssetLoader::new(1);
        loader.shutdown();
        let err = loader
            .request(AssetRequest {
                id: AssetId(0),
                source: AssetSource::Local("x.png".into()),
                kind: ImageKind::Color,
            })
            .unwrap_err();
        assert!(matches!(err, AssetError::Shutdown));
    }
}
