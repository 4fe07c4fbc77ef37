//! Gallery content: the list of photos and the background loading of a
//! page's images.
//!
//! References in the content list are either absolute URLs or paths under
//! the web root (a leading `/` is the web root itself). Loading runs on
//! worker threads and reports back over a channel the frame loop drains.

use std::path::{Component, Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_ITEM_COUNT: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    pub image_url: String,
    pub title: String,
}

/// Built-in list used when the content source is unavailable or empty.
pub fn default_records() -> Vec<ContentRecord> {
    (1..=DEFAULT_ITEM_COUNT)
        .map(|n| ContentRecord {
            image_url: format!("/images/photo{n:02}.jpg"),
            title: format!("Work {n:02}"),
        })
        .collect()
}

pub fn is_remote(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// Fetches raw bytes for a content reference.
pub trait AssetSource: Send + Sync {
    fn read(&self, reference: &str) -> Result<Vec<u8>, String>;
}

/// Reads from disk under a web root, or over HTTP for absolute URLs.
pub struct WebAssets {
    web_root: PathBuf,
    http: Option<reqwest::blocking::Client>,
}

impl WebAssets {
    pub fn new(web_root: &Path) -> Self {
        let http = match reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
        {
            Ok(client) => Some(client),
            Err(e) => {
                log::warn!("HTTP client unavailable, remote assets disabled: {e}");
                None
            }
        };
        Self {
            web_root: web_root.to_path_buf(),
            http,
        }
    }

    /// Path of a local reference. Anything that would step outside the web
    /// root is rejected.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, String> {
        let relative = Path::new(reference.trim_start_matches('/'));
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(format!(
                        "Refusing to read {reference}: outside the web root"
                    ))
                }
            }
        }
        Ok(self.web_root.join(relative))
    }
}

impl AssetSource for WebAssets {
    fn read(&self, reference: &str) -> Result<Vec<u8>, String> {
        if is_remote(reference) {
            let client = self
                .http
                .as_ref()
                .ok_or_else(|| format!("Cannot fetch {reference}: no HTTP client"))?;
            let response = client
                .get(reference)
                .send()
                .map_err(|e| format!("Failed to fetch {reference}: {e}"))?;
            let status = response.status();
            if !status.is_success() {
                return Err(format!("Failed to fetch {reference}: HTTP {status}"));
            }
            let bytes = response
                .bytes()
                .map_err(|e| format!("Failed to read body of {reference}: {e}"))?;
            return Ok(bytes.to_vec());
        }
        let path = self.resolve(reference)?;
        std::fs::read(&path).map_err(|e| format!("Failed to read {}: {e}", path.display()))
    }
}

pub fn parse_records(bytes: &[u8]) -> Result<Vec<ContentRecord>, String> {
    serde_json::from_slice(bytes).map_err(|e| format!("Failed to parse gallery content: {e}"))
}

/// Fetch the content list, falling back to the built-in list on any error
/// or an empty list. Never fails.
pub fn load_records(source: &dyn AssetSource, location: &str) -> Vec<ContentRecord> {
    match source.read(location).and_then(|bytes| parse_records(&bytes)) {
        Ok(records) if !records.is_empty() => {
            log::info!("Loaded {} gallery entries from {location}", records.len());
            records
        }
        Ok(_) => {
            log::info!("Gallery content at {location} is empty, using built-in list");
            default_records()
        }
        Err(e) => {
            log::warn!("{e}; using built-in gallery list");
            default_records()
        }
    }
}

/// One decoded page item.
#[derive(Debug, Clone)]
pub struct LoadedItem {
    pub record: ContentRecord,
    pub image: image::RgbaImage,
}

impl LoadedItem {
    pub fn aspect(&self) -> f32 {
        let (w, h) = self.image.dimensions();
        if h == 0 {
            1.0
        } else {
            w as f32 / h as f32
        }
    }
}

#[derive(Debug)]
pub enum LoaderMessage {
    Content(Vec<ContentRecord>),
    Page {
        generation: u64,
        result: Result<Vec<LoadedItem>, String>,
    },
}

pub fn spawn_content_fetch(
    source: Arc<dyn AssetSource>,
    location: String,
    tx: Sender<LoaderMessage>,
) {
    thread::spawn(move || {
        let records = load_records(source.as_ref(), &location);
        // Receiver gone means the scene was torn down.
        let _ = tx.send(LoaderMessage::Content(records));
    });
}

/// Decode every image of a page in parallel. The page resolves only when
/// all of them succeed.
pub fn load_page(
    source: &dyn AssetSource,
    records: &[ContentRecord],
) -> Result<Vec<LoadedItem>, String> {
    thread::scope(|scope| {
        let handles: Vec<_> = records
            .iter()
            .map(|record| {
                scope.spawn(move || -> Result<LoadedItem, String> {
                    let bytes = source.read(&record.image_url)?;
                    let image = pf_render::texture::decode_rgba(&bytes)
                        .map_err(|e| format!("Failed to decode {}: {e}", record.image_url))?;
                    Ok(LoadedItem {
                        record: record.clone(),
                        image,
                    })
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| {
                h.join()
                    .unwrap_or_else(|_| Err("Image loader thread panicked".to_string()))
            })
            .collect()
    })
}

pub fn spawn_page_load(
    source: Arc<dyn AssetSource>,
    records: Vec<ContentRecord>,
    generation: u64,
    tx: Sender<LoaderMessage>,
) {
    thread::spawn(move || {
        let result = load_page(source.as_ref(), &records);
        if let Err(e) = &result {
            log::error!("Error preloading gallery page: {e}");
        }
        let _ = tx.send(LoaderMessage::Page { generation, result });
    });
}
