//! Directory-backed durable store
//!
//! Each key lives in its own `<encoded key>.json` file. Changes made by other
//! processes are discovered by polling the directory and diffing it against the
//! last contents this context saw or wrote.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::traits::{DurableStore, ExternalChange, StoreError};
use super::CHANGE_CHANNEL_CAPACITY;

const EXTENSION: &str = "json";

#[derive(Debug)]
struct Inner {
    root: PathBuf,
    /// Last contents seen or written by this context, per key
    known: Mutex<HashMap<String, Vec<u8>>>,
    changes: broadcast::Sender<ExternalChange>,
}

impl Inner {
    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{EXTENSION}", encode_key(key)))
    }

    /// Read every key file currently on disk
    async fn read_all(&self) -> Result<HashMap<String, Vec<u8>>, StoreError> {
        let mut entries = HashMap::new();
        let mut dir = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let Some(key) = key_from_path(&path) else {
                continue;
            };
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    entries.insert(key, bytes);
                }
                // Removed between listing and reading
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(entries)
    }

    /// Diff the directory against known contents and broadcast the differences
    async fn scan(&self) -> Result<usize, StoreError> {
        let mut known = self.known.lock().await;
        let on_disk = self.read_all().await?;
        let mut changed = 0;

        for (key, value) in &on_disk {
            if known.get(key) != Some(value) {
                known.insert(key.clone(), value.clone());
                let _ = self.changes.send(ExternalChange {
                    key: key.clone(),
                    value: Some(value.clone()),
                });
                changed += 1;
            }
        }

        let removed: Vec<String> = known
            .keys()
            .filter(|k| !on_disk.contains_key(*k))
            .cloned()
            .collect();
        for key in removed {
            known.remove(&key);
            let _ = self.changes.send(ExternalChange { key, value: None });
            changed += 1;
        }

        if changed > 0 {
            tracing::debug!("Detected {changed} external change(s) in {:?}", self.root);
        }
        Ok(changed)
    }
}

/// Durable store keeping one JSON file per key under a directory
#[derive(Debug)]
pub struct FileStore {
    inner: Arc<Inner>,
    poller: Option<JoinHandle<()>>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `root`
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let inner = Arc::new(Inner {
            root,
            known: Mutex::new(HashMap::new()),
            changes,
        });
        let snapshot = inner.read_all().await?;
        *inner.known.lock().await = snapshot;
        Ok(Self {
            inner,
            poller: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.inner.root
    }

    /// Scan once for changes made by other processes; returns how many were found
    pub async fn poll_changes(&self) -> Result<usize, StoreError> {
        self.inner.scan().await
    }

    /// Poll for external changes in the background until the store is dropped
    pub fn watch(&mut self, interval: Duration) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
        }
        let inner = Arc::clone(&self.inner);
        self.poller = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = inner.scan().await {
                    tracing::warn!("Polling {:?} failed: {e}", inner.root);
                }
            }
        }));
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl DurableStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match tokio::fs::read(self.inner.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        // Held across the write so a concurrent scan never mistakes it for an external change
        let mut known = self.inner.known.lock().await;
        let path = self.inner.path_for(key);
        // Private temp file per write; other handles may be writing the same key
        let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp, &value).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        known.insert(key.to_string(), value);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ExternalChange> {
        self.inner.changes.subscribe()
    }
}

/// Percent-encode everything outside `[A-Za-z0-9_-]` so any key is a safe file name
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

fn decode_key(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).ok()
}

fn key_from_path(path: &Path) -> Option<String> {
    if path.extension()? != EXTENSION {
        return None;
    }
    decode_key(path.file_stem()?.to_str()?)
}
