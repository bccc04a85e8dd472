//! Access token slot
//!
//! The client keeps exactly one piece of session state of its own: the
//! bearer access token. The refresh credential lives in the transport's
//! cookie jar and is never visible here.

use std::sync::{PoisonError, RwLock};
use tracker_core::CoreResult;

/// Fixed key under which persistent stores keep the access token
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage for the current access token
pub trait TokenStore: Send + Sync {
    /// Read the current token, if any
    fn get(&self) -> CoreResult<Option<String>>;

    /// Replace the current token
    fn set(&self, token: &str) -> CoreResult<()>;

    /// Remove the current token, returning what was stored
    fn clear(&self) -> CoreResult<Option<String>>;
}

/// In-process token slot
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: RwLock::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> CoreResult<Option<String>> {
        Ok(self
            .slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, token: &str) -> CoreResult<()> {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> CoreResult<Option<String>> {
        Ok(self
            .slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileTokenStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::{ACCESS_TOKEN_KEY, TokenStore};
    use serde_json::{Map, Value};
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tracker_core::{CoreError, CoreResult, ErrorContext};

    /// Token slot persisted as a small JSON document on disk.
    ///
    /// The document is an object with the token under [`ACCESS_TOKEN_KEY`];
    /// other keys are preserved untouched. Reads go to disk every time so
    /// separate processes sharing the file see each other's logins.
    #[derive(Debug)]
    pub struct FileTokenStore {
        path: PathBuf,
        write_lock: Mutex<()>,
    }

    impl FileTokenStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                write_lock: Mutex::new(()),
            }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn read_document(&self) -> CoreResult<Map<String, Value>> {
            let content = match std::fs::read_to_string(&self.path) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
                Err(e) => {
                    return Err(e)
                        .with_context(|| format!("reading {}", self.path.display()))
                        .map_err(CoreError::io_error);
                }
            };
            if content.trim().is_empty() {
                return Ok(Map::new());
            }
            match serde_json::from_str(&content)? {
                Value::Object(map) => Ok(map),
                _ => Err(CoreError::serialization_error(format!(
                    "{} does not contain a JSON object",
                    self.path.display()
                ))),
            }
        }

        fn write_document(&self, document: &Map<String, Value>) -> CoreResult<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = serde_json::to_string_pretty(document)?;
            let tmp = self.path.with_extension("json.tmp");
            std::fs::write(&tmp, content)
                .and_then(|()| std::fs::rename(&tmp, &self.path))
                .with_context(|| format!("writing {}", self.path.display()))
                .map_err(CoreError::io_error)
        }
    }

    impl TokenStore for FileTokenStore {
        fn get(&self) -> CoreResult<Option<String>> {
            Ok(self
                .read_document()?
                .get(ACCESS_TOKEN_KEY)
                .and_then(Value::as_str)
                .map(str::to_string))
        }

        fn set(&self, token: &str) -> CoreResult<()> {
            let _guard = self
                .write_lock
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let mut document = self.read_document()?;
            document.insert(ACCESS_TOKEN_KEY.to_string(), Value::String(token.to_string()));
            self.write_document(&document)
        }

        fn clear(&self) -> CoreResult<Option<String>> {
            let _guard = self
                .write_lock
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let mut document = self.read_document()?;
            let previous = document
                .remove(ACCESS_TOKEN_KEY)
                .and_then(|v| v.as_str().map(str::to_string));
            if previous.is_some() {
                self.write_document(&document)?;
            }
            Ok(previous)
        }
    }
}
