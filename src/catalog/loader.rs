//! Catalog loading: read JSON sheets from disk and build the index in the
//! background, without ever failing the editor that waits on it.

use super::{CatalogEntry, CatalogIndex, CatalogSchema, IndexOptions};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

/// Errors raised while reading a single catalog source.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("catalog {} is not valid JSON: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog {} must be a JSON array of rows", path.display())]
    NotAnArray { path: PathBuf },
}

/// A catalog file and the field mapping for its rows.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    pub path: PathBuf,
    pub schema: CatalogSchema,
}

impl CatalogSource {
    pub fn new(path: impl Into<PathBuf>, schema: CatalogSchema) -> Self {
        Self {
            path: path.into(),
            schema,
        }
    }
}

/// Parse catalog rows already in memory.
pub fn parse_rows(
    path: &Path,
    raw: &str,
    schema: &CatalogSchema,
) -> Result<Vec<CatalogEntry>, CatalogError> {
    let value: Value = serde_json::from_str(raw).map_err(|source| CatalogError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let Value::Array(rows) = value else {
        return Err(CatalogError::NotAnArray {
            path: path.to_path_buf(),
        });
    };
    let entries = CatalogIndex::entries_from_records(&rows, schema);
    let skipped = rows.len() - entries.len();
    if skipped > 0 {
        tracing::debug!(path = %path.display(), skipped, "skipped catalog rows without a label");
    }
    Ok(entries)
}

/// Read one catalog file.
pub async fn load_source(source: &CatalogSource) -> Result<Vec<CatalogEntry>, CatalogError> {
    let raw = tokio::fs::read_to_string(&source.path)
        .await
        .map_err(|e| CatalogError::Io {
            path: source.path.clone(),
            source: e,
        })?;
    parse_rows(&source.path, &raw, &source.schema)
}

/// Load every source and merge them into one index.
///
/// A source that fails contributes nothing and is logged. Returns `None`
/// only when `token` is cancelled, in which case no index is built.
pub async fn load_index(
    sources: &[CatalogSource],
    options: IndexOptions,
    token: &CancellationToken,
) -> Option<CatalogIndex> {
    let mut entries = Vec::new();
    for source in sources {
        let loaded = tokio::select! {
            _ = token.cancelled() => return None,
            loaded = load_source(source) => loaded,
        };
        match loaded {
            Ok(mut rows) => {
                tracing::info!(
                    path = %source.path.display(),
                    category = %source.schema.category,
                    rows = rows.len(),
                    "loaded catalog"
                );
                entries.append(&mut rows);
            }
            Err(e) => tracing::warn!("{e}"),
        }
    }
    if token.is_cancelled() {
        return None;
    }
    Some(CatalogIndex::build(entries, options))
}

/// Handle to a one-shot background catalog load.
///
/// Dropping the handle cancels the load; a result that arrives afterwards
/// is discarded with the task.
#[derive(Debug)]
pub struct CatalogLoad {
    rx: Option<oneshot::Receiver<CatalogIndex>>,
    token: CancellationToken,
}

impl CatalogLoad {
    /// Start loading on the current tokio runtime.
    pub fn spawn(sources: Vec<CatalogSource>, options: IndexOptions) -> Self {
        let token = CancellationToken::new();
        let (tx, rx) = oneshot::channel();
        let task_token = token.clone();
        tokio::spawn(async move {
            if let Some(index) = load_index(&sources, options, &task_token).await
                && !task_token.is_cancelled()
            {
                // Receiver gone means the view went away first.
                let _ = tx.send(index);
            }
        });
        Self {
            rx: Some(rx),
            token,
        }
    }

    /// Take the built index once it is ready. Returns `None` while pending
    /// and after the index has been handed out.
    pub fn poll(&mut self) -> Option<Arc<CatalogIndex>> {
        let rx = self.rx.as_mut()?;
        match rx.try_recv() {
            Ok(index) => {
                self.rx = None;
                Some(Arc::new(index))
            }
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.rx = None;
                None
            }
        }
    }

    /// Whether a result may still arrive.
    pub fn is_pending(&self) -> bool {
        self.rx.is_some()
    }

    pub fn cancel(&mut self) {
        self.token.cancel();
        self.rx = None;
    }
}

impl Drop for CatalogLoad {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
