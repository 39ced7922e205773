//! Mock media host for testing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::publisher::{HostingError, MediaHost};

/// Mock implementation of the MediaHost trait.
///
/// Hands out `https://cdn.example/<file name>` for every file it is given.
#[derive(Debug, Default)]
pub struct MockMediaHost {
    hosted: Arc<RwLock<Vec<PathBuf>>>,
    fail: Arc<RwLock<bool>>,
}

impl MockMediaHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Files hosted so far.
    pub async fn hosted(&self) -> Vec<PathBuf> {
        self.hosted.read().await.clone()
    }
}

#[async_trait]
impl MediaHost for MockMediaHost {
    async fn host(&self, path: &Path) -> Result<String, HostingError> {
        if *self.fail.read().await {
            return Err(HostingError("upload bucket unreachable".to_string()));
        }
        self.hosted.write().await.push(path.to_path_buf());
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("media");
        Ok(format!("https://cdn.example/{}", name))
    }
}
