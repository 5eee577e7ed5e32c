//! The asset collaborator.
//!
//! Loading is asynchronous and belongs to the component: a component wraps the
//! load in an `InitTask` and returns it from `start`. The scheduler only learns
//! whether initialization succeeded.

use anyhow::{bail, Context as _};
use async_trait::async_trait;
use std::path::{Component as PathComponent, Path, PathBuf};

#[async_trait]
pub trait AssetSource: Send + Sync {
    /// Fetches the raw bytes behind `identifier`.
    async fn load_async(&self, identifier: &str) -> anyhow::Result<Vec<u8>>;
}

/// Reads assets from files below a root directory.
#[derive(Debug, Clone)]
pub struct FsAssets {
    root: PathBuf,
}

impl FsAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps an identifier to a path, refusing anything that would escape the root.
    fn resolve(&self, identifier: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(identifier);
        if relative
            .components()
            .any(|c| !matches!(c, PathComponent::Normal(_) | PathComponent::CurDir))
        {
            bail!("asset identifier '{identifier}' must be a relative path inside the asset root");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetSource for FsAssets {
    async fn load_async(&self, identifier: &str) -> anyhow::Result<Vec<u8>> {
        let path = self.resolve(identifier)?;
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to load asset '{identifier}'"))
    }
}
