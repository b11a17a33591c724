use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::Persistence;

/// One `<key>.json` file per key under `dir`.
pub struct FilePersistence {
    dir: PathBuf,
}

impl FilePersistence {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create state directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl Persistence for FilePersistence {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        // Write-then-rename: readers never see a partial file.
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&tmp, value)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FilePersistence::open(dir.path()).await.unwrap();
        assert_eq!(persistence.load("assessment_sessions").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = FilePersistence::open(dir.path().join("nested")).await.unwrap();
        persistence.save("cv_database", "{}").await.unwrap();
        persistence.save("cv_database", "[1]").await.unwrap();
        assert_eq!(
            persistence.load("cv_database").await.unwrap().as_deref(),
            Some("[1]")
        );
        assert!(!dir.path().join("nested/cv_database.json.tmp").exists());
    }
}
