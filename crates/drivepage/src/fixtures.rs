// Fixtures - Unique names and throwaway files for tests that create content
//
// Concurrent workers share one account on the application, so every folder or
// file a test creates carries a random suffix.

use crate::error::Result;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// `<prefix>-<8 hex chars>`, unique per call.
pub fn unique_name(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &id[..8])
}

/// Small text files written for upload tests.
#[derive(Debug, Clone)]
pub struct FixtureFiles {
    paths: Vec<PathBuf>,
}

impl FixtureFiles {
    /// Writes `count` files named `<unique>.<ext>` into `dir`, creating it if
    /// needed.
    pub async fn create(dir: &Path, count: usize, ext: &str) -> Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let mut paths = Vec::with_capacity(count);
        for index in 0..count {
            let path = dir.join(format!("{}.{ext}", unique_name("upload")));
            let body = format!("drivepage fixture {index}\n");
            tokio::fs::write(&path, body).await?;
            paths.push(path);
        }
        tracing::debug!(count, dir = %dir.display(), "created fixture files");
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// File names as the application will list them.
    pub fn names(&self) -> Vec<String> {
        self.paths
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect()
    }

    /// Deletes the files. Missing files are ignored.
    pub async fn remove(self) -> Result<()> {
        for path in &self.paths {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_names_differ_and_keep_the_prefix() {
        let a = unique_name("folder");
        let b = unique_name("folder");
        assert_ne!(a, b);
        assert!(a.starts_with("folder-"));
        assert_eq!(a.len(), "folder-".len() + 8);
    }

    #[tokio::test]
    async fn creates_and_removes_fixture_files() {
        let dir = tempfile::tempdir().unwrap();
        let files = FixtureFiles::create(&dir.path().join("nested"), 3, "txt")
            .await
            .unwrap();

        assert_eq!(files.paths().len(), 3);
        for path in files.paths() {
            assert!(path.exists());
            assert_eq!(path.extension().unwrap(), "txt");
        }
        assert!(files.names().iter().all(|n| n.starts_with("upload-")));

        let paths = files.paths().to_vec();
        files.remove().await.unwrap();
        assert!(paths.iter().all(|p| !p.exists()));
    }
}
