//! Binary staging: download and unpack one release archive per matrix leaf.
//!
//! Produces the `bin/<platform>/<arch>/<binary>` tree the repackager reads
//! from. The whole tree is created before the first download so a partial
//! run still leaves a predictable layout.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::Client;

use crate::io::{download, extract};
use crate::release::{PLATFORM_MATRIX, Release};
use crate::reporter::Reporter;

/// Downloads and extracts release binaries into a per-platform tree.
pub struct Stager<'a, R: Reporter> {
    client: &'a Client,
    release: &'a Release,
    bin_root: &'a Path,
    reporter: &'a R,
}

impl<'a, R: Reporter> Stager<'a, R> {
    pub fn new(client: &'a Client, release: &'a Release, bin_root: &'a Path, reporter: &'a R) -> Self {
        Self {
            client,
            release,
            bin_root,
            reporter,
        }
    }

    /// Directory holding the staged binary for one (platform, arch) pair.
    pub fn leaf_dir(&self, platform: crate::Platform, arch: crate::Arch) -> PathBuf {
        self.bin_root.join(platform.as_str()).join(arch.as_str())
    }

    /// Create every `bin/<platform>/<arch>` directory in the matrix.
    ///
    /// Idempotent: pre-existing directories are not an error.
    pub fn prepare_tree(&self) -> Result<()> {
        for (platform, archs) in PLATFORM_MATRIX {
            for arch in *archs {
                let dir = self.leaf_dir(*platform, *arch);
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Stage every (platform, arch) pair in the matrix.
    ///
    /// Per pair: stream the archive to the leaf directory, unpack it in
    /// place, delete the archive. No retries; the first failure aborts.
    pub async fn stage_all(&self) -> Result<()> {
        self.prepare_tree()?;

        for (platform, archs) in PLATFORM_MATRIX {
            for arch in *archs {
                self.stage_pair(*platform, *arch).await?;
            }
        }
        Ok(())
    }

    async fn stage_pair(&self, platform: crate::Platform, arch: crate::Arch) -> Result<()> {
        let url = self.release.archive_url(platform, arch);
        let archive_name = self.release.archive_name(platform, arch);
        let dest_dir = self.leaf_dir(platform, arch);
        let archive_path = dest_dir.join(&archive_name);

        let digest = download::download(self.client, &url, &archive_path, self.reporter)
            .await
            .with_context(|| format!("Failed to download {url}"))?;
        tracing::debug!(%url, %digest, "downloaded release asset");

        self.reporter.extracting(&archive_name);
        extract::extract_auto(&archive_path, &dest_dir)
            .with_context(|| format!("Failed to extract {archive_name}"))?;

        std::fs::remove_file(&archive_path)
            .with_context(|| format!("Failed to remove {archive_name}"))?;

        self.reporter
            .success(&format!("  staged {}/{}", platform, arch));
        Ok(())
    }
}

/// Extract the filename from a URL.
pub fn filename_from_url(url: &str) -> &str {
    url.split('/').next_back().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use tempfile::tempdir;

    #[test]
    fn test_filename_from_url() {
        assert_eq!(
            filename_from_url("https://example.com/v1/tool-v1-linux-amd64.tar.gz"),
            "tool-v1-linux-amd64.tar.gz"
        );
        assert_eq!(filename_from_url(""), "");
    }

    #[test]
    fn test_prepare_tree_creates_all_leaves() {
        let dir = tempdir().unwrap();
        let client = Client::new();
        let release = Release::gptscript();
        let stager = Stager::new(&client, &release, dir.path(), &NullReporter);

        stager.prepare_tree().unwrap();

        assert!(dir.path().join("linux/amd64").is_dir());
        assert!(dir.path().join("linux/arm64").is_dir());
        assert!(dir.path().join("macOS/universal").is_dir());
        assert!(dir.path().join("windows/amd64").is_dir());

        // Running again must not fail.
        stager.prepare_tree().unwrap();
    }
}
