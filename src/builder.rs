//! Wheel build invocation.
//!
//! Shells out to `poetry build` once per (platform, arch) pair. The build
//! tool reads the project configuration from the working directory and is
//! expected to emit a generic `none-any` wheel; the platform hint only
//! influences metadata the build hooks may record.

use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};

use crate::release::{Arch, Platform};

/// Environment variable carrying the `{platform}-{arch}` build hint.
pub const BUILD_HINT_ENV: &str = "GPTSCRIPT_PLATFORM";

/// Run the external build tool for one (platform, arch) pair.
///
/// The hint rides on the child's environment only; the parent process
/// environment is never touched, so nothing can leak into a later
/// invocation.
pub fn build_wheel(dist_dir: &Path, platform: Platform, arch: Arch) -> Result<()> {
    let hint = format!("{platform}-{arch}");

    let status = Command::new("poetry")
        .arg("build")
        .arg("--output")
        .arg(dist_dir)
        .env(BUILD_HINT_ENV, &hint)
        .status()
        .context("Failed to execute poetry build")?;

    if !status.success() {
        anyhow::bail!(
            "poetry build failed for {hint} with exit code: {:?}",
            status.code()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_hint_format() {
        assert_eq!(
            format!("{}-{}", Platform::Linux, Arch::Arm64),
            "linux-arm64"
        );
        assert_eq!(
            format!("{}-{}", Platform::MacOs, Arch::Universal),
            "macOS-universal"
        );
    }

    #[test]
    fn test_parent_env_is_untouched() {
        // build_wheel passes the hint via Command::env; it must never set
        // the variable in this process.
        let _ = build_wheel(Path::new("dist"), Platform::Windows, Arch::Amd64);
        assert!(std::env::var(BUILD_HINT_ENV).is_err());
    }
}
