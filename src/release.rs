//! Release descriptor and platform matrix.
//!
//! Everything here is fixed configuration: which tool we package, where its
//! release archives live, and which (platform, arch) pairs get a wheel.

use std::fmt;
use std::str::FromStr;

/// Target operating system for a staged binary.
///
/// The string forms match the names gptscript uses in its release asset
/// filenames (`linux`, `macOS`, `windows`), not Rust target triples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    /// Name as it appears in release archive filenames and the `bin/` tree.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::MacOs => "macOS",
            Self::Windows => "windows",
        }
    }

    /// Archive suffix published for this platform.
    pub fn archive_ext(&self) -> &'static str {
        match self {
            Self::Windows => "zip",
            _ => "tar.gz",
        }
    }

    /// Executable name inside the release archive.
    pub fn binary_name(&self) -> &'static str {
        match self {
            Self::Windows => "gptscript.exe",
            _ => "gptscript",
        }
    }

    /// Wheel platform-tag prefix for this OS.
    ///
    /// `manylinux2014` and `macosx_10_9` are the oldest tags pip still
    /// resolves for the interpreters gptscript supports.
    pub fn tag_prefix(&self) -> &'static str {
        match self {
            Self::Linux => "manylinux2014",
            Self::MacOs => "macosx_10_9",
            Self::Windows => "win",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Self::Linux),
            "macos" | "darwin" => Ok(Self::MacOs),
            "windows" => Ok(Self::Windows),
            _ => Err(format!("Unknown platform: {s}")),
        }
    }
}

/// Target CPU architecture, named the way release assets name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Amd64,
    Arm64,
    /// macOS fat binary covering both CPU families.
    Universal,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
            Self::Arm64 => "arm64",
            Self::Universal => "universal",
        }
    }

    /// CPU component of the wheel platform tag.
    pub fn cpu_tag(&self) -> &'static str {
        match self {
            Self::Amd64 => "x86_64",
            Self::Arm64 => "aarch64",
            Self::Universal => "universal2",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "amd64" | "x86_64" => Ok(Self::Amd64),
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "universal" | "universal2" => Ok(Self::Universal),
            _ => Err(format!("Unknown architecture: {s}")),
        }
    }
}

/// Every (platform, arch) pair a wheel is produced for.
///
/// Order matters only for output readability; each pair is independent.
pub const PLATFORM_MATRIX: &[(Platform, &[Arch])] = &[
    (Platform::Linux, &[Arch::Amd64, Arch::Arm64]),
    (Platform::MacOs, &[Arch::Universal]),
    (Platform::Windows, &[Arch::Amd64]),
];

/// Compute the wheel platform tag for a (platform, arch) pair.
///
/// Windows is always tagged `win_amd64`: gptscript publishes no other
/// Windows binary, so the requested arch is ignored there.
pub fn wheel_platform_tag(platform: Platform, arch: Arch) -> String {
    match platform {
        Platform::Windows => "win_amd64".to_string(),
        _ => format!("{}_{}", platform.tag_prefix(), arch.cpu_tag()),
    }
}

/// Identity of the upstream release being packaged.
#[derive(Debug, Clone)]
pub struct Release {
    /// Tool name as it appears in asset filenames.
    pub name: String,
    /// Tagged version, including the leading `v`.
    pub version: String,
    /// Release download base, without a trailing slash.
    pub base_url: String,
}

impl Release {
    /// The gptscript release this crate is pinned to.
    pub fn gptscript() -> Self {
        Self {
            name: "gptscript".to_string(),
            version: "v0.9.5".to_string(),
            base_url: "https://github.com/gptscript-ai/gptscript/releases/download".to_string(),
        }
    }

    /// Override the pinned version (used by the `--tool-version` flag).
    pub fn with_version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Asset filename for a (platform, arch) pair.
    pub fn archive_name(&self, platform: Platform, arch: Arch) -> String {
        format!(
            "{}-{}-{}-{}.{}",
            self.name,
            self.version,
            platform,
            arch,
            platform.archive_ext()
        )
    }

    /// Full download URL: `<base>/<version>/<name>-<version>-<platform>-<arch>.<ext>`.
    pub fn archive_url(&self, platform: Platform, arch: Arch) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            self.version,
            self.archive_name(platform, arch)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wheel_platform_tags() {
        assert_eq!(
            wheel_platform_tag(Platform::Linux, Arch::Arm64),
            "manylinux2014_aarch64"
        );
        assert_eq!(
            wheel_platform_tag(Platform::Linux, Arch::Amd64),
            "manylinux2014_x86_64"
        );
        assert_eq!(
            wheel_platform_tag(Platform::Windows, Arch::Amd64),
            "win_amd64"
        );
        assert_eq!(
            wheel_platform_tag(Platform::MacOs, Arch::Universal),
            "macosx_10_9_universal2"
        );
    }

    #[test]
    fn test_windows_arch_is_forced_to_amd64() {
        // Only amd64 assets exist for Windows; any requested arch maps to win_amd64.
        assert_eq!(
            wheel_platform_tag(Platform::Windows, Arch::Arm64),
            "win_amd64"
        );
    }

    #[test]
    fn test_archive_url_pattern() {
        let release = Release::gptscript();
        assert_eq!(
            release.archive_url(Platform::Linux, Arch::Amd64),
            "https://github.com/gptscript-ai/gptscript/releases/download/v0.9.5/gptscript-v0.9.5-linux-amd64.tar.gz"
        );
        assert_eq!(
            release.archive_url(Platform::Windows, Arch::Amd64),
            "https://github.com/gptscript-ai/gptscript/releases/download/v0.9.5/gptscript-v0.9.5-windows-amd64.zip"
        );
    }

    #[test]
    fn test_archive_ext_and_binary_name() {
        assert_eq!(Platform::Windows.archive_ext(), "zip");
        assert_eq!(Platform::Linux.archive_ext(), "tar.gz");
        assert_eq!(Platform::MacOs.archive_ext(), "tar.gz");
        assert_eq!(Platform::Windows.binary_name(), "gptscript.exe");
        assert_eq!(Platform::Linux.binary_name(), "gptscript");
    }

    #[test]
    fn test_platform_from_str() {
        assert_eq!("linux".parse::<Platform>(), Ok(Platform::Linux));
        assert_eq!("macOS".parse::<Platform>(), Ok(Platform::MacOs));
        assert_eq!("darwin".parse::<Platform>(), Ok(Platform::MacOs));
        assert!("freebsd".parse::<Platform>().is_err());
    }

    #[test]
    fn test_arch_from_str() {
        assert_eq!("amd64".parse::<Arch>(), Ok(Arch::Amd64));
        assert_eq!("aarch64".parse::<Arch>(), Ok(Arch::Arm64));
        assert_eq!("universal".parse::<Arch>(), Ok(Arch::Universal));
        assert!("mips".parse::<Arch>().is_err());
    }

    #[test]
    fn test_matrix_pairs_have_release_assets() {
        let release = Release::gptscript();
        for (platform, archs) in PLATFORM_MATRIX {
            for arch in *archs {
                let name = release.archive_name(*platform, *arch);
                assert!(name.starts_with("gptscript-v"));
                assert!(name.ends_with(platform.archive_ext()));
            }
        }
    }

    #[test]
    fn test_with_version_override() {
        let release = Release::gptscript().with_version("v0.9.6-rc1");
        assert!(
            release
                .archive_url(Platform::MacOs, Arch::Universal)
                .contains("/v0.9.6-rc1/gptscript-v0.9.6-rc1-macOS-universal.tar.gz")
        );
    }
}
