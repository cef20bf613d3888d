//! Wheel repackaging: stamp a staged binary into a generic wheel.
//!
//! The generic `none-any` wheel acts as a template. For each platform we
//! unpack it into a scratch directory, drop the matching binary into the
//! wheel's `.data/scripts/` tree, append a RECORD entry for it, and write
//! the result back out under a platform-specific compatibility tag. The
//! template file itself is never modified.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use zip::ZipArchive;
use zip::write::SimpleFileOptions;

use crate::release::{Arch, Platform, wheel_platform_tag};

/// Suffix of the wheel metadata directory.
pub const WHEEL_META_SUFFIX: &str = ".dist-info";
/// Suffix of the wheel data directory holding scripts.
pub const WHEEL_DATA_SUFFIX: &str = ".data";
/// Manifest file inside the metadata directory.
pub const RECORD_FILE: &str = "RECORD";
/// Compatibility tag of a generic (platform-independent) wheel filename.
pub const GENERIC_TAG: &str = "none-any";

#[derive(Error, Debug)]
pub enum WheelError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Expected exactly one {WHEEL_META_SUFFIX} directory in wheel, found {found}")]
    DistInfo { found: usize },

    #[error("Not a generic wheel (no `{GENERIC_TAG}` tag in filename): {0}")]
    NotGeneric(String),

    #[error("Expected exactly one generic ({GENERIC_TAG}) wheel in {dir}, found {found}")]
    Template { dir: String, found: usize },
}

/// Repackage `wheel_path` for one (platform, arch) pair.
///
/// Reads the staged binary from `bin_root/<platform>/<arch>/` and writes
/// the retagged wheel next to the template. Returns the output path.
///
/// # Errors
///
/// Fails when the wheel does not contain exactly one `.dist-info`
/// directory, when the staged binary is missing, or on any archive or
/// filesystem error. The scratch directory is removed on every path.
pub fn repackage(
    wheel_path: &Path,
    bin_root: &Path,
    platform: Platform,
    arch: Arch,
) -> Result<PathBuf, WheelError> {
    let tmp = tempfile::Builder::new()
        .prefix("gptscript-wheel-")
        .tempdir()?;

    let file = File::open(wheel_path)?;
    let mut archive = ZipArchive::new(file)?;
    archive.extract(tmp.path())?;

    // Exactly one metadata directory identifies the wheel layout.
    let dist_info = find_dist_info(tmp.path())?;
    let dist_info_name = dist_info
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = dist_info_name
        .strip_suffix(WHEEL_META_SUFFIX)
        .unwrap_or(&dist_info_name);

    let data_dir_name = format!("{stem}{WHEEL_DATA_SUFFIX}");
    let scripts_dir = tmp.path().join(&data_dir_name).join("scripts");
    fs::create_dir_all(&scripts_dir)?;

    // Missing staged binary propagates as a plain IO error.
    let binary = platform.binary_name();
    let src = bin_root
        .join(platform.as_str())
        .join(arch.as_str())
        .join(binary);
    let dst = scripts_dir.join(binary);
    fs::copy(&src, &dst)?;

    let (digest, size) = sha256_file(&dst)?;
    let record_line = format!("{data_dir_name}/scripts/{binary},{digest},{size}\n");

    let mut record = OpenOptions::new()
        .append(true)
        .open(dist_info.join(RECORD_FILE))?;
    record.write_all(record_line.as_bytes())?;
    record.flush()?;

    let generic_name = wheel_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| WheelError::NotGeneric(wheel_path.to_string_lossy().to_string()))?;
    let out_name = platform_wheel_name(generic_name, platform, arch)?;
    let out_path = wheel_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(out_name);

    write_wheel(tmp.path(), &out_path)?;
    Ok(out_path)
}

/// Rewrite a generic wheel filename for a (platform, arch) pair.
///
/// Replaces the literal `none-any` tag exactly once; the rest of the
/// filename is preserved byte for byte.
pub fn platform_wheel_name(
    filename: &str,
    platform: Platform,
    arch: Arch,
) -> Result<String, WheelError> {
    if !filename.contains(GENERIC_TAG) {
        return Err(WheelError::NotGeneric(filename.to_string()));
    }
    let tag = format!("none-{}", wheel_platform_tag(platform, arch));
    Ok(filename.replacen(GENERIC_TAG, &tag, 1))
}

/// Locate the single generic template wheel in `dist_dir`.
///
/// The builder emits one `none-any` wheel which is stamped once per
/// platform; zero or several candidates means the dist directory is not
/// in the expected state and repackaging would pick an arbitrary file.
pub fn find_generic_wheel(dist_dir: &Path) -> Result<PathBuf, WheelError> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dist_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(&format!("-{GENERIC_TAG}.whl")))
        })
        .collect();
    candidates.sort();

    match candidates.len() {
        1 => Ok(candidates.remove(0)),
        found => Err(WheelError::Template {
            dir: dist_dir.to_string_lossy().to_string(),
            found,
        }),
    }
}

/// Find the unique `.dist-info` directory directly under `root`.
fn find_dist_info(root: &Path) -> Result<PathBuf, WheelError> {
    let mut matches: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_dir()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(WHEEL_META_SUFFIX))
        })
        .collect();

    match matches.len() {
        1 => Ok(matches.remove(0)),
        found => Err(WheelError::DistInfo { found }),
    }
}

/// Hex SHA256 digest and byte length of a file.
fn sha256_file(path: &Path) -> io::Result<(String, u64)> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut size: u64 = 0;

    loop {
        let count = file.read(&mut buffer)?;
        if count == 0 {
            break;
        }
        hasher.update(&buffer[..count]);
        size += count as u64;
    }

    Ok((hex::encode(hasher.finalize()), size))
}

/// Write the contents of `root` into a new wheel at `out_path`.
///
/// Entries are sorted for a deterministic archive; unix mode bits are
/// carried over so the injected binary stays executable.
fn write_wheel(root: &Path, out_path: &Path) -> Result<(), WheelError> {
    let file = File::create(out_path)?;
    let mut writer = zip::ZipWriter::new(file);

    for entry in walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = path
            .strip_prefix(root)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let mut options = SimpleFileOptions::default();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = entry.metadata().map_err(io::Error::from)?;
            options = options.unix_permissions(metadata.permissions().mode());
        }

        writer.start_file(name, options)?;
        let mut f = File::open(path)?;
        io::copy(&mut f, &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}
