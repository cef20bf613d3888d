use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Client;
use tracing_subscriber::EnvFilter;

use gptscript_wheels::release::{Arch, PLATFORM_MATRIX, Platform, Release};
use gptscript_wheels::reporter::{ConsoleReporter, Reporter};
use gptscript_wheels::stage::Stager;
use gptscript_wheels::{builder, wheel};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory the build tool writes wheels into (defaults to "dist")
    #[arg(long, default_value = "dist")]
    dist_dir: PathBuf,

    /// Root of the staged binary tree (defaults to "bin")
    #[arg(long, default_value = "bin")]
    bin_root: PathBuf,

    /// Override the pinned gptscript release tag (e.g. "v0.9.5")
    #[arg(long)]
    tool_version: Option<String>,

    /// Reuse already-staged binaries instead of downloading
    #[arg(long, default_value_t = false)]
    skip_download: bool,

    /// Reuse an already-built generic wheel instead of running the build tool
    #[arg(long, default_value_t = false)]
    skip_build: bool,

    /// Only repackage for a single platform (linux, macOS, windows)
    #[arg(long)]
    platform: Option<Platform>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut release = Release::gptscript();
    if let Some(version) = &args.tool_version {
        release = release.with_version(version);
    }

    let pairs: Vec<(Platform, Arch)> = PLATFORM_MATRIX
        .iter()
        .flat_map(|(platform, archs)| archs.iter().map(|arch| (*platform, *arch)))
        .filter(|(platform, _)| args.platform.is_none_or(|p| p == *platform))
        .collect();

    let reporter = ConsoleReporter::new();

    if !args.skip_download {
        reporter.info(&format!(
            "Staging {} {} binaries...",
            release.name, release.version
        ));
        let client = Client::new();
        let stager = Stager::new(&client, &release, &args.bin_root, &reporter);
        stager.stage_all().await?;
    }

    if !args.skip_build {
        std::fs::create_dir_all(&args.dist_dir)
            .with_context(|| format!("Failed to create {}", args.dist_dir.display()))?;
        for (platform, arch) in &pairs {
            reporter.info(&format!("Building wheel for {platform}-{arch}..."));
            builder::build_wheel(&args.dist_dir, *platform, *arch)?;
        }
    }

    // One template, many stamped copies: every platform wheel is derived
    // from the single generic wheel the build step produced.
    let template = wheel::find_generic_wheel(&args.dist_dir)?;
    reporter.info(&format!("Using template wheel {}", template.display()));

    for (platform, arch) in &pairs {
        let out = wheel::repackage(&template, &args.bin_root, *platform, *arch)
            .with_context(|| format!("Failed to repackage for {platform}-{arch}"))?;
        reporter.success(&format!("Wheel written: {}", out.display()));
    }

    Ok(())
}
