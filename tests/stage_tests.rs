//! Staging tests against a mocked release server.

use std::io::{Cursor, Write};

use flate2::Compression;
use flate2::write::GzEncoder;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

use gptscript_wheels::release::{PLATFORM_MATRIX, Platform, Release};
use gptscript_wheels::reporter::NullReporter;
use gptscript_wheels::stage::Stager;

fn tar_gz_with(name: &str, content: &[u8]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder.append_data(&mut header, name, content).unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

fn zip_with(name: &str, content: &[u8]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(name, SimpleFileOptions::default())
        .unwrap();
    writer.write_all(content).unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_stage_all_populates_every_matrix_leaf() {
    let mut server = mockito::Server::new_async().await;

    let mut release = Release::gptscript();
    release.base_url = server.url();

    let mut mocks = Vec::new();
    for (platform, archs) in PLATFORM_MATRIX {
        for arch in *archs {
            let body = match platform {
                Platform::Windows => {
                    zip_with(platform.binary_name(), format!("bin-{platform}-{arch}").as_bytes())
                }
                _ => tar_gz_with(
                    platform.binary_name(),
                    format!("bin-{platform}-{arch}").as_bytes(),
                ),
            };
            let path = format!(
                "/{}/{}",
                release.version,
                release.archive_name(*platform, *arch)
            );
            mocks.push(
                server
                    .mock("GET", path.as_str())
                    .with_status(200)
                    .with_body(body)
                    .create_async()
                    .await,
            );
        }
    }

    let temp_dir = TempDir::new().unwrap();
    let bin_root = temp_dir.path().join("bin");
    let client = reqwest::Client::new();
    let stager = Stager::new(&client, &release, &bin_root, &NullReporter);

    stager.stage_all().await.expect("staging failed");

    for mock in &mocks {
        mock.assert_async().await;
    }

    for (platform, archs) in PLATFORM_MATRIX {
        for arch in *archs {
            let leaf = bin_root.join(platform.as_str()).join(arch.as_str());
            let binary = leaf.join(platform.binary_name());
            assert!(
                binary.exists(),
                "missing staged binary at {}",
                binary.display()
            );
            assert_eq!(
                std::fs::read(&binary).unwrap(),
                format!("bin-{platform}-{arch}").as_bytes()
            );

            // The downloaded archive must be deleted after extraction.
            let archive = leaf.join(release.archive_name(*platform, *arch));
            assert!(!archive.exists(), "archive left behind: {}", archive.display());
        }
    }
}

#[tokio::test]
async fn test_stage_aborts_on_http_failure() {
    let mut server = mockito::Server::new_async().await;

    let mut release = Release::gptscript();
    release.base_url = server.url();

    // No mocks registered: every download 501s.
    let temp_dir = TempDir::new().unwrap();
    let bin_root = temp_dir.path().join("bin");
    let client = reqwest::Client::new();
    let stager = Stager::new(&client, &release, &bin_root, &NullReporter);

    let err = stager.stage_all().await.unwrap_err();
    assert!(err.to_string().contains("Failed to download"));

    // The tree is still created up front.
    assert!(bin_root.join("linux/amd64").is_dir());
}
