//! Download-and-unpack of the raw data directory.
//!
//! The data directory doubles as a download cache: when it exists nothing
//! is fetched, regardless of age or content. When it does not, the archive
//! is unpacked into a hidden sibling staging directory which is renamed
//! into place only after extraction succeeded, so `dest` is either absent
//! or complete.
//!
//! There is no locking. Two processes fetching into the same `dest` at the
//! same time race on the staging directory; callers must not do that.

use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::DataError;

/// Where the zipped data set comes from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveSource {
    /// HTTP(S) URL, fetched with a blocking request.
    Remote(String),
    /// A zip file already on disk.
    Local(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// `dest` existed; nothing was done.
    AlreadyPresent,
    /// The archive was unpacked into `dest`.
    Extracted { entries: usize },
}

/// Make sure `dest` exists, fetching and unpacking `source` if it does not.
pub fn ensure_dataset(source: &ArchiveSource, dest: &Path) -> Result<FetchOutcome, DataError> {
    if dest.exists() {
        log::info!("{} already present, skipping fetch", dest.display());
        return Ok(FetchOutcome::AlreadyPresent);
    }

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| DataError::unavailable(&parent, e))?;

    let staging = sibling(dest, "partial");
    let download = sibling(dest, "download.zip");
    remove_if_present(&staging);
    remove_if_present(&download);

    let result = unpack_into_place(source, &download, &staging, dest);

    if matches!(source, ArchiveSource::Remote(_)) {
        remove_if_present(&download);
    }
    if result.is_err() {
        remove_if_present(&staging);
    }

    let entries = result?;
    log::info!("Unpacked {entries} archive entries into {}", dest.display());
    Ok(FetchOutcome::Extracted { entries })
}

fn unpack_into_place(
    source: &ArchiveSource,
    download: &Path,
    staging: &Path,
    dest: &Path,
) -> Result<usize, DataError> {
    let archive_path = match source {
        ArchiveSource::Local(path) => path.clone(),
        ArchiveSource::Remote(url) => {
            fetch_to_file(url, download)?;
            download.to_path_buf()
        }
    };

    let entries = extract_zip(&archive_path, staging)?;
    fs::rename(staging, dest).map_err(|e| DataError::unavailable(dest, e))?;
    Ok(entries)
}

fn fetch_to_file(url: &str, target: &Path) -> Result<(), DataError> {
    log::info!("Downloading {url}");
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| DataError::unavailable(target, format!("fetching {url}: {e}")))?;

    let file = File::create(target).map_err(|e| DataError::unavailable(target, e))?;
    let mut writer = BufWriter::new(file);
    let bytes = response
        .copy_to(&mut writer)
        .map_err(|e| DataError::unavailable(target, format!("fetching {url}: {e}")))?;
    io::Write::flush(&mut writer).map_err(|e| DataError::unavailable(target, e))?;

    log::info!("Downloaded {bytes} bytes to {}", target.display());
    Ok(())
}

/// Unpack every entry of a zip archive below `into`. Returns the entry count.
pub fn extract_zip(archive_path: &Path, into: &Path) -> Result<usize, DataError> {
    let file = File::open(archive_path).map_err(|e| DataError::unavailable(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| DataError::unavailable(archive_path, format!("reading zip: {e}")))?;

    fs::create_dir_all(into).map_err(|e| DataError::unavailable(into, e))?;
    archive
        .extract(into)
        .map_err(|e| DataError::unavailable(archive_path, format!("extracting zip: {e}")))?;
    Ok(archive.len())
}

fn sibling(dest: &Path, suffix: &str) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "data".to_string());
    dest.with_file_name(format!(".{name}.{suffix}"))
}

fn remove_if_present(path: &Path) {
    let outcome = if path.is_dir() {
        fs::remove_dir_all(path)
    } else if path.exists() {
        fs::remove_file(path)
    } else {
        return;
    };
    if let Err(e) = outcome {
        log::warn!("Could not remove {}: {e}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("wildfire-aq-fetch-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        for (name, body) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn existing_destination_is_left_alone() {
        let dir = scratch_dir("existing");
        let dest = dir.join("Data");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("marker.txt"), "keep").unwrap();

        // the source does not even exist: existence of dest is the only check
        let source = ArchiveSource::Local(dir.join("missing.zip"));
        assert_eq!(ensure_dataset(&source, &dest).unwrap(), FetchOutcome::AlreadyPresent);
        assert_eq!(fs::read_to_string(dest.join("marker.txt")).unwrap(), "keep");
    }

    #[test]
    fn local_archive_is_unpacked_into_place() {
        let dir = scratch_dir("unpack");
        let archive = dir.join("data.zip");
        write_zip(
            &archive,
            &[
                ("EPA/CO/combined_co_data.csv", "Date,County\n"),
                ("NASA wildfires/modis.csv", "acq_date,latitude,longitude\n"),
            ],
        );
        let dest = dir.join("Data");

        let outcome = ensure_dataset(&ArchiveSource::Local(archive.clone()), &dest).unwrap();
        assert_eq!(outcome, FetchOutcome::Extracted { entries: 2 });
        assert!(dest.join("EPA/CO/combined_co_data.csv").is_file());
        assert!(!sibling(&dest, "partial").exists());

        // second call is a no-op
        assert_eq!(
            ensure_dataset(&ArchiveSource::Local(archive), &dest).unwrap(),
            FetchOutcome::AlreadyPresent
        );
    }

    #[test]
    fn corrupt_archive_leaves_no_destination() {
        let dir = scratch_dir("corrupt");
        let archive = dir.join("data.zip");
        fs::write(&archive, "this is not a zip file").unwrap();
        let dest = dir.join("Data");

        let err = ensure_dataset(&ArchiveSource::Local(archive), &dest).unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
        assert!(!dest.exists());
        assert!(!sibling(&dest, "partial").exists());
    }

    #[test]
    fn unreachable_remote_is_unavailable() {
        let dir = scratch_dir("remote");
        let dest = dir.join("Data");
        let source = ArchiveSource::Remote("http://127.0.0.1:9/data.zip".to_string());

        let err = ensure_dataset(&source, &dest).unwrap_err();
        assert!(matches!(err, DataError::DataUnavailable { .. }));
        assert!(!dest.exists());
        assert!(!sibling(&dest, "download.zip").exists());
    }
}
