//! ZIP extraction that keeps every entry inside the destination directory.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use zip::ZipArchive;

use super::{ArchiveError, ArchiveExtractor};

/// Extracts ZIP archives, skipping entries whose names would escape the
/// destination directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(
        &self,
        archive: &Utf8Path,
        destination: &Utf8Path,
    ) -> Result<Vec<Utf8PathBuf>, ArchiveError> {
        let file = gadm_fs::open_utf8_file(archive).map_err(|source| ArchiveError::Open {
            source,
            path: archive.to_path_buf(),
        })?;
        let mut zip = ZipArchive::new(file).map_err(|source| ArchiveError::Read {
            source,
            path: archive.to_path_buf(),
        })?;

        let mut extracted = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let mut entry = zip.by_index(index).map_err(|source| ArchiveError::Read {
                source,
                path: archive.to_path_buf(),
            })?;
            let Some(relative) = entry
                .enclosed_name()
                .and_then(|name| Utf8PathBuf::from_path_buf(name).ok())
            else {
                warn!("skipping unsafe archive entry {:?}", entry.name());
                continue;
            };
            let target = destination.join(relative);
            if entry.is_dir() {
                gadm_fs::ensure_dir(&target).map_err(|source| ArchiveError::Write {
                    source,
                    path: target.clone(),
                })?;
                continue;
            }
            let mut output =
                gadm_fs::create_utf8_file(&target).map_err(|source| ArchiveError::Write {
                    source,
                    path: target.clone(),
                })?;
            io::copy(&mut entry, &mut output).map_err(|source| ArchiveError::Write {
                source,
                path: target.clone(),
            })?;
            extracted.push(target);
        }
        debug!("extracted {} files from {archive}", extracted.len());
        Ok(extracted)
    }
}
