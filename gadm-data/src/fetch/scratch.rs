//! Per-call scratch space: a unique work directory and the downloaded
//! archive inside it.

use std::env;

use camino::{Utf8Path, Utf8PathBuf};
use gadm_core::ArchiveUrl;
use log::{debug, warn};
use tempfile::{Builder, TempDir, TempPath};

use crate::archive::ArchiveExtractor;
use crate::error::FetchError;
use crate::source::ArchiveSource;

/// Unique directory removed, with everything in it, when dropped.
#[derive(Debug)]
pub(super) struct WorkDir {
    path: Utf8PathBuf,
    _dir: TempDir,
}

impl WorkDir {
    /// Create a fresh directory under `root`, or the system temp directory.
    pub(super) fn create(root: Option<&Utf8Path>) -> Result<Self, FetchError> {
        let mut builder = Builder::new();
        builder.prefix("gadm-");
        let created = match root {
            Some(root) => gadm_fs::ensure_dir(root).and_then(|()| builder.tempdir_in(root)),
            None => builder.tempdir(),
        };
        let dir = created.map_err(|source| FetchError::Scratch {
            path: root.map_or_else(env::temp_dir, |root| root.as_std_path().to_path_buf()),
            source,
        })?;
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|path| FetchError::NonUtf8Path { path })?;
        debug!("created work directory {path}");
        Ok(Self { path, _dir: dir })
    }

    pub(super) fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Download `url` into a temporary archive inside this directory and
    /// extract it here. The archive file is deleted before returning, on
    /// success and on failure.
    pub(super) fn unpack<S, X>(
        &self,
        source: &S,
        extractor: &X,
        url: &ArchiveUrl,
    ) -> Result<Vec<Utf8PathBuf>, FetchError>
    where
        S: ArchiveSource + ?Sized,
        X: ArchiveExtractor + ?Sized,
    {
        let archive = self.download(source, url)?;
        let archive_path = Utf8Path::from_path(&archive).ok_or_else(|| FetchError::NonUtf8Path {
            path: archive.to_path_buf(),
        })?;
        let extracted = extractor.extract(archive_path, &self.path);
        release(archive);
        let files = extracted?;
        debug!("unpacked {} files into {}", files.len(), self.path);
        Ok(files)
    }

    fn download<S>(&self, source: &S, url: &ArchiveUrl) -> Result<TempPath, FetchError>
    where
        S: ArchiveSource + ?Sized,
    {
        let mut file = Builder::new()
            .prefix("archive-")
            .suffix(".zip")
            .tempfile_in(&self.path)
            .map_err(|source| FetchError::Scratch {
                path: self.path.clone().into_std_path_buf(),
                source,
            })?;
        let bytes = source.download_archive(url, &mut file)?;
        debug!("downloaded {bytes} bytes from {url}");
        Ok(file.into_temp_path())
    }
}

fn release(archive: TempPath) {
    let shown = archive.display().to_string();
    if let Err(err) = archive.close() {
        warn!("failed to remove downloaded archive {shown}: {err}");
    }
}
