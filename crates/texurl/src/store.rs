//! Idempotent download into the dump directory
//!
//! A file that already exists under the derived name is reused without any
//! request. New files are opened with create-new semantics so an existing
//! file is never overwritten, even if another process wrote it between the
//! existence check and the write.

use crate::error::FetchError;
use crate::source::ResourceSource;
use crate::types::DownloadRecord;
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Fetch `url` into `dest_dir/basename` unless it is already there
///
/// `dest_dir` must exist; the rewriter creates it before the first call.
pub async fn fetch_and_store(
    source: &dyn ResourceSource,
    url: &str,
    dest_dir: &Path,
    basename: &str,
) -> Result<DownloadRecord, FetchError> {
    let target = dest_dir.join(basename);

    if tokio::fs::metadata(&target)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
    {
        debug!(url, path = %target.display(), "Reusing existing download");
        return Ok(DownloadRecord {
            url: url.to_string(),
            local_path: target,
            from_cache: true,
        });
    }

    let body = source.download(url).await?;

    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            debug!(url, path = %target.display(), "File appeared concurrently, reusing it");
            return Ok(DownloadRecord {
                url: url.to_string(),
                local_path: target,
                from_cache: true,
            });
        }
        Err(err) => {
            return Err(FetchError::Write {
                path: target,
                source: err,
            })
        }
    };

    let written = async {
        file.write_all(&body).await?;
        file.flush().await
    }
    .await;

    if let Err(err) = written {
        drop(file);
        let _ = tokio::fs::remove_file(&target).await;
        return Err(FetchError::Write {
            path: target,
            source: err,
        });
    }

    info!(url, path = %target.display(), bytes = body.len(), "Downloaded");
    Ok(DownloadRecord {
        url: url.to_string(),
        local_path: target,
        from_cache: false,
    })
}
