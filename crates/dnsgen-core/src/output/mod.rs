// # Output Writer
//
// Atomic, content-diffed replacement of the rendered output file.
//
// ## Guarantees
//
// - Atomic writes: content goes to a temporary file first, then a single
//   rename makes it visible. Observers see the old file or the new one,
//   never a partial write.
// - Idempotent: identical content leaves the destination untouched (no
//   rename, no mtime change), so anything watching the output only sees
//   real changes.
// - Mode and ownership of an existing destination carry over to the
//   replacement.
// - The temporary file is removed on every failure path and whenever it is
//   not renamed into place.
//
// ## Scratch Directory
//
// The temporary file lives next to the destination by default, so the
// final rename never crosses a filesystem boundary.

use std::fs::{self, Metadata};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tempfile::NamedTempFile;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::WriteError;

/// Prefix for temporary files created in the scratch directory
const TEMP_PREFIX: &str = ".dnsgen-";

/// What a write did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No destination configured; content went to stdout
    Stdout,
    /// Destination already held identical content; nothing was touched
    Unchanged,
    /// Destination was (re)created
    Replaced {
        /// Time taken to write and swap the file
        elapsed: Duration,
    },
}

/// Writes rendered output to its destination
///
/// # Example
///
/// ```rust,no_run
/// use dnsgen_core::output::OutputWriter;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let writer = OutputWriter::new(Some("/etc/haproxy/backends.cfg".into()));
///
///     // Replaced atomically, or skipped if the content is identical
///     writer.write(b"server a 10.0.0.1:80\n").await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct OutputWriter {
    destination: Option<PathBuf>,
    scratch_dir: Option<PathBuf>,
}

impl OutputWriter {
    /// Create a writer for the given destination (stdout when `None`)
    pub fn new(destination: Option<PathBuf>) -> Self {
        Self {
            destination,
            scratch_dir: None,
        }
    }

    /// Override the directory used for temporary files
    ///
    /// Must be on the same filesystem as the destination.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// The configured destination, if any
    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    /// Write content to the destination
    ///
    /// # Returns
    ///
    /// - `Ok(WriteOutcome)`: What happened to the destination
    /// - `Err(WriteError)`: The stage that failed; the destination is untouched
    ///
    /// Writing to stdout always succeeds; a failed stdout write is logged.
    pub async fn write(&self, content: &[u8]) -> Result<WriteOutcome, WriteError> {
        let Some(destination) = self.destination.clone() else {
            return Ok(write_stream(&mut tokio::io::stdout(), content).await);
        };

        let scratch_dir = self.scratch_dir_for(&destination);
        let content = content.to_vec();

        let outcome = tokio::task::spawn_blocking(move || {
            replace_file(&destination, &scratch_dir, &content, |tmp, content| {
                tmp.write_all(content)
            })
        })
        .await
        .map_err(|e| WriteError::WriteTemp(io::Error::other(e)))??;

        if let (WriteOutcome::Replaced { elapsed }, Some(destination)) =
            (outcome, self.destination())
        {
            tracing::info!(
                "output file [{}] created in {:?}",
                destination.display(),
                elapsed
            );
        }

        Ok(outcome)
    }

    fn scratch_dir_for(&self, destination: &Path) -> PathBuf {
        if let Some(dir) = &self.scratch_dir {
            return dir.clone();
        }
        match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

/// Write content to a stream such as stdout
async fn write_stream<W>(sink: &mut W, content: &[u8]) -> WriteOutcome
where
    W: AsyncWrite + Unpin,
{
    let result = match sink.write_all(content).await {
        Ok(()) => sink.flush().await,
        Err(e) => Err(e),
    };
    if let Err(e) = result {
        tracing::error!("{}", WriteError::Stdout(e));
    }
    WriteOutcome::Stdout
}

/// Replace `destination` with `content`, written into the temp file by `fill`
///
/// `fill` is the only step that touches the temp file's bytes; it is split
/// out so a failing writer can be injected.
pub(crate) fn replace_file<F>(
    destination: &Path,
    scratch_dir: &Path,
    content: &[u8],
    fill: F,
) -> Result<WriteOutcome, WriteError>
where
    F: FnOnce(&mut NamedTempFile, &[u8]) -> io::Result<()>,
{
    let start = Instant::now();

    // Dropped (and unlinked) on every early return below
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(scratch_dir)
        .map_err(WriteError::CreateTemp)?;

    fill(&mut tmp, content).map_err(WriteError::WriteTemp)?;
    tmp.flush().map_err(WriteError::WriteTemp)?;
    tmp.as_file().sync_all().map_err(WriteError::WriteTemp)?;

    let old_content = match fs::metadata(destination) {
        Ok(meta) => {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(WriteError::Permissions)?;
            copy_ownership(tmp.as_file(), &meta).map_err(WriteError::Ownership)?;
            Some(fs::read(destination).map_err(WriteError::ReadExisting)?)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(WriteError::Stat(e)),
    };

    if old_content.as_deref() == Some(content) {
        return Ok(WriteOutcome::Unchanged);
    }

    tmp.persist(destination)
        .map_err(|e| WriteError::Rename(e.error))?;

    Ok(WriteOutcome::Replaced {
        elapsed: start.elapsed(),
    })
}

#[cfg(unix)]
fn copy_ownership(file: &fs::File, meta: &Metadata) -> io::Result<()> {
    use std::os::unix::fs::MetadataExt;
    std::os::unix::fs::fchown(file, Some(meta.uid()), Some(meta.gid()))
}

#[cfg(not(unix))]
fn copy_ownership(_file: &fs::File, _meta: &Metadata) -> io::Result<()> {
    Ok(())
}
