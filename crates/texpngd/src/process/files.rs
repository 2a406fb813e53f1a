//! PID files shared by the startup lock and the process record.

use std::io::{self, Write};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

const STAGING_PREFIX: &str = ".texpngd-";

/// Renders `pid` as a one-line PID file body.
pub(super) fn pid_line(pid: u32) -> Vec<u8> {
    format!("{pid}\n").into_bytes()
}

/// Replaces the PID file at `path` so it names `pid`.
///
/// The body is staged in a hidden sibling, synced, then renamed over the
/// target; a concurrent `texpngd stop` sees either the old PID or the new one.
pub(super) fn write_pid_file(path: &Path, pid: u32) -> io::Result<()> {
    let mut staged = stage_beside(path)?;
    staged.write_all(&pid_line(pid))?;
    staged.as_file().sync_all()?;
    staged.persist(path).map_err(|error| error.error)?;
    Ok(())
}

fn stage_beside(path: &Path) -> io::Result<NamedTempFile> {
    let Some(directory) = path.parent() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("PID file {} has no parent directory", path.display()),
        ));
    };
    let mut builder = Builder::new();
    builder.prefix(STAGING_PREFIX).suffix(".pid");
    #[cfg(unix)]
    {
        use std::fs::Permissions;
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(Permissions::from_mode(0o600));
    }
    builder.tempfile_in(directory)
}
