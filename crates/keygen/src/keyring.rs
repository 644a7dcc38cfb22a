//! Throwaway GnuPG home directories.

use std::io;
use std::path::Path;
use std::process::Stdio;

use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, warn};

/// A private GnuPG home directory owned by one generation call.
///
/// On Unix the directory is created with mode `0700`, which gpg requires
/// before it will use a home directory without warnings. [`Self::close`]
/// stops the agent gpg started for it and deletes it; if `close` is never
/// reached (panic, cancelled future) the [`TempDir`] guard still deletes it on
/// drop.
pub struct EphemeralKeyring {
    dir: TempDir,
}

impl EphemeralKeyring {
    /// Creates a new keyring directory under `parent`, or the system temp dir.
    pub fn create(parent: Option<&Path>) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("gpg-keyring-");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o700));
        }
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        debug!(path = %dir.path().display(), "created ephemeral keyring");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Stops the keyring's gpg-agent (best effort) and removes the directory.
    pub async fn close(self, gpgconf: &str) {
        let path = self.dir.path().to_path_buf();

        match Command::new(gpgconf)
            .arg("--homedir")
            .arg(&path)
            .args(["--kill", "gpg-agent"])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) if status.success() => debug!(path = %path.display(), "stopped gpg-agent"),
            Ok(status) => debug!(path = %path.display(), %status, "gpgconf did not stop an agent"),
            Err(e) => debug!(path = %path.display(), error = %e, "gpgconf unavailable"),
        }

        if let Err(e) = self.dir.close() {
            warn!(path = %path.display(), error = %e, "failed to remove ephemeral keyring");
        } else {
            debug!(path = %path.display(), "removed ephemeral keyring");
        }
    }
}
