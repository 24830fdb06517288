//! Platform-specific implementations of OS capability traits.
//!
//! - [`StdFilesystem`]: real std::fs operations
//! - [`SystemMenuHost`]: opens links with the OS handler, clears partitions on disk
//! - [`HeadlessMenuHost`]: no windows, no prompts; everything is UNSUPPORTED

use crate::menu::WindowMessage;
use crate::traits::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ===========================================================================
// Filesystem – wraps std::fs
// ===========================================================================

pub struct StdFilesystem;

impl FilesystemOps for StdFilesystem {
    fn read_file(&self, path: &Path) -> CapResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CapError::PermissionDenied(format!("cannot read {}: {}", path.display(), e))
            }
            _ => CapError::Io(e),
        })
    }

    fn write_file(&self, path: &Path, data: &[u8]) -> CapResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, data).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CapError::PermissionDenied(format!("cannot write {}: {}", path.display(), e))
            }
            _ => CapError::Io(e),
        })
    }

    fn rename(&self, from: &Path, to: &Path) -> CapResult<()> {
        std::fs::rename(from, to).map_err(CapError::Io)
    }

    fn remove_dir_all(&self, path: &Path) -> CapResult<()> {
        std::fs::remove_dir_all(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::PermissionDenied => {
                CapError::PermissionDenied(format!("cannot remove {}: {}", path.display(), e))
            }
            _ => CapError::Io(e),
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

// ===========================================================================
// Menu host – system implementation
// ===========================================================================

/// Menu host for a desktop session without an attached window runtime.
///
/// Links open through `open` / `xdg-open` / `cmd start`. Session partitions
/// live as directories under `partitions_root` (`persist:<id>` → `<root>/<id>`).
pub struct SystemMenuHost {
    fs: Arc<dyn FilesystemOps>,
    pub partitions_root: PathBuf,
    /// Answer for [`MenuHost::confirm`] when nobody can be asked.
    pub assume_yes: bool,
}

impl SystemMenuHost {
    pub fn new(fs: Arc<dyn FilesystemOps>, partitions_root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            partitions_root: partitions_root.into(),
            assume_yes: false,
        }
    }

    fn partition_dir(&self, partition: &str) -> PathBuf {
        let name = partition.strip_prefix("persist:").unwrap_or(partition);
        self.partitions_root.join(name)
    }
}

impl MenuHost for SystemMenuHost {
    fn send_to_window(&self, message: &WindowMessage) -> CapResult<()> {
        tracing::debug!(channel = message.channel(), "window message dropped");
        Err(no_window())
    }

    fn toggle_full_screen(&self) -> CapResult<()> {
        Err(no_window())
    }

    fn reload_container(&self) -> CapResult<()> {
        Err(no_window())
    }

    fn toggle_container_dev_tools(&self) -> CapResult<()> {
        Err(no_window())
    }

    fn open_external(&self, url: &str) -> CapResult<()> {
        #[cfg(target_os = "macos")]
        {
            run_opener("open", &[url])
        }
        #[cfg(target_os = "linux")]
        {
            run_opener("xdg-open", &[url])
        }
        #[cfg(target_os = "windows")]
        {
            run_opener("cmd", &["/C", "start", "", url])
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            let _ = url;
            Err(CapError::Unsupported(
                "opening links not implemented for this OS".into(),
            ))
        }
    }

    fn confirm(&self, title: &str, _message: &str) -> bool {
        tracing::debug!(title, answer = self.assume_yes, "non-interactive confirmation");
        self.assume_yes
    }

    fn clear_storage_data(&self, partition: &str) -> CapResult<()> {
        let dir = self.partition_dir(partition);
        if !self.fs.exists(&dir) {
            return Ok(());
        }
        self.fs.remove_dir_all(&dir)
    }

    fn quit(&self) -> CapResult<()> {
        Err(no_window())
    }
}

fn no_window() -> CapError {
    CapError::Unsupported("no app window attached".into())
}

#[allow(dead_code)]
fn run_opener(cmd: &str, args: &[&str]) -> CapResult<()> {
    let status = std::process::Command::new(cmd)
        .args(args)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CapError::DependencyMissing(format!("{} not found", cmd))
            } else {
                CapError::Io(e)
            }
        })?;
    if !status.success() {
        return Err(CapError::Other(format!("{} exited with {}", cmd, status)));
    }
    Ok(())
}

// ===========================================================================
// Headless menu host – returns UNSUPPORTED cleanly
// ===========================================================================

/// Menu host for headless environments. Never panics, never prompts.
pub struct HeadlessMenuHost;

impl MenuHost for HeadlessMenuHost {
    fn send_to_window(&self, _message: &WindowMessage) -> CapResult<()> {
        Err(headless())
    }
    fn toggle_full_screen(&self) -> CapResult<()> {
        Err(headless())
    }
    fn reload_container(&self) -> CapResult<()> {
        Err(headless())
    }
    fn toggle_container_dev_tools(&self) -> CapResult<()> {
        Err(headless())
    }
    fn open_external(&self, _url: &str) -> CapResult<()> {
        Err(headless())
    }
    fn confirm(&self, _title: &str, _message: &str) -> bool {
        false
    }
    fn clear_storage_data(&self, _partition: &str) -> CapResult<()> {
        Err(headless())
    }
    fn quit(&self) -> CapResult<()> {
        Err(headless())
    }
}

fn headless() -> CapError {
    CapError::Unsupported("unavailable in headless environment".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_round_trip_creates_parents() {
        let dir = std::env::temp_dir().join(format!("webwrap_fs_{}", uuid::Uuid::new_v4()));
        let file = dir.join("nested").join("data.json");
        StdFilesystem.write_file(&file, b"[]").unwrap();
        assert!(StdFilesystem.exists(&file));
        assert_eq!(StdFilesystem.read_file(&file).unwrap(), b"[]");
        StdFilesystem.remove_dir_all(&dir).unwrap();
        assert!(!StdFilesystem.exists(&dir));
    }

    #[test]
    fn test_fs_rename_replaces_target() {
        let dir = std::env::temp_dir().join(format!("webwrap_fs_{}", uuid::Uuid::new_v4()));
        let (tmp, file) = (dir.join("t.tmp"), dir.join("t.json"));
        StdFilesystem.write_file(&file, b"old").unwrap();
        StdFilesystem.write_file(&tmp, b"new").unwrap();

        StdFilesystem.rename(&tmp, &file).unwrap();
        assert_eq!(StdFilesystem.read_file(&file).unwrap(), b"new");
        assert!(!StdFilesystem.exists(&tmp));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_clear_storage_removes_partition_dir() {
        let root = std::env::temp_dir().join(format!("webwrap_parts_{}", uuid::Uuid::new_v4()));
        let part = root.join("my-app");
        std::fs::create_dir_all(part.join("Local Storage")).unwrap();

        let host = SystemMenuHost::new(Arc::new(StdFilesystem), &root);
        host.clear_storage_data("persist:my-app").unwrap();
        assert!(!part.exists());
        // Clearing an absent partition is fine.
        host.clear_storage_data("persist:my-app").unwrap();

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_headless_host_declines() {
        let host = HeadlessMenuHost;
        assert!(!host.confirm("t", "m"));
        assert!(matches!(host.quit(), Err(CapError::Unsupported(_))));
        assert!(matches!(
            host.send_to_window(&WindowMessage::Reload),
            Err(CapError::Unsupported(_))
        ));
    }

    #[test]
    fn test_system_host_without_window_declines_messages() {
        let host = SystemMenuHost::new(Arc::new(StdFilesystem), std::env::temp_dir());
        assert!(matches!(
            host.send_to_window(&WindowMessage::ChangeZoom(1.1)),
            Err(CapError::Unsupported(_))
        ));
    }
}
