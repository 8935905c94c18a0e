use crate::CoreError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Advisory exclusive lock serializing writers of one profile.
///
/// The lock lives in a sibling `<profile>.lock` file and is released on drop.
pub struct ProfileLock {
    lock_file: File,
}

impl ProfileLock {
    /// Lock file guarding `profile_path`.
    pub fn lock_path(profile_path: &Path) -> PathBuf {
        let mut name = profile_path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".lock");
        profile_path.with_file_name(name)
    }

    pub fn acquire(profile_path: &Path) -> Result<Self, CoreError> {
        let file = open_lock_file(&Self::lock_path(profile_path))?;
        file.lock_exclusive()
            .map_err(|e| CoreError::Io(std::io::Error::new(std::io::ErrorKind::WouldBlock, e)))?;
        Ok(Self { lock_file: file })
    }

    pub fn try_acquire(profile_path: &Path) -> Result<Option<Self>, CoreError> {
        let file = open_lock_file(&Self::lock_path(profile_path))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { lock_file: file })),
            Err(_) => Ok(None),
        }
    }
}

impl Drop for ProfileLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

fn open_lock_file(lock_path: &Path) -> Result<File, CoreError> {
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(lock_path)?)
}
