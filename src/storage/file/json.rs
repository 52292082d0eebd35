//! Locked JSON file helpers shared by the file backend.
//!
//! Every read takes a shared `flock`, every write an exclusive one. Locks are
//! also released when the file handle drops, so early returns cannot leak them.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StorageError, StorageResult};

fn lock_failed(err: &std::io::Error) -> StorageError {
    StorageError::LockFailed(err.to_string())
}

/// Read a JSON document, returning `None` when the file does not exist.
pub fn read_locked<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    file.lock_shared().map_err(|e| lock_failed(&e))?;
    let value: T = serde_json::from_reader(&file)?;
    file.unlock().map_err(|e| lock_failed(&e))?;

    Ok(Some(value))
}

/// Overwrite a JSON document.
pub fn write_locked<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    file.lock_exclusive().map_err(|e| lock_failed(&e))?;
    serde_json::to_writer_pretty(&file, value)?;
    file.sync_all()?;
    file.unlock().map_err(|e| lock_failed(&e))?;

    Ok(())
}

/// Write a JSON document that must not exist yet.
///
/// Returns `StorageError::Conflict` when the file is already there.
pub fn create_locked<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(StorageError::Conflict(format!(
                "{} already exists",
                path.display()
            )));
        }
        Err(e) => return Err(e.into()),
    };

    file.lock_exclusive().map_err(|e| lock_failed(&e))?;
    serde_json::to_writer_pretty(&file, value)?;
    file.sync_all()?;
    file.unlock().map_err(|e| lock_failed(&e))?;

    Ok(())
}

/// Read-modify-write a JSON document under one exclusive lock.
///
/// A missing or empty file starts from `T::default()`. When `update_fn` fails
/// the file is left untouched.
pub fn update_locked<T, R, F>(path: &Path, update_fn: F) -> StorageResult<R>
where
    T: Serialize + DeserializeOwned + Default,
    F: FnOnce(&mut T) -> StorageResult<R>,
{
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;

    file.lock_exclusive().map_err(|e| lock_failed(&e))?;

    let mut raw = String::new();
    file.read_to_string(&mut raw)?;
    let mut state: T = if raw.trim().is_empty() {
        T::default()
    } else {
        serde_json::from_str(&raw)?
    };

    let result = update_fn(&mut state)?;

    let json = serde_json::to_string_pretty(&state)?;
    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;

    file.unlock().map_err(|e| lock_failed(&e))?;

    Ok(result)
}

/// Sanitize a name for use as a filename.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_missing_is_none() {
        let temp = TempDir::new().unwrap();
        let value: Option<Vec<u64>> = read_locked(&temp.path().join("missing.json")).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_create_twice_conflicts() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("once.json");
        create_locked(&path, &1u64).unwrap();
        assert!(matches!(
            create_locked(&path, &2u64),
            Err(StorageError::Conflict(_))
        ));
        assert_eq!(read_locked::<u64>(&path).unwrap(), Some(1));
    }

    #[test]
    fn test_update_starts_from_default() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("list.json");

        update_locked(&path, |list: &mut Vec<u64>| {
            list.push(7);
            Ok(())
        })
        .unwrap();
        let len = update_locked(&path, |list: &mut Vec<u64>| {
            list.push(8);
            Ok(list.len())
        })
        .unwrap();

        assert_eq!(len, 2);
        assert_eq!(read_locked::<Vec<u64>>(&path).unwrap(), Some(vec![7, 8]));
    }

    #[test]
    fn test_failed_update_leaves_file_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("list.json");
        write_locked(&path, &vec![1u64]).unwrap();

        let result = update_locked(&path, |list: &mut Vec<u64>| -> StorageResult<()> {
            list.push(2);
            Err(StorageError::Conflict("nope".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(read_locked::<Vec<u64>>(&path).unwrap(), Some(vec![1]));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("simple"), "simple");
        assert_eq!(sanitize_name("with-dash"), "with-dash");
        assert_eq!(sanitize_name("with/slash"), "with_slash");
        assert_eq!(sanitize_name("with space"), "with_space");
    }
}
