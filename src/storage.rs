use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use stopwatch_core::{KeyValueStore, StoreError};

const DICT_NAME: &str = "stopwatch";

/// Key-value store on disk: one file per key inside a dictionary directory.
pub struct FileStore {
    dict: Option<PathBuf>,
}

impl FileStore {
    pub fn open(base: &Path) -> Self {
        let dict = base.join(DICT_NAME);
        match fs::create_dir_all(&dict) {
            Ok(()) => Self { dict: Some(dict) },
            Err(e) => {
                log::warn!("Storage disabled, can't create {}: {}", dict.display(), e);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self { dict: None }
    }

    fn key_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        let dict = self.dict.as_ref().ok_or(StoreError::Unavailable)?;
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '_' })
            .collect();
        Ok(dict.join(name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.key_path(key)?;
        match fs::read_to_string(path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.key_path(key)?;
        // write-then-rename; the old value stays intact until the new one is complete
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if let Err(e) = replace_file(&tmp, &path, value) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

fn replace_file(tmp: &Path, path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()?;
    fs::rename(tmp, path)
}
