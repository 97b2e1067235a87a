use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::{Counter, CounterStore, Error, Result};

/// A counter persisted in a single flat file.
///
/// The whole state lives in one ASCII string `"<0|1>:<value>"` — claim flag,
/// colon, decimal value. Every read-modify-write runs under the OS exclusive
/// advisory lock on that file, so the flag flip during acquisition and the
/// value write during commit are each atomic against other processes on the
/// same filesystem.
///
/// Opening a path that does not exist creates the file with initial state
/// `"0:0"`.
pub struct FileStore {
    path: PathBuf,
}

/// A [`Counter`] over a [`FileStore`].
pub type FileCounter = Counter<FileStore>;

impl FileCounter {
    /// Opens (creating if absent) the counter file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Counter::new(FileStore::open(path)?))
    }
}

impl FileStore {
    /// Opens the store at `path`, creating the file with state `"0:0"` when
    /// it does not exist.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for an empty path, [`Error::Io`] when the
    /// file cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(Error::InvalidArgument {
                reason: "empty counter file path".into(),
            });
        }
        let store = Self { path };
        if !store.path.exists() {
            store.rewrite(false, 0)?;
        }
        Ok(store)
    }

    /// The path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens the backing file and takes the exclusive advisory lock. The
    /// lock is released when the returned handle drops.
    fn open_locked(&self) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        file.lock()?;
        Ok(file)
    }

    fn read_state(file: &mut File) -> Result<(bool, u64)> {
        let mut raw = String::new();
        file.read_to_string(&mut raw)?;
        parse_state(raw.trim_end())
    }

    fn write_state(file: &mut File, held: bool, value: u64) -> Result<()> {
        file.seek(SeekFrom::Start(0))?;
        file.set_len(0)?;
        write!(file, "{}:{}", u8::from(held), value)?;
        Ok(())
    }

    fn rewrite(&self, held: bool, value: u64) -> Result<()> {
        let mut file = self.open_locked()?;
        Self::write_state(&mut file, held, value)
    }
}

fn parse_state(raw: &str) -> Result<(bool, u64)> {
    let malformed = || Error::Inconsistent {
        context: format!("malformed counter file state {raw:?}"),
    };
    let (flag, value) = raw.split_once(':').ok_or_else(malformed)?;
    let held = match flag {
        "0" => false,
        "1" => true,
        _ => return Err(malformed()),
    };
    let value = value.parse::<u64>().map_err(|_| malformed())?;
    Ok((held, value))
}

impl CounterStore for FileStore {
    fn try_acquire(&mut self) -> Result<Option<u64>> {
        let mut file = self.open_locked()?;
        let (held, value) = Self::read_state(&mut file)?;
        if held {
            return Ok(None);
        }
        Self::write_state(&mut file, true, value)?;
        Ok(Some(value))
    }

    fn persist(&mut self, held: bool, value: u64) -> Result<()> {
        self.rewrite(held, value)
    }

    fn release(&mut self) -> Result<()> {
        let mut file = self.open_locked()?;
        let (_, value) = Self::read_state(&mut file)?;
        Self::write_state(&mut file, false, value)
    }
}
