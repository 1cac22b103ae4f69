use std::{
    future::Future,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, info};

use crate::engine::day::DayBook;

use super::entities::Settings;

pub const DAYS_FILE: &str = "data.json";
pub const SETTINGS_FILE: &str = "config.json";

/// Interface for loading and saving whole snapshots of the application state.
pub trait Store {
    fn load_days(&self) -> impl Future<Output = Result<DayBook>>;

    fn save_days(&self, book: &DayBook) -> impl Future<Output = Result<()>>;

    fn load_settings(&self) -> impl Future<Output = Result<Settings>>;

    fn save_settings(&self, settings: &Settings) -> impl Future<Output = Result<()>>;
}

/// The main realization of [Store], keeping each snapshot in a pretty printed JSON file.
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&dir)?;

        Ok(Self { dir })
    }

    pub fn days_path(&self) -> PathBuf {
        self.dir.join(DAYS_FILE)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }
}

impl Store for JsonStore {
    async fn load_days(&self) -> Result<DayBook> {
        read_json(&self.days_path()).await
    }

    async fn save_days(&self, book: &DayBook) -> Result<()> {
        write_json(&self.days_path(), book).await?;
        info!("Saved {} day records", book.len());
        Ok(())
    }

    async fn load_settings(&self) -> Result<Settings> {
        read_json(&self.settings_path()).await
    }

    async fn save_settings(&self, settings: &Settings) -> Result<()> {
        write_json(&self.settings_path(), settings).await?;
        info!("Saved settings");
        Ok(())
    }
}

/// Missing and empty files are treated as a fresh start.
async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    async fn read(path: &Path) -> std::result::Result<String, std::io::Error> {
        debug!("Reading {path:?}");
        let mut file = File::open(path).await?;
        file.lock_shared()?;
        let mut contents = String::new();
        let result = file.read_to_string(&mut contents).await;
        file.unlock_async().await?;
        result?;
        Ok(contents)
    }

    match read(path).await {
        Ok(contents) if contents.trim().is_empty() => Ok(T::default()),
        Ok(contents) => {
            serde_json::from_str(&contents).with_context(|| format!("Failed to parse {path:?}"))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{path:?} doesn't exist yet");
            Ok(T::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {path:?}")),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let buffer = serde_json::to_vec_pretty(value)?;

    let mut file = File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await
        .with_context(|| format!("Failed to open {path:?}"))?;

    // Truncate only while holding the lock.
    file.lock_exclusive()?;
    let result = write_locked(&mut file, &buffer).await;
    file.unlock_async().await?;
    result.with_context(|| format!("Failed to write {path:?}"))
}

async fn write_locked(file: &mut File, buffer: &[u8]) -> Result<(), std::io::Error> {
    file.set_len(0).await?;
    file.write_all(buffer).await?;
    file.flush().await?;
    file.sync_all().await
}
