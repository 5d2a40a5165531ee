//! Disk manager for page-level file I/O.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use vesper_common::page::{PageId, PAGE_SIZE};
use vesper_common::{Result, StorageConfig, VesperError};

/// Configuration for the disk manager.
#[derive(Debug, Clone)]
pub struct DiskManagerConfig {
    /// Base directory for data files.
    pub data_dir: PathBuf,
    /// Enable fsync after writes.
    pub fsync_enabled: bool,
}

impl Default for DiskManagerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            fsync_enabled: true,
        }
    }
}

impl From<&StorageConfig> for DiskManagerConfig {
    fn from(config: &StorageConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            fsync_enabled: config.fsync_enabled,
        }
    }
}

/// Manages reading and writing pages in named data files.
///
/// Files are attached by name (relation files carry the relation name,
/// index files are named `"{relation}.{offset}"`) and addressed afterwards
/// by the `file_id` handed out at attach time.
pub struct DiskManager {
    /// Configuration.
    config: DiskManagerConfig,
    /// Attached files and the name to file_id mapping.
    inner: Mutex<DiskFiles>,
}

#[derive(Default)]
struct DiskFiles {
    by_name: HashMap<String, u32>,
    handles: HashMap<u32, FileHandle>,
    next_file_id: u32,
}

/// Handle for an attached data file.
struct FileHandle {
    /// The open file.
    file: File,
    /// File name relative to the data directory.
    name: String,
    /// Number of pages in the file.
    num_pages: u32,
}

impl DiskManager {
    /// Creates a new disk manager, creating the data directory if needed.
    pub fn new(config: DiskManagerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        Ok(Self {
            config,
            inner: Mutex::new(DiskFiles::default()),
        })
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.config.data_dir.join(name)
    }

    /// Returns true if a file with this name exists on disk.
    pub fn exists(&self, name: &str) -> bool {
        self.file_path(name).exists()
    }

    /// Creates and attaches a new file.
    ///
    /// Fails with `FileExists` if the file is already present on disk.
    pub fn create_file(&self, name: &str) -> Result<u32> {
        let path = self.file_path(name);
        if path.exists() {
            return Err(VesperError::FileExists {
                path: name.to_string(),
            });
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)?;

        Ok(self.attach(name, file, 0))
    }

    /// Attaches an existing file.
    ///
    /// Fails with `FileNotFound` if the file is not present on disk.
    /// Attaching a name twice returns the original file_id.
    pub fn open_file(&self, name: &str) -> Result<u32> {
        if let Some(&file_id) = self.inner.lock().by_name.get(name) {
            return Ok(file_id);
        }

        let path = self.file_path(name);
        if !path.exists() {
            return Err(VesperError::FileNotFound {
                path: name.to_string(),
            });
        }

        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let num_pages = (file.metadata()?.len() / PAGE_SIZE as u64) as u32;

        Ok(self.attach(name, file, num_pages))
    }

    fn attach(&self, name: &str, file: File, num_pages: u32) -> u32 {
        let mut inner = self.inner.lock();
        let file_id = inner.next_file_id;
        inner.next_file_id += 1;
        inner.by_name.insert(name.to_string(), file_id);
        inner.handles.insert(
            file_id,
            FileHandle {
                file,
                name: name.to_string(),
                num_pages,
            },
        );
        file_id
    }

    fn with_handle<R>(&self, file_id: u32, f: impl FnOnce(&mut FileHandle) -> Result<R>) -> Result<R> {
        let mut inner = self.inner.lock();
        let handle = inner
            .handles
            .get_mut(&file_id)
            .ok_or_else(|| VesperError::Internal(format!("file {} not attached", file_id)))?;
        f(handle)
    }

    /// Reads a page from disk.
    pub fn read_page(&self, page_id: PageId) -> Result<[u8; PAGE_SIZE]> {
        self.with_handle(page_id.file_id, |handle| {
            if page_id.page_num >= handle.num_pages {
                return Err(VesperError::PageNotFound { page_id });
            }

            let offset = (page_id.page_num as u64) * (PAGE_SIZE as u64);
            handle.file.seek(SeekFrom::Start(offset))?;

            let mut buffer = [0u8; PAGE_SIZE];
            handle.file.read_exact(&mut buffer)?;
            Ok(buffer)
        })
    }

    /// Writes a page to disk.
    pub fn write_page(&self, page_id: PageId, data: &[u8; PAGE_SIZE]) -> Result<()> {
        let fsync = self.config.fsync_enabled;
        self.with_handle(page_id.file_id, |handle| {
            let offset = (page_id.page_num as u64) * (PAGE_SIZE as u64);
            handle.file.seek(SeekFrom::Start(offset))?;
            handle.file.write_all(data)?;

            if fsync {
                handle.file.sync_all()?;
            }

            if page_id.page_num >= handle.num_pages {
                handle.num_pages = page_id.page_num + 1;
            }
            Ok(())
        })
    }

    /// Allocates a new zeroed page at the end of the file.
    pub fn allocate_page(&self, file_id: u32) -> Result<PageId> {
        let fsync = self.config.fsync_enabled;
        self.with_handle(file_id, |handle| {
            let page_num = handle.num_pages;
            let offset = (page_num as u64) * (PAGE_SIZE as u64);
            handle.file.seek(SeekFrom::Start(offset))?;
            handle.file.write_all(&[0u8; PAGE_SIZE])?;

            if fsync {
                handle.file.sync_all()?;
            }

            handle.num_pages = page_num + 1;
            Ok(PageId::new(file_id, page_num))
        })
    }

    /// Returns the number of pages in a file.
    pub fn num_pages(&self, file_id: u32) -> Result<u32> {
        self.with_handle(file_id, |handle| Ok(handle.num_pages))
    }

    /// Flushes a file's pending writes to disk.
    pub fn sync_file(&self, file_id: u32) -> Result<()> {
        self.with_handle(file_id, |handle| {
            handle.file.sync_all()?;
            Ok(())
        })
    }

    /// Detaches a file, syncing it first.
    pub fn close_file(&self, file_id: u32) -> Result<()> {
        let mut inner = self.inner.lock();
        if let Some(handle) = inner.handles.remove(&file_id) {
            handle.file.sync_all()?;
            inner.by_name.remove(&handle.name);
        }
        Ok(())
    }

    /// Deletes a file from disk, detaching it if attached.
    pub fn remove_file(&self, name: &str) -> Result<()> {
        let file_id = self.inner.lock().by_name.get(name).copied();
        if let Some(file_id) = file_id {
            self.close_file(file_id)?;
        }

        let path = self.file_path(name);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl Drop for DiskManager {
    fn drop(&mut self) {
        let inner = self.inner.lock();
        for handle in inner.handles.values() {
            let _ = handle.file.sync_all();
        }
    }
}
