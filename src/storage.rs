//! Storage logger — medium mount lifecycle and append-only record
//! writes.
//!
//! The logger owns the mounted flag and the (at most one) open file
//! handle; the medium itself sits behind [`StoragePort`]. Writes favour
//! durability over throughput: unless a phase holds the file open, each
//! append opens the data file, writes one line, and closes it again —
//! a pulled card between samples loses nothing. Samples arrive at
//! multi-second intervals, so the extra open/close cost is irrelevant.

use log::{debug, info};

use crate::app::ports::{FileId, StoragePort};
use crate::error::{Error, Result};
use crate::record::MeasurementSample;

/// Mount lifecycle and record appends for the experiment data file.
pub struct StorageLogger {
    data_file: heapless::String<16>,
    mounted: bool,
    open_file: Option<FileId>,
}

impl StorageLogger {
    pub fn new(data_file: heapless::String<16>) -> Self {
        Self {
            data_file,
            mounted: false,
            open_file: None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn has_open_file(&self) -> bool {
        self.open_file.is_some()
    }

    /// Attach the storage medium.
    pub fn mount(&mut self, media: &mut impl StoragePort) -> Result<()> {
        media.mount()?;
        self.mounted = true;
        info!("storage: mounted");
        Ok(())
    }

    /// Flush and detach the medium. Any open file is closed first.
    pub fn unmount(&mut self, media: &mut impl StoragePort) {
        self.close_log(media);
        if self.mounted {
            media.unmount();
            self.mounted = false;
            info!("storage: unmounted");
        }
    }

    /// Open the data file for the duration of a phase. Appends then go
    /// through the held handle instead of open/write/close per record.
    pub fn open_log(&mut self, media: &mut impl StoragePort) -> Result<()> {
        if !self.mounted {
            return Err(Error::UnmountedAccess);
        }
        if self.open_file.is_none() {
            self.open_file = Some(media.open_append(&self.data_file)?);
        }
        Ok(())
    }

    /// Close the held file handle. Idempotent — a second call is a
    /// no-op, so teardown paths cannot double-close.
    pub fn close_log(&mut self, media: &mut impl StoragePort) {
        if let Some(file) = self.open_file.take() {
            media.close(file);
            debug!("storage: log file closed");
        }
    }

    /// Append one sample record.
    ///
    /// Appending while unmounted is a programmer error (the controller
    /// must never schedule writes past an unmount) and is surfaced as
    /// [`Error::UnmountedAccess`], never retried.
    pub fn append(&mut self, media: &mut impl StoragePort, sample: &MeasurementSample) -> Result<()> {
        if !self.mounted {
            return Err(Error::UnmountedAccess);
        }
        let line = sample.format_line();
        match self.open_file {
            Some(file) => {
                media.append(file, line.as_bytes())?;
            }
            None => {
                let file = media.open_append(&self.data_file)?;
                let wrote = media.append(file, line.as_bytes());
                media.close(file);
                wrote?;
            }
        }
        Ok(())
    }

    /// Names of files on the mounted medium.
    pub fn list_files(&self, media: &impl StoragePort) -> Result<Vec<String>> {
        if !self.mounted {
            return Err(Error::UnmountedAccess);
        }
        Ok(media.file_names()?)
    }
}
