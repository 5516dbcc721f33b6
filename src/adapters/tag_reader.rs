//! Line-oriented credential tag reader.
//!
//! Keyboard-wedge and serial RFID readers present a scanned tag as one
//! line of text.  [`LineTagReader`] opens the configured device, blocks
//! until a line arrives and returns it trimmed.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use log::debug;

use crate::app::ports::{TagError, TagReader};

pub struct LineTagReader {
    path: PathBuf,
}

impl LineTagReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TagReader for LineTagReader {
    fn read_tag(&mut self) -> Result<String, TagError> {
        let file = File::open(&self.path)
            .map_err(|e| TagError::ReadFailed(format!("{}: {}", self.path.display(), e)))?;
        let mut line = String::new();
        let n = BufReader::new(file)
            .read_line(&mut line)
            .map_err(|e| TagError::ReadFailed(e.to_string()))?;
        let tag = line.trim();
        if n == 0 || tag.is_empty() {
            return Err(TagError::ReadFailed("empty read".into()));
        }
        debug!("tag reader: read {} chars", tag.len());
        Ok(tag.to_owned())
    }
}
