//! Reader for `.xpd` trial recordings.
//!
//! An XPD file holds one recorded trial: a trial header followed by analog,
//! digital and event channel sections. Opening a file indexes every channel
//! without reading sample data; samples are loaded on demand. Analog channels
//! are regrouped into tetrodes, four co-located electrodes read as one
//! multi-channel signal.

pub mod config;
pub mod cursor;
mod error;
pub mod header;
pub mod index;
pub mod loader;
mod reader;
pub mod tetrode;
pub mod types;

#[cfg(test)]
mod fixtures;

use std::path::Path;

pub use config::{Endian, ReaderOptions};
pub use error::{Result, XpdError};
pub use index::ChannelIndex;
pub use reader::{trial_names, XpdReader};
// Re-export types
pub use types::*;

/// Loads an XPD file and returns the trial header with all assembled tetrodes
///
/// # Examples
///
/// ```no_run
/// use xpd_importer::load;
///
/// let result = load("path/to/your/file.xpd");
/// match result {
///     Ok(xpd_file) => println!("Trial number: {}", xpd_file.header.trial_no),
///     Err(e) => println!("Error loading file: {}", e),
/// }
/// ```
pub fn load<P: AsRef<Path>>(file_path: P) -> Result<XpdFile> {
    reader::load_file(file_path)
}

/// Loads an XPD file with explicit [`ReaderOptions`]
///
/// # Examples
///
/// ```no_run
/// use xpd_importer::{load_with, ReaderOptions};
///
/// let strict = ReaderOptions::default().with_strict(true);
/// match load_with("path/to/your/file.xpd", strict) {
///     Ok(xpd_file) => println!("{} clean tetrodes", xpd_file.num_tetrodes()),
///     Err(e) => println!("Rejected: {}", e),
/// }
/// ```
pub fn load_with<P: AsRef<Path>>(file_path: P, options: ReaderOptions) -> Result<XpdFile> {
    reader::load_file_with(file_path, options)
}
