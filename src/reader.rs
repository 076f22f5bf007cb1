use ndarray::Array2;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::ReaderOptions;
use crate::cursor::XpdCursor;
use crate::error::Result;
use crate::index::{build_index, ChannelIndex};
use crate::loader::{load_channel_data, load_matrix};
use crate::tetrode::{assemble_tetrode, assemble_tetrodes};
use crate::types::*;

/// An open XPD file.
///
/// Opening walks the whole file once, decoding the trial header and every
/// channel header while skipping the sample payloads. Samples are then read
/// on demand with random access. The reader owns its file handle; every load
/// takes `&mut self`, so seeks and reads on the handle never interleave.
///
/// # Examples
///
/// ```no_run
/// use xpd_importer::XpdReader;
///
/// let mut reader = XpdReader::open("path/to/abcd0042.xpd")?;
/// println!("Trial {}", reader.header().trial_no);
///
/// for id in reader.available_tetrodes() {
///     let tetrode = reader.read_tetrode(id)?;
///     println!("Tet::{}: {:?} samples", id, tetrode.value.samples.dim());
/// }
/// # Ok::<(), xpd_importer::XpdError>(())
/// ```
#[derive(Debug)]
pub struct XpdReader<R = BufReader<File>> {
    cursor: XpdCursor<R>,
    header: TrialHeader,
    index: ChannelIndex,
    options: ReaderOptions,
    path: Option<PathBuf>,
}

impl XpdReader<BufReader<File>> {
    /// Opens and indexes the file at `path` with default options.
    ///
    /// # Errors
    /// Fails if the file cannot be opened or its section layout is invalid.
    /// The file handle is released on failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, ReaderOptions::default())
    }

    /// Opens and indexes the file at `path`.
    pub fn open_with<P: AsRef<Path>>(path: P, options: ReaderOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(options.buffer_capacity, file);

        let mut session = Self::from_reader_with(reader, options)?;
        session.path = Some(path.to_path_buf());
        Ok(session)
    }
}

impl<R: Read + Seek> XpdReader<R> {
    /// Indexes an already opened byte source with default options.
    pub fn from_reader(inner: R) -> Result<Self> {
        Self::from_reader_with(inner, ReaderOptions::default())
    }

    /// Indexes an already opened byte source.
    ///
    /// The source is rewound before the walk starts.
    pub fn from_reader_with(inner: R, options: ReaderOptions) -> Result<Self> {
        let mut cursor = XpdCursor::new(inner, options.endian)?;
        let (header, index) = build_index(&mut cursor)?;
        log_header_summary(&header, &index);

        Ok(Self {
            cursor,
            header,
            index,
            options,
            path: None,
        })
    }

    pub fn header(&self) -> &TrialHeader {
        &self.header
    }

    /// Channel index built at open time.
    pub fn index(&self) -> &ChannelIndex {
        &self.index
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Path the reader was opened from, if it was opened from a path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Loads channels of any kind, one column per requested channel.
    ///
    /// See [`load_channel_data`] for padding and warning rules.
    pub fn load_channels(&mut self, kind: ChannelKind, channels: &[u32]) -> Result<Warned<ChannelData>> {
        load_channel_data(&mut self.cursor, &self.index, kind, channels)
    }

    /// Loads analog channels as 16-bit samples.
    pub fn load_analog(&mut self, channels: &[u32]) -> Result<Warned<Array2<i16>>> {
        load_matrix(&mut self.cursor, &self.index, ChannelKind::Analog, channels)
    }

    /// Loads digital channels as 32-bit samples.
    pub fn load_digital(&mut self, channels: &[u32]) -> Result<Warned<Array2<i32>>> {
        load_matrix(&mut self.cursor, &self.index, ChannelKind::Digital, channels)
    }

    /// Loads event channels as 32-bit samples.
    pub fn load_events(&mut self, channels: &[u32]) -> Result<Warned<Array2<i32>>> {
        load_matrix(&mut self.cursor, &self.index, ChannelKind::Event, channels)
    }

    /// Tetrode numbers found among the analog channels.
    pub fn available_tetrodes(&self) -> Vec<u32> {
        self.index.tetrode_ids()
    }

    /// Assembles one tetrode from its four analog electrodes.
    pub fn read_tetrode(&mut self, id: u32) -> Result<Warned<TetrodeBundle>> {
        assemble_tetrode(
            &mut self.cursor,
            &self.index,
            id,
            self.options.default_sample_rate_khz,
        )
    }

    /// Assembles every available tetrode.
    pub fn read_tetrodes(&mut self) -> Result<Warned<Vec<TetrodeBundle>>> {
        assemble_tetrodes(&mut self.cursor, &self.index, self.options.default_sample_rate_khz)
    }

    /// Closes the file.
    pub fn close(self) {
        drop(self.cursor.into_inner());
    }

    /// Releases the underlying byte source.
    pub fn into_inner(self) -> R {
        self.cursor.into_inner()
    }
}

/// Loads an XPD file and assembles all of its tetrodes.
pub fn load_file<P: AsRef<Path>>(file_path: P) -> Result<XpdFile> {
    load_file_with(file_path, ReaderOptions::default())
}

/// Loads an XPD file with explicit options.
///
/// With `options.strict` set, the first warning aborts the load as
/// [`XpdError::Degraded`](crate::XpdError::Degraded).
pub fn load_file_with<P: AsRef<Path>>(file_path: P, options: ReaderOptions) -> Result<XpdFile> {
    let tic = Instant::now();
    let path = file_path.as_ref();
    let strict = options.strict;

    let mut reader = XpdReader::open_with(path, options)?;
    let assembled = reader.read_tetrodes()?;
    let (tetrodes, warnings) = if strict {
        (assembled.strict()?, Vec::new())
    } else {
        (assembled.value, assembled.warnings)
    };

    let (experiment_name, trial_name) = trial_names(path);
    let header = reader.header().clone();
    reader.close();

    log::info!(
        "Done! Read {} tetrodes in {:.1} seconds",
        tetrodes.len(),
        tic.elapsed().as_secs_f64()
    );

    Ok(XpdFile {
        header,
        experiment_name,
        trial_name,
        file_origin: path.to_path_buf(),
        tetrodes,
        warnings,
    })
}

/// Splits a trial file name into experiment and trial names.
///
/// The trial name is the second-to-last dot-separated part of the base name
/// (the whole base name if it has no dot). Its first four characters name the
/// experiment and the rest names the trial: `abcd0042.xpd` gives
/// `("abcd", "0042")`.
pub fn trial_names(path: &Path) -> (String, String) {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let parts: Vec<&str> = base.split('.').collect();
    let stem = if parts.len() >= 2 {
        parts[parts.len() - 2]
    } else {
        base.as_str()
    };

    let split = stem.char_indices().nth(4).map_or(stem.len(), |(i, _)| i);
    (stem[..split].to_string(), stem[split..].to_string())
}

fn log_header_summary(header: &TrialHeader, index: &ChannelIndex) {
    log::info!(
        "Reading XPD trial {} written by {} {}{} (protocol {}.{})",
        header.trial_no,
        header.program_name,
        char::from(header.version),
        header.sw_build_no,
        header.high_ver,
        header.low_ver
    );
    log::info!(
        "Found {} analog, {} digital and {} event channels",
        index.len(ChannelKind::Analog),
        index.len(ChannelKind::Digital),
        index.len(ChannelKind::Event)
    );
    log::info!("Found {} tetrodes", index.tetrode_ids().len());

    if !header.comment.is_empty() {
        log::info!("Comment: {}", header.comment);
    }
    if !header.add_comment.is_empty() {
        log::info!("Additional comment: {}", header.add_comment);
    }
}
