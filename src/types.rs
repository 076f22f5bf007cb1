use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, XpdError};

/// Major file sections, in the order they appear on disk.
///
/// Each section starts with a 2-byte announce code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Section {
    Trial,
    Analog,
    Digital,
    Event,
}

impl Section {
    /// Announce code that precedes the section.
    pub const fn marker(self) -> u16 {
        match self {
            Section::Trial => 120,
            Section::Digital => 121,
            Section::Event => 122,
            Section::Analog => 123,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Section::Trial => write!(f, "trial"),
            Section::Analog => write!(f, "analog channel"),
            Section::Digital => write!(f, "digital channel"),
            Section::Event => write!(f, "event channel"),
        }
    }
}

/// Kind of recorded channel.
///
/// Every kind has its own channel-number namespace and sample width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelKind {
    /// Continuous voltage traces, signed 16-bit samples
    Analog,
    /// Digital lines, signed 32-bit samples
    Digital,
    /// Event markers, signed 32-bit samples
    Event,
}

impl ChannelKind {
    /// All kinds in on-disk section order.
    pub const ALL: [ChannelKind; 3] = [ChannelKind::Analog, ChannelKind::Digital, ChannelKind::Event];

    /// Size in bytes of one stored sample.
    pub const fn element_width(self) -> usize {
        match self {
            ChannelKind::Analog => 2,
            ChannelKind::Digital | ChannelKind::Event => 4,
        }
    }

    /// The file section holding channels of this kind.
    pub const fn section(self) -> Section {
        match self {
            ChannelKind::Analog => Section::Analog,
            ChannelKind::Digital => Section::Digital,
            ChannelKind::Event => Section::Event,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChannelKind::Analog => write!(f, "analog"),
            ChannelKind::Digital => write!(f, "digital"),
            ChannelKind::Event => write!(f, "event"),
        }
    }
}

/// Trial header stored at the start of every XPD file.
///
/// Describes one recorded trial: the generating program, protocol version,
/// trial number, stimulus and error codes, a timestamp and two free-text
/// comments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialHeader {
    /// Size of the header as recorded by the acquisition software
    pub header_size: u16,
    /// Size of the data block as recorded by the acquisition software
    pub data_size: u32,
    /// Name of the generating program
    pub program_name: String,
    /// Version identifier byte (usually `b'V'`)
    pub version: u8,
    /// Software build number
    pub sw_build_no: u16,
    /// Protocol high version
    pub high_ver: u8,
    /// Protocol low version
    pub low_ver: u8,
    /// Trial number
    pub trial_no: u32,
    /// Stimulus code
    pub stim_code: u8,
    /// Error code
    pub err_code: u8,
    /// Raw time stamp words
    pub timestamp: [u16; 4],
    /// Trial comment
    pub comment: String,
    /// Additional comment
    pub add_comment: String,
}

impl fmt::Display for TrialHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "header_size\t\t{}", self.header_size)?;
        writeln!(f, "data_size\t\t{}", self.data_size)?;
        writeln!(f, "name\t\t\t{}", self.program_name)?;
        writeln!(f, "sw_ver\t\t\t{}{}", char::from(self.version), self.sw_build_no)?;
        writeln!(f, "pt_ver\t\t({}, {})", self.high_ver, self.low_ver)?;
        writeln!(f, "trial_no\t\t{}", self.trial_no)?;
        writeln!(f, "stm_code\t\t{}", self.stim_code)?;
        writeln!(f, "err_code\t\t{}", self.err_code)?;
        let [t0, t1, t2, t3] = self.timestamp;
        writeln!(f, "timestamp\t\t{}, {}, {}, {}", t0, t1, t2, t3)?;
        writeln!(f, "comment\t\t\t{}", self.comment)?;
        write!(f, "add_comment\t\t{}", self.add_comment)
    }
}

/// Header of a single channel.
///
/// `payload_offset` is not stored in the file; it is the absolute position
/// right after the header bytes, where the channel's samples begin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelHeader {
    /// Channel number
    pub channel_no: u32,
    /// Sample rate (kHz)
    pub sample_rate: f64,
    /// Horizontal offset of the channel
    pub x_offset: f64,
    /// Number of stored samples
    pub n_sample: u32,
    /// Absolute file offset of the first sample
    pub payload_offset: u64,
}

impl ChannelHeader {
    /// Length in bytes of this channel's payload for the given kind.
    pub fn payload_len(&self, kind: ChannelKind) -> u64 {
        u64::from(self.n_sample) * kind.element_width() as u64
    }
}

impl fmt::Display for ChannelHeader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "channel_no\t\t{}", self.channel_no)?;
        writeln!(f, "sample_rate\t\t{:.6}", self.sample_rate)?;
        writeln!(f, "x_offset\t\t{:.6}", self.x_offset)?;
        writeln!(f, "n_sample\t\t{}", self.n_sample)?;
        write!(f, "data_offset\t\t{}", self.payload_offset)
    }
}

/// Physical unit of assembled signal samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalUnit {
    #[default]
    Microvolt,
}

impl fmt::Display for SignalUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SignalUnit::Microvolt => write!(f, "uV"),
        }
    }
}

/// Four co-located analog channels read as one multi-channel signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TetrodeBundle {
    /// Tetrode number (1..=16)
    pub id: u32,
    /// Channel numbers of the four electrodes, in column order
    pub channels: [u32; 4],
    /// Resolved sample rate (kHz)
    pub sample_rate: f64,
    /// Samples, shape [num_samples, 4]; short or missing electrodes are zero-padded
    pub samples: Array2<i16>,
    /// Unit of the samples
    pub units: SignalUnit,
}

impl TetrodeBundle {
    /// Number of sample rows.
    pub fn num_samples(&self) -> usize {
        self.samples.nrows()
    }

    /// Duration of the longest electrode trace in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        if self.sample_rate > 0.0 {
            self.num_samples() as f64 / self.sample_rate
        } else {
            0.0
        }
    }

    /// Samples of one electrode (column 0..4).
    pub fn channel(&self, column: usize) -> Option<ArrayView1<'_, i16>> {
        (column < self.samples.ncols()).then(|| self.samples.column(column))
    }
}

/// Channel samples of one kind, one column per requested channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelData {
    Analog(Array2<i16>),
    Digital(Array2<i32>),
    Event(Array2<i32>),
}

impl ChannelData {
    pub fn kind(&self) -> ChannelKind {
        match self {
            ChannelData::Analog(_) => ChannelKind::Analog,
            ChannelData::Digital(_) => ChannelKind::Digital,
            ChannelData::Event(_) => ChannelKind::Event,
        }
    }

    /// Shape as (rows, columns).
    pub fn dim(&self) -> (usize, usize) {
        match self {
            ChannelData::Analog(data) => data.dim(),
            ChannelData::Digital(data) | ChannelData::Event(data) => data.dim(),
        }
    }
}

/// Recoverable conditions met while loading data.
///
/// The data is still produced, with a well-defined default substituted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Warning {
    /// A requested channel is not present; its column is zero-filled
    MissingChannel { kind: ChannelKind, channel: u32 },
    /// None of the requested channels has data; the result has zero rows
    EmptyRequest { kind: ChannelKind, channels: Vec<u32> },
    /// No electrode of a tetrode carries a sample rate; the fallback is used
    MissingSampleRate { tetrode: u32, fallback_khz: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Warning::MissingChannel { kind, channel } => {
                write!(f, "invalid {} channel: {}", kind, channel)
            }
            Warning::EmptyRequest { kind, channels } => {
                write!(f, "no data for {} channels {:?}", kind, channels)
            }
            Warning::MissingSampleRate {
                tetrode,
                fallback_khz,
            } => write!(
                f,
                "no sample rate found for tetrode {}, using {} kHz; recording group may be invalid",
                tetrode, fallback_khz
            ),
        }
    }
}

/// A value together with the warnings collected while producing it.
///
/// # Examples
///
/// ```
/// use xpd_importer::{ChannelKind, Warned, Warning};
///
/// let mut result = Warned::new(3);
/// assert!(result.is_clean());
///
/// result.record(Warning::MissingChannel { kind: ChannelKind::Analog, channel: 99 });
/// assert!(result.strict().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Warned<T> {
    pub value: T,
    pub warnings: Vec<Warning>,
}

impl<T> Warned<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Returns true when no warning was recorded.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Records a warning and reports it through the `log` facade.
    pub fn record(&mut self, warning: Warning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    /// Moves the warnings of `other` into `self` and returns its value.
    pub fn absorb<U>(&mut self, other: Warned<U>) -> U {
        self.warnings.extend(other.warnings);
        other.value
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Warned<U> {
        Warned {
            value: f(self.value),
            warnings: self.warnings,
        }
    }

    /// Drops the warnings and returns the value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Returns the value, or the first warning as [`XpdError::Degraded`].
    pub fn strict(self) -> Result<T> {
        let Warned { value, warnings } = self;
        match warnings.into_iter().next() {
            Some(warning) => Err(XpdError::Degraded(warning)),
            None => Ok(value),
        }
    }
}

/// Complete representation of an XPD trial file.
///
/// This is the top-level struct returned by the `load` function: the trial
/// header, names derived from the file name, and every tetrode found among
/// the analog channels.
///
/// # Examples
///
/// ```no_run
/// use xpd_importer::load;
///
/// let xpd_file = load("path/to/abcd0042.xpd").unwrap();
/// println!("Experiment {} trial {}", xpd_file.experiment_name, xpd_file.trial_name);
/// for tetrode in &xpd_file.tetrodes {
///     println!("Tet::{} at {} kHz", tetrode.id, tetrode.sample_rate);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XpdFile {
    /// Trial header
    pub header: TrialHeader,
    /// Experiment name (first four characters of the trial name)
    pub experiment_name: String,
    /// Trial name (remainder after the experiment name)
    pub trial_name: String,
    /// Path the trial was read from
    pub file_origin: PathBuf,
    /// Assembled tetrodes, ordered by tetrode number
    pub tetrodes: Vec<TetrodeBundle>,
    /// Warnings collected during assembly
    pub warnings: Vec<Warning>,
}

impl XpdFile {
    /// Returns the tetrode with the given number, if present.
    pub fn tetrode(&self, id: u32) -> Option<&TetrodeBundle> {
        self.tetrodes.iter().find(|tetrode| tetrode.id == id)
    }

    pub fn num_tetrodes(&self) -> usize {
        self.tetrodes.len()
    }

    /// Duration of the longest tetrode recording in milliseconds.
    ///
    /// Returns 0.0 when no tetrode is present.
    pub fn duration_ms(&self) -> f64 {
        self.tetrodes
            .iter()
            .map(TetrodeBundle::duration_ms)
            .fold(0.0, f64::max)
    }
}
