use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

/// Default fallback sample rate for tetrodes without any rate information (kHz).
pub const DEFAULT_SAMPLE_RATE_KHZ: f64 = 32.0;

/// Default capacity of the buffered file reader.
pub const DEFAULT_BUFFER_CAPACITY: usize = 65536; // 64KB

/// Byte order of the fixed-width fields in an XPD file.
///
/// Acquisition rigs wrote these files with their native packing, which is
/// little-endian on every rig seen so far. Big-endian is available for files
/// coming from other hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    pub(crate) fn read_u16(self, buf: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(buf),
            Endian::Big => BigEndian::read_u16(buf),
        }
    }

    pub(crate) fn read_u32(self, buf: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(buf),
            Endian::Big => BigEndian::read_u32(buf),
        }
    }

    pub(crate) fn read_f64(self, buf: &[u8]) -> f64 {
        match self {
            Endian::Little => LittleEndian::read_f64(buf),
            Endian::Big => BigEndian::read_f64(buf),
        }
    }

    pub(crate) fn read_i16_into(self, src: &[u8], dst: &mut [i16]) {
        match self {
            Endian::Little => LittleEndian::read_i16_into(src, dst),
            Endian::Big => BigEndian::read_i16_into(src, dst),
        }
    }

    pub(crate) fn read_i32_into(self, src: &[u8], dst: &mut [i32]) {
        match self {
            Endian::Little => LittleEndian::read_i32_into(src, dst),
            Endian::Big => BigEndian::read_i32_into(src, dst),
        }
    }
}

/// Options controlling how an XPD file is opened and assembled.
///
/// # Examples
///
/// ```
/// use xpd_importer::{Endian, ReaderOptions};
///
/// let options = ReaderOptions::default()
///     .with_endian(Endian::Big)
///     .with_strict(true);
/// assert_eq!(options.default_sample_rate_khz, 32.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReaderOptions {
    /// Byte order of all fixed-width fields and samples
    pub endian: Endian,
    /// Sample rate substituted when no tetrode channel carries one (kHz)
    pub default_sample_rate_khz: f64,
    /// Capacity of the buffered reader wrapped around the file
    pub buffer_capacity: usize,
    /// Fail on the first warning instead of returning degraded data
    pub strict: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            endian: Endian::default(),
            default_sample_rate_khz: DEFAULT_SAMPLE_RATE_KHZ,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            strict: false,
        }
    }
}

impl ReaderOptions {
    #[must_use]
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    #[must_use]
    pub fn with_default_sample_rate(mut self, rate_khz: f64) -> Self {
        self.default_sample_rate_khz = rate_khz;
        self
    }

    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
