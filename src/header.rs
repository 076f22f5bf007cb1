//! Fixed-layout record codecs.
//!
//! Trial header layout (542 bytes):
//!
//! | Offset | Size | Field |
//! | ------ | ---- | ----- |
//! | 0 | 2 | header size |
//! | 2 | 4 | data size |
//! | 6 | 7 | name of generating program |
//! | 13 | 1 | version identifier |
//! | 14 | 2 | software build number |
//! | 16 | 1 | high protocol version |
//! | 17 | 1 | low protocol version |
//! | 18 | 4 | trial number |
//! | 22 | 1 | stimulus code |
//! | 23 | 1 | error code |
//! | 24 | 8 | time stamp, 4 x u16 |
//! | 32 | 255 | comment |
//! | 287 | 255 | additional comment |
//!
//! Channel header layout (24 bytes): channel number (u32), sample rate in kHz
//! (f64), x offset (f64), number of samples (u32).

use std::io::{Read, Seek};

use crate::config::Endian;
use crate::cursor::XpdCursor;
use crate::error::{Result, XpdError};
use crate::types::{ChannelHeader, TrialHeader};

/// Size of the trial header record in bytes.
pub const TRIAL_HEADER_SIZE: usize = 542;

/// Size of a channel header record in bytes.
pub const CHANNEL_HEADER_SIZE: usize = 24;

const PROGRAM_NAME_RANGE: std::ops::Range<usize> = 6..13;
const COMMENT_RANGE: std::ops::Range<usize> = 32..287;
const ADD_COMMENT_RANGE: std::ops::Range<usize> = 287..542;

impl TrialHeader {
    /// Decodes a trial header from the first 542 bytes of `buf`.
    pub fn decode(buf: &[u8], endian: Endian) -> Result<Self> {
        check_len(buf, TRIAL_HEADER_SIZE, "trial header")?;

        Ok(TrialHeader {
            header_size: endian.read_u16(&buf[0..2]),
            data_size: endian.read_u32(&buf[2..6]),
            program_name: read_fixed_string(&buf[PROGRAM_NAME_RANGE]),
            version: buf[13],
            sw_build_no: endian.read_u16(&buf[14..16]),
            high_ver: buf[16],
            low_ver: buf[17],
            trial_no: endian.read_u32(&buf[18..22]),
            stim_code: buf[22],
            err_code: buf[23],
            timestamp: [
                endian.read_u16(&buf[24..26]),
                endian.read_u16(&buf[26..28]),
                endian.read_u16(&buf[28..30]),
                endian.read_u16(&buf[30..32]),
            ],
            comment: read_fixed_string(&buf[COMMENT_RANGE]),
            add_comment: read_fixed_string(&buf[ADD_COMMENT_RANGE]),
        })
    }

    /// Reads and decodes the trial header at the cursor position.
    pub fn read<R: Read + Seek>(cursor: &mut XpdCursor<R>) -> Result<Self> {
        let mut buf = [0u8; TRIAL_HEADER_SIZE];
        cursor.read_exact(&mut buf, "trial header")?;
        Self::decode(&buf, cursor.endian())
    }
}

impl ChannelHeader {
    /// Decodes a channel header from the first 24 bytes of `buf`.
    ///
    /// `payload_offset` is the stream position right after those 24 bytes.
    pub fn decode(buf: &[u8], payload_offset: u64, endian: Endian) -> Result<Self> {
        check_len(buf, CHANNEL_HEADER_SIZE, "channel header")?;

        Ok(ChannelHeader {
            channel_no: endian.read_u32(&buf[0..4]),
            sample_rate: endian.read_f64(&buf[4..12]),
            x_offset: endian.read_f64(&buf[12..20]),
            n_sample: endian.read_u32(&buf[20..24]),
            payload_offset,
        })
    }

    /// Reads and decodes the channel header at the cursor position.
    pub fn read<R: Read + Seek>(cursor: &mut XpdCursor<R>) -> Result<Self> {
        let mut buf = [0u8; CHANNEL_HEADER_SIZE];
        cursor.read_exact(&mut buf, "channel header")?;
        Self::decode(&buf, cursor.position(), cursor.endian())
    }
}

fn check_len(buf: &[u8], expected: usize, what: &'static str) -> Result<()> {
    if buf.len() < expected {
        return Err(XpdError::ShortBuffer {
            what,
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

/// Decodes a fixed-width text field, cut at the first NUL byte.
///
/// A field without any NUL is kept whole.
fn read_fixed_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}
