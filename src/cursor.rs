//! Position-tracking reader over a seekable byte source.
//!
//! All reads of the file walk and of the on-demand channel loads go through
//! [`XpdCursor`], which keeps the current absolute offset and turns short
//! reads into [`XpdError::Truncated`] errors carrying that offset.

use std::io::{self, Read, Seek, SeekFrom};

use crate::config::Endian;
use crate::error::{Result, XpdError};

/// Element type of a channel payload.
pub trait Sample: Copy + Default + Send + Sync + 'static {
    /// Stored width in bytes.
    const WIDTH: usize;

    /// Decodes `dst.len()` samples from `src`, which must be exactly
    /// `dst.len() * WIDTH` bytes long.
    fn decode_into(endian: Endian, src: &[u8], dst: &mut [Self]);
}

impl Sample for i16 {
    const WIDTH: usize = 2;

    fn decode_into(endian: Endian, src: &[u8], dst: &mut [Self]) {
        endian.read_i16_into(src, dst);
    }
}

impl Sample for i32 {
    const WIDTH: usize = 4;

    fn decode_into(endian: Endian, src: &[u8], dst: &mut [Self]) {
        endian.read_i32_into(src, dst);
    }
}

/// Reader that tracks its absolute position and byte order.
#[derive(Debug)]
pub struct XpdCursor<R> {
    inner: R,
    position: u64,
    len: u64,
    endian: Endian,
}

impl<R: Read + Seek> XpdCursor<R> {
    /// Wraps `inner`, rewinding it to the start of the stream.
    ///
    /// The stream length is taken once here; payload bounds are checked
    /// against it.
    pub fn new(mut inner: R, endian: Endian) -> Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner,
            position: 0,
            len,
            endian,
        })
    }

    /// Current absolute offset.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total length of the stream in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Fills `buf` completely or fails with [`XpdError::Truncated`].
    pub fn read_exact(&mut self, buf: &mut [u8], what: &'static str) -> Result<()> {
        match self.inner.read_exact(buf) {
            Ok(()) => {
                self.position += buf.len() as u64;
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(XpdError::Truncated {
                what,
                offset: self.position,
                needed: buf.len() as u64,
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn read_u16(&mut self, what: &'static str) -> Result<u16> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf, what)?;
        Ok(self.endian.read_u16(&buf))
    }

    pub fn read_u32(&mut self, what: &'static str) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf, what)?;
        Ok(self.endian.read_u32(&buf))
    }

    /// Reads `dst.len()` samples starting at the current position.
    ///
    /// `scratch` holds the raw bytes and is reused across calls.
    pub fn read_samples<T: Sample>(
        &mut self,
        dst: &mut [T],
        scratch: &mut Vec<u8>,
        what: &'static str,
    ) -> Result<()> {
        scratch.clear();
        scratch.resize(dst.len() * T::WIDTH, 0);
        self.read_exact(scratch, what)?;
        T::decode_into(self.endian, scratch, dst);
        Ok(())
    }

    /// Advances `len` bytes without reading them.
    pub fn skip(&mut self, len: u64) -> Result<()> {
        let delta = i64::try_from(len).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "skip length exceeds i64::MAX")
        })?;
        self.position = self.inner.seek(SeekFrom::Current(delta))?;
        Ok(())
    }

    /// Moves to an absolute offset.
    pub fn seek_to(&mut self, offset: u64) -> Result<()> {
        self.position = self.inner.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.seek_to(0)
    }

    /// Releases the underlying reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}
