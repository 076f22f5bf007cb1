#![allow(dead_code, unused_imports)]

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub use xpd_importer::header::{CHANNEL_HEADER_SIZE, TRIAL_HEADER_SIZE};

pub struct Channel<T> {
    pub number: u32,
    pub sample_rate: f64,
    pub samples: Vec<T>,
}

/// Builds XPD images byte by byte.
pub struct XpdBuilder {
    big_endian: bool,
    markers: [u16; 4],
    header_size: u16,
    trial_no: u32,
    program_name: Vec<u8>,
    comment: Vec<u8>,
    analog: Vec<Channel<i16>>,
    digital: Vec<Channel<i32>>,
    event: Vec<Channel<i32>>,
}

impl Default for XpdBuilder {
    fn default() -> Self {
        Self {
            big_endian: false,
            markers: [120, 123, 121, 122],
            header_size: 0,
            trial_no: 0,
            program_name: Vec::new(),
            comment: Vec::new(),
            analog: Vec::new(),
            digital: Vec::new(),
            event: Vec::new(),
        }
    }
}

impl XpdBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn big_endian(mut self) -> Self {
        self.big_endian = true;
        self
    }

    pub fn markers(mut self, markers: [u16; 4]) -> Self {
        self.markers = markers;
        self
    }

    pub fn header_size(mut self, header_size: u16) -> Self {
        self.header_size = header_size;
        self
    }

    pub fn trial_no(mut self, trial_no: u32) -> Self {
        self.trial_no = trial_no;
        self
    }

    pub fn program_name(mut self, name: &str) -> Self {
        self.program_name = name.as_bytes().to_vec();
        self
    }

    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = comment.as_bytes().to_vec();
        self
    }

    pub fn analog(mut self, number: u32, sample_rate: f64, samples: Vec<i16>) -> Self {
        self.analog.push(Channel { number, sample_rate, samples });
        self
    }

    pub fn digital(mut self, number: u32, sample_rate: f64, samples: Vec<i32>) -> Self {
        self.digital.push(Channel { number, sample_rate, samples });
        self
    }

    pub fn event(mut self, number: u32, sample_rate: f64, samples: Vec<i32>) -> Self {
        self.event.push(Channel { number, sample_rate, samples });
        self
    }

    fn u16(&self, value: u16) -> [u8; 2] {
        if self.big_endian { value.to_be_bytes() } else { value.to_le_bytes() }
    }

    fn u32(&self, value: u32) -> [u8; 4] {
        if self.big_endian { value.to_be_bytes() } else { value.to_le_bytes() }
    }

    fn f64(&self, value: f64) -> [u8; 8] {
        if self.big_endian { value.to_be_bytes() } else { value.to_le_bytes() }
    }

    fn i16(&self, value: i16) -> [u8; 2] {
        if self.big_endian { value.to_be_bytes() } else { value.to_le_bytes() }
    }

    fn i32(&self, value: i32) -> [u8; 4] {
        if self.big_endian { value.to_be_bytes() } else { value.to_le_bytes() }
    }

    fn channel_header(&self, out: &mut Vec<u8>, number: u32, sample_rate: f64, n_sample: usize) {
        out.extend_from_slice(&self.u32(number));
        out.extend_from_slice(&self.f64(sample_rate));
        out.extend_from_slice(&self.f64(0.0));
        out.extend_from_slice(&self.u32(n_sample as u32));
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(&self.u16(self.markers[0]));
        let mut header = vec![0u8; TRIAL_HEADER_SIZE];
        header[0..2].copy_from_slice(&self.u16(self.header_size));
        header[6..6 + self.program_name.len()].copy_from_slice(&self.program_name);
        header[13] = b'V';
        header[18..22].copy_from_slice(&self.u32(self.trial_no));
        header[32..32 + self.comment.len()].copy_from_slice(&self.comment);
        out.extend_from_slice(&header);

        out.extend_from_slice(&self.u16(self.markers[1]));
        out.extend_from_slice(&self.u32(self.analog.len() as u32));
        for channel in &self.analog {
            self.channel_header(&mut out, channel.number, channel.sample_rate, channel.samples.len());
            for &sample in &channel.samples {
                out.extend_from_slice(&self.i16(sample));
            }
        }

        for (marker, channels) in [(self.markers[2], &self.digital), (self.markers[3], &self.event)] {
            out.extend_from_slice(&self.u16(marker));
            out.extend_from_slice(&self.u32(channels.len() as u32));
            for channel in channels {
                self.channel_header(&mut out, channel.number, channel.sample_rate, channel.samples.len());
                for &sample in &channel.samples {
                    out.extend_from_slice(&self.i32(sample));
                }
            }
        }

        out
    }

    /// Writes the image as `name` inside a fresh temporary directory.
    pub fn write(&self, name: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        write_bytes(&path, &self.build());
        (dir, path)
    }
}

pub fn write_bytes(path: &Path, bytes: &[u8]) {
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(bytes).unwrap();
}
