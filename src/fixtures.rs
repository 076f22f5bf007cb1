//! In-memory XPD images for unit tests.

use crate::header::TRIAL_HEADER_SIZE;
use crate::types::Section;

pub(crate) struct XpdImage {
    trial: Vec<u8>,
    analog: Vec<(u32, f64, Vec<i16>)>,
    digital: Vec<(u32, f64, Vec<i32>)>,
    event: Vec<(u32, f64, Vec<i32>)>,
    markers: [u16; 4],
}

impl XpdImage {
    pub(crate) fn new() -> Self {
        Self {
            trial: vec![0u8; TRIAL_HEADER_SIZE],
            analog: Vec::new(),
            digital: Vec::new(),
            event: Vec::new(),
            markers: [
                Section::Trial.marker(),
                Section::Analog.marker(),
                Section::Digital.marker(),
                Section::Event.marker(),
            ],
        }
    }

    pub(crate) fn trial_no(mut self, trial_no: u32) -> Self {
        self.trial[18..22].copy_from_slice(&trial_no.to_le_bytes());
        self
    }

    pub(crate) fn analog(mut self, channel: u32, rate: f64, samples: Vec<i16>) -> Self {
        self.analog.push((channel, rate, samples));
        self
    }

    pub(crate) fn digital(mut self, channel: u32, rate: f64, samples: Vec<i32>) -> Self {
        self.digital.push((channel, rate, samples));
        self
    }

    pub(crate) fn event(mut self, channel: u32, rate: f64, samples: Vec<i32>) -> Self {
        self.event.push((channel, rate, samples));
        self
    }

    pub(crate) fn marker(mut self, section: Section, value: u16) -> Self {
        let slot = match section {
            Section::Trial => 0,
            Section::Analog => 1,
            Section::Digital => 2,
            Section::Event => 3,
        };
        self.markers[slot] = value;
        self
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.markers[0].to_le_bytes());
        out.extend_from_slice(&self.trial);

        out.extend_from_slice(&self.markers[1].to_le_bytes());
        out.extend_from_slice(&(self.analog.len() as u32).to_le_bytes());
        for (channel, rate, samples) in &self.analog {
            push_channel_header(&mut out, *channel, *rate, samples.len());
            for sample in samples {
                out.extend_from_slice(&sample.to_le_bytes());
            }
        }

        for (marker, channels) in [(self.markers[2], &self.digital), (self.markers[3], &self.event)] {
            out.extend_from_slice(&marker.to_le_bytes());
            out.extend_from_slice(&(channels.len() as u32).to_le_bytes());
            for (channel, rate, samples) in channels {
                push_channel_header(&mut out, *channel, *rate, samples.len());
                for sample in samples {
                    out.extend_from_slice(&sample.to_le_bytes());
                }
            }
        }
        out
    }
}

fn push_channel_header(out: &mut Vec<u8>, channel: u32, rate: f64, n_sample: usize) {
    out.extend_from_slice(&channel.to_le_bytes());
    out.extend_from_slice(&rate.to_le_bytes());
    out.extend_from_slice(&0.0f64.to_le_bytes());
    out.extend_from_slice(&(n_sample as u32).to_le_bytes());
}
