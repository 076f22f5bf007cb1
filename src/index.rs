use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Seek};

use crate::cursor::XpdCursor;
use crate::error::{Result, XpdError};
use crate::tetrode::is_tetrode_id;
use crate::types::{ChannelHeader, ChannelKind, Section, TrialHeader};

/// Channel headers of one file, keyed by channel number, one map per kind.
///
/// Built once when a file is opened and never modified afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelIndex {
    analog: BTreeMap<u32, ChannelHeader>,
    digital: BTreeMap<u32, ChannelHeader>,
    event: BTreeMap<u32, ChannelHeader>,
}

impl ChannelIndex {
    /// All channels of one kind, ordered by channel number.
    pub fn channels(&self, kind: ChannelKind) -> &BTreeMap<u32, ChannelHeader> {
        match kind {
            ChannelKind::Analog => &self.analog,
            ChannelKind::Digital => &self.digital,
            ChannelKind::Event => &self.event,
        }
    }

    fn channels_mut(&mut self, kind: ChannelKind) -> &mut BTreeMap<u32, ChannelHeader> {
        match kind {
            ChannelKind::Analog => &mut self.analog,
            ChannelKind::Digital => &mut self.digital,
            ChannelKind::Event => &mut self.event,
        }
    }

    pub fn get(&self, kind: ChannelKind, channel: u32) -> Option<&ChannelHeader> {
        self.channels(kind).get(&channel)
    }

    pub fn len(&self, kind: ChannelKind) -> usize {
        self.channels(kind).len()
    }

    pub fn is_empty(&self, kind: ChannelKind) -> bool {
        self.channels(kind).is_empty()
    }

    /// Analog channel numbers that name a tetrode, in ascending order.
    ///
    /// Any analog channel numbered 1..=16 counts, whether or not its partner
    /// electrodes are present.
    pub fn tetrode_ids(&self) -> Vec<u32> {
        self.analog
            .keys()
            .copied()
            .filter(|&channel| is_tetrode_id(channel))
            .collect()
    }
}

/// Walks the file once and indexes every channel header.
///
/// Expects the trial, analog, digital and event sections in that order, each
/// introduced by its announce code. Channel payloads are skipped, not read.
/// On success the cursor is rewound to the start of the stream.
pub fn build_index<R: Read + Seek>(cursor: &mut XpdCursor<R>) -> Result<(TrialHeader, ChannelIndex)> {
    expect_marker(cursor, Section::Trial)?;
    let header = TrialHeader::read(cursor)?;

    let mut index = ChannelIndex::default();
    for kind in ChannelKind::ALL {
        index_section(cursor, kind, index.channels_mut(kind))?;
    }

    cursor.rewind()?;
    Ok((header, index))
}

fn expect_marker<R: Read + Seek>(cursor: &mut XpdCursor<R>, section: Section) -> Result<()> {
    let offset = cursor.position();
    let found = cursor.read_u16("section announce")?;
    if found != section.marker() {
        return Err(XpdError::UnexpectedMarker {
            section,
            expected: section.marker(),
            found,
            offset,
        });
    }
    Ok(())
}

fn index_section<R: Read + Seek>(
    cursor: &mut XpdCursor<R>,
    kind: ChannelKind,
    channels: &mut BTreeMap<u32, ChannelHeader>,
) -> Result<()> {
    expect_marker(cursor, kind.section())?;
    let count = cursor.read_u32("channel count")?;
    log::debug!("{} section: {} channels", kind, count);

    for _ in 0..count {
        let header = ChannelHeader::read(cursor)?;
        if channels.insert(header.channel_no, header).is_some() {
            log::debug!("duplicate {} channel {}, keeping the later one", kind, header.channel_no);
        }
        cursor.skip(header.payload_len(kind))?;
    }

    Ok(())
}
