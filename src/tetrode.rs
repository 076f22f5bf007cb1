//! Tetrode assembly.
//!
//! Electrodes are wired so that tetrode `t` (1..=16) records on analog
//! channels `t`, `t + 16`, `t + 32` and `t + 48`.

use std::io::{Read, Seek};
use std::ops::RangeInclusive;

use crate::cursor::XpdCursor;
use crate::error::{Result, XpdError};
use crate::index::ChannelIndex;
use crate::loader::load_matrix;
use crate::types::{ChannelKind, SignalUnit, TetrodeBundle, Warned, Warning};

/// Analog channel numbers that name a tetrode.
pub const TETRODE_IDS: RangeInclusive<u32> = 1..=16;

/// Channel number distance between the electrodes of one tetrode.
pub const TETRODE_CHANNEL_STRIDE: u32 = 16;

pub const CHANNELS_PER_TETRODE: usize = 4;

pub fn is_tetrode_id(channel: u32) -> bool {
    TETRODE_IDS.contains(&channel)
}

/// Analog channels of tetrode `id`, in column order.
///
/// Returns `None` for numbers outside [`TETRODE_IDS`].
pub fn tetrode_channels(id: u32) -> Option<[u32; CHANNELS_PER_TETRODE]> {
    is_tetrode_id(id).then(|| std::array::from_fn(|k| id + TETRODE_CHANNEL_STRIDE * k as u32))
}

/// Sample rate of the first present electrode, if it carries a usable one.
///
/// A zero or non-finite rate counts as missing.
pub fn resolve_sample_rate(index: &ChannelIndex, channels: &[u32]) -> Option<f64> {
    channels
        .iter()
        .find_map(|&channel| index.get(ChannelKind::Analog, channel))
        .map(|header| header.sample_rate)
        .filter(|rate| rate.is_finite() && *rate > 0.0)
}

/// Reads one tetrode.
///
/// Missing electrodes give zero columns; when none of them carries a sample
/// rate `fallback_rate_khz` is used and a warning is recorded. A bundle is
/// always produced for ids in [`TETRODE_IDS`]; any other id fails with
/// [`XpdError::InvalidTetrode`].
pub fn assemble_tetrode<R: Read + Seek>(
    cursor: &mut XpdCursor<R>,
    index: &ChannelIndex,
    id: u32,
    fallback_rate_khz: f64,
) -> Result<Warned<TetrodeBundle>> {
    let channels = tetrode_channels(id).ok_or(XpdError::InvalidTetrode(id))?;
    let mut result = Warned::new(());

    let sample_rate = match resolve_sample_rate(index, &channels) {
        Some(rate) => rate,
        None => {
            result.record(Warning::MissingSampleRate {
                tetrode: id,
                fallback_khz: fallback_rate_khz,
            });
            fallback_rate_khz
        }
    };

    let loaded = load_matrix::<R, i16>(cursor, index, ChannelKind::Analog, &channels)?;
    let samples = result.absorb(loaded);

    Ok(result.map(|()| TetrodeBundle {
        id,
        channels,
        sample_rate,
        samples,
        units: SignalUnit::Microvolt,
    }))
}

/// Reads every tetrode named among the analog channels, by tetrode number.
pub fn assemble_tetrodes<R: Read + Seek>(
    cursor: &mut XpdCursor<R>,
    index: &ChannelIndex,
    fallback_rate_khz: f64,
) -> Result<Warned<Vec<TetrodeBundle>>> {
    let mut result = Warned::new(Vec::new());
    for id in index.tetrode_ids() {
        let tetrode = assemble_tetrode(cursor, index, id, fallback_rate_khz)?;
        let tetrode = result.absorb(tetrode);
        result.value.push(tetrode);
    }
    Ok(result)
}
