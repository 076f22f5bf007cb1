use ndarray::Array2;
use std::io::{Read, Seek};

use crate::cursor::{Sample, XpdCursor};
use crate::error::{Result, XpdError};
use crate::index::ChannelIndex;
use crate::types::{ChannelData, ChannelKind, Warned, Warning};

/// Loads the payloads of `channels` as the columns of one matrix.
///
/// The matrix has one row per sample of the longest known channel. Shorter
/// channels are zero-padded at the end; unknown channels give an all-zero
/// column and a [`Warning::MissingChannel`]. When no requested channel has
/// any samples the result has zero rows and a [`Warning::EmptyRequest`] is
/// recorded.
///
/// A known channel whose payload runs past the end of the stream fails with
/// [`XpdError::Truncated`] before anything is allocated.
///
/// The cursor may be any handle onto the same file; the index is only read.
pub fn load_channel_data<R: Read + Seek>(
    cursor: &mut XpdCursor<R>,
    index: &ChannelIndex,
    kind: ChannelKind,
    channels: &[u32],
) -> Result<Warned<ChannelData>> {
    Ok(match kind {
        ChannelKind::Analog => load_matrix::<R, i16>(cursor, index, kind, channels)?.map(ChannelData::Analog),
        ChannelKind::Digital => load_matrix::<R, i32>(cursor, index, kind, channels)?.map(ChannelData::Digital),
        ChannelKind::Event => load_matrix::<R, i32>(cursor, index, kind, channels)?.map(ChannelData::Event),
    })
}

/// Typed form of [`load_channel_data`]; `T` must match the kind's sample width.
pub(crate) fn load_matrix<R: Read + Seek, T: Sample>(
    cursor: &mut XpdCursor<R>,
    index: &ChannelIndex,
    kind: ChannelKind,
    channels: &[u32],
) -> Result<Warned<Array2<T>>> {
    debug_assert_eq!(T::WIDTH, kind.element_width());

    let mut result = Warned::new(Array2::<T>::default((0, channels.len())));
    let known = index.channels(kind);

    let mut num_samples = 0usize;
    for &channel in channels {
        match known.get(&channel) {
            Some(header) => {
                let needed = header.payload_len(kind);
                if header.payload_offset.saturating_add(needed) > cursor.len() {
                    return Err(XpdError::Truncated {
                        what: "channel payload",
                        offset: header.payload_offset,
                        needed,
                    });
                }
                num_samples = num_samples.max(header.n_sample as usize);
            }
            None => result.record(Warning::MissingChannel { kind, channel }),
        }
    }

    if num_samples == 0 {
        result.record(Warning::EmptyRequest {
            kind,
            channels: channels.to_vec(),
        });
        return Ok(result);
    }

    let mut matrix = Array2::<T>::default((num_samples, channels.len()));
    let mut samples: Vec<T> = Vec::with_capacity(num_samples);
    let mut scratch: Vec<u8> = Vec::with_capacity(num_samples * T::WIDTH);

    for (column, channel) in channels.iter().enumerate() {
        let Some(header) = known.get(channel) else {
            continue;
        };

        samples.clear();
        samples.resize(header.n_sample as usize, T::default());
        cursor.seek_to(header.payload_offset)?;
        cursor.read_samples(&mut samples, &mut scratch, "channel payload")?;

        // Rows past this channel's own length stay zero
        for (dst, &value) in matrix.column_mut(column).iter_mut().zip(&samples) {
            *dst = value;
        }
    }

    result.value = matrix;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endian;
    use crate::fixtures::XpdImage;
    use crate::index::build_index;
    use ndarray::{array, s};
    use std::io::Cursor;

    fn open(image: XpdImage) -> (XpdCursor<Cursor<Vec<u8>>>, ChannelIndex) {
        let mut cursor = XpdCursor::new(Cursor::new(image.build()), Endian::Little).unwrap();
        let (_, index) = build_index(&mut cursor).unwrap();
        (cursor, index)
    }

    #[test]
    fn ragged_channels_are_zero_padded() {
        let (mut cursor, index) = open(
            XpdImage::new()
                .analog(1, 32.0, vec![1, 2, 3, 4, 5])
                .analog(17, 32.0, vec![-1, -2]),
        );

        let data = load_matrix::<_, i16>(&mut cursor, &index, ChannelKind::Analog, &[1, 17]).unwrap();
        assert!(data.is_clean());
        assert_eq!(
            data.value,
            array![[1, -1], [2, -2], [3, 0], [4, 0], [5, 0]]
        );
    }

    #[test]
    fn unknown_channel_column_is_zero() {
        let (mut cursor, index) = open(XpdImage::new().analog(1, 32.0, vec![7, 8, 9]));

        let data = load_matrix::<_, i16>(&mut cursor, &index, ChannelKind::Analog, &[1, 99]).unwrap();
        assert_eq!(data.value.dim(), (3, 2));
        assert_eq!(data.value.column(0).to_vec(), vec![7, 8, 9]);
        assert!(data.value.column(1).iter().all(|&v| v == 0));
        assert_eq!(
            data.warnings,
            vec![Warning::MissingChannel {
                kind: ChannelKind::Analog,
                channel: 99
            }]
        );
    }

    #[test]
    fn no_known_channels_gives_zero_rows() {
        let (mut cursor, index) = open(XpdImage::new().analog(1, 32.0, vec![7]));

        let data = load_matrix::<_, i16>(&mut cursor, &index, ChannelKind::Analog, &[40, 41, 42]).unwrap();
        assert_eq!(data.value.dim(), (0, 3));
        assert_eq!(data.warnings.len(), 4);
        assert!(matches!(
            data.warnings.last(),
            Some(Warning::EmptyRequest { channels, .. }) if channels == &vec![40, 41, 42]
        ));
    }

    #[test]
    fn empty_request_is_a_warning() {
        let (mut cursor, index) = open(XpdImage::new().analog(1, 32.0, vec![7]));

        let data = load_matrix::<_, i16>(&mut cursor, &index, ChannelKind::Analog, &[]).unwrap();
        assert_eq!(data.value.dim(), (0, 0));
        assert_eq!(
            data.warnings,
            vec![Warning::EmptyRequest {
                kind: ChannelKind::Analog,
                channels: vec![]
            }]
        );
    }

    #[test]
    fn known_channels_without_samples_give_zero_rows() {
        let (mut cursor, index) = open(XpdImage::new().digital(3, 1.0, vec![]));

        let data = load_channel_data(&mut cursor, &index, ChannelKind::Digital, &[3]).unwrap();
        assert_eq!(data.value.dim(), (0, 1));
        assert_eq!(data.warnings.len(), 1);
    }

    #[test]
    fn digital_and_event_use_their_own_namespaces() {
        let (mut cursor, index) = open(
            XpdImage::new()
                .analog(2, 32.0, vec![1])
                .digital(2, 1.0, vec![70_000, -70_000])
                .event(2, 1.0, vec![5, 6, 7]),
        );

        let digital = load_channel_data(&mut cursor, &index, ChannelKind::Digital, &[2]).unwrap();
        assert_eq!(digital.value, ChannelData::Digital(array![[70_000], [-70_000]]));

        let events = load_channel_data(&mut cursor, &index, ChannelKind::Event, &[2]).unwrap();
        match events.value {
            ChannelData::Event(data) => assert_eq!(data.slice(s![.., 0]).to_vec(), vec![5, 6, 7]),
            other => panic!("expected event data, got {:?}", other),
        }
    }

    #[test]
    fn requested_order_is_column_order() {
        let (mut cursor, index) = open(
            XpdImage::new()
                .analog(1, 32.0, vec![1, 1])
                .analog(2, 32.0, vec![2, 2]),
        );

        let data = load_matrix::<_, i16>(&mut cursor, &index, ChannelKind::Analog, &[2, 1, 2]).unwrap();
        assert_eq!(data.value, array![[2, 1, 2], [2, 1, 2]]);
    }

    #[test]
    fn truncated_payload_is_fatal() {
        let mut bytes = XpdImage::new().event(1, 1.0, vec![1, 2, 3, 4]).build();
        bytes.truncate(bytes.len() - 3);
        let mut cursor = XpdCursor::new(Cursor::new(bytes), Endian::Little).unwrap();
        let (_, index) = build_index(&mut cursor).unwrap();

        let err = load_channel_data(&mut cursor, &index, ChannelKind::Event, &[1]).unwrap_err();
        assert!(err.is_format_error());
        assert!(matches!(err, XpdError::Truncated { what: "channel payload", .. }));
    }

    #[test]
    fn oversized_sample_count_fails_before_allocating() {
        let mut bytes = XpdImage::new()
            .analog(1, 32.0, vec![1, 2])
            .event(1, 1.0, vec![1, 2, 3])
            .build();
        // n_sample of the last event channel sits 12 payload bytes from the end
        let n_sample_at = bytes.len() - 3 * 4 - 4;
        bytes[n_sample_at..n_sample_at + 4].copy_from_slice(&u32::MAX.to_le_bytes());

        let mut cursor = XpdCursor::new(Cursor::new(bytes), Endian::Little).unwrap();
        let (_, index) = build_index(&mut cursor).unwrap();
        let header = *index.get(ChannelKind::Event, 1).unwrap();
        assert_eq!(header.n_sample, u32::MAX);

        match load_channel_data(&mut cursor, &index, ChannelKind::Event, &[1]) {
            Err(XpdError::Truncated {
                what,
                offset,
                needed,
            }) => {
                assert_eq!(what, "channel payload");
                assert_eq!(offset, header.payload_offset);
                assert_eq!(needed, u64::from(u32::MAX) * 4);
            }
            other => panic!("expected truncation, got {:?}", other),
        }

        // other channels stay readable
        let analog = load_matrix::<_, i16>(&mut cursor, &index, ChannelKind::Analog, &[1]).unwrap();
        assert_eq!(analog.value.column(0).to_vec(), vec![1, 2]);
    }
}
