use crate::Error;
use bytes::{BufMut, Bytes, BytesMut};

/// Magic bytes that start every chunk of a chunked GELF message.
pub(crate) const CHUNK_MAGIC: [u8; 2] = [0x1e, 0x0f];
/// Magic bytes, 8 byte message id, sequence number and sequence count.
pub(crate) const CHUNK_HEADER_LEN: usize = 12;
/// Maximum number of chunks a GELF input accepts for one message.
pub(crate) const MAX_CHUNKS: usize = 128;

/// Split a payload into datagrams of at most `max_datagram_size` bytes.
///
/// A payload that fits is returned as the only datagram, without chunk header.
pub(crate) fn to_datagrams(
    payload: Bytes,
    max_datagram_size: usize,
    message_id: [u8; 8],
) -> Result<Vec<Bytes>, Error> {
    if payload.len() <= max_datagram_size {
        return Ok(vec![payload]);
    }

    if max_datagram_size <= CHUNK_HEADER_LEN {
        return Err(Error::DatagramSizeTooSmall {
            max: max_datagram_size,
            header: CHUNK_HEADER_LEN,
        });
    }

    let chunk_data_len = max_datagram_size - CHUNK_HEADER_LEN;
    let chunks = payload.len().div_ceil(chunk_data_len);
    if chunks > MAX_CHUNKS {
        return Err(Error::TooManyChunks {
            chunks,
            max: MAX_CHUNKS,
        });
    }

    Ok(payload
        .chunks(chunk_data_len)
        .enumerate()
        .map(|(sequence, data)| {
            let mut datagram = BytesMut::with_capacity(CHUNK_HEADER_LEN + data.len());
            datagram.put_slice(&CHUNK_MAGIC);
            datagram.put_slice(&message_id);
            datagram.put_u8(sequence as u8);
            datagram.put_u8(chunks as u8);
            datagram.put_slice(data);
            datagram.freeze()
        })
        .collect())
}
