//! The SetChunkSize protocol control message.  The payload is a single 4-byte big endian
//! value whose highest bit must be zero.

use crate::messages::{type_ids, MessagePayload};
use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use std::io;

const SIZE_MASK: u32 = 0x7FFF_FFFF;

pub fn serialize(size: u32) -> MessagePayload {
    let mut data = [0_u8; 4];
    BigEndian::write_u32(&mut data, size & SIZE_MASK);

    MessagePayload::new(type_ids::SET_CHUNK_SIZE, 0, 0, Bytes::copy_from_slice(&data))
}

pub fn deserialize(data: &[u8]) -> io::Result<u32> {
    if data.len() < 4 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "SetChunkSize payload shorter than 4 bytes",
        ));
    }

    Ok(BigEndian::read_u32(&data[..4]) & SIZE_MASK)
}
