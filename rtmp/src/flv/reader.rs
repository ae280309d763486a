use super::FlvError;
use crate::logging::{LogLevel, Logger};
use crate::messages::{type_ids, MessagePayload};
use byteorder::{BigEndian, ByteOrder};
use bytes::Bytes;
use std::io::{self, Read, Seek, SeekFrom};

const FLV_SIGNATURE: &[u8; 3] = b"FLV";
const FLV_HEADER_SIZE: usize = 9;
const TAG_HEADER_SIZE: usize = 11;
const TAG_TRAILER_SIZE: usize = 4;

/// Kinds of tags that are published.  The numeric values double as RTMP message type ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TagType {
    Audio,
    Video,
    ScriptData,
}

impl TagType {
    pub fn from_id(id: u8) -> Option<TagType> {
        match id {
            type_ids::AUDIO_DATA => Some(TagType::Audio),
            type_ids::VIDEO_DATA => Some(TagType::Video),
            type_ids::AMF0_DATA => Some(TagType::ScriptData),
            _ => None,
        }
    }

    pub fn type_id(self) -> u8 {
        match self {
            TagType::Audio => type_ids::AUDIO_DATA,
            TagType::Video => type_ids::VIDEO_DATA,
            TagType::ScriptData => type_ids::AMF0_DATA,
        }
    }
}

/// A single tag read from the container
#[derive(Clone, Debug, PartialEq)]
pub struct MediaUnit {
    pub tag_type: TagType,

    /// Milliseconds, including the extended timestamp byte
    pub timestamp: u32,
    pub data: Bytes,

    /// Position of the tag header within the container
    pub start_offset: u64,

    /// Position just past the tag's trailer
    pub end_offset: u64,
}

impl MediaUnit {
    pub fn to_payload(&self, message_stream_id: u32) -> MessagePayload {
        MessagePayload::new(
            self.tag_type.type_id(),
            message_stream_id,
            self.timestamp,
            self.data.clone(),
        )
    }
}

/// Reads media units one at a time from a seekable FLV source.
///
/// Any record cut short by the end of the source is treated as the end of the container, not
/// as an error.
pub struct FlvReader<'a, R: Read + Seek> {
    source: R,
    position: u64,
    logger: &'a dyn Logger,
}

impl<'a, R: Read + Seek> FlvReader<'a, R> {
    /// Positions the reader at `offset`.  An offset of zero means reading starts at the very
    /// beginning of the container, so the FLV header is validated and skipped first.
    pub fn open(mut source: R, offset: u64, logger: &'a dyn Logger) -> Result<FlvReader<'a, R>, FlvError> {
        let position = match offset {
            0 => skip_header(&mut source)?,
            offset => source.seek(SeekFrom::Start(offset))?,
        };

        Ok(FlvReader {
            source,
            position,
            logger,
        })
    }

    /// Moves back (or forward) to `offset`, which must be the start of a tag
    pub fn seek_to(&mut self, offset: u64) -> Result<(), FlvError> {
        self.position = self.source.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    /// Reads the next audio, video or script data tag, or `None` at the end of the container
    pub fn next_unit(&mut self) -> Result<Option<MediaUnit>, FlvError> {
        loop {
            let start_offset = self.position;

            let mut header = [0_u8; TAG_HEADER_SIZE];
            if !read_fully(&mut self.source, &mut header)? {
                return Ok(None);
            }

            let type_id = header[0] & 0x1F;
            let data_size = BigEndian::read_u24(&header[1..4]) as usize;
            let timestamp = BigEndian::read_u24(&header[4..7]) | (u32::from(header[7]) << 24);

            let mut data = vec![0_u8; data_size];
            if !read_fully(&mut self.source, &mut data)? {
                return Ok(None);
            }

            let mut trailer = [0_u8; TAG_TRAILER_SIZE];
            if !read_fully(&mut self.source, &mut trailer)? {
                return Ok(None);
            }

            let end_offset = start_offset + (TAG_HEADER_SIZE + data_size + TAG_TRAILER_SIZE) as u64;
            self.position = end_offset;

            let previous_tag_size = BigEndian::read_u32(&trailer) as usize;
            if previous_tag_size != TAG_HEADER_SIZE + data_size {
                self.logger.log(
                    LogLevel::Warn,
                    &format!(
                        "Tag at offset {} has a trailer of {} but is {} bytes long",
                        start_offset,
                        previous_tag_size,
                        TAG_HEADER_SIZE + data_size
                    ),
                );
            }

            match TagType::from_id(type_id) {
                Some(tag_type) => {
                    return Ok(Some(MediaUnit {
                        tag_type,
                        timestamp,
                        data: Bytes::from(data),
                        start_offset,
                        end_offset,
                    }))
                }

                None => self.logger.log(
                    LogLevel::Warn,
                    &format!("Skipping tag of unknown type {} at offset {}", type_id, start_offset),
                ),
            }
        }
    }
}

/// Validates the FLV header and returns the offset of the first tag
fn skip_header<R: Read + Seek>(source: &mut R) -> Result<u64, FlvError> {
    let mut header = [0_u8; FLV_HEADER_SIZE];
    if !read_fully(source, &mut header)? {
        return Err(invalid("file is shorter than the FLV header"));
    }

    if &header[..3] != FLV_SIGNATURE {
        return Err(invalid("missing FLV signature"));
    }

    let data_offset = BigEndian::read_u32(&header[5..9]);
    if (data_offset as usize) < FLV_HEADER_SIZE {
        return Err(invalid(&format!("header claims a data offset of {}", data_offset)));
    }

    // The first tag follows PreviousTagSize0
    let first_tag = u64::from(data_offset) + TAG_TRAILER_SIZE as u64;
    let length = source.seek(SeekFrom::End(0))?;
    if first_tag > length {
        return Err(invalid(&format!(
            "header claims a data offset of {} but the file is only {} bytes",
            data_offset, length
        )));
    }

    Ok(source.seek(SeekFrom::Start(first_tag))?)
}

fn invalid(reason: &str) -> FlvError {
    FlvError::ContainerInvalid {
        reason: reason.to_string(),
    }
}

/// Fills the buffer unless the source runs out first, in which case `false` is returned
fn read_fully<R: Read>(source: &mut R, buffer: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < buffer.len() {
        match source.read(&mut buffer[filled..]) {
            Ok(0) => return Ok(false),
            Ok(count) => filled += count,
            Err(ref error) if error.kind() == io::ErrorKind::Interrupted => (),
            Err(error) => return Err(error),
        }
    }

    Ok(true)
}
