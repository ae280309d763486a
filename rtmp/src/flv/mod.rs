//! Reading media out of FLV containers.
//!
//! An FLV file is a 9 byte header, a zero `PreviousTagSize0` field and then a sequence of tags.
//! Each tag is an 11 byte header, the tag's payload and a 4 byte trailer repeating the size of
//! header and payload.

mod errors;
mod reader;

pub use self::errors::FlvError;
pub use self::reader::{FlvReader, MediaUnit, TagType};
