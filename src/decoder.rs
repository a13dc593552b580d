// Incremental decoder for a stream of concatenated JSON event records

use std::io::{BufReader, Read};

use serde_json::de::IoRead;
use serde_json::{Deserializer, StreamDeserializer, Value};

use crate::error::DecodeError;
use crate::models::Event;

/// Lazily decodes [`Event`]s from a byte stream, one per top-level JSON value.
///
/// Records are framed as untyped JSON first, so a record with the wrong shape
/// is reported without losing the frame boundary. A framing failure (syntax,
/// I/O, EOF mid-record) is yielded once and ends the iterator.
pub struct EventDecoder<R: Read> {
    frames: StreamDeserializer<'static, IoRead<BufReader<R>>, Value>,
    done: bool,
}

impl<R: Read> EventDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            frames: Deserializer::from_reader(BufReader::new(reader)).into_iter::<Value>(),
            done: false,
        }
    }

    /// Number of bytes consumed so far. After a stream error, the offset of the
/// record that failed.
    pub fn byte_offset(&self) -> usize {
        self.frames.byte_offset()
    }
}

impl<R: Read> Iterator for EventDecoder<R> {
    type Item = Result<Event, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.frames.next() {
            None => {
                self.done = true;
                None
            }
            Some(Err(e)) => {
                self.done = true;
                Some(Err(DecodeError::Stream(e)))
            }
            Some(Ok(frame)) => Some(serde_json::from_value(frame).map_err(DecodeError::Shape)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventKind;

    fn decode_all(input: &str) -> Vec<Result<Event, DecodeError>> {
        EventDecoder::new(input.as_bytes()).collect()
    }

    #[test]
    fn decodes_newline_delimited_and_back_to_back_records() {
        let input = "{\"type\":\"stats\",\"id\":\"a\"}\n\n  {\"type\":\"oom\",\"id\":\"a\"}{\"type\":\"stats\",\"id\":\"b\"}\n";
        let out = decode_all(input);
        assert_eq!(out.len(), 3);
        let kinds: Vec<_> = out.iter().map(|r| r.as_ref().unwrap().kind).collect();
        assert_eq!(kinds, vec![EventKind::Stats, EventKind::Other, EventKind::Stats]);
    }

    #[test]
    fn empty_input_ends_without_error() {
        assert!(decode_all("").is_empty());
        assert!(decode_all(" \n\t\n").is_empty());
    }

    #[test]
    fn truncated_record_is_terminal() {
        let out = decode_all("{\"type\":\"stats\",\"id\":\"a\"}\n{\"type\":\"sta");
        assert_eq!(out.len(), 2);
        assert!(out[0].is_ok());
        let err = out[1].as_ref().unwrap_err();
        assert!(err.is_terminal());
    }

    #[test]
    fn syntax_error_stops_the_stream() {
        let out = decode_all("{\"type\":\"stats\"} garbage {\"type\":\"stats\"}");
        assert_eq!(out.len(), 2);
        assert!(out[1].as_ref().unwrap_err().is_terminal());
    }

    #[test]
    fn wrong_shape_is_recoverable() {
        let out = decode_all("[1,2,3]\n{\"type\":\"stats\",\"id\":\"a\"}");
        assert_eq!(out.len(), 2);
        let err = out[0].as_ref().unwrap_err();
        assert!(!err.is_terminal());
        assert_eq!(out[1].as_ref().unwrap().id, "a");
    }

    #[test]
    fn reports_consumed_offset() {
        let mut dec = EventDecoder::new("{\"type\":\"oom\"}\n".as_bytes());
        assert_eq!(dec.byte_offset(), 0);
        dec.next().unwrap().unwrap();
        assert_eq!(dec.byte_offset(), 14);
    }
}
