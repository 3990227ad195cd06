//! Envelope codec and framing.
//!
//! # Wire Format
//!
//! UTF-8 JSON, one value per message, terminated by `\r\n`. There is no
//! length prefix.
//!
//! The two roles frame differently:
//! - The listener scans for the first CRLF and decodes everything up to and
//!   including it ([`RequestFramer`]).
//! - The caller never scans; the peer closing the connection marks the end
//!   of the response ([`decode_response`]).

use bytes::BytesMut;
use corelib::{Envelope, Error, Result};
use serde::Serialize;
use serde_json::Value;

/// Frame terminator.
pub const FRAME_DELIMITER: &[u8] = b"\r\n";

const INITIAL_BUFFER_CAPACITY: usize = 4 * 1024;

/// Serialize `value` as one frame: JSON text followed by CRLF.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut frame = serde_json::to_vec(value)?;
    frame.extend_from_slice(FRAME_DELIMITER);
    Ok(frame)
}

/// Position just past the first CRLF in `buf`, if there is one.
pub fn frame_end(buf: &[u8]) -> Option<usize> {
    buf.windows(FRAME_DELIMITER.len())
        .position(|window| window == FRAME_DELIMITER)
        .map(|start| start + FRAME_DELIMITER.len())
}

/// Decode everything a peer sent before closing the connection.
///
/// Zero bytes is [`Error::NoData`]; bytes that are not JSON are
/// [`Error::Json`] carrying the parser diagnostic and the raw text.
pub fn decode_response(bytes: &[u8]) -> Result<Value> {
    if bytes.is_empty() {
        return Err(Error::NoData);
    }
    serde_json::from_slice(bytes).map_err(|e| Error::Json {
        message: e.to_string(),
        raw: String::from_utf8_lossy(bytes).into_owned(),
    })
}

/// Outcome of feeding bytes to a [`RequestFramer`].
#[derive(Debug)]
pub enum FrameState {
    /// No CRLF yet; keep reading.
    Buffering,
    /// A complete request frame was decoded.
    Decoded(Envelope),
    /// A complete frame arrived but it is not a valid request envelope.
    Malformed(Error),
}

/// Listener-side accumulator for one connection.
///
/// The buffer grows without bound until a delimiter shows up.
#[derive(Debug)]
pub struct RequestFramer {
    buf: BytesMut,
}

impl RequestFramer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Buffer to read socket data into.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.buf
    }

    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Append a chunk and re-check for a complete frame.
    pub fn feed(&mut self, chunk: &[u8]) -> FrameState {
        self.buf.extend_from_slice(chunk);
        self.decode()
    }

    /// Check the buffered bytes for a complete frame.
    ///
    /// Bytes past the first delimiter are left in the buffer and ignored;
    /// a connection carries a single request.
    pub fn decode(&mut self) -> FrameState {
        let Some(end) = frame_end(&self.buf) else {
            return FrameState::Buffering;
        };
        let frame = self.buf.split_to(end);
        match Envelope::from_slice(&frame) {
            Ok(envelope) => FrameState::Decoded(envelope),
            Err(e) => FrameState::Malformed(e),
        }
    }
}

impl Default for RequestFramer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Contact, NodeId, Request};
    use proptest::prelude::*;
    use serde_json::json;

    fn request_frame() -> (Envelope, Vec<u8>) {
        let sender = Contact::new("YmFy")
            .with_data(json!({"tags": [1, 2]}))
            .with_transport("127.0.0.1", 11234);
        let envelope = Envelope::find_node(NodeId::from("Zm9v"), sender);
        let frame = encode(&envelope).unwrap();
        (envelope, frame)
    }

    #[test]
    fn test_encode_appends_crlf() {
        let frame = encode(&json!({"foo": "bar"})).unwrap();
        assert_eq!(frame, b"{\"foo\":\"bar\"}\r\n");
    }

    #[test]
    fn test_frame_end() {
        assert_eq!(frame_end(b"abc"), None);
        assert_eq!(frame_end(b"abc\r"), None);
        assert_eq!(frame_end(b"abc\n"), None);
        assert_eq!(frame_end(b"abc\r\n"), Some(5));
        assert_eq!(frame_end(b"a\r\nb\r\n"), Some(3));
    }

    #[test]
    fn test_framer_waits_for_delimiter() {
        let (envelope, frame) = request_frame();
        let (head, tail) = frame.split_at(frame.len() - 1);

        let mut framer = RequestFramer::new();
        assert!(matches!(framer.feed(head), FrameState::Buffering));
        assert_eq!(framer.buffered(), head.len());

        match framer.feed(tail) {
            FrameState::Decoded(decoded) => assert_eq!(decoded, envelope),
            other => panic!("expected a decoded frame, got {other:?}"),
        }
    }

    #[test]
    fn test_framer_ignores_trailing_bytes() {
        let (_, mut frame) = request_frame();
        frame.extend_from_slice(b"garbage");

        let mut framer = RequestFramer::new();
        match framer.feed(&frame) {
            FrameState::Decoded(decoded) => {
                assert_eq!(decoded.request, Request::FindNode(NodeId::from("Zm9v")))
            }
            other => panic!("expected a decoded frame, got {other:?}"),
        }
    }

    #[test]
    fn test_framer_flags_malformed_frames() {
        let mut framer = RequestFramer::new();
        assert!(matches!(framer.feed(b"{not-json\r\n"), FrameState::Malformed(_)));

        let mut framer = RequestFramer::new();
        let missing_request = encode(&json!({"sender": {"id": "YmFy"}})).unwrap();
        assert!(matches!(framer.feed(&missing_request), FrameState::Malformed(_)));
    }

    #[test]
    fn test_decode_response() {
        assert!(matches!(decode_response(b""), Err(Error::NoData)));

        match decode_response(b"{not-json") {
            Err(Error::Json { message, raw }) => {
                assert!(!message.is_empty());
                assert_eq!(raw, "{not-json");
            }
            other => panic!("expected a JSON error, got {other:?}"),
        }

        let value = decode_response(b"[{\"id\":\"Zm9v\"}]\r\n").unwrap();
        assert_eq!(value, json!([{"id": "Zm9v"}]));
        assert_eq!(decode_response(b"42").unwrap(), json!(42));
    }

    proptest! {
        #[test]
        fn prop_chunking_does_not_change_the_frame(cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..8)) {
            let (envelope, frame) = request_frame();
            let mut points: Vec<usize> = cuts.iter().map(|c| c.index(frame.len())).collect();
            points.sort_unstable();
            points.dedup();

            let mut framer = RequestFramer::new();
            let mut start = 0;
            let mut decoded = None;
            for point in points.into_iter().chain(std::iter::once(frame.len())) {
                match framer.feed(&frame[start..point]) {
                    FrameState::Buffering => {}
                    FrameState::Decoded(envelope) => {
                        decoded = Some(envelope);
                        break;
                    }
                    FrameState::Malformed(e) => panic!("malformed: {e}"),
                }
                start = point;
            }
            prop_assert_eq!(decoded, Some(envelope));
        }
    }
}
