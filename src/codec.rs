//! APDU framing over a byte stream.
//!
//! Incremental three-phase decoder: scan for the start octet, read the
//! length octet, wait for the body. Partial input keeps the phase across
//! calls, so a frame interrupted mid-body resumes where it stopped and is
//! never re-scanned for a start octet. Malformed frames are traced and
//! skipped; they never tear the stream down.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::Iec104Error;
use crate::trace::{Direction, Tracer};
use crate::types::{Apci, UFunction, MAX_APDU_LENGTH, MIN_APDU_LENGTH, START_BYTE};

/// A complete APDU: control field plus the raw ASDU octets.
///
/// The payload is empty for S- and U-frames. Object decoding is the
/// [`crate::parser`] layer's job; the codec only frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Apdu {
    /// Parsed control field
    pub apci: Apci,
    /// Raw ASDU octets (I-frames), empty otherwise
    pub payload: Bytes,
}

impl Apdu {
    /// I-frame carrying an encoded ASDU.
    pub fn i_frame(send_seq: u16, recv_seq: u16, payload: Bytes) -> Self {
        Self {
            apci: Apci::i_frame(send_seq, recv_seq),
            payload,
        }
    }

    /// S-frame acknowledging `recv_seq`.
    pub fn s_frame(recv_seq: u16) -> Self {
        Self {
            apci: Apci::s_frame(recv_seq),
            payload: Bytes::new(),
        }
    }

    /// U-frame for a control function.
    pub fn u_frame(function: UFunction) -> Self {
        Self {
            apci: Apci::u_frame(function),
            payload: Bytes::new(),
        }
    }

    /// Whether this is an I-frame.
    pub fn is_i_frame(&self) -> bool {
        self.apci.is_i_frame()
    }

    /// Whether this is an S-frame.
    pub fn is_s_frame(&self) -> bool {
        self.apci.is_s_frame()
    }

    /// Whether this is a U-frame.
    pub fn is_u_frame(&self) -> bool {
        self.apci.is_u_frame()
    }
}

impl std::fmt::Display for Apdu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.apci)?;
        if !self.payload.is_empty() {
            write!(f, " +{}B", self.payload.len())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
enum DecodeState {
    #[default]
    SeekStart,
    ReadLength,
    ReadBody {
        length: usize,
    },
}

/// Framing codec for [`tokio_util::codec::Framed`].
#[derive(Debug, Default)]
pub struct Iec104Codec {
    state: DecodeState,
    tracer: Tracer,
}

impl Iec104Codec {
    /// Codec without tracing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec that hex-dumps every frame through the tracer.
    pub fn with_tracer(tracer: Tracer) -> Self {
        Self {
            state: DecodeState::SeekStart,
            tracer,
        }
    }
}

impl Decoder for Iec104Codec {
    type Item = Apdu;
    type Error = Iec104Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.state {
                DecodeState::SeekStart => {
                    if src.is_empty() {
                        return Ok(None);
                    }
                    if src[0] != START_BYTE {
                        match src.iter().position(|&b| b == START_BYTE) {
                            Some(pos) => {
                                self.tracer.message("R--> ERROR: NO START IN FRAME");
                                src.advance(pos);
                            }
                            None => {
                                src.clear();
                                return Ok(None);
                            }
                        }
                    }
                    self.state = DecodeState::ReadLength;
                }

                DecodeState::ReadLength => {
                    if src.len() < 2 {
                        return Ok(None);
                    }
                    let length = src[1] as usize;
                    if !(MIN_APDU_LENGTH..=MAX_APDU_LENGTH).contains(&length) {
                        self.tracer.message("R--> ERROR: INVALID FRAME");
                        src.advance(1);
                        self.state = DecodeState::SeekStart;
                        continue;
                    }
                    self.state = DecodeState::ReadBody { length };
                }

                DecodeState::ReadBody { length } => {
                    let total = 2 + length;
                    if src.len() < total {
                        src.reserve(total - src.len());
                        return Ok(None);
                    }

                    let frame = src.split_to(total).freeze();
                    self.state = DecodeState::SeekStart;
                    self.tracer.frame(Direction::Rx, &frame);

                    match Apci::parse(&frame[2..6]) {
                        Ok(apci) => {
                            return Ok(Some(Apdu {
                                apci,
                                payload: frame.slice(6..),
                            }))
                        }
                        Err(_) => {
                            // Unknown control octets; drop the frame, keep the stream
                            self.tracer.message("R--> ERROR: INVALID FRAME");
                            continue;
                        }
                    }
                }
            }
        }
    }
}

impl Encoder<Apdu> for Iec104Codec {
    type Error = Iec104Error;

    fn encode(&mut self, item: Apdu, dst: &mut BytesMut) -> Result<(), Self::Error> {
        if item.payload.len() + 4 > MAX_APDU_LENGTH {
            return Err(Iec104Error::EncodeOverflow(item.payload.len()));
        }

        let mark = dst.len();
        dst.reserve(6 + item.payload.len());

        let control = item.apci.encode();
        dst.extend_from_slice(&[
            START_BYTE,
            (4 + item.payload.len()) as u8,
            control[0],
            control[1],
            control[2],
            control[3],
        ]);
        dst.extend_from_slice(&item.payload);

        self.tracer.frame(Direction::Tx, &dst[mark..]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::TraceSink;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MemorySink(Mutex<Vec<String>>);

    impl TraceSink for MemorySink {
        fn append(&self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
    }

    #[test]
    fn decode_u_frame() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::from(&[0x68, 0x04, 0x07, 0x00, 0x00, 0x00][..]);
        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(apdu.apci, Apci::u_frame(UFunction::StartDtAct));
        assert!(apdu.payload.is_empty());
    }

    #[test]
    fn decode_s_frame() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::from(&[0x68, 0x04, 0x01, 0x00, 0xC8, 0x00][..]);
        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert!(apdu.is_s_frame());
        assert_eq!(apdu.apci.recv_seq(), Some(100));
    }

    #[test]
    fn decode_i_frame_keeps_payload_raw() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::from(
            &[
                0x68, 0x0E, 0x00, 0x00, 0x00, 0x00, // I-frame NS=0 NR=0
                0x64, 0x01, 0x06, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x14,
            ][..],
        );
        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert!(apdu.is_i_frame());
        assert_eq!(apdu.payload.len(), 10);
        assert_eq!(apdu.payload[0], 0x64);
        assert!(buf.is_empty());
    }

    #[test]
    fn resync_on_garbage_leaves_rest_buffered() {
        // Scenario: AA BB CC 68 04 0B 00 00 00 DD
        let mut codec = Iec104Codec::new();
        let mut buf =
            BytesMut::from(&[0xAA, 0xBB, 0xCC, 0x68, 0x04, 0x0B, 0x00, 0x00, 0x00, 0xDD][..]);
        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(apdu.apci, Apci::u_frame(UFunction::StartDtCon));
        assert_eq!(&buf[..], &[0xDD]);
    }

    #[test]
    fn partial_frame_survives_chunked_delivery() {
        let frame = [0x68, 0x04, 0x07, 0x00, 0x00, 0x00];
        // feed in every possible split position
        for split in 1..frame.len() {
            let mut codec = Iec104Codec::new();
            let mut buf = BytesMut::from(&frame[..split]);
            assert!(codec.decode(&mut buf).unwrap().is_none(), "split {split}");
            buf.extend_from_slice(&frame[split..]);
            let apdu = codec.decode(&mut buf).unwrap().unwrap();
            assert!(apdu.is_u_frame(), "split {split}");
        }
    }

    #[test]
    fn byte_at_a_time_delivery() {
        let frame = [
            0x68, 0x0E, 0x02, 0x00, 0x02, 0x00, 0x0D, 0x01, 0x03, 0x00, 0x01, 0x00, 0xB8, 0x0B,
            0x00, 0x00,
        ];
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::new();
        let mut decoded = None;
        for &byte in &frame {
            buf.extend_from_slice(&[byte]);
            if let Some(apdu) = codec.decode(&mut buf).unwrap() {
                decoded = Some(apdu);
            }
        }
        let apdu = decoded.expect("frame should complete on the last byte");
        assert_eq!(apdu.apci.send_seq(), Some(1));
        assert_eq!(apdu.payload.len(), 10);
    }

    #[test]
    fn invalid_length_resyncs() {
        let mut codec = Iec104Codec::new();
        // length 1 is impossible; the valid frame follows immediately
        let mut buf = BytesMut::from(
            &[0x68, 0x01, 0x68, 0x04, 0x07, 0x00, 0x00, 0x00][..],
        );
        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert!(apdu.is_u_frame());
    }

    #[test]
    fn length_above_253_resyncs() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::from(&[0x68, 0xFE, 0x00, 0x00][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn unknown_u_function_skipped_without_error() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::from(
            &[
                0x68, 0x04, 0x0F, 0x00, 0x00, 0x00, // bogus control octets
                0x68, 0x04, 0x83, 0x00, 0x00, 0x00, // TESTFR con
            ][..],
        );
        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(apdu.apci, Apci::u_frame(UFunction::TestFrCon));
    }

    #[test]
    fn multiple_frames_in_one_buffer() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::from(
            &[
                0x68, 0x04, 0x07, 0x00, 0x00, 0x00, 0x68, 0x04, 0x0B, 0x00, 0x00, 0x00,
            ][..],
        );
        let first = codec.decode(&mut buf).unwrap().unwrap();
        let second = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(first.apci, Apci::u_frame(UFunction::StartDtAct));
        assert_eq!(second.apci, Apci::u_frame(UFunction::StartDtCon));
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn encode_u_frame_wire_bytes() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::new();
        codec
            .encode(Apdu::u_frame(UFunction::StartDtAct), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], &[0x68, 0x04, 0x07, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn encode_s_frame_wire_bytes() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::new();
        codec.encode(Apdu::s_frame(100), &mut buf).unwrap();
        assert_eq!(&buf[..], &[0x68, 0x04, 0x01, 0x00, 0xC8, 0x00]);
    }

    #[test]
    fn encode_decode_i_frame() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::new();
        let payload = Bytes::from_static(&[0x64, 0x01, 0x06, 0x00, 0x01, 0x00, 0, 0, 0, 0x14]);
        codec
            .encode(Apdu::i_frame(50, 25, payload.clone()), &mut buf)
            .unwrap();
        assert_eq!(buf[1], 14);

        let apdu = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(apdu.apci.send_seq(), Some(50));
        assert_eq!(apdu.apci.recv_seq(), Some(25));
        assert_eq!(apdu.payload, payload);
    }

    #[test]
    fn encode_overflow_refused() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::new();
        let oversize = Bytes::from(vec![0u8; 250]);
        let err = codec
            .encode(Apdu::i_frame(0, 0, oversize), &mut buf)
            .unwrap_err();
        assert!(matches!(err, Iec104Error::EncodeOverflow(250)));
        assert!(buf.is_empty());
    }

    #[test]
    fn max_size_payload_accepted() {
        let mut codec = Iec104Codec::new();
        let mut buf = BytesMut::new();
        let payload = Bytes::from(vec![0u8; MAX_APDU_LENGTH - 4]);
        codec
            .encode(Apdu::i_frame(0, 0, payload), &mut buf)
            .unwrap();
        assert_eq!(buf[1] as usize, MAX_APDU_LENGTH);
    }

    #[test]
    fn tracer_dumps_both_directions() {
        let sink = Arc::new(MemorySink::default());
        let mut codec = Iec104Codec::with_tracer(Tracer::new(sink.clone()));

        let mut buf = BytesMut::new();
        codec
            .encode(Apdu::u_frame(UFunction::TestFrAct), &mut buf)
            .unwrap();
        codec.decode(&mut buf).unwrap().unwrap();

        let lines = sink.0.lock().unwrap();
        assert_eq!(lines[0], "T<-- 006: 68 04 43 00 00 00 ");
        assert_eq!(lines[1], "R--> 006: 68 04 43 00 00 00 ");
    }
}
