//! Unit tests for codec error types.

use std::io;

use rstest::rstest;

use super::{CodecError, EncodeError, FramingError, ProtocolError};
use crate::packet::PacketKind;

#[rstest]
#[case(CodecError::Framing(FramingError::OversizedFrame { size: 40_000, max: 32_767 }))]
#[case(CodecError::Framing(FramingError::UndersizedFrame { size: 2, header: 3 }))]
#[case(CodecError::Protocol(ProtocolError::UnterminatedString {
    kind: PacketKind::ServerChat,
    field: "message",
}))]
fn decode_side_errors_are_inbound(#[case] err: CodecError) {
    assert!(err.is_inbound());
}

#[test]
fn encode_errors_are_not_inbound() {
    let err = CodecError::Encode(EncodeError::InteriorNul { field: "command" });
    assert!(!err.is_inbound());
}

#[test]
fn framing_errors_convert_to_invalid_data() {
    let err: io::Error = CodecError::Framing(FramingError::UndersizedFrame {
        size: 0,
        header: 3,
    })
    .into();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
}

#[test]
fn encode_errors_convert_to_invalid_input() {
    let err: io::Error = CodecError::Encode(EncodeError::OversizedPacket {
        size: 70_000,
        max: 32_767,
    })
    .into();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn protocol_error_display_names_packet_and_field() {
    let err = ProtocolError::Truncated {
        kind: PacketKind::ServerDate,
        field: "date",
        need: 4,
        have: 1,
    };
    assert_eq!(
        err.to_string(),
        "ServerDate: truncated field `date`: need 4 bytes, have 1"
    );
}
