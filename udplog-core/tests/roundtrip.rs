//! Control-frame round trips and malformed-frame handling.
//!
//! Each `#[case]` is isolated: no shared state.

use rstest::rstest;
use udplog_core::{ControlCommand, LogLevel};

#[rstest]
#[case(LogLevel::Debug, "Set Log Level=0")]
#[case(LogLevel::Warning, "Set Log Level=1")]
#[case(LogLevel::Error, "Set Log Level=2")]
#[case(LogLevel::Critical, "Set Log Level=3")]
fn set_level_round_trips(#[case] level: LogLevel, #[case] wire: &str) {
    let encoded = ControlCommand::SetLevel(level).encode();
    assert_eq!(encoded, wire);
    assert_eq!(
        ControlCommand::decode(encoded.as_bytes()),
        Some(ControlCommand::SetLevel(level))
    );
}

#[rstest]
#[case::missing_equals(&b"Set Log Level 2"[..])]
#[case::non_numeric(&b"Set Log Level=two"[..])]
#[case::negative(&b"Set Log Level=-1"[..])]
#[case::out_of_range(&b"Set Log Level=4"[..])]
#[case::empty_value(&b"Set Log Level="[..])]
#[case::wrong_prefix(&b"Set Log Lvl=2"[..])]
#[case::lowercase_prefix(&b"set log level=2"[..])]
#[case::log_record(&b"Fri Aug 14 09:03:07 2020 ERROR svc:run:42 boom\n"[..])]
#[case::not_utf8(&[0xff, 0xfe, 0x3d, 0x32][..])]
#[case::empty(&b""[..])]
fn malformed_frames_do_not_decode(#[case] frame: &[u8]) {
    assert_eq!(ControlCommand::decode(frame), None);
}

#[rstest]
#[case(&b"Set Log Level=2\0"[..], LogLevel::Error)]
#[case(&b"Set Log Level=1\n"[..], LogLevel::Warning)]
#[case(&b"Set Log Level: level=3"[..], LogLevel::Critical)]
fn tolerated_variants_decode(#[case] frame: &[u8], #[case] expected: LogLevel) {
    assert_eq!(
        ControlCommand::decode(frame),
        Some(ControlCommand::SetLevel(expected))
    );
}
