//! Korg SysEx envelope for RK-100S 2 program transfers.
//!
//! Every message has the shape
//!
//! ```text
//! F0 42 3n <model id> <function> [payload] F7
//! ```
//!
//! where `n` is the zero-based MIDI channel. Payload bytes are 7-bit.

use crate::error::{Error, Result};

/// Start of a system exclusive message.
pub const SYSEX_START: u8 = 0xF0;
/// End of a system exclusive message.
pub const SYSEX_END: u8 = 0xF7;
/// Korg manufacturer ID.
pub const KORG_ID: u8 = 0x42;
/// RK-100S 2 model ID bytes.
pub const MODEL_ID: &[u8] = &[0x57];

/// Requests the current program.
pub const FUNC_PROGRAM_DUMP_REQUEST: u8 = 0x10;
/// Requests every program and global setting.
pub const FUNC_ALL_DUMP_REQUEST: u8 = 0x0E;
/// Current program data, in either direction.
pub const FUNC_PROGRAM_DUMP: u8 = 0x40;
/// All data dump.
pub const FUNC_ALL_DUMP: u8 = 0x4E;

const CHANNEL_STATUS: u8 = 0x30;
const HEADER_LEN: usize = 3 + MODEL_ID.len() + 1;

/// Shortest message that still carries a complete envelope.
pub const MIN_MESSAGE_LEN: usize = HEADER_LEN + 1;

fn channel_byte(channel: u8) -> Result<u8> {
    if !(1..=16).contains(&channel) {
        return Err(Error::Validation(format!(
            "MIDI channel must be 1-16 (got {})",
            channel
        )));
    }
    Ok(CHANNEL_STATUS | (channel - 1))
}

fn envelope(channel: u8, function: u8, payload: &[u8]) -> Result<Vec<u8>> {
    let mut msg = Vec::with_capacity(MIN_MESSAGE_LEN + payload.len());
    msg.push(SYSEX_START);
    msg.push(KORG_ID);
    msg.push(channel_byte(channel)?);
    msg.extend_from_slice(MODEL_ID);
    msg.push(function);
    msg.extend_from_slice(payload);
    msg.push(SYSEX_END);
    Ok(msg)
}

/// Wraps packed program bytes in a program dump message.
pub fn build_program_write(channel: u8, data: &[u8]) -> Result<Vec<u8>> {
    if let Some(pos) = data.iter().position(|&b| b > 0x7F) {
        return Err(Error::Validation(format!(
            "Data byte {} is 0x{:02X}, SysEx payload must be 7-bit",
            pos, data[pos]
        )));
    }
    envelope(channel, FUNC_PROGRAM_DUMP, data)
}

/// Asks the device for its current program.
pub fn build_program_dump_request(channel: u8) -> Result<Vec<u8>> {
    envelope(channel, FUNC_PROGRAM_DUMP_REQUEST, &[])
}

/// Asks the device for an all data dump.
pub fn build_all_dump_request(channel: u8) -> Result<Vec<u8>> {
    envelope(channel, FUNC_ALL_DUMP_REQUEST, &[])
}

fn check_envelope(msg: &[u8], function: u8) -> std::result::Result<&[u8], &'static str> {
    if msg.len() < MIN_MESSAGE_LEN {
        return Err("message too short");
    }
    if msg[0] != SYSEX_START {
        return Err("missing SysEx start");
    }
    if msg[1] != KORG_ID {
        return Err("not a Korg message");
    }
    if msg[2] & 0xF0 != CHANNEL_STATUS {
        return Err("bad channel status");
    }
    if &msg[3..3 + MODEL_ID.len()] != MODEL_ID {
        return Err("foreign model ID");
    }
    if msg[HEADER_LEN - 1] != function {
        return Err("unexpected function code");
    }
    if msg[msg.len() - 1] != SYSEX_END {
        return Err("missing SysEx end");
    }
    Ok(&msg[HEADER_LEN..msg.len() - 1])
}

/// Payload of a program dump, or `None` if `msg` is anything else.
pub fn parse_program_dump(msg: &[u8]) -> Option<&[u8]> {
    match check_envelope(msg, FUNC_PROGRAM_DUMP) {
        Ok(payload) => Some(payload),
        Err(reason) => {
            log::debug!("SYSEX: ignoring {} byte message: {}", msg.len(), reason);
            None
        }
    }
}

/// 1-based channel encoded in a Korg envelope.
pub fn message_channel(msg: &[u8]) -> Option<u8> {
    match msg {
        [SYSEX_START, KORG_ID, status, ..] if status & 0xF0 == CHANNEL_STATUS => {
            Some((status & 0x0F) + 1)
        }
        _ => None,
    }
}

/// Splits a byte stream (such as a `.syx` file) into `F0 .. F7` messages.
///
/// Bytes between messages are skipped. A message that never terminates is
/// a format error.
pub fn split_messages(data: &[u8]) -> Result<Vec<&[u8]>> {
    let mut messages = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        // Find SYSEX start
        while pos < data.len() && data[pos] != SYSEX_START {
            pos += 1;
        }
        if pos >= data.len() {
            break;
        }

        // Find SYSEX end
        let start = pos;
        pos += 1;
        while pos < data.len() && data[pos] != SYSEX_END {
            pos += 1;
        }
        if pos >= data.len() {
            return Err(Error::Format(format!(
                "Unterminated SysEx message at byte {}",
                start
            )));
        }

        pos += 1;
        messages.push(&data[start..pos]);
    }

    Ok(messages)
}

/// Payload of the first program dump in a byte stream.
pub fn find_program_dump(data: &[u8]) -> Result<&[u8]> {
    split_messages(data)?
        .into_iter()
        .find_map(parse_program_dump)
        .ok_or_else(|| Error::Format("No RK-100S 2 program dump found".to_string()))
}

/// Program name stored in the first eight bytes of a program.
///
/// Unprintable bytes read as spaces. Returns `None` for a blank name.
pub fn extract_patch_name(data: &[u8]) -> Option<String> {
    let name: String = data
        .iter()
        .take(8)
        .map(|&b| if (0x20..0x7F).contains(&b) { b as char } else { ' ' })
        .collect();
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_write_layout() {
        let msg = build_program_write(3, &[1, 2, 3]).unwrap();
        assert_eq!(msg, vec![0xF0, 0x42, 0x32, 0x57, 0x40, 1, 2, 3, 0xF7]);
    }

    #[test]
    fn test_requests_have_no_payload() {
        assert_eq!(
            build_program_dump_request(1).unwrap(),
            vec![0xF0, 0x42, 0x30, 0x57, 0x10, 0xF7]
        );
        assert_eq!(
            build_all_dump_request(16).unwrap(),
            vec![0xF0, 0x42, 0x3F, 0x57, 0x0E, 0xF7]
        );
    }

    #[test]
    fn test_high_bit_data_is_rejected() {
        assert!(matches!(
            build_program_write(1, &[0x10, 0x80]),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_invalid_channel() {
        assert!(build_program_write(0, &[]).is_err());
        assert!(build_all_dump_request(17).is_err());
    }

    #[test]
    fn test_parse_rejects_other_messages() {
        let request = build_program_dump_request(1).unwrap();
        assert_eq!(parse_program_dump(&request), None);
        assert_eq!(parse_program_dump(&[0xF0, 0x42, 0x30]), None);
        assert_eq!(parse_program_dump(&[0xF0, 0x42, 0x30, 0x58, 0x40, 0xF7]), None);
        assert_eq!(parse_program_dump(&[0xF0, 0x42, 0x90, 0x57, 0x40, 0xF7]), None);
    }

    #[test]
    fn test_message_channel() {
        let msg = build_program_write(10, &[]).unwrap();
        assert_eq!(message_channel(&msg), Some(10));
        assert_eq!(message_channel(&[0xF0, 0x43, 0x30]), None);
    }

    #[test]
    fn test_split_messages() {
        let mut stream = vec![0x00];
        stream.extend(build_program_dump_request(1).unwrap());
        stream.extend([0x11, 0x22]);
        stream.extend(build_program_write(1, &[5]).unwrap());

        let messages = split_messages(&stream).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(find_program_dump(&stream).unwrap(), &[5]);

        assert!(split_messages(&[0xF0, 0x42, 0x30]).is_err());
        assert!(split_messages(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_extract_patch_name() {
        assert_eq!(extract_patch_name(b"Vox Lead\x00\x01"), Some("Vox Lead".to_string()));
        assert_eq!(extract_patch_name(b"Pad\x00\x00\x00\x00\x00"), Some("Pad".to_string()));
        assert_eq!(extract_patch_name(&[0u8; 8]), None);
        assert_eq!(extract_patch_name(&[]), None);
    }
}
