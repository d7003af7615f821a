//! `.rk100s2_prog` program files.
//!
//! A file is a 32-byte header followed by 496 data bytes. The data region
//! holds the program in unpacked order: the common header is copied as is,
//! carriers are dropped and every other packed byte lands at its unpacked
//! position. The tail from [`FF_PAD_START`] is filled with `0xFF`.

use std::fs;
use std::path::Path;

use super::bitpack::{self, COMMON_SIZE, PROGRAM_SIZE};
use crate::error::{Error, Result};

/// Size of the file header.
pub const FILE_HEADER_SIZE: usize = 32;

/// Magic at the start of every program file.
pub const FILE_MAGIC: &[u8; 8] = b"12100PgD";

/// Total size of a program file.
pub const FILE_SIZE: usize = FILE_HEADER_SIZE + PROGRAM_SIZE;

/// First data byte of the fixed `0xFF` padding.
pub const FF_PAD_START: usize = 474;

/// Header written by the librarian for a single program.
pub const FILE_HEADER: [u8; FILE_HEADER_SIZE] = [
    0x31, 0x32, 0x31, 0x30, 0x30, 0x50, 0x67, 0x44, // "12100PgD"
    0x20, 0x00, 0xf0, 0x01, 0x00, 0x00, 0x01, 0x00, //
    0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, //
    0xf0, 0x01, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, //
];

/// File data position of a packed position, `None` for carriers.
pub fn packed_to_file(packed: usize) -> Option<usize> {
    if packed < COMMON_SIZE {
        return Some(packed);
    }
    bitpack::to_unpacked(packed)
}

/// Packed position of a file data position.
pub fn file_to_packed(file_pos: usize) -> usize {
    if file_pos < COMMON_SIZE {
        return file_pos;
    }
    bitpack::to_packed(file_pos)
}

/// Converts a packed program into a complete 528-byte file image.
pub fn sysex_to_file(packed: &[u8]) -> Result<Vec<u8>> {
    if packed.len() < PROGRAM_SIZE {
        return Err(Error::Length {
            what: "Program data",
            got: packed.len(),
            need: PROGRAM_SIZE,
        });
    }

    let mut data = vec![0u8; PROGRAM_SIZE];
    data[..COMMON_SIZE].copy_from_slice(&packed[..COMMON_SIZE]);
    for (p, &byte) in packed.iter().enumerate().take(PROGRAM_SIZE).skip(COMMON_SIZE) {
        if let Some(fp) = packed_to_file(p).filter(|&fp| fp < PROGRAM_SIZE) {
            data[fp] = byte;
        }
    }
    data[FF_PAD_START..].fill(0xFF);

    let mut file = Vec::with_capacity(FILE_SIZE);
    file.extend_from_slice(&FILE_HEADER);
    file.extend_from_slice(&data);
    Ok(file)
}

/// Converts a file data region into packed program bytes with zeroed carriers.
pub fn file_to_sysex(file_data: &[u8]) -> Result<Vec<u8>> {
    if file_data.len() < PROGRAM_SIZE {
        return Err(Error::Length {
            what: "File data",
            got: file_data.len(),
            need: PROGRAM_SIZE,
        });
    }

    let mut packed = vec![0u8; PROGRAM_SIZE];
    packed[..COMMON_SIZE].copy_from_slice(&file_data[..COMMON_SIZE]);
    for (p, byte) in packed.iter_mut().enumerate().skip(COMMON_SIZE) {
        *byte = match packed_to_file(p) {
            Some(fp) => file_data.get(fp).copied().unwrap_or(0),
            None => 0,
        };
    }
    Ok(packed)
}

/// Validates a file image and returns its data region.
pub fn read_program_file(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < FILE_SIZE {
        return Err(Error::Format(format!(
            "File too small: {} bytes (expected {})",
            bytes.len(),
            FILE_SIZE
        )));
    }
    if !bytes.starts_with(FILE_MAGIC) {
        return Err(Error::Format(format!(
            "Bad magic: {:02X?} (expected {:?})",
            &bytes[..FILE_MAGIC.len()],
            String::from_utf8_lossy(FILE_MAGIC)
        )));
    }
    Ok(&bytes[FILE_HEADER_SIZE..FILE_SIZE])
}

/// Loads a program file as wire-ready packed bytes.
///
/// Data bytes keep only 7 bits; their high bits are folded into the
/// carriers that [`file_to_sysex`] leaves zeroed. Bytes before the first
/// carrier have nowhere to put a high bit, so it is dropped with a warning.
pub fn load_program_file(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let mut packed = file_to_sysex(read_program_file(&bytes)?)?;
    let masked = bitpack::mask_uncarried_high_bits(&mut packed);
    if masked > 0 {
        log::warn!(
            "FILE: {}: dropped the high bit of {} byte(s) before the first carrier",
            path.display(),
            masked
        );
    }
    let folded = bitpack::fold_high_bits(&mut packed);
    log::debug!(
        "FILE: loaded {} ({} high bits folded)",
        path.display(),
        folded
    );
    Ok(packed)
}

/// Writes packed program bytes as a program file.
///
/// Carrier bits go back to the high bit of their data byte, the inverse of
/// [`load_program_file`].
pub fn save_program_file(path: impl AsRef<Path>, packed: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let mut unfolded = packed.to_vec();
    bitpack::unfold_high_bits(&mut unfolded);
    fs::write(path, sysex_to_file(&unfolded)?)?;
    log::debug!("FILE: wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_mapping() {
        assert_eq!(packed_to_file(0), Some(0));
        assert_eq!(packed_to_file(17), Some(17));
        assert_eq!(packed_to_file(24), None);
        assert_eq!(packed_to_file(25), Some(21));
        assert_eq!(packed_to_file(387), Some(338));
        assert_eq!(file_to_packed(338), 387);
        assert_eq!(file_to_packed(5), 5);
    }

    #[test]
    fn test_zero_program_file_layout() {
        let file = sysex_to_file(&[0u8; PROGRAM_SIZE]).unwrap();
        assert_eq!(file.len(), 528);
        assert_eq!(&file[..8], FILE_MAGIC);
        let data = &file[FILE_HEADER_SIZE..];
        assert_eq!(data.len() - FF_PAD_START, 22);
        assert!(data[FF_PAD_START..].iter().all(|&b| b == 0xFF));
        assert!(data[..FF_PAD_START].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_short_input_is_rejected() {
        assert!(matches!(
            sysex_to_file(&[0u8; 100]),
            Err(Error::Length { got: 100, .. })
        ));
        assert!(matches!(
            file_to_sysex(&[0u8; 495]),
            Err(Error::Length { need: 496, .. })
        ));
    }

    #[test]
    fn test_file_to_sysex_zeroes_carriers() {
        let data = vec![0x55u8; PROGRAM_SIZE];
        let packed = file_to_sysex(&data).unwrap();
        for (p, &b) in packed.iter().enumerate() {
            if bitpack::is_carrier_byte(p) {
                assert_eq!(b, 0, "carrier {}", p);
            } else {
                assert_eq!(b, 0x55, "data {}", p);
            }
        }
    }

    #[test]
    fn test_read_program_file_checks_magic_and_size() {
        let mut file = sysex_to_file(&[0u8; PROGRAM_SIZE]).unwrap();
        assert_eq!(read_program_file(&file).unwrap().len(), PROGRAM_SIZE);

        assert!(matches!(
            read_program_file(&file[..527]),
            Err(Error::Format(_))
        ));
        file[0] = b'X';
        assert!(matches!(read_program_file(&file), Err(Error::Format(_))));
    }
}
