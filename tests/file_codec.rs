use std::fs;

use rkpatch::program::bitpack;
use rkpatch::program::file::{self, FF_PAD_START, FILE_HEADER, FILE_HEADER_SIZE, FILE_MAGIC, FILE_SIZE};
use rkpatch::program::{Catalog, ProgramBuffer, PROGRAM_SIZE};
use rkpatch::{sysex, Error};

/// Data region the librarian would write: 7-bit common bytes, 8-bit
/// section data, zeros past the last mapped byte and the `0xFF` tail.
fn canonical_data() -> Vec<u8> {
    let mut data = vec![0u8; PROGRAM_SIZE];
    for (i, byte) in data.iter_mut().enumerate().take(434) {
        *byte = if i < 21 {
            (i * 5) as u8
        } else {
            (i * 37 % 256) as u8
        };
    }
    data[FF_PAD_START..].fill(0xFF);
    data
}

fn canonical_file() -> Vec<u8> {
    let mut file = FILE_HEADER.to_vec();
    file.extend(canonical_data());
    file
}

#[test]
fn test_zero_program_file() {
    let _ = env_logger::try_init();
    let file = file::sysex_to_file(&[0u8; PROGRAM_SIZE]).unwrap();

    assert_eq!(file.len(), 528);
    assert_eq!(&file[..8], FILE_MAGIC);
    let tail = &file[FILE_HEADER_SIZE + FF_PAD_START..];
    assert_eq!(tail.len(), 22);
    assert!(tail.iter().all(|&b| b == 0xFF));
}

#[test]
fn test_file_wire_file_is_identity() {
    let _ = env_logger::try_init();
    let original = canonical_file();

    let packed = file::file_to_sysex(file::read_program_file(&original).unwrap()).unwrap();
    assert_eq!(packed.len(), PROGRAM_SIZE);
    let rebuilt = file::sysex_to_file(&packed).unwrap();
    assert_eq!(rebuilt, original);
}

#[test]
fn test_wire_file_wire_is_identity() {
    let _ = env_logger::try_init();
    let arbitrary: Vec<u8> = (0..PROGRAM_SIZE).map(|i| (i * 91 % 256) as u8).collect();
    let y = file::file_to_sysex(&arbitrary).unwrap();

    let file = file::sysex_to_file(&y).unwrap();
    let again = file::file_to_sysex(&file[FILE_HEADER_SIZE..]).unwrap();
    assert_eq!(again, y);

    let twice = file::file_to_sysex(&file::sysex_to_file(&again).unwrap()[FILE_HEADER_SIZE..])
        .unwrap();
    assert_eq!(twice, again);
}

#[test]
fn test_every_data_byte_has_one_file_position() {
    let _ = env_logger::try_init();
    let mut seen = vec![false; PROGRAM_SIZE];

    for p in 0..PROGRAM_SIZE {
        match file::packed_to_file(p) {
            None => assert!(bitpack::is_carrier_byte(p), "{} has no position", p),
            Some(fp) if p < 18 => assert_eq!(fp, p),
            Some(fp) => {
                assert!(fp < FF_PAD_START, "{} lands in the padding", p);
                // Packed 18..=20 overlay the end of the common header.
                if fp >= 18 {
                    assert_eq!(file::file_to_packed(fp), p);
                }
                assert!(!seen[fp], "file position {} used twice", fp);
                seen[fp] = true;
            }
        }
    }
}

#[test]
fn test_load_folds_high_bits() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lead.rk100s2_prog");

    let mut image = canonical_file();
    // arp_on_off is the high bit of arp L0 (packed 385).
    let arp_l0 = file::packed_to_file(385).unwrap();
    image[FILE_HEADER_SIZE + arp_l0] = 0x80 | 0x05;
    fs::write(&path, &image).unwrap();

    let packed = file::load_program_file(&path).unwrap();
    assert!(packed.iter().all(|&b| b <= 0x7F));
    assert!(sysex::build_program_write(1, &packed).is_ok());

    let catalog = Catalog::new();
    let buffer = ProgramBuffer::from_bytes(&packed);
    assert_eq!(buffer.get_param(catalog.get("arp_on_off").unwrap()), Some(127));
    assert_eq!(buffer.get_byte(385).unwrap(), 0x05);

    let out = dir.path().join("copy.rk100s2_prog");
    file::save_program_file(&out, &packed).unwrap();
    assert_eq!(fs::read(&out).unwrap(), image);
}

#[test]
fn test_load_clears_high_bits_without_a_carrier() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("odd.rk100s2_prog");

    let mut image = canonical_file();
    // File data 19 holds packed 22, which sits before the first carrier.
    assert_eq!(file::file_to_packed(19), 22);
    image[FILE_HEADER_SIZE + 19] = 0x85;
    image[FILE_HEADER_SIZE + 16] |= 0x80;
    fs::write(&path, &image).unwrap();

    let packed = file::load_program_file(&path).unwrap();
    assert_eq!(packed[22], 0x05);
    assert!(packed[..bitpack::FIRST_CARRIER].iter().all(|&b| b <= 0x7F));
    assert!(sysex::build_program_write(1, &packed).is_ok());

    let mut buffer = ProgramBuffer::from_bytes(&packed);
    buffer.set_byte(22, 0x06).unwrap();
    assert!(sysex::build_program_write(1, buffer.as_slice()).is_ok());
}

#[test]
fn test_edit_survives_save() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pad.rk100s2_prog");
    fs::write(&path, canonical_file()).unwrap();

    let catalog = Catalog::new();
    let mut buffer = ProgramBuffer::from_bytes(&file::load_program_file(&path).unwrap());
    let latch = catalog.get("arp_latch").unwrap();
    let gate = catalog.get("arp_gate").unwrap();
    buffer.set_param(latch, 127).unwrap();
    buffer.set_param(gate, 90).unwrap();
    file::save_program_file(&path, buffer.as_slice()).unwrap();

    let reloaded = ProgramBuffer::from_bytes(&file::load_program_file(&path).unwrap());
    assert_eq!(reloaded.get_param(latch), Some(127));
    assert_eq!(reloaded.get_param(gate), Some(90));
    assert_eq!(reloaded, {
        let mut expected = buffer.clone();
        expected.mark_clean();
        expected
    });
}

#[test]
fn test_rejects_bad_files() {
    let _ = env_logger::try_init();
    let dir = tempfile::tempdir().unwrap();

    let short = dir.path().join("short.rk100s2_prog");
    fs::write(&short, &canonical_file()[..FILE_SIZE - 1]).unwrap();
    assert!(matches!(
        file::load_program_file(&short),
        Err(Error::Format(_))
    ));

    let mut image = canonical_file();
    image[..8].copy_from_slice(b"NOTAPROG");
    let foreign = dir.path().join("foreign.rk100s2_prog");
    fs::write(&foreign, image).unwrap();
    assert!(matches!(
        file::load_program_file(&foreign),
        Err(Error::Format(_))
    ));

    assert!(matches!(
        file::load_program_file(dir.path().join("missing")),
        Err(Error::Io(_))
    ));
}
