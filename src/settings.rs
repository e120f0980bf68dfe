//! Persistent configuration storage.
//!
//! Settings live in a fixed 7-byte record at a fixed offset of a
//! byte-addressable memory, protected by a magic byte and a CRC-8
//! (Dallas/Maxim) checksum:
//!
//! | offset | field |
//! |---|---|
//! | 0 | magic (`0x61`) |
//! | 1 | input AGC enabled |
//! | 2 | input level, raw gain `0..=255` |
//! | 3 | input path |
//! | 4 | output level, raw gain `0..=255` |
//! | 5 | output path |
//! | 6 | CRC-8 of bytes 0..6 |
//!
//! A record is read once at startup and written only on the remote
//! save-configuration command.

use crc::{CRC_8_MAXIM_DOW, Crc};

use crate::types::{InputPath, OutputPath};

/// Magic byte marking a settings record.
const MAGIC: u8 = 0x61;

/// Size of the persisted record in bytes.
pub const SETTINGS_LEN: usize = 7;

/// Programmed block size; the record is padded to a full page.
const PAGE_SIZE: usize = 256;

const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_MAXIM_DOW);

/// Byte-addressable storage holding the settings record.
///
/// Mirrors a flash-style interface: position, stream read/write and
/// sector erase. Sectors must be erased before they are programmed.
pub trait ConfigMemory {
    /// Storage error type. The core never inspects it.
    type Error;

    /// Sets the read/write position.
    fn set_position(&mut self, offset: u32) -> Result<(), Self::Error>;

    /// Reads `buffer.len()` bytes from the current position.
    fn read(&mut self, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Writes the buffer at the current position.
    fn write(&mut self, buffer: &[u8]) -> Result<(), Self::Error>;

    /// Erases the sector containing `offset`.
    fn erase_sector(&mut self, offset: u32) -> Result<(), Self::Error>;
}

/// A validated settings record.
///
/// Magic and checksum are not stored here; they are produced by [`save`]
/// and verified by [`load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SettingsRecord {
    /// Automatic input gain control enabled.
    pub input_agc: bool,
    /// Raw input gain, `0..=255`.
    pub input_level: u8,
    /// Persisted input route.
    pub input_path: InputPath,
    /// Raw output gain, `0..=255`.
    pub output_level: u8,
    /// Persisted output route.
    pub output_path: OutputPath,
}

impl SettingsRecord {
    /// Encodes the record with magic and checksum.
    pub fn encode(&self) -> [u8; SETTINGS_LEN] {
        let mut bytes = [0u8; SETTINGS_LEN];
        bytes[0] = MAGIC;
        bytes[1] = self.input_agc as u8;
        bytes[2] = self.input_level;
        bytes[3] = self.input_path.to_raw();
        bytes[4] = self.output_level;
        bytes[5] = self.output_path.to_raw();
        bytes[SETTINGS_LEN - 1] = CRC8.checksum(&bytes[..SETTINGS_LEN - 1]);
        bytes
    }

    /// Decodes and validates a stored record.
    ///
    /// Returns `None` on magic or checksum mismatch. Undefined path bytes
    /// decode to the disconnected route rather than failing validation.
    pub fn decode(bytes: &[u8; SETTINGS_LEN]) -> Option<Self> {
        if bytes[0] != MAGIC {
            return None;
        }
        if bytes[SETTINGS_LEN - 1] != CRC8.checksum(&bytes[..SETTINGS_LEN - 1]) {
            return None;
        }

        Some(Self {
            input_agc: bytes[1] != 0,
            input_level: bytes[2],
            input_path: InputPath::from_raw(bytes[3]),
            output_level: bytes[4],
            output_path: OutputPath::from_raw(bytes[5]),
        })
    }
}

/// Loads the settings record stored at `offset`.
///
/// Returns `None` if the memory cannot be read or the record fails
/// validation; the caller falls back to compiled-in defaults. A record is
/// never partially applied.
pub fn load<M: ConfigMemory>(memory: &mut M, offset: u32) -> Option<SettingsRecord> {
    let mut buffer = [0u8; SETTINGS_LEN];

    memory.set_position(offset).ok()?;
    memory.read(&mut buffer).ok()?;

    SettingsRecord::decode(&buffer)
}

/// Stores the settings record at `offset`.
///
/// Erases the containing sector, then programs a full page padded with
/// `0xFF`. Storage failures are deliberately discarded: there is no way to
/// report them to the remote master, and the next load falls back to
/// defaults if the write did not stick.
pub fn save<M: ConfigMemory>(memory: &mut M, offset: u32, record: &SettingsRecord) {
    let mut buffer = [0xFFu8; PAGE_SIZE];
    buffer[..SETTINGS_LEN].copy_from_slice(&record.encode());

    if memory.erase_sector(offset).is_err() {
        return;
    }
    if memory.set_position(offset).is_err() {
        return;
    }
    let _ = memory.write(&buffer);
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;
    use std::vec;
    use std::vec::Vec;

    /// RAM-backed memory recording erase calls.
    struct MockMemory {
        data: Vec<u8>,
        position: usize,
        erased: Vec<u32>,
        fail_reads: bool,
    }

    impl MockMemory {
        fn new(size: usize) -> Self {
            Self {
                data: vec![0xFF; size],
                position: 0,
                erased: Vec::new(),
                fail_reads: false,
            }
        }
    }

    impl ConfigMemory for MockMemory {
        type Error = ();

        fn set_position(&mut self, offset: u32) -> Result<(), ()> {
            if offset as usize >= self.data.len() {
                return Err(());
            }
            self.position = offset as usize;
            Ok(())
        }

        fn read(&mut self, buffer: &mut [u8]) -> Result<(), ()> {
            if self.fail_reads || self.position + buffer.len() > self.data.len() {
                return Err(());
            }
            buffer.copy_from_slice(&self.data[self.position..self.position + buffer.len()]);
            self.position += buffer.len();
            Ok(())
        }

        fn write(&mut self, buffer: &[u8]) -> Result<(), ()> {
            if self.position + buffer.len() > self.data.len() {
                return Err(());
            }
            self.data[self.position..self.position + buffer.len()].copy_from_slice(buffer);
            self.position += buffer.len();
            Ok(())
        }

        fn erase_sector(&mut self, offset: u32) -> Result<(), ()> {
            self.erased.push(offset);
            Ok(())
        }
    }

    fn sample_record() -> SettingsRecord {
        SettingsRecord {
            input_agc: true,
            input_level: 109,
            input_path: InputPath::Microphone,
            output_level: 255,
            output_path: OutputPath::LineOut,
        }
    }

    #[test]
    fn saved_record_loads_back_exactly() {
        let mut memory = MockMemory::new(1024);
        let record = sample_record();

        save(&mut memory, 256, &record);
        assert_eq!(load(&mut memory, 256), Some(record));
        assert_eq!(memory.erased, vec![256]);
    }

    #[test]
    fn save_pads_the_page_with_fill_bytes() {
        let mut memory = MockMemory::new(1024);
        save(&mut memory, 0, &sample_record());

        assert!(memory.data[SETTINGS_LEN..PAGE_SIZE].iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn any_corrupted_byte_invalidates_the_record() {
        let record = sample_record();
        let reference = record.encode();

        for index in 0..SETTINGS_LEN {
            let mut memory = MockMemory::new(1024);
            save(&mut memory, 0, &record);
            memory.data[index] ^= 0x01;
            assert_eq!(load(&mut memory, 0), None, "byte {index} corruption missed");

            // The pristine copy still decodes.
            assert!(SettingsRecord::decode(&reference).is_some());
        }
    }

    #[test]
    fn erased_memory_fails_validation() {
        let mut memory = MockMemory::new(1024);
        assert_eq!(load(&mut memory, 0), None);
    }

    #[test]
    fn read_failure_reports_no_record() {
        let mut memory = MockMemory::new(1024);
        save(&mut memory, 0, &sample_record());
        memory.fail_reads = true;
        assert_eq!(load(&mut memory, 0), None);
    }

    #[test]
    fn out_of_range_offset_reports_no_record() {
        let mut memory = MockMemory::new(64);
        assert_eq!(load(&mut memory, 4096), None);
    }

    #[test]
    fn undefined_paths_decode_to_disconnected() {
        let mut bytes = sample_record().encode();
        bytes[3] = 0x07;
        bytes[SETTINGS_LEN - 1] = CRC8.checksum(&bytes[..SETTINGS_LEN - 1]);

        let record = SettingsRecord::decode(&bytes).unwrap();
        assert_eq!(record.input_path, InputPath::None);
    }
}
