//! Mock non-volatile storage implementation for testing

use crate::platform::{
    Result,
    error::{NvramError, PlatformError},
    traits::NvramInterface,
};
use core::cell::RefCell;
use std::vec::Vec;

/// Region size (a small external EEPROM page)
const NVRAM_CAPACITY: u32 = 256;

/// Mock NVRAM implementation
///
/// Simulates the persistent counter region in memory. Fresh storage
/// reads as 0xFF, the erased state, so tests cover the sanitization
/// path for never-written devices.
#[derive(Debug)]
pub struct MockNvram {
    storage: RefCell<Vec<u8>>,
    write_count: u32,
}

impl MockNvram {
    /// Create a new mock region in the erased state
    pub fn new() -> Self {
        let mut storage = Vec::new();
        storage.resize(NVRAM_CAPACITY as usize, 0xFF);
        Self {
            storage: RefCell::new(storage),
            write_count: 0,
        }
    }

    /// Create a mock region pre-seeded with `data` at offset 0
    pub fn with_contents(data: &[u8]) -> Self {
        let nvram = Self::new();
        nvram.storage.borrow_mut()[..data.len()].copy_from_slice(data);
        nvram
    }

    /// Raw region contents (for test verification)
    pub fn contents(&self, offset: u32, len: usize) -> Vec<u8> {
        let storage = self.storage.borrow();
        storage[offset as usize..offset as usize + len].to_vec()
    }

    /// Number of write calls performed (for test verification)
    pub fn write_count(&self) -> u32 {
        self.write_count
    }
}

impl Default for MockNvram {
    fn default() -> Self {
        Self::new()
    }
}

impl NvramInterface for MockNvram {
    fn read(&mut self, offset: u32, buffer: &mut [u8]) -> Result<()> {
        let end = offset as usize + buffer.len();
        let storage = self.storage.borrow();
        if end > storage.len() {
            return Err(PlatformError::Nvram(NvramError::OutOfBounds));
        }
        buffer.copy_from_slice(&storage[offset as usize..end]);
        Ok(())
    }

    fn write(&mut self, offset: u32, data: &[u8]) -> Result<()> {
        let end = offset as usize + data.len();
        let mut storage = self.storage.borrow_mut();
        if end > storage.len() {
            return Err(PlatformError::Nvram(NvramError::OutOfBounds));
        }
        storage[offset as usize..end].copy_from_slice(data);
        self.write_count += 1;
        Ok(())
    }

    fn capacity(&self) -> u32 {
        NVRAM_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_region_reads_erased() {
        let mut nvram = MockNvram::new();
        let mut buf = [0u8; 4];
        nvram.read(0, &mut buf).unwrap();
        assert_eq!(buf, [0xFF; 4]);
    }

    #[test]
    fn test_write_then_read_roundtrip() {
        let mut nvram = MockNvram::new();
        nvram.write(8, &[1, 2, 3, 4]).unwrap();

        let mut buf = [0u8; 4];
        nvram.read(8, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(nvram.write_count(), 1);
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut nvram = MockNvram::new();
        let err = nvram.write(NVRAM_CAPACITY - 2, &[0; 4]);
        assert_eq!(err, Err(PlatformError::Nvram(NvramError::OutOfBounds)));
    }
}
