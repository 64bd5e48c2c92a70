//! Persisted device statistics
//!
//! Three counters survive power cycles in a small NVRAM region: messages
//! sent, errors logged, and maximum observed speed. Layout is three
//! little-endian u32 fields at fixed offsets. The loader never trusts
//! persisted data: values above the sanity ceilings (including the 0xFF
//! erased pattern of fresh storage) reset to zero.

use crate::platform::{NvramInterface, Result};

/// Field offsets inside the NVRAM region
const OFFSET_MESSAGES_SENT: u32 = 0;
const OFFSET_ERROR_COUNT: u32 = 4;
const OFFSET_MAX_SPEED: u32 = 8;

/// Counter sanity ceiling; anything above this is treated as corrupt
pub const MAX_SANE_COUNT: u32 = 1_000_000;

/// Max-speed sanity ceiling in tenths of km/h (200.0 km/h)
pub const MAX_SANE_SPEED_TENTHS: u32 = 2000;

/// Device statistics
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Statistics {
    /// Successfully submitted messages
    pub messages_sent: u32,
    /// Total error-log appends
    pub error_count: u32,
    /// Highest accepted speed sample in km/h
    pub max_speed_kmh: f32,
}

impl Statistics {
    /// Load statistics from NVRAM, sanitizing each field
    pub fn load<N: NvramInterface>(nvram: &mut N) -> Result<Self> {
        let messages_sent = sanitize(read_u32(nvram, OFFSET_MESSAGES_SENT)?, MAX_SANE_COUNT);
        let error_count = sanitize(read_u32(nvram, OFFSET_ERROR_COUNT)?, MAX_SANE_COUNT);
        let speed_tenths = sanitize(read_u32(nvram, OFFSET_MAX_SPEED)?, MAX_SANE_SPEED_TENTHS);

        Ok(Self {
            messages_sent,
            error_count,
            max_speed_kmh: speed_tenths as f32 / 10.0,
        })
    }

    /// Write statistics back to NVRAM
    pub fn save<N: NvramInterface>(&self, nvram: &mut N) -> Result<()> {
        write_u32(nvram, OFFSET_MESSAGES_SENT, self.messages_sent)?;
        write_u32(nvram, OFFSET_ERROR_COUNT, self.error_count)?;
        // Speed stored in tenths so the field stays integral
        let tenths = (self.max_speed_kmh * 10.0) as u32;
        write_u32(nvram, OFFSET_MAX_SPEED, tenths)
    }

    /// Record a speed sample, keeping the maximum
    pub fn note_speed(&mut self, speed_kmh: f32) {
        if speed_kmh > self.max_speed_kmh {
            self.max_speed_kmh = speed_kmh;
        }
    }
}

fn sanitize(value: u32, ceiling: u32) -> u32 {
    if value > ceiling {
        0
    } else {
        value
    }
}

fn read_u32<N: NvramInterface>(nvram: &mut N, offset: u32) -> Result<u32> {
    let mut buf = [0u8; 4];
    nvram.read(offset, &mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn write_u32<N: NvramInterface>(nvram: &mut N, offset: u32, value: u32) -> Result<()> {
    nvram.write(offset, &value.to_le_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockNvram;

    #[test]
    fn test_load_from_erased_region_resets_all() {
        // Fresh storage reads 0xFFFFFFFF, far above any ceiling
        let mut nvram = MockNvram::new();
        let stats = Statistics::load(&mut nvram).unwrap();
        assert_eq!(stats.messages_sent, 0);
        assert_eq!(stats.error_count, 0);
        assert_eq!(stats.max_speed_kmh, 0.0);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut nvram = MockNvram::new();
        let stats = Statistics {
            messages_sent: 42,
            error_count: 7,
            max_speed_kmh: 88.5,
        };
        stats.save(&mut nvram).unwrap();

        let loaded = Statistics::load(&mut nvram).unwrap();
        assert_eq!(loaded, stats);
    }

    #[test]
    fn test_counter_above_ceiling_resets_to_zero() {
        let mut raw = [0u8; 12];
        raw[..4].copy_from_slice(&(MAX_SANE_COUNT + 1).to_le_bytes());
        raw[4..8].copy_from_slice(&5u32.to_le_bytes());
        raw[8..].copy_from_slice(&500u32.to_le_bytes());

        let mut nvram = MockNvram::with_contents(&raw);
        let stats = Statistics::load(&mut nvram).unwrap();
        assert_eq!(stats.messages_sent, 0);
        assert_eq!(stats.error_count, 5);
        assert_eq!(stats.max_speed_kmh, 50.0);
    }

    #[test]
    fn test_speed_above_ceiling_resets_to_zero() {
        let mut raw = [0u8; 12];
        raw[8..].copy_from_slice(&(MAX_SANE_SPEED_TENTHS + 1).to_le_bytes());

        let mut nvram = MockNvram::with_contents(&raw);
        let stats = Statistics::load(&mut nvram).unwrap();
        assert_eq!(stats.max_speed_kmh, 0.0);
    }

    #[test]
    fn test_note_speed_keeps_maximum() {
        let mut stats = Statistics::default();
        stats.note_speed(60.0);
        stats.note_speed(45.0);
        assert_eq!(stats.max_speed_kmh, 60.0);
    }
}
