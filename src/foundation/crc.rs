//! Reflected CRC-32 (polynomial 0xEDB88320) in the little-endian, no pre/post inversion
//! convention: the caller picks the seed and the state is used as-is.

const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0u32;
    while i < 256 {
        let mut crc = i;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i as usize] = crc;
        i += 1;
    }
    table
};

/// Fold `data` into `crc` without inverting the state on entry or exit.
pub fn crc32_le(crc: u32, data: &[u8]) -> u32 {
    let mut crc = crc;
    for &b in data {
        crc = CRC32_TABLE[((crc ^ u32::from(b)) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc
}

/// Running checksum over a whole frame, fed one composed row at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameCrc(u32);

impl FrameCrc {
    /// Frame checksums always start from a zero seed.
    pub fn new() -> Self {
        Self(0)
    }

    /// Fold the next row's bytes.
    pub fn update(&mut self, row: &[u8]) {
        self.0 = crc32_le(self.0, row);
    }

    /// Checksum of everything folded so far.
    pub fn finish(self) -> u32 {
        self.0
    }
}

impl Default for FrameCrc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/crc.rs"]
mod tests;
