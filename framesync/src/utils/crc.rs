//! CRC validation for frame headers.
//!
//! MPEG audio frames with the protection bit cleared carry a CRC-16 over the
//! last two header bytes and the Layer III side information.

/// CRC parameters: polynomial and initial value.
pub struct Algorithm<T> {
    poly: T,
    init: T,
}

/// CRC-16 used by MPEG audio frame protection (CRC-16/CMS parameters).
pub const CRC_MPEG_AUDIO_ALG: Algorithm<u16> = Algorithm {
    poly: 0x8005,
    init: 0xFFFF,
};

/// Computes CRC-16 checksum of a single byte value using specified polynomial.
#[inline(always)]
pub const fn crc16(poly: u16, mut value: u16, len: usize) -> u16 {
    value <<= 8;

    let mut i = 0;
    while i < len {
        value = (value << 1) ^ (((value >> 15) & 1) * poly);
        i += 1;
    }

    value
}

#[inline(always)]
const fn crc16_table(poly: u16) -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < table.len() {
        table[i] = crc16(poly, i as u16, 8);
        i += 1;
    }

    table
}

#[derive(Debug)]
pub struct Crc16 {
    pub poly: u16,
    pub init: u16,
    table: [u16; 256],
}

impl Crc16 {
    pub const fn new(algorithm: &Algorithm<u16>) -> Self {
        Self {
            poly: algorithm.poly,
            init: algorithm.init,
            table: crc16_table(algorithm.poly),
        }
    }

    #[inline(always)]
    pub const fn update(&self, mut crc: u16, bytes: &[u8]) -> u16 {
        let mut i = 0;

        while i < bytes.len() {
            let index = ((crc >> 8) as u8 ^ bytes[i]) as usize;
            crc = (crc << 8) ^ self.table[index];
            i += 1;
        }

        crc
    }

    #[inline(always)]
    pub const fn checksum(&self, bytes: &[u8]) -> u16 {
        self.update(self.init, bytes)
    }
}

pub static CRC_MPEG_AUDIO: Crc16 = Crc16::new(&CRC_MPEG_AUDIO_ALG);

#[test]
fn crc16_check_value() {
    assert_eq!(CRC_MPEG_AUDIO.checksum(b"123456789"), 0xAEE7);
}

#[test]
fn crc16_is_incremental() {
    let whole = CRC_MPEG_AUDIO.checksum(b"framesync");
    let first = CRC_MPEG_AUDIO.checksum(b"frame");
    assert_eq!(CRC_MPEG_AUDIO.update(first, b"sync"), whole);
}
