//! CRC-32 as used by `des-cbc-crc`
//!
//! Same polynomial and reflection as the common CRC-32, but the register
//! starts at zero and is not complemented at the end. The result goes on the
//! wire little-endian.

const CRC32_TABLE: [u32; 256] = generate_crc32_table();

const fn generate_crc32_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB8_8320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

pub(crate) fn crc32(data: &[u8]) -> [u8; 4] {
    let mut crc = 0u32;
    for &byte in data {
        let index = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[index];
    }
    crc.to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(crc32(b"foo"), [0x33, 0xBC, 0x32, 0x73]);
        assert_eq!(crc32(b"test0123456789"), [0xD6, 0x88, 0x3E, 0xB8]);
        assert_eq!(crc32(b"MASSACHVSETTS INSTITVTE OF TECHNOLOGY"), [0xF7, 0x80, 0x41, 0xE3]);
        assert_eq!(crc32(b""), [0, 0, 0, 0]);
    }
}
