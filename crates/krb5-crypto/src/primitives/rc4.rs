//! RC4 keystream (KSA + PRGA)

use zeroize::{Zeroize, ZeroizeOnDrop};

pub(crate) struct Rc4 {
    s: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// `key` must be non-empty. Every caller passes a 16-byte HMAC output.
    pub(crate) fn new(key: &[u8]) -> Self {
        let mut s = [0u8; 256];
        for (i, v) in s.iter_mut().enumerate() {
            *v = i as u8;
        }
        let mut j: u8 = 0;
        for i in 0..256usize {
            j = j.wrapping_add(s[i]).wrapping_add(key[i % key.len()]);
            s.swap(i, usize::from(j));
        }
        Self { s, i: 0, j: 0 }
    }

    pub(crate) fn apply_keystream(&mut self, data: &mut [u8]) {
        for b in data {
            self.i = self.i.wrapping_add(1);
            let i = usize::from(self.i);
            self.j = self.j.wrapping_add(self.s[i]);
            let j = usize::from(self.j);
            self.s.swap(i, j);
            let idx = self.s[i].wrapping_add(self.s[j]);
            *b ^= self.s[usize::from(idx)];
        }
    }
}

impl Drop for Rc4 {
    fn drop(&mut self) {
        self.s.zeroize();
        self.i = 0;
        self.j = 0;
    }
}

impl ZeroizeOnDrop for Rc4 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keystream() {
        // Key "Key", plaintext "Plaintext"
        let mut data = *b"Plaintext";
        Rc4::new(b"Key").apply_keystream(&mut data);
        assert_eq!(data, [0xBB, 0xF3, 0x16, 0xE8, 0xD9, 0x40, 0xAF, 0x0A, 0xD3]);
    }

    #[test]
    fn keystream_continues_across_calls() {
        let mut whole = [0u8; 32];
        Rc4::new(b"Secret").apply_keystream(&mut whole);

        let mut split = [0u8; 32];
        let mut rc4 = Rc4::new(b"Secret");
        rc4.apply_keystream(&mut split[..5]);
        rc4.apply_keystream(&mut split[5..]);
        assert_eq!(whole, split);
    }
}
