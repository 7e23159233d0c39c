//! n-fold (RFC 3961 section 5.1)
//!
//! Stretches or shrinks an input to `n` bytes. The input is repeated until
//! the total length is the least common multiple of both lengths, with each
//! repetition rotated right by 13 more bits than the one before. The result
//! is cut into `n`-byte chunks which are summed with ones'-complement
//! (end-around carry) addition.
//!
//! ```text
//! input ─► [copy 0][copy 0 >>> 13][copy 0 >>> 26] ...   (lcm bytes)
//!           └──n──┘└──n──┘└──n──┘ ...
//!              ⊕ ones'-complement sum ──► output (n bytes)
//! ```

/// Fold `input` into `out`, filling all of `out`.
///
/// An empty input folds to all zeros.
pub fn nfold(input: &[u8], out: &mut [u8]) {
    out.fill(0);
    let in_len = input.len();
    let n = out.len();
    if in_len == 0 || n == 0 {
        return;
    }

    let total = lcm(in_len, n);
    let in_bits = in_len * 8;
    let mut chunk_start = 0;
    while chunk_start < total {
        let mut carry = 0u32;
        for i in (0..n).rev() {
            let pos = chunk_start + i;
            let copy = pos / in_len;
            let byte = rotated_byte(input, (13 * copy) % in_bits, pos % in_len);
            let sum = u32::from(out[i]) + u32::from(byte) + carry;
            out[i] = sum as u8;
            carry = sum >> 8;
        }
        while carry != 0 {
            for b in out.iter_mut().rev() {
                let sum = u32::from(*b) + carry;
                *b = sum as u8;
                carry = sum >> 8;
                if carry == 0 {
                    break;
                }
            }
        }
        chunk_start += n;
    }
}

/// Byte `index` of `input` rotated right by `shift` bits.
fn rotated_byte(input: &[u8], shift: usize, index: usize) -> u8 {
    let bits = input.len() * 8;
    let mut out = 0u8;
    for k in 0..8 {
        let src = (index * 8 + k + bits - shift) % bits;
        let bit = (input[src / 8] >> (7 - src % 8)) & 1;
        out |= bit << (7 - k);
    }
    out
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

fn lcm(a: usize, b: usize) -> usize {
    a / gcd(a, b) * b
}
