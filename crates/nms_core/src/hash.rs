//! Field name obfuscation used by the save format.
//!
//! Every canonical field name is stored in a save as a 3-character code derived
//! from the low 64 bits of a seeded SpookyHash V2 (128-bit) of the name. The
//! digit-to-character mapping skips the six ASCII symbols between `Z` and `a`,
//! so the alphabet is `0-9 : ; < = > ? @ A-Z a-y`.

pub const SEED: u64 = 8_268_756_125_562_466_087;
pub const ALPHABET_LEN: u64 = 68;
pub const CODE_LEN: usize = 3;

const DIGIT_BASE: u8 = b'0';
const DIGIT_GAP_START: u8 = b'Z';
const DIGIT_GAP_WIDTH: u8 = 6;
const DIGIT_SHIFTS: [u32; CODE_LEN] = [0, 21, 42];

/// Computes the 3-character code for a canonical field name.
pub fn hash(name: &str) -> String {
    let (low, _high) = spooky::hash128(name.as_bytes(), SEED, SEED);
    DIGIT_SHIFTS
        .iter()
        .map(|&shift| digit_char(((low >> shift) % ALPHABET_LEN) as u8))
        .collect()
}

/// Returns true when `s` has the shape of a code: exactly three characters from
/// the code alphabet.
pub fn is_code(s: &str) -> bool {
    s.len() == CODE_LEN && s.bytes().all(is_code_char)
}

fn digit_char(digit: u8) -> char {
    let a = digit + DIGIT_BASE;
    if a <= DIGIT_GAP_START {
        a as char
    } else {
        (a + DIGIT_GAP_WIDTH) as char
    }
}

fn is_code_char(b: u8) -> bool {
    let first = DIGIT_BASE;
    let last = (ALPHABET_LEN as u8 - 1) + DIGIT_BASE + DIGIT_GAP_WIDTH;
    (first..=DIGIT_GAP_START).contains(&b)
        || (DIGIT_GAP_START + DIGIT_GAP_WIDTH + 1..=last).contains(&b)
}

/// Bob Jenkins' SpookyHash V2, 128-bit variant, little-endian word loads.
mod spooky {
    const NUM_VARS: usize = 12;
    const BLOCK_SIZE: usize = NUM_VARS * 8;
    const BUF_SIZE: usize = 2 * BLOCK_SIZE;
    const SC_CONST: u64 = 0xdead_beef_dead_beef;

    pub fn hash128(message: &[u8], seed1: u64, seed2: u64) -> (u64, u64) {
        if message.len() < BUF_SIZE {
            return short(message, seed1, seed2);
        }

        let mut h = [0u64; NUM_VARS];
        for i in (0..NUM_VARS).step_by(3) {
            h[i] = seed1;
            h[i + 1] = seed2;
            h[i + 2] = SC_CONST;
        }

        let mut blocks = message.chunks_exact(BLOCK_SIZE);
        let mut data = [0u64; NUM_VARS];
        for block in &mut blocks {
            load_words(block, &mut data);
            mix(&data, &mut h);
        }

        let tail = blocks.remainder();
        let mut buf = [0u8; BLOCK_SIZE];
        buf[..tail.len()].copy_from_slice(tail);
        buf[BLOCK_SIZE - 1] = tail.len() as u8;
        load_words(&buf, &mut data);
        end(&data, &mut h);

        (h[0], h[1])
    }

    fn short(message: &[u8], seed1: u64, seed2: u64) -> (u64, u64) {
        let length = message.len();
        let mut h = [seed1, seed2, SC_CONST, SC_CONST];
        let mut rest = message;

        if length > 15 {
            let mut chunks = rest.chunks_exact(32);
            for chunk in &mut chunks {
                h[2] = h[2].wrapping_add(word(&chunk[0..8]));
                h[3] = h[3].wrapping_add(word(&chunk[8..16]));
                short_mix(&mut h);
                h[0] = h[0].wrapping_add(word(&chunk[16..24]));
                h[1] = h[1].wrapping_add(word(&chunk[24..32]));
            }
            rest = chunks.remainder();

            if rest.len() >= 16 {
                h[2] = h[2].wrapping_add(word(&rest[0..8]));
                h[3] = h[3].wrapping_add(word(&rest[8..16]));
                short_mix(&mut h);
                rest = &rest[16..];
            }
        }

        h[3] = h[3].wrapping_add((length as u64) << 56);
        match rest.len() {
            0 => {
                h[2] = h[2].wrapping_add(SC_CONST);
                h[3] = h[3].wrapping_add(SC_CONST);
            }
            1..=7 => {
                h[2] = h[2].wrapping_add(partial_word(rest));
            }
            _ => {
                h[2] = h[2].wrapping_add(word(&rest[0..8]));
                h[3] = h[3].wrapping_add(partial_word(&rest[8..]));
            }
        }

        short_end(&mut h);
        (h[0], h[1])
    }

    fn word(bytes: &[u8]) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        u64::from_le_bytes(raw)
    }

    fn partial_word(bytes: &[u8]) -> u64 {
        let mut raw = [0u8; 8];
        raw[..bytes.len()].copy_from_slice(bytes);
        u64::from_le_bytes(raw)
    }

    fn load_words(block: &[u8], out: &mut [u64; NUM_VARS]) {
        for (slot, chunk) in out.iter_mut().zip(block.chunks_exact(8)) {
            *slot = word(chunk);
        }
    }

    fn mix(data: &[u64; NUM_VARS], s: &mut [u64; NUM_VARS]) {
        const ROT: [u32; NUM_VARS] = [11, 32, 43, 31, 17, 28, 39, 57, 55, 54, 22, 46];
        for i in 0..NUM_VARS {
            let a = (i + 2) % NUM_VARS;
            let b = (i + 10) % NUM_VARS;
            let c = (i + 11) % NUM_VARS;
            let d = (i + 1) % NUM_VARS;
            s[i] = s[i].wrapping_add(data[i]);
            s[a] ^= s[b];
            s[c] ^= s[i];
            s[i] = s[i].rotate_left(ROT[i]);
            s[c] = s[c].wrapping_add(s[d]);
        }
    }

    fn end_partial(h: &mut [u64; NUM_VARS]) {
        const ROT: [u32; NUM_VARS] = [44, 15, 34, 21, 38, 33, 10, 13, 38, 53, 42, 54];
        for i in 0..NUM_VARS {
            let a = (i + 11) % NUM_VARS;
            let b = (i + 1) % NUM_VARS;
            let c = (i + 2) % NUM_VARS;
            h[a] = h[a].wrapping_add(h[b]);
            h[c] ^= h[a];
            h[b] = h[b].rotate_left(ROT[i]);
        }
    }

    fn end(data: &[u64; NUM_VARS], h: &mut [u64; NUM_VARS]) {
        for (slot, value) in h.iter_mut().zip(data) {
            *slot = slot.wrapping_add(*value);
        }
        end_partial(h);
        end_partial(h);
        end_partial(h);
    }

    fn short_mix(h: &mut [u64; 4]) {
        const ROT: [u32; 12] = [50, 52, 30, 41, 54, 48, 38, 37, 62, 34, 5, 36];
        for (i, &r) in ROT.iter().enumerate() {
            let x = (i + 2) % 4;
            let y = (i + 3) % 4;
            let z = i % 4;
            h[x] = h[x].rotate_left(r);
            h[x] = h[x].wrapping_add(h[y]);
            h[z] ^= h[x];
        }
    }

    fn short_end(h: &mut [u64; 4]) {
        const ROT: [u32; 11] = [15, 52, 26, 51, 28, 9, 47, 54, 32, 25, 63];
        for (i, &r) in ROT.iter().enumerate() {
            let a = (i + 3) % 4;
            let b = (i + 2) % 4;
            h[a] ^= h[b];
            h[b] = h[b].rotate_left(r);
            h[a] = h[a].wrapping_add(h[b]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_mapping_skips_gap_after_z() {
        assert_eq!(digit_char(0), '0');
        assert_eq!(digit_char(10), ':');
        assert_eq!(digit_char(16), '@');
        assert_eq!(digit_char(42), 'Z');
        assert_eq!(digit_char(43), 'a');
        assert_eq!(digit_char(67), 'y');
    }

    #[test]
    fn every_digit_is_a_code_char() {
        for d in 0..ALPHABET_LEN as u8 {
            assert!(is_code_char(digit_char(d) as u8), "digit {d}");
        }
        for b in [b'[', b'\\', b'_', b'`', b'z', b'/', b'{'] {
            assert!(!is_code_char(b), "byte {b}");
        }
    }

    #[test]
    fn long_input_takes_block_path() {
        let long = "x".repeat(500);
        let a = spooky::hash128(long.as_bytes(), SEED, SEED);
        let b = spooky::hash128(long.as_bytes(), SEED, SEED);
        assert_eq!(a, b);
        assert_ne!(a, spooky::hash128(&long.as_bytes()[..499], SEED, SEED));
    }
}
