//! RC4 stream cipher used to wrap secrets stored in the job config.
//!
//! RC4 is symmetric: applying the keystream twice with the same key yields
//! the input, so [`Rc4::apply`] both encrypts and decrypts.

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Keyed RC4 state (KSA already applied).
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Rc4 {
    state: [u8; 256],
    i: u8,
    j: u8,
}

impl Rc4 {
    /// Run the key-scheduling algorithm. Returns `None` for an empty key.
    pub fn new(key: &[u8]) -> Option<Self> {
        if key.is_empty() {
            return None;
        }
        let mut state: [u8; 256] = std::array::from_fn(|i| i as u8);
        let mut j: u8 = 0;
        for i in 0..256 {
            j = j
                .wrapping_add(state[i])
                .wrapping_add(key[i % key.len()]);
            state.swap(i, j as usize);
        }
        Some(Self { state, i: 0, j: 0 })
    }

    /// XOR `data` in place with the next bytes of the keystream.
    pub fn apply_in_place(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            self.i = self.i.wrapping_add(1);
            self.j = self.j.wrapping_add(self.state[self.i as usize]);
            self.state.swap(self.i as usize, self.j as usize);
            let idx = self.state[self.i as usize].wrapping_add(self.state[self.j as usize]);
            *byte ^= self.state[idx as usize];
        }
    }

    /// One-shot helper: fresh keystream over a copy of `data`.
    pub fn apply(key: &[u8], data: &[u8]) -> Option<Vec<u8>> {
        let mut cipher = Self::new(key)?;
        let mut out = data.to_vec();
        cipher.apply_in_place(&mut out);
        Some(out)
    }
}

/// Map each byte to the code point of the same value (U+0000..=U+00FF).
///
/// Decrypted secrets are treated as Latin-1 text, never as UTF-8.
pub fn bytes_to_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Inverse of [`bytes_to_latin1`]. Returns `None` if any character is above
/// U+00FF.
pub fn latin1_to_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Published RC4 test vectors.
    #[test]
    fn known_vector_key_plaintext() {
        let out = Rc4::apply(b"Key", b"Plaintext").unwrap();
        assert_eq!(hex::encode(out), "bbf316e8d940af0ad3");
    }

    #[test]
    fn known_vector_wiki_pedia() {
        let out = Rc4::apply(b"Wiki", b"pedia").unwrap();
        assert_eq!(hex::encode(out), "1021bf0420");
    }

    #[test]
    fn known_vector_secret() {
        let out = Rc4::apply(b"Secret", b"Attack at dawn").unwrap();
        assert_eq!(hex::encode(out), "45a01f645fc35b383552544b9bf5");
    }

    #[test]
    fn apply_twice_is_identity() {
        let plain = b"opening hours 09:00 - 17:00";
        let sealed = Rc4::apply(b"k3y", plain).unwrap();
        assert_ne!(sealed.as_slice(), plain.as_slice());
        assert_eq!(Rc4::apply(b"k3y", &sealed).unwrap(), plain);
    }

    #[test]
    fn streaming_matches_one_shot() {
        let mut cipher = Rc4::new(b"stream").unwrap();
        let mut head = b"hello ".to_vec();
        let mut tail = b"world".to_vec();
        cipher.apply_in_place(&mut head);
        cipher.apply_in_place(&mut tail);
        head.extend(tail);
        assert_eq!(head, Rc4::apply(b"stream", b"hello world").unwrap());
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(Rc4::new(b"").is_none());
    }

    #[test]
    fn latin1_mapping_is_bytewise() {
        let text = bytes_to_latin1(&[0x41, 0xE9, 0xFF]);
        assert_eq!(text, "A\u{e9}\u{ff}");
        assert_eq!(text.chars().count(), 3);
        assert_eq!(latin1_to_bytes(&text).unwrap(), vec![0x41, 0xE9, 0xFF]);
        assert!(latin1_to_bytes("\u{20ac}").is_none());
    }
}
