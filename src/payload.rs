//! Deterministic random payload generation.

use std::io;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

/// One megabyte, the unit all size arguments are given in.
pub const MEGA: u64 = 1024 * 1024;

/// Randomized contents of a generated file.
///
/// Reconstructing a payload with the same seed yields identical bytes, so a
/// payload can cross a process boundary as a `(len, seed)` pair.
#[derive(Debug, Clone)]
pub struct Payload {
    len: u64,
    rng: SmallRng,
}

impl Payload {
    /// Creates a payload of `len` random bytes, derived from `seed`.
    pub fn new(len: u64, seed: u64) -> Self {
        Self {
            len,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Remaining length of the payload in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the payload has been fully consumed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Materializes the remaining payload into a single buffer.
    pub fn into_bytes(mut self) -> Vec<u8> {
        let mut buf = vec![0; self.len as usize];
        self.rng.fill_bytes(&mut buf);
        self.len = 0;
        buf
    }
}

impl io::Read for Payload {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len_to_fill = (buf.len() as u64).min(self.len) as usize;

        let fill_buf = &mut buf[..len_to_fill];
        self.rng.fill_bytes(fill_buf);

        self.len -= len_to_fill as u64;
        Ok(len_to_fill)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn reader_yields_exactly_len_bytes() {
        let mut payload = Payload::new(100_000, 7);
        let mut contents = Vec::new();
        payload.read_to_end(&mut contents).unwrap();

        assert_eq!(contents.len(), 100_000);
        assert!(payload.is_empty());
    }

    #[test]
    fn same_seed_same_bytes() {
        let via_reader = {
            let mut contents = Vec::new();
            Payload::new(4096, 99).read_to_end(&mut contents).unwrap();
            contents
        };
        let via_buffer = Payload::new(4096, 99).into_bytes();

        assert_eq!(via_reader, via_buffer);
        assert_ne!(via_buffer, Payload::new(4096, 100).into_bytes());
    }
}
