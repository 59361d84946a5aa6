use super::*;

/// Share target for pool difficulty 1: `0xFFFF << 192`.
pub static DIFFICULTY_1_TARGET: LazyLock<U256> = LazyLock::new(|| U256::from(0xFFFFu64) << 192);

/// A share target as eight big-endian u32 words, word 0 most significant.
/// Digests are compared in block-hash display order (byte-reversed), so word
/// 0 of a digest is the byte-swapped final word of the raw SHA-256 state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShareTarget([u32; 8]);

impl ShareTarget {
    /// Everything is a share. Used by tests and the bench subcommand.
    pub const ALL_ONES: Self = Self([u32::MAX; 8]);

    /// Nothing is a share.
    pub const ALL_ZEROS: Self = Self([0; 8]);

    pub fn from_words(words: [u32; 8]) -> Self {
        Self(words)
    }

    pub fn word(&self, index: usize) -> u32 {
        self.0[index]
    }

    /// True when the digest, read in display order, is numerically at or
    /// below the target. Ties count as valid shares.
    pub fn is_met_by(&self, digest: &[u8; 32]) -> bool {
        let mut reversed = *digest;
        reversed.reverse();

        for (i, chunk) in reversed.chunks_exact(4).enumerate() {
            let word = BigEndian::read_u32(chunk);
            if word < self.0[i] {
                return true;
            }
            if word > self.0[i] {
                return false;
            }
        }

        true
    }

    /// Same comparison over the raw final state words of the second
    /// compression, saving the kernel a serialisation round-trip.
    pub(crate) fn is_met_by_state(&self, state: &[u32; 8]) -> bool {
        for i in 0..8 {
            let word = state[7 - i].swap_bytes();
            if word < self.0[i] {
                return true;
            }
            if word > self.0[i] {
                return false;
            }
        }

        true
    }
}

impl From<Difficulty> for ShareTarget {
    fn from(difficulty: Difficulty) -> Self {
        let target = *DIFFICULTY_1_TARGET / U256::from(difficulty.value());

        let bytes = target.to_big_endian();
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = BigEndian::read_u32(chunk);
        }

        Self(words)
    }
}

impl fmt::Display for ShareTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.0 {
            write!(f, "{word:08x}")?;
        }
        Ok(())
    }
}
