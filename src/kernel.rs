use {
    super::*,
    crate::sha256::{IV, K, bsig0, bsig1, ch, maj, round, ssig0, ssig1},
};

/// A nonce-search backend. `SoftwareKernel` is the portable reference; the
/// seam exists so a vectorised or offloaded search can slot in without
/// touching the dispatcher.
pub trait Kernel {
    /// Searches `nonces` in ascending order and returns the first nonce for
    /// which the double SHA-256 of the 80-byte header is at or below the
    /// job's share target, or `None` when the range is exhausted. Pure: no
    /// logging, no I/O.
    fn search(&self, job: &MiningJob, nonces: RangeInclusive<u32>) -> Option<u32>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareKernel;

/// Nonce-independent state hoisted out of the inner loop. The nonce only
/// appears as word 3 of the second header block, so the first three rounds,
/// the message words w16/w17, and everything of round 3 except its w term
/// are constant across a batch.
struct Baked {
    tail_words: [u32; 3],
    w16: u32,
    w17: u32,
    state: [u32; 8],
    t1_partial: u32,
    t2: u32,
}

fn bake(midstate: &[u32; 8], tail: &[u8; 16]) -> Baked {
    let tail_words = [
        BigEndian::read_u32(&tail[0..4]),
        BigEndian::read_u32(&tail[4..8]),
        BigEndian::read_u32(&tail[8..12]),
    ];

    // w9..w14 of this block are zero padding and w15 is the 640-bit length,
    // so the first two expanded words collapse to these terms.
    let w16 = tail_words[0].wrapping_add(ssig0(tail_words[1]));
    let w17 = ssig1(640)
        .wrapping_add(ssig0(tail_words[2]))
        .wrapping_add(tail_words[1]);

    let mut state = *midstate;
    for i in 0..3 {
        round(&mut state, K[i], tail_words[i]);
    }

    let [a, b, c, _, e, f, g, h] = state;
    let t1_partial = h
        .wrapping_add(bsig1(e))
        .wrapping_add(ch(e, f, g))
        .wrapping_add(K[3]);
    let t2 = bsig0(a).wrapping_add(maj(a, b, c));

    Baked {
        tail_words,
        w16,
        w17,
        state,
        t1_partial,
        t2,
    }
}

/// Double compression for one candidate nonce. Returns the raw final state
/// words of the second hash, or `None` when the early-termination filter
/// rejects the candidate before rounds 61..63.
fn double_compress(baked: &Baked, midstate: &[u32; 8], nonce: u32, filter: bool) -> Option<[u32; 8]> {
    let mut w = [0u32; 64];
    w[..3].copy_from_slice(&baked.tail_words);
    w[3] = nonce;
    w[4] = 0x8000_0000;
    w[15] = 640;
    w[16] = baked.w16;
    w[17] = baked.w17;

    // Complete round 3 with the nonce-dependent w term.
    let mut state = baked.state;
    let t1 = baked.t1_partial.wrapping_add(nonce);
    state = [
        t1.wrapping_add(baked.t2),
        state[0],
        state[1],
        state[2],
        state[3].wrapping_add(t1),
        state[4],
        state[5],
        state[6],
    ];

    for i in 4..18 {
        round(&mut state, K[i], w[i]);
    }
    for i in 18..64 {
        w[i] = ssig1(w[i - 2])
            .wrapping_add(w[i - 7])
            .wrapping_add(ssig0(w[i - 15]))
            .wrapping_add(w[i - 16]);
        round(&mut state, K[i], w[i]);
    }

    // The second message is the 32-byte intermediate digest padded to one
    // block: 0x80 at offset 32, zeros, 256-bit length in the final word.
    let mut m = [0u32; 64];
    for i in 0..8 {
        m[i] = midstate[i].wrapping_add(state[i]);
    }
    m[8] = 0x8000_0000;
    m[15] = 256;

    let mut state = IV;
    for i in 0..16 {
        round(&mut state, K[i], m[i]);
    }
    for i in 16..=60 {
        m[i] = ssig1(m[i - 2])
            .wrapping_add(m[i - 7])
            .wrapping_add(ssig0(m[i - 15]))
            .wrapping_add(m[i - 16]);
        round(&mut state, K[i], m[i]);
    }

    // After round 60 the final digest word is already determined:
    // digest[7] = iv7 + h64, and h64 is the current e. A share against any
    // target with a zero leading word needs the low 16 bits clear, which
    // rejects ~99.998% of candidates before the last three rounds.
    if filter && (IV[7].wrapping_add(state[4]) & 0xFFFF) != 0 {
        return None;
    }

    for i in 61..64 {
        m[i] = ssig1(m[i - 2])
            .wrapping_add(m[i - 7])
            .wrapping_add(ssig0(m[i - 15]))
            .wrapping_add(m[i - 16]);
        round(&mut state, K[i], m[i]);
    }

    let mut digest = [0u32; 8];
    for i in 0..8 {
        digest[i] = IV[i].wrapping_add(state[i]);
    }
    Some(digest)
}

fn midstate_words(midstate: &[u8; 32]) -> [u32; 8] {
    let mut words = [0u32; 8];
    for (word, chunk) in words.iter_mut().zip(midstate.chunks_exact(4)) {
        *word = BigEndian::read_u32(chunk);
    }
    words
}

impl Kernel for SoftwareKernel {
    fn search(&self, job: &MiningJob, nonces: RangeInclusive<u32>) -> Option<u32> {
        let midstate = midstate_words(&job.midstate);
        let baked = bake(&midstate, &job.tail);

        // The 16-bit filter is only sound when the target forces the leading
        // display word to zero, which holds for every integer difficulty but
        // not for the permissive targets used in tests and benchmarks.
        let filter = job.target.word(0) == 0;

        for nonce in nonces {
            if let Some(digest) = double_compress(&baked, &midstate, nonce, filter) {
                if job.target.is_met_by_state(&digest) {
                    return Some(nonce);
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    fn job(header: &[u8; 80], target: ShareTarget) -> MiningJob {
        MiningJob {
            midstate: sha256::midstate(header[..64].try_into().unwrap()),
            tail: header[64..].try_into().unwrap(),
            target,
            nonce_start: 0,
            nonce_end: u32::MAX,
            job_id: "1".parse().unwrap(),
            extranonce2: 0,
            ntime: 0.into(),
        }
    }

    fn header_with_nonce(header: &[u8; 80], nonce: u32) -> [u8; 80] {
        let mut out = *header;
        BigEndian::write_u32(&mut out[76..], nonce);
        out
    }

    /// Full double hash and display-order comparison, no shortcuts.
    fn naive(header: &[u8; 80], target: ShareTarget, nonces: RangeInclusive<u32>) -> Option<u32> {
        nonces
            .into_iter()
            .find(|nonce| target.is_met_by(&sha256::double_hash(&header_with_nonce(header, *nonce))))
    }

    fn sample_header() -> [u8; 80] {
        let mut header = [0u8; 80];
        for (i, byte) in header.iter_mut().enumerate() {
            *byte = (i as u32 * 97 + 11) as u8;
        }
        BigEndian::write_u32(&mut header[76..], 0);
        header
    }

    #[test]
    fn single_nonce_ranges_find_their_nonce() {
        let header = sample_header();
        let kernel = SoftwareKernel;

        for nonce in [0u32, 1, 0x7F, 0x8000_0000, u32::MAX] {
            let job = job(&header, ShareTarget::ALL_ONES);
            assert_eq!(kernel.search(&job, nonce..=nonce), Some(nonce));
        }
    }

    #[test]
    fn digest_matches_reference_for_nonce_sweep() {
        let header = sample_header();
        let midstate = midstate_words(&sha256::midstate(header[..64].try_into().unwrap()));
        let baked = bake(&midstate, header[64..].try_into().unwrap());

        for nonce in 0..1024u32 {
            let digest =
                double_compress(&baked, &midstate, nonce, false).expect("filter disabled");

            let mut bytes = [0u8; 32];
            for (chunk, word) in bytes.chunks_exact_mut(4).zip(digest) {
                chunk.copy_from_slice(&word.to_be_bytes());
            }

            assert_eq!(
                bytes,
                sha256::double_hash(&header_with_nonce(&header, nonce)),
                "nonce {nonce}",
            );
        }
    }

    #[test]
    fn finds_first_nonce_under_permissive_target() {
        // With an all-ones target every candidate is a share, so the search
        // must return the start of the range.
        let header = sample_header();
        let kernel = SoftwareKernel;
        let job = job(&header, ShareTarget::ALL_ONES);

        assert_eq!(kernel.search(&job, 0..=10), Some(0));
        assert_eq!(kernel.search(&job, 7..=10), Some(7));
    }

    #[test]
    fn exhausts_under_impossible_target() {
        let header = sample_header();
        let kernel = SoftwareKernel;
        let job = job(&header, ShareTarget::ALL_ZEROS);

        assert_eq!(kernel.search(&job, 0..=255), None);
    }

    #[test]
    fn early_termination_equivalence() {
        let header = sample_header();
        let kernel = SoftwareKernel;

        // Filtered path (word 0 zero) and unfiltered path (word 0 set) must
        // both agree with the naive reference over the same sweep.
        for target in [
            ShareTarget::from_words([0, 0xFFFF_FFFF, u32::MAX, 0, 0, 0, 0, 0]),
            ShareTarget::from_words([0, 0, u32::MAX, u32::MAX, 0, 0, 0, 0]),
            ShareTarget::from_words([1, 0, 0, 0, 0, 0, 0, 0]),
            ShareTarget::ALL_ZEROS,
        ] {
            let job = job(&header, target);
            for start in [0u32, 1000, 4000] {
                let range = start..=start + 999;
                assert_eq!(
                    kernel.search(&job, range.clone()),
                    naive(&header, target, range),
                    "target {target}",
                );
            }
        }
    }

    #[test]
    fn determinism() {
        let header = sample_header();
        let kernel = SoftwareKernel;
        let job = job(
            &header,
            ShareTarget::from_words([0, u32::MAX, 0, 0, 0, 0, 0, 0]),
        );

        let first = kernel.search(&job, 0..=4095);
        for _ in 0..3 {
            assert_eq!(kernel.search(&job, 0..=4095), first);
        }
    }

    #[test]
    fn reconstructs_block_125552() {
        // Mainnet block 125552, the classic worked example. Its nonce slot
        // holds 42a14695, so searching that single candidate with the target
        // set to the block's own hash (ties are shares) must succeed.
        let header: [u8; 80] = hex::decode(
            "01000000\
             81cd02ab7e569e8bcd9317e2fe99f2de44d49ab2b8851ba4a308000000000000\
             e320b6c2fffc8d750423db8b1eb942ae710e951ed797f7affc8892b0f1fc122b\
             c7f5d74d\
             f2b9441a\
             42a14695",
        )
        .unwrap()
        .try_into()
        .unwrap();

        let nonce = 0x42a14695;

        // Display hash 00000000 00000000 1e8d6829 a8a21adc ...
        let target = ShareTarget::from_words([
            0x00000000, 0x00000000, 0x1e8d6829, 0xa8a21adc, 0x5d38d0a4, 0x73b144b6, 0x765798e6,
            0x1f98bd1d,
        ]);

        let kernel = SoftwareKernel;
        let exact = job(&header, target);

        assert_eq!(kernel.search(&exact, nonce..=nonce), Some(nonce));
        assert_eq!(kernel.search(&exact, nonce - 10..=nonce), Some(nonce));

        // One notch below the block's own hash and the share disappears.
        let mut harder = [0u32; 8];
        harder[2] = 0x1e8d6828;
        let below = job(&header, ShareTarget::from_words(harder));
        assert_eq!(kernel.search(&below, nonce..=nonce), None);
    }
}
