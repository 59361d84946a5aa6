use super::*;

/// Work handed to the kernel: the cached midstate over the constant first 64
/// header bytes, the 16-byte tail whose last four bytes are the nonce slot,
/// and the share target. Immutable once published; workers receive a copy.
#[derive(Debug, Clone, PartialEq)]
pub struct MiningJob {
    pub midstate: [u8; 32],
    pub tail: [u8; 16],
    pub target: ShareTarget,
    pub nonce_start: u32,
    pub nonce_end: u32,
    pub job_id: JobId,
    pub extranonce2: u32,
    pub ntime: Ntime,
}

impl MiningJob {
    /// Derives a job from a `mining.notify`: reassemble the coinbase around
    /// the extranonces, rebuild the merkle root, pack the 80-byte header,
    /// and cache the midstate over its first block.
    pub fn build(
        notify: &Notify,
        extranonce1: &Extranonce,
        extranonce2: u32,
        extranonce2_size: usize,
        difficulty: Difficulty,
    ) -> Result<Self> {
        let coinbase = coinbase(notify, extranonce1, extranonce2, extranonce2_size)?;
        let merkle_root = stratum::merkle_root(&coinbase, &notify.merkle_branches);
        let header = assemble_header(notify, &merkle_root);

        Ok(Self {
            midstate: sha256::midstate(header[..64].try_into().expect("header prefix is 64 bytes")),
            tail: header[64..].try_into().expect("header tail is 16 bytes"),
            target: ShareTarget::from(difficulty),
            nonce_start: 0,
            nonce_end: u32::MAX,
            job_id: notify.job_id.clone(),
            extranonce2,
            ntime: notify.ntime,
        })
    }
}

fn coinbase(
    notify: &Notify,
    extranonce1: &Extranonce,
    extranonce2: u32,
    extranonce2_size: usize,
) -> Result<Vec<u8>> {
    let mut coinbase = hex::decode(&notify.coinb1).context("invalid coinb1 hex")?;
    coinbase.extend_from_slice(extranonce1.as_bytes());
    coinbase.extend_from_slice(Extranonce::from_value(extranonce2, extranonce2_size).as_bytes());
    coinbase.extend_from_slice(&hex::decode(&notify.coinb2).context("invalid coinb2 hex")?);
    Ok(coinbase)
}

/// Packs the 80-byte header with a zeroed nonce slot. Version, ntime and
/// nbits are little-endian; the prev hash and merkle root go in as-is.
fn assemble_header(notify: &Notify, merkle_root: &[u8; 32]) -> [u8; 80] {
    let mut header = [0u8; 80];
    LittleEndian::write_u32(&mut header[0..4], u32::from(notify.version));
    header[4..36].copy_from_slice(notify.prev_hash.as_byte_array());
    header[36..68].copy_from_slice(merkle_root);
    LittleEndian::write_u32(&mut header[68..72], u32::from(notify.ntime));
    LittleEndian::write_u32(&mut header[72..76], notify.nbits.to_consensus());
    header
}

#[cfg(test)]
mod tests {
    use {super::*, crate::stratum::MerkleBranch, pretty_assertions::assert_eq};

    fn notify() -> Notify {
        Notify {
            job_id: "bf".parse().unwrap(),
            prev_hash: "00000000000008a3a41b85b8b29ad444def299fee21793cd8b9e567eab02cd81"
                .parse()
                .unwrap(),
            coinb1: "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff20020862062f503253482f04b8864e5008".into(),
            coinb2: "072f736c7573682f000000000100f2052a010000001976a914d23fcdf86f7e756a64a7a9688ef9903327048ed988ac00000000".into(),
            merkle_branches: Vec::new(),
            version: "00000001".parse().unwrap(),
            nbits: "1a44b9f2".parse().unwrap(),
            ntime: "4dd7f5c7".parse().unwrap(),
            clean_jobs: false,
        }
    }

    #[test]
    fn coinbase_concatenation_order() {
        let notify = Notify {
            coinb1: "aabb".into(),
            coinb2: "eeff".into(),
            ..notify()
        };
        let extranonce1: Extranonce = "01020304".parse().unwrap();

        let coinbase = coinbase(&notify, &extranonce1, 0xCAFE, 4).unwrap();
        assert_eq!(hex::encode(coinbase), "aabb010203040000cafeeeff");
    }

    #[test]
    fn coinbase_rejects_bad_hex() {
        let notify = Notify {
            coinb1: "zz".into(),
            ..notify()
        };
        assert!(coinbase(&notify, &"".parse().unwrap(), 0, 4).is_err());
    }

    #[test]
    fn header_layout() {
        let notify = notify();
        let merkle_root = [0x42u8; 32];
        let header = assemble_header(&notify, &merkle_root);

        assert_eq!(header[0..4], [0x01, 0, 0, 0]);
        assert_eq!(&header[4..36], notify.prev_hash.as_byte_array());
        assert_eq!(header[36..68], [0x42u8; 32]);
        assert_eq!(header[68..72], [0xc7, 0xf5, 0xd7, 0x4d]);
        assert_eq!(header[72..76], [0xf2, 0xb9, 0x44, 0x1a]);
        assert_eq!(header[76..80], [0, 0, 0, 0]);
    }

    #[test]
    fn header_matches_block_125552_reference() {
        // With the merkle root pinned to the block's real value, the packed
        // header must byte-for-byte match the canonical block 125552 header
        // (nonce slot zeroed).
        let notify = notify();
        let merkle_root: [u8; 32] =
            hex::decode("e320b6c2fffc8d750423db8b1eb942ae710e951ed797f7affc8892b0f1fc122b")
                .unwrap()
                .try_into()
                .unwrap();

        let header = assemble_header(&notify, &merkle_root);

        let mut expected = hex::decode(
            "01000000\
             81cd02ab7e569e8bcd9317e2fe99f2de44d49ab2b8851ba4a308000000000000\
             e320b6c2fffc8d750423db8b1eb942ae710e951ed797f7affc8892b0f1fc122b\
             c7f5d74d\
             f2b9441a\
             42a14695",
        )
        .unwrap();
        expected[76..].fill(0);

        assert_eq!(header.to_vec(), expected);
    }

    #[test]
    fn built_job_carries_echo_fields() {
        let notify = notify();
        let extranonce1: Extranonce = "08000002".parse().unwrap();

        let job = MiningJob::build(&notify, &extranonce1, 7, 4, Difficulty::from(1)).unwrap();

        assert_eq!(job.job_id, notify.job_id);
        assert_eq!(job.extranonce2, 7);
        assert_eq!(job.ntime, notify.ntime);
        assert_eq!(job.nonce_start, 0);
        assert_eq!(job.nonce_end, u32::MAX);
        assert_eq!(job.target, ShareTarget::from(Difficulty::from(1)));
    }

    #[test]
    fn midstate_and_tail_reproduce_the_header_hash() {
        let notify = notify();
        let extranonce1: Extranonce = "08000002".parse().unwrap();
        let job = MiningJob::build(&notify, &extranonce1, 1, 4, Difficulty::from(1)).unwrap();

        // Rebuild the header the long way and compare against the kernel's
        // view of it: midstate plus tail.
        let coinbase = coinbase(&notify, &extranonce1, 1, 4).unwrap();
        let merkle_root = stratum::merkle_root(&coinbase, &notify.merkle_branches);
        let header = assemble_header(&notify, &merkle_root);

        assert_eq!(
            job.midstate,
            sha256::midstate(header[..64].try_into().unwrap()),
        );
        assert_eq!(job.tail, header[64..]);
    }

    #[test]
    fn merkle_branches_change_the_midstate() {
        let extranonce1: Extranonce = "08000002".parse().unwrap();

        let plain = MiningJob::build(&notify(), &extranonce1, 1, 4, Difficulty::from(1)).unwrap();

        let with_branch = Notify {
            merkle_branches: vec![MerkleBranch::from_byte_array([0xAB; 32])],
            ..notify()
        };
        let branched =
            MiningJob::build(&with_branch, &extranonce1, 1, 4, Difficulty::from(1)).unwrap();

        assert_ne!(plain.midstate, branched.midstate);
    }
}
