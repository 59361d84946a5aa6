use super::*;

/// One node of the merkle branch list in `mining.notify`. Unlike the
/// previous block hash these arrive in header order and are used as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct MerkleBranch([u8; 32]);

impl MerkleBranch {
    pub fn as_byte_array(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn from_byte_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for MerkleBranch {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(s.len() == 64, "merkle branch hex must be 64 chars");
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(MerkleBranch(bytes))
    }
}

impl fmt::Display for MerkleBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

/// Rebuilds the merkle root for a coinbase: hash the assembled transaction,
/// then fold each branch in order onto the running root.
pub fn merkle_root(coinbase: &[u8], branches: &[MerkleBranch]) -> [u8; 32] {
    let mut root = crate::sha256::double_hash(coinbase);

    for branch in branches {
        let mut concat = [0u8; 64];
        concat[..32].copy_from_slice(&root);
        concat[32..].copy_from_slice(branch.as_byte_array());
        root = crate::sha256::double_hash(&concat);
    }

    root
}

#[cfg(test)]
mod tests {
    use {super::*, bitcoin::hashes::Hash, pretty_assertions::assert_eq};

    fn sha256d(data: &[u8]) -> [u8; 32] {
        bitcoin::hashes::sha256d::Hash::hash(data).to_byte_array()
    }

    #[test]
    fn branch_hex_roundtrip() {
        let hex = "c0f65e3443b9e2215ebd08cd6fc52d0e776897a3afdf4787cf28de48d9a8c3ad";
        let branch = hex.parse::<MerkleBranch>().unwrap();
        assert_eq!(branch.to_string(), hex);

        let serialized = serde_json::to_string(&branch).unwrap();
        assert_eq!(serialized, format!("\"{hex}\""));
    }

    #[test]
    fn branch_rejects_wrong_length() {
        assert!("ab".parse::<MerkleBranch>().is_err());
        assert!("g".repeat(64).parse::<MerkleBranch>().is_err());
    }

    #[test]
    fn root_without_branches_is_coinbase_hash() {
        let coinbase = b"coinbase bytes";
        assert_eq!(merkle_root(coinbase, &[]), sha256d(coinbase));
    }

    #[test]
    fn root_folds_branches_in_order() {
        let coinbase = b"coinbase bytes";
        let branch_a = MerkleBranch::from_byte_array([0xAA; 32]);
        let branch_b = MerkleBranch::from_byte_array([0xBB; 32]);

        let level_one = {
            let mut concat = Vec::new();
            concat.extend_from_slice(&sha256d(coinbase));
            concat.extend_from_slice(&[0xAA; 32]);
            sha256d(&concat)
        };

        let expected = {
            let mut concat = Vec::new();
            concat.extend_from_slice(&level_one);
            concat.extend_from_slice(&[0xBB; 32]);
            sha256d(&concat)
        };

        assert_eq!(merkle_root(coinbase, &[branch_a, branch_b]), expected);
    }
}
