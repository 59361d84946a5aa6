use super::*;

/// Previous block hash as sent in `mining.notify`: the pool stores the bytes
/// reversed, so the wire hex is decoded and byte-reversed before it lands in
/// a header. `BlockHash` already displays in that reversed convention, which
/// makes the round-trip a pair of delegations.
#[derive(Debug, PartialEq, Eq, Clone, DeserializeFromStr, SerializeDisplay)]
pub struct PrevHash(BlockHash);

impl PrevHash {
    pub fn as_byte_array(&self) -> &[u8; 32] {
        self.0.as_byte_array()
    }
}

impl FromStr for PrevHash {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PrevHash(BlockHash::from_str(s)?))
    }
}

impl fmt::Display for PrevHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<BlockHash> for PrevHash {
    fn from(hash: BlockHash) -> Self {
        PrevHash(hash)
    }
}

impl From<PrevHash> for BlockHash {
    fn from(prev_hash: PrevHash) -> Self {
        prev_hash.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn case(wire_hex: &str, header_hex: &str) {
        let prev_hash = wire_hex.parse::<PrevHash>().unwrap();
        assert_eq!(prev_hash.to_string(), wire_hex);
        assert_eq!(hex::encode(prev_hash.as_byte_array()), header_hex);

        let serialized = serde_json::to_string(&prev_hash).unwrap();
        assert_eq!(serialized, format!("\"{wire_hex}\""));
        assert_eq!(
            serde_json::from_str::<PrevHash>(&serialized).unwrap(),
            prev_hash,
        );
    }

    #[test]
    fn wire_bytes_are_reversed_into_header_order() {
        case(
            "4d16b6f85af6e2198f44ae2a6de67f78487ae5611b77c6c0440b921e00000000",
            "000000001e920b44c0c6771b61e57a48787fe66d2aae448f19e2f65af8b6164d",
        );
    }

    #[test]
    fn block_125551_as_seen_by_block_125552() {
        // The wire form doubles as the hash's display form; the header order
        // matches the prev-hash field of block 125552's header.
        case(
            "00000000000008a3a41b85b8b29ad444def299fee21793cd8b9e567eab02cd81",
            "81cd02ab7e569e8bcd9317e2fe99f2de44d49ab2b8851ba4a308000000000000",
        );
    }
}
