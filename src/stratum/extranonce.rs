use super::*;

/// Raw extranonce bytes, hex on the wire. Extranonce1 is pool-assigned;
/// extranonce2 values are rendered through `from_value` so the hex width is
/// always exactly twice the size negotiated at subscribe time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct Extranonce(Vec<u8>);

impl Extranonce {
    /// Serialises `value` big-endian into exactly `size` bytes. Values wider
    /// than the field are truncated to their low bytes, matching the wrap of
    /// the extranonce2 counter.
    pub fn from_value(value: u32, size: usize) -> Self {
        let be = value.to_be_bytes();
        let mut bytes = vec![0u8; size];
        let take = size.min(4);
        bytes[size - take..].copy_from_slice(&be[4 - take..]);
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Extranonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl FromStr for Extranonce {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(hex::decode(s)?))
    }
}
