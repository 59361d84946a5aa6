use super::*;

/// Block header version as carried on the wire, big-endian hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr, SerializeDisplay)]
pub struct Version(u32);

impl FromStr for Version {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let version = u32::from_str_radix(s, 16)
            .with_context(|| format!("invalid version hex string '{s}'"))?;
        Ok(Version(version))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<Version> for u32 {
    fn from(v: Version) -> u32 {
        v.0
    }
}

impl From<u32> for Version {
    fn from(v: u32) -> Version {
        Version(v)
    }
}
