use super::*;

/// Pool-assigned job identifier, echoed verbatim on submits. Pools disagree
/// on the format (hex counters, uuids), so this is an opaque ASCII string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, DeserializeFromStr, SerializeDisplay)]
pub struct JobId(String);

const MAX_JOB_ID_LEN: usize = 64;

impl FromStr for JobId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ensure!(!s.is_empty(), "job id is empty");
        ensure!(
            s.len() <= MAX_JOB_ID_LEN,
            "job id exceeds {MAX_JOB_ID_LEN} characters"
        );
        ensure!(
            s.chars().all(|c| c.is_ascii() && !c.is_ascii_control()),
            "job id contains non-ASCII characters"
        );
        Ok(JobId(s.into()))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
