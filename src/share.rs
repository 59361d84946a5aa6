use super::*;

/// A winning nonce with everything the pool needs to reconstruct the header:
/// the job it belongs to, the extranonce2 the coinbase was built with, and
/// the ntime the job was mined at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareInfo {
    pub job_id: JobId,
    pub extranonce2: u32,
    pub nonce: Nonce,
    pub ntime: Ntime,
}
