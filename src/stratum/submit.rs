use super::*;

/// `mining.submit` params: worker, job id, extranonce2 (fixed-width hex),
/// ntime and nonce as exactly eight lowercase hex chars each.
#[derive(Debug, Clone, PartialEq)]
pub struct Submit {
    pub username: String,
    pub job_id: JobId,
    pub extranonce2: Extranonce,
    pub ntime: Ntime,
    pub nonce: Nonce,
}

impl Serialize for Submit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(5))?;
        seq.serialize_element(&self.username)?;
        seq.serialize_element(&self.job_id)?;
        seq.serialize_element(&self.extranonce2)?;
        seq.serialize_element(&self.ntime)?;
        seq.serialize_element(&self.nonce)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Submit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (username, job_id, extranonce2, ntime, nonce) =
            <(String, JobId, Extranonce, Ntime, Nonce)>::deserialize(deserializer)?;

        Ok(Submit {
            username,
            job_id,
            extranonce2,
            ntime,
            nonce,
        })
    }
}
