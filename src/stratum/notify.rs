use super::*;

#[derive(Debug, Clone, PartialEq)]
pub struct Notify {
    pub job_id: JobId,
    pub prev_hash: PrevHash,
    pub coinb1: String,
    pub coinb2: String,
    pub merkle_branches: Vec<MerkleBranch>,
    pub version: Version,
    pub nbits: Nbits,
    pub ntime: Ntime,
    pub clean_jobs: bool,
}

impl Serialize for Notify {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(9))?;
        seq.serialize_element(&self.job_id)?;
        seq.serialize_element(&self.prev_hash)?;
        seq.serialize_element(&self.coinb1)?;
        seq.serialize_element(&self.coinb2)?;
        seq.serialize_element(&self.merkle_branches)?;
        seq.serialize_element(&self.version)?;
        seq.serialize_element(&self.nbits)?;
        seq.serialize_element(&self.ntime)?;
        seq.serialize_element(&self.clean_jobs)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Notify {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (
            job_id,
            prev_hash,
            coinb1,
            coinb2,
            mut merkle_branches,
            version,
            nbits,
            ntime,
            clean_jobs,
        ) = <(
            JobId,
            PrevHash,
            String,
            String,
            Vec<MerkleBranch>,
            Version,
            Nbits,
            Ntime,
            bool,
        )>::deserialize(deserializer)?;

        merkle_branches.truncate(MAX_MERKLE_BRANCHES);

        Ok(Notify {
            job_id,
            prev_hash,
            coinb1,
            coinb2,
            merkle_branches,
            version,
            nbits,
            ntime,
            clean_jobs,
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    fn canonical() -> &'static str {
        r#"["bf","4d16b6f85af6e2198f44ae2a6de67f78487ae5611b77c6c0440b921e00000000","01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff20020862062f503253482f04b8864e5008","072f736c7573682f000000000100f2052a010000001976a914d23fcdf86f7e756a64a7a9688ef9903327048ed988ac00000000",[],"20000000","1a44b9f2","504e86b9",true]"#
    }

    #[test]
    fn canonical_notify_parses() {
        let notify: Notify = serde_json::from_str(canonical()).unwrap();

        assert_eq!(notify.job_id, "bf".parse().unwrap());
        assert_eq!(notify.merkle_branches.len(), 0);
        assert_eq!(u32::from(notify.version), 0x20000000);
        assert_eq!(notify.nbits.to_consensus(), 0x1a44b9f2);
        assert_eq!(notify.ntime, Ntime(0x504e86b9));
        assert!(notify.clean_jobs);
    }

    #[test]
    fn reserialization_matches_wire_form() {
        let notify: Notify = serde_json::from_str(canonical()).unwrap();
        let reserialized = serde_json::to_string(&notify).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&reserialized).unwrap(),
            serde_json::from_str::<Value>(canonical()).unwrap(),
        );
    }

    #[test]
    fn branches_parse_and_truncate() {
        let branch = "ad".repeat(32);
        let branches = (0..20)
            .map(|_| format!("\"{branch}\""))
            .collect::<Vec<String>>()
            .join(",");

        let raw = format!(
            r#"["1","4d16b6f85af6e2198f44ae2a6de67f78487ae5611b77c6c0440b921e00000000","aa","bb",[{branches}],"20000000","1a44b9f2","504e86b9",false]"#
        );

        let notify: Notify = serde_json::from_str(&raw).unwrap();
        assert_eq!(notify.merkle_branches.len(), MAX_MERKLE_BRANCHES);
        assert!(!notify.clean_jobs);
    }

    #[test]
    fn rejects_malformed_params() {
        // Wrong arity and bad hex both discard the line.
        assert!(serde_json::from_str::<Notify>(r#"["bf"]"#).is_err());

        let bad_prev_hash = r#"["bf","xyz","aa","bb",[],"20000000","1a44b9f2","504e86b9",true]"#;
        assert!(serde_json::from_str::<Notify>(bad_prev_hash).is_err());
    }
}
