use super::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetDifficulty(pub Difficulty);

impl SetDifficulty {
    pub fn difficulty(self) -> Difficulty {
        self.0
    }
}

impl Serialize for SetDifficulty {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&self.0)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SetDifficulty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (difficulty,): (Difficulty,) = Deserialize::deserialize(deserializer)?;
        Ok(SetDifficulty(difficulty))
    }
}
