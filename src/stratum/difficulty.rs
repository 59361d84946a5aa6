use super::*;

/// Integer pool difficulty. Pools occasionally send floats; those are
/// floored, and anything below 1 is clamped up so a target always exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Difficulty(u64);

impl Difficulty {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty(1)
    }
}

impl From<u64> for Difficulty {
    fn from(difficulty: u64) -> Self {
        Difficulty(difficulty.max(1))
    }
}

impl From<f64> for Difficulty {
    fn from(difficulty: f64) -> Self {
        if difficulty.is_finite() && difficulty >= 1.0 {
            Difficulty(difficulty.floor() as u64)
        } else {
            Difficulty(1)
        }
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Int(u64),
            Float(f64),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Int(difficulty) => Difficulty::from(difficulty),
            Wire::Float(difficulty) => Difficulty::from(difficulty),
        })
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(difficulty: &str) -> Result<Self, Self::Err> {
        if let Ok(value) = difficulty.parse::<u64>() {
            return Ok(Difficulty::from(value));
        }

        let value = difficulty.parse::<f64>()?;
        Ok(Difficulty::from(value))
    }
}
