use super::*;

#[derive(Debug, PartialEq)]
pub struct Subscribe {
    pub user_agent: String,
}

impl Serialize for Subscribe {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&self.user_agent)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for Subscribe {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let params: Vec<Value> = Deserialize::deserialize(deserializer)?;

        let user_agent = match params.first() {
            None => String::new(),
            Some(Value::String(user_agent)) => user_agent.clone(),
            Some(_) => return Err(de::Error::custom("unexpected subscribe params")),
        };

        Ok(Subscribe { user_agent })
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct SubscribeResult {
    pub subscriptions: Vec<(String, String)>,
    pub extranonce1: Extranonce,
    pub extranonce2_size: usize,
}

impl Serialize for SubscribeResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.subscriptions)?;
        seq.serialize_element(&self.extranonce1)?;
        seq.serialize_element(&self.extranonce2_size)?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for SubscribeResult {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (subscriptions, extranonce1, extranonce2_size) =
            <(Vec<(String, String)>, Extranonce, usize)>::deserialize(deserializer)?;

        Ok(SubscribeResult {
            subscriptions,
            extranonce1,
            extranonce2_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq, serde_json::json};

    #[test]
    fn subscribe_serializes_user_agent() {
        assert_eq!(
            serde_json::to_value(Subscribe {
                user_agent: crate::USER_AGENT.into(),
            })
            .unwrap(),
            json!(["drill/0.1.0"]),
        );
    }

    #[test]
    fn subscribe_accepts_empty_params() {
        let subscribe: Subscribe = serde_json::from_str("[]").unwrap();
        assert_eq!(subscribe.user_agent, "");
    }

    #[test]
    fn subscribe_rejects_non_string_agent() {
        assert!(serde_json::from_str::<Subscribe>("[123]").is_err());
    }

    #[test]
    fn subscribe_result_roundtrip() {
        let json = r#"
            [
              [
                ["mining.set_difficulty","b4b6693b72a50c7116db18d6497cac52"],
                ["mining.notify","ae6812eb4cd7735a302a8a9dd95cf71f"]
              ],
              "08000002",
              4
            ]
        "#;

        let result: SubscribeResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.extranonce1, "08000002".parse().unwrap());
        assert_eq!(result.extranonce2_size, 4);
        assert_eq!(result.subscriptions.len(), 2);

        let reserialized = serde_json::to_string(&result).unwrap();
        assert_eq!(
            serde_json::from_str::<Value>(&reserialized).unwrap(),
            serde_json::from_str::<Value>(json).unwrap(),
        );
    }

    #[test]
    fn subscribe_result_empty_subscriptions() {
        let result: SubscribeResult = serde_json::from_str(r#"[[], "deadbeef", 8]"#).unwrap();
        assert_eq!(result.extranonce1.len(), 4);
        assert_eq!(result.extranonce2_size, 8);
    }
}
