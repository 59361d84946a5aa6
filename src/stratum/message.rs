use super::*;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Clone)]
#[serde(untagged)]
pub enum Id {
    Null,
    Number(u64),
    String(String),
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Message {
    Request {
        id: Id,
        method: String,
        params: Value,
    },
    Response {
        id: Id,
        result: Option<Value>,
        error: Option<JsonRpcError>,
        #[serde(skip_serializing_if = "Option::is_none", rename = "reject-reason")]
        reject_reason: Option<String>,
    },
    Notification {
        method: String,
        params: Value,
    },
}

/// Untagged deserialization cannot tell these shapes apart on its own:
/// pools send notifications with an explicit `id: null` (which JSON-RPC says
/// should be an absent field), so anything carrying `result`, `error`, or a
/// ckpool-style `reject-reason` is classified as a response first, and a
/// `method` with a null or missing id becomes a notification.
impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;

        let is_response = ["result", "error", "reject-reason"]
            .iter()
            .any(|key| value.get(key).is_some());

        if is_response {
            #[derive(Deserialize)]
            struct Response {
                id: Id,
                result: Option<Value>,
                error: Option<JsonRpcError>,
                #[serde(rename = "reject-reason")]
                reject_reason: Option<String>,
            }

            let response: Response = serde_json::from_value(value).map_err(de::Error::custom)?;

            return Ok(Message::Response {
                id: response.id,
                result: response.result,
                error: response.error,
                reject_reason: response.reject_reason,
            });
        }

        let method = value
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| de::Error::missing_field("method"))?
            .to_string();

        let params = value
            .get("params")
            .cloned()
            .ok_or_else(|| de::Error::missing_field("params"))?;

        match value.get("id") {
            None | Some(Value::Null) => Ok(Message::Notification { method, params }),
            Some(id) => Ok(Message::Request {
                id: serde_json::from_value(id.clone()).map_err(de::Error::custom)?,
                method,
                params,
            }),
        }
    }
}
