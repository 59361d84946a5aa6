use {super::*, snafu::Snafu};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ClientError {
    #[snafu(display("transport error: {source}"))]
    Transport { source: std::io::Error },

    #[snafu(display("timed out after {:?}", source))]
    Timeout {
        source: tokio::time::error::Elapsed,
    },

    #[snafu(display("worker not authorized by pool"))]
    AuthRejected,

    #[snafu(display("protocol error: {message}"))]
    Protocol { message: String },

    #[snafu(display("not connected"))]
    NotConnected,

    #[snafu(display("serialization error: {source}"))]
    Serialization { source: serde_json::Error },
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub error_code: i32,
    pub message: String,
    pub traceback: Option<Value>,
}

impl Serialize for JsonRpcError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (&self.error_code, &self.message, &self.traceback).serialize(serializer)
    }
}

impl fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.traceback {
            Some(traceback) => write!(
                f,
                "stratum error {}: {} (traceback: {})",
                self.error_code,
                self.message,
                serde_json::to_string(traceback).unwrap_or_else(|_| "<invalid traceback>".into())
            ),
            None => write!(f, "stratum error {}: {}", self.error_code, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn json_rpc_error_round_trip() {
        let error: JsonRpcError = serde_json::from_str(r#"[21,"Job not found",null]"#).unwrap();
        assert_eq!(error.error_code, 21);
        assert_eq!(error.message, "Job not found");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!([21, "Job not found", null]),
        );
    }

    #[test]
    fn display_includes_code() {
        let error = JsonRpcError {
            error_code: 24,
            message: "Unauthorized worker".into(),
            traceback: None,
        };
        assert_eq!(error.to_string(), "stratum error 24: Unauthorized worker");
    }
}
