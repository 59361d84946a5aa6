use {super::*, actor::{Actor, Command}};

mod actor;

pub type Result<T = (), E = ClientError> = std::result::Result<T, E>;

const SUBSCRIBE_ID: u64 = 1;
const AUTHORIZE_ID: u64 = 2;
const SUBMIT_ID_BASE: u64 = 100;

const MAX_EXTRANONCE1_SIZE: usize = 8;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub username: String,
    pub password: Option<String>,
    pub timeout: Duration,
}

/// Connection lifecycle. The happy path is linear; any state collapses to
/// `Disconnected` on a socket error, EOF, or an explicit disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    Subscribing,
    Subscribed,
    Authorizing,
    Authorized,
    Ready,
}

/// Handle onto the connection actor. Cheap to clone; all I/O happens on the
/// actor task, which also resolves responses against their request ids.
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    tx: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
    state: Arc<watch::Sender<SessionState>>,
    submit_counter: Arc<AtomicU64>,
}

impl Client {
    /// Must be called within a tokio runtime; the connection actor is
    /// spawned immediately and waits for `connect`.
    pub fn new(config: ClientConfig) -> Self {
        let (tx, rx) = mpsc::channel(32);
        let (events, _) = broadcast::channel(32);
        let (state, _) = watch::channel(SessionState::Disconnected);
        let state = Arc::new(state);

        let actor = Actor::new(
            config.endpoint.clone(),
            config.timeout,
            rx,
            events.clone(),
            state.clone(),
        );
        tokio::spawn(actor.run());

        Self {
            config: Arc::new(config),
            tx,
            events,
            state,
            submit_counter: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Subscribe before `connect`: notifications sent while no receiver
    /// exists are dropped by the broadcast channel.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    fn set_state(&self, state: SessionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!("session state: {previous} -> {state}");
        }
    }

    pub async fn connect(&self) -> Result {
        self.set_state(SessionState::Connecting);

        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(Command::Connect { respond_to })
            .await
            .map_err(|_| ClientError::NotConnected)?;

        match response.await.map_err(|_| ClientError::NotConnected)? {
            Ok(()) => {
                self.set_state(SessionState::Connected);
                Ok(())
            }
            Err(err) => {
                self.set_state(SessionState::Disconnected);
                Err(err)
            }
        }
    }

    pub async fn disconnect(&self) {
        let _ = self.tx.send(Command::Disconnect).await;
        self.set_state(SessionState::Disconnected);
    }

    async fn request(&self, id: u64, method: &str, params: Value) -> Result<Message> {
        let (respond_to, response) = oneshot::channel();
        self.tx
            .send(Command::Request {
                id: Id::Number(id),
                method: method.into(),
                params,
                respond_to,
            })
            .await
            .map_err(|_| ClientError::NotConnected)?;

        response.await.map_err(|_| ClientError::NotConnected)?
    }

    /// Same as `request` but bounded by the handshake deadline.
    async fn request_with_deadline(&self, id: u64, method: &str, params: Value) -> Result<Message> {
        tokio::time::timeout(self.config.timeout, self.request(id, method, params))
            .await
            .map_err(|source| ClientError::Timeout { source })?
    }

    pub async fn subscribe(&self) -> Result<SubscribeResult> {
        self.set_state(SessionState::Subscribing);

        let params = serde_json::to_value(Subscribe {
            user_agent: crate::USER_AGENT.into(),
        })
        .map_err(|source| ClientError::Serialization { source })?;

        let message = self
            .request_with_deadline(SUBSCRIBE_ID, "mining.subscribe", params)
            .await?;

        match message {
            Message::Response {
                result: Some(result),
                error: None,
                ..
            } => {
                let result: SubscribeResult = serde_json::from_value(result)
                    .map_err(|source| ClientError::Serialization { source })?;

                if result.extranonce1.len() > MAX_EXTRANONCE1_SIZE {
                    return Err(ClientError::Protocol {
                        message: format!(
                            "extranonce1 is {} bytes, expected at most {MAX_EXTRANONCE1_SIZE}",
                            result.extranonce1.len()
                        ),
                    });
                }

                self.set_state(SessionState::Subscribed);
                Ok(result)
            }
            Message::Response {
                error: Some(err), ..
            } => Err(ClientError::Protocol {
                message: format!("mining.subscribe failed: {err}"),
            }),
            _ => Err(ClientError::Protocol {
                message: "unexpected mining.subscribe response".into(),
            }),
        }
    }

    pub async fn authorize(&self) -> Result {
        self.set_state(SessionState::Authorizing);

        let params = serde_json::to_value(Authorize {
            username: self.config.username.clone(),
            password: Some(self.config.password.clone().unwrap_or_else(|| "x".into())),
        })
        .map_err(|source| ClientError::Serialization { source })?;

        let message = self
            .request_with_deadline(AUTHORIZE_ID, "mining.authorize", params)
            .await?;

        match message {
            Message::Response {
                result: Some(Value::Bool(true)),
                error: None,
                ..
            } => {
                self.set_state(SessionState::Authorized);
                Ok(())
            }
            Message::Response {
                result: Some(Value::Bool(false)),
                ..
            } => Err(ClientError::AuthRejected),
            Message::Response {
                error: Some(err), ..
            } => Err(ClientError::Protocol {
                message: format!("mining.authorize failed: {err}"),
            }),
            _ => Err(ClientError::Protocol {
                message: "unexpected mining.authorize response".into(),
            }),
        }
    }

    /// The session enters `Ready` on the first job after authorization.
    pub fn mark_ready(&self) {
        if self.state() == SessionState::Authorized {
            self.set_state(SessionState::Ready);
        }
    }

    /// Submits a share and reports whether the pool accepted it. Rejections
    /// are final; the caller only counts them.
    pub async fn submit(&self, share: &ShareInfo, extranonce2_size: usize) -> Result<bool> {
        let id = SUBMIT_ID_BASE + self.submit_counter.fetch_add(1, Ordering::Relaxed);

        let submit = Submit {
            username: self.config.username.clone(),
            job_id: share.job_id.clone(),
            extranonce2: Extranonce::from_value(share.extranonce2, extranonce2_size),
            ntime: share.ntime,
            nonce: share.nonce,
        };

        let params = serde_json::to_value(&submit)
            .map_err(|source| ClientError::Serialization { source })?;

        let message = self.request(id, "mining.submit", params).await?;

        match message {
            Message::Response {
                result,
                error: None,
                reject_reason: None,
                ..
            } => Ok(matches!(result, Some(Value::Bool(true)))),
            Message::Response {
                reject_reason: Some(reason),
                ..
            } => {
                warn!("share {} rejected: {reason}", share.nonce);
                Ok(false)
            }
            Message::Response {
                error: Some(err), ..
            } => {
                warn!("share {} rejected: {err}", share.nonce);
                Ok(false)
            }
            _ => Err(ClientError::Protocol {
                message: "unexpected mining.submit response".into(),
            }),
        }
    }
}
