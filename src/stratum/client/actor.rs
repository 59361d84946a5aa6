use super::*;

pub(super) enum Command {
    Connect {
        respond_to: oneshot::Sender<Result>,
    },
    Request {
        id: Id,
        method: String,
        params: Value,
        respond_to: oneshot::Sender<Result<Message>>,
    },
    Disconnect,
}

/// Owns the TCP stream. Requests arrive over the command channel, responses
/// are matched back to their senders by id, and notifications fan out over
/// the broadcast channel.
pub(super) struct Actor {
    endpoint: String,
    timeout: Duration,
    rx: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
    state: Arc<watch::Sender<SessionState>>,
    pending: BTreeMap<Id, oneshot::Sender<Result<Message>>>,
}

impl Actor {
    pub(super) fn new(
        endpoint: String,
        timeout: Duration,
        rx: mpsc::Receiver<Command>,
        events: broadcast::Sender<Event>,
        state: Arc<watch::Sender<SessionState>>,
    ) -> Self {
        Self {
            endpoint,
            timeout,
            rx,
            events,
            state,
            pending: BTreeMap::new(),
        }
    }

    pub(super) async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            match command {
                Command::Connect { respond_to } => match self.establish().await {
                    Ok(stream) => {
                        let _ = respond_to.send(Ok(()));
                        self.serve(stream).await;
                    }
                    Err(err) => {
                        let _ = respond_to.send(Err(err));
                    }
                },
                Command::Request { respond_to, .. } => {
                    let _ = respond_to.send(Err(ClientError::NotConnected));
                }
                Command::Disconnect => break,
            }
        }
    }

    async fn establish(&self) -> Result<TcpStream> {
        tokio::time::timeout(self.timeout, TcpStream::connect(&self.endpoint))
            .await
            .map_err(|source| ClientError::Timeout { source })?
            .map_err(|source| ClientError::Transport { source })
    }

    async fn serve(&mut self, stream: TcpStream) {
        let (reader, writer) = stream.into_split();
        let mut reader = BufReader::new(reader);
        let mut writer = BufWriter::new(writer);
        let mut line = String::new();

        loop {
            line.clear();

            tokio::select! {
                command = self.rx.recv() => match command {
                    Some(Command::Request { id, method, params, respond_to }) => {
                        let message = Message::Request {
                            id: id.clone(),
                            method,
                            params,
                        };

                        let frame = match serde_json::to_string(&message) {
                            Ok(frame) => frame + "\n",
                            Err(source) => {
                                let _ = respond_to.send(Err(ClientError::Serialization { source }));
                                continue;
                            }
                        };

                        if let Err(source) = writer.write_all(frame.as_bytes()).await {
                            let _ = respond_to.send(Err(ClientError::Transport { source }));
                            break;
                        }
                        if let Err(source) = writer.flush().await {
                            let _ = respond_to.send(Err(ClientError::Transport { source }));
                            break;
                        }

                        self.pending.insert(id, respond_to);
                    }
                    Some(Command::Connect { respond_to }) => {
                        let _ = respond_to.send(Err(ClientError::Protocol {
                            message: "already connected".into(),
                        }));
                    }
                    Some(Command::Disconnect) | None => break,
                },

                read = reader.read_line(&mut line) => {
                    match read {
                        Ok(0) => {
                            debug!("pool closed the connection");
                            break;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            error!("socket read failed: {err}");
                            break;
                        }
                    }

                    // A malformed line only discards that line.
                    let message: Message = match serde_json::from_str(&line) {
                        Ok(message) => message,
                        Err(err) => {
                            warn!("discarding invalid stratum line {:?}: {err}", line.trim_end());
                            continue;
                        }
                    };

                    match message {
                        Message::Response { id, result, error, reject_reason } => {
                            match self.pending.remove(&id) {
                                Some(respond_to) => {
                                    let _ = respond_to.send(Ok(Message::Response {
                                        id,
                                        result,
                                        error,
                                        reject_reason,
                                    }));
                                }
                                None => warn!("unmatched response id={id}"),
                            }
                        }
                        Message::Notification { method, params } => {
                            self.handle_notification(method, params);
                        }
                        Message::Request { method, .. } => {
                            debug!("ignoring request from pool: {method}");
                        }
                    }
                }
            }
        }

        for (_, respond_to) in std::mem::take(&mut self.pending) {
            let _ = respond_to.send(Err(ClientError::NotConnected));
        }

        self.state.send_replace(SessionState::Disconnected);
        let _ = self.events.send(Event::Disconnected);
    }

    fn handle_notification(&self, method: String, params: Value) {
        match method.as_str() {
            "mining.notify" => match serde_json::from_value::<Notify>(params) {
                Ok(notify) => {
                    let _ = self.events.send(Event::Notify(notify));
                }
                Err(err) => warn!("failed to parse mining.notify: {err}"),
            },
            "mining.set_difficulty" => match serde_json::from_value::<SetDifficulty>(params) {
                Ok(set_difficulty) => {
                    let _ = self.events.send(Event::SetDifficulty(set_difficulty.difficulty()));
                }
                Err(err) => warn!("failed to parse mining.set_difficulty: {err}"),
            },
            _ => debug!("unhandled notification: {method}"),
        }
    }
}
