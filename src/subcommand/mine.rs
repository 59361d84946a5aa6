use super::*;

#[derive(Debug, Parser)]
pub(crate) struct Mine {
    #[arg(help = "Stratum <HOST:PORT>.", env = "DRILL_STRATUM_ENDPOINT")]
    pub(crate) endpoint: Option<String>,
    #[arg(long, help = "Stratum <USERNAME>.", env = "DRILL_USERNAME")]
    pub(crate) username: Option<String>,
    #[arg(long, help = "Stratum <PASSWORD>.", env = "DRILL_PASSWORD")]
    pub(crate) password: Option<String>,
    #[arg(long, help = "Number of <WORKERS>, capped to available cores.")]
    pub(crate) workers: Option<usize>,
    #[arg(long, help = "Exit after the first submitted share.")]
    pub(crate) once: bool,
}

impl Mine {
    pub(crate) async fn run(self, cancel: CancellationToken) -> Result {
        let settings = Settings::from_mine_options(&self)?;

        info!(
            "connecting to {} as {} with {} workers",
            settings.endpoint, settings.username, settings.workers
        );

        let client = Client::new(ClientConfig {
            endpoint: settings.endpoint.clone(),
            username: settings.username.clone(),
            password: settings.password.clone(),
            timeout: settings.timeout,
        });

        let mut events = client.events();

        client
            .connect()
            .await
            .context("failed to connect to stratum server")?;

        let subscription = client
            .subscribe()
            .await
            .context("mining.subscribe failed")?;

        client.authorize().await.context("mining.authorize failed")?;

        info!(
            "authorized: extranonce1={}, extranonce2_size={}",
            subscription.extranonce1, subscription.extranonce2_size
        );

        let (dispatcher, mut shares) = JobDispatcher::new();
        let dispatcher = Arc::new(dispatcher);
        let metrics = Arc::new(Metrics::new());
        let kernel = Arc::new(SoftwareKernel);

        let mut workers = JoinSet::new();
        for index in 0..settings.workers {
            workers.spawn(run_worker(
                index,
                settings.workers,
                dispatcher.clone(),
                kernel.clone(),
                metrics.clone(),
                cancel.child_token(),
            ));
        }

        let status = if io::stdout().is_terminal() {
            Some(tokio::spawn(stats::run_status_line(
                metrics.clone(),
                cancel.child_token(),
            )))
        } else {
            None
        };

        let mut session = Session {
            client: client.clone(),
            dispatcher,
            metrics: metrics.clone(),
            extranonce1: subscription.extranonce1,
            extranonce2_size: subscription.extranonce2_size,
            extranonce2_counter: 0,
            difficulty: Difficulty::default(),
            submits: JoinSet::new(),
            submitted: Vec::new(),
        };

        let outcome = session
            .event_loop(&mut events, &mut shares, cancel.clone(), settings.once)
            .await;

        cancel.cancel();
        while workers.join_next().await.is_some() {}

        // Give in-flight submits a moment to resolve; disconnecting fails
        // whatever is still pending and the join set aborts it on drop.
        let _ = tokio::time::timeout(Duration::from_secs(5), async {
            while session.submits.join_next().await.is_some() {}
        })
        .await;
        client.disconnect().await;

        if let Some(status) = status {
            let _ = status.await;
        }

        let stats = metrics.snapshot();
        info!(
            "mined {} hashes, {} accepted, {} rejected",
            stats.total_hashes, stats.accepted, stats.rejected
        );

        println!("{}", serde_json::to_string_pretty(&session.submitted)?);

        outcome
    }
}

/// Session-side state of the event loop: the handshake results, the current
/// difficulty, and the in-flight submits.
struct Session {
    client: Client,
    dispatcher: Arc<JobDispatcher>,
    metrics: Arc<Metrics>,
    extranonce1: Extranonce,
    extranonce2_size: usize,
    extranonce2_counter: u32,
    difficulty: Difficulty,
    submits: JoinSet<()>,
    submitted: Vec<ShareInfo>,
}

impl Session {
    async fn event_loop(
        &mut self,
        events: &mut broadcast::Receiver<Event>,
        shares: &mut mpsc::Receiver<ShareInfo>,
        cancel: CancellationToken,
        once: bool,
    ) -> Result {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("shutting down session");
                    return Ok(());
                }
                event = events.recv() => match event {
                    Ok(Event::Notify(notify)) => self.handle_notify(notify, shares),
                    Ok(Event::SetDifficulty(difficulty)) => {
                        self.difficulty = difficulty;
                        info!("pool difficulty set to {difficulty}");
                    }
                    Ok(Event::Disconnected) => {
                        warn!("disconnected from pool");
                        return Ok(());
                    }
                    Err(broadcast::error::RecvError::Lagged(count)) => {
                        warn!("event loop lagged, missed {count} messages");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Ok(());
                    }
                },
                share = shares.recv() => {
                    let Some(share) = share else { return Ok(()) };
                    self.handle_share(share);
                    if once {
                        info!("share submitted, exiting");
                        return Ok(());
                    }
                }
            }
        }
    }

    fn handle_notify(&mut self, notify: Notify, shares: &mut mpsc::Receiver<ShareInfo>) {
        // The session enters Ready on the first job after authorization.
        self.client.mark_ready();

        if notify.clean_jobs {
            let mut dropped = 0;
            while shares.try_recv().is_ok() {
                dropped += 1;
            }
            if dropped > 0 {
                debug!("clean jobs: dropped {dropped} in-flight shares");
            }
        }

        let extranonce2 = self.extranonce2_counter;
        self.extranonce2_counter = self.extranonce2_counter.wrapping_add(1);

        match MiningJob::build(
            &notify,
            &self.extranonce1,
            extranonce2,
            self.extranonce2_size,
            self.difficulty,
        ) {
            Ok(job) => {
                info!(
                    "new job {} (clean={}, difficulty={})",
                    job.job_id, notify.clean_jobs, self.difficulty
                );
                self.dispatcher.set_job(job);
            }
            Err(err) => warn!("discarding unusable job {}: {err:#}", notify.job_id),
        }
    }

    /// Submits are fire and forget: the response resolves on its own task
    /// and only moves the accepted or rejected counter.
    fn handle_share(&mut self, share: ShareInfo) {
        info!("share found: job={} nonce={}", share.job_id, share.nonce);
        self.submitted.push(share.clone());

        let client = self.client.clone();
        let metrics = self.metrics.clone();
        let extranonce2_size = self.extranonce2_size;

        self.submits.spawn(async move {
            match client.submit(&share, extranonce2_size).await {
                Ok(true) => {
                    metrics.record_accepted();
                    info!("share accepted: job={} nonce={}", share.job_id, share.nonce);
                }
                Ok(false) => {
                    metrics.record_rejected();
                }
                Err(err) => {
                    warn!("failed to submit share {}: {err}", share.nonce);
                }
            }
        });
    }
}
