use super::*;

/// Shared counters, updated by workers with relaxed atomics and read by the
/// session and the status line. No ordering is required between them.
pub struct Metrics {
    total_hashes: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    blocks_found: AtomicU64,
    started: Instant,
    window: Mutex<RateWindow>,
}

struct RateWindow {
    at: Instant,
    total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MinerStats {
    pub hash_rate: HashRate,
    pub total_hashes: u64,
    pub accepted: u64,
    pub rejected: u64,
    pub blocks_found: u64,
    pub uptime_secs: u64,
}

impl Metrics {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            total_hashes: AtomicU64::new(0),
            accepted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            blocks_found: AtomicU64::new(0),
            started: now,
            window: Mutex::new(RateWindow { at: now, total: 0 }),
        }
    }

    pub fn add_hashes(&self, hashes: u64) {
        self.total_hashes.fetch_add(hashes, Ordering::Relaxed);
    }

    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_block_found(&self) {
        self.blocks_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total_hashes(&self) -> u64 {
        self.total_hashes.load(Ordering::Relaxed)
    }

    /// Snapshot with a rolling hash rate over the window since the previous
    /// snapshot. Call on a steady cadence for a meaningful rate.
    pub fn snapshot(&self) -> MinerStats {
        let total = self.total_hashes();
        let now = Instant::now();

        let hash_rate = {
            let mut window = self.window.lock().expect("rate window mutex poisoned");
            let elapsed = now.duration_since(window.at).as_secs_f64();
            let delta = total.saturating_sub(window.total) as f64;
            window.at = now;
            window.total = total;

            if elapsed > 0.0 {
                HashRate(delta / elapsed)
            } else {
                HashRate::ZERO
            }
        };

        MinerStats {
            hash_rate,
            total_hashes: total,
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            blocks_found: self.blocks_found.load(Ordering::Relaxed),
            uptime_secs: self.started.elapsed().as_secs(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-line status spinner, overwritten in place once a second. Only
/// spawned when stdout is a terminal and structured logs are off.
pub async fn run_status_line(metrics: Arc<Metrics>, cancel: CancellationToken) {
    let frames = ["⣷", "⣯", "⣟", "⡿", "⢿", "⣻", "⣽", "⣾"];
    let mut index = 0;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let stats = metrics.snapshot();
        let spinner = frames[index % frames.len()];
        index = index.wrapping_add(1);

        let line = format!(
            " {spinner}  hashrate={}  shares={}/{}  uptime={}s",
            stats.hash_rate,
            stats.accepted,
            stats.accepted + stats.rejected,
            stats.uptime_secs,
        );

        let mut out = io::stdout();
        let _ = write!(out, "\r\x1b[2K{line}");
        let _ = out.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let metrics = Metrics::new();
        metrics.add_hashes(8192);
        metrics.add_hashes(4096);
        metrics.record_accepted();
        metrics.record_rejected();
        metrics.record_block_found();

        let stats = metrics.snapshot();
        assert_eq!(stats.total_hashes, 12288);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.blocks_found, 1);
    }

    #[test]
    fn rate_window_resets_between_snapshots() {
        let metrics = Metrics::new();
        metrics.add_hashes(1000);

        let first = metrics.snapshot();
        assert!(first.hash_rate.0 >= 0.0);

        // No new hashes: the next window's rate is zero.
        let second = metrics.snapshot();
        assert_eq!(second.total_hashes, 1000);
        assert_eq!(second.hash_rate.0, 0.0);
    }

    #[test]
    fn shared_updates_from_threads() {
        let metrics = Arc::new(Metrics::new());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let metrics = metrics.clone();
                scope.spawn(move || {
                    for _ in 0..1000 {
                        metrics.add_hashes(1);
                    }
                });
            }
        });

        assert_eq!(metrics.total_hashes(), 4000);
    }
}
