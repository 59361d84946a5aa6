use super::*;

/// Nonces searched per kernel call. Workers only notice job replacement and
/// cancellation at batch boundaries, so this bounds the reaction latency.
pub const NONCE_BATCH_SIZE: u32 = 8192;

/// Shares waiting for the session to drain them. Overflow drops the newest
/// share; the pool simply never sees it.
pub const SHARE_QUEUE_CAPACITY: usize = 8;

/// Publishes the current job to the workers. The job lives under a mutex and
/// workers copy it out together with a version token that increases on every
/// replacement; a version mismatch at a batch boundary aborts the slice.
pub struct JobDispatcher {
    job: Mutex<Option<MiningJob>>,
    version: watch::Sender<u64>,
    shares: mpsc::Sender<ShareInfo>,
}

impl JobDispatcher {
    pub fn new() -> (Self, mpsc::Receiver<ShareInfo>) {
        let (shares, share_rx) = mpsc::channel(SHARE_QUEUE_CAPACITY);
        let (version, _) = watch::channel(0);

        (
            Self {
                job: Mutex::new(None),
                version,
                shares,
            },
            share_rx,
        )
    }

    /// Replaces the current job and bumps the version, invalidating every
    /// slice in flight.
    pub fn set_job(&self, job: MiningJob) {
        let mut guard = self.job.lock().expect("job mutex poisoned");
        *guard = Some(job);
        self.version.send_modify(|version| *version += 1);
    }

    /// Copies the current job, if any, together with the version both were
    /// observed at. Workers hold the lock only for the duration of the copy.
    pub fn snapshot(&self) -> (Option<MiningJob>, u64) {
        let guard = self.job.lock().expect("job mutex poisoned");
        (guard.clone(), *self.version.borrow())
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    pub fn subscribe_version(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Soft-fails on overflow: the newest share is dropped.
    pub fn push_share(&self, share: ShareInfo) {
        if let Err(err) = self.shares.try_send(share) {
            debug!("share queue full, dropping share: {err}");
        }
    }
}

/// Splits the 32-bit nonce space uniformly; the last worker absorbs the
/// remainder. Two workers get `[0, 0x7FFFFFFF]` and `[0x80000000, u32::MAX]`.
pub fn nonce_slice(index: usize, count: usize) -> RangeInclusive<u32> {
    assert!(count > 0 && index < count, "invalid worker index");

    let span = (u64::from(u32::MAX) + 1) / count as u64;
    let start = span * index as u64;
    let end = if index == count - 1 {
        u64::from(u32::MAX)
    } else {
        span * (index as u64 + 1) - 1
    };

    (start as u32)..=(end as u32)
}

/// One mining worker: copy the current job, walk the assigned slice of the
/// nonce space in batches, and fall back to waiting whenever the job version
/// moves on or the slice is exhausted.
pub async fn run_worker<K>(
    index: usize,
    count: usize,
    dispatcher: Arc<JobDispatcher>,
    kernel: Arc<K>,
    metrics: Arc<Metrics>,
    cancel: CancellationToken,
) where
    K: Kernel + Send + Sync + 'static,
{
    let mut version_rx = dispatcher.subscribe_version();
    let slice = nonce_slice(index, count);

    while !cancel.is_cancelled() {
        let (job, version) = dispatcher.snapshot();
        let Some(job) = job else {
            if !wait_for_version_change(&mut version_rx, version, &cancel).await {
                break;
            }
            continue;
        };

        // The worker's share of the nonce space, clipped to the job's own
        // bounds.
        let start = (*slice.start()).max(job.nonce_start);
        let end = (*slice.end()).min(job.nonce_end);
        if start <= end {
            mine_slice(&dispatcher, &kernel, &metrics, &cancel, &job, version, start..=end).await;
        }

        // Either the slice is exhausted or the job changed under us. In the
        // former case park until new work arrives.
        if dispatcher.version() == version
            && !wait_for_version_change(&mut version_rx, version, &cancel).await
        {
            break;
        }
    }
}

async fn mine_slice<K>(
    dispatcher: &Arc<JobDispatcher>,
    kernel: &Arc<K>,
    metrics: &Arc<Metrics>,
    cancel: &CancellationToken,
    job: &MiningJob,
    version: u64,
    slice: RangeInclusive<u32>,
) where
    K: Kernel + Send + Sync + 'static,
{
    let mut base = *slice.start();

    loop {
        let end = base
            .saturating_add(NONCE_BATCH_SIZE - 1)
            .min(*slice.end());

        let batch_job = job.clone();
        let batch_kernel = kernel.clone();
        let result = task::spawn_blocking(move || batch_kernel.search(&batch_job, base..=end));

        match result.await {
            Ok(Some(nonce)) => {
                dispatcher.push_share(ShareInfo {
                    job_id: job.job_id.clone(),
                    extranonce2: job.extranonce2,
                    nonce: nonce.into(),
                    ntime: job.ntime,
                });
                metrics.record_block_found();
            }
            Ok(None) => {
                metrics.add_hashes(u64::from(end - base) + 1);
            }
            Err(err) => {
                error!("kernel batch panicked: {err}");
                return;
            }
        }

        if cancel.is_cancelled() || dispatcher.version() != version {
            return;
        }

        if end == *slice.end() {
            return;
        }
        base = end + 1;
    }
}

/// Returns false when cancelled or the dispatcher is gone.
async fn wait_for_version_change(
    version_rx: &mut watch::Receiver<u64>,
    current: u64,
    cancel: &CancellationToken,
) -> bool {
    loop {
        if *version_rx.borrow_and_update() != current {
            return true;
        }

        tokio::select! {
            _ = cancel.cancelled() => return false,
            changed = version_rx.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
        }
    }
}
