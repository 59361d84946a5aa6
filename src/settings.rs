use super::*;

/// Handshake deadline for subscribe and authorize, and the socket connect
/// timeout.
pub(crate) const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolved miner configuration: CLI arguments and environment merged, the
/// worker count clamped to the machine.
#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(crate) endpoint: String,
    pub(crate) username: String,
    pub(crate) password: Option<String>,
    pub(crate) workers: usize,
    pub(crate) timeout: Duration,
    pub(crate) once: bool,
}

impl Settings {
    pub(crate) fn from_mine_options(options: &subcommand::mine::Mine) -> Result<Self> {
        let endpoint = options
            .endpoint
            .clone()
            .ok_or_else(|| anyhow!("stratum endpoint required"))?;

        let username = options
            .username
            .clone()
            .ok_or_else(|| anyhow!("username required"))?;

        let mut system = System::new();
        system.refresh_cpu_all();
        let available = system.cpus().len().max(1);

        let workers = match options.workers {
            Some(workers) if workers > 0 => workers.min(available),
            Some(_) => bail!("worker count must be at least 1"),
            None => available,
        };

        Ok(Self {
            endpoint,
            username,
            password: options.password.clone(),
            workers,
            timeout: HANDSHAKE_TIMEOUT,
            once: options.once,
        })
    }
}
