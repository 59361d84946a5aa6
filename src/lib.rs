use {
    anyhow::{Context, anyhow, bail, ensure},
    arguments::Arguments,
    bitcoin::{BlockHash, CompactTarget, hashes::Hash},
    byteorder::{BigEndian, ByteOrder, LittleEndian},
    clap::Parser,
    derive_more::Display,
    dispatcher::{JobDispatcher, NONCE_BATCH_SIZE, run_worker},
    hash_rate::HashRate,
    job::MiningJob,
    kernel::{Kernel, SoftwareKernel},
    primitive_types::U256,
    serde::{
        Deserialize, Serialize, Serializer,
        de::{self, Deserializer},
        ser::SerializeSeq,
    },
    serde_json::Value,
    serde_with::{DeserializeFromStr, SerializeDisplay},
    settings::Settings,
    share::ShareInfo,
    stats::Metrics,
    std::{
        collections::BTreeMap,
        fmt,
        io::{self, IsTerminal, Write},
        ops::RangeInclusive,
        process,
        str::FromStr,
        sync::{
            Arc, LazyLock, Mutex,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    },
    stratum::{
        Client, ClientConfig, Difficulty, Event, Extranonce, JobId, Nonce, Notify, Ntime,
    },
    subcommand::Subcommand,
    sysinfo::System,
    target::ShareTarget,
    tokio::{
        io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter},
        net::TcpStream,
        runtime::Runtime,
        signal::ctrl_c,
        sync::{broadcast, mpsc, oneshot, watch},
        task::{self, JoinSet},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
    tracing_subscriber::EnvFilter,
};

mod arguments;
pub mod dispatcher;
pub mod hash_rate;
pub mod job;
pub mod kernel;
mod settings;
pub mod sha256;
pub mod share;
pub mod stats;
pub mod stratum;
mod subcommand;
pub mod target;

pub const USER_AGENT: &str = "drill/0.1.0";

type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

pub fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Arguments::parse();

    match args.run() {
        Err(err) => {
            error!("error: {err:#}");
            process::exit(1);
        }
        Ok(_) => {
            process::exit(0);
        }
    }
}
