use super::*;

mod authorize;
mod client;
mod difficulty;
mod error;
mod event;
mod extranonce;
mod job_id;
mod merkle;
mod message;
mod nbits;
mod nonce;
mod notify;
mod ntime;
mod prev_hash;
mod set_difficulty;
mod submit;
mod subscribe;
mod version;

pub use {
    authorize::Authorize,
    client::{Client, ClientConfig, SessionState},
    difficulty::Difficulty,
    error::{ClientError, JsonRpcError},
    event::Event,
    extranonce::Extranonce,
    job_id::JobId,
    merkle::{MerkleBranch, merkle_root},
    message::{Id, Message},
    nbits::Nbits,
    nonce::Nonce,
    notify::Notify,
    ntime::Ntime,
    prev_hash::PrevHash,
    set_difficulty::SetDifficulty,
    submit::Submit,
    subscribe::{Subscribe, SubscribeResult},
    version::Version,
};

/// Branches beyond this count are dropped when a job is parsed.
pub const MAX_MERKLE_BRANCHES: usize = 16;
