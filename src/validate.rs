//! Cross checks against a block explorer
//!
//! Decoded records can be compared with the json a block explorer serves
//! for the same hash. Fetching is left to a `RemoteSource`; this module
//! only limits the rate of the requests and compares the fields.
//!
//! Results are tri-state: `None` when no comparison was made, otherwise
//! whether all compared fields matched.

use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::block::Block;
use crate::hash::Hash;
use crate::storage::Storage;
use crate::transaction::Transaction;
use crate::util;

/// Explorers accept one request per this window
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10);


/// Block as served by the explorer; other keys are ignored
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RemoteBlock {
    pub hash:       String,
    pub size:       u64,
    pub mrkl_root:  String,
    pub n_tx:       u64,
    pub prev_block: String,
    pub nonce:      u64,
    pub time:       u64,
}

impl RemoteBlock {
    pub fn from_json(json: &str) -> serde_json::Result<RemoteBlock> {
        serde_json::from_str(json)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RemoteInput {
    #[serde(default)]
    pub script: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RemoteOutput {
    #[serde(default)]
    pub script: String,

    #[serde(default)]
    pub addr:   Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RemoteTransaction {
    pub inputs: Vec<RemoteInput>,
    pub out:    Vec<RemoteOutput>,
}

impl RemoteTransaction {
    pub fn from_json(json: &str) -> serde_json::Result<RemoteTransaction> {
        serde_json::from_str(json)
    }
}


impl<S: Storage> Block<S> {

    /// Names of the fields that differ from `remote`
    pub fn mismatches(&self, remote: &RemoteBlock) -> Vec<&'static str> {
        let checks = [
            ("hash",       self.hash().to_hex() == remote.hash),
            ("size",       u64::from(self.declared_size()) == remote.size),
            ("mrkl_root",  self.merkle_root().to_hex() == remote.mrkl_root),
            ("n_tx",       self.tx_count() == remote.n_tx),
            ("prev_block", self.prev_hash().to_hex() == remote.prev_block),
            ("nonce",      u64::from(self.nonce()) == remote.nonce),
            ("time",       u64::from(self.timestamp()) == remote.time),
        ];

        checks.iter().filter(|&&(_, ok)| !ok).map(|&(name, _)| name).collect()
    }

    /// None without a remote block, otherwise whether all fields match
    pub fn api_validate(&self, remote: Option<&RemoteBlock>) -> Option<bool> {
        remote.map(|remote| self.mismatches(remote).is_empty())
    }
}

impl<S: Storage> Transaction<S> {

    /// Names of the fields that differ from `remote`
    ///
    /// Compares the script of the first input, and the script and address
    /// of the first output.
    pub fn mismatches(&self, remote: &RemoteTransaction) -> Vec<&'static str> {
        let input_script = match (self.inputs().first(), remote.inputs.first()) {
            (Some(local), Some(remote)) => util::to_hex(local.script()) == remote.script,
            _ => false,
        };

        let (output_script, output_address) = match (self.outputs().first(), remote.out.first()) {
            (Some(local), Some(remote)) => (
                util::to_hex(local.script()) == remote.script,
                local.output_address() == remote.addr,
            ),
            _ => (false, false),
        };

        let checks = [
            ("input_script",   input_script),
            ("output_script",  output_script),
            ("output_address", output_address),
        ];
        checks.iter().filter(|&&(_, ok)| !ok).map(|&(name, _)| name).collect()
    }

    pub fn api_validate(&self, remote: Option<&RemoteTransaction>) -> Option<bool> {
        remote.map(|remote| self.mismatches(remote).is_empty())
    }
}


/// What to do with a request inside the window of the previous one
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatePolicy {
    Wait,
    Skip,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permit {
    /// Go ahead now
    Go,

    /// Go ahead after this delay
    Wait(Duration),

    /// Don't make the request
    Skip,
}

/// Allows one request per window
#[derive(Clone, Debug)]
pub struct RateLimiter {
    window:       Duration,
    policy:       RatePolicy,
    next_allowed: Option<Instant>,
}

impl RateLimiter {
    pub fn new(window: Duration, policy: RatePolicy) -> RateLimiter {
        RateLimiter {
            window:       window,
            policy:       policy,
            next_allowed: None,
        }
    }

    pub fn policy(&self) -> RatePolicy {
        self.policy
    }

    /// Decides on a request made at `now`; granted requests are recorded
    pub fn permit_at(&mut self, now: Instant) -> Permit {
        match self.next_allowed {
            Some(next) if now < next => match self.policy {
                RatePolicy::Skip => Permit::Skip,
                RatePolicy::Wait => {
                    self.next_allowed = Some(next + self.window);
                    Permit::Wait(next - now)
                },
            },
            _ => {
                self.next_allowed = Some(now + self.window);
                Permit::Go
            },
        }
    }

    /// Returns whether a request may be made, sleeping first if the policy
    /// is to wait
    pub fn acquire(&mut self) -> bool {
        match self.permit_at(Instant::now()) {
            Permit::Go => true,
            Permit::Wait(delay) => {
                thread::sleep(delay);
                true
            },
            Permit::Skip => false,
        }
    }

    /// Backs off for an extra window after a failed connection
    pub fn penalize_at(&mut self, now: Instant) {
        self.next_allowed = Some(now + self.window * 2);
    }
}

impl Default for RateLimiter {
    fn default() -> RateLimiter {
        RateLimiter::new(DEFAULT_WINDOW, RatePolicy::Skip)
    }
}


#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote source unavailable: {0}")]
    Unavailable(String),

    #[error("record not found")]
    NotFound,
}

/// Fetches records from a block explorer, by display hash
pub trait RemoteSource {
    fn fetch_block(&self, hash: &Hash) -> Result<RemoteBlock, RemoteError>;

    fn fetch_transaction(&self, hash: &Hash) -> Result<RemoteTransaction, RemoteError>;
}

/// Rate limited validation of records against a `RemoteSource`
pub struct Validator<R: RemoteSource> {
    source:  R,
    limiter: RateLimiter,
    logger:  slog::Logger,
}

impl<R: RemoteSource> Validator<R> {
    pub fn new(source: R, limiter: RateLimiter) -> Validator<R> {
        Validator {
            source:  source,
            limiter: limiter,
            logger:  slog::Logger::root(slog::Discard, o!()),
        }
    }

    pub fn with_logger(mut self, logger: slog::Logger) -> Validator<R> {
        self.logger = logger;
        self
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn validate_block<S: Storage>(&mut self, block: &Block<S>) -> Option<bool> {
        let hash = block.hash();
        let remote = self.fetch(&hash, |source, hash| source.fetch_block(hash))?;

        let mismatches = block.mismatches(&remote);
        if !mismatches.is_empty() {
            warn!(self.logger, "block differs from remote";
                "hash" => %hash, "fields" => mismatches.join(","));
        }
        block.api_validate(Some(&remote))
    }

    pub fn validate_transaction<S: Storage>(&mut self, tx: &Transaction<S>) -> Option<bool> {
        let hash = tx.hash();
        let remote = self.fetch(&hash, |source, hash| source.fetch_transaction(hash))?;

        let mismatches = tx.mismatches(&remote);
        if !mismatches.is_empty() {
            warn!(self.logger, "transaction differs from remote";
                "hash" => %hash, "fields" => mismatches.join(","));
        }
        tx.api_validate(Some(&remote))
    }

    fn fetch<T, F>(&mut self, hash: &Hash, fetch: F) -> Option<T>
        where F: FnOnce(&R, &Hash) -> Result<T, RemoteError>
    {
        if !self.limiter.acquire() {
            debug!(self.logger, "validation skipped by rate limit"; "hash" => %hash);
            return None;
        }

        match fetch(&self.source, hash) {
            Ok(remote) => Some(remote),
            Err(e) => {
                debug!(self.logger, "validation not possible"; "hash" => %hash, "error" => %e);
                if let RemoteError::Unavailable(_) = e {
                    self.limiter.penalize_at(Instant::now());
                }
                None
            },
        }
    }
}
