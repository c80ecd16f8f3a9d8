//! A high-throughput, thread-safe AES-CTR_DRBG pseudorandom byte source,
//! implementing NIST SP 800-90A with the derivation function bypassed.
//!
//! The crate wraps the CTR_DRBG state machine in a sharded pool of
//! instances so concurrent readers on different cores do not contend on
//! shared state. Key freshness is enforced by configurable policies: a
//! byte budget serviced by an asynchronous background rekey, wall-clock
//! and request-count reseeds, NIST prediction resistance, and fork
//! detection.
//!
//! # Features
//! - AES-128, AES-192, and AES-256 key sizes.
//! - Zero heap allocations on the steady-state read path.
//! - Lock-free detection of background key rotation via epoch counters.
//! - Personalization strings for domain separation.
//! - Optional power-on known-answer self-tests, continuous block health
//!   test, and zeroization of retired key material.
//! - Implements `std::io::Read` and `rand_core::TryRngCore` for
//!   compatibility with the Rust I/O and random ecosystems.
//!
//! # Example
//! ```
//! use aes_ctr_drbg::{Config, Reader};
//!
//! fn main() {
//!     let reader = Reader::new(Config::default())
//!         .expect("Should construct a reader");
//!
//!     let mut buf = [0u8; 32];
//!     let n = reader.read(&mut buf).expect("Should fill the buffer");
//!     assert_eq!(n, 32);
//! }
//! ```

mod config;
mod drbg;
mod entropy;
mod errors;
mod pool;
mod selftest;
mod state;

use std::io;
use std::sync::{Arc, OnceLock};

use rand_core::{TryCryptoRng, TryRngCore};

pub use config::{Config, KeySize, MAX_PERSONALIZATION_LEN, MAX_RESEED_REQUESTS};
pub use entropy::{EntropySource, OsEntropy};
pub use errors::Error;

use crate::drbg::MAX_BYTES_PER_REQUEST;
use crate::pool::ShardPool;

/// The process-visible DRBG facade.
///
/// A `Reader` owns a sharded pool of DRBG instances and an immutable
/// effective [Config]. Reads borrow an instance from the calling thread's
/// shard, generate into the caller's buffer, and return the instance, so
/// the facade is safe to share across threads without external locking.
pub struct Reader {
    pool: ShardPool,
    config: Arc<Config>,
}

impl Reader {
    /// Construct a reader from a configuration.
    ///
    /// Validates and normalizes the configuration, and runs the
    /// known-answer self-tests when `enable_self_tests` is set. A failed
    /// self-test is terminal for every reader that requests it.
    pub fn new(config: Config) -> Result<Self, Error> {
        let config = Arc::new(config.normalized()?);
        if config.enable_self_tests {
            selftest::run()?;
        }
        Ok(Reader {
            pool: ShardPool::new(Arc::clone(&config)),
            config,
        })
    }

    /// Fill `buf` with pseudorandom bytes, returning the count written.
    /// On success the count always equals `buf.len()`; short reads are
    /// not possible.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, Error> {
        self.read_inner(buf, &[])
    }

    /// Fill `buf` like [Reader::read], additionally folding `additional`
    /// into the key schedule before and after generation.
    pub fn read_with_additional_input(
        &self,
        buf: &mut [u8],
        additional: &[u8],
    ) -> Result<usize, Error> {
        self.read_inner(buf, additional)
    }

    /// Reseed the instance serving the calling thread's shard from fresh
    /// entropy, folding in `additional`. Safe to call concurrently.
    pub fn reseed(&self, additional: &[u8]) -> Result<(), Error> {
        let (index, mut drbg) = self.pool.check_out()?;
        let result = drbg.reseed(additional);
        match &result {
            Err(Error::StateInvalid) => drop(drbg),
            _ => self.pool.check_in(index, drbg),
        }
        result
    }

    /// The effective configuration this reader was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Seed the continuous health test of the instance serving the
    /// calling thread's shard with `block`, as if it had just been
    /// emitted. The next read that emits an identical block fails with
    /// [Error::HealthTestFailure] and the instance is discarded.
    ///
    /// Intended for induced-failure verification of the health test in
    /// validation harnesses. Has no effect unless
    /// `continuous_health_test` is enabled.
    pub fn hold_health_block(&self, block: [u8; 16]) -> Result<(), Error> {
        let (index, mut drbg) = self.pool.check_out()?;
        drbg.hold_block(block);
        self.pool.check_in(index, drbg);
        Ok(())
    }

    fn read_inner(&self, buf: &mut [u8], additional: &[u8]) -> Result<usize, Error> {
        let (index, mut drbg) = self.pool.check_out()?;
        let mut result = Ok(buf.len());
        if buf.is_empty() {
            result = drbg.generate(buf, additional).map(|_| 0);
        } else {
            // NIST caps a single generate request; larger reads are a
            // sequence of requests against the same instance.
            for chunk in buf.chunks_mut(MAX_BYTES_PER_REQUEST) {
                if let Err(err) = drbg.generate(chunk, additional) {
                    result = Err(err);
                    break;
                }
            }
        }
        match &result {
            Err(Error::HealthTestFailure) | Err(Error::StateInvalid) => drop(drbg),
            _ => self.pool.check_in(index, drbg),
        }
        result
    }
}

impl io::Read for Reader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Reader::read(self, buf).map_err(io::Error::other)
    }
}

impl io::Read for &Reader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Reader::read(*self, buf).map_err(io::Error::other)
    }
}

impl TryRngCore for Reader {
    type Error = Error;

    fn try_next_u32(&mut self) -> Result<u32, Error> {
        let mut buf = [0u8; 4];
        self.read(&mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn try_next_u64(&mut self) -> Result<u64, Error> {
        let mut buf = [0u8; 8];
        self.read(&mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), Error> {
        self.read(dst).map(|_| ())
    }
}

impl TryCryptoRng for Reader {}

impl TryRngCore for &Reader {
    type Error = Error;

    fn try_next_u32(&mut self) -> Result<u32, Error> {
        let mut buf = [0u8; 4];
        Reader::read(*self, &mut buf)?;
        Ok(u32::from_be_bytes(buf))
    }

    fn try_next_u64(&mut self) -> Result<u64, Error> {
        let mut buf = [0u8; 8];
        Reader::read(*self, &mut buf)?;
        Ok(u64::from_be_bytes(buf))
    }

    fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), Error> {
        Reader::read(*self, dst).map(|_| ())
    }
}

impl TryCryptoRng for &Reader {}

static DEFAULT_READER: OnceLock<Reader> = OnceLock::new();

/// The lazily constructed process-global reader with the default
/// configuration. Construction failure is returned to the caller and
/// re-attempted on the next access.
pub fn reader() -> Result<&'static Reader, Error> {
    if let Some(reader) = DEFAULT_READER.get() {
        return Ok(reader);
    }
    let built = Reader::new(Config::default())?;
    Ok(DEFAULT_READER.get_or_init(|| built))
}

/// Fill `dest` from the process-global reader.
pub fn fill(dest: &mut [u8]) -> Result<usize, Error> {
    reader()?.read(dest)
}
