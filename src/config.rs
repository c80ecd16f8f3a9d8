use std::sync::Arc;
use std::time::Duration;

use crate::entropy::EntropySource;
use crate::errors::Error;

/// Maximum length of a personalization string in bytes.
pub const MAX_PERSONALIZATION_LEN: usize = 128;

/// Upper bound on the request-count reseed threshold (NIST SP 800-90A
/// limits CTR_DRBG to 2^48 generate requests between reseeds).
pub const MAX_RESEED_REQUESTS: u64 = 1 << 48;

/// AES key size used by the DRBG's block cipher.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum KeySize {
    /// AES-128, 16-byte keys.
    Aes128,
    /// AES-192, 24-byte keys.
    Aes192,
    /// AES-256, 32-byte keys.
    #[default]
    Aes256,
}

impl KeySize {
    /// Key length in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            KeySize::Aes128 => 16,
            KeySize::Aes192 => 24,
            KeySize::Aes256 => 32,
        }
    }

    /// CTR_DRBG seed length: key length plus one 16-byte block.
    pub(crate) const fn seed_len(self) -> usize {
        self.bytes() + 16
    }
}

impl TryFrom<usize> for KeySize {
    type Error = Error;

    /// Convert a key length in bytes into a [KeySize]. Any length other
    /// than 16, 24, or 32 is rejected with [Error::InvalidKeySize].
    fn try_from(bytes: usize) -> Result<Self, Error> {
        match bytes {
            16 => Ok(KeySize::Aes128),
            24 => Ok(KeySize::Aes192),
            32 => Ok(KeySize::Aes256),
            other => Err(Error::InvalidKeySize(other)),
        }
    }
}

/// Configuration for a [Reader](crate::Reader) and the DRBG instances it
/// pools. Construct with [Config::default], override fields with the
/// chainable `with_*` methods, and pass the result to
/// [Reader::new](crate::Reader::new). The effective configuration is
/// immutable once the reader exists.
#[derive(Clone)]
pub struct Config {
    /// AES key size. Defaults to AES-256.
    pub key_size: KeySize,
    /// Byte budget per key before a background rekey is requested.
    /// Defaults to 1 GiB. Only enforced when `enable_key_rotation` is set.
    pub max_bytes_per_key: u64,
    /// Entropy draw attempts during instantiate and synchronous reseed.
    /// Defaults to 3.
    pub max_init_retries: usize,
    /// Entropy draw attempts for one background rekey. Defaults to 5.
    pub max_rekey_attempts: usize,
    /// Initial backoff between background rekey attempts. Defaults to
    /// 100ms.
    pub rekey_backoff: Duration,
    /// Cap on the exponential rekey backoff. Defaults to 2s.
    pub max_rekey_backoff: Duration,
    /// Enables the byte-budget asynchronous rekey policy. Defaults to
    /// false.
    pub enable_key_rotation: bool,
    /// Domain-separation input folded into the initial seed. At most
    /// [MAX_PERSONALIZATION_LEN] bytes. Defaults to empty.
    pub personalization: Vec<u8>,
    /// Hold a cached zero buffer on the reader for update staging.
    /// Defaults to false.
    pub use_zero_buffer: bool,
    /// Size of the cached zero buffer in bytes. Defaults to 0.
    pub default_buffer_size: usize,
    /// Number of instance pool shards. Values below 1 are treated as 1.
    /// Defaults to 1.
    pub shards: usize,
    /// Wall-clock interval between synchronous reseeds. Zero disables the
    /// policy. Defaults to zero.
    pub reseed_interval: Duration,
    /// Generate requests between synchronous reseeds, clamped to
    /// [MAX_RESEED_REQUESTS]. Zero disables the policy. Defaults to zero.
    pub reseed_requests: u64,
    /// Reseed from fresh entropy before every generate. Defaults to false.
    pub prediction_resistance: bool,
    /// Check the process id every N requests and reseed when it changed.
    /// Zero disables the policy. Defaults to zero.
    pub fork_detection_interval: u64,
    /// Run the known-answer self-tests during reader construction.
    /// Defaults to false.
    pub enable_self_tests: bool,
    /// Zero retired working-state key material when its last holder
    /// drops it. The instance counter and held blocks are always wiped
    /// on retirement. Defaults to false.
    pub enable_zeroization: bool,
    /// Compare consecutive output blocks and fail on repetition.
    /// Defaults to false.
    pub continuous_health_test: bool,
    /// Entropy source override. `None` selects the operating system
    /// source, [OsEntropy](crate::OsEntropy).
    pub entropy: Option<Arc<dyn EntropySource>>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            key_size: KeySize::Aes256,
            max_bytes_per_key: 1 << 30,
            max_init_retries: 3,
            max_rekey_attempts: 5,
            rekey_backoff: Duration::from_millis(100),
            max_rekey_backoff: Duration::from_secs(2),
            enable_key_rotation: false,
            personalization: Vec::new(),
            use_zero_buffer: false,
            default_buffer_size: 0,
            shards: 1,
            reseed_interval: Duration::ZERO,
            reseed_requests: 0,
            prediction_resistance: false,
            fork_detection_interval: 0,
            enable_self_tests: false,
            enable_zeroization: false,
            continuous_health_test: false,
            entropy: None,
        }
    }
}

impl Config {
    /// Set the AES key size.
    pub fn with_key_size(mut self, key_size: KeySize) -> Self {
        self.key_size = key_size;
        self
    }

    /// Set the byte budget per key.
    pub fn with_max_bytes_per_key(mut self, max: u64) -> Self {
        self.max_bytes_per_key = max;
        self
    }

    /// Set the entropy draw attempts for instantiate and reseed.
    pub fn with_max_init_retries(mut self, retries: usize) -> Self {
        self.max_init_retries = retries;
        self
    }

    /// Set the entropy draw attempts for one background rekey.
    pub fn with_max_rekey_attempts(mut self, attempts: usize) -> Self {
        self.max_rekey_attempts = attempts;
        self
    }

    /// Set the initial backoff between background rekey attempts.
    pub fn with_rekey_backoff(mut self, backoff: Duration) -> Self {
        self.rekey_backoff = backoff;
        self
    }

    /// Set the cap on the exponential rekey backoff.
    pub fn with_max_rekey_backoff(mut self, backoff: Duration) -> Self {
        self.max_rekey_backoff = backoff;
        self
    }

    /// Enable or disable the byte-budget rekey policy.
    pub fn with_enable_key_rotation(mut self, enabled: bool) -> Self {
        self.enable_key_rotation = enabled;
        self
    }

    /// Set the personalization string.
    pub fn with_personalization(mut self, personalization: impl Into<Vec<u8>>) -> Self {
        self.personalization = personalization.into();
        self
    }

    /// Enable or disable the cached zero buffer.
    pub fn with_use_zero_buffer(mut self, enabled: bool) -> Self {
        self.use_zero_buffer = enabled;
        self
    }

    /// Set the cached zero buffer size.
    pub fn with_default_buffer_size(mut self, size: usize) -> Self {
        self.default_buffer_size = size;
        self
    }

    /// Set the shard count for the instance pool.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Set the time-based reseed interval.
    pub fn with_reseed_interval(mut self, interval: Duration) -> Self {
        self.reseed_interval = interval;
        self
    }

    /// Set the request-count reseed threshold. Values above
    /// [MAX_RESEED_REQUESTS] are clamped.
    pub fn with_reseed_requests(mut self, requests: u64) -> Self {
        self.reseed_requests = requests.min(MAX_RESEED_REQUESTS);
        self
    }

    /// Enable or disable prediction resistance.
    pub fn with_prediction_resistance(mut self, enabled: bool) -> Self {
        self.prediction_resistance = enabled;
        self
    }

    /// Set the fork-detection check interval in requests.
    pub fn with_fork_detection_interval(mut self, interval: u64) -> Self {
        self.fork_detection_interval = interval;
        self
    }

    /// Enable or disable the construction-time self-tests.
    pub fn with_self_tests(mut self, enabled: bool) -> Self {
        self.enable_self_tests = enabled;
        self
    }

    /// Enable or disable zeroization of retired state.
    pub fn with_zeroization(mut self, enabled: bool) -> Self {
        self.enable_zeroization = enabled;
        self
    }

    /// Enable or disable the continuous health test.
    pub fn with_continuous_health_test(mut self, enabled: bool) -> Self {
        self.continuous_health_test = enabled;
        self
    }

    /// Replace the entropy source.
    pub fn with_entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = Some(entropy);
        self
    }

    /// Validate limits and normalize out-of-range values before the
    /// configuration becomes effective.
    pub(crate) fn normalized(mut self) -> Result<Self, Error> {
        if self.personalization.len() > MAX_PERSONALIZATION_LEN {
            return Err(Error::PersonalizationTooLong(self.personalization.len()));
        }
        if self.shards == 0 {
            self.shards = 1;
        }
        self.reseed_requests = self.reseed_requests.min(MAX_RESEED_REQUESTS);
        Ok(self)
    }
}
