use std::process;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Instant;

use zeroize::Zeroize;

use crate::config::Config;
use crate::entropy::{self, EntropySource, OsEntropy};
use crate::errors::Error;
use crate::state::{BLOCK_SIZE, MAX_KEY_LEN, MAX_SEED_LEN, WorkingState, increment};

/// NIST SP 800-90A cap on one generate request (2^19 bits). Larger reads
/// are split into multiple requests by the reader.
pub(crate) const MAX_BYTES_PER_REQUEST: usize = 1 << 16;

/// The published working state plus the successor counter a background
/// rekey hands to the owning instance.
struct Slot {
    state: Arc<WorkingState>,
    fresh_v: Option<[u8; BLOCK_SIZE]>,
}

/// State shared between a DRBG instance and its background rekey worker.
pub(crate) struct Shared {
    slot: Mutex<Slot>,
    epoch: AtomicU64,
    usage: AtomicU64,
    rekeying: AtomicBool,
}

#[cfg(test)]
impl Shared {
    fn usage(&self) -> u64 {
        self.usage.load(Ordering::Acquire)
    }

    fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    fn rekey_in_flight(&self) -> bool {
        self.rekeying.load(Ordering::Acquire)
    }
}

/// CTR_DRBG update with the derivation function bypassed: produce
/// `seed_len` bytes of keystream under the current key, XOR in the
/// provided input, and split the result into the successor key and V.
fn ctr_update(
    state: &WorkingState,
    provided: &[u8; MAX_SEED_LEN],
    seed_len: usize,
    v: &mut [u8; BLOCK_SIZE],
    key_out: &mut [u8; MAX_KEY_LEN],
) {
    let key_len = seed_len - BLOCK_SIZE;
    let mut temp = [0u8; MAX_SEED_LEN];
    let mut block = [0u8; BLOCK_SIZE];
    let mut filled = 0;
    while filled < seed_len {
        increment(v);
        state.cipher.encrypt_block(v, &mut block);
        let take = (seed_len - filled).min(BLOCK_SIZE);
        temp[filled..filled + take].copy_from_slice(&block[..take]);
        filled += take;
    }
    for (t, p) in temp[..seed_len].iter_mut().zip(provided[..seed_len].iter()) {
        *t ^= p;
    }
    key_out[..key_len].copy_from_slice(&temp[..key_len]);
    v.copy_from_slice(&temp[key_len..seed_len]);
    temp.zeroize();
    block.zeroize();
}

/// Truncate or zero-pad `input` into the first `seed_len` bytes of `dest`.
fn pad_seed(dest: &mut [u8; MAX_SEED_LEN], input: &[u8], seed_len: usize) {
    dest[..seed_len].fill(0);
    let take = input.len().min(seed_len);
    dest[..take].copy_from_slice(&input[..take]);
}

/// One NIST SP 800-90A CTR_DRBG instance.
///
/// The instance owns the working counter V exclusively; the pool's
/// check-out discipline guarantees a single holder. Key material lives in
/// an immutable [WorkingState] published through [Shared] so a background
/// rekey can swap it without blocking the holder.
pub(crate) struct Drbg {
    v: [u8; BLOCK_SIZE],
    state: Arc<WorkingState>,
    state_epoch: u64,
    spare: Option<Arc<WorkingState>>,
    shared: Arc<Shared>,
    config: Arc<Config>,
    entropy: Arc<dyn EntropySource>,
    requests: u64,
    last_reseed: Instant,
    pid: u32,
    last_block: Option<[u8; BLOCK_SIZE]>,
    dead: bool,
}

impl Drbg {
    /// Instantiate from fresh entropy folded with the configured
    /// personalization string.
    pub(crate) fn new(config: Arc<Config>) -> Result<Self, Error> {
        if config.enable_self_tests {
            crate::selftest::run()?;
        }
        let entropy: Arc<dyn EntropySource> = match &config.entropy {
            Some(source) => Arc::clone(source),
            None => Arc::new(OsEntropy),
        };
        let key_size = config.key_size;
        let seed_len = key_size.seed_len();

        let mut seed = [0u8; MAX_SEED_LEN];
        entropy::draw(entropy.as_ref(), &mut seed[..seed_len], config.max_init_retries)?;
        for (s, p) in seed[..seed_len].iter_mut().zip(config.personalization.iter()) {
            *s ^= p;
        }

        // Update from the all-zero key and counter, per SP 800-90A 10.2.1.3.1.
        let mut key = [0u8; MAX_KEY_LEN];
        let mut v = [0u8; BLOCK_SIZE];
        let boot = WorkingState::new(key_size, &key, config.enable_zeroization);
        ctr_update(&boot, &seed, seed_len, &mut v, &mut key);
        drop(boot);
        seed.zeroize();

        let state = Arc::new(WorkingState::new(key_size, &key, config.enable_zeroization));
        key.zeroize();
        let shared = Arc::new(Shared {
            slot: Mutex::new(Slot {
                state: Arc::clone(&state),
                fresh_v: None,
            }),
            epoch: AtomicU64::new(0),
            usage: AtomicU64::new(0),
            rekeying: AtomicBool::new(false),
        });

        Ok(Drbg {
            v,
            state,
            state_epoch: 0,
            spare: None,
            shared,
            config,
            entropy,
            requests: 0,
            last_reseed: Instant::now(),
            pid: process::id(),
            last_block: None,
            dead: false,
        })
    }

    /// Emit `buf.len()` bytes of keystream, folding `additional` into the
    /// key schedule before and after emission when present. Freshness
    /// policies run first and may reseed synchronously or schedule a
    /// background rekey.
    pub(crate) fn generate(&mut self, buf: &mut [u8], additional: &[u8]) -> Result<(), Error> {
        if self.dead {
            return Err(Error::StateInvalid);
        }
        debug_assert!(buf.len() <= MAX_BYTES_PER_REQUEST);

        self.adopt_published();
        self.enforce_policies(buf.len())?;
        if buf.is_empty() {
            // A zero-length request performs the policy checks only and
            // does not count against the request budget.
            return Ok(());
        }

        let seed_len = self.config.key_size.seed_len();
        let mut update_input = [0u8; MAX_SEED_LEN];
        if !additional.is_empty() {
            pad_seed(&mut update_input, additional, seed_len);
            self.update_and_publish(&update_input);
        }

        let state = Arc::clone(&self.state);
        for chunk in buf.chunks_mut(BLOCK_SIZE) {
            increment(&mut self.v);
            if chunk.len() == BLOCK_SIZE {
                state.cipher.encrypt_block(&self.v, chunk);
                if self.config.continuous_health_test {
                    self.health_check(chunk)?;
                }
            } else {
                let mut block = [0u8; BLOCK_SIZE];
                state.cipher.encrypt_block(&self.v, &mut block);
                if self.config.continuous_health_test {
                    self.health_check(&block)?;
                }
                chunk.copy_from_slice(&block[..chunk.len()]);
                block.zeroize();
            }
        }
        drop(state);

        self.update_and_publish(&update_input);
        update_input.zeroize();

        self.shared
            .usage
            .fetch_add(buf.len() as u64, Ordering::AcqRel);
        self.requests += 1;
        Ok(())
    }

    /// Synchronous reseed: fold fresh entropy with the additional input
    /// into the key schedule and reset the freshness counters.
    pub(crate) fn reseed(&mut self, additional: &[u8]) -> Result<(), Error> {
        if self.dead {
            return Err(Error::StateInvalid);
        }
        self.adopt_published();

        let seed_len = self.config.key_size.seed_len();
        let mut seed = [0u8; MAX_SEED_LEN];
        entropy::draw(
            self.entropy.as_ref(),
            &mut seed[..seed_len],
            self.config.max_init_retries,
        )?;
        for (s, a) in seed[..seed_len].iter_mut().zip(additional.iter()) {
            *s ^= a;
        }
        self.update_and_publish(&seed);
        seed.zeroize();

        self.shared.usage.store(0, Ordering::Release);
        self.requests = 0;
        self.last_reseed = Instant::now();
        Ok(())
    }

    /// Overwrite the counter and held buffers and retire the instance.
    /// Every subsequent operation fails with [Error::StateInvalid].
    /// Retired working states wipe their key material per the
    /// zeroization policy when their last holder drops them.
    pub(crate) fn zeroize(&mut self) {
        self.v.zeroize();
        if let Some(block) = self.last_block.as_mut() {
            block.zeroize();
        }
        self.last_block = None;
        self.spare = None;
        self.dead = true;
    }

    /// Apply whichever freshness policies are due: the byte budget
    /// schedules a background rekey, everything else folds into a single
    /// synchronous reseed.
    fn enforce_policies(&mut self, n: usize) -> Result<(), Error> {
        let config = Arc::clone(&self.config);
        if config.enable_key_rotation {
            let usage = self.shared.usage.load(Ordering::Acquire);
            if usage.saturating_add(n as u64) > config.max_bytes_per_key {
                self.schedule_rekey();
            }
        }

        let mut reseed_due = false;
        if !config.reseed_interval.is_zero()
            && self.last_reseed.elapsed() >= config.reseed_interval
        {
            reseed_due = true;
        }
        if config.reseed_requests > 0 && self.requests + 1 > config.reseed_requests {
            reseed_due = true;
        }
        if config.prediction_resistance {
            reseed_due = true;
        }
        if config.fork_detection_interval > 0
            && self.requests % config.fork_detection_interval == 0
        {
            let pid = process::id();
            if pid != self.pid {
                self.pid = pid;
                reseed_due = true;
            }
        }
        if reseed_due {
            self.reseed(&[])?;
        }
        Ok(())
    }

    /// Run the update and install the successor state, recycling the
    /// retired allocation so the steady-state generate stays off the heap.
    fn update_and_publish(&mut self, provided: &[u8; MAX_SEED_LEN]) {
        let seed_len = self.config.key_size.seed_len();
        let mut key = [0u8; MAX_KEY_LEN];
        ctr_update(&self.state, provided, seed_len, &mut self.v, &mut key);

        let next = match self.spare.take() {
            Some(mut arc) => match Arc::get_mut(&mut arc) {
                Some(state) => {
                    state.rekey(&key);
                    arc
                }
                None => Arc::new(WorkingState::new(
                    self.config.key_size,
                    &key,
                    self.config.enable_zeroization,
                )),
            },
            None => Arc::new(WorkingState::new(
                self.config.key_size,
                &key,
                self.config.enable_zeroization,
            )),
        };
        key.zeroize();

        let mut slot = self.shared.slot.lock().expect("state slot poisoned");
        let retired = std::mem::replace(&mut slot.state, Arc::clone(&next));
        slot.fresh_v = None;
        self.state_epoch = self.shared.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        drop(slot);

        self.state = next;
        self.spare = Some(retired);
    }

    /// Adopt a state published since this instance last looked, along
    /// with the successor counter a background rekey left behind.
    fn adopt_published(&mut self) {
        if self.shared.epoch.load(Ordering::Acquire) == self.state_epoch {
            return;
        }
        let mut slot = self.shared.slot.lock().expect("state slot poisoned");
        self.state = Arc::clone(&slot.state);
        if let Some(v) = slot.fresh_v.take() {
            self.v = v;
            self.requests = 0;
            self.last_reseed = Instant::now();
        }
        self.state_epoch = self.shared.epoch.load(Ordering::Acquire);
    }

    fn health_check(&mut self, block: &[u8]) -> Result<(), Error> {
        if let Some(prev) = &self.last_block {
            if prev[..] == *block {
                self.zeroize();
                return Err(Error::HealthTestFailure);
            }
        }
        let mut held = [0u8; BLOCK_SIZE];
        held.copy_from_slice(block);
        self.last_block = Some(held);
        Ok(())
    }

    /// Seed the continuous health test's held block, as if `block` had
    /// just been emitted.
    pub(crate) fn hold_block(&mut self, block: [u8; BLOCK_SIZE]) {
        self.last_block = Some(block);
    }

    /// Kick off a background rekey unless one is already in flight.
    fn schedule_rekey(&self) {
        if self
            .shared
            .rekeying
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        let shared = Arc::clone(&self.shared);
        let config = Arc::clone(&self.config);
        let entropy = Arc::clone(&self.entropy);
        let v = self.v;
        let spawned = thread::Builder::new()
            .name("aes-ctr-drbg-rekey".into())
            .spawn(move || rekey_worker(shared, config, entropy, v));
        if let Err(err) = spawned {
            log::warn!("failed to spawn rekey worker: {err}");
            self.shared.rekeying.store(false, Ordering::Release);
        }
    }

    #[cfg(test)]
    pub(crate) fn counter(&self) -> [u8; BLOCK_SIZE] {
        self.v
    }

    #[cfg(test)]
    pub(crate) fn set_counter(&mut self, v: [u8; BLOCK_SIZE]) {
        self.v = v;
    }

    #[cfg(test)]
    pub(crate) fn last_reseed(&self) -> Instant {
        self.last_reseed
    }
}

impl Drop for Drbg {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// Background rekey: draw fresh entropy with exponential backoff, run the
/// reseed update against the currently published state, and hand the
/// result back through the slot. Failure leaves the prior state in place.
fn rekey_worker(
    shared: Arc<Shared>,
    config: Arc<Config>,
    entropy: Arc<dyn EntropySource>,
    mut v: [u8; BLOCK_SIZE],
) {
    let seed_len = config.key_size.seed_len();
    let attempts = config.max_rekey_attempts.max(1);
    let mut backoff = config.rekey_backoff;
    for attempt in 1..=attempts {
        let mut seed = [0u8; MAX_SEED_LEN];
        match entropy.fill(&mut seed[..seed_len]) {
            Ok(()) => {
                let current = {
                    let slot = shared.slot.lock().expect("state slot poisoned");
                    Arc::clone(&slot.state)
                };
                let mut key = [0u8; MAX_KEY_LEN];
                ctr_update(&current, &seed, seed_len, &mut v, &mut key);
                let next = Arc::new(WorkingState::new(
                    config.key_size,
                    &key,
                    config.enable_zeroization,
                ));
                key.zeroize();
                seed.zeroize();

                let mut slot = shared.slot.lock().expect("state slot poisoned");
                slot.state = next;
                slot.fresh_v = Some(v);
                shared.epoch.fetch_add(1, Ordering::AcqRel);
                drop(slot);
                shared.usage.store(0, Ordering::Release);
                shared.rekeying.store(false, Ordering::Release);
                log::debug!("background rekey complete after {attempt} attempt(s)");
                return;
            }
            Err(err) => {
                log::warn!(
                    "background rekey entropy draw failed (attempt {attempt}/{attempts}): {err}"
                );
                if attempt < attempts {
                    thread::sleep(backoff);
                    backoff = (backoff * 2).min(config.max_rekey_backoff);
                }
            }
        }
    }
    shared.rekeying.store(false, Ordering::Release);
    log::warn!("background rekey abandoned after {attempts} attempts, keeping current key");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use hex_literal::hex;

    use super::*;
    use crate::selftest::FixedEntropy;

    fn instance(config: Config) -> Drbg {
        let config = config.normalized().expect("config should normalize");
        Drbg::new(Arc::new(config)).expect("instantiate should succeed")
    }

    #[test]
    fn generate_fills_and_advances() {
        let mut drbg = instance(Config::default());
        let mut first = [0u8; 32];
        drbg.generate(&mut first, &[]).expect("generate");
        assert!(first.iter().any(|&b| b != 0));

        let mut second = [0u8; 32];
        drbg.generate(&mut second, &[]).expect("generate");
        assert_ne!(first, second);
        assert_eq!(drbg.requests, 2);
    }

    #[test]
    fn zero_length_generate_is_free() {
        let mut drbg = instance(Config::default());
        drbg.generate(&mut [], &[]).expect("generate");
        assert_eq!(drbg.requests, 0);
        assert_eq!(drbg.shared.usage(), 0);
    }

    #[test]
    fn counter_wraps_to_zero() {
        let mut drbg = instance(Config::default());
        drbg.set_counter([0xff; BLOCK_SIZE]);
        let mut block = [0u8; BLOCK_SIZE];
        drbg.generate(&mut block, &[]).expect("generate");
        assert!(block.iter().any(|&b| b != 0));
        // The single-block emission wrapped V to zero; the post-generate
        // update then replaced it with keystream.
        assert_ne!(drbg.counter(), [0xff; BLOCK_SIZE]);
    }

    #[test]
    fn counter_wrap_observed_before_update() {
        // Drive the keystream loop directly: inc(0xff..ff) must yield zero
        // and the emitted block must be the encryption of the zero block.
        let drbg = instance(Config::default());
        let mut v = [0xffu8; BLOCK_SIZE];
        increment(&mut v);
        assert_eq!(v, [0u8; BLOCK_SIZE]);
        let mut block = [0u8; BLOCK_SIZE];
        drbg.state.cipher.encrypt_block(&v, &mut block);
        assert!(block.iter().any(|&b| b != 0));
    }

    #[test]
    fn personalization_kat() {
        // Derived with an independent implementation of SP 800-90A
        // CTR_DRBG (no df): fixed entropy, personalization "ctr-drbg-kat".
        let entropy = hex!(
            "3f8c24a1d9b05e7266f1c8a0534b9e12d7405a86e3bc19f4702d5c8b16ae93d0"
            "8842f6a90c3e571bbd64081fa25c79e3"
        );
        let expected = hex!(
            "5e5a0ff08a90b51ae37e90d7cad570039aed3a60cae4bea0cdfbf0545ba0ccd3"
            "47fdd39ec90ac5262f95c6c5073fbd2a32ba2c7dcc4750500d28bfdb57b31c3c"
        );
        let config = Config::default()
            .with_entropy(Arc::new(FixedEntropy::new(entropy.to_vec())))
            .with_personalization(&b"ctr-drbg-kat"[..]);
        let mut drbg = instance(config);
        let mut out = [0u8; 64];
        drbg.generate(&mut out, &[]).expect("generate");
        assert_eq!(out, expected);
    }

    #[test]
    fn additional_input_kat() {
        let entropy = hex!(
            "3f8c24a1d9b05e7266f1c8a0534b9e12d7405a86e3bc19f4702d5c8b16ae93d0"
            "8842f6a90c3e571bbd64081fa25c79e3"
        );
        let expected = hex!("4e123110af2b2dd47168eccffe803500c06901878a44c2443fda343009d76a3a");
        let config =
            Config::default().with_entropy(Arc::new(FixedEntropy::new(entropy.to_vec())));
        let mut drbg = instance(config);
        let mut out = [0u8; 32];
        drbg.generate(&mut out, b"extra input").expect("generate");
        assert_eq!(out, expected);
    }

    #[test]
    fn reseed_interval_policy_triggers() {
        let config = Config::default().with_reseed_interval(Duration::from_millis(50));
        let mut drbg = instance(config);
        let mut buf = [0u8; 32];
        drbg.generate(&mut buf, &[]).expect("generate");
        let first_reseed = drbg.last_reseed();

        thread::sleep(Duration::from_millis(55));
        let mut second = [0u8; 32];
        drbg.generate(&mut second, &[]).expect("generate");
        assert!(drbg.last_reseed() > first_reseed);
        assert_ne!(buf, second);
    }

    #[test]
    fn reseed_request_limit_policy_triggers() {
        let config = Config::default().with_reseed_requests(3);
        let mut drbg = instance(config);
        let mut buf = [0u8; 32];
        for _ in 0..3 {
            drbg.generate(&mut buf, &[]).expect("generate");
        }
        assert_eq!(drbg.requests, 3);
        // The fourth request crosses the threshold and resets the counter.
        drbg.generate(&mut buf, &[]).expect("generate");
        assert_eq!(drbg.requests, 1);
    }

    #[test]
    fn prediction_resistance_draws_every_generate() {
        struct CountingEntropy(AtomicUsize);
        impl EntropySource for CountingEntropy {
            fn fill(&self, dest: &mut [u8]) -> Result<(), Error> {
                self.0.fetch_add(1, Ordering::Relaxed);
                OsEntropy.fill(dest)
            }
            fn name(&self) -> &'static str {
                "counting"
            }
        }

        let source = Arc::new(CountingEntropy(AtomicUsize::new(0)));
        let config = Config::default()
            .with_prediction_resistance(true)
            .with_entropy(Arc::clone(&source) as Arc<dyn EntropySource>);
        let mut drbg = instance(config);
        let after_init = source.0.load(Ordering::Relaxed);
        let mut buf = [0u8; 32];
        for _ in 0..5 {
            drbg.generate(&mut buf, &[]).expect("generate");
        }
        assert!(source.0.load(Ordering::Relaxed) >= after_init + 5);
    }

    #[test]
    fn byte_budget_schedules_background_rekey() {
        let config = Config::default()
            .with_max_bytes_per_key(64)
            .with_rekey_backoff(Duration::from_millis(10))
            .with_max_rekey_attempts(3)
            .with_enable_key_rotation(true);
        let mut drbg = instance(config);
        let initial_epoch = drbg.shared.epoch();

        let mut buf = [0u8; 128];
        drbg.generate(&mut buf, &[]).expect("generate");

        // The worker publishes a fresh state and resets usage within the
        // 500ms window.
        let deadline = Instant::now() + Duration::from_millis(500);
        loop {
            if !drbg.shared.rekey_in_flight()
                && drbg.shared.usage() == 0
                && drbg.shared.epoch() > initial_epoch
            {
                break;
            }
            assert!(Instant::now() < deadline, "timed out waiting for rekey");
            thread::sleep(Duration::from_millis(10));
        }

        // The next generate adopts the published state and keeps working.
        let mut after = [0u8; 32];
        drbg.generate(&mut after, &[]).expect("generate");
        assert!(after.iter().any(|&b| b != 0));
    }

    #[test]
    fn failed_rekey_keeps_current_state() {
        struct FlakyEntropy(AtomicUsize);
        impl EntropySource for FlakyEntropy {
            fn fill(&self, dest: &mut [u8]) -> Result<(), Error> {
                // First draw (instantiate) succeeds, the rest fail.
                if self.0.fetch_add(1, Ordering::Relaxed) == 0 {
                    OsEntropy.fill(dest)
                } else {
                    Err(Error::EntropyFailure(1))
                }
            }
            fn name(&self) -> &'static str {
                "flaky"
            }
        }

        let config = Config::default()
            .with_max_bytes_per_key(16)
            .with_rekey_backoff(Duration::from_millis(1))
            .with_max_rekey_backoff(Duration::from_millis(2))
            .with_max_rekey_attempts(2)
            .with_enable_key_rotation(true)
            .with_entropy(Arc::new(FlakyEntropy(AtomicUsize::new(0))));
        let mut drbg = instance(config);
        let mut buf = [0u8; 64];
        drbg.generate(&mut buf, &[]).expect("generate");

        let deadline = Instant::now() + Duration::from_millis(500);
        while drbg.shared.rekey_in_flight() {
            assert!(Instant::now() < deadline, "rekey flag never cleared");
            thread::sleep(Duration::from_millis(5));
        }
        // Generation continues under the retained key.
        let mut after = [0u8; 32];
        drbg.generate(&mut after, &[]).expect("generate");
        assert!(after.iter().any(|&b| b != 0));
    }

    #[test]
    fn fork_detection_interval_is_respected() {
        let config = Config::default().with_fork_detection_interval(17);
        let drbg = instance(config);
        assert_eq!(drbg.config.fork_detection_interval, 17);
        assert_eq!(drbg.pid, process::id());
    }

    #[test]
    fn health_test_catches_repeated_block() {
        let mut drbg = instance(Config::default().with_continuous_health_test(true));
        let mut buf = [0u8; 64];
        drbg.generate(&mut buf, &[]).expect("generate");
        // Force the failure by replaying the block the test holds.
        let held = drbg.last_block.expect("health test should hold a block");
        assert_eq!(drbg.health_check(&held), Err(Error::HealthTestFailure));
        assert!(drbg.dead);
        // The failure zeroizes the instance: counter and held block wiped.
        assert_eq!(drbg.counter(), [0u8; BLOCK_SIZE]);
        assert!(drbg.last_block.is_none());
        assert_eq!(drbg.generate(&mut buf, &[]), Err(Error::StateInvalid));
    }

    #[test]
    fn zeroized_instance_rejects_operations() {
        let mut drbg = instance(Config::default().with_zeroization(true));
        drbg.zeroize();
        assert_eq!(drbg.counter(), [0u8; BLOCK_SIZE]);
        let mut buf = [0u8; 16];
        assert_eq!(drbg.generate(&mut buf, &[]), Err(Error::StateInvalid));
        assert_eq!(drbg.reseed(&[]), Err(Error::StateInvalid));
    }

    #[test]
    fn entropy_exhaustion_fails_instantiate() {
        struct DeadEntropy;
        impl EntropySource for DeadEntropy {
            fn fill(&self, _dest: &mut [u8]) -> Result<(), Error> {
                Err(Error::EntropyFailure(1))
            }
            fn name(&self) -> &'static str {
                "dead"
            }
        }

        let config = Config::default()
            .with_max_init_retries(3)
            .with_entropy(Arc::new(DeadEntropy))
            .normalized()
            .expect("config should normalize");
        assert_eq!(
            Drbg::new(Arc::new(config)).err(),
            Some(Error::EntropyFailure(3))
        );
    }
}
