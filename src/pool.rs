use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::drbg::Drbg;
use crate::errors::Error;

static NEXT_THREAD_TOKEN: AtomicUsize = AtomicUsize::new(0);

thread_local! {
    /// Monotonically assigned per-thread token. Reads from one thread
    /// always map to the same shard, keeping instance reuse local.
    static THREAD_TOKEN: usize = NEXT_THREAD_TOKEN.fetch_add(1, Ordering::Relaxed);
}

/// Per-shard free lists of DRBG instances. A check-out moves an instance
/// to the caller; a check-in moves it back, so each instance has exactly
/// one holder at a time. Exactly one shard is touched per read.
pub(crate) struct ShardPool {
    shards: Vec<Shard>,
    config: Arc<Config>,
}

struct Shard {
    free: Mutex<Vec<Drbg>>,
}

impl ShardPool {
    pub(crate) fn new(config: Arc<Config>) -> Self {
        let shards = (0..config.shards)
            .map(|_| Shard {
                free: Mutex::new(Vec::new()),
            })
            .collect();
        ShardPool { shards, config }
    }

    /// Shard index for the calling thread.
    pub(crate) fn shard_index(&self) -> usize {
        THREAD_TOKEN.with(|token| *token) % self.shards.len()
    }

    /// Borrow an instance from the calling thread's shard, instantiating
    /// a fresh one when the free list is empty.
    pub(crate) fn check_out(&self) -> Result<(usize, Drbg), Error> {
        let index = self.shard_index();
        let recycled = self.shards[index]
            .free
            .lock()
            .expect("shard free list poisoned")
            .pop();
        match recycled {
            Some(drbg) => Ok((index, drbg)),
            None => Ok((index, Drbg::new(Arc::clone(&self.config))?)),
        }
    }

    /// Return an instance to the shard it was borrowed from.
    pub(crate) fn check_in(&self, index: usize, drbg: Drbg) {
        self.shards[index]
            .free
            .lock()
            .expect("shard free list poisoned")
            .push(drbg);
    }

    #[cfg(test)]
    fn free_counts(&self) -> Vec<usize> {
        self.shards
            .iter()
            .map(|shard| shard.free.lock().expect("shard free list poisoned").len())
            .collect()
    }
}
