use crate::errors::Error;

/// A source of seed material for instantiate and reseed.
///
/// The DRBG draws `key length + 16` bytes per seed. Implementations must
/// fill the entire buffer with uniformly random bytes or return an error;
/// partial fills are not permitted.
pub trait EntropySource: Send + Sync {
    /// Fill `dest` with fresh random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<(), Error>;

    /// Short identifier used in diagnostics.
    fn name(&self) -> &'static str;
}

/// The operating system's cryptographic random source.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), Error> {
        getrandom::getrandom(dest).map_err(|_| Error::EntropyFailure(1))
    }

    fn name(&self) -> &'static str {
        "os"
    }
}

/// Draw entropy with retries, returning [Error::EntropyFailure] carrying
/// the number of attempts once they are exhausted.
pub(crate) fn draw(
    source: &dyn EntropySource,
    dest: &mut [u8],
    retries: usize,
) -> Result<(), Error> {
    let attempts = retries.max(1);
    for attempt in 1..=attempts {
        match source.fill(dest) {
            Ok(()) => return Ok(()),
            Err(err) => {
                log::debug!(
                    "entropy draw {attempt}/{attempts} from source `{}` failed: {err}",
                    source.name()
                );
            }
        }
    }
    Err(Error::EntropyFailure(attempts))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingSource;

    impl EntropySource for FailingSource {
        fn fill(&self, _dest: &mut [u8]) -> Result<(), Error> {
            Err(Error::EntropyFailure(1))
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[test]
    fn os_entropy_fills_buffer() {
        let mut buf = [0u8; 48];
        OsEntropy.fill(&mut buf).expect("os entropy should fill");
        assert!(buf.iter().any(|&b| b != 0));
    }

    #[test]
    fn draw_reports_attempts_on_exhaustion() {
        let mut buf = [0u8; 16];
        assert_eq!(
            draw(&FailingSource, &mut buf, 3),
            Err(Error::EntropyFailure(3))
        );
        // Zero retries still makes a single attempt.
        assert_eq!(
            draw(&FailingSource, &mut buf, 0),
            Err(Error::EntropyFailure(1))
        );
    }
}
