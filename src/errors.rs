use core::fmt;

/// Errors surfaced by reader construction, generation, and reseeding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The requested AES key size is not 16, 24, or 32 bytes.
    InvalidKeySize(usize),
    /// The personalization string exceeds the 128-byte limit.
    PersonalizationTooLong(usize),
    /// The entropy source failed every draw attempt.
    EntropyFailure(usize),
    /// The known-answer self-test did not match the expected output.
    SelfTestFailed,
    /// The continuous health test observed identical consecutive blocks.
    HealthTestFailure,
    /// The instance was zeroized and can no longer be used.
    StateInvalid,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidKeySize(size) => {
                write!(
                    f,
                    "AES key size {} is invalid, expected 16, 24, or 32 bytes",
                    size
                )
            }
            Error::PersonalizationTooLong(len) => {
                write!(
                    f,
                    "Personalization of {} bytes exceeds the 128 byte limit",
                    len
                )
            }
            Error::EntropyFailure(attempts) => {
                if *attempts == 1 {
                    write!(f, "Entropy source failed")
                } else {
                    write!(f, "Entropy source failed after {} attempts", attempts)
                }
            }
            Error::SelfTestFailed => {
                write!(f, "CTR_DRBG known-answer self-test failed")
            }
            Error::HealthTestFailure => {
                write!(f, "Continuous health test detected a repeated block")
            }
            Error::StateInvalid => {
                write!(f, "Operation on a zeroized DRBG instance")
            }
        }
    }
}

impl std::error::Error for Error {}
