use std::sync::{Arc, OnceLock};

use crate::config::Config;
use crate::drbg::Drbg;
use crate::entropy::EntropySource;
use crate::errors::Error;

/// Fixed 48-byte entropy input for the AES-256 known-answer test.
const KAT_ENTROPY: [u8; 48] = [
    0x3f, 0x8c, 0x24, 0xa1, 0xd9, 0xb0, 0x5e, 0x72, 0x66, 0xf1, 0xc8, 0xa0,
    0x53, 0x4b, 0x9e, 0x12, 0xd7, 0x40, 0x5a, 0x86, 0xe3, 0xbc, 0x19, 0xf4,
    0x70, 0x2d, 0x5c, 0x8b, 0x16, 0xae, 0x93, 0xd0, 0x88, 0x42, 0xf6, 0xa9,
    0x0c, 0x3e, 0x57, 0x1b, 0xbd, 0x64, 0x08, 0x1f, 0xa2, 0x5c, 0x79, 0xe3,
];

/// Expected second 64-byte generate output for CTR_DRBG-AES-256 (no df)
/// instantiated from [KAT_ENTROPY] with an empty personalization string,
/// in the CAVP response shape: instantiate, generate, generate, compare.
/// Derived with an independent implementation of the SP 800-90A algorithm
/// cross-checked against the published PQCgenKAT AES-256-CTR DRBG outputs.
const KAT_EXPECTED: [u8; 64] = [
    0x43, 0x8c, 0x56, 0xd9, 0xea, 0x92, 0x2b, 0xca, 0x8f, 0x7f, 0xc2, 0x83,
    0x3d, 0x10, 0x3c, 0xfe, 0xb9, 0x25, 0x7a, 0x7e, 0x22, 0x7a, 0x8c, 0xe4,
    0xb9, 0xd4, 0x37, 0x2c, 0xf3, 0x50, 0x98, 0xdd, 0xd4, 0xac, 0x31, 0xf0,
    0xa7, 0xa2, 0x5d, 0xc9, 0xfc, 0x92, 0x19, 0x0c, 0x7a, 0x55, 0xca, 0x70,
    0x1d, 0x62, 0x02, 0x4e, 0x99, 0xa7, 0x4b, 0x3c, 0x36, 0xf8, 0xd3, 0x28,
    0x78, 0x57, 0xb8, 0x40,
];

/// An entropy source that replays a fixed byte string. Used by the
/// known-answer test and by deterministic unit tests.
pub(crate) struct FixedEntropy {
    bytes: Vec<u8>,
}

impl FixedEntropy {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        FixedEntropy { bytes }
    }
}

impl EntropySource for FixedEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), Error> {
        if dest.len() > self.bytes.len() {
            return Err(Error::EntropyFailure(1));
        }
        dest.copy_from_slice(&self.bytes[..dest.len()]);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Run the known-answer test once per process and cache the verdict.
/// Every reader constructed with self-tests enabled observes the same
/// result, including a failure.
pub(crate) fn run() -> Result<(), Error> {
    static RESULT: OnceLock<Result<(), Error>> = OnceLock::new();
    RESULT.get_or_init(run_kat).clone()
}

fn run_kat() -> Result<(), Error> {
    kat_against(&KAT_EXPECTED)
}

/// Instantiate the real DRBG pipeline from the fixed entropy input and
/// compare the second generate output against `expected`.
fn kat_against(expected: &[u8; 64]) -> Result<(), Error> {
    let config = Config::default()
        .with_entropy(Arc::new(FixedEntropy::new(KAT_ENTROPY.to_vec())))
        .normalized()?;
    let mut drbg = Drbg::new(Arc::new(config))?;
    let mut out = [0u8; 64];
    drbg.generate(&mut out, &[])?;
    drbg.generate(&mut out, &[])?;
    if out != *expected {
        return Err(Error::SelfTestFailed);
    }
    Ok(())
}
