use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128Enc, Aes192Enc, Aes256Enc, Block};
use zeroize::Zeroize;

use crate::config::KeySize;

/// AES block size in bytes, also the width of the working counter V.
pub(crate) const BLOCK_SIZE: usize = 16;

/// Largest supported key length (AES-256).
pub(crate) const MAX_KEY_LEN: usize = 32;

/// Largest seed length: key length plus one block.
pub(crate) const MAX_SEED_LEN: usize = MAX_KEY_LEN + BLOCK_SIZE;

/// Add 1 to a 16-byte big-endian counter, wrapping modulo 2^128.
pub(crate) fn increment(v: &mut [u8; BLOCK_SIZE]) {
    for byte in v.iter_mut().rev() {
        *byte = byte.wrapping_add(1);
        if *byte != 0 {
            break;
        }
    }
}

/// Single-block AES encryptor over one of the supported key sizes.
pub(crate) enum BlockCipher {
    Aes128(Aes128Enc),
    Aes192(Aes192Enc),
    Aes256(Aes256Enc),
}

impl BlockCipher {
    /// Key an encryptor from the first `key_size.bytes()` bytes of `key`.
    pub(crate) fn new(key_size: KeySize, key: &[u8; MAX_KEY_LEN]) -> Self {
        match key_size {
            KeySize::Aes128 => {
                let mut k = [0u8; 16];
                k.copy_from_slice(&key[..16]);
                let cipher = Aes128Enc::new(&k.into());
                k.zeroize();
                BlockCipher::Aes128(cipher)
            }
            KeySize::Aes192 => {
                let mut k = [0u8; 24];
                k.copy_from_slice(&key[..24]);
                let cipher = Aes192Enc::new(&k.into());
                k.zeroize();
                BlockCipher::Aes192(cipher)
            }
            KeySize::Aes256 => {
                let mut k = [0u8; 32];
                k.copy_from_slice(&key[..32]);
                let cipher = Aes256Enc::new(&k.into());
                k.zeroize();
                BlockCipher::Aes256(cipher)
            }
        }
    }

    /// Encrypt a single block into `out`, which must be 16 bytes.
    pub(crate) fn encrypt_block(&self, input: &[u8; BLOCK_SIZE], out: &mut [u8]) {
        let inb = Block::from_slice(input);
        let outb = Block::from_mut_slice(out);
        match self {
            BlockCipher::Aes128(cipher) => cipher.encrypt_block_b2b(inb, outb),
            BlockCipher::Aes192(cipher) => cipher.encrypt_block_b2b(inb, outb),
            BlockCipher::Aes256(cipher) => cipher.encrypt_block_b2b(inb, outb),
        }
    }
}

/// One generation of the DRBG key: a keyed encryptor and the key bytes
/// it was built from. Published behind an `Arc` and never mutated while
/// shared; replaced wholesale on update, reseed, and rekey.
pub(crate) struct WorkingState {
    pub(crate) cipher: BlockCipher,
    pub(crate) key: [u8; MAX_KEY_LEN],
    key_size: KeySize,
    zeroize_key: bool,
}

impl WorkingState {
    pub(crate) fn new(key_size: KeySize, key: &[u8; MAX_KEY_LEN], zeroize_key: bool) -> Self {
        WorkingState {
            cipher: BlockCipher::new(key_size, key),
            key: *key,
            key_size,
            zeroize_key,
        }
    }

    /// Rekey this state in place. Only valid while the state has a single
    /// owner; the cipher's retired key schedule is wiped on drop by the
    /// `aes` crate's zeroize support.
    pub(crate) fn rekey(&mut self, key: &[u8; MAX_KEY_LEN]) {
        if self.zeroize_key {
            self.key.zeroize();
        }
        self.cipher = BlockCipher::new(self.key_size, key);
        self.key = *key;
    }
}

impl Drop for WorkingState {
    fn drop(&mut self) {
        if self.zeroize_key {
            self.key.zeroize();
        }
    }
}
