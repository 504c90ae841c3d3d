//! Pluggable payload transforms for the COMPRESSED and ENCRYPTED flags
//!
//! The packet buffer calls into these hooks from its `encode`/`decode`
//! entry points. Only the contract is defined here; the default
//! [`Identity`] implementation passes the payload through unchanged,
//! and real algorithms are injected by the application.

use thiserror::Error;

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("compression failed: {0}")]
    CompressionFailed(String),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Compression transform applied to a packet's payload region.
pub trait Compressor: Send + Sync {
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError>;
    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Encryption transform applied to a packet's payload region.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError>;
    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Pass-through codec used until real transforms are negotiated.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Compressor for Identity {
    fn compress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(payload.to_vec())
    }

    fn decompress(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(payload.to_vec())
    }
}

impl Cipher for Identity {
    fn encrypt(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(payload.to_vec())
    }

    fn decrypt(&self, payload: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(payload.to_vec())
    }
}

/// The pair of transforms a packet consults while encoding/decoding.
pub struct CodecStack {
    pub compressor: Box<dyn Compressor>,
    pub cipher: Box<dyn Cipher>,
}

impl Default for CodecStack {
    fn default() -> Self {
        Self {
            compressor: Box::new(Identity),
            cipher: Box::new(Identity),
        }
    }
}
