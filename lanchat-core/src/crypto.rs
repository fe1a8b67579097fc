//! File encryption: Triple DES in CBC mode with PKCS#7 padding.
//! The key is shared out-of-band as a file and re-read on every call, so a
//! rotation of the key file takes effect on the very next operation.

use std::fs;
use std::path::{Path, PathBuf};

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::RngCore;

type TdesCbcEnc = cbc::Encryptor<des::TdesEde3>;
type TdesCbcDec = cbc::Decryptor<des::TdesEde3>;

/// Default location of the shared key, relative to the working directory.
pub const DEFAULT_KEY_FILE: &str = "secret.key";

/// Key length in bytes (three DES keys).
pub const KEY_LEN: usize = 24;

/// IV length in bytes (the DES block size).
pub const IV_LEN: usize = 8;

/// Encrypts and decrypts byte buffers with a key held in a file.
pub struct FileCrypto {
    key_path: PathBuf,
    // One IV per instance (one instance per process), prepended to every
    // ciphertext. Reusing the IV across messages weakens CBC
    // confidentiality; the wire shape expects it, so it stays.
    iv: [u8; IV_LEN],
}

impl FileCrypto {
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        let mut iv = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut iv);
        Self {
            key_path: key_path.into(),
            iv,
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Generate a fresh random key, overwriting the key file.
    pub fn generate_key(&self) -> Result<(), CryptoError> {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        fs::write(&self.key_path, key).map_err(CryptoError::KeyFile)
    }

    // Fresh read on every call; no caching anywhere.
    fn read_key(&self) -> Result<[u8; KEY_LEN], CryptoError> {
        let bytes = fs::read(&self.key_path).map_err(CryptoError::KeyFile)?;
        bytes.try_into().map_err(|_| CryptoError::KeyLength)
    }

    /// Encrypt a buffer. The output is the IV followed by the ciphertext.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = self.read_key()?;
        let ciphertext =
            TdesCbcEnc::new(&key.into(), &self.iv.into()).encrypt_padded_vec_mut::<Pkcs7>(data);
        let mut out = Vec::with_capacity(IV_LEN + ciphertext.len());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a buffer produced by [`encrypt`](Self::encrypt): the first
    /// 8 bytes are consumed as the IV, the rest as ciphertext.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.len() < IV_LEN {
            return Err(CryptoError::TooShort);
        }
        let (iv, ciphertext) = data.split_at(IV_LEN);
        let iv: [u8; IV_LEN] = iv.try_into().map_err(|_| CryptoError::TooShort)?;
        let key = self.read_key()?;
        TdesCbcDec::new(&key.into(), &iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::Decrypt)
    }

    /// Decrypt a stored file in place.
    pub fn decrypt_file(&self, path: impl AsRef<Path>) -> Result<(), CryptoError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(CryptoError::Io)?;
        let plaintext = self.decrypt(&data)?;
        fs::write(path, plaintext).map_err(CryptoError::Io)
    }
}

/// Error in a single encrypt/decrypt operation. Never fatal to the
/// process; the one operation fails and is reported.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("cannot access key file: {0}")]
    KeyFile(#[source] std::io::Error),
    #[error("key file must hold exactly {KEY_LEN} bytes")]
    KeyLength,
    #[error("input shorter than the IV")]
    TooShort,
    #[error("decryption failed (wrong key or corrupted data)")]
    Decrypt,
    #[error("file error: {0}")]
    Io(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn temp_crypto(tag: &str) -> FileCrypto {
        let path = std::env::temp_dir().join(format!(
            "lanchat-{}-{}.key",
            tag,
            std::process::id()
        ));
        FileCrypto::new(path)
    }

    #[test]
    fn roundtrip_arbitrary_buffer() {
        let crypto = temp_crypto("roundtrip");
        crypto.generate_key().unwrap();

        let mut data = vec![0u8; 5000];
        rand::thread_rng().fill_bytes(&mut data);

        let ciphertext = crypto.encrypt(&data).unwrap();
        assert_ne!(&ciphertext[IV_LEN..], &data[..]);
        assert_eq!(crypto.decrypt(&ciphertext).unwrap(), data);
    }

    #[test]
    fn roundtrip_empty_and_block_sized() {
        let crypto = temp_crypto("blocks");
        crypto.generate_key().unwrap();
        for len in [0usize, 1, 8, 16, 4096] {
            let data = vec![0xa5u8; len];
            let ciphertext = crypto.encrypt(&data).unwrap();
            assert_eq!(crypto.decrypt(&ciphertext).unwrap(), data);
        }
    }

    #[test]
    fn iv_is_prepended_and_reused_within_a_process() {
        let crypto = temp_crypto("iv");
        crypto.generate_key().unwrap();
        let a = crypto.encrypt(b"same plaintext").unwrap();
        let b = crypto.encrypt(b"same plaintext").unwrap();
        // One IV per instance: identical inputs give identical outputs.
        assert_eq!(a, b);
        assert_eq!(a.len() % 8, 0);
        assert!(a.len() >= IV_LEN + 8);
    }

    #[test]
    fn key_rotation_observed_on_next_call() {
        let crypto = temp_crypto("rotate");
        crypto.generate_key().unwrap();
        let before = crypto.encrypt(b"payload").unwrap();
        crypto.generate_key().unwrap();
        let after = crypto.encrypt(b"payload").unwrap();
        // Same IV, new key: the ciphertext must change.
        assert_ne!(before, after);
        assert_eq!(crypto.decrypt(&after).unwrap(), b"payload");
    }

    #[test]
    fn missing_key_file_is_an_operation_error() {
        let crypto = temp_crypto("missing");
        let _ = std::fs::remove_file(crypto.key_path());
        assert!(matches!(
            crypto.encrypt(b"data"),
            Err(CryptoError::KeyFile(_))
        ));
    }

    #[test]
    fn wrong_key_length_rejected() {
        let crypto = temp_crypto("shortkey");
        std::fs::write(crypto.key_path(), [0u8; 7]).unwrap();
        assert!(matches!(crypto.encrypt(b"data"), Err(CryptoError::KeyLength)));
    }

    #[test]
    fn undersized_input_rejected() {
        let crypto = temp_crypto("undersized");
        crypto.generate_key().unwrap();
        assert!(matches!(crypto.decrypt(&[1, 2, 3]), Err(CryptoError::TooShort)));
    }

    #[test]
    fn decrypt_file_in_place() {
        let crypto = temp_crypto("filedec");
        crypto.generate_key().unwrap();
        let path = std::env::temp_dir().join(format!("lanchat-filedec-{}.bin", std::process::id()));
        let original = b"file contents to protect".to_vec();
        std::fs::write(&path, crypto.encrypt(&original).unwrap()).unwrap();
        crypto.decrypt_file(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), original);
    }
}
