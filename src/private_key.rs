//! Private key container loading and password-based decryption.
//!
//! Accepted PEM containers:
//! - `RSA PRIVATE KEY` (PKCS#1), optionally encrypted the traditional
//!   OpenSSL way (`Proc-Type: 4,ENCRYPTED` + `DEK-Info` headers),
//! - `ENCRYPTED PRIVATE KEY` (PKCS#8 PBES2),
//! - `PRIVATE KEY` (plain PKCS#8: RSA, EC P-256, or Ed25519),
//! - `EC PRIVATE KEY` (SEC1, P-256).
//!
//! Any cryptographic failure while decrypting collapses into
//! [`ProxyKitError::WrongPassword`]: the caller learns that decryption
//! failed, and nothing more.

use std::fs;
use std::path::Path;

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use der::Decode;
use ed25519_dalek::SigningKey as Ed25519SigningKey;
use md5::{Digest, Md5};
use p256::ecdsa::SigningKey as P256SigningKey;
use pkcs8::{EncryptedPrivateKeyInfo, PrivateKeyInfo};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sec1::DecodeEcPrivateKey;

use crate::error::{ProxyKitError, Result};
use crate::key::KeyPair;

/// A private key parsed from a PEM container, ready for signing.
///
/// Produced exclusively by [`load_private_key`] / [`from_pem`]; consumed
/// by value by the proxy generator.
#[derive(Debug)]
pub struct PrivateKeyMaterial {
    key: KeyPair,
    was_encrypted: bool,
}

impl PrivateKeyMaterial {
    /// The usable private key.
    pub fn key(&self) -> &KeyPair {
        &self.key
    }

    /// Consumes the material, yielding the key.
    pub fn into_key(self) -> KeyPair {
        self.key
    }

    /// Whether the source container was password-encrypted.
    pub fn was_encrypted(&self) -> bool {
        self.was_encrypted
    }
}

/// Loads a private key from a PEM file, decrypting it with `password` if
/// the container is encrypted. The password is ignored for plain keys.
pub fn load_private_key(path: impl AsRef<Path>, password: &str) -> Result<PrivateKeyMaterial> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ProxyKitError::PrivateKeyLoad(
            "private key file does not exist".to_string(),
        ));
    }
    let text =
        fs::read_to_string(path).map_err(|e| ProxyKitError::PrivateKeyLoad(e.to_string()))?;
    from_pem(&text, password)
}

/// Parses a private key from PEM text. See [`load_private_key`].
pub fn from_pem(text: &str, password: &str) -> Result<PrivateKeyMaterial> {
    let blocks = pem::parse_many(text)
        .map_err(|e| ProxyKitError::PrivateKeyLoad(format!("malformed PEM: {e}")))?;
    let block = blocks
        .iter()
        .find(|b| {
            matches!(
                b.tag(),
                "RSA PRIVATE KEY" | "ENCRYPTED PRIVATE KEY" | "PRIVATE KEY" | "EC PRIVATE KEY"
            )
        })
        .ok_or_else(|| {
            ProxyKitError::PrivateKeyLoad("file does not contain a private key".to_string())
        })?;

    match block.tag() {
        "RSA PRIVATE KEY" => match block.headers().get("DEK-Info") {
            Some(dek_info) => {
                let der = decrypt_traditional_pem(dek_info, block.contents(), password)?;
                let private =
                    RsaPrivateKey::from_pkcs1_der(&der).map_err(|_| ProxyKitError::WrongPassword)?;
                Ok(material_from_rsa(private, true))
            }
            None => {
                let private = RsaPrivateKey::from_pkcs1_der(block.contents())
                    .map_err(|e| ProxyKitError::PrivateKeyLoad(e.to_string()))?;
                Ok(material_from_rsa(private, false))
            }
        },
        "ENCRYPTED PRIVATE KEY" => {
            let encrypted = EncryptedPrivateKeyInfo::from_der(block.contents())
                .map_err(|e| ProxyKitError::PrivateKeyLoad(e.to_string()))?;
            let document = encrypted
                .decrypt(password)
                .map_err(|_| ProxyKitError::WrongPassword)?;
            let key = key_pair_from_pkcs8(document.as_bytes())
                .ok_or(ProxyKitError::WrongPassword)?;
            Ok(PrivateKeyMaterial {
                key,
                was_encrypted: true,
            })
        }
        "PRIVATE KEY" => {
            let key = key_pair_from_pkcs8(block.contents()).ok_or_else(|| {
                ProxyKitError::PrivateKeyLoad(
                    "not a valid PKCS#8 private key (RSA, EC P-256, or Ed25519)".to_string(),
                )
            })?;
            Ok(PrivateKeyMaterial {
                key,
                was_encrypted: false,
            })
        }
        "EC PRIVATE KEY" => {
            let secret = p256::SecretKey::from_sec1_der(block.contents())
                .map_err(|e| ProxyKitError::PrivateKeyLoad(e.to_string()))?;
            let signing_key = P256SigningKey::from(secret);
            let verifying_key = *signing_key.verifying_key();
            Ok(PrivateKeyMaterial {
                key: KeyPair::EcdsaP256 {
                    signing_key,
                    verifying_key,
                },
                was_encrypted: false,
            })
        }
        other => Err(ProxyKitError::PrivateKeyLoad(format!(
            "unsupported private key container: {other}"
        ))),
    }
}

fn material_from_rsa(private: RsaPrivateKey, was_encrypted: bool) -> PrivateKeyMaterial {
    let public = RsaPublicKey::from(&private);
    PrivateKeyMaterial {
        key: KeyPair::Rsa {
            private: Box::new(private),
            public,
        },
        was_encrypted,
    }
}

/// Tries the PKCS#8 payload against each supported algorithm in turn.
fn key_pair_from_pkcs8(der: &[u8]) -> Option<KeyPair> {
    let info = PrivateKeyInfo::from_der(der).ok()?;
    if let Ok(private) = RsaPrivateKey::try_from(info.clone()) {
        let public = RsaPublicKey::from(&private);
        return Some(KeyPair::Rsa {
            private: Box::new(private),
            public,
        });
    }
    if let Ok(secret) = p256::SecretKey::try_from(info.clone()) {
        let signing_key = P256SigningKey::from(secret);
        let verifying_key = *signing_key.verifying_key();
        return Some(KeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        });
    }
    if let Ok(signing_key) = Ed25519SigningKey::try_from(info) {
        return Some(KeyPair::Ed25519 { signing_key });
    }
    None
}

/// Decrypts a traditionally encrypted PEM body per the `DEK-Info` header
/// (`<cipher>,<hex IV>`), using OpenSSL's MD5-based key derivation.
fn decrypt_traditional_pem(dek_info: &str, data: &[u8], password: &str) -> Result<Vec<u8>> {
    let (cipher, iv_hex) = dek_info.split_once(',').ok_or_else(|| {
        ProxyKitError::PrivateKeyLoad("malformed DEK-Info header".to_string())
    })?;
    let cipher = cipher.trim();
    let iv = hex::decode(iv_hex.trim())
        .map_err(|_| ProxyKitError::PrivateKeyLoad("malformed DEK-Info IV".to_string()))?;

    let (key_len, iv_len) = match cipher {
        "DES-CBC" => (8, 8),
        "DES-EDE3-CBC" => (24, 8),
        "AES-128-CBC" => (16, 16),
        "AES-192-CBC" => (24, 16),
        "AES-256-CBC" => (32, 16),
        other => {
            return Err(ProxyKitError::PrivateKeyLoad(format!(
                "unsupported PEM encryption cipher: {other}"
            )));
        }
    };
    if iv.len() != iv_len {
        return Err(ProxyKitError::PrivateKeyLoad(
            "DEK-Info IV has the wrong length".to_string(),
        ));
    }

    // The KDF salt is always the first 8 bytes of the IV.
    let key = evp_bytes_to_key(password.as_bytes(), &iv[..8], key_len);

    match cipher {
        "DES-CBC" => cbc_decrypt::<cbc::Decryptor<des::Des>>(&key, &iv, data),
        "DES-EDE3-CBC" => cbc_decrypt::<cbc::Decryptor<des::TdesEde3>>(&key, &iv, data),
        "AES-128-CBC" => cbc_decrypt::<cbc::Decryptor<aes::Aes128>>(&key, &iv, data),
        "AES-192-CBC" => cbc_decrypt::<cbc::Decryptor<aes::Aes192>>(&key, &iv, data),
        _ => cbc_decrypt::<cbc::Decryptor<aes::Aes256>>(&key, &iv, data),
    }
}

/// OpenSSL `EVP_BytesToKey` with MD5 and a single round: concatenated
/// `D_i = MD5(D_{i-1} || password || salt)` blocks, truncated to `key_len`.
fn evp_bytes_to_key(password: &[u8], salt: &[u8], key_len: usize) -> Vec<u8> {
    let mut derived = Vec::with_capacity(key_len + 16);
    let mut block: Vec<u8> = Vec::new();
    while derived.len() < key_len {
        let mut hasher = Md5::new();
        hasher.update(&block);
        hasher.update(password);
        hasher.update(salt);
        block = hasher.finalize().to_vec();
        derived.extend_from_slice(&block);
    }
    derived.truncate(key_len);
    derived
}

fn cbc_decrypt<D>(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>>
where
    D: KeyIvInit + BlockDecryptMut,
{
    let decryptor = D::new_from_slices(key, iv)
        .map_err(|e| ProxyKitError::PrivateKeyLoad(format!("invalid cipher parameters: {e}")))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(data)
        .map_err(|_| ProxyKitError::WrongPassword)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evp_bytes_to_key_matches_openssl() {
        let salt = hex::decode("0102030405060708").unwrap();
        assert_eq!(
            hex::encode(evp_bytes_to_key(b"experimentworkbench", &salt, 24)),
            "de436f07fa91a8345a42f131f5ef3de42143f29a1113320a"
        );
        assert_eq!(
            hex::encode(evp_bytes_to_key(b"password", &salt, 16)),
            "e7b0971e52ca5cc8d0539fb3412f6316"
        );
    }

    #[test]
    fn malformed_dek_info_is_a_load_error() {
        let err = decrypt_traditional_pem("DES-EDE3-CBC", b"", "pw").unwrap_err();
        assert!(matches!(err, ProxyKitError::PrivateKeyLoad(_)));

        let err = decrypt_traditional_pem("ROT13,00", b"", "pw").unwrap_err();
        assert!(matches!(err, ProxyKitError::PrivateKeyLoad(_)));
    }

    #[test]
    fn cert_file_is_not_a_private_key() {
        let cert_pem = include_str!("../tests/fixtures/usercert.pem");
        let err = from_pem(cert_pem, "").unwrap_err();
        assert!(matches!(err, ProxyKitError::PrivateKeyLoad(_)));
    }

    #[test]
    fn wrong_password_is_collapsed() {
        let key_pem = include_str!("../tests/fixtures/userkey.pem");
        let err = from_pem(key_pem, "wrongexperimentworkbench").unwrap_err();
        assert!(matches!(err, ProxyKitError::WrongPassword));
    }

    #[test]
    fn correct_password_decrypts_traditional_key() {
        let key_pem = include_str!("../tests/fixtures/userkey.pem");
        let material = from_pem(key_pem, "experimentworkbench").unwrap();
        assert!(material.was_encrypted());
        assert!(matches!(material.key(), KeyPair::Rsa { .. }));
    }
}
