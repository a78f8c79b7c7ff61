//! Certificate chain loading.
//!
//! A chain file holds one or more PEM `CERTIFICATE` blocks, end-entity
//! first, followed by the issuing chain in order. The loader preserves
//! the encountered order and never reorders or validates trust.

use std::fs;
use std::path::Path;

use crate::cert::Certificate;
use crate::error::{ProxyKitError, Result};

/// An ordered, immutable chain of X.509 certificates.
///
/// Index 0 is the end-entity certificate (the identity being delegated);
/// subsequent entries are its issuing chain. The chain is guaranteed
/// non-empty.
#[derive(Debug, Clone)]
pub struct CertificateChain {
    certificates: Vec<Certificate>,
}

impl CertificateChain {
    /// Creates a chain from already-parsed certificates, end-entity first.
    pub fn new(certificates: Vec<Certificate>) -> Result<Self> {
        if certificates.is_empty() {
            return Err(ProxyKitError::CertificateLoad(
                "certificate chain must not be empty".to_string(),
            ));
        }
        Ok(Self { certificates })
    }

    /// Loads a chain from a PEM file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ProxyKitError::CertificateLoad(
                "certificate file does not exist".to_string(),
            ));
        }
        let text = fs::read_to_string(path)
            .map_err(|e| ProxyKitError::CertificateLoad(e.to_string()))?;
        Self::from_pem(&text)
    }

    /// Parses a chain from PEM text, in encountered order.
    ///
    /// Non-certificate PEM blocks are skipped; a file yielding zero
    /// certificates is rejected with a distinct "no valid certificate"
    /// error, since an empty or key-only file is not itself malformed PEM.
    pub fn from_pem(text: &str) -> Result<Self> {
        let blocks = pem::parse_many(text)
            .map_err(|e| ProxyKitError::CertificateLoad(format!("malformed PEM: {e}")))?;
        let mut certificates = Vec::new();
        for block in &blocks {
            if block.tag() != "CERTIFICATE" {
                continue;
            }
            certificates.push(Certificate::from_der(block.contents())?);
        }
        if certificates.is_empty() {
            return Err(ProxyKitError::CertificateLoad(
                "file does not contain any valid certificate".to_string(),
            ));
        }
        Ok(Self { certificates })
    }

    /// The end-entity (leaf) certificate.
    pub fn end_entity(&self) -> &Certificate {
        &self.certificates[0]
    }

    /// All certificates, end-entity first.
    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    /// Number of certificates in the chain.
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Always false; kept for slice-like ergonomics.
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Serializes the whole chain as concatenated PEM blocks.
    pub fn to_pem(&self) -> Result<String> {
        let mut out = String::new();
        for cert in &self.certificates {
            out.push_str(&cert.to_pem()?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyKitError;

    const CHAIN_PEM: &str = include_str!("../tests/fixtures/userchain.pem");
    const KEY_PEM: &str = include_str!("../tests/fixtures/userkey.pem");

    #[test]
    fn parses_chain_in_order() {
        let chain = CertificateChain::from_pem(CHAIN_PEM).unwrap();
        assert_eq!(chain.len(), 2);
        let subject = chain.end_entity().subject().to_string();
        assert!(subject.contains("CN=Proxy Test"), "subject: {subject}");
    }

    #[test]
    fn key_file_yields_no_certificate_error() {
        let err = CertificateChain::from_pem(KEY_PEM).unwrap_err();
        match err {
            ProxyKitError::CertificateLoad(msg) => {
                assert!(msg.contains("does not contain any valid certificate"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_input_yields_no_certificate_error() {
        assert!(matches!(
            CertificateChain::from_pem(""),
            Err(ProxyKitError::CertificateLoad(_))
        ));
    }

    #[test]
    fn missing_path_is_a_load_error() {
        assert!(matches!(
            CertificateChain::load("/nonexistent/certs.pem"),
            Err(ProxyKitError::CertificateLoad(_))
        ));
    }

    #[test]
    fn pem_round_trip_preserves_order() {
        let chain = CertificateChain::from_pem(CHAIN_PEM).unwrap();
        let reparsed = CertificateChain::from_pem(&chain.to_pem().unwrap()).unwrap();
        assert_eq!(reparsed.len(), chain.len());
        assert_eq!(
            reparsed.end_entity().subject(),
            chain.end_entity().subject()
        );
    }
}
