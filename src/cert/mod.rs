pub mod extensions;

use der::{Decode, DecodePem, Encode, EncodePem};
use time::OffsetDateTime;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::RdnSequence;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::error::{ProxyKitError, Result};

/// Represents the supported signature algorithms for proxy certificates.
///
/// The variant is chosen from the end-entity key type, never configured
/// directly.
#[derive(Debug, Clone)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA (PKCS#1 v1.5).
    Sha256WithRsa,
    /// ECDSA (P-256) with SHA-256.
    EcdsaWithSha256,
    /// Ed25519.
    Ed25519,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            // RFC 5912 requires an explicit NULL parameter for RSA.
            SignatureAlgorithm::Sha256WithRsa => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(der::AnyRef::NULL.into()),
            },
            SignatureAlgorithm::EcdsaWithSha256 => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
            SignatureAlgorithm::Ed25519 => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc8410::ID_ED_25519,
                parameters: None,
            },
        }
    }
}

/// Represents an X.509 certificate.
///
/// Thin wrapper over [`x509_cert::certificate::CertificateInner`] with
/// accessors for the fields the proxy pipeline cares about.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: CertificateInner,
}

impl Certificate {
    /// Decodes a certificate from DER bytes.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let inner = CertificateInner::from_der(der)
            .map_err(|e| ProxyKitError::CertificateLoad(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Decodes a certificate from a PEM string.
    pub fn from_pem(pem: &str) -> Result<Self> {
        let inner = CertificateInner::from_pem(pem)
            .map_err(|e| ProxyKitError::CertificateLoad(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| ProxyKitError::Encoding(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| ProxyKitError::Encoding(e.to_string()))
    }

    /// The subject distinguished name.
    pub fn subject(&self) -> &RdnSequence {
        &self.inner.tbs_certificate.subject
    }

    /// The issuer distinguished name.
    pub fn issuer(&self) -> &RdnSequence {
        &self.inner.tbs_certificate.issuer
    }

    /// The serial number as big-endian bytes.
    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    /// The subject public key information.
    pub fn public_key(&self) -> &SubjectPublicKeyInfoOwned {
        &self.inner.tbs_certificate.subject_public_key_info
    }

    /// Start of the validity window.
    pub fn not_before(&self) -> OffsetDateTime {
        time_to_offset(&self.inner.tbs_certificate.validity.not_before)
    }

    /// End of the validity window.
    pub fn not_after(&self) -> OffsetDateTime {
        time_to_offset(&self.inner.tbs_certificate.validity.not_after)
    }
}

fn time_to_offset(time: &x509_cert::time::Time) -> OffsetDateTime {
    match time {
        x509_cert::time::Time::UtcTime(ut) => OffsetDateTime::from(ut.to_system_time()),
        x509_cert::time::Time::GeneralTime(gt) => OffsetDateTime::from(gt.to_system_time()),
    }
}
