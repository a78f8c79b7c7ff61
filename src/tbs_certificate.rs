use der::Encode;
use der::asn1::OctetString;
use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::name::RdnSequence;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::cert::extensions::ExtensionParam;
use crate::error::{ProxyKitError, Result};

/// The "To Be Signed" portion of a proxy certificate.
///
/// Issuer and subject are carried as full `RDNSequence` values: a proxy
/// subject is the end-entity subject with one appended RDN, so the names
/// must round-trip without loss.
pub struct TbsCertificate {
    /// Certificate serial number, big-endian, positive.
    pub serial_number: Vec<u8>,
    /// Certificate signature algorithm
    pub signature_algorithm: SignatureAlgorithm,
    /// Certificate issuer distinguished name
    pub issuer: RdnSequence,
    /// Not before time
    pub not_before: time::OffsetDateTime,
    /// Not after time
    pub not_after: time::OffsetDateTime,
    /// Certificate subject distinguished name
    pub subject: RdnSequence,
    /// Subject's public key
    pub subject_public_key: SubjectPublicKeyInfoOwned,
    /// Certificate extensions
    pub extensions: Vec<ExtensionParam>,
}

impl TbsCertificate {
    /// Converts into the `x509-cert` representation suitable for DER
    /// encoding and signing.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let algorithm_id: x509_cert::spki::AlgorithmIdentifierOwned =
            self.signature_algorithm.clone().into();

        let extensions = self
            .extensions
            .iter()
            .map(|ext| {
                Ok(x509_cert::ext::Extension {
                    extn_id: ext.oid,
                    critical: ext.critical,
                    extn_value: OctetString::new(ext.value.clone())?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let not_before = x509_cert::time::Time::UtcTime(
            der::asn1::UtcTime::from_system_time(self.not_before.into())
                .map_err(|e| ProxyKitError::Encoding(e.to_string()))?,
        );
        let not_after = x509_cert::time::Time::UtcTime(
            der::asn1::UtcTime::from_system_time(self.not_after.into())
                .map_err(|e| ProxyKitError::Encoding(e.to_string()))?,
        );

        let validity = x509_cert::time::Validity {
            not_before,
            not_after,
        };

        let serial_number = SerialNumber::new(self.serial_number.as_slice())
            .map_err(|e| ProxyKitError::Encoding(e.to_string()))?;

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number,
            signature: algorithm_id,
            issuer: self.issuer.clone(),
            validity,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.clone(),
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: Some(extensions),
        })
    }

    /// Encodes the `TbsCertificate` into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        Ok(self.to_tbs_certificate_inner()?.to_der()?)
    }
}
