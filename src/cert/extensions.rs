use const_oid::AssociatedOid;
use der::{
    Decode, Encode, Sequence,
    asn1::OctetString,
    oid::ObjectIdentifier,
};

use crate::error::ProxyKitError;

/// OID of the RFC 3820 proxyCertInfo extension (id-pe-proxyCertInfo).
pub const ID_PE_PROXY_CERT_INFO: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.1.14");

/// RFC 3820 policy language: inherit all rights of the issuer.
pub const ID_PPL_INHERIT_ALL: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.21.1");

/// RFC 3820 policy language: no rights beyond being a distinct identity.
pub const ID_PPL_INDEPENDENT: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.21.2");

/// Globus policy language marking a limited proxy.
pub const ID_GLOBUS_LIMITED_PROXY: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.3536.1.1.1.9");

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, ProxyKitError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, ProxyKitError>
    where
        Self: Sized;
}

/// An X.509 extension in raw form: OID, criticality, and DER value.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    /// Creates an `ExtensionParam` from a typed extension.
    pub fn from_extension<E: ToAndFromX509Extension>(extension: E, critical: bool) -> Self {
        let value = extension
            .to_x509_extension_value()
            .unwrap_or_else(|_| vec![]);
        Self {
            oid: E::OID,
            critical,
            value,
        }
    }

    /// Decodes this `ExtensionParam` into a typed extension.
    pub fn to_extension<E: ToAndFromX509Extension>(&self) -> Result<E, ProxyKitError> {
        E::from_x509_extension_value(&self.value)
    }
}

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

/// Represents the Key Usage extension.
///
/// Proxy certificates carry `digitalSignature` and `keyEncipherment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, ProxyKitError> {
        let ku = X509KeyUsage::from(self.0);
        Ok(ku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, ProxyKitError> {
        let ku = X509KeyUsage::from_der(extension)
            .map_err(|e| ProxyKitError::CertificateLoad(e.to_string()))?;
        Ok(Self(ku.0))
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// Only the key identifier form is used: proxies point at the end-entity
/// certificate that signed them via a hash of its public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Vec<u8>,
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, ProxyKitError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: Some(OctetString::new(self.key_identifier.as_slice())?),
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };
        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, ProxyKitError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)
            .map_err(|e| ProxyKitError::CertificateLoad(e.to_string()))?;
        Ok(Self {
            key_identifier: aki
                .key_identifier
                .map(|id| id.as_bytes().to_vec())
                .unwrap_or_default(),
        })
    }
}

/// RFC 3820 `ProxyPolicy`: a policy language OID with an optional opaque
/// policy body interpreted under that language.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct ProxyPolicy {
    pub policy_language: ObjectIdentifier,
    pub policy: Option<OctetString>,
}

/// RFC 3820 `ProxyCertInfoExtension`.
///
/// Marks a certificate as a standards-track proxy and bounds further
/// delegation via `path_len_constraint`.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct ProxyCertInfo {
    pub path_len_constraint: Option<u64>,
    pub proxy_policy: ProxyPolicy,
}

impl ToAndFromX509Extension for ProxyCertInfo {
    const OID: ObjectIdentifier = ID_PE_PROXY_CERT_INFO;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, ProxyKitError> {
        Ok(self.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, ProxyKitError> {
        ProxyCertInfo::from_der(extension).map_err(|e| ProxyKitError::CertificateLoad(e.to_string()))
    }
}
