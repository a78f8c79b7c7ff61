//! Proxy credential generation.
//!
//! A proxy certificate delegates the end-entity identity to a freshly
//! generated keypair for a bounded time: its issuer is the end-entity
//! subject, its subject is that name with one appended CN, and it is
//! signed with the end-entity private key. The proxy key itself signs
//! nothing here.

use bon::Builder;
use der::asn1::{OctetString, SetOfVec, Utf8StringRef};
use rand_core::{OsRng, RngCore};
use time::{Duration, OffsetDateTime};
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::certificate::CertificateInner;
use x509_cert::name::{RdnSequence, RelativeDistinguishedName};

use crate::cert::extensions::{
    AuthorityKeyIdentifier, ExtensionParam, ID_GLOBUS_LIMITED_PROXY, ID_PPL_INDEPENDENT,
    ID_PPL_INHERIT_ALL, KeyUsage, KeyUsages, ProxyCertInfo, ProxyPolicy,
};
use crate::cert::{Certificate, SignatureAlgorithm};
use crate::chain::CertificateChain;
use crate::error::{ProxyKitError, Result};
use crate::key::KeyPair;
use crate::private_key::PrivateKeyMaterial;
use crate::tbs_certificate::TbsCertificate;

/// Default proxy key size in bits.
///
/// 512 bits matches the historical grid default and is far too small for
/// modern use; production callers should override it via
/// [`ProxyParameters`].
pub const DEFAULT_KEY_BITS: usize = 512;

/// Default proxy lifetime: 24 hours.
pub const DEFAULT_LIFETIME_SECS: u64 = 86400;

/// The proxy certificate flavor to generate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProxyType {
    /// Legacy GSI-2 full proxy: subject suffix `CN=proxy`, no
    /// proxyCertInfo extension.
    Legacy,
    /// Legacy GSI-2 limited proxy: subject suffix `CN=limited proxy`.
    LegacyLimited,
    /// RFC 3820 impersonation proxy (policy: inherit all rights).
    Rfc3820Impersonation,
    /// RFC 3820 independent proxy (policy: no inherited rights).
    Rfc3820Independent,
    /// RFC 3820 proxy limited the Globus way.
    Rfc3820Limited,
    /// RFC 3820 restricted proxy with a caller-supplied policy.
    Rfc3820Restricted {
        policy_language: der::oid::ObjectIdentifier,
        policy: Vec<u8>,
    },
}

impl Default for ProxyType {
    fn default() -> Self {
        ProxyType::Legacy
    }
}

impl ProxyType {
    /// The CN value appended to the end-entity subject.
    ///
    /// Legacy proxies use fixed markers; RFC 3820 proxies use the decimal
    /// serial number, per the Globus convention.
    fn proxy_cn(&self, serial: u32) -> String {
        match self {
            ProxyType::Legacy => "proxy".to_string(),
            ProxyType::LegacyLimited => "limited proxy".to_string(),
            _ => serial.to_string(),
        }
    }

    /// The RFC 3820 proxy policy, or `None` for legacy proxies.
    fn policy(&self) -> Result<Option<ProxyPolicy>> {
        let policy = match self {
            ProxyType::Legacy | ProxyType::LegacyLimited => return Ok(None),
            ProxyType::Rfc3820Impersonation => ProxyPolicy {
                policy_language: ID_PPL_INHERIT_ALL,
                policy: None,
            },
            ProxyType::Rfc3820Independent => ProxyPolicy {
                policy_language: ID_PPL_INDEPENDENT,
                policy: None,
            },
            ProxyType::Rfc3820Limited => ProxyPolicy {
                policy_language: ID_GLOBUS_LIMITED_PROXY,
                policy: None,
            },
            ProxyType::Rfc3820Restricted {
                policy_language,
                policy,
            } => ProxyPolicy {
                policy_language: *policy_language,
                policy: Some(
                    OctetString::new(policy.clone())
                        .map_err(|e| ProxyKitError::ProxyGeneration(e.to_string()))?,
                ),
            },
        };
        Ok(Some(policy))
    }
}

/// Generation configuration, with defaults matching historical grid
/// behavior when the caller supplies nothing.
#[derive(Clone, Debug, Builder)]
pub struct ProxyParameters {
    /// Size of the freshly generated proxy key, in bits.
    #[builder(default = DEFAULT_KEY_BITS)]
    pub bits: usize,
    /// Validity window length in seconds, anchored at generation time.
    #[builder(default = DEFAULT_LIFETIME_SECS)]
    pub lifetime_secs: u64,
    /// Proxy flavor; legacy GSI-2 when unspecified.
    #[builder(default)]
    pub proxy_type: ProxyType,
    /// Additional extensions to embed in the proxy certificate.
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

impl Default for ProxyParameters {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// The generated credential: a new private key, the signed proxy
/// certificate, and the original supporting chain.
///
/// Self-contained once generated; the inputs may be discarded.
#[derive(Debug)]
pub struct ProxyCredential {
    private_key: KeyPair,
    certificate: Certificate,
    chain: CertificateChain,
}

impl ProxyCredential {
    /// The freshly generated proxy private key.
    pub fn private_key(&self) -> &KeyPair {
        &self.private_key
    }

    /// The signed proxy certificate.
    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    /// The supporting issuer chain, end-entity first.
    pub fn chain(&self) -> &CertificateChain {
        &self.chain
    }

    /// Serializes the credential in proxy-file order: proxy certificate,
    /// proxy key (PKCS#8), then the supporting chain.
    pub fn to_pem(&self) -> Result<String> {
        let mut out = self.certificate.to_pem()?;
        out.push_str(&self.private_key.to_pkcs8_pem()?);
        out.push_str(&self.chain.to_pem()?);
        Ok(out)
    }
}

/// Generates a proxy credential from a loaded chain and decrypted key.
///
/// Single deterministic attempt; any failure is terminal for this
/// invocation.
pub fn generate(
    chain: CertificateChain,
    key: PrivateKeyMaterial,
    params: &ProxyParameters,
) -> Result<ProxyCredential> {
    if params.lifetime_secs == 0 {
        return Err(ProxyKitError::ProxyGeneration(
            "proxy lifetime must be positive".to_string(),
        ));
    }

    let signing_key = key.into_key();
    let proxy_key = KeyPair::generate_rsa(params.bits)?;

    // Positive, non-zero serial with the top bit clear, so the DER
    // INTEGER encoding never needs a leading zero octet.
    let mut serial_bytes = OsRng.next_u32().to_be_bytes();
    serial_bytes[0] = (serial_bytes[0] & 0x7F) | 0x01;
    let serial = u32::from_be_bytes(serial_bytes);

    let end_entity = chain.end_entity();
    let issuer = end_entity.subject().clone();
    let subject = append_cn(&issuer, &params.proxy_type.proxy_cn(serial))?;

    // UTCTime carries whole seconds; truncate so the encoded window is
    // exactly the configured lifetime.
    let now = OffsetDateTime::now_utc();
    let not_before = now - Duration::nanoseconds(now.nanosecond() as i64);
    let not_after = not_before + Duration::seconds(params.lifetime_secs as i64);

    let key_id =
        <sha1::Sha1 as sha1::Digest>::digest(end_entity.public_key().subject_public_key.raw_bytes());
    let authority_key_id = AuthorityKeyIdentifier {
        key_identifier: key_id.to_vec(),
    };

    let mut extensions = vec![
        ExtensionParam::from_extension(
            KeyUsage(KeyUsages::DigitalSignature | KeyUsages::KeyEncipherment),
            true,
        ),
        ExtensionParam::from_extension(authority_key_id, false),
    ];
    if let Some(proxy_policy) = params.proxy_type.policy()? {
        let proxy_cert_info = ProxyCertInfo {
            path_len_constraint: None,
            proxy_policy,
        };
        extensions.push(ExtensionParam::from_extension(proxy_cert_info, true));
    }
    extensions.extend(params.extensions.iter().cloned());

    let signature_algorithm = signing_key.signature_algorithm();
    let tbs = TbsCertificate {
        serial_number: serial_bytes.to_vec(),
        signature_algorithm: signature_algorithm.clone(),
        issuer,
        not_before,
        not_after,
        subject,
        subject_public_key: proxy_key.as_spki()?,
        extensions,
    };

    let tbs_inner = tbs.to_tbs_certificate_inner()?;
    let tbs_der = tbs.to_der()?;
    let signature = signing_key.sign_data(&tbs_der)?;

    let certificate = Certificate {
        inner: CertificateInner {
            tbs_certificate: tbs_inner,
            signature_algorithm: signature_algorithm.into(),
            signature: der::asn1::BitString::from_bytes(&signature)
                .map_err(|e| ProxyKitError::ProxyGeneration(e.to_string()))?,
        },
    };

    Ok(ProxyCredential {
        private_key: proxy_key,
        certificate,
        chain,
    })
}

/// Returns `base` with one appended `CN=<value>` RDN.
fn append_cn(base: &RdnSequence, common_name: &str) -> Result<RdnSequence> {
    let utf8 = Utf8StringRef::new(common_name)
        .map_err(|e| ProxyKitError::ProxyGeneration(e.to_string()))?;
    let any_ref: der::AnyRef = utf8.into();
    let atav = AttributeTypeAndValue {
        oid: const_oid::db::rfc4519::CN,
        value: any_ref.into(),
    };
    let set = SetOfVec::try_from(vec![atav])
        .map_err(|e| ProxyKitError::ProxyGeneration(e.to_string()))?;
    let mut rdns = base.0.clone();
    rdns.push(RelativeDistinguishedName(set));
    Ok(RdnSequence(rdns))
}
