use std::io::Write;
use std::path::PathBuf;

use der::{Decode, Encode};
use proxykit::builder::ProxyBuilder;
use proxykit::cert::extensions::{ID_PE_PROXY_CERT_INFO, ID_PPL_INHERIT_ALL, ProxyCertInfo};
use proxykit::chain::CertificateChain;
use proxykit::error::ProxyKitError;
use proxykit::key::KeyPair;
use proxykit::private_key;
use proxykit::proxy::{ProxyParameters, ProxyType};
use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use sha2::Sha256;

const PASSWORD: &str = "experimentworkbench";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn generates_default_legacy_proxy() {
    let credential = ProxyBuilder::new()
        .load_certificate(fixture("userchain.pem"))
        .unwrap()
        .load_private_key(fixture("userkey.pem"), PASSWORD)
        .unwrap()
        .generate_proxy()
        .unwrap();

    let chain = CertificateChain::load(fixture("userchain.pem")).unwrap();
    let end_entity = chain.end_entity();
    let proxy_cert = credential.certificate();

    // Issuer is the end-entity subject; subject extends it by one RDN.
    assert_eq!(proxy_cert.issuer(), end_entity.subject());
    assert_eq!(proxy_cert.subject().0.len(), end_entity.subject().0.len() + 1);
    assert_eq!(
        proxy_cert.subject().0[..end_entity.subject().0.len()],
        end_entity.subject().0[..]
    );

    let subject = proxy_cert.subject().to_string();
    assert!(subject.contains("O=Dice Team"), "subject: {subject}");
    assert!(subject.contains("OU=ACK CYFRONET AGH"), "subject: {subject}");
    assert!(subject.contains("CN=proxy"), "subject: {subject}");

    // Default lifetime is 24 hours, exactly.
    let window = proxy_cert.not_after() - proxy_cert.not_before();
    assert_eq!(window.whole_seconds(), 86400);

    // Legacy proxies carry no proxyCertInfo extension.
    let extensions = proxy_cert.inner.tbs_certificate.extensions.as_deref().unwrap();
    assert!(
        extensions.iter().all(|e| e.extn_id != ID_PE_PROXY_CERT_INFO),
        "legacy proxy must not carry proxyCertInfo"
    );

    // The supporting chain is carried unchanged.
    assert_eq!(credential.chain().len(), chain.len());

    // The proxy is signed by the end-entity key, not the proxy key.
    let spki_der = end_entity.public_key().to_der().unwrap();
    let issuer_key = RsaPublicKey::from_public_key_der(&spki_der).unwrap();
    let verifying_key = VerifyingKey::<Sha256>::new(issuer_key);
    let tbs_der = proxy_cert.inner.tbs_certificate.to_der().unwrap();
    let signature =
        Signature::try_from(proxy_cert.inner.signature.raw_bytes()).unwrap();
    verifying_key.verify(&tbs_der, &signature).unwrap();
}

#[test]
fn lifetime_is_exact_for_custom_values() {
    let params = ProxyParameters::builder().lifetime_secs(3600).build();
    let credential = ProxyBuilder::new()
        .load_certificate(fixture("userchain.pem"))
        .unwrap()
        .load_private_key(fixture("userkey_plain.pem"), "")
        .unwrap()
        .generate_proxy_with(&params)
        .unwrap();

    let cert = credential.certificate();
    assert_eq!((cert.not_after() - cert.not_before()).whole_seconds(), 3600);
}

#[test]
fn zero_lifetime_is_rejected() {
    let params = ProxyParameters::builder().lifetime_secs(0).build();
    let err = ProxyBuilder::new()
        .load_certificate(fixture("userchain.pem"))
        .unwrap()
        .load_private_key(fixture("userkey_plain.pem"), "")
        .unwrap()
        .generate_proxy_with(&params)
        .unwrap_err();
    assert!(matches!(err, ProxyKitError::ProxyGeneration(_)));
}

#[test]
fn rfc3820_proxy_carries_proxy_cert_info() {
    let params = ProxyParameters::builder()
        .proxy_type(ProxyType::Rfc3820Impersonation)
        .build();
    let credential = ProxyBuilder::new()
        .load_certificate(fixture("userchain.pem"))
        .unwrap()
        .load_private_key(fixture("userkey.pem"), PASSWORD)
        .unwrap()
        .generate_proxy_with(&params)
        .unwrap();

    let cert = credential.certificate();
    let extensions = cert.inner.tbs_certificate.extensions.as_deref().unwrap();
    let ext = extensions
        .iter()
        .find(|e| e.extn_id == ID_PE_PROXY_CERT_INFO)
        .expect("proxyCertInfo extension missing");
    assert!(ext.critical);

    let info = ProxyCertInfo::from_der(ext.extn_value.as_bytes()).unwrap();
    assert_eq!(info.proxy_policy.policy_language, ID_PPL_INHERIT_ALL);
    assert!(info.path_len_constraint.is_none());

    // RFC 3820 proxies name themselves after the serial number.
    let serial: [u8; 4] = cert.serial_number().try_into().unwrap();
    let serial = u32::from_be_bytes(serial);
    let subject = cert.subject().to_string();
    assert!(
        subject.contains(&format!("CN={serial}")),
        "subject {subject} should contain CN={serial}"
    );
}

#[test]
fn wrong_password_fails_without_touching_the_chain() {
    let builder = ProxyBuilder::new()
        .load_certificate(fixture("userchain.pem"))
        .unwrap();

    let err = builder
        .load_private_key(fixture("userkey.pem"), "wrongexperimentworkbench")
        .unwrap_err();
    assert!(matches!(err, ProxyKitError::WrongPassword));

    // The chain is still loaded; retrying with the right password works.
    assert_eq!(builder.chain().len(), 2);
    let credential = builder
        .load_private_key(fixture("userkey.pem"), PASSWORD)
        .unwrap()
        .generate_proxy()
        .unwrap();
    assert!(credential.certificate().subject().to_string().contains("CN=proxy"));
}

#[test]
fn all_encrypted_key_containers_decrypt() {
    for name in ["userkey.pem", "userkey_aes.pem", "userkey_pkcs8.pem"] {
        let material = private_key::load_private_key(fixture(name), PASSWORD)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        assert!(material.was_encrypted(), "{name} should report encrypted");
        assert!(matches!(material.key(), KeyPair::Rsa { .. }));
    }

    let plain = private_key::load_private_key(fixture("userkey_plain.pem"), "").unwrap();
    assert!(!plain.was_encrypted());
}

#[test]
fn wrong_password_rejected_for_every_encrypted_container() {
    for name in ["userkey.pem", "userkey_aes.pem", "userkey_pkcs8.pem"] {
        let err = private_key::load_private_key(fixture(name), "nope").unwrap_err();
        assert!(
            matches!(err, ProxyKitError::WrongPassword),
            "{name}: {err:?}"
        );
    }
}

#[test]
fn certificate_loader_rejects_a_key_file() {
    let err = CertificateChain::load(fixture("userkey.pem")).unwrap_err();
    match err {
        ProxyKitError::CertificateLoad(msg) => {
            assert!(
                msg.contains("does not contain any valid certificate"),
                "message: {msg}"
            )
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn key_loader_rejects_a_certificate_file() {
    let err = private_key::load_private_key(fixture("usercert.pem"), PASSWORD).unwrap_err();
    assert!(matches!(err, ProxyKitError::PrivateKeyLoad(_)));
}

#[test]
fn missing_paths_fail_with_load_errors() {
    assert!(matches!(
        CertificateChain::load("/no/such/usercert.pem"),
        Err(ProxyKitError::CertificateLoad(_))
    ));
    assert!(matches!(
        private_key::load_private_key("/no/such/userkey.pem", PASSWORD),
        Err(ProxyKitError::PrivateKeyLoad(_))
    ));
}

#[test]
fn empty_and_garbage_chain_files_fail_cleanly() {
    let mut empty = tempfile::NamedTempFile::new().unwrap();
    empty.flush().unwrap();
    assert!(matches!(
        CertificateChain::load(empty.path()),
        Err(ProxyKitError::CertificateLoad(_))
    ));

    let mut garbage = tempfile::NamedTempFile::new().unwrap();
    garbage.write_all(b"this is not pem at all").unwrap();
    garbage.flush().unwrap();
    assert!(matches!(
        CertificateChain::load(garbage.path()),
        Err(ProxyKitError::CertificateLoad(_))
    ));
}

#[test]
fn serialized_credential_round_trips() {
    let credential = ProxyBuilder::new()
        .load_certificate(fixture("userchain.pem"))
        .unwrap()
        .load_private_key(fixture("userkey.pem"), PASSWORD)
        .unwrap()
        .generate_proxy()
        .unwrap();

    let pem = credential.to_pem().unwrap();

    // The credential file parses back as: proxy cert, then the chain
    // (the key block is not a certificate and is skipped).
    let reparsed = CertificateChain::from_pem(&pem).unwrap();
    assert_eq!(reparsed.len(), credential.chain().len() + 1);

    let original = credential.certificate();
    let restored = reparsed.end_entity();
    assert_eq!(restored.issuer(), original.issuer());
    assert_eq!(restored.subject(), original.subject());
    assert_eq!(restored.not_before(), original.not_before());
    assert_eq!(restored.not_after(), original.not_after());
}
