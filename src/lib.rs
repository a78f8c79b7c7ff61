//! # ProxyKit - A Pure Rust Proxy Credential Library
//!
//! ProxyKit generates short-lived X.509 proxy credentials (RFC 3820 and
//! legacy GSI-2 delegation certificates) from a long-term identity
//! certificate chain and its private key, entirely with rustcrypto
//! libraries and without dependencies on ring or openssl.
//!
//! A proxy certificate delegates the end-entity identity to a freshly
//! generated keypair for a bounded time window, so grid and
//! distributed-computing clients can act on a user's behalf without ever
//! exposing the long-term key.
//!
//! ## Supported Inputs
//!
//! - **Certificate chain**: PEM file with one or more certificates,
//!   end-entity first.
//! - **Private key**: PKCS#1, PKCS#8, or SEC1 PEM containers; encrypted
//!   containers (traditional OpenSSL `DEK-Info` or PKCS#8 PBES2) are
//!   decrypted with the supplied password.
//!
//! ## Supported Proxy Types
//!
//! - **Legacy GSI-2**: full (`CN=proxy`) and limited (`CN=limited proxy`)
//! - **RFC 3820**: impersonation, independent, limited, and restricted
//!   variants via the critical proxyCertInfo extension
//!
//! ## Quick Start
//!
//! ### Generating a Proxy Credential
//!
//! ```rust,no_run
//! use proxykit::builder::ProxyBuilder;
//!
//! # fn main() -> Result<(), proxykit::error::ProxyKitError> {
//! let credential = ProxyBuilder::new()
//!     .load_certificate("/home/user/.globus/usercert.pem")?
//!     .load_private_key("/home/user/.globus/userkey.pem", "secret")?
//!     .generate_proxy()?;
//!
//! // The credential is self-contained: new key, new certificate, and
//! // the original supporting chain.
//! println!("{}", credential.to_pem()?);
//! # Ok(())
//! # }
//! ```
//!
//! ### Customizing Generation Parameters
//!
//! The defaults (512-bit key, 24-hour lifetime, legacy proxy) preserve
//! historical grid behavior; override them for anything
//! security-sensitive:
//!
//! ```rust,no_run
//! use proxykit::builder::ProxyBuilder;
//! use proxykit::proxy::{ProxyParameters, ProxyType};
//!
//! # fn main() -> Result<(), proxykit::error::ProxyKitError> {
//! let params = ProxyParameters::builder()
//!     .bits(2048)
//!     .lifetime_secs(12 * 3600)
//!     .proxy_type(ProxyType::Rfc3820Impersonation)
//!     .build();
//!
//! let credential = ProxyBuilder::new()
//!     .load_certificate("usercert.pem")?
//!     .load_private_key("userkey.pem", "secret")?
//!     .generate_proxy_with(&params)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failure is surfaced immediately as a typed error identifying the
//! stage that failed, so callers can react precisely:
//!
//! ```rust
//! use proxykit::error::ProxyKitError;
//! use proxykit::private_key;
//!
//! match private_key::from_pem("not pem data", "secret") {
//!     Ok(_) => println!("key loaded"),
//!     Err(ProxyKitError::WrongPassword) => println!("re-prompt for the password"),
//!     Err(e) => println!("failed: {e}"),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`builder`]: Typestate facade sequencing the pipeline
//! - [`chain`]: Certificate chain loading
//! - [`private_key`]: Private key loading and password decryption
//! - [`proxy`]: Proxy parameters, generation, and the resulting credential
//! - [`cert`]: Certificate wrapper and X.509 extensions
//! - [`key`]: Key pairs and signing
//! - [`error`]: Error types and handling
//! - [`tbs_certificate`]: Low-level certificate structure assembly

pub mod builder;
pub mod cert;
pub mod chain;
pub mod error;
pub mod key;
pub mod private_key;
pub mod proxy;
pub mod tbs_certificate;
