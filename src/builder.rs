//! Fluent, single-use facade over the load → load → generate pipeline.
//!
//! The build order is enforced by the type system: each step consumes the
//! previous state and returns the next, so calling `generate_proxy`
//! before both loads have succeeded does not compile.

use std::path::Path;

use crate::chain::CertificateChain;
use crate::error::Result;
use crate::private_key::{self, PrivateKeyMaterial};
use crate::proxy::{self, ProxyCredential, ProxyParameters};

/// Entry state: nothing loaded yet.
#[derive(Debug, Default)]
pub struct ProxyBuilder;

/// Intermediate state: certificate chain loaded.
#[derive(Debug)]
pub struct ProxyBuilderWithChain {
    chain: CertificateChain,
}

/// Final state: chain and private key loaded, ready to generate.
#[derive(Debug)]
pub struct ProxyBuilderReady {
    chain: CertificateChain,
    key: PrivateKeyMaterial,
}

impl ProxyBuilder {
    pub fn new() -> Self {
        ProxyBuilder
    }

    /// Loads the identity certificate chain from a PEM file.
    pub fn load_certificate(self, path: impl AsRef<Path>) -> Result<ProxyBuilderWithChain> {
        let chain = CertificateChain::load(path)?;
        Ok(ProxyBuilderWithChain { chain })
    }
}

impl ProxyBuilderWithChain {
    /// Loads (and if needed decrypts) the matching private key.
    ///
    /// Takes `&self` so the loaded chain is unaffected when this step
    /// fails and the caller may retry with a different password.
    pub fn load_private_key(
        &self,
        path: impl AsRef<Path>,
        password: &str,
    ) -> Result<ProxyBuilderReady> {
        let key = private_key::load_private_key(path, password)?;
        Ok(ProxyBuilderReady {
            chain: self.chain.clone(),
            key,
        })
    }

    /// The loaded chain, for inspection before committing to a key.
    pub fn chain(&self) -> &CertificateChain {
        &self.chain
    }
}

impl ProxyBuilderReady {
    /// Generates a proxy credential with default parameters
    /// (512-bit key, 24-hour lifetime, legacy GSI-2 proxy).
    pub fn generate_proxy(self) -> Result<ProxyCredential> {
        self.generate_proxy_with(&ProxyParameters::default())
    }

    /// Generates a proxy credential with explicit parameters.
    pub fn generate_proxy_with(self, params: &ProxyParameters) -> Result<ProxyCredential> {
        proxy::generate(self.chain, self.key, params)
    }
}
