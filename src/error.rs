use thiserror::Error;

/// Represents errors that can occur in the ProxyKit library.
///
/// Each variant identifies the pipeline stage that failed, so callers can
/// react precisely (for example, re-prompt for a password only on
/// [`ProxyKitError::WrongPassword`]).
#[derive(Debug, Error, Clone)]
pub enum ProxyKitError {
    /// The certificate chain file is missing, unreadable, or does not
    /// contain valid certificates.
    #[error("Failed to load certificate: {0}")]
    CertificateLoad(String),

    /// The private key file is missing, unreadable, or the key container
    /// is structurally invalid.
    #[error("Failed to load private key: {0}")]
    PrivateKeyLoad(String),

    /// Decryption of an encrypted private key failed.
    ///
    /// Deliberately carries no further detail: bad padding, an integrity
    /// failure, and a post-decryption parse failure are indistinguishable
    /// to the caller, so the error cannot serve as a password oracle.
    #[error("Wrong private key password")]
    WrongPassword,

    /// Key generation, certificate construction, or signing failed.
    #[error("Proxy generation failed: {0}")]
    ProxyGeneration(String),

    /// Error while serializing data to DER or PEM.
    #[error("Failed to encode data: {0}")]
    Encoding(String),
}

pub type Result<T> = std::result::Result<T, ProxyKitError>;

impl From<rsa::Error> for ProxyKitError {
    fn from(err: rsa::Error) -> Self {
        ProxyKitError::ProxyGeneration(err.to_string())
    }
}

impl From<der::Error> for ProxyKitError {
    /// DER errors outside the load paths only occur while encoding.
    fn from(err: der::Error) -> Self {
        ProxyKitError::Encoding(err.to_string())
    }
}
