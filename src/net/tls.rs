use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use ring::digest::{digest, SHA256};
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::info;
use wtransport::tls::{Certificate, CertificateChain, PrivateKey};
use wtransport::Identity;

// Dev certificate paths (optional, checked before generating one)
const DEV_CERT_FILE: &str = "certs/cert.pem";
const DEV_KEY_FILE: &str = "certs/key.pem";

/// Browsers only accept pinned certificate hashes for certs valid <= 14 days
const SELF_SIGNED_VALIDITY: Duration = Duration::from_secs(14 * 24 * 60 * 60);

/// TLS configuration for WebTransport server
pub struct TlsConfig {
    /// The wtransport Identity containing certificate and key
    pub identity: Identity,
    /// Base64-encoded SHA-256 hash of the certificate (for serverCertificateHashes)
    pub cert_hash: String,
}

impl TlsConfig {
    /// Load TLS configuration
    ///
    /// Explicit PEM paths win, then `certs/`, then an in-process
    /// self-signed certificate for localhost.
    pub async fn load(cert_path: Option<&str>, key_path: Option<&str>) -> Result<Self> {
        if let (Some(cert_path), Some(key_path)) = (cert_path, key_path) {
            info!("Loading TLS certificate from {}", cert_path);
            return Self::load_from_paths(cert_path, key_path).await;
        }

        if Path::new(DEV_CERT_FILE).exists() && Path::new(DEV_KEY_FILE).exists() {
            info!("Loading dev certificate from certs/");
            return Self::load_from_paths(DEV_CERT_FILE, DEV_KEY_FILE).await;
        }

        info!("No certificate configured, generating a self-signed one");
        Self::generate_self_signed()
    }

    /// Load certificate from PEM file paths
    async fn load_from_paths(cert_path: &str, key_path: &str) -> Result<Self> {
        let identity = Identity::load_pemfiles(cert_path, key_path)
            .await
            .context("Failed to load certificate from PEM files")?;
        Ok(Self::from_identity(identity))
    }

    /// Generate a short-lived self-signed certificate for localhost
    pub fn generate_self_signed() -> Result<Self> {
        let mut params = CertificateParams::new(vec![
            "localhost".to_string(),
            "127.0.0.1".to_string(),
        ])
        .context("Invalid certificate subject names")?;

        params.distinguished_name = DistinguishedName::new();
        params
            .distinguished_name
            .push(DnType::CommonName, "Chase Arena Dev");

        let now = SystemTime::now();
        params.not_before = now.into();
        params.not_after = (now + SELF_SIGNED_VALIDITY).into();

        let key_pair = KeyPair::generate().context("Failed to generate key pair")?;
        let cert = params
            .self_signed(&key_pair)
            .context("Failed to self-sign certificate")?;

        let certificate = Certificate::from_der(cert.der().to_vec())
            .map_err(|e| anyhow!("Generated certificate is not valid DER: {:?}", e))?;
        let identity = Identity::new(
            CertificateChain::single(certificate),
            PrivateKey::from_der_pkcs8(key_pair.serialize_der()),
        );
        Ok(Self::from_identity(identity))
    }

    fn from_identity(identity: Identity) -> Self {
        let cert_hash = Self::compute_cert_hash(&identity);
        info!("Certificate hash: {}", cert_hash);
        Self {
            identity,
            cert_hash,
        }
    }

    fn compute_cert_hash(identity: &Identity) -> String {
        identity
            .certificate_chain()
            .as_slice()
            .first()
            .map(|cert| STANDARD.encode(digest(&SHA256, cert.der()).as_ref()))
            .unwrap_or_default()
    }

    /// Get the certificate hash for client configuration
    pub fn cert_hash(&self) -> &str {
        &self.cert_hash
    }
}
