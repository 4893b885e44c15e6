use axum_server::tls_rustls::RustlsConfig;
use chrono::{DateTime, TimeZone, Utc};
use rustls::{Certificate, PrivateKey};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Certificate chain and private key locations for one domain.
///
/// The layout is dictated by acme.sh and must not change independently:
/// `{account_dir}/{domain}/fullchain.cer` and
/// `{account_dir}/{domain}/{domain}.key`.
#[derive(Debug, Clone)]
pub struct CertificatePaths {
    pub chain: PathBuf,
    pub key: PathBuf,
}

impl CertificatePaths {
    pub fn for_domain(account_dir: &Path, domain: &str) -> Self {
        let base = account_dir.join(domain);
        Self {
            chain: base.join("fullchain.cer"),
            key: base.join(format!("{}.key", domain)),
        }
    }
}

/// Certificate material could not be loaded.
///
/// Absent files are the expected state before first issuance; callers treat
/// that as "not ready yet" rather than an error worth propagating.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid material in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("TLS context rejected certificate material: {0}")]
    Tls(std::io::Error),
}

impl LoadError {
    /// The files simply do not exist yet.
    pub fn is_not_ready(&self) -> bool {
        matches!(
            self,
            LoadError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Parsed view of the material on disk, used for validation and logging.
#[derive(Debug, Clone)]
pub struct LoadedCertificate {
    pub chain: Vec<Certificate>,
    pub key: PrivateKey,
    /// Leaf certificate expiry, when the X.509 structure is readable.
    pub expires_at: Option<DateTime<Utc>>,
    /// Domain names the leaf certificate covers.
    pub domains: Vec<String>,
}

/// Load the certificate/key pair into a fresh TLS context.
///
/// The returned context is a complete replacement; nothing is mutated in
/// place. Every call re-reads the files, since acme.sh rewrites them
/// out-of-process.
pub async fn load(paths: &CertificatePaths) -> Result<(RustlsConfig, LoadedCertificate), LoadError> {
    let chain_pem = read(&paths.chain)?;
    let key_pem = read(&paths.key)?;

    let chain = parse_chain(&chain_pem, &paths.chain)?;
    let key = parse_private_key(&key_pem, &paths.key)?;
    let (expires_at, domains) = extract_cert_info(&chain[0]);

    let config = RustlsConfig::from_pem(chain_pem, key_pem)
        .await
        .map_err(LoadError::Tls)?;

    Ok((
        config,
        LoadedCertificate {
            chain,
            key,
            expires_at,
            domains,
        },
    ))
}

fn read(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a PEM-encoded certificate chain, leaf first.
pub fn parse_chain(pem: &[u8], path: &Path) -> Result<Vec<Certificate>, LoadError> {
    let mut reader = BufReader::new(pem);
    let certs = rustls_pemfile::certs(&mut reader).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if certs.is_empty() {
        return Err(LoadError::Parse {
            path: path.to_path_buf(),
            reason: "no certificates found in PEM data".to_string(),
        });
    }

    Ok(certs.into_iter().map(Certificate).collect())
}

/// Parse a PEM-encoded private key (RSA, PKCS8, or ECDSA).
pub fn parse_private_key(pem: &[u8], path: &Path) -> Result<PrivateKey, LoadError> {
    let parse_err = |e: std::io::Error| LoadError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let mut reader = BufReader::new(pem);
    let rsa_keys = rustls_pemfile::rsa_private_keys(&mut reader).map_err(parse_err)?;
    if let Some(key) = rsa_keys.into_iter().next() {
        return Ok(PrivateKey(key));
    }

    let mut reader = BufReader::new(pem);
    let pkcs8_keys = rustls_pemfile::pkcs8_private_keys(&mut reader).map_err(parse_err)?;
    if let Some(key) = pkcs8_keys.into_iter().next() {
        return Ok(PrivateKey(key));
    }

    let mut reader = BufReader::new(pem);
    let ec_keys = rustls_pemfile::ec_private_keys(&mut reader).map_err(parse_err)?;
    if let Some(key) = ec_keys.into_iter().next() {
        return Ok(PrivateKey(key));
    }

    Err(LoadError::Parse {
        path: path.to_path_buf(),
        reason: "no private key found (tried RSA, PKCS8, ECDSA)".to_string(),
    })
}

/// Extract expiry and covered domains from the leaf certificate.
///
/// Best effort: an unparseable certificate still serves (rustls has its own
/// validation), it just logs without metadata.
fn extract_cert_info(cert: &Certificate) -> (Option<DateTime<Utc>>, Vec<String>) {
    use x509_parser::parse_x509_certificate;

    let x509 = match parse_x509_certificate(&cert.0) {
        Ok((_, x509)) => x509,
        Err(_) => return (None, Vec::new()),
    };

    let expires_at = Utc
        .timestamp_opt(x509.validity().not_after.timestamp(), 0)
        .single();

    let mut domains = Vec::new();
    if let Some(cn) = x509.subject().iter_common_name().next() {
        if let Ok(cn_str) = cn.as_str() {
            domains.push(cn_str.to_string());
        }
    }

    let san_ext = x509
        .extensions()
        .iter()
        .find(|ext| ext.oid == x509_parser::oid_registry::OID_X509_EXT_SUBJECT_ALT_NAME);
    if let Some(san) = san_ext {
        if let x509_parser::extensions::ParsedExtension::SubjectAlternativeName(names) =
            san.parsed_extension()
        {
            for name in &names.general_names {
                if let x509_parser::extensions::GeneralName::DNSName(dns) = name {
                    domains.push(dns.to_string());
                }
            }
        }
    }

    domains.sort();
    domains.dedup();

    (expires_at, domains)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_convention_follows_account_layout() {
        let paths = CertificatePaths::for_domain(Path::new("/home/user/.acme.sh"), "example.com");
        assert_eq!(
            paths.chain,
            PathBuf::from("/home/user/.acme.sh/example.com/fullchain.cer")
        );
        assert_eq!(
            paths.key,
            PathBuf::from("/home/user/.acme.sh/example.com/example.com.key")
        );
    }

    #[test]
    fn invalid_pem_chain_fails() {
        let result = parse_chain(b"NOT A PEM FILE", Path::new("fullchain.cer"));
        assert!(result.is_err());
    }

    #[test]
    fn empty_pem_chain_fails() {
        let result = parse_chain(b"", Path::new("fullchain.cer"));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_private_key_fails() {
        let result = parse_private_key(b"NOT A KEY", Path::new("example.com.key"));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn missing_files_report_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let paths = CertificatePaths::for_domain(dir.path(), "example.com");
        let err = load(&paths).await.unwrap_err();
        assert!(err.is_not_ready());
    }

    #[tokio::test]
    async fn garbage_files_are_not_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("example.com");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(base.join("fullchain.cer"), "garbage").unwrap();
        std::fs::write(base.join("example.com.key"), "garbage").unwrap();

        let paths = CertificatePaths::for_domain(dir.path(), "example.com");
        let err = load(&paths).await.unwrap_err();
        assert!(!err.is_not_ready());
    }
}
