// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use openssl::pkey::{PKey, Private};
use openssl::x509::{X509, X509Ref};
use std::fs;
use std::path::{Path, PathBuf};

/// The resolved credential source for one signing run.  Exactly one variant
/// is ever active; the resolver holds paths only and leaves key-material
/// parsing to [`CredentialBundle::load`], invoked by the signer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialBundle {
    /// A PEM bundle holding the signing private key plus certificate(s)
    TrustStore { path: PathBuf },
    /// A separate certificate + private-key PEM pair; `embed` carries the
    /// full certificate into the signature's key-identification block
    PemPair {
        cert_path: PathBuf,
        key_path: PathBuf,
        embed: bool,
    },
}

/// How the signature identifies its key material.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyIdentification {
    /// Key name derived from the certificate's subject-key-identifier
    KeyName(String),
    /// Subject name plus the full DER certificate
    EmbeddedCertificate { subject: String, der: Vec<u8> },
    /// Bare public key values only
    PublicKey,
}

/// Parsed signing material handed to the signer.
pub struct SigningKey {
    pub key: PKey<Private>,
    pub key_id: KeyIdentification,
}

impl CredentialBundle {
    /// Resolve the credential source from the supplied inputs.  A trust
    /// store always wins; otherwise both halves of the PEM pair are
    /// required.
    pub fn resolve(
        truststore: Option<&Path>,
        cert: Option<&Path>,
        key: Option<&Path>,
        embed: bool,
    ) -> Result<Self, Error> {
        if let Some(path) = truststore {
            return Ok(CredentialBundle::TrustStore {
                path: path.to_path_buf(),
            });
        }

        match (cert, key) {
            (Some(c), Some(k)) => Ok(CredentialBundle::PemPair {
                cert_path: c.to_path_buf(),
                key_path: k.to_path_buf(),
                embed,
            }),
            _ => Err(Error::CredentialsMissing(
                "a trust store, or a certificate and private key pair, must be supplied"
                    .to_string(),
            )),
        }
    }

    /// Parse the credential source into signing material.  The signature
    /// method is fixed to RSA-SHA256, so a non-RSA key is rejected here.
    pub fn load(&self) -> Result<SigningKey, Error> {
        match self {
            CredentialBundle::TrustStore { path } => load_truststore(path),
            CredentialBundle::PemPair {
                cert_path,
                key_path,
                embed,
            } => load_pem_pair(cert_path, key_path, *embed),
        }
    }
}

fn load_truststore(path: &Path) -> Result<SigningKey, Error> {
    let pem = read_credential(path)?;

    let key = PKey::private_key_from_pem(&pem)
        .map_err(|e| Error::CredentialParseFailed(format!("{}: {e}", path.display())))?;
    require_rsa(&key)?;

    let certs = X509::stack_from_pem(&pem)
        .map_err(|e| Error::CredentialParseFailed(format!("{}: {e}", path.display())))?;
    let cert = certs.into_iter().next().ok_or_else(|| {
        Error::CredentialParseFailed(format!(
            "{}: trust store contains no certificate",
            path.display()
        ))
    })?;

    let ski = cert.subject_key_id().ok_or_else(|| {
        Error::CredentialParseFailed(format!(
            "{}: certificate has no subject key identifier",
            path.display()
        ))
    })?;

    Ok(SigningKey {
        key,
        key_id: KeyIdentification::KeyName(hex::encode(ski.as_slice())),
    })
}

fn load_pem_pair(cert_path: &Path, key_path: &Path, embed: bool) -> Result<SigningKey, Error> {
    let key_pem = read_credential(key_path)?;
    let key = PKey::private_key_from_pem(&key_pem)
        .map_err(|e| Error::CredentialParseFailed(format!("{}: {e}", key_path.display())))?;
    require_rsa(&key)?;

    let cert_pem = read_credential(cert_path)?;
    let cert = X509::from_pem(&cert_pem)
        .map_err(|e| Error::CredentialParseFailed(format!("{}: {e}", cert_path.display())))?;

    let key_id = if embed {
        KeyIdentification::EmbeddedCertificate {
            subject: subject_dn(&cert)?,
            der: cert
                .to_der()
                .map_err(|e| Error::CredentialParseFailed(e.to_string()))?,
        }
    } else {
        KeyIdentification::PublicKey
    };

    Ok(SigningKey { key, key_id })
}

fn read_credential(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|e| Error::CredentialParseFailed(format!("{}: {e}", path.display())))
}

fn require_rsa(key: &PKey<Private>) -> Result<(), Error> {
    key.rsa()
        .map(|_| ())
        .map_err(|_| Error::CredentialParseFailed("signing key is not an RSA key".to_string()))
}

// RFC 2253 style rendering: RDNs in reverse order, joined with commas.
fn subject_dn(cert: &X509Ref) -> Result<String, Error> {
    let mut parts: Vec<String> = Vec::new();

    for entry in cert.subject_name().entries() {
        let key = entry
            .object()
            .nid()
            .short_name()
            .map_err(|e| Error::CredentialParseFailed(e.to_string()))?;
        let value = entry
            .data()
            .as_utf8()
            .map_err(|e| Error::CredentialParseFailed(e.to_string()))?;
        parts.push(format!("{key}={value}"));
    }

    parts.reverse();

    Ok(parts.join(","))
}
