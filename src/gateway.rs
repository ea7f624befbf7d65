// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The gateway runs the whole generation pipeline for one invocation: load
//! attributes, build the document, bind the event-log digest, resolve
//! credentials, sign, write.  Each stage fails fast; a failed run never
//! leaves an unsigned or partially built artifact behind.
//!
//! ```no_run
//! use rimtag::gateway::RimGateway;
//!
//! let mut gateway = RimGateway::new();
//! gateway
//!     .set_attributes_file("rim_fields.json")
//!     .set_pem_certificate_file("signer.cert.pem")
//!     .set_pem_private_key_file("signer.key.pem")
//!     .set_rim_event_log("TpmLog.bin");
//!
//! // no output path: the signed tag goes to stdout
//! gateway.generate(None).expect("generating base RIM");
//! ```

use crate::sign::{self, CredentialBundle};
use crate::swid::{self, xml, EventLogMeasurement, SoftwareIdentity, TagConfig};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const DEFAULT_ATTRIBUTES_FILE: &str = "rim_fields.json";

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Swid(#[from] swid::Error),
    #[error(transparent)]
    Sign(#[from] sign::Error),
    #[error("Unable to write signed tag: {0}")]
    WriteFailed(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Swid(e) => write!(f, "{e:?}"),
            Error::Sign(e) => write!(f, "{e:?}"),
            Error::WriteFailed(e) => write!(f, "{}", e),
        }
    }
}

/// Per-run generation state: one setter per input, one entry point.
/// Nothing is shared across invocations.
pub struct RimGateway {
    attributes_file: PathBuf,
    truststore_file: Option<PathBuf>,
    pem_certificate_file: Option<PathBuf>,
    pem_private_key_file: Option<PathBuf>,
    embedded_cert: bool,
    rim_event_log: PathBuf,
}

impl Default for RimGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl RimGateway {
    pub fn new() -> Self {
        Self {
            attributes_file: PathBuf::from(DEFAULT_ATTRIBUTES_FILE),
            truststore_file: None,
            pem_certificate_file: None,
            pem_private_key_file: None,
            embedded_cert: false,
            rim_event_log: PathBuf::new(),
        }
    }

    /// Path of the JSON attribute file.
    pub fn set_attributes_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.attributes_file = path.into();
        self
    }

    /// Path of a PEM trust-store bundle (private key plus certificate).
    /// Takes precedence over a PEM pair.
    pub fn set_truststore_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.truststore_file = Some(path.into());
        self
    }

    /// Path of the signing certificate in PEM format.
    pub fn set_pem_certificate_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.pem_certificate_file = Some(path.into());
        self
    }

    /// Path of the signing private key in PEM format.
    pub fn set_pem_private_key_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.pem_private_key_file = Some(path.into());
        self
    }

    /// Carry the full certificate inside the signature's KeyInfo block
    /// (PEM pair mode only).
    pub fn set_embedded_cert(&mut self, embedded: bool) -> &mut Self {
        self.embedded_cert = embedded;
        self
    }

    /// Path of the support RIM event log the tag binds to.
    pub fn set_rim_event_log(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.rim_event_log = path.into();
        self
    }

    /// Run the full pipeline and write the signed tag to `output`, or to
    /// standard output when no path is given.
    pub fn generate(&self, output: Option<&Path>) -> Result<(), Error> {
        let config = TagConfig::load(&self.attributes_file)?;

        let mut document = SoftwareIdentity::build(&config)?;

        let measurement = EventLogMeasurement::from_file(&self.rim_event_log)?;
        document.attach_measurement(&measurement);

        let credentials = CredentialBundle::resolve(
            self.truststore_file.as_deref(),
            self.pem_certificate_file.as_deref(),
            self.pem_private_key_file.as_deref(),
            self.embedded_cert,
        )?;

        let mut root = document.to_element();
        sign::sign_document(&mut root, &credentials)?;

        let serialized = xml::serialize(&root);

        match output {
            Some(path) => fs::write(path, serialized)
                .map_err(|e| Error::WriteFailed(format!("{}: {e}", path.display()))),
            None => std::io::stdout()
                .write_all(serialized.as_bytes())
                .map_err(|e| Error::WriteFailed(e.to_string())),
        }
    }
}
