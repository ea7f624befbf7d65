// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Attributes file not found: {0}")]
    ConfigNotFound(String),
    #[error("Malformed attributes file: {0}")]
    ConfigMalformed(String),
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),
    #[error("Reference event log not found: {0}")]
    ReferenceFileNotFound(String),
    #[error("Hash calculation failed: {0}")]
    HashCalculateFail(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::ConfigNotFound(e)
            | Error::ConfigMalformed(e)
            | Error::MissingRequiredField(e)
            | Error::ReferenceFileNotFound(e)
            | Error::HashCalculateFail(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
