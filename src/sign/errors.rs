// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

#[derive(thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("No signing credentials: {0}")]
    CredentialsMissing(String),
    #[error("Credential parse failed: {0}")]
    CredentialParseFailed(String),
    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::CredentialsMissing(e)
            | Error::CredentialParseFailed(e)
            | Error::SigningFailed(e) => {
                write!(f, "{}", e)
            }
        }
    }
}
