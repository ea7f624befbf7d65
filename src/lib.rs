// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! TCG Reference Integrity Manifest (RIM) generation and signing.
//!
//! This crate builds a base RIM: a SWID tag (ISO/IEC 19770-2) that binds the
//! SHA-256 digest of a platform "golden" event log to identity and provenance
//! metadata, sealed with an enveloped XML digital signature so a verifier can
//! establish authenticity and integrity before trusting the referenced
//! measurements.
//!
//! The API allows:
//! * Loading the tag attributes from a JSON attribute file
//! * Building the SWID document tree and binding the event-log digest to it
//! * Signing the document with credentials from a PEM trust-store bundle or
//!   a certificate + private-key pair
//! * Writing the signed tag to a file or to standard output

pub mod gateway;
pub mod sign;
pub mod swid;
