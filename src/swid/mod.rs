// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The swid module provides the SWID tag side of RIM generation: the
//! [`TagConfig`] attribute file loader, the [`SoftwareIdentity`] document
//! model built from it, the [`EventLogMeasurement`] digest binder, and the
//! XML tree / canonicalizer the signer operates on.
//!
//! The document follows the ISO/IEC 19770-2 schema with the TCG RIM and NIST
//! 8060 attribute extensions.  Building is pure and deterministic: the same
//! `TagConfig` always produces the same tree, which is a prerequisite for
//! reproducible signing.

pub use self::attributes::TagConfig;
pub use self::document::SoftwareIdentity;
pub use self::errors::Error;
pub use self::eventlog::EventLogMeasurement;

mod attributes;
mod document;
mod errors;
mod eventlog;
pub mod xml;
