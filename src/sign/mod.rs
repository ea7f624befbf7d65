// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

//! The sign module resolves signing credentials and produces the enveloped
//! XML digital signature over the SWID document.
//!
//! Credentials come from exactly one of two sources per run: a PEM
//! trust-store bundle (private key plus certificate), or a separate
//! certificate + private-key PEM pair.  The [`CredentialBundle`] records the
//! choice; key material is only parsed inside the signer, its single
//! consumer.

pub use self::credentials::CredentialBundle;
pub use self::credentials::KeyIdentification;
pub use self::credentials::SigningKey;
pub use self::errors::Error;
pub use self::xmldsig::sign_document;

mod credentials;
mod errors;
mod xmldsig;

#[cfg(test)]
pub(crate) mod testutil {
    use openssl::asn1::Asn1Time;
    use openssl::bn::BigNum;
    use openssl::hash::MessageDigest;
    use openssl::pkey::{PKey, Private};
    use openssl::rsa::Rsa;
    use openssl::x509::extension::SubjectKeyIdentifier;
    use openssl::x509::{X509, X509NameBuilder};

    pub fn rsa_signing_key() -> PKey<Private> {
        let rsa = Rsa::generate(2048).unwrap();
        PKey::from_rsa(rsa).unwrap()
    }

    pub fn self_signed_cert(key: &PKey<Private>, with_ski: bool) -> X509 {
        let mut name = X509NameBuilder::new().unwrap();
        name.append_entry_by_text("CN", "RIM Test Signer").unwrap();
        name.append_entry_by_text("O", "Example Inc").unwrap();
        let name = name.build();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(&name).unwrap();
        builder.set_issuer_name(&name).unwrap();
        builder.set_pubkey(key).unwrap();
        builder
            .set_not_before(&Asn1Time::days_from_now(0).unwrap())
            .unwrap();
        builder
            .set_not_after(&Asn1Time::days_from_now(365).unwrap())
            .unwrap();
        if with_ski {
            let ski = SubjectKeyIdentifier::new()
                .build(&builder.x509v3_context(None, None))
                .unwrap();
            builder.append_extension(ski).unwrap();
        }
        builder.sign(key, MessageDigest::sha256()).unwrap();

        builder.build()
    }
}
