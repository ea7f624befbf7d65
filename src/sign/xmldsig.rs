// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::credentials::{CredentialBundle, KeyIdentification, SigningKey};
use super::errors::Error;
use crate::swid::xml::{self, Element};
use base64::{engine::general_purpose, Engine as _};
use openssl::error::ErrorStack;
use openssl::hash::{hash, MessageDigest};
use openssl::sign::Signer;

const C14N_METHOD: &str = "http://www.w3.org/TR/2001/REC-xml-c14n-20010315";
const SIGNATURE_METHOD_RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
const DIGEST_METHOD_SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
const TRANSFORM_ENVELOPED: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

/// Sign the document with an enveloped XML digital signature and attach the
/// `Signature` element as the last child of the root.
///
/// Fixed algorithm suite: inclusive canonicalization, SHA-256 digest,
/// RSA-SHA256 signature, one empty-URI reference with the
/// enveloped-signature transform.  The key-identification block follows the
/// resolved credential mode.
///
/// The digest is computed over the document exactly as it will be written
/// once the signature element is removed again: indentation is materialized
/// first, and the whitespace that will surround the signature is part of
/// the digest input.  A verifier that parses the emitted file, drops the
/// signature element and re-canonicalizes reproduces the digest
/// byte-for-byte.
pub fn sign_document(root: &mut Element, credentials: &CredentialBundle) -> Result<(), Error> {
    let signing_key = credentials.load()?;

    xml::indent(root);
    open_signature_slot(root);

    let doc_digest = hash(MessageDigest::sha256(), &xml::canonicalize(root, &[]))
        .map_err(signing_failed)?;
    let signed_info = build_signed_info(&general_purpose::STANDARD.encode(doc_digest));

    let signed_info_c14n = xml::canonicalize(&signed_info, &signature_context(root));

    let mut signer =
        Signer::new(MessageDigest::sha256(), &signing_key.key).map_err(signing_failed)?;
    signer.update(&signed_info_c14n).map_err(signing_failed)?;
    let signature_value = signer.sign_to_vec().map_err(signing_failed)?;

    let key_info = build_key_info(&signing_key)?;

    let mut signature = Element::new("Signature");
    signature.declare_ns(None, xml::XMLDSIG_NS);
    signature.push_child(signed_info);
    let mut sv = Element::new("SignatureValue");
    sv.push_text(&general_purpose::STANDARD.encode(signature_value));
    signature.push_child(sv);
    signature.push_child(key_info);

    fill_signature_slot(root, signature);

    Ok(())
}

/// Namespace declarations in scope on `SignedInfo`: everything declared on
/// the document root, with the default namespace overridden by the
/// signature's own declaration.
pub(crate) fn signature_context(root: &Element) -> Vec<(Option<String>, String)> {
    let mut ns = root.ns_decls.clone();
    ns.push((None, xml::XMLDSIG_NS.to_string()));
    ns
}

pub(crate) fn build_signed_info(digest_b64: &str) -> Element {
    let mut c14n_method = Element::new("CanonicalizationMethod");
    c14n_method.set_attr("Algorithm", C14N_METHOD);

    let mut sig_method = Element::new("SignatureMethod");
    sig_method.set_attr("Algorithm", SIGNATURE_METHOD_RSA_SHA256);

    let mut transform = Element::new("Transform");
    transform.set_attr("Algorithm", TRANSFORM_ENVELOPED);
    let mut transforms = Element::new("Transforms");
    transforms.push_child(transform);

    let mut digest_method = Element::new("DigestMethod");
    digest_method.set_attr("Algorithm", DIGEST_METHOD_SHA256);

    let mut digest_value = Element::new("DigestValue");
    digest_value.push_text(digest_b64);

    // the reference targets the enveloping document itself
    let mut reference = Element::new("Reference");
    reference.set_attr("URI", "");
    reference.push_child(transforms);
    reference.push_child(digest_method);
    reference.push_child(digest_value);

    let mut signed_info = Element::new("SignedInfo");
    signed_info.push_child(c14n_method);
    signed_info.push_child(sig_method);
    signed_info.push_child(reference);

    signed_info
}

fn build_key_info(signing_key: &SigningKey) -> Result<Element, Error> {
    let mut key_info = Element::new("KeyInfo");

    match &signing_key.key_id {
        KeyIdentification::KeyName(name) => {
            let mut key_name = Element::new("KeyName");
            key_name.push_text(name);
            key_info.push_child(key_name);
        }
        KeyIdentification::EmbeddedCertificate { subject, der } => {
            let mut subject_name = Element::new("X509SubjectName");
            subject_name.push_text(subject);

            let mut certificate = Element::new("X509Certificate");
            certificate.push_text(&general_purpose::STANDARD.encode(der));

            let mut x509_data = Element::new("X509Data");
            x509_data.push_child(subject_name);
            x509_data.push_child(certificate);
            key_info.push_child(x509_data);
        }
        KeyIdentification::PublicKey => {
            let rsa = signing_key.key.rsa().map_err(signing_failed)?;

            let mut modulus = Element::new("Modulus");
            modulus.push_text(&general_purpose::STANDARD.encode(rsa.n().to_vec()));

            let mut exponent = Element::new("Exponent");
            exponent.push_text(&general_purpose::STANDARD.encode(rsa.e().to_vec()));

            let mut rsa_key_value = Element::new("RSAKeyValue");
            rsa_key_value.push_child(modulus);
            rsa_key_value.push_child(exponent);

            let mut key_value = Element::new("KeyValue");
            key_value.push_child(rsa_key_value);
            key_info.push_child(key_value);
        }
    }

    Ok(key_info)
}

// The enveloped transform removes only the signature element; the
// whitespace that will surround it stays in the digest input.
fn open_signature_slot(root: &mut Element) {
    root.children.pop();
    root.push_text("\n  ");
    root.push_text("\n");
}

fn fill_signature_slot(root: &mut Element, signature: Element) {
    root.children.pop();
    root.push_child(signature);
    root.push_text("\n");
}

fn signing_failed(e: ErrorStack) -> Error {
    Error::SigningFailed(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::super::testutil::{rsa_signing_key, self_signed_cert};
    use super::*;
    use crate::swid::{SoftwareIdentity, TagConfig};
    use openssl::sign::Verifier;
    use std::path::Path;

    const TEST_RIM_FIELDS_OK: &str = include_str!("../../testdata/rim_fields.json");

    fn document_root() -> Element {
        let cfg = TagConfig::parse(TEST_RIM_FIELDS_OK).unwrap();
        let mut doc = SoftwareIdentity::build(&cfg).unwrap();
        doc.attach_measurement(&crate::swid::EventLogMeasurement {
            size: 128,
            sha256: "00ff".to_string(),
        });
        doc.to_element()
    }

    fn pem_pair_on_disk(dir: &Path, embed: bool) -> (CredentialBundle, openssl::x509::X509) {
        let key = rsa_signing_key();
        let cert = self_signed_cert(&key, true);

        let key_path = dir.join("key.pem");
        let cert_path = dir.join("cert.pem");
        std::fs::write(&key_path, key.private_key_to_pem_pkcs8().unwrap()).unwrap();
        std::fs::write(&cert_path, cert.to_pem().unwrap()).unwrap();

        let bundle =
            CredentialBundle::resolve(None, Some(&cert_path), Some(&key_path), embed).unwrap();
        (bundle, cert)
    }

    #[test]
    fn signature_verifies_with_public_key() {
        let dir = tempfile::tempdir().unwrap();
        let (bundle, cert) = pem_pair_on_disk(dir.path(), false);

        let mut root = document_root();
        sign_document(&mut root, &bundle).expect("signing SWID document");

        let signature = root.find("Signature").unwrap();
        let signed_info = signature.find("SignedInfo").unwrap();
        let signature_value = signature.find("SignatureValue").unwrap().text();
        let sig = general_purpose::STANDARD
            .decode(signature_value)
            .expect("decoding SignatureValue");

        let signed_info_c14n = xml::canonicalize(signed_info, &signature_context(&root));

        let public_key = cert.public_key().unwrap();
        let mut verifier = Verifier::new(MessageDigest::sha256(), &public_key).unwrap();
        verifier.update(&signed_info_c14n).unwrap();

        assert!(verifier.verify(&sig).unwrap());
    }

    #[test]
    fn digest_matches_enveloped_document() {
        let dir = tempfile::tempdir().unwrap();
        let (bundle, _) = pem_pair_on_disk(dir.path(), false);

        let mut root = document_root();
        sign_document(&mut root, &bundle).unwrap();

        let embedded = root.find("DigestValue").unwrap().text();

        // rebuild the digest input: the signed tree with the signature
        // element removed, surrounding whitespace kept
        let mut enveloped = root.clone();
        enveloped
            .children
            .retain(|c| !matches!(c, xml::Node::Element(e) if e.name == "Signature"));
        let recomputed = hash(
            MessageDigest::sha256(),
            &xml::canonicalize(&enveloped, &[]),
        )
        .unwrap();

        assert_eq!(embedded, general_purpose::STANDARD.encode(recomputed));
    }

    #[test]
    fn tampering_breaks_the_digest() {
        let dir = tempfile::tempdir().unwrap();
        let (bundle, _) = pem_pair_on_disk(dir.path(), false);

        let mut root = document_root();
        sign_document(&mut root, &bundle).unwrap();

        let embedded = root.find("DigestValue").unwrap().text();

        let mut tampered = root.clone();
        tampered.attrs.retain(|(n, _)| n != "version");
        tampered.set_attr("version", "02");
        tampered
            .children
            .retain(|c| !matches!(c, xml::Node::Element(e) if e.name == "Signature"));
        let recomputed = hash(
            MessageDigest::sha256(),
            &xml::canonicalize(&tampered, &[]),
        )
        .unwrap();

        assert_ne!(embedded, general_purpose::STANDARD.encode(recomputed));
    }

    #[test]
    fn signing_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let (bundle, _) = pem_pair_on_disk(dir.path(), false);

        let mut first = document_root();
        sign_document(&mut first, &bundle).unwrap();
        let mut second = document_root();
        sign_document(&mut second, &bundle).unwrap();

        // RSASSA-PKCS1-v1_5 is deterministic, so the whole artifact is
        assert_eq!(xml::serialize(&first), xml::serialize(&second));
    }

    #[test]
    fn bare_key_mode_emits_rsa_key_value() {
        let dir = tempfile::tempdir().unwrap();
        let (bundle, cert) = pem_pair_on_disk(dir.path(), false);

        let mut root = document_root();
        sign_document(&mut root, &bundle).unwrap();

        let key_info = root.find("KeyInfo").unwrap();
        assert!(key_info.find("X509Data").is_none());
        assert!(key_info.find("KeyName").is_none());

        let modulus = key_info.find("Modulus").unwrap().text();
        let rsa = cert.public_key().unwrap().rsa().unwrap();
        assert_eq!(modulus, general_purpose::STANDARD.encode(rsa.n().to_vec()));
        let exponent = key_info.find("Exponent").unwrap().text();
        assert_eq!(exponent, general_purpose::STANDARD.encode(rsa.e().to_vec()));
    }

    #[test]
    fn embedded_mode_carries_subject_and_certificate() {
        let dir = tempfile::tempdir().unwrap();
        let (bundle, cert) = pem_pair_on_disk(dir.path(), true);

        let mut root = document_root();
        sign_document(&mut root, &bundle).unwrap();

        let key_info = root.find("KeyInfo").unwrap();
        assert!(key_info.find("KeyValue").is_none());

        let subject = key_info.find("X509SubjectName").unwrap().text();
        assert_eq!(subject, "O=Example Inc,CN=RIM Test Signer");

        let embedded = key_info.find("X509Certificate").unwrap().text();
        assert_eq!(
            embedded,
            general_purpose::STANDARD.encode(cert.to_der().unwrap())
        );
    }

    #[test]
    fn truststore_mode_emits_key_name() {
        let dir = tempfile::tempdir().unwrap();
        let key = rsa_signing_key();
        let cert = self_signed_cert(&key, true);

        let mut pem = key.private_key_to_pem_pkcs8().unwrap();
        pem.extend_from_slice(&cert.to_pem().unwrap());
        let store_path = dir.path().join("keystore.pem");
        std::fs::write(&store_path, pem).unwrap();

        let bundle = CredentialBundle::resolve(Some(&store_path), None, None, false).unwrap();

        let mut root = document_root();
        sign_document(&mut root, &bundle).unwrap();

        let key_name = root.find("KeyName").unwrap().text();
        assert_eq!(
            key_name,
            hex::encode(cert.subject_key_id().unwrap().as_slice())
        );
    }

    #[test]
    fn signed_info_declares_fixed_algorithms() {
        let dir = tempfile::tempdir().unwrap();
        let (bundle, _) = pem_pair_on_disk(dir.path(), false);

        let mut root = document_root();
        sign_document(&mut root, &bundle).unwrap();

        let signed_info = root.find("SignedInfo").unwrap();
        assert_eq!(
            signed_info.find("CanonicalizationMethod").unwrap().attr("Algorithm"),
            Some(C14N_METHOD)
        );
        assert_eq!(
            signed_info.find("SignatureMethod").unwrap().attr("Algorithm"),
            Some(SIGNATURE_METHOD_RSA_SHA256)
        );
        let reference = signed_info.find("Reference").unwrap();
        assert_eq!(reference.attr("URI"), Some(""));
        assert_eq!(
            reference.find("Transform").unwrap().attr("Algorithm"),
            Some(TRANSFORM_ENVELOPED)
        );
        assert_eq!(
            reference.find("DigestMethod").unwrap().attr("Algorithm"),
            Some(DIGEST_METHOD_SHA256)
        );
    }
}
