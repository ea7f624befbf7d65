// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use clap::Parser;
use rimtag::gateway::{Error, RimGateway};
use rimtag::{sign, swid};
use std::path::Path;

#[derive(Parser)]
enum RimtagCli {
    Generate(GenerateArgs),
    Verify(VerifyArgs),
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Generate a base RIM from the attribute file, bind the SHA-256 \
    digest of the support RIM event log, and sign it")]
struct GenerateArgs {
    /// JSON attribute file with the tag values
    #[arg(short, long, default_value = "rim_fields.json")]
    attributes: String,

    /// PEM trust-store bundle (private key + certificate); wins over a
    /// certificate/key pair
    #[arg(short, long)]
    truststore: Option<String>,

    /// Signing certificate in PEM format
    #[arg(short = 'p', long)]
    certificate: Option<String>,

    /// Signing private key in PEM format
    #[arg(short = 'k', long)]
    private_key: Option<String>,

    /// Embed the signing certificate in the signature block
    #[arg(short, long)]
    embed_cert: bool,

    /// Support RIM event log the tag binds to
    #[arg(short, long)]
    rimel: String,

    /// Output file; the signed tag goes to stdout when omitted
    #[arg(short, long, default_value = "")]
    out: String,
}

#[derive(Debug, clap::Args)]
#[command(author, version, long_about = None,
    about = "Verify a signed base RIM against the trust store")]
struct VerifyArgs {
    #[arg(short, long)]
    file: String,

    #[arg(short, long)]
    truststore: Option<String>,

    #[arg(short, long)]
    rimel: Option<String>,
}

fn main() {
    match RimtagCli::parse() {
        RimtagCli::Generate(args) => match generate(&args) {
            Ok(()) => {
                if !args.out.is_empty() {
                    println!("RIM generation successful: {}", args.out);
                }
            }
            Err(e) => {
                eprintln!("RIM generation failed: {e}");
                std::process::exit(exit_code(&e));
            }
        },

        RimtagCli::Verify(args) => verify(&args),
    }
}

fn generate(args: &GenerateArgs) -> Result<(), Error> {
    let mut gateway = RimGateway::new();

    gateway.set_attributes_file(&args.attributes);
    if let Some(t) = &args.truststore {
        gateway.set_truststore_file(t);
    }
    if let Some(c) = &args.certificate {
        gateway.set_pem_certificate_file(c);
    }
    if let Some(k) = &args.private_key {
        gateway.set_pem_private_key_file(k);
    }
    gateway.set_embedded_cert(args.embed_cert);
    gateway.set_rim_event_log(&args.rimel);

    let output = match args.out.as_str() {
        "" => None,
        path => Some(Path::new(path)),
    };

    gateway.generate(output)
}

fn verify(args: &VerifyArgs) {
    todo!("verify with args: {args:#?}");
}

// one distinct exit code per failure condition, for script consumers
fn exit_code(e: &Error) -> i32 {
    match e {
        Error::Swid(swid::Error::ConfigNotFound(_)) => 2,
        Error::Swid(swid::Error::ConfigMalformed(_)) => 3,
        Error::Swid(swid::Error::MissingRequiredField(_)) => 4,
        Error::Swid(swid::Error::ReferenceFileNotFound(_)) => 5,
        Error::Swid(swid::Error::HashCalculateFail(_)) => 6,
        Error::Sign(sign::Error::CredentialsMissing(_)) => 7,
        Error::Sign(sign::Error::CredentialParseFailed(_)) => 8,
        Error::Sign(sign::Error::SigningFailed(_)) => 9,
        Error::WriteFailed(_) => 10,
    }
}
