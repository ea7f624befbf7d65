// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use openssl::hash::{Hasher, MessageDigest};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const READ_CHUNK: usize = 8192;

/// Byte length and SHA-256 digest of the referenced event log, taken from a
/// single streaming pass so the two can never disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventLogMeasurement {
    pub size: u64,
    /// Hex-encoded SHA-256 digest of the full file content
    pub sha256: String,
}

impl EventLogMeasurement {
    /// Measure the event log at `path`.  A missing or unreadable file is
    /// fatal to the whole pipeline: the tag must not be generated without
    /// the artifact it binds.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let f = File::open(path)
            .map_err(|e| Error::ReferenceFileNotFound(format!("{}: {e}", path.display())))?;

        Self::from_reader(BufReader::new(f))
    }

    /// Measure an already opened event-log stream.
    pub fn from_reader<R: Read>(mut r: R) -> Result<Self, Error> {
        let mut hasher = Hasher::new(MessageDigest::sha256())
            .map_err(|e| Error::HashCalculateFail(e.to_string()))?;

        let mut buf = [0u8; READ_CHUNK];
        let mut size: u64 = 0;

        loop {
            let n = r
                .read(&mut buf)
                .map_err(|e| Error::ReferenceFileNotFound(format!("read failed: {e}")))?;
            if n == 0 {
                break;
            }

            size += n as u64;
            hasher
                .update(&buf[..n])
                .map_err(|e| Error::HashCalculateFail(e.to_string()))?;
        }

        let digest = hasher
            .finish()
            .map_err(|e| Error::HashCalculateFail(e.to_string()))?;

        Ok(Self {
            size,
            sha256: hex::encode(digest),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const TEST_EVENT_LOG: &[u8; 128] = include_bytes!("../../testdata/tpm_event_log.bin");

    const EMPTY_DIGEST: [u8; 32] =
        hex!("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    const ABC_DIGEST: [u8; 32] =
        hex!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    const EVENT_LOG_DIGEST: [u8; 32] =
        hex!("410d117aadfb464b6b3b833f4c810e7e8744247b8b0bf93ba4829efedb5bf39c");

    #[test]
    fn empty_input() {
        let m = EventLogMeasurement::from_reader(&b""[..]).unwrap();

        assert_eq!(m.size, 0);
        assert_eq!(m.sha256, hex::encode(EMPTY_DIGEST));
    }

    #[test]
    fn known_vector() {
        let m = EventLogMeasurement::from_reader(&b"abc"[..]).unwrap();

        assert_eq!(m.size, 3);
        assert_eq!(m.sha256, hex::encode(ABC_DIGEST));
    }

    #[test]
    fn event_log_fixture() {
        let m = EventLogMeasurement::from_reader(TEST_EVENT_LOG.as_slice()).unwrap();

        assert_eq!(m.size, 128);
        assert_eq!(m.sha256, hex::encode(EVENT_LOG_DIGEST));
    }

    #[test]
    fn missing_file() {
        let r = EventLogMeasurement::from_file(Path::new("no/such/eventlog.bin"));

        assert!(matches!(r, Err(Error::ReferenceFileNotFound(_))));
    }

    #[test]
    fn from_file_matches_from_reader() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("eventlog.bin");
        std::fs::write(&p, TEST_EVENT_LOG).unwrap();

        let m = EventLogMeasurement::from_file(&p).unwrap();

        assert_eq!(m.size, 128);
        assert_eq!(m.sha256, hex::encode(EVENT_LOG_DIGEST));
    }
}
