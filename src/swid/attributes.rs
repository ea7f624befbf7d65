// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::errors::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

fn default_tag_version() -> String {
    "0".to_string()
}

fn default_version() -> String {
    "0.0".to_string()
}

fn default_version_scheme() -> String {
    "multipartnumeric".to_string()
}

/// The `SoftwareIdentity` section of the attribute file.
#[derive(Clone, Deserialize, Debug)]
#[serde(default)]
pub struct IdentityAttributes {
    pub name: String,

    #[serde(rename(deserialize = "tagId"))]
    pub tag_id: String,

    #[serde(rename(deserialize = "tagVersion"))]
    pub tag_version: String,

    pub version: String,

    pub corpus: bool,
    pub patch: bool,
    pub supplemental: bool,

    #[serde(rename(deserialize = "versionScheme"))]
    pub version_scheme: String,
}

impl Default for IdentityAttributes {
    fn default() -> Self {
        Self {
            name: String::new(),
            tag_id: String::new(),
            tag_version: default_tag_version(),
            version: default_version(),
            corpus: false,
            patch: false,
            supplemental: false,
            version_scheme: default_version_scheme(),
        }
    }
}

/// The `Entity` section of the attribute file.  `role` holds a
/// comma-separated list of role tokens, e.g. "softwareCreator,tagCreator".
#[derive(Clone, Default, Deserialize, Debug)]
#[serde(default)]
pub struct EntityAttributes {
    pub name: String,
    pub role: String,
    pub regid: String,
    pub thumbprint: String,
}

/// The `Link` section of the attribute file.
#[derive(Clone, Default, Deserialize, Debug)]
#[serde(default)]
pub struct LinkAttributes {
    pub href: String,
    pub rel: String,
}

/// The `Meta` section of the attribute file: the TCG PC Client RIM
/// platform/firmware provenance attributes.
#[derive(Clone, Default, Deserialize, Debug)]
#[serde(default)]
pub struct MetaAttributes {
    #[serde(rename(deserialize = "colloquialVersion"))]
    pub colloquial_version: String,

    pub edition: String,
    pub product: String,
    pub revision: String,

    #[serde(rename(deserialize = "PayloadType"))]
    pub payload_type: String,

    #[serde(rename(deserialize = "platformManufacturerStr"))]
    pub platform_manufacturer_str: String,

    #[serde(rename(deserialize = "platformManufacturerId"))]
    pub platform_manufacturer_id: String,

    #[serde(rename(deserialize = "platformModel"))]
    pub platform_model: String,

    #[serde(rename(deserialize = "platformVersion"))]
    pub platform_version: String,

    #[serde(rename(deserialize = "firmwareManufacturerStr"))]
    pub firmware_manufacturer_str: String,

    #[serde(rename(deserialize = "firmwareManufacturerId"))]
    pub firmware_manufacturer_id: String,

    #[serde(rename(deserialize = "firmwareModel"))]
    pub firmware_model: String,

    #[serde(rename(deserialize = "firmwareVersion"))]
    pub firmware_version: String,

    #[serde(rename(deserialize = "bindingSpec"))]
    pub binding_spec: String,

    #[serde(rename(deserialize = "bindingSpecVersion"))]
    pub binding_spec_version: String,

    #[serde(rename(deserialize = "pcURIlocal"))]
    pub pc_uri_local: String,

    #[serde(rename(deserialize = "pcURIGlobal"))]
    pub pc_uri_global: String,

    #[serde(rename(deserialize = "rimLinkHash"))]
    pub rim_link_hash: String,
}

/// The `Payload` section of the attribute file, including the nested
/// `Directory` and `File` names.  File size and digest are never read from
/// here; they are computed from the event log.
#[derive(Clone, Default, Deserialize, Debug)]
#[serde(default)]
pub struct PayloadAttributes {
    #[serde(rename(deserialize = "envVarPrefix"))]
    pub env_var_prefix: String,

    #[serde(rename(deserialize = "envVarSuffix"))]
    pub env_var_suffix: String,

    #[serde(rename(deserialize = "pathSeparator"))]
    pub path_separator: String,

    #[serde(rename(deserialize = "supportRIMFormat"))]
    pub support_rim_format: String,

    #[serde(rename(deserialize = "supportRIMType"))]
    pub support_rim_type: String,

    #[serde(rename(deserialize = "supportRIMURIGlobal"))]
    pub support_rim_uri_global: String,

    #[serde(rename(deserialize = "Directory"))]
    pub directory: DirectoryAttributes,
}

#[derive(Clone, Default, Deserialize, Debug)]
#[serde(default)]
pub struct DirectoryAttributes {
    pub name: String,

    #[serde(rename(deserialize = "File"))]
    pub file: FileAttributes,
}

#[derive(Clone, Default, Deserialize, Debug)]
#[serde(default)]
pub struct FileAttributes {
    pub name: String,
}

/// The loaded, validated attribute file.  Immutable once loaded; absent
/// optional fields resolve to their documented defaults.
#[derive(Clone, Default, Deserialize, Debug)]
#[serde(default)]
pub struct TagConfig {
    #[serde(rename(deserialize = "SoftwareIdentity"))]
    pub identity: IdentityAttributes,

    #[serde(rename(deserialize = "Entity"))]
    pub entity: EntityAttributes,

    #[serde(rename(deserialize = "Link"))]
    pub link: LinkAttributes,

    #[serde(rename(deserialize = "Meta"))]
    pub meta: MetaAttributes,

    #[serde(rename(deserialize = "Payload"))]
    pub payload: PayloadAttributes,
}

impl TagConfig {
    /// Parse tag attributes from a JSON string.
    pub fn parse(j: &str) -> Result<Self, Error> {
        serde_json::from_str(j).map_err(|e| Error::ConfigMalformed(e.to_string()))
    }

    /// Load tag attributes from the JSON attribute file at `path`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let j = fs::read_to_string(path)
            .map_err(|e| Error::ConfigNotFound(format!("{}: {e}", path.display())))?;

        Self::parse(&j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_RIM_FIELDS_OK: &str = include_str!("../../testdata/rim_fields.json");

    #[test]
    fn parse_full_attribute_file() {
        let cfg = TagConfig::parse(TEST_RIM_FIELDS_OK).expect("parsing rim_fields.json");

        assert_eq!(cfg.identity.name, "Example.com BIOS");
        assert_eq!(cfg.identity.tag_version, "0");
        assert_eq!(cfg.identity.version, "01");
        assert!(!cfg.identity.corpus);

        assert_eq!(cfg.entity.role, "softwareCreator,tagCreator");
        assert_eq!(cfg.entity.regid, "http://Example.com");

        assert_eq!(cfg.link.rel, "installationmedia");

        assert_eq!(cfg.meta.binding_spec, "PC Client RIM");
        assert_eq!(cfg.meta.payload_type, "direct");
        // absent in the fixture, resolves to empty
        assert_eq!(cfg.meta.pc_uri_global, "");

        assert_eq!(cfg.payload.support_rim_type, "supportRIM");
        assert_eq!(cfg.payload.directory.name, "rim");
        assert_eq!(cfg.payload.directory.file.name, "Example.com.BIOS.01.rimel");
    }

    #[test]
    fn parse_empty_object_applies_defaults() {
        let cfg = TagConfig::parse("{}").expect("parsing empty attribute object");

        assert_eq!(cfg.identity.tag_version, "0");
        assert_eq!(cfg.identity.version, "0.0");
        assert_eq!(cfg.identity.version_scheme, "multipartnumeric");
        assert!(!cfg.identity.patch);
        assert_eq!(cfg.entity.regid, "");
        assert_eq!(cfg.payload.directory.file.name, "");
    }

    #[test]
    fn parse_malformed_json() {
        let r = TagConfig::parse("{ \"SoftwareIdentity\": ");

        assert!(matches!(r, Err(Error::ConfigMalformed(_))));
    }

    #[test]
    fn parse_wrong_shape() {
        let r = TagConfig::parse(r#"{ "SoftwareIdentity": [ "not", "an", "object" ] }"#);

        assert!(matches!(r, Err(Error::ConfigMalformed(_))));
    }

    #[test]
    fn load_missing_file() {
        let r = TagConfig::load(Path::new("no/such/rim_fields.json"));

        assert!(matches!(r, Err(Error::ConfigNotFound(_))));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("rim_fields.json");
        std::fs::write(&p, TEST_RIM_FIELDS_OK).unwrap();

        let cfg = TagConfig::load(&p).expect("loading attribute file from disk");

        assert_eq!(cfg.identity.tag_id, "94f6b457-9ac9-4d35-9b3f-78804173b65a");
    }
}
