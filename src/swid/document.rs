// Copyright 2025 Contributors to the Veraison project.
// SPDX-License-Identifier: Apache-2.0

use super::attributes::TagConfig;
use super::errors::Error;
use super::eventlog::EventLogMeasurement;
use super::xml::{self, Element};

const DEFAULT_LANG: &str = "en";
const DEFAULT_VERSION: &str = "0.0";
const TAG_CREATOR_ROLE: &str = "tagCreator";
const UNAVAILABLE_REGID: &str = "invalid.unavailable";

/// The entity role tokens and the associated registration identifier.
/// A `tagCreator` entity must carry an explicitly configured regid; any
/// other role set falls back to the `invalid.unavailable` sentinel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    pub name: String,
    pub regid: String,
    pub thumbprint: Option<String>,
    pub roles: Vec<String>,
}

impl Entity {
    fn from_config(config: &TagConfig) -> Result<Self, Error> {
        let attrs = &config.entity;

        let roles: Vec<String> = attrs
            .role
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect();

        if roles.is_empty() {
            return Err(Error::MissingRequiredField(
                "entity role must not be empty".to_string(),
            ));
        }

        let regid = if roles.iter().any(|r| r == TAG_CREATOR_ROLE) {
            if attrs.regid.is_empty() {
                return Err(Error::MissingRequiredField(
                    "regid is required for the tagCreator role".to_string(),
                ));
            }
            attrs.regid.clone()
        } else if attrs.regid.is_empty() {
            UNAVAILABLE_REGID.to_string()
        } else {
            attrs.regid.clone()
        };

        let thumbprint = match attrs.thumbprint.as_str() {
            "" => None,
            t => Some(t.to_string()),
        };

        Ok(Self {
            name: attrs.name.clone(),
            regid,
            thumbprint,
            roles,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    pub href: Option<String>,
    pub rel: Option<String>,
}

/// An open, ordered mapping of qualified attribute names to non-empty
/// values.  Empty values are never inserted, so serialization is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<(String, String)>,
}

impl AttributeMap {
    fn insert_non_empty(&mut self, name: &str, value: &str) {
        if !value.is_empty() {
            self.entries.push((name.to_string(), value.to_string()));
        }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payload {
    pub attributes: AttributeMap,
    pub directory: DirectoryEntry,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub name: String,
    pub file: FileEntry,
}

/// The event-log reference.  `size` and `sha256` always come from one
/// [`EventLogMeasurement`], never from configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub size: Option<u64>,
    pub sha256: Option<String>,
}

/// The in-memory SWID document tree, mirroring the 19770-2 schema:
/// identity, then entity / link / meta / payload -> directory -> file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SoftwareIdentity {
    pub name: String,
    pub tag_id: String,
    pub tag_version: u32,
    pub version: String,
    pub corpus: bool,
    pub patch: bool,
    pub supplemental: bool,
    pub version_scheme: Option<String>,
    pub entity: Entity,
    pub link: Link,
    pub meta: AttributeMap,
    pub payload: Payload,
}

impl SoftwareIdentity {
    /// Build the document tree from loaded attributes.  Pure and
    /// deterministic: no I/O, identical configs produce identical trees.
    pub fn build(config: &TagConfig) -> Result<Self, Error> {
        let identity = &config.identity;

        let tag_version: u32 = identity.tag_version.parse().map_err(|_| {
            Error::ConfigMalformed(format!(
                "tagVersion is not a non-negative integer: {}",
                identity.tag_version
            ))
        })?;

        // versionScheme only applies to a plain versioned tag; corpus,
        // patch and supplemental reissues do not carry it
        let version_scheme = if !identity.corpus
            && !identity.patch
            && !identity.supplemental
            && identity.version != DEFAULT_VERSION
        {
            Some(identity.version_scheme.clone())
        } else {
            None
        };

        let link = Link {
            href: non_empty(&config.link.href),
            rel: non_empty(&config.link.rel),
        };

        Ok(Self {
            name: identity.name.clone(),
            tag_id: identity.tag_id.clone(),
            tag_version,
            version: identity.version.clone(),
            corpus: identity.corpus,
            patch: identity.patch,
            supplemental: identity.supplemental,
            version_scheme,
            entity: Entity::from_config(config)?,
            link,
            meta: build_meta(config),
            payload: build_payload(config),
        })
    }

    /// Bind the event-log measurement to the payload file node.  Size and
    /// digest are taken from the same file pass, so they stay mutually
    /// consistent.
    pub fn attach_measurement(&mut self, m: &EventLogMeasurement) {
        self.payload.directory.file.size = Some(m.size);
        self.payload.directory.file.sha256 = Some(m.sha256.clone());
    }

    /// Lower the document to its XML tree.
    pub fn to_element(&self) -> Element {
        let mut root = Element::new("SoftwareIdentity");
        root.declare_ns(None, xml::SWID_NS);
        root.declare_ns(Some("SHA256"), xml::SHA256_NS);
        root.declare_ns(Some("n8060"), xml::N8060_NS);
        root.declare_ns(Some("rim"), xml::RIM_NS);

        root.set_attr("xml:lang", DEFAULT_LANG);
        root.set_attr("name", &self.name);
        root.set_attr("tagId", &self.tag_id);
        root.set_attr("tagVersion", &self.tag_version.to_string());
        root.set_attr("version", &self.version);
        if self.corpus {
            root.set_attr("corpus", "true");
        }
        if self.patch {
            root.set_attr("patch", "true");
        }
        if self.supplemental {
            root.set_attr("supplemental", "true");
        }
        if let Some(scheme) = &self.version_scheme {
            root.set_attr("versionScheme", scheme);
        }

        let mut entity = Element::new("Entity");
        entity.set_attr("name", &self.entity.name);
        entity.set_attr("regid", &self.entity.regid);
        // schema type is NMTOKENS: a space-separated list
        entity.set_attr("role", &self.entity.roles.join(" "));
        if let Some(t) = &self.entity.thumbprint {
            entity.set_attr("thumbprint", t);
        }
        root.push_child(entity);

        let mut link = Element::new("Link");
        if let Some(href) = &self.link.href {
            link.set_attr("href", href);
        }
        if let Some(rel) = &self.link.rel {
            link.set_attr("rel", rel);
        }
        root.push_child(link);

        let mut meta = Element::new("Meta");
        for (name, value) in self.meta.entries() {
            meta.set_attr(name, value);
        }
        root.push_child(meta);

        let mut payload = Element::new("Payload");
        for (name, value) in self.payload.attributes.entries() {
            payload.set_attr(name, value);
        }

        let mut directory = Element::new("Directory");
        directory.set_attr("name", &self.payload.directory.name);

        let file_entry = &self.payload.directory.file;
        let mut file = Element::new("File");
        file.set_attr("name", &file_entry.name);
        if let Some(size) = file_entry.size {
            file.set_attr("size", &size.to_string());
        }
        if let Some(sha256) = &file_entry.sha256 {
            file.set_attr("SHA256:hash", sha256);
        }

        directory.push_child(file);
        payload.push_child(directory);
        root.push_child(payload);

        root
    }
}

fn non_empty(v: &str) -> Option<String> {
    if v.is_empty() {
        None
    } else {
        Some(v.to_string())
    }
}

fn build_meta(config: &TagConfig) -> AttributeMap {
    let m = &config.meta;
    let mut attrs = AttributeMap::default();

    attrs.insert_non_empty("colloquialVersion", &m.colloquial_version);
    attrs.insert_non_empty("edition", &m.edition);
    attrs.insert_non_empty("product", &m.product);
    attrs.insert_non_empty("revision", &m.revision);
    attrs.insert_non_empty("rim:PayloadType", &m.payload_type);
    attrs.insert_non_empty("rim:platformManufacturerStr", &m.platform_manufacturer_str);
    attrs.insert_non_empty("rim:platformManufacturerId", &m.platform_manufacturer_id);
    attrs.insert_non_empty("rim:platformModel", &m.platform_model);
    attrs.insert_non_empty("rim:platformVersion", &m.platform_version);
    attrs.insert_non_empty("rim:firmwareManufacturerStr", &m.firmware_manufacturer_str);
    attrs.insert_non_empty("rim:firmwareManufacturerId", &m.firmware_manufacturer_id);
    attrs.insert_non_empty("rim:firmwareModel", &m.firmware_model);
    attrs.insert_non_empty("rim:firmwareVersion", &m.firmware_version);
    attrs.insert_non_empty("rim:bindingSpec", &m.binding_spec);
    attrs.insert_non_empty("rim:bindingSpecVersion", &m.binding_spec_version);
    attrs.insert_non_empty("rim:pcURIlocal", &m.pc_uri_local);
    attrs.insert_non_empty("rim:pcURIGlobal", &m.pc_uri_global);
    attrs.insert_non_empty("rim:rimLinkHash", &m.rim_link_hash);

    attrs
}

fn build_payload(config: &TagConfig) -> Payload {
    let p = &config.payload;
    let mut attrs = AttributeMap::default();

    attrs.insert_non_empty("n8060:envVarPrefix", &p.env_var_prefix);
    attrs.insert_non_empty("n8060:envVarSuffix", &p.env_var_suffix);
    attrs.insert_non_empty("n8060:pathSeparator", &p.path_separator);
    attrs.insert_non_empty("rim:supportRIMFormat", &p.support_rim_format);
    attrs.insert_non_empty("rim:supportRIMType", &p.support_rim_type);
    attrs.insert_non_empty("rim:supportRIMURIGlobal", &p.support_rim_uri_global);

    Payload {
        attributes: attrs,
        directory: DirectoryEntry {
            name: p.directory.name.clone(),
            file: FileEntry {
                name: p.directory.file.name.clone(),
                size: None,
                sha256: None,
            },
        },
    }
}
