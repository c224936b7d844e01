//! Artifact-level `maven-metadata.xml`: the version listing consumers read
//! to discover what has been published.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use hoist_core::identity::ModuleIdentity;
use hoist_core::version::MavenVersion;
use hoist_util::errors::HoistError;

use crate::xml::XmlWriter;

/// Artifact-level Maven metadata listing available versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MavenMetadata {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Vec<String>,
    pub last_updated: Option<String>,
}

impl MavenMetadata {
    /// Empty metadata for a module that has never been published.
    pub fn for_module(identity: &ModuleIdentity) -> Self {
        Self {
            group_id: Some(identity.group.clone()),
            artifact_id: Some(identity.artifact.clone()),
            ..Default::default()
        }
    }

    /// Add `version` to the listing and recompute `latest` and `release`.
    ///
    /// Versions are kept in Maven order. Recording a version that is already
    /// listed only refreshes `lastUpdated`.
    pub fn record_version(&mut self, version: &str, now: DateTime<Utc>) {
        if !self.versions.iter().any(|v| v == version) {
            self.versions.push(version.to_string());
        }
        let mut parsed: Vec<MavenVersion> =
            self.versions.iter().map(|v| MavenVersion::parse(v)).collect();
        parsed.sort();
        self.versions = parsed.iter().map(|v| v.as_str().to_string()).collect();

        self.latest = parsed.last().map(|v| v.as_str().to_string());
        self.release = parsed
            .iter()
            .rev()
            .find(|v| !v.is_snapshot())
            .map(|v| v.as_str().to_string());
        self.last_updated = Some(now.format("%Y%m%d%H%M%S").to_string());
    }

    pub fn render(&self) -> miette::Result<String> {
        let mut xml = XmlWriter::new()?;
        xml.open("metadata")?;
        xml.optional("groupId", self.group_id.as_deref())?;
        xml.optional("artifactId", self.artifact_id.as_deref())?;
        xml.open("versioning")?;
        xml.optional("latest", self.latest.as_deref())?;
        xml.optional("release", self.release.as_deref())?;
        if !self.versions.is_empty() {
            xml.open("versions")?;
            for v in &self.versions {
                xml.leaf("version", v)?;
            }
            xml.close("versions")?;
        }
        xml.optional("lastUpdated", self.last_updated.as_deref())?;
        xml.close("versioning")?;
        xml.close("metadata")?;
        Ok(xml.finish())
    }
}

/// Parse an artifact-level `maven-metadata.xml` that lists available versions.
pub fn parse_metadata(xml: &str) -> miette::Result<MavenMetadata> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = MavenMetadata::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::End(_)) => {
                match path.join(">").as_str() {
                    "metadata>groupId" => meta.group_id = Some(text_buf.clone()),
                    "metadata>artifactId" => meta.artifact_id = Some(text_buf.clone()),
                    "metadata>versioning>latest" => meta.latest = Some(text_buf.clone()),
                    "metadata>versioning>release" => meta.release = Some(text_buf.clone()),
                    "metadata>versioning>lastUpdated" => {
                        meta.last_updated = Some(text_buf.clone());
                    }
                    "metadata>versioning>versions>version" => {
                        meta.versions.push(text_buf.clone());
                    }
                    _ => {}
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(HoistError::Generic {
                    message: format!("Failed to parse maven-metadata.xml: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(meta)
}
