//! POM rendering for published descriptors, and parsing back into a
//! [`DescriptorConfig`].

use std::collections::{BTreeMap, HashMap};

use quick_xml::events::Event;
use quick_xml::Reader;

use hoist_core::dependency::{DependencyScope, DependencySpec, DetailedDependency};
use hoist_core::descriptor::{
    Developer, DescriptorConfig, IssueManagement, License, MailingList, ModuleConfig,
    Organization, PackageDescriptor, ParentRef, Scm,
};
use hoist_util::errors::HoistError;

use crate::xml::XmlWriter;

const MODEL_VERSION: &str = "4.0.0";
const POM_NAMESPACE: &str = "http://maven.apache.org/POM/4.0.0";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd";

/// Render `descriptor` as a Maven POM.
///
/// Sections with nothing in them are left out entirely.
pub fn render_pom(descriptor: &PackageDescriptor) -> miette::Result<String> {
    let mut xml = XmlWriter::new()?;
    xml.open_with(
        "project",
        &[
            ("xmlns", POM_NAMESPACE),
            ("xmlns:xsi", XSI_NAMESPACE),
            ("xsi:schemaLocation", SCHEMA_LOCATION),
        ],
    )?;
    xml.leaf("modelVersion", MODEL_VERSION)?;

    if let Some(parent) = &descriptor.parent {
        xml.open("parent")?;
        xml.leaf("groupId", &parent.group)?;
        xml.leaf("artifactId", &parent.artifact)?;
        xml.leaf("version", &parent.version)?;
        xml.optional("relativePath", parent.relative_path.as_deref())?;
        xml.close("parent")?;
    }

    let id = &descriptor.identity;
    xml.leaf("groupId", &id.group)?;
    xml.leaf("artifactId", &id.artifact)?;
    xml.leaf("version", &id.version)?;
    xml.leaf("packaging", &descriptor.packaging)?;
    xml.leaf("name", &descriptor.name)?;
    xml.optional("description", descriptor.description.as_deref())?;
    xml.optional("url", descriptor.url.as_deref())?;
    xml.optional("inceptionYear", descriptor.inception_year.as_deref())?;

    if let Some(org) = &descriptor.organization {
        xml.open("organization")?;
        xml.optional("name", org.name.as_deref())?;
        xml.optional("url", org.url.as_deref())?;
        xml.close("organization")?;
    }

    if !descriptor.licenses.is_empty() {
        xml.open("licenses")?;
        for license in &descriptor.licenses {
            xml.open("license")?;
            xml.leaf("name", &license.name)?;
            xml.optional("url", license.url.as_deref())?;
            xml.optional("distribution", license.distribution.as_deref())?;
            xml.optional("comments", license.comments.as_deref())?;
            xml.close("license")?;
        }
        xml.close("licenses")?;
    }

    if !descriptor.developers.is_empty() {
        xml.open("developers")?;
        for dev in &descriptor.developers {
            xml.open("developer")?;
            xml.optional("id", dev.id.as_deref())?;
            xml.optional("name", dev.name.as_deref())?;
            xml.optional("email", dev.email.as_deref())?;
            xml.optional("url", dev.url.as_deref())?;
            xml.optional("organization", dev.organization.as_deref())?;
            xml.optional("organizationUrl", dev.organization_url.as_deref())?;
            if !dev.roles.is_empty() {
                xml.open("roles")?;
                for role in &dev.roles {
                    xml.leaf("role", role)?;
                }
                xml.close("roles")?;
            }
            xml.close("developer")?;
        }
        xml.close("developers")?;
    }

    if !descriptor.mailing_lists.is_empty() {
        xml.open("mailingLists")?;
        for list in &descriptor.mailing_lists {
            xml.open("mailingList")?;
            xml.optional("name", list.name.as_deref())?;
            xml.optional("subscribe", list.subscribe.as_deref())?;
            xml.optional("unsubscribe", list.unsubscribe.as_deref())?;
            xml.optional("post", list.post.as_deref())?;
            xml.optional("archive", list.archive.as_deref())?;
            xml.close("mailingList")?;
        }
        xml.close("mailingLists")?;
    }

    if let Some(scm) = &descriptor.scm {
        xml.open("scm")?;
        xml.optional("connection", scm.connection.as_deref())?;
        xml.optional("developerConnection", scm.developer_connection.as_deref())?;
        xml.optional("url", scm.url.as_deref())?;
        xml.optional("tag", scm.tag.as_deref())?;
        xml.close("scm")?;
    }

    if let Some(issues) = &descriptor.issue_management {
        xml.open("issueManagement")?;
        xml.optional("system", issues.system.as_deref())?;
        xml.optional("url", issues.url.as_deref())?;
        xml.close("issueManagement")?;
    }

    if !descriptor.dependencies.is_empty() {
        xml.open("dependencies")?;
        for dep in &descriptor.dependencies {
            xml.open("dependency")?;
            xml.leaf("groupId", &dep.group)?;
            xml.leaf("artifactId", &dep.artifact)?;
            xml.leaf("version", &dep.version)?;
            xml.leaf("scope", dep.scope.published().as_str())?;
            xml.close("dependency")?;
        }
        xml.close("dependencies")?;
    }

    xml.close("project")?;
    Ok(xml.finish())
}

/// A parsed POM, limited to the elements a published descriptor carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pom {
    pub model_version: Option<String>,
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub inception_year: Option<String>,

    pub parent: Option<ParentRef>,
    pub organization: Option<Organization>,
    pub licenses: Vec<License>,
    pub developers: Vec<Developer>,
    pub mailing_lists: Vec<MailingList>,
    pub scm: Option<Scm>,
    pub issue_management: Option<IssueManagement>,
    pub dependencies: Vec<PomDependency>,
}

/// A `<dependency>` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub scope: Option<String>,
}

impl Pom {
    /// Effective group ID (falls back to parent).
    pub fn effective_group_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.group.as_str()))
    }

    /// Effective version (falls back to parent).
    pub fn effective_version(&self) -> Option<&str> {
        self.version
            .as_deref()
            .or(self.parent.as_ref().map(|p| p.version.as_str()))
    }

    /// Reconstruct the configuration that describes this POM.
    ///
    /// Dependencies are keyed by artifact id, or `group:artifact` when two
    /// share an artifact id. A missing scope means `compile`; dependencies
    /// in scopes a published descriptor never uses (`test`, `provided`,
    /// `system`, `import`) are skipped.
    pub fn to_config(&self) -> DescriptorConfig {
        let mut artifact_counts: HashMap<&str, usize> = HashMap::new();
        for dep in &self.dependencies {
            *artifact_counts.entry(dep.artifact_id.as_str()).or_default() += 1;
        }

        let mut dependencies = BTreeMap::new();
        for dep in &self.dependencies {
            let scope = match dep.scope.as_deref().map(str::trim) {
                None | Some("") => DependencyScope::Compile,
                Some(s) => match DependencyScope::from_descriptor(s) {
                    Some(scope) => scope,
                    None => {
                        tracing::warn!(
                            "Skipping {}:{} with scope '{s}'",
                            dep.group_id,
                            dep.artifact_id
                        );
                        continue;
                    }
                },
            };
            let key = if artifact_counts[dep.artifact_id.as_str()] > 1 {
                format!("{}:{}", dep.group_id, dep.artifact_id)
            } else {
                dep.artifact_id.clone()
            };
            dependencies.insert(
                key,
                DependencySpec::Detailed(DetailedDependency {
                    group: dep.group_id.clone(),
                    artifact: dep.artifact_id.clone(),
                    version: dep.version.clone(),
                    scope,
                }),
            );
        }

        DescriptorConfig {
            module: ModuleConfig {
                group: self.effective_group_id().unwrap_or_default().to_string(),
                artifact: self.artifact_id.clone().unwrap_or_default(),
                version: self.effective_version().unwrap_or_default().to_string(),
                name: self.name.clone(),
                description: self.description.clone(),
                packaging: self.packaging.clone(),
                url: self.url.clone(),
                inception_year: self.inception_year.clone(),
            },
            parent: self.parent.clone(),
            dependencies,
            licenses: self.licenses.clone(),
            organization: self.organization.clone(),
            scm: self.scm.clone(),
            issue_management: self.issue_management.clone(),
            mailing_lists: self.mailing_lists.clone(),
            developers: self.developers.clone(),
        }
    }
}

/// Parse a POM XML string into a [`Pom`].
pub fn parse_pom(xml: &str) -> miette::Result<Pom> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    // Accumulators for repeated elements
    let mut current_dep: Option<PomDependency> = None;
    let mut current_license: Option<License> = None;
    let mut current_dev: Option<Developer> = None;
    let mut current_list: Option<MailingList> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
                text_buf.clear();

                match path_context(&path).as_str() {
                    "project>parent" => {
                        pom.parent = Some(ParentRef::new("", "", ""));
                    }
                    "project>organization" => {
                        pom.organization = Some(Organization::default());
                    }
                    "project>scm" => pom.scm = Some(Scm::default()),
                    "project>issueManagement" => {
                        pom.issue_management = Some(IssueManagement::default());
                    }
                    "project>dependencies>dependency" => {
                        current_dep = Some(PomDependency::default());
                    }
                    "project>licenses>license" => current_license = Some(License::default()),
                    "project>developers>developer" => current_dev = Some(Developer::default()),
                    "project>mailingLists>mailingList" => {
                        current_list = Some(MailingList::default());
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e.unescape().unwrap_or_default().to_string();
            }
            Ok(Event::CData(ref e)) => {
                text_buf = String::from_utf8_lossy(e).trim().to_string();
            }
            Ok(Event::End(_)) => {
                let ctx = path_context(&path);
                let text = || Some(text_buf.clone());

                match ctx.as_str() {
                    "project>modelVersion" => pom.model_version = text(),
                    "project>groupId" => pom.group_id = text(),
                    "project>artifactId" => pom.artifact_id = text(),
                    "project>version" => pom.version = text(),
                    "project>packaging" => pom.packaging = text(),
                    "project>name" => pom.name = text(),
                    "project>description" => pom.description = text(),
                    "project>url" => pom.url = text(),
                    "project>inceptionYear" => pom.inception_year = text(),
                    _ => {}
                }

                if let Some(rest) = ctx.strip_prefix("project>parent>") {
                    if let Some(parent) = pom.parent.as_mut() {
                        match rest {
                            "groupId" => parent.group = text_buf.clone(),
                            "artifactId" => parent.artifact = text_buf.clone(),
                            "version" => parent.version = text_buf.clone(),
                            "relativePath" => parent.relative_path = text(),
                            _ => {}
                        }
                    }
                }

                if let Some(rest) = ctx.strip_prefix("project>organization>") {
                    if let Some(org) = pom.organization.as_mut() {
                        match rest {
                            "name" => org.name = text(),
                            "url" => org.url = text(),
                            _ => {}
                        }
                    }
                }

                if let Some(rest) = ctx.strip_prefix("project>scm>") {
                    if let Some(scm) = pom.scm.as_mut() {
                        match rest {
                            "connection" => scm.connection = text(),
                            "developerConnection" => scm.developer_connection = text(),
                            "url" => scm.url = text(),
                            "tag" => scm.tag = text(),
                            _ => {}
                        }
                    }
                }

                if let Some(rest) = ctx.strip_prefix("project>issueManagement>") {
                    if let Some(issues) = pom.issue_management.as_mut() {
                        match rest {
                            "system" => issues.system = text(),
                            "url" => issues.url = text(),
                            _ => {}
                        }
                    }
                }

                if let Some(dep) = current_dep.as_mut() {
                    match ctx.strip_prefix("project>dependencies>dependency") {
                        Some(">groupId") => dep.group_id = text_buf.clone(),
                        Some(">artifactId") => dep.artifact_id = text_buf.clone(),
                        Some(">version") => dep.version = text(),
                        Some(">scope") => dep.scope = text(),
                        Some("") => pom.dependencies.extend(current_dep.take()),
                        _ => {}
                    }
                }

                if let Some(license) = current_license.as_mut() {
                    match ctx.strip_prefix("project>licenses>license") {
                        Some(">name") => license.name = text_buf.clone(),
                        Some(">url") => license.url = text(),
                        Some(">distribution") => license.distribution = text(),
                        Some(">comments") => license.comments = text(),
                        Some("") => pom.licenses.extend(current_license.take()),
                        _ => {}
                    }
                }

                if let Some(dev) = current_dev.as_mut() {
                    match ctx.strip_prefix("project>developers>developer") {
                        Some(">id") => dev.id = text(),
                        Some(">name") => dev.name = text(),
                        Some(">email") => dev.email = text(),
                        Some(">url") => dev.url = text(),
                        Some(">organization") => dev.organization = text(),
                        Some(">organizationUrl") => dev.organization_url = text(),
                        Some(">roles>role") => dev.roles.push(text_buf.clone()),
                        Some("") => pom.developers.extend(current_dev.take()),
                        _ => {}
                    }
                }

                if let Some(list) = current_list.as_mut() {
                    match ctx.strip_prefix("project>mailingLists>mailingList") {
                        Some(">name") => list.name = text(),
                        Some(">subscribe") => list.subscribe = text(),
                        Some(">unsubscribe") => list.unsubscribe = text(),
                        Some(">post") => list.post = text(),
                        Some(">archive") => list.archive = text(),
                        Some("") => pom.mailing_lists.extend(current_list.take()),
                        _ => {}
                    }
                }

                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(HoistError::Generic {
                    message: format!("Failed to parse POM XML: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(pom)
}

/// Build a context string from the current XML path for matching.
fn path_context(path: &[String]) -> String {
    path.join(">")
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoist_core::descriptor::build;

    fn sample_config() -> DescriptorConfig {
        let toml = r#"
[module]
group = "org.ow2.asm"
artifact = "asm-deprecated"
version = "9.9"
description = "Deprecated ASM classes & helpers <legacy>"
url = "https://asm.ow2.io/"
inception-year = "2000"

[parent]
group = "org.ow2"
artifact = "ow2"
version = "1.5.1"

[dependencies]
asm = { group = "org.ow2.asm", artifact = "asm", version = "9.9", scope = "compile" }
asm-tree = { group = "org.ow2.asm", artifact = "asm-tree", version = "9.9", scope = "runtime" }
asm-util = "org.ow2.asm:asm-util:9.9"

[[licenses]]
name = "BSD-3-Clause"
url = "https://asm.ow2.io/license.html"
distribution = "repo"

[organization]
name = "OW2"
url = "https://www.ow2.org/"

[scm]
connection = "scm:git:https://gitlab.ow2.org/asm/asm/"
developer-connection = "scm:git:https://gitlab.ow2.org/asm/asm/"
url = "https://gitlab.ow2.org/asm/asm/"

[issue-management]
url = "https://gitlab.ow2.org/asm/asm/issues"

[[mailing-lists]]
name = "ASM Users List"
subscribe = "https://mail.ow2.org/wws/subscribe/asm"
post = "asm@objectweb.org"

[[developers]]
id = "ebruneton"
name = "Eric Bruneton"
email = "ebruneton@free.fr"
roles = ["Creator", "Java Developer"]
"#;
        toml::from_str(toml).unwrap()
    }

    #[test]
    fn render_contains_coordinates_in_model_order() {
        let descriptor = build(&sample_config()).unwrap();
        let xml = render_pom(&descriptor).unwrap();

        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("xsi:schemaLocation=\"http://maven.apache.org/POM/4.0.0"));
        assert!(xml.contains("<modelVersion>4.0.0</modelVersion>"));

        let order = [
            "<modelVersion>",
            "<parent>",
            "<artifactId>asm-deprecated</artifactId>",
            "<packaging>jar</packaging>",
            "<name>asm-deprecated</name>",
            "<inceptionYear>",
            "<organization>",
            "<licenses>",
            "<developers>",
            "<mailingLists>",
            "<scm>",
            "<issueManagement>",
            "<dependencies>",
        ];
        let positions: Vec<usize> = order.iter().map(|tag| xml.find(tag).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{xml}");
    }

    #[test]
    fn render_escapes_text() {
        let descriptor = build(&sample_config()).unwrap();
        let xml = render_pom(&descriptor).unwrap();
        assert!(xml.contains("classes &amp; helpers &lt;legacy&gt;"));
    }

    #[test]
    fn implementation_scope_published_as_runtime() {
        let descriptor = build(&sample_config()).unwrap();
        let pom = parse_pom(&render_pom(&descriptor).unwrap()).unwrap();
        let util = pom
            .dependencies
            .iter()
            .find(|d| d.artifact_id == "asm-util")
            .unwrap();
        assert_eq!(util.scope.as_deref(), Some("runtime"));
        assert_eq!(pom.dependencies.len(), 3);
    }

    #[test]
    fn empty_sections_are_omitted() {
        let mut config = sample_config();
        config.organization = None;
        config.scm = None;
        config.issue_management = None;
        config.mailing_lists.clear();
        config.developers.clear();
        config.dependencies.clear();
        config.parent = None;
        config.module.description = Some("   ".to_string());

        let xml = render_pom(&build(&config).unwrap()).unwrap();
        for tag in [
            "<organization",
            "<scm",
            "<issueManagement",
            "<mailingLists",
            "<developers",
            "<dependencies",
            "<parent",
            "<description",
        ] {
            assert!(!xml.contains(tag), "{tag} should be omitted:\n{xml}");
        }
    }

    #[test]
    fn render_parse_build_round_trip() {
        let descriptor = build(&sample_config()).unwrap();
        let xml = render_pom(&descriptor).unwrap();
        let rebuilt = build(&parse_pom(&xml).unwrap().to_config()).unwrap();
        assert_eq!(rebuilt, descriptor);
    }

    #[test]
    fn parse_foreign_pom() {
        let xml = r#"<?xml version="1.0"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.ow2</groupId>
    <artifactId>ow2</artifactId>
    <version>1.5.1</version>
  </parent>
  <artifactId>asm</artifactId>
  <licenses>
    <license><name><![CDATA[BSD-3-Clause]]></name></license>
  </licenses>
  <dependencies>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>4.13.2</version>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>a.one</groupId>
      <artifactId>core</artifactId>
      <version>1</version>
    </dependency>
    <dependency>
      <groupId>b.two</groupId>
      <artifactId>core</artifactId>
      <version>2</version>
    </dependency>
  </dependencies>
</project>"#;
        let pom = parse_pom(xml).unwrap();
        assert_eq!(pom.effective_group_id(), Some("org.ow2"));
        assert_eq!(pom.effective_version(), Some("1.5.1"));
        assert_eq!(pom.licenses[0].name, "BSD-3-Clause");

        let config = pom.to_config();
        assert_eq!(config.module.group, "org.ow2");
        let keys: Vec<&str> = config.dependencies.keys().map(String::as_str).collect();
        assert_eq!(keys, ["a.one:core", "b.two:core"]);
        match &config.dependencies["a.one:core"] {
            DependencySpec::Detailed(d) => assert_eq!(d.scope, DependencyScope::Compile),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_pom("<project><groupId>x</project>").is_err());
    }
}
