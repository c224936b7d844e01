//! Package descriptor synthesis.
//!
//! A [`DescriptorConfig`] is the single explicit input: everything the
//! project file says about the module's identity, dependencies, licensing,
//! contacts and parent linkage. [`build`] validates it as a whole and
//! produces a [`PackageDescriptor`], which is never modified afterwards.
//!
//! Optional text fields are normalized on the way through: blank strings
//! become `None` and sections with nothing in them are dropped, so the
//! serialized descriptor never carries empty placeholder elements.

use std::collections::{BTreeMap, HashSet};

use hoist_util::errors::HoistError;
use serde::{Deserialize, Serialize};

use crate::dependency::{Dependency, DependencySpec};
use crate::identity::ModuleIdentity;

/// Default packaging type when the module does not declare one.
pub const DEFAULT_PACKAGING: &str = "jar";

/// Module identity and descriptive metadata from `[module]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleConfig {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub artifact: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub packaging: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub inception_year: Option<String>,
}

/// Reference to an umbrella descriptor whose metadata consumers inherit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParentRef {
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(default)]
    pub relative_path: Option<String>,
}

impl ParentRef {
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
            relative_path: None,
        }
    }

    pub fn identity(&self) -> ModuleIdentity {
        ModuleIdentity::new(&self.group, &self.artifact, &self.version)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct License {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub distribution: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Organization {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Source control coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Scm {
    #[serde(default)]
    pub connection: Option<String>,
    #[serde(default)]
    pub developer_connection: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IssueManagement {
    #[serde(default)]
    pub system: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MailingList {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub subscribe: Option<String>,
    #[serde(default)]
    pub unsubscribe: Option<String>,
    #[serde(default)]
    pub post: Option<String>,
    #[serde(default)]
    pub archive: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Developer {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub organization_url: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Everything needed to build a descriptor, as one fully-formed value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DescriptorConfig {
    #[serde(default)]
    pub module: ModuleConfig,
    #[serde(default)]
    pub parent: Option<ParentRef>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencySpec>,
    #[serde(default)]
    pub licenses: Vec<License>,
    #[serde(default)]
    pub organization: Option<Organization>,
    #[serde(default)]
    pub scm: Option<Scm>,
    #[serde(default)]
    pub issue_management: Option<IssueManagement>,
    #[serde(default)]
    pub mailing_lists: Vec<MailingList>,
    #[serde(default)]
    pub developers: Vec<Developer>,
}

/// A complete, validated package descriptor.
///
/// Only [`build`] creates one. Dependencies are sorted by group and
/// artifact so that equal configurations always yield equal descriptors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[non_exhaustive]
pub struct PackageDescriptor {
    pub identity: ModuleIdentity,
    pub name: String,
    pub description: Option<String>,
    pub packaging: String,
    pub url: Option<String>,
    pub inception_year: Option<String>,
    pub parent: Option<ParentRef>,
    pub dependencies: Vec<Dependency>,
    pub licenses: Vec<License>,
    pub organization: Option<Organization>,
    pub scm: Option<Scm>,
    pub issue_management: Option<IssueManagement>,
    pub mailing_lists: Vec<MailingList>,
    pub developers: Vec<Developer>,
}

impl PackageDescriptor {
    /// Return this descriptor with `parent` recorded as its parent reference.
    ///
    /// The parent's metadata is not merged here; consumers of the published
    /// descriptor resolve inheritance themselves.
    pub fn with_parent(self, parent: ParentRef) -> Self {
        with_parent(self, parent)
    }
}

/// Validate `config` and assemble the descriptor.
///
/// Every problem found is reported in a single [`HoistError::Validation`].
pub fn build(config: &DescriptorConfig) -> miette::Result<PackageDescriptor> {
    let mut problems = Vec::new();
    let module = &config.module;

    let identity = ModuleIdentity::new(
        module.group.trim(),
        module.artifact.trim(),
        module.version.trim(),
    );
    problems.extend(identity.problems("module"));

    let packaging = clean(&module.packaging).unwrap_or_else(|| DEFAULT_PACKAGING.to_string());
    if packaging.chars().any(char::is_whitespace) {
        problems.push(format!("module.packaging: '{packaging}' contains whitespace"));
    }

    let inception_year = clean(&module.inception_year);
    if let Some(year) = &inception_year {
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            problems.push(format!("module.inception-year: '{year}' is not a year"));
        }
    }

    let parent = config.parent.as_ref().map(normalize_parent);
    if let Some(parent) = &parent {
        problems.extend(parent.identity().problems("parent"));
    }

    let mut dependencies = Vec::new();
    let mut seen = HashSet::new();
    for (key, spec) in &config.dependencies {
        match spec.resolve(key) {
            Ok(dep) => {
                if !seen.insert((dep.group.clone(), dep.artifact.clone())) {
                    problems.push(format!(
                        "dependencies.{key}: {}:{} is declared more than once",
                        dep.group, dep.artifact
                    ));
                } else {
                    dependencies.push(dep);
                }
            }
            Err(dep_problems) => problems.extend(dep_problems),
        }
    }
    dependencies.sort_by(|a, b| (&a.group, &a.artifact).cmp(&(&b.group, &b.artifact)));

    let licenses: Vec<License> = config.licenses.iter().map(normalize_license).collect();
    if licenses.is_empty() {
        problems.push("licenses: at least one license is required".to_string());
    }
    for (i, license) in licenses.iter().enumerate() {
        if license.name.is_empty() {
            problems.push(format!("licenses[{i}].name: is missing"));
        }
    }

    let mailing_lists: Vec<MailingList> = config
        .mailing_lists
        .iter()
        .map(normalize_mailing_list)
        .filter(|m| *m != MailingList::default())
        .collect();
    for (i, list) in mailing_lists.iter().enumerate() {
        if list.name.is_none() {
            problems.push(format!("mailing-lists[{i}].name: is missing"));
        }
    }

    let developers: Vec<Developer> = config
        .developers
        .iter()
        .map(normalize_developer)
        .filter(|d| *d != Developer::default())
        .collect();
    for (i, dev) in developers.iter().enumerate() {
        if dev.id.is_none() && dev.name.is_none() {
            problems.push(format!("developers[{i}]: needs an id or a name"));
        }
    }

    if !problems.is_empty() {
        return Err(HoistError::Validation {
            message: format!(
                "descriptor for {identity} has {} problem(s):\n  - {}",
                problems.len(),
                problems.join("\n  - ")
            ),
        }
        .into());
    }

    let descriptor = PackageDescriptor {
        name: clean(&module.name).unwrap_or_else(|| identity.artifact.clone()),
        description: clean(&module.description),
        packaging,
        url: clean(&module.url),
        inception_year,
        parent,
        dependencies,
        licenses,
        organization: config
            .organization
            .as_ref()
            .map(|o| Organization {
                name: clean(&o.name),
                url: clean(&o.url),
            })
            .filter(|o| *o != Organization::default()),
        scm: config
            .scm
            .as_ref()
            .map(|s| Scm {
                connection: clean(&s.connection),
                developer_connection: clean(&s.developer_connection),
                url: clean(&s.url),
                tag: clean(&s.tag),
            })
            .filter(|s| *s != Scm::default()),
        issue_management: config
            .issue_management
            .as_ref()
            .map(|i| IssueManagement {
                system: clean(&i.system),
                url: clean(&i.url),
            })
            .filter(|i| *i != IssueManagement::default()),
        mailing_lists,
        developers,
        identity,
    };

    tracing::debug!(
        "Built descriptor for {} with {} dependencies",
        descriptor.identity,
        descriptor.dependencies.len()
    );
    Ok(descriptor)
}

/// Record `parent` on `descriptor`. See [`PackageDescriptor::with_parent`].
pub fn with_parent(descriptor: PackageDescriptor, parent: ParentRef) -> PackageDescriptor {
    PackageDescriptor {
        parent: Some(normalize_parent(&parent)),
        ..descriptor
    }
}

fn clean(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn normalize_parent(parent: &ParentRef) -> ParentRef {
    ParentRef {
        group: parent.group.trim().to_string(),
        artifact: parent.artifact.trim().to_string(),
        version: parent.version.trim().to_string(),
        relative_path: clean(&parent.relative_path),
    }
}

fn normalize_license(license: &License) -> License {
    License {
        name: license.name.trim().to_string(),
        url: clean(&license.url),
        distribution: clean(&license.distribution),
        comments: clean(&license.comments),
    }
}

fn normalize_mailing_list(list: &MailingList) -> MailingList {
    MailingList {
        name: clean(&list.name),
        subscribe: clean(&list.subscribe),
        unsubscribe: clean(&list.unsubscribe),
        post: clean(&list.post),
        archive: clean(&list.archive),
    }
}

fn normalize_developer(dev: &Developer) -> Developer {
    Developer {
        id: clean(&dev.id),
        name: clean(&dev.name),
        email: clean(&dev.email),
        url: clean(&dev.url),
        organization: clean(&dev.organization),
        organization_url: clean(&dev.organization_url),
        roles: dev
            .roles
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string)
            .collect(),
    }
}
