//! Operation: publish the artifact set and its descriptor to a repository.
//!
//! Artifacts upload concurrently, each followed by its checksum sidecars.
//! The POM goes up once every artifact has been attempted, and
//! `maven-metadata.xml` is only touched when everything before it
//! succeeded. Per-item failures land in the [`PublishReport`]; only
//! problems found before the first upload are returned as errors.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use hoist_core::artifact::ArtifactSet;
use hoist_core::config::{PublishSettings, RepositoryEntry};
use hoist_core::descriptor::PackageDescriptor;
use hoist_core::identity::ModuleIdentity;
use hoist_maven::auth::{CredentialProvider, Credentials, EnvCredentialProvider, StaticCredentialProvider};
use hoist_maven::checksum;
use hoist_maven::metadata::{parse_metadata, MavenMetadata};
use hoist_maven::pom::render_pom;
use hoist_maven::repository::{self, RepositoryTarget};
use hoist_maven::transport::{self, MemoryTransport, Transport};
use hoist_util::errors::HoistError;

use crate::cancel::CancelSignal;
use crate::report::{ItemReport, PublishReport, PublishStatus, METADATA_LABEL, POM_LABEL};

/// Detail recorded for items stopped by cancellation.
///
/// A `file://` upload stopped this way never reaches its destination path.
/// An HTTP request that was already sent may still be accepted by the server.
pub const CANCELLED: &str = "cancelled";

/// Tuning for one publish operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    /// Maximum concurrent artifact uploads.
    pub jobs: usize,
    /// Upload `.md5`/`.sha1`/`.sha256`/`.sha512` next to every file.
    pub checksums: bool,
    /// Merge the version into `maven-metadata.xml` after a full success.
    pub update_metadata: bool,
    /// Show a progress bar on stderr.
    pub show_progress: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            checksums: true,
            update_metadata: true,
            show_progress: false,
        }
    }
}

impl PublishOptions {
    pub fn from_settings(settings: &PublishSettings) -> Self {
        Self {
            jobs: settings.jobs,
            checksums: settings.checksums,
            update_metadata: settings.update_metadata,
            show_progress: false,
        }
    }
}

/// One file to upload, with its report label.
struct UploadJob {
    classifier: String,
    path: String,
    data: Vec<u8>,
}

impl UploadJob {
    fn label(&self) -> &str {
        if self.classifier.is_empty() {
            "primary"
        } else {
            &self.classifier
        }
    }
}

/// Publish `artifacts` and `descriptor` to `target`.
///
/// Returns `Err` only when nothing was uploaded: an invalid artifact set,
/// a descriptor that cannot be rendered, credentials that cannot be
/// resolved, or cancellation before the start. Everything after that is
/// reported per item.
pub async fn publish(
    artifacts: &ArtifactSet,
    descriptor: &PackageDescriptor,
    target: &RepositoryTarget,
    credentials: &dyn CredentialProvider,
    transport: Arc<dyn Transport>,
    options: &PublishOptions,
    cancel: &CancelSignal,
) -> miette::Result<PublishReport> {
    artifacts.validate()?;
    let identity = &descriptor.identity;
    let pom_xml = render_pom(descriptor)?;

    if cancel.is_cancelled() {
        return Err(HoistError::Cancelled {
            message: format!("publish of {identity} was cancelled before it started"),
        }
        .into());
    }

    let creds = Arc::new(credentials.resolve(target).await?);
    tracing::info!(
        "Publishing {identity} to {} ({}) using {}",
        target.name,
        target.url,
        creds.describe()
    );

    let jobs: Vec<UploadJob> = artifacts
        .iter()
        .map(|artifact| UploadJob {
            classifier: artifact.classifier.clone(),
            path: repository::artifact_path(identity, &artifact.classifier, &artifact.extension),
            data: artifact.data.clone(),
        })
        .collect();
    let slots: Vec<(String, String)> = jobs
        .iter()
        .map(|job| (job.classifier.clone(), job.path.clone()))
        .collect();
    for job in &jobs {
        tracing::debug!("{} {}: pending", job.label(), job.path);
    }

    let pb = options
        .show_progress
        .then(|| hoist_util::progress::progress_bar(jobs.len() as u64 + 1, "Uploading"));

    let semaphore = Arc::new(Semaphore::new(options.jobs.max(1)));
    let mut join_set = JoinSet::new();
    for (index, job) in jobs.into_iter().enumerate() {
        let transport = transport.clone();
        let creds = creds.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();
        let checksums = options.checksums;

        join_set.spawn(async move {
            let item = tokio::select! {
                biased;
                _ = cancel.cancelled() => cancelled_item(&job),
                permit = semaphore.acquire() => match permit {
                    Ok(_permit) => {
                        upload_item(transport.as_ref(), &creds, &job, checksums, &cancel).await
                    }
                    Err(_) => cancelled_item(&job),
                },
            };
            (index, item)
        });
    }

    let mut finished: Vec<Option<ItemReport>> = vec![None; slots.len()];
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, item)) => finished[index] = Some(item),
            Err(e) => tracing::error!("Upload task failed: {e}"),
        }
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    let mut items: Vec<ItemReport> = finished
        .into_iter()
        .zip(slots)
        .map(|(item, (classifier, path))| {
            item.unwrap_or_else(|| ItemReport::failed(&classifier, &path, "upload task did not complete"))
        })
        .collect();

    let pom_job = UploadJob {
        classifier: POM_LABEL.to_string(),
        path: repository::pom_path(identity),
        data: pom_xml.into_bytes(),
    };
    items.push(upload_item(transport.as_ref(), &creds, &pom_job, options.checksums, cancel).await);
    if let Some(pb) = &pb {
        pb.inc(1);
    }

    if options.update_metadata && items.iter().all(ItemReport::is_uploaded) {
        items.push(update_metadata(transport.as_ref(), &creds, identity, options.checksums, cancel).await);
    }
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let report = PublishReport {
        identity: identity.clone(),
        repository: target.name.clone(),
        items,
    };
    match report.status() {
        PublishStatus::Completed => {
            tracing::info!("Published {identity} to {}: {} file(s)", target.name, report.items.len());
        }
        PublishStatus::PartiallyFailed => {
            tracing::warn!(
                "Publishing {identity} to {} partially failed: {} of {} item(s) failed",
                target.name,
                report.failed().len(),
                report.items.len()
            );
        }
    }
    Ok(report)
}

/// Upload one file and its sidecars, racing cancellation.
async fn upload_item(
    transport: &dyn Transport,
    credentials: &Credentials,
    job: &UploadJob,
    checksums: bool,
    cancel: &CancelSignal,
) -> ItemReport {
    tracing::debug!("{} {}: uploading to {}", job.label(), job.path, transport.describe(&job.path));

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return cancelled_item(job),
        result = put_with_sidecars(transport, credentials, &job.path, &job.data, checksums) => result,
    };

    match result {
        Ok(status) => {
            tracing::debug!("{} {}: uploaded ({status})", job.label(), job.path);
            ItemReport::uploaded(&job.classifier, &job.path, status)
        }
        Err(e) => {
            tracing::warn!("{} {}: failed: {e}", job.label(), job.path);
            ItemReport::failed(&job.classifier, &job.path, e.to_string())
        }
    }
}

fn cancelled_item(job: &UploadJob) -> ItemReport {
    tracing::debug!("{} {}: {CANCELLED}", job.label(), job.path);
    ItemReport::failed(&job.classifier, &job.path, CANCELLED)
}

/// The main file first, then each sidecar. The first failure fails the item.
async fn put_with_sidecars(
    transport: &dyn Transport,
    credentials: &Credentials,
    path: &str,
    data: &[u8],
    checksums: bool,
) -> Result<u16, HoistError> {
    let status = transport.put(path, data, credentials).await?;
    if checksums {
        for sidecar in checksum::sidecars(path, data) {
            transport
                .put(&sidecar.path, sidecar.content.as_bytes(), credentials)
                .await?;
        }
    }
    Ok(status)
}

async fn update_metadata(
    transport: &dyn Transport,
    credentials: &Credentials,
    identity: &ModuleIdentity,
    checksums: bool,
    cancel: &CancelSignal,
) -> ItemReport {
    let path = repository::metadata_path(identity);
    let merged = tokio::select! {
        biased;
        _ = cancel.cancelled() => return ItemReport::failed(METADATA_LABEL, &path, CANCELLED),
        merged = merge_metadata(transport, credentials, identity, &path) => merged,
    };
    match merged {
        Ok(data) => {
            let job = UploadJob {
                classifier: METADATA_LABEL.to_string(),
                path,
                data,
            };
            upload_item(transport, credentials, &job, checksums, cancel).await
        }
        Err(e) => {
            tracing::warn!("{METADATA_LABEL} {path}: failed: {e}");
            ItemReport::failed(METADATA_LABEL, &path, e.to_string())
        }
    }
}

/// Fetch the current listing (if any) and add this version to it.
async fn merge_metadata(
    transport: &dyn Transport,
    credentials: &Credentials,
    identity: &ModuleIdentity,
    path: &str,
) -> Result<Vec<u8>, HoistError> {
    let mut meta = match transport.get(path, credentials).await? {
        Some(bytes) => parse_metadata(&String::from_utf8_lossy(&bytes)).map_err(|e| {
            HoistError::Generic {
                message: format!("existing {path} is unreadable: {e}"),
            }
        })?,
        None => MavenMetadata::for_module(identity),
    };
    meta.record_version(&identity.version, Utc::now());
    let xml = meta.render().map_err(|e| HoistError::Generic {
        message: e.to_string(),
    })?;
    Ok(xml.into_bytes())
}

/// Credentials given inline in `[repositories]` win over `HOIST_<REPO>_*`
/// variables.
pub fn credential_provider_for(
    entry: &RepositoryEntry,
    env: &BTreeMap<String, String>,
) -> Box<dyn CredentialProvider> {
    match entry {
        RepositoryEntry::Detailed {
            username,
            password,
            token,
            ..
        } if username.is_some() || password.is_some() || token.is_some() => Box::new(
            StaticCredentialProvider::new(username.clone(), password.clone(), token.clone()),
        ),
        _ => Box::new(EnvCredentialProvider::new(env.clone())),
    }
}

/// Command-line choices layered over `[publish]`.
#[derive(Debug, Clone, Default)]
pub struct PublishRequest {
    pub repository: Option<String>,
    pub jobs: Option<usize>,
    pub dry_run: bool,
    pub no_metadata: bool,
    pub show_progress: bool,
}

/// Result of [`publish_project`].
#[derive(Debug)]
pub struct PublishOutcome {
    pub target: RepositoryTarget,
    pub report: PublishReport,
    /// Every URL that would have been written, for `--dry-run`.
    pub dry_run_urls: Vec<String>,
}

/// Load the project at `project_root` and publish it.
///
/// With `dry_run`, uploads go to memory and the report lists what would
/// have been written; nothing touches the repository.
pub async fn publish_project(
    project_root: &Path,
    request: &PublishRequest,
    cancel: &CancelSignal,
) -> miette::Result<PublishOutcome> {
    let project = crate::ops_validate::load_project(project_root)?;
    let (name, entry) = project
        .config
        .select_repository(request.repository.as_deref())?;
    let target = RepositoryTarget::from_entry(name, entry);
    let provider = credential_provider_for(entry, &project.env);

    let settings = &project.config.publish;
    let mut options = PublishOptions::from_settings(settings);
    if let Some(jobs) = request.jobs {
        options.jobs = jobs;
    }
    if request.no_metadata {
        options.update_metadata = false;
    }
    options.show_progress = request.show_progress && !request.dry_run;

    if request.dry_run {
        let memory = Arc::new(MemoryTransport::new());
        let report = publish(
            &project.artifacts,
            &project.descriptor,
            &target,
            provider.as_ref(),
            memory.clone(),
            &options,
            cancel,
        )
        .await?;
        let dry_run_urls = memory.files().keys().map(|p| target.url_for(p)).collect();
        return Ok(PublishOutcome {
            target,
            report,
            dry_run_urls,
        });
    }

    let transport: Arc<dyn Transport> =
        Arc::from(transport::transport_for(&target, Duration::from_secs(settings.timeout_secs))?);
    let report = publish(
        &project.artifacts,
        &project.descriptor,
        &target,
        provider.as_ref(),
        transport,
        &options,
        cancel,
    )
    .await?;
    Ok(PublishOutcome {
        target,
        report,
        dry_run_urls: Vec::new(),
    })
}
