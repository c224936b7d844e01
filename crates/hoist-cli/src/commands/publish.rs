//! Handler for `hoist publish`.

use miette::Result;

use hoist_ops::cancel::cancel_pair;
use hoist_ops::ops_publish::{publish_project, PublishRequest};
use hoist_ops::report::{ItemOutcome, PublishStatus};
use hoist_util::errors::HoistError;
use hoist_util::progress::{status, status_error, status_info, status_warn};

pub struct Args {
    pub repository: Option<String>,
    pub jobs: Option<usize>,
    pub dry_run: bool,
    pub no_metadata: bool,
    pub json: bool,
}

pub async fn exec(args: Args) -> Result<()> {
    let project_root = super::project_root()?;
    tracing::debug!("Publishing project at {}", project_root.display());

    let (handle, signal) = cancel_pair();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            status_warn("Cancelling", "waiting for in-flight uploads to stop");
            handle.cancel();
        }
    });

    let request = PublishRequest {
        repository: args.repository,
        jobs: args.jobs,
        dry_run: args.dry_run,
        no_metadata: args.no_metadata,
        show_progress: !args.json,
    };
    let outcome = publish_project(&project_root, &request, &signal).await;
    ctrl_c.abort();
    let outcome = outcome?;
    let report = &outcome.report;

    if args.json {
        let json = serde_json::to_string_pretty(report).map_err(|e| HoistError::Generic {
            message: format!("Failed to serialize report: {e}"),
        })?;
        println!("{json}");
    } else if args.dry_run {
        for url in &outcome.dry_run_urls {
            println!("{url}");
        }
        status_info(
            "Dry run",
            &format!(
                "{} file(s) would be uploaded to '{}'",
                outcome.dry_run_urls.len(),
                outcome.target.name
            ),
        );
        return Ok(());
    } else {
        for item in &report.items {
            match &item.outcome {
                ItemOutcome::Uploaded { .. } => status("Uploaded", &item.path),
                ItemOutcome::Failed { detail } => {
                    status_error("Failed", &format!("{} ({detail})", item.path))
                }
            }
        }
    }

    match report.status() {
        PublishStatus::Completed => {
            if !args.json {
                status(
                    "Published",
                    &format!("{} to '{}'", report.identity, outcome.target.name),
                );
            }
            Ok(())
        }
        PublishStatus::PartiallyFailed => {
            let failed = report.failed().len();
            let total = report.items.len();
            let message = if report.published_anything() {
                format!(
                    "{} partially published to '{}': {failed} of {total} item(s) failed; \
                     re-run `hoist publish` to retry",
                    report.identity, outcome.target.name
                )
            } else {
                format!(
                    "nothing was published for {} to '{}': all {total} item(s) failed",
                    report.identity, outcome.target.name
                )
            };
            Err(HoistError::Generic { message }.into())
        }
    }
}
