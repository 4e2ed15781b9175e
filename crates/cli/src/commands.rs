//! Subcommand handlers. Each returns the JSON document printed on stdout.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use nai_client::{FetchOutcome, Network, OfflineWorker, Prerenderer, Request};
use nai_core::{CacheDb, OfflineConfig, PrerenderConfig};
use serde_json::{Value, json};
use url::Url;

use crate::cli::{FetchArgs, OfflineCommand, PrerenderArgs};

/// Run the metadata injector.
///
/// Without `--strict` nothing here fails the process: a missing base
/// document or unreadable content is logged and reported.
pub fn prerender(args: &PrerenderArgs, mut config: PrerenderConfig) -> Result<Value> {
    args.apply(&mut config);
    let strict = config.strict;

    match Prerenderer::new(config).run() {
        Ok(Some(report)) => {
            if strict && !report.is_complete() {
                bail!("{} ({} failed)", report.summary(), report.failures.len());
            }
            Ok(json!(report))
        }
        Ok(None) => {
            if strict {
                bail!("base document not found");
            }
            Ok(json!({ "skipped": true }))
        }
        Err(e) => {
            if strict {
                return Err(e).context("prerender failed");
            }
            tracing::error!("prerender failed: {e}");
            Ok(json!({ "error": e.to_string() }))
        }
    }
}

pub async fn offline(
    command: &OfflineCommand, config: &OfflineConfig, cache: &CacheDb, network: Arc<dyn Network>,
) -> Result<Value> {
    match command {
        OfflineCommand::Install => {
            let worker = OfflineWorker::new(config.clone(), cache.clone(), network)?;
            let installed = worker.install().await?;
            Ok(json!({ "state": worker.state().await.to_string(), "install": installed }))
        }
        OfflineCommand::Activate => {
            let worker = OfflineWorker::new(config.clone(), cache.clone(), network)?;
            let (installed, activated) = worker.start().await?;
            Ok(json!({
                "state": worker.state().await.to_string(),
                "install": installed,
                "activate": activated,
                "keys": worker.keys().await?,
            }))
        }
        OfflineCommand::Keys => Ok(json!(cache.bucket_names().await?)),
        OfflineCommand::Fetch(args) => {
            let worker = OfflineWorker::register(config.clone(), cache.clone(), network).await?;
            let request = build_request(args, &config.origin)?;
            let outcome = worker.handle_fetch(request).await;
            worker.settle().await;
            Ok(describe(outcome))
        }
    }
}

/// Resolve the URL argument against the origin and apply the request flags.
pub fn build_request(args: &FetchArgs, origin: &str) -> Result<Request> {
    let url = match Url::parse(&args.url) {
        Ok(url) => url,
        Err(_) => Url::parse(origin)
            .and_then(|base| base.join(&args.url))
            .with_context(|| format!("cannot resolve {} against {origin}", args.url))?,
    };

    let mut request = Request::get(url)
        .with_destination(args.destination.unwrap_or_default())
        .with_mode(args.mode.unwrap_or_default());
    if let Some(accept) = &args.accept {
        request = request.with_accept(accept)?;
    }
    Ok(request)
}

fn describe(outcome: FetchOutcome) -> Value {
    match outcome {
        FetchOutcome::NotIntercepted => json!({ "intercepted": false }),
        FetchOutcome::Responded(Ok(response)) => json!({
            "intercepted": true,
            "url": response.url.as_str(),
            "status": response.status.as_u16(),
            "type": response.response_type.as_str(),
            "content_type": response.content_type(),
            "bytes": response.body.len(),
        }),
        FetchOutcome::Responded(Err(e)) => json!({ "intercepted": true, "error": e.to_string() }),
    }
}
