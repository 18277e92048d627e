//! `run` command: wire the production collaborators into the orchestrator.

use std::sync::Arc;

use brandscan_apify::ApifyClient;
use brandscan_core::{AppConfig, ConfigError};
use brandscan_llm::OpenAiClient;
use brandscan_pipeline::adapters::{ApifyProvider, OpenAiModel, PgGateway};
use brandscan_pipeline::{
    Orchestrator, PipelineConfig, ProspectOutcome, ProspectReport, RunReport, Scope,
};
use tokio_util::sync::CancellationToken;

/// Turn the mutually exclusive `--all` / `--brand` flags into a scope.
pub(crate) fn scope_from_args(
    all: bool,
    brand: Option<String>,
    category: Option<String>,
) -> anyhow::Result<Scope> {
    match (all, brand) {
        (true, None) => Ok(Scope::AllProspects),
        (false, Some(name)) if !name.trim().is_empty() => Ok(Scope::Brand {
            name: name.trim().to_string(),
            category: category.filter(|c| !c.trim().is_empty()),
        }),
        (false, Some(_)) => anyhow::bail!("--brand must not be empty"),
        _ => anyhow::bail!("pass exactly one of --all or --brand"),
    }
}

/// Human-readable outcome line for one prospect.
pub(crate) fn format_report_line(report: &ProspectReport) -> String {
    match &report.outcome {
        ProspectOutcome::Succeeded(result) => {
            format!("{}: succeeded — {}", report.brand_name, result.key_insight)
        }
        ProspectOutcome::Failed { reason } => {
            format!("{}: failed — {reason}", report.brand_name)
        }
        ProspectOutcome::Skipped => format!("{}: skipped — run cancelled", report.brand_name),
    }
}

fn build_orchestrator(pool: &sqlx::PgPool, config: &AppConfig) -> anyhow::Result<Orchestrator> {
    let apify_token = config
        .apify_api_token
        .as_deref()
        .ok_or_else(|| ConfigError::MissingEnvVar("APIFY_API_TOKEN".to_string()))?;
    let openai_key = config
        .openai_api_key
        .as_deref()
        .ok_or_else(|| ConfigError::MissingEnvVar("OPENAI_API_KEY".to_string()))?;

    let apify = Arc::new(ApifyProvider::new(ApifyClient::new(
        apify_token,
        config.search_timeout_secs.max(config.scrape_timeout_secs),
        config.apify_max_retries,
        config.apify_retry_backoff_base_secs,
    )?));
    let model = OpenAiModel::new(
        OpenAiClient::new(
            openai_key,
            &config.llm_model,
            config.llm_request_timeout_secs,
        )?
        .with_retry(config.llm_max_retries, config.llm_retry_backoff_base_ms),
    );
    let store = PgGateway::new(pool.clone(), config.insert_chunk_size);

    Ok(Orchestrator::new(
        apify.clone(),
        apify,
        Arc::new(model),
        Arc::new(store),
        PipelineConfig::from_app_config(config),
    ))
}

/// Run the pipeline and print one line per prospect.
///
/// Ctrl-C stops new prospects from starting; in-flight ones finish.
///
/// # Errors
///
/// Returns an error if an API key is missing, a client cannot be built, or
/// the scope cannot be resolved. Per-prospect failures are reported, not
/// returned.
pub(crate) async fn run_pipeline(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    scope: &Scope,
) -> anyhow::Result<RunReport> {
    let orchestrator = build_orchestrator(pool, config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight prospects");
            on_interrupt.cancel();
        }
    });

    let report = orchestrator.run(scope, &cancel).await?;

    if report.prospects.is_empty() {
        println!("no prospects to process; run `brandscan db seed` or pass --brand");
    }
    for prospect in &report.prospects {
        println!("{}", format_report_line(prospect));
    }
    if report.prospects.len() > 1 {
        println!(
            "{} succeeded, {} failed, {} skipped",
            report.succeeded_count(),
            report.failed_count(),
            report.skipped_count()
        );
    }

    Ok(report)
}

/// Print the prospects a run would touch and their pending URL counts.
///
/// Reads only; a single brand that does not exist yet is reported as new.
///
/// # Errors
///
/// Returns an error if a database query fails.
pub(crate) async fn run_dry(pool: &sqlx::PgPool, scope: &Scope) -> anyhow::Result<()> {
    let prospects = match scope {
        Scope::AllProspects => brandscan_db::list_prospects(pool).await?,
        Scope::Brand { name, .. } => {
            if let Some(row) = brandscan_db::get_prospect_by_name(pool, name).await? {
                vec![row]
            } else {
                println!("dry-run: would create prospect '{name}' and run all stages");
                return Ok(());
            }
        }
    };

    println!("dry-run: would process {} prospects", prospects.len());
    for row in &prospects {
        let pending = brandscan_db::list_discovered_urls(pool, row.id, true).await?;
        println!(
            "  {} [{}] pending URLs: {}",
            row.brand_name,
            row.status,
            pending.len()
        );
    }
    Ok(())
}
