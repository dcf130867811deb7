mod cli;
mod logging;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tokio::sync::oneshot;

use reportsync::api::{AnalysisRecord, AnalysisStatus, ApiClient, PaymentStatus, ReportsApi};
use reportsync::config::ReportSyncConfig;
use reportsync::poller::{Outcome, PollCallbacks, PollHandle, PollUpdate};
use reportsync::reconcile::{AnalysisReconciliation, PaymentReceipt};
use reportsync::store::SessionStore;
use ui::PollProgress;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ReportSyncConfig::load_from(path)?,
        None => ReportSyncConfig::load()?,
    };
    config.apply_overrides(cli.token, cli.base_url);

    let api = Arc::new(config.api_client()?);
    let store = SessionStore::new();

    match cli.command {
        Command::Analyze { property_id } => analyze(&config, api, &property_id).await,
        Command::Track { analysis_id } => track(&config, api, &analysis_id).await,
        Command::Refresh { analysis_id } => refresh(api.as_ref(), &analysis_id).await,
        Command::Download { analysis_id, out } => download(api.as_ref(), &analysis_id, out).await,
        Command::Payment { session_id } => payment(&config, api, store, &session_id).await,
        Command::Me => me(api.as_ref(), &store).await,
        Command::Dashboard => dashboard(api.as_ref(), &store).await,
    }
}

/// Wait for the session to settle, or cancel it on Ctrl-C.
async fn wait_for<P>(handle: PollHandle, settled: oneshot::Receiver<Outcome<P>>) -> Option<Outcome<P>> {
    tokio::select! {
        outcome = settled => outcome.ok(),
        _ = tokio::signal::ctrl_c() => {
            handle.cancel();
            None
        }
    }
}

fn exit_code<P>(outcome: &Outcome<P>) -> ExitCode {
    match outcome {
        Outcome::Succeeded { .. } => ExitCode::SUCCESS,
        Outcome::Failed { .. } => ExitCode::FAILURE,
        Outcome::TimedOut { .. } => ExitCode::from(2),
    }
}

fn analysis_callbacks(
    progress: Arc<PollProgress>,
    label: String,
) -> (
    PollCallbacks<AnalysisRecord, AnalysisRecord>,
    oneshot::Receiver<Outcome<AnalysisRecord>>,
) {
    let (tx, rx) = oneshot::channel();
    let callbacks = PollCallbacks::new()
        .on_update(move |u: &PollUpdate<AnalysisRecord>| {
            progress.update(&label, &u.status.status.to_string(), u.attempts_made);
        })
        .on_settled(move |outcome| {
            let _ = tx.send(outcome);
        });
    (callbacks, rx)
}

async fn finish_analysis(
    progress: &PollProgress,
    analysis_id: &str,
    handle: PollHandle,
    settled: oneshot::Receiver<Outcome<AnalysisRecord>>,
) -> ExitCode {
    let hint = format!("Run `reportsync refresh {analysis_id}` to check again later.");
    match wait_for(handle, settled).await {
        Some(outcome) => {
            progress.finish(
                &outcome,
                |record| {
                    format!(
                        "Report ready for {}. Run `reportsync download {}` to save the PDF.",
                        record.property_name, record.id
                    )
                },
                &hint,
            );
            exit_code(&outcome)
        }
        None => {
            progress.cancelled();
            ExitCode::from(130)
        }
    }
}

async fn analyze(config: &ReportSyncConfig, api: Arc<ApiClient>, property_id: &str) -> Result<ExitCode> {
    let policy = config.analysis_policy()?;
    let progress = Arc::new(PollProgress::start(&format!(
        "Submitting analysis for {property_id}"
    )));
    let (callbacks, settled) = analysis_callbacks(progress.clone(), "Generating report".into());

    let (started, handle) = match policy.submit(api, property_id, callbacks).await {
        Ok(submitted) => submitted,
        Err(err) => {
            progress.cancelled();
            return Err(err.into());
        }
    };
    progress.update("Generating report", &started.status.to_string(), 0);
    Ok(finish_analysis(&progress, &started.analysis_id, handle, settled).await)
}

async fn track(config: &ReportSyncConfig, api: Arc<ApiClient>, analysis_id: &str) -> Result<ExitCode> {
    let policy = config.analysis_policy()?;
    let progress = Arc::new(PollProgress::start(&format!("Tracking analysis {analysis_id}")));
    let (callbacks, settled) = analysis_callbacks(progress.clone(), "Generating report".into());

    let handle = policy.track(api, analysis_id, callbacks)?;
    Ok(finish_analysis(&progress, analysis_id, handle, settled).await)
}

async fn refresh(api: &ApiClient, analysis_id: &str) -> Result<ExitCode> {
    let record = AnalysisReconciliation::refresh(api, analysis_id).await?;
    println!("{}: {}", record.id, record.status);
    if record.status == AnalysisStatus::Completed {
        println!("  Run `reportsync download {}` to save the PDF.", record.id);
    }
    Ok(ExitCode::SUCCESS)
}

async fn download(api: &ApiClient, analysis_id: &str, out: Option<PathBuf>) -> Result<ExitCode> {
    let pdf = api.download_report(analysis_id).await?;
    let out = out.unwrap_or_else(|| PathBuf::from(format!("{analysis_id}.pdf")));
    tokio::fs::write(&out, &pdf)
        .await
        .with_context(|| format!("writing {}", out.display()))?;
    println!("Saved {} ({} bytes)", out.display(), pdf.len());
    Ok(ExitCode::SUCCESS)
}

async fn payment(
    config: &ReportSyncConfig,
    api: Arc<ApiClient>,
    store: SessionStore,
    session_id: &str,
) -> Result<ExitCode> {
    let policy = config.payment_policy()?;
    let progress = Arc::new(PollProgress::start("Confirming payment"));
    let (tx, settled) = oneshot::channel::<Outcome<PaymentReceipt>>();
    let updates = progress.clone();
    let callbacks = PollCallbacks::new()
        .on_update(move |u: &PollUpdate<PaymentStatus>| {
            updates.update("Confirming payment", &u.status.payment_status.to_string(), u.attempts_made);
        })
        .on_settled(move |outcome| {
            let _ = tx.send(outcome);
        });

    let handle = policy.track(api, store.clone(), session_id, callbacks)?;
    let hint = "Check `reportsync dashboard` in a moment; your credits will appear once the payment clears.";
    match wait_for(handle, settled).await {
        Some(outcome) => {
            progress.finish(
                &outcome,
                |receipt| match store.available_reports() {
                    Some(available) => format!(
                        "Payment confirmed: {} reports credited, {available} available",
                        receipt.credited_reports
                    ),
                    None => format!(
                        "Payment confirmed: {} reports credited",
                        receipt.credited_reports
                    ),
                },
                hint,
            );
            Ok(exit_code(&outcome))
        }
        None => {
            progress.cancelled();
            Ok(ExitCode::from(130))
        }
    }
}

async fn me<A: ReportsApi>(api: &A, store: &SessionStore) -> Result<ExitCode> {
    let user = store.refresh(api).await?;
    ui::print_snapshot(&user);
    Ok(ExitCode::SUCCESS)
}

async fn dashboard(api: &ApiClient, store: &SessionStore) -> Result<ExitCode> {
    let user = store.refresh(api).await?;
    ui::print_snapshot(&user);
    let analyses = api.list_analyses().await?;
    ui::print_analyses(&analyses);
    Ok(ExitCode::SUCCESS)
}
