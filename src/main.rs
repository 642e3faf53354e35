use anyhow::{Context, Result, anyhow};
use clap::Parser;
use source_mirror::cli::{Args, Command, LinkInput};
use source_mirror::links::{LinkCollection, parse_link_file};
use source_mirror::planner::{self, Plan};
use source_mirror::poller::Poller;
use source_mirror::progress::TerminalView;
use source_mirror::report;
use source_mirror::{CompressionConfig, JobSession, WorkerClient};
use std::sync::Arc;
use std::time::Duration;

fn load_links(input: &LinkInput) -> Result<LinkCollection> {
    if !input.links_file.exists() {
        return Err(anyhow!(
            "Link file not found: {}",
            input.links_file.display()
        ));
    }

    let specs = parse_link_file(&input.links_file)?;
    Ok(LinkCollection::from_specs(specs))
}

fn print_preview(links: &LinkCollection, compression: &CompressionConfig) -> Plan {
    let plan = planner::plan(&links.specs(), compression);

    println!("Final folder preview");
    print!("{}", plan.render_conflicts());
    print!("{}", plan.render_tree());

    plan
}

async fn show_history(client: &WorkerClient) {
    println!("\nRecent mirror history");
    match client.history().await {
        Ok(entries) if !entries.is_empty() => print!("{}", report::render_history(&entries)),
        Ok(_) => println!("No jobs yet"),
        Err(e) => {
            log::warn!("History request failed: {}", e);
            println!("History not available yet");
        }
    }
}

async fn watch(
    client: Arc<WorkerClient>,
    session: JobSession,
    file_names: Vec<String>,
    interval: Duration,
) -> Result<()> {
    println!("Job ID: {}", session.job_id);

    let view = TerminalView::new(&session.job_id, &file_names);
    let mut poller = Poller::new(Arc::clone(&client), interval);
    poller.start(session, file_names, Box::new(view));

    let outcome = poller
        .wait()
        .await
        .ok_or_else(|| anyhow!("Polling stopped before the job completed"))?;

    println!("\nStatus: {}", outcome.status.display_status());
    if let Some(files) = &outcome.status.files {
        print!(
            "{}",
            report::render_results(files, outcome.status.summary.as_ref())
        );
    }

    show_history(&client).await;

    Ok(())
}

/// Rows for a job we did not submit ourselves: its files when the worker
/// already lists them, otherwise a single row for the job.
async fn tracked_names(client: &WorkerClient, session: &JobSession) -> Vec<String> {
    match client.fetch_status(&session.run_id, &session.job_id).await {
        Ok(status) => match status.files {
            Some(files) if !files.is_empty() => files.into_iter().map(|f| f.original).collect(),
            _ => vec![session.job_id.clone()],
        },
        Err(e) => {
            log::debug!("Initial status for run {} failed: {}", session.run_id, e);
            vec![session.job_id.clone()]
        }
    }
}

async fn submit(
    client: Arc<WorkerClient>,
    input: &LinkInput,
    notes: &str,
    interval: Duration,
) -> Result<()> {
    let links = load_links(input)?;
    let compression = input.compression();

    let specs = links.specs();
    if specs.is_empty() {
        return Err(anyhow!("Please add at least one valid link"));
    }

    let plan = print_preview(&links, &compression);
    if plan.has_conflicts() {
        log::warn!("{} conflicting output path(s)", plan.conflicts.len());
    }

    let session = client
        .submit(links.payloads(&compression), notes, compression)
        .await
        .context("Failed to start job")?;

    let file_names = specs
        .iter()
        .map(|spec| planner::file_name_from_url(&spec.url))
        .collect();

    watch(client, session, file_names, interval).await
}

async fn retry(
    client: Arc<WorkerClient>,
    session: JobSession,
    files: Vec<String>,
    interval: Duration,
) -> Result<()> {
    let files = if files.is_empty() {
        let status = client
            .fetch_status(&session.run_id, &session.job_id)
            .await
            .context("Failed to load job status")?;
        report::failed_files(status.files.as_deref().unwrap_or_default())
    } else {
        files
    };

    if files.is_empty() {
        return Err(anyhow!("No failed files to retry for job {}", session.job_id));
    }

    let retried = client
        .retry(&session, files.clone())
        .await
        .context("Failed to retry job")?;

    watch(client, retried, files, interval).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    source_mirror::logger::init_logger(args.log_level.into())
        .context("Failed to initialize logger")?;

    let interval = Duration::from_millis(args.poll_interval_ms.max(1));

    let client = || -> Result<Arc<WorkerClient>> {
        let client = WorkerClient::new(
            args.require_worker()?,
            args.proxy.as_deref(),
            Duration::from_secs(args.timeout),
        )
        .context("Failed to build HTTP client")?;
        Ok(Arc::new(client))
    };

    match &args.command {
        Command::Preview { input } => {
            let links = load_links(input)?;
            print_preview(&links, &input.compression());
        }
        Command::Submit { input, notes } => {
            submit(client()?, input, notes, interval).await?;
        }
        Command::Watch { job_id, run_id } => {
            let client = client()?;
            let session = JobSession {
                job_id: job_id.clone(),
                run_id: run_id.clone(),
            };
            let names = tracked_names(&client, &session).await;
            watch(client, session, names, interval).await?;
        }
        Command::History => {
            let client = client()?;
            show_history(&client).await;
        }
        Command::Retry {
            job_id,
            run_id,
            files,
        } => {
            let session = JobSession {
                job_id: job_id.clone(),
                run_id: run_id.clone(),
            };
            retry(client()?, session, files.clone(), interval).await?;
        }
    }

    Ok(())
}
