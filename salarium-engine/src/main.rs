use anyhow::Context;
use salarium_engine::{
    ExportConfig, ExportService, build_report, init_logger_with_file, load_jobs,
    load_name_overrides, load_technicians,
};

const USAGE: &str = "usage: salarium-report <jobs.json> <technicians.json> [scope label] [--names <overrides.json>]";

/// Parsed command line
struct Args {
    jobs: String,
    technicians: String,
    scope: String,
    names: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut names = None;
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        if arg == "--names" {
            names = Some(iter.next().context("--names needs a file path")?);
        } else {
            positional.push(arg);
        }
    }
    let mut positional = positional.into_iter();
    let jobs = positional.next().context(USAGE)?;
    let technicians = positional.next().context(USAGE)?;
    let scope = positional.next().unwrap_or_else(|| "All Records".to_string());
    Ok(Args {
        jobs,
        technicians,
        scope,
        names,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = ExportConfig::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    let args = parse_args()?;
    tracing::info!(scope = %args.scope, environment = %config.environment, "Salarium report starting");

    let jobs = load_jobs(&args.jobs).await?;
    let technicians = load_technicians(&args.technicians).await?;
    let overrides = match &args.names {
        Some(path) => Some(load_name_overrides(path).await?),
        None => None,
    };

    let mut report = build_report(&jobs, &technicians, overrides.as_ref(), &args.scope);
    report.title = config.report_title.clone();

    let service = ExportService::new(config);
    let paths = service
        .export_all(&report)
        .await
        .context("export failed")?;

    for path in &paths {
        println!("{}", path.display());
    }
    tracing::info!(files = paths.len(), jobs = report.totals.job_count, "Export complete");
    Ok(())
}
