use anyhow::Context;
use clap::{ArgAction, Parser};
use console::style;
use domprobe::config::{self, Modules};
use domprobe::dictionary::load_dictionary;
use domprobe::pipeline::{compute_baseline, PipelineContext};
use domprobe::probe::dns::parse_nameservers;
use domprobe::probe::{GeoDatabase, NetworkProber, Prober};
use domprobe::report::{self, OutputFormat, RecordFilter};
use domprobe::{logging, scheduler, tld, Generation, Target};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Parser)]
#[command(name = "domprobe", version)]
#[command(about = "Find look-alike domain names that adversaries can use to attack you: typosquatting, phishing, fraud and brand impersonation")]
struct Cli {
    /// Target domain name or URL
    target: String,

    /// Write the report to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Number of candidates probed in parallel
    #[arg(short, long, default_value_t = config::DEFAULT_CONCURRENCY.to_string(), allow_hyphen_values = true)]
    concurrency: String,

    /// Enable modules (whois, banners, mxcheck, ssdeep, geoip)
    #[arg(short, long, default_value = "")]
    modules: String,

    /// Comma separated list of nameservers to query
    #[arg(long, value_delimiter = ',')]
    nameservers: Vec<String>,

    /// Generate additional candidates from a word list
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Per-probe timeout in milliseconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_MS)]
    timeout: u64,

    /// Public suffix list used to split compound TLDs
    #[arg(long, default_value = config::DEFAULT_TLD_FILE)]
    tld_file: PathBuf,

    /// GeoIP2 country database
    #[arg(long, default_value = config::DEFAULT_GEOIP_FILE)]
    geoip_db: PathBuf,

    /// Show only registered domain names
    #[arg(long, conflicts_with = "unregistered")]
    registered: bool,

    /// Show only domain names that can still be registered
    #[arg(long)]
    unregistered: bool,

    /// More logging, repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn print_info(message: &str) {
    println!("{} {}", style("[*]").green().bold(), message);
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    if let Ok(bar_style) = ProgressStyle::with_template("Running [{bar:50}] {percent}% {eta}") {
        bar.set_style(bar_style.progress_chars("= "));
    }
    bar
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize_logging(cli.verbose);

    let target_url = tld::parse_target(&cli.target)?;
    let host = target_url.host_str().unwrap_or_default().to_string();
    let target = Target::resolve(&host, &cli.tld_file)?;
    debug!(name = %target.name, tld = %target.tld, "Target resolved.");

    let mut generation = Generation::new();
    if let Some(path) = &cli.dictionary {
        match load_dictionary(path) {
            Ok(words) => generation = generation.with_dictionary(words),
            Err(e) => warn!(error = %e, "Dictionary unavailable, skipping."),
        }
    }
    let candidates = generation.candidates(&target);

    let modules = Modules::parse(&cli.modules);
    let enabled = modules.enabled();
    print_info(&format!("Processing {} domain variants", candidates.len()));
    print_info(&format!(
        "Enable modules: {}",
        if enabled.is_empty() { "-".to_string() } else { enabled.join(", ") }
    ));

    let geoip = if modules.geoip {
        Some(GeoDatabase::open(&cli.geoip_db)?)
    } else {
        None
    };

    let stage_timeout = config::stage_timeout(cli.timeout);
    let nameservers = parse_nameservers(&cli.nameservers);
    let prober: Arc<dyn Prober> = Arc::new(
        NetworkProber::new(&nameservers, stage_timeout, geoip).context("Failed to set up network probes")?,
    );

    let baseline = if modules.ssdeep {
        print_info(&format!("Fetching content from: {} ...", target_url));
        compute_baseline(prober.as_ref(), &target_url, stage_timeout).await
    } else {
        None
    };

    let ctx = Arc::new(PipelineContext {
        modules,
        stage_timeout,
        target_url,
        baseline,
        prober,
    });

    let bar = progress_bar(candidates.len());
    let concurrency = config::parse_concurrency(&cli.concurrency);
    let records = scheduler::run(candidates, ctx, concurrency, |_| bar.inc(1)).await;
    bar.finish_and_clear();

    let records = RecordFilter::from_flags(cli.registered, cli.unregistered).apply(records);

    if let Some(path) = &cli.output {
        if let Err(e) = report::write_report(&records, path, cli.format) {
            error!(error = %e, "Report not written.");
            eprintln!("{} {}", style("[!]").red().bold(), e);
        }
    }

    for record in &records {
        println!("{}", report::summary_line(record));
    }

    Ok(())
}
