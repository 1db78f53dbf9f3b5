use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use library_acceptance::artifact::{ArtifactStore, DirectoryStore};
use library_acceptance::config::{self, Config};
use library_acceptance::driver::{DriverAdapter, WebDriverAdapter, WebDriverConfig};
use library_acceptance::library::{self, SimulatedLibrary};
use library_acceptance::report::{self, SuiteProgress, SuiteReport};
use library_acceptance::{
    Credentials, HarnessError, HarnessResult, ScenarioRunner, SessionOptions, SuiteDefinition, TemplateVars, WaitPolicy,
    logging,
};

/// Library Acceptance - browser-driven acceptance tests for the Digital Library
#[derive(Parser, Debug)]
#[command(
    name = "library-acceptance",
    about = "Acceptance scenarios for the Digital Library, driven through a WebDriver browser",
    after_help = "ENVIRONMENT VARIABLES:\n\
        LIBRARY_ACCEPTANCE_BASE_URL          Application under test\n\
        LIBRARY_ACCEPTANCE_WEBDRIVER_URL     WebDriver endpoint\n\
        LIBRARY_ACCEPTANCE_EMAIL             Login email\n\
        LIBRARY_ACCEPTANCE_PASSWORD          Login password\n\
        LIBRARY_ACCEPTANCE_EXPLICIT_WAIT_MS  Budget for one explicit wait\n\
        LIBRARY_ACCEPTANCE_RUN_BUDGET_SECS   Hard limit for a whole run\n\
        LIBRARY_ACCEPTANCE_ARTIFACT_DIR      Where failure screenshots go"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a suite against the application
    Run(RunArgs),

    /// List the scenarios of a suite
    List {
        /// Suite definition (JSON); the built-in suite when omitted
        #[arg(short, long)]
        suite: Option<PathBuf>,

        /// Only scenarios carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Print the built-in suite as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Application under test
    #[arg(long, env = "LIBRARY_ACCEPTANCE_BASE_URL")]
    base_url: Option<String>,

    /// WebDriver endpoint (chromedriver, geckodriver, selenium)
    #[arg(long, env = "LIBRARY_ACCEPTANCE_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// Suite definition (JSON); the built-in suite when omitted
    #[arg(short, long)]
    suite: Option<PathBuf>,

    /// Run only the named scenarios (repeatable)
    #[arg(long)]
    only: Vec<String>,

    /// Run only scenarios carrying this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Write the full report as JSON
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Directory for failure screenshots
    #[arg(long, env = "LIBRARY_ACCEPTANCE_ARTIFACT_DIR")]
    artifacts: Option<PathBuf>,

    /// Do not capture screenshots of failed scenarios
    #[arg(long)]
    no_screenshots: bool,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Browser size: mobile, tablet, laptop, desktop, or WxH (e.g., 1280x800)
    #[arg(long, short = 'w', env = "LIBRARY_ACCEPTANCE_WINDOW_SIZE")]
    window_size: Option<String>,

    /// Skip the HTTP reachability check of the base URL
    #[arg(long)]
    no_probe: bool,

    /// Run against a simulated Digital Library instead of a browser
    #[arg(long)]
    simulate: bool,

    /// Debug logging (RUST_LOG still wins)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run(args)) => run(args),

        Some(Commands::List { suite, tag }) => {
            let suite = load_suite(suite.as_ref())?.filter(&[], tag.as_deref());
            println!("Suite: {} ({} scenarios)", suite.name, suite.len());
            for (i, scenario) in suite.scenarios.iter().enumerate() {
                let login = if scenario.requires_login { " [login]" } else { "" };
                let tags = if scenario.tags.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", scenario.tags.join(", "))
                };
                println!("  {:>2}. {}{}{}", i + 1, scenario.name, login, tags);
                if !scenario.description.is_empty() {
                    println!("      {}", scenario.description);
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Some(Commands::Export { output }) => {
            let json = library::suite().to_json()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Wrote {}", path.display());
                }
                None => println!("{}", json),
            }
            Ok(ExitCode::SUCCESS)
        }

        None => {
            println!("Library Acceptance - browser-driven acceptance tests for the Digital Library");
            println!();
            println!("Usage: library-acceptance <COMMAND>");
            println!();
            println!("Commands:");
            println!("  run     Run a suite against the application");
            println!("  list    List the scenarios of a suite");
            println!("  export  Print the built-in suite as JSON");
            println!();
            println!("Run with --help for more information.");
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run(args: RunArgs) -> Result<ExitCode, Box<dyn Error>> {
    logging::init(args.verbose);

    let mut cfg = Config::from_env();
    if let Some(url) = args.base_url {
        cfg.target.base_url = url;
    }
    if let Some(url) = args.webdriver_url {
        cfg.target.webdriver_url = url;
    }
    if let Some(size) = args.window_size {
        cfg.browser.window = config::parse_window_size(&size).ok_or_else(|| {
            HarnessError::InvalidConfig(format!(
                "window size '{}' (use mobile, tablet, laptop, desktop, or WxH)",
                size
            ))
        })?;
        cfg.browser.window_size = size;
    }
    if let Some(dir) = &args.artifacts {
        cfg.artifacts.dir = dir.display().to_string();
    }
    if args.headed {
        cfg.browser.headless = false;
    }
    if args.no_probe {
        cfg.target.probe = false;
    }

    let suite = load_suite(args.suite.as_ref())?.filter(&args.only, args.tag.as_deref());
    if suite.is_empty() {
        return Err("no scenarios selected".into());
    }

    let credentials = Credentials::from(&cfg.credentials);
    let vars = TemplateVars::new(&credentials, &cfg.target.base_url);
    let store: Box<dyn ArtifactStore> = Box::new(DirectoryStore::new(&cfg.artifacts.dir));
    let mut runner = ScenarioRunner::new(library::auth_flow(), credentials.clone(), vars)
        .with_artifacts(store)
        .capture_failures(!args.no_screenshots);

    tracing::info!(
        suite = %suite.name,
        base_url = %cfg.target.base_url,
        simulate = args.simulate,
        "starting run"
    );

    let outcome = if args.simulate {
        run_simulated(&cfg, &suite, credentials, &mut runner)
    } else {
        run_browser(&cfg, &suite, &mut runner)
    };

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "run could not start");
            eprintln!("Setup failed: {}", e);
            return Ok(ExitCode::from(1));
        }
    };

    println!();
    println!("{}", report.summary());

    if let Some(path) = &args.json_report {
        report.write_json(path)?;
        println!("Report: {}", path.display());
    }

    Ok(ExitCode::from(report.exit_code()))
}

fn run_browser(cfg: &Config, suite: &SuiteDefinition, runner: &mut ScenarioRunner) -> HarnessResult<SuiteReport> {
    let driver_config = WebDriverConfig::new(&cfg.target.webdriver_url)
        .headless(cfg.browser.headless)
        .window(cfg.browser.window);

    report::run(
        &suite.name,
        &suite.scenarios,
        SessionOptions::from_config(cfg),
        || WebDriverAdapter::connect(&driver_config).map(|d| Box::new(d) as Box<dyn DriverAdapter>),
        runner,
        print_progress,
    )
}

fn run_simulated(
    cfg: &Config,
    suite: &SuiteDefinition,
    credentials: Credentials,
    runner: &mut ScenarioRunner,
) -> HarnessResult<SuiteReport> {
    let base_url = cfg.target.base_url.clone();
    let app = SimulatedLibrary::new(credentials);
    let options = SessionOptions::new(&base_url)
        .policy(WaitPolicy::new(
            Duration::from_millis(1000),
            Duration::from_millis(50),
            Duration::ZERO,
        ))
        .settle(Duration::ZERO)
        .run_budget(Duration::from_secs(cfg.waits.run_budget_secs))
        .window(cfg.browser.window);

    report::run(
        &suite.name,
        &suite.scenarios,
        options,
        move || Ok(Box::new(app.driver(&base_url)) as Box<dyn DriverAdapter>),
        runner,
        print_progress,
    )
}

fn load_suite(path: Option<&PathBuf>) -> HarnessResult<SuiteDefinition> {
    match path {
        Some(path) => SuiteDefinition::load(path),
        None => Ok(library::suite()),
    }
}

fn print_progress(progress: SuiteProgress) {
    match progress {
        SuiteProgress::Started { total } => println!("Running {} scenarios", total),
        SuiteProgress::ScenarioStarted { index, total, name } => {
            print!("[{}/{}] {} ... ", index, total, name);
            let _ = std::io::stdout().flush();
        }
        SuiteProgress::ScenarioFinished { result, .. } => {
            println!("{} ({} ms)", result.outcome, result.elapsed_ms);
        }
        SuiteProgress::Finished => {}
    }
}
