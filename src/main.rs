use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::Report;
use envload::app::App;
use envload::command::{Command, parse_command};
use envload::config::{Config, load_config};
use envload::event::{Event, EventHandler};
use envload::logging::init_tracing;
use envload::render::OutputMode;
use envload::system::provider::SysinfoProvider;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "envload",
    about = "Generate CPU and memory load and watch the host's usage"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// CPU intensity in percent (0-100)
    #[arg(long)]
    cpu: Option<i64>,

    /// RAM intensity in percent of the memory budget (0-100)
    #[arg(long)]
    ram: Option<i64>,

    /// Start generating load immediately instead of only monitoring.
    #[arg(long, default_value_t = false)]
    start: bool,

    /// Stop and exit after this many seconds.
    #[arg(long)]
    duration: Option<u64>,

    /// Sampling interval in milliseconds
    #[arg(long)]
    sample_interval_ms: Option<u64>,

    /// CPU metric: synthetic, measured
    #[arg(long)]
    cpu_metric: Option<String>,

    /// Number of CPUs to load at 100% (0 = all available)
    #[arg(long)]
    threads: Option<usize>,

    /// Print updates as JSON lines.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let (config, config_error) = load_config_for_cli(&cli);
    init_tracing(&config.logging)?;
    if let Some(err) = config_error {
        warn!(error = %format!("{err:#}"), "falling back to default config");
    }

    let mut app = App::new(&config, SysinfoProvider::new());
    if cli.start
        && let Some(reply) = app.dispatch(Command::Start)
    {
        println!("{reply}");
    }

    let result = run(&mut app, &config, cli.duration.map(Duration::from_secs)).await;
    app.shutdown();
    result
}

async fn run(app: &mut App, config: &Config, duration: Option<Duration>) -> Result<()> {
    let tick_rate = Duration::from_millis(config.general.sample_interval_ms.max(1));
    let output = OutputMode::from_str_config(&config.general.output);
    let mut events = EventHandler::with_stdin(tick_rate);
    let mut updates = app.listen();

    let deadline = async {
        match duration {
            Some(d) => tokio::time::sleep(d).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    while app.running {
        tokio::select! {
            maybe_event = events.next() => {
                let Some(event) = maybe_event else {
                    break;
                };
                match event {
                    Event::Tick => {
                        app.refresh_data();
                    }
                    Event::Input(line) => match parse_command(&line) {
                        Ok(Some(command)) => {
                            if let Some(reply) = app.dispatch(command) {
                                println!("{reply}");
                            }
                        }
                        Ok(None) => {}
                        Err(err) => println!("{err}"),
                    },
                    Event::InputClosed => info!("input closed, running until interrupted"),
                }
            }
            Some(update) = updates.next() => {
                println!("{}", output.render(&update)?);
            }
            _ = &mut deadline => {
                info!("duration elapsed");
                break;
            }
            _ = &mut interrupt => {
                info!("interrupted");
                break;
            }
        }
    }

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> (Config, Option<Report>) {
    let (mut config, error) = load_config(cli.config.as_deref());

    if let Some(cpu) = cli.cpu {
        config.load.cpu_intensity = cpu;
    }
    if let Some(ram) = cli.ram {
        config.load.ram_intensity = ram;
    }
    if let Some(rate) = cli.sample_interval_ms {
        config.general.sample_interval_ms = rate;
    }
    if let Some(ref metric) = cli.cpu_metric {
        config.general.cpu_metric = metric.clone();
    }
    if let Some(threads) = cli.threads {
        config.load.threads = threads;
    }
    if cli.json {
        config.general.output = "json".to_string();
    }

    (config, error)
}
