mod cache;
mod client;
mod config;
mod error;
mod form;
mod gui;
mod models;
mod presenter;
mod runner;
mod trend;
mod web;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::client::{HttpWifiService, ServiceClient};
use crate::form::ConfigForm;
use crate::runner::SpeedTestRunner;
use crate::web::{start_web_server, AppState};

#[derive(Parser)]
#[command(name = "wifi-speed-booster")]
#[command(about = "WiFi configuration analysis and speed-test trends", long_about = None)]
struct Cli {
    /// Base URL of the analysis service
    #[arg(long, global = true, env = "WIFI_SERVICE_URL", default_value = config::DEFAULT_SERVICE_URL)]
    service_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard
    Serve {
        /// Port for the web dashboard
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Path to store log files
        #[arg(short, long, default_value = "logs")]
        log_dir: PathBuf,

        /// Disable GUI window and use browser only
        #[arg(long, default_value = "false")]
        no_gui: bool,
    },
    /// Analyze a WiFi configuration and print the recommendations
    Analyze {
        /// Network name
        #[arg(long)]
        ssid: String,

        #[arg(long, default_value = config::DEFAULT_CHANNEL)]
        channel: String,

        /// 2400 or 5000
        #[arg(long, default_value = config::DEFAULT_FREQUENCY)]
        frequency: String,

        /// dBm
        #[arg(long, default_value = config::DEFAULT_SIGNAL_STRENGTH, allow_hyphen_values = true)]
        signal_strength: String,

        /// Between 0 and 1
        #[arg(long, default_value = config::DEFAULT_INTERFERENCE_LEVEL)]
        interference_level: String,
    },
    /// Run one simulated speed test and print the updated trend
    SpeedTest,
    /// Print the speed-test trend
    Trend {
        /// Also write the trend view as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// `RUST_LOG` directives when set and valid, otherwise `info`.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn init_logging(log_dir: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok());

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = RollingFileAppender::new(Rotation::HOURLY, dir, "wifi-speed-booster.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stdout))
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            log_dir,
            no_gui,
        } => {
            let _guard = init_logging(Some(log_dir.as_path()))?;

            info!("Starting WiFi Speed Booster");
            info!("Analysis service: {}", cli.service_url);
            info!("Web dashboard: http://localhost:{}", port);

            let state = AppState::new(HttpWifiService::new(&cli.service_url)?);

            if no_gui {
                info!("Running in headless mode. Press Ctrl+C to stop");
                tokio::select! {
                    result = start_web_server(state, port) => result?,
                    _ = tokio::signal::ctrl_c() => info!("Shutting down..."),
                }
                return Ok(());
            }

            // The window's event loop needs the main thread
            std::thread::spawn(move || match tokio::runtime::Runtime::new() {
                Ok(rt) => rt.block_on(async move {
                    if let Err(e) = start_web_server(state, port).await {
                        error!("Web server error: {}", e);
                    }
                }),
                Err(e) => error!("Failed to start web server runtime: {}", e),
            });

            // Give web server time to start
            std::thread::sleep(std::time::Duration::from_secs(1));

            info!("Launching GUI window...");
            gui::launch_gui(port)
        }
        Commands::Analyze {
            ssid,
            channel,
            frequency,
            signal_strength,
            interference_level,
        } => {
            init_logging(None)?;

            let form = ConfigForm {
                ssid,
                channel,
                frequency,
                signal_strength,
                interference_level,
            };
            let wifi_config = form.to_config()?;

            let client = ServiceClient::new(HttpWifiService::new(&cli.service_url)?);
            let recommendation = client
                .analyze(&wifi_config)
                .await
                .context("Analysis failed")?;

            let card = presenter::present(&wifi_config, &recommendation);
            println!("{}", presenter::render_text(&wifi_config, &card));
            Ok(())
        }
        Commands::SpeedTest => {
            init_logging(None)?;

            let client = ServiceClient::new(HttpWifiService::new(&cli.service_url)?);
            let runner = SpeedTestRunner::new(client.clone());

            let mut status = runner.subscribe();
            let progress = tokio::spawn(async move {
                while status.changed().await.is_ok() {
                    let current = status.borrow_and_update().clone();
                    if current.testing {
                        eprint!("\rTesting... {:>3.0}%", current.progress);
                    }
                }
            });

            let result = runner.run_once().await;
            progress.abort();
            eprintln!();

            let Some(result) = result else {
                anyhow::bail!("Speed test failed");
            };
            println!("Download Speed: {:.1} Mbps\n", result.download_speed);

            let samples = client.speed_test_trend().await.context("Failed to load speed trend")?;
            println!("{}", trend::render_text(&trend::build_trend_view(&samples)));
            Ok(())
        }
        Commands::Trend { output } => {
            init_logging(None)?;

            let client = ServiceClient::new(HttpWifiService::new(&cli.service_url)?);
            let samples = client.speed_test_trend().await.context("Failed to load speed trend")?;
            let view = trend::build_trend_view(&samples);

            println!("{}", trend::render_text(&view));
            if let Some(output) = output {
                std::fs::write(&output, serde_json::to_string_pretty(&view)?)?;
                println!("Trend saved to {:?}", output);
            }
            Ok(())
        }
    }
}
