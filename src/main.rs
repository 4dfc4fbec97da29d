mod capture;
mod classifier;
mod config;
mod preview;
mod render;
mod verdict;

#[cfg(test)]
mod test_support;

use anyhow::{anyhow, Context, Result};
use capture::{CaptureSource, StillCapture, WebcamCapture};
use clap::Parser;
use classifier::{Classifier, HttpClassifier};
use config::{Args, Config, PreviewConfig, SourceConfig};
use preview::{LoopbackPreview, PreviewSink};
use render::Renderer;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing_subscriber::EnvFilter;
use verdict::{CycleOutcome, VerdictController};

fn main() -> Result<()> {
    // A missing .env is fine, the endpoint can come from the real environment
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("freshcam starting");

    let config = Config::try_from(args).context("Invalid configuration")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match config.source.clone() {
        SourceConfig::Webcam {
            device,
            width,
            height,
        } => runtime.block_on(run(WebcamCapture::new(device, width, height), config)),
        SourceConfig::Still(path) => runtime.block_on(run(StillCapture::new(path), config)),
    }
}

async fn run<S: CaptureSource>(mut source: S, config: Config) -> Result<()> {
    if let Err(e) = source.start() {
        if config.once {
            return Err(e.context("Failed to start capture source"));
        }
        // triggers will report the camera as unavailable until restart
        tracing::warn!("Capture source unavailable: {:#}", e);
    }
    if source.is_active() {
        tracing::info!("Capture source ready");
    }

    let classifier = HttpClassifier::new(config.endpoint.clone(), config.timeout)?;
    let mut controller = VerdictController::new(classifier);
    controller.attach_source(source);

    let result = if config.once {
        run_once(&mut controller).await
    } else {
        run_interactive(&mut controller, config.preview.as_ref()).await
    };

    if let Some(mut source) = controller.detach_source() {
        source.stop();
    }

    tracing::info!("freshcam stopped");
    result
}

async fn run_once<S, K>(controller: &mut VerdictController<S, K>) -> Result<()>
where
    S: CaptureSource,
    K: Classifier,
{
    let outcome = controller.capture_and_classify().await;
    print!("{}", render::render(&controller.state()));

    match outcome {
        CycleOutcome::Classified(_) => Ok(()),
        CycleOutcome::Failed(err) => Err(anyhow!(err)),
        CycleOutcome::Skipped => Err(anyhow!("No classification was run")),
    }
}

async fn run_interactive<S, K>(
    controller: &mut VerdictController<S, K>,
    preview_config: Option<&PreviewConfig>,
) -> Result<()>
where
    S: CaptureSource,
    K: Classifier,
{
    let mut preview = match preview_config {
        Some(cfg) => {
            let sink = LoopbackPreview::new(&cfg.device, cfg.width, cfg.height)
                .context("Failed to initialize preview output")?;
            let (width, height) = sink.resolution();
            tracing::info!("Live preview at {}x{}, {:?} per frame", width, height, cfg.interval);
            Some(sink)
        }
        None => None,
    };
    let interval = preview_config
        .map(|cfg| cfg.interval)
        .unwrap_or(Duration::from_secs(1));
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut renderer = Renderer::stdout();
    let mut states = controller.subscribe();
    renderer.draw(&controller.state())?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    tracing::info!("Press Enter to capture, q or Ctrl+C to stop");

    'main: loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read from stdin")? {
                    None => break 'main,
                    Some(line) if line.trim().eq_ignore_ascii_case("q") => break 'main,
                    Some(_) => {}
                }

                {
                    let cycle = controller.capture_and_classify();
                    tokio::pin!(cycle);

                    loop {
                        tokio::select! {
                            outcome = &mut cycle => {
                                tracing::debug!(?outcome, "Cycle finished");
                                break;
                            }
                            changed = states.changed() => {
                                if changed.is_ok() {
                                    let state = states.borrow_and_update().clone();
                                    renderer.draw(&state)?;
                                }
                            }
                            // the trigger is disabled while a request is in flight
                            line = lines.next_line(), if stdin_open => {
                                match line {
                                    Ok(Some(_)) => tracing::debug!("Ignoring trigger while loading"),
                                    _ => stdin_open = false,
                                }
                            }
                            _ = tokio::signal::ctrl_c() => break 'main,
                        }
                    }
                }

                if !stdin_open {
                    renderer.draw(&controller.state())?;
                    break 'main;
                }
            }
            changed = states.changed() => {
                if changed.is_ok() {
                    let state = states.borrow_and_update().clone();
                    renderer.draw(&state)?;
                }
            }
            _ = ticker.tick(), if preview.is_some() => {
                let frame = controller.source_mut().and_then(|source| source.preview_frame());
                if let (Some(sink), Some(frame)) = (preview.as_mut(), frame) {
                    if let Err(e) = sink.show(&frame) {
                        tracing::warn!("Disabling live preview: {:#}", e);
                        preview = None;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break 'main,
        }
    }

    Ok(())
}
