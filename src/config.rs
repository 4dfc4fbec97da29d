use anyhow::{bail, Context, Result};
use clap::Parser;
use reqwest::Url;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Classification endpoint URL
    #[arg(long, env = "FRESHCAM_API_URL")]
    pub api_url: String,

    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    pub input_device: u32,

    /// Capture resolution width
    #[arg(long, default_value_t = 1280)]
    pub capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 720)]
    pub capture_height: u32,

    /// Classify this image file instead of reading the webcam
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// v4l2loopback device to stream the live preview to
    #[arg(long)]
    pub preview_device: Option<PathBuf>,

    /// Preview resolution width
    #[arg(long, default_value_t = 640)]
    pub preview_width: u32,

    /// Preview resolution height
    #[arg(long, default_value_t = 480)]
    pub preview_height: u32,

    /// Preview frames per second
    #[arg(long, default_value_t = 15)]
    pub preview_fps: u32,

    /// Give up on the classification request after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Run a single capture, print the verdict and exit
    #[arg(long)]
    pub once: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub device: PathBuf,
    pub width: u32,
    pub height: u32,
    pub interval: Duration,
}

/// Where frames come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceConfig {
    Webcam { device: u32, width: u32, height: u32 },
    Still(PathBuf),
}

/// Settings resolved once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: Url,
    pub timeout: Option<Duration>,
    pub source: SourceConfig,
    pub preview: Option<PreviewConfig>,
    pub once: bool,
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        let endpoint = parse_endpoint(&args.api_url)?;

        let source = match args.image {
            Some(path) => SourceConfig::Still(path),
            None => SourceConfig::Webcam {
                device: args.input_device,
                width: args.capture_width,
                height: args.capture_height,
            },
        };

        let preview = match args.preview_device {
            Some(device) => {
                if args.preview_fps == 0 {
                    bail!("--preview-fps must be at least 1");
                }
                Some(PreviewConfig {
                    device,
                    width: args.preview_width,
                    height: args.preview_height,
                    interval: Duration::from_secs(1) / args.preview_fps,
                })
            }
            None => None,
        };

        Ok(Self {
            endpoint,
            timeout: args.timeout_secs.map(Duration::from_secs),
            source,
            preview,
            once: args.once,
        })
    }
}

/// Parse the endpoint, accepting only absolute http(s) URLs
pub fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .with_context(|| format!("Invalid classification endpoint URL: {}", raw))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("Classification endpoint must use http or https, got {}", other),
    }
}
