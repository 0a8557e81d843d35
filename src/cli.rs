use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;

use crate::analysis::client::HttpAnalysisClient;
use crate::analysis::upload::ImageUpload;
use crate::config::{self, AppConfig};
use crate::errors::{ObscuraError, ObscuraResult};
use crate::overlay::types::Size;
use crate::screen::controller::{Overlay, ScreenController};
use crate::screen::state::ScreenState;

#[derive(Parser, Debug)]
#[command(
    name = "obscura",
    version,
    about = "Upload an image for privacy analysis and print where each finding lands on screen"
)]
pub struct Args {
    /// Image to analyze (JPEG, PNG or WebP)
    pub image: PathBuf,

    /// Displayed container size, e.g. 375x500
    #[arg(long, value_parser = parse_size, default_value = "375x500")]
    pub container: Size,

    /// Pixels added around every box (defaults to overlay.padding)
    #[arg(long, allow_negative_numbers = true)]
    pub padding: Option<f64>,

    /// Analysis service base URL, e.g. http://localhost:8080
    #[arg(long)]
    pub api_base: Option<String>,

    /// Explicit config.toml path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct Report<'a> {
    state: &'a ScreenState,
    natural: Size,
    container: Size,
    risk_score: Option<u32>,
    warnings: &'a [String],
    overlays: Vec<Overlay>,
}

pub fn parse_size(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected <W>x<H>, got '{s}'"))?;
    let w: f64 = w.trim().parse().map_err(|e| format!("bad width '{w}': {e}"))?;
    let h: f64 = h.trim().parse().map_err(|e| format!("bad height '{h}': {e}"))?;
    if !(w.is_finite() && h.is_finite()) || w < 0.0 || h < 0.0 {
        return Err(format!("size must be non-negative, got '{s}'"));
    }
    Ok(Size::new(w, h))
}

/// Config file (or defaults) with command-line overrides applied last, then
/// validated as a whole.
fn resolve_config(args: &Args, search: &[PathBuf]) -> ObscuraResult<AppConfig> {
    let mut cfg = match &args.config {
        Some(path) => config::load_config_from(path)?,
        None => config::load_config_or_default(search),
    };
    if let Some(base) = &args.api_base {
        cfg.api.base_url = base.clone();
    }
    if let Some(padding) = args.padding {
        cfg.overlay.padding = padding;
    }
    config::validate(&cfg)?;
    Ok(cfg)
}

pub async fn execute(args: Args) -> ObscuraResult<()> {
    let cfg = resolve_config(&args, &config::search_dirs())?;
    let client = HttpAnalysisClient::from_config(&cfg.api)?;

    let upload = ImageUpload::from_path(&args.image).await?;
    let mut screen = ScreenController::new(cfg.overlay.padding);
    screen.pick_image(upload)?;
    screen.set_container_size(args.container);

    tracing::info!(endpoint = %client.endpoint(), "analyzing");
    screen.analyze(&client).await?;

    let response = screen.response();
    let report = Report {
        state: screen.state(),
        natural: screen.natural_size(),
        container: screen.container_size(),
        risk_score: response.map(|r| r.risk_score),
        warnings: response.map(|r| r.warnings.as_slice()).unwrap_or(&[]),
        overlays: screen.overlays(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    match screen.state().error() {
        Some(err) => Err(ObscuraError::Analysis(err.to_string())),
        None => Ok(()),
    }
}
