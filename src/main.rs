use std::path::PathBuf;

use model_gallery::{
    app::{self, StartMode},
    config::GalleryConfig,
};

const HELP: &str = "\
model-gallery

USAGE:
  model-gallery [--config PATH] [--cube] [--once DIR]

OPTIONS:
  --config PATH   configuration file (default: ./gallery.toml if present)
  --cube          show a single rotating cube instead of the model records
  --once DIR      render one frame headless, save a screenshot into DIR and exit
  -h, --help      print this help
";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        print!("{HELP}");
        return Ok(());
    }
    let config_path: Option<PathBuf> = args.opt_value_from_str("--config")?;
    let mode = if args.contains("--cube") {
        StartMode::Cube
    } else {
        StartMode::Gallery
    };
    let once: Option<PathBuf> = args.opt_value_from_str("--once")?;
    let rest = args.finish();
    if !rest.is_empty() {
        log::warn!("Ignoring unknown arguments: {rest:?}");
    }

    let config = GalleryConfig::load(config_path.as_deref())?;
    match once {
        Some(dir) => {
            let path = app::run_once(config, mode, dir)?;
            log::info!("Wrote {}", path.display());
            Ok(())
        }
        None => app::run(config, mode),
    }
}
