//! Process-wide `fern` dispatcher.

use std::path::Path;
use std::str::FromStr;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

#[cfg(target_arch = "wasm32")]
use web_time::Instant;

use anyhow::Context as _;
use log::LevelFilter;

pub const LOG_ENV: &str = "ARVIEW_LOG";

/// GPU crates that log per-frame at `info`.
const NOISY_TARGETS: &[&str] = &["wgpu_core", "wgpu_hal", "naga"];

/// `ARVIEW_LOG` wins over `configured`; unparsable values fall back to info.
pub fn resolve_level(configured: &str, env: Option<&str>) -> LevelFilter {
    let raw = env.unwrap_or(configured);
    LevelFilter::from_str(raw.trim()).unwrap_or(LevelFilter::Info)
}

/// Installs the logger.  Lines look like `[  1.234s INFO  arview_app] text`.
/// Fails if a logger is already installed or `log_file` cannot be opened.
pub fn init(level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let level = resolve_level(level, env.as_deref());
    let started = Instant::now();

    let mut dispatch = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{:>8.3}s {:<5} {}] {}",
                started.elapsed().as_secs_f64(),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level);
    for target in NOISY_TARGETS {
        dispatch = dispatch.level_for(*target, level.min(LevelFilter::Warn));
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        dispatch = dispatch.chain(std::io::stderr());
    }
    #[cfg(target_arch = "wasm32")]
    {
        dispatch = dispatch.chain(fern::Output::call(|record| {
            web_sys::console::log_1(&record.args().to_string().into());
        }));
    }
    if let Some(path) = log_file {
        let file = fern::log_file(path).with_context(|| format!("opening log file {}", path.display()))?;
        dispatch = dispatch.chain(file);
    }

    dispatch.apply().context("installing the logger")?;
    log::debug!("logging at {level}");
    Ok(())
}
