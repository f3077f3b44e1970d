//! `arview`: the AR model viewer and its local model catalogue.
//!
//! ```text
//! arview view --model builtin:sphere
//! arview upload chair.glb --name Chair --description "Dining chair"
//! arview list
//! arview view --model 3
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use arview_app::{logging, App, ViewerConfig};
use arview_assets::store::{samples, upload};
use arview_assets::{AssetStore, FsAssetStore, ModelId};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "View 3D models over a live camera feed")]
struct Args {
    /// Config file (default: $ARVIEW_CONFIG or ./arview.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the viewer window
    View {
        /// Stored model id, `builtin:<cube|sphere|cone>`, a path or a URL
        #[arg(long)]
        model: Option<String>,
    },
    /// Add a .glb/.gltf/.obj/.fbx file to the catalogue
    Upload {
        file: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List stored models, newest first
    List,
    /// Delete a stored model and its file
    Remove { id: ModelId },
    /// Show how many models are stored and their size on disk
    Info,
    /// Delete every stored model
    Clear {
        /// Required; clearing cannot be undone
        #[arg(long)]
        yes: bool,
    },
    /// Add the demo models to an empty catalogue
    Samples,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = ViewerConfig::load(args.config.as_deref())?;
    logging::init(&config.log_level, config.log_file.as_deref())?;

    let cmd = args.cmd.unwrap_or(Command::View { model: None });
    if let Command::View { model } = cmd {
        return view(config, model);
    }

    let root = config.store_root();
    let store = FsAssetStore::open(&root)
        .with_context(|| format!("opening model store at {}", root.display()))?;
    let mut out = std::io::stdout().lock();
    run_store_command(&store, cmd, &mut out)
}

fn view(config: ViewerConfig, model: Option<String>) -> Result<()> {
    let mut app = App::new(config);
    if let Some(model) = model {
        let reference = resolve_model(&app.config().store_root(), &model)?;
        app = app.with_initial_model(reference);
    }
    app.run()
}

/// A bare number names a stored record; anything else is a reference.
fn resolve_model(store_root: &Path, model: &str) -> Result<String> {
    let Ok(id) = model.parse::<ModelId>() else {
        return Ok(model.to_string());
    };
    let store = FsAssetStore::open(store_root)?;
    match store.get(id)? {
        Some(record) if record.is_pending() => bail!("model {id} has no file yet"),
        Some(record) => Ok(record.file_reference),
        None => bail!("no model with id {id}"),
    }
}

fn run_store_command(store: &dyn AssetStore, cmd: Command, out: &mut impl Write) -> Result<()> {
    match cmd {
        Command::View { .. } => bail!("`view` does not operate on the catalogue"),
        Command::Upload {
            file,
            name,
            description,
        } => {
            let record = upload::upload_file(store, &file, &name, description)
                .with_context(|| format!("uploading {}", file.display()))?;
            writeln!(out, "stored '{}' as model {} ({})", record.name, record.id, record.display_size())?;
        }
        Command::List => {
            let records = store.list()?;
            if records.is_empty() {
                writeln!(out, "no models stored (try `arview samples`)")?;
            }
            for r in records {
                writeln!(
                    out,
                    "{:>4}  {:<24} {:>10}  {}  {}",
                    r.id,
                    r.name,
                    r.display_size(),
                    r.updated_at.date(),
                    if r.is_pending() { "(pending)" } else { r.file_reference.as_str() }
                )?;
            }
        }
        Command::Remove { id } => {
            if !store.delete(id)? {
                bail!("no model with id {id}");
            }
            writeln!(out, "removed model {id}")?;
        }
        Command::Info => {
            let info = store.info()?;
            writeln!(out, "{} models, {}", info.model_count, info.display_size())?;
        }
        Command::Clear { yes } => {
            if !yes {
                bail!("refusing to clear the catalogue without --yes");
            }
            store.clear()?;
            writeln!(out, "catalogue cleared")?;
        }
        Command::Samples => {
            let added = samples::seed_samples(store)?;
            if added == 0 {
                writeln!(out, "catalogue is not empty; no samples added")?;
            } else {
                writeln!(out, "added {added} sample models")?;
            }
        }
    }
    Ok(())
}
