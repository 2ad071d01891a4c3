use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{error, info};
use simplelog::{Config, LevelFilter, WriteLogger};

use pagelens::content::ElementTag;
use pagelens::panic_handler::initialize_panic_handler;
use pagelens::service::{DocumentService, LocalDocumentService};
use pagelens::settings::{self, Settings};
use pagelens::{Session, SessionConfig};

#[derive(Debug, clap::Parser)]
#[command(author, version, about)]
struct App {
    #[command(subcommand)]
    command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
struct Global {
    /// Directory holding <key>.json page content payloads
    #[clap(long, global = true)]
    dir: Option<PathBuf>,

    /// Base URL of a remote document service
    #[clap(long, global = true)]
    url: Option<String>,

    /// Seconds to wait for the document service
    #[clap(long, global = true)]
    timeout: Option<u64>,

    /// Defaults to pagelens.log in the user's state directory
    #[clap(long, global = true)]
    log_file: Option<PathBuf>,

    /// off, error, warn, info, debug or trace
    #[clap(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, clap::Subcommand)]
enum SubCommands {
    /// List available documents
    List,

    /// Summarize the pages of a document
    Pages { key: String },

    /// Print the session state for a page, or one element's data
    Inspect {
        key: String,
        #[clap(long)]
        page: u32,
        #[clap(long)]
        element: Option<String>,
    },

    /// Render a page with its overlay outlined into a PNG
    Render {
        key: String,
        #[clap(long)]
        page: u32,
        #[clap(long)]
        scale: Option<f32>,
        #[clap(long)]
        out: PathBuf,
    },

    /// Save a page's embedded binary
    Export {
        key: String,
        #[clap(long)]
        page: u32,
        #[clap(long)]
        out_dir: Option<PathBuf>,
    },

    /// Replace the text of a text element and print the edit event
    Edit {
        key: String,
        #[clap(long)]
        page: u32,
        #[clap(long)]
        element: String,
        #[clap(long)]
        text: String,
    },
}

type AppSession = Session<Box<dyn DocumentService>>;

fn main() -> Result<()> {
    initialize_panic_handler();

    let app = App::parse();

    let log_file = app
        .global
        .log_file
        .clone()
        .unwrap_or_else(settings::default_log_path);
    init_logging(&log_file)?;
    info!("Starting pagelens {}", env!("CARGO_PKG_VERSION"));

    settings::load_settings();
    settings::update_settings(|s| apply_overrides(s, &app.global));
    let settings = settings::get_settings();
    apply_log_level(&settings.log_level)?;

    let result = run(app.command, &settings);
    if let Err(err) = &result {
        error!("Command failed: {err:?}");
    }
    result
}

fn apply_overrides(settings: &mut Settings, global: &Global) {
    if let Some(dir) = &global.dir {
        settings.documents_dir = dir.clone();
        // An explicit directory wins over a configured service URL.
        settings.service_url = None;
    }
    if let Some(url) = &global.url {
        settings.service_url = Some(url.clone());
    }
    if let Some(timeout) = global.timeout {
        settings.request_timeout_secs = timeout;
    }
    if let Some(level) = &global.log_level {
        settings.log_level = level.clone();
    }
}

fn init_logging(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("cannot create log file {}", path.display()))?;

    // The configured level is only known once settings are loaded.
    WriteLogger::init(LevelFilter::Trace, Config::default(), file)?;
    Ok(())
}

fn apply_log_level(level: &str) -> Result<()> {
    let level: LevelFilter = level
        .parse()
        .with_context(|| format!("invalid log level '{level}'"))?;
    log::set_max_level(level);
    Ok(())
}

fn document_service(settings: &Settings) -> Result<Box<dyn DocumentService>> {
    match &settings.service_url {
        #[cfg(feature = "remote")]
        Some(url) => {
            let service =
                pagelens::service::HttpDocumentService::new(url, settings.request_timeout())?;
            Ok(Box::new(service))
        }
        #[cfg(not(feature = "remote"))]
        Some(_) => bail!("this build has no remote service support; use --dir"),
        None => Ok(Box::new(LocalDocumentService::new(&settings.documents_dir))),
    }
}

fn new_session(settings: &Settings) -> Result<AppSession> {
    let service = document_service(settings)?;
    let config = SessionConfig {
        render_cache_size: settings.render_cache_size,
        notification_duration: settings.notification_duration(),
    };

    #[cfg(feature = "pdf")]
    let session = Session::new(
        service,
        pagelens::render::MupdfDecoder,
        pagelens::render::MupdfRenderer,
        &config,
    );
    #[cfg(not(feature = "pdf"))]
    let session = Session::new(
        service,
        pagelens::render::NoRasterizer,
        pagelens::render::NoRasterizer,
        &config,
    );

    Ok(session)
}

fn open_at_page(settings: &Settings, key: &str, page: u32) -> Result<AppSession> {
    let mut session = new_session(settings)?;
    session.open_document(key)?;

    if session.viewport().current_page != Some(page) && !session.go_to_page(page) {
        bail!(
            "page {page} is not part of {key} (pages: {:?})",
            session.store().page_numbers()
        );
    }
    Ok(session)
}

fn render_timeout(settings: &Settings) -> Duration {
    settings.request_timeout()
}

fn run(command: SubCommands, settings: &Settings) -> Result<()> {
    match command {
        SubCommands::List => {
            let session = new_session(settings)?;
            for doc in session.list_documents()? {
                println!("{}\t{}", doc.file_name, doc.owner);
            }
        }

        SubCommands::Pages { key } => {
            let mut session = new_session(settings)?;
            session.open_document(&key)?;

            for page in session.store().pages() {
                println!(
                    "page {:>4}  text {:>3}  table {:>3}  cell {:>3}  binary {}",
                    page.page_num,
                    page.element_count(ElementTag::Text),
                    page.element_count(ElementTag::Table),
                    page.element_count(ElementTag::Cell),
                    if page.has_binary() { "yes" } else { "no" }
                );
            }
            for notification in session.notifications().all() {
                eprintln!("{}", notification.message);
            }
        }

        SubCommands::Inspect { key, page, element } => {
            let mut session = open_at_page(settings, &key, page)?;

            if let Some(id) = element {
                session.select(&id)?;
                let selected = session
                    .selected_element()
                    .with_context(|| format!("element {id} vanished"))?;
                println!("{}", serde_json::to_string_pretty(&selected)?);
            } else {
                session.wait_for_render(render_timeout(settings));
                println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
            }
        }

        SubCommands::Render {
            key,
            page,
            scale,
            out,
        } => {
            let mut session = open_at_page(settings, &key, page)?;
            if let Some(scale) = scale {
                session.set_scale(scale);
            }

            if !session.wait_for_render(render_timeout(settings)) {
                bail!("page {page} did not finish rendering");
            }
            if let Some(err) = session.page_error() {
                bail!("{}", err.message());
            }

            let snapshot = session.snapshot();
            let surface = snapshot
                .surface
                .as_deref()
                .context("no rendered surface")?;
            pagelens::render::snapshot::write_png(surface, &snapshot.overlay, None, &out)?;
            println!(
                "{} ({}x{}, zoom {}%)",
                out.display(),
                surface.width_px,
                surface.height_px,
                snapshot.zoom_percent
            );
        }

        SubCommands::Export { key, page, out_dir } => {
            let mut session = open_at_page(settings, &key, page)?;
            let dir = out_dir.unwrap_or_else(|| settings.export_dir.clone());
            let path = session.export_current_page_to(&dir)?;
            println!("{}", path.display());
        }

        SubCommands::Edit {
            key,
            page,
            element,
            text,
        } => {
            let mut session = open_at_page(settings, &key, page)?;
            session.select(&element)?;
            session.begin_edit()?;
            session.commit_edit(&text)?;

            for event in session.take_edit_events() {
                println!("{}", serde_json::to_string(&event)?);
            }
        }
    }

    Ok(())
}
