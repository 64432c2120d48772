use clap::{Parser, Subcommand, ValueEnum};
use dive_qr::catalog::{CatalogError, CatalogKind};
use dive_qr::config::{self, CONFIG_FILE_NAME};
use dive_qr::imaging::QrcodeBackend;
use dive_qr::output;
use dive_qr::session::{BuddyUpdate, Session, SessionError, SessionOptions};
use dive_qr::settings::SettingsError;
use dive_qr::sites::DEFAULT_SITES_DIR;
use dive_qr::source::{self, DEFAULT_DB_DIR};
use dive_qr::types::{DiveId, DiveSettings};
use log::warn;
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "dive-qr")]
#[command(about = "Turn dive log records into scannable QR codes")]
#[command(long_about = "\
Turn dive log records into scannable QR codes

Each dive in a dive computer logbook becomes one QR code carrying the dive
time, date, depth, site, entry type, and your buddy's identity.

Layout (defaults, relative to the working directory):

  config.toml                      # Buddy identity and defaults
  ssi_dive_sites/                  # One JSON document per region
  │   ├── malta.json
  │   └── red_sea.json
  shearwater_databases/            # Logbooks; the newest is opened
      ├── logbook.db
      ├── ssi_dives_qr_codes/      # Generated codes land here
      └── ssi_validations_qr_codes/  # Codes supplied by others

Run 'dive-qr gen-config' to print a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = CONFIG_FILE_NAME, global = true)]
    config: PathBuf,

    /// Directory of region documents
    #[arg(long, default_value = DEFAULT_SITES_DIR, global = true)]
    sites_dir: PathBuf,

    /// Directory of logbook databases
    #[arg(long, default_value = DEFAULT_DB_DIR, global = true)]
    db_dir: PathBuf,

    /// Open this logbook instead of the newest one
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Activate this region instead of the first one
    #[arg(long, global = true)]
    region: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List regions, marking the active one
    Regions,
    /// List dive sites of the active region
    Sites,
    /// List logbooks, newest first
    Databases,
    /// Show the dives of the open logbook with their settings
    Dives,
    /// Generate QR codes for selected dives
    Generate(GenerateArgs),
    /// Show an entry of a QR catalog
    Show(ShowArgs),
    /// Delete every previously generated QR code
    Cleanup {
        /// Actually delete; without this only the files are listed
        #[arg(long)]
        yes: bool,
    },
    /// Show or change the buddy written into every code
    Buddy(BuddyArgs),
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Dive id to include (repeatable)
    #[arg(long = "dive", value_name = "ID")]
    dives: Vec<String>,

    /// Include every dive in the logbook
    #[arg(long, conflicts_with = "dives")]
    all: bool,

    /// Site label to apply to the selection first, e.g. "Reef (42)"
    #[arg(long)]
    site: Option<String>,

    /// Entry type label to apply to the selection first, e.g. "Shore (21)"
    #[arg(long)]
    entry: Option<String>,

    /// Delete every existing code in the output directory first
    #[arg(long)]
    overwrite: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum CatalogArg {
    Generated,
    Existing,
    Validations,
}

impl From<CatalogArg> for CatalogKind {
    fn from(arg: CatalogArg) -> Self {
        match arg {
            CatalogArg::Generated => CatalogKind::Generated,
            CatalogArg::Existing => CatalogKind::ExistingOnDisk,
            CatalogArg::Validations => CatalogKind::Validation,
        }
    }
}

#[derive(clap::Args)]
struct ShowArgs {
    #[arg(value_enum)]
    catalog: CatalogArg,

    /// 1-based entry to show
    #[arg(long)]
    index: Option<usize>,

    /// Validation file to load and show
    #[arg(long)]
    file: Option<String>,
}

#[derive(clap::Args)]
struct BuddyArgs {
    #[arg(long)]
    first: Option<String>,
    #[arg(long)]
    last: Option<String>,
    /// Buddy's master id
    #[arg(long)]
    id: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let options = SessionOptions {
        config_path: cli.config,
        sites_dir: cli.sites_dir,
        db_dir: cli.db_dir,
        db: cli.db,
        region: cli.region,
    };
    let mut session = Session::open(options, QrcodeBackend::new())?;

    match cli.command {
        Command::Regions => {
            output::print_lines(&output::format_regions(
                session.regions(),
                session.active_region(),
            ));
        }
        Command::Sites => {
            output::print_lines(&output::format_sites(
                session.sites(),
                session.active_region(),
            ));
        }
        Command::Databases => {
            let databases = source::discover_databases(session.db_dir())?;
            output::print_lines(&output::format_databases(&databases, session.db_path()));
        }
        Command::Dives => {
            if let Some(db) = session.db_path() {
                println!("Loaded {} dives from {}", session.dives().len(), db.display());
            }
            output::print_dive_table(session.dives(), session.settings());
        }
        Command::Generate(args) => run_generate(&mut session, args)?,
        Command::Show(args) => run_show(&mut session, args),
        Command::Cleanup { yes } => {
            if yes {
                output::print_cleanup_report(&session.cleanup());
            } else {
                let existing = session.catalogs().catalog(CatalogKind::ExistingOnDisk);
                output::print_lines(&output::format_cleanup_preview(existing.entries()));
            }
        }
        Command::Buddy(args) => {
            let update = BuddyUpdate {
                firstname: args.first,
                lastname: args.last,
                master_id: args.id,
            };
            let buddy = if update.is_empty() {
                session.config().buddy.clone()
            } else {
                session.update_buddy(update)?.clone()
            };
            println!("Buddy: {} {} ({})", buddy.firstname, buddy.lastname, buddy.master_id);
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_generate(
    session: &mut Session<QrcodeBackend>,
    args: GenerateArgs,
) -> Result<(), SessionError> {
    let ids: Vec<DiveId> = if args.all {
        session.dive_ids()
    } else {
        args.dives.into_iter().map(DiveId::new).collect()
    };

    if args.site.is_some() || args.entry.is_some() {
        let defaults = session.settings().defaults().clone();
        let settings = DiveSettings::with_entry_label(
            args.site.unwrap_or(defaults.site),
            args.entry.unwrap_or(defaults.entry_label),
        );
        match session.apply_settings(&ids, &settings) {
            Ok(n) => println!("Applied settings to {n} dive(s)"),
            Err(SessionError::Settings(SettingsError::NoSelection)) => {
                warn!("Please select at least one dive");
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }

    match session.generate(&ids, args.overwrite) {
        Ok(report) => {
            output::print_generate_report(&report);
            print_current(session, CatalogKind::Generated);
            Ok(())
        }
        Err(SessionError::Catalog(CatalogError::NothingSelected)) => {
            warn!("Please select at least one dive");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn run_show(session: &mut Session<QrcodeBackend>, args: ShowArgs) {
    let kind = CatalogKind::from(args.catalog);
    session.switch_mode(kind);

    if kind == CatalogKind::Validation {
        let catalogs = session.catalogs();
        output::print_lines(&output::format_validation_files(
            catalogs.validation_files(),
            catalogs.selected_validation(),
        ));
        if let Some(file) = &args.file {
            if session.select_validation(file).is_none() {
                warn!("Could not load validation QR code {file}");
            }
        }
    }
    if let Some(index) = args.index {
        session.catalogs_mut().seek(index.saturating_sub(1));
    }
    print_current(session, kind);
}

fn print_current(session: &Session<QrcodeBackend>, kind: CatalogKind) {
    let catalog = session.catalogs().catalog(kind);
    output::print_catalog_entry(
        kind,
        catalog.cursor(),
        catalog.len(),
        catalog.current(),
        catalog.nav(),
    );
}
