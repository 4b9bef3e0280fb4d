use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use filmlog::db::gateway::{self, FrameSort, RollFilter, RollSort};
use filmlog::db::{self, integrity, Store};
use filmlog::transfer::{self, ImportError, TransferPhase};
use filmlog::export;

#[derive(Parser)]
#[command(name = "filmlog", about = "Analog photography logbook", version)]
struct Cli {
    /// Database file to use instead of the default location
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List rolls
    Rolls {
        /// Show archived rolls instead of active ones
        #[arg(long, conflicts_with = "all")]
        archived: bool,
        /// Show every roll regardless of archive state
        #[arg(long)]
        all: bool,
        #[arg(long, value_enum, default_value = "date")]
        sort: RollSortArg,
    },
    /// List the frames of a roll
    Frames {
        roll_id: i64,
        #[arg(long, value_enum, default_value = "count")]
        sort: FrameSortArg,
    },
    /// List cameras, lenses and filters
    Gear,
    /// List film stocks
    Stocks,
    /// Write a roll's CSV and ExifTool exports
    ExportRoll {
        roll_id: i64,
        /// Directory to write into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Copy the whole database to a file
    ExportDb { destination: PathBuf },
    /// Replace the database with another file, keeping a backup
    ImportDb { candidate: PathBuf },
    /// Check the database structure against the expected schema
    Verify,
}

#[derive(Copy, Clone, ValueEnum)]
enum RollSortArg {
    Date,
    Name,
    Camera,
}

#[derive(Copy, Clone, ValueEnum)]
enum FrameSortArg {
    Count,
    Date,
    Aperture,
    Shutter,
    Lens,
}

impl From<RollSortArg> for RollSort {
    fn from(arg: RollSortArg) -> Self {
        match arg {
            RollSortArg::Date => RollSort::Date,
            RollSortArg::Name => RollSort::Name,
            RollSortArg::Camera => RollSort::Camera,
        }
    }
}

impl From<FrameSortArg> for FrameSort {
    fn from(arg: FrameSortArg) -> Self {
        match arg {
            FrameSortArg::Count => FrameSort::Count,
            FrameSortArg::Date => FrameSort::Date,
            FrameSortArg::Aperture => FrameSort::Aperture,
            FrameSortArg::Shutter => FrameSort::Shutter,
            FrameSortArg::Lens => FrameSort::Lens,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => db::default_db_path()?,
    };

    // Verification only inspects; no need to take a writable handle or
    // touch the file's schema version
    if matches!(&cli.command, Command::Verify) {
        let conn = db::open_db_read_only(&db_path)
            .with_context(|| format!("opening database at {}", db_path.display()))?;
        let report = integrity::verify_database(&conn)?;
        if report.is_valid() {
            println!("Database structure OK");
            return Ok(());
        }
        for failure in &report.failures {
            println!("FAIL: {}", failure);
        }
        std::process::exit(1);
    }

    let store = Store::open(&db_path)
        .with_context(|| format!("opening database at {}", db_path.display()))?;

    match cli.command {
        Command::Rolls { archived, all, sort } => {
            let filter = if all {
                RollFilter::All
            } else if archived {
                RollFilter::Archived
            } else {
                RollFilter::Active
            };
            for roll in gateway::list_rolls(store.conn(), filter, sort.into())? {
                let camera = match roll.camera_id {
                    Some(id) => gateway::get_camera(store.conn(), id)?
                        .map(|c| c.name())
                        .unwrap_or_default(),
                    None => String::new(),
                };
                println!(
                    "{:>4}  {:<30} {:<12} {}",
                    roll.id,
                    roll.name.as_deref().unwrap_or("-"),
                    roll.date.as_deref().unwrap_or("-"),
                    camera
                );
            }
        }
        Command::Frames { roll_id, sort } => {
            for frame in gateway::list_frames(store.conn(), roll_id, sort.into())? {
                println!(
                    "{:>3}  {:<18} {:>8} {:>6}  {}",
                    frame.count,
                    frame.date.as_deref().unwrap_or("-"),
                    frame.shutter.as_deref().unwrap_or("-"),
                    frame.aperture.as_deref().unwrap_or("-"),
                    frame.note.as_deref().unwrap_or("")
                );
            }
        }
        Command::Gear => {
            for camera in gateway::list_cameras(store.conn())? {
                println!("camera {:>4}  {}", camera.id, camera.name());
            }
            for lens in gateway::list_lenses(store.conn())? {
                println!("lens   {:>4}  {}", lens.id, lens.name());
            }
            for filter in gateway::list_filters(store.conn())? {
                println!("filter {:>4}  {}", filter.id, filter.name());
            }
        }
        Command::Stocks => {
            for stock in gateway::list_film_stocks(store.conn())? {
                println!(
                    "{:>4}  {:<30} ISO {:<6} {}",
                    stock.id,
                    stock.name(),
                    stock.iso,
                    stock.process.as_db()
                );
            }
        }
        Command::ExportRoll { roll_id, dir } => {
            let (csv_path, cmds_path) = export::write_roll_export(store.conn(), roll_id, &dir)?;
            println!("{}", csv_path.display());
            println!("{}", cmds_path.display());
        }
        Command::ExportDb { destination } => {
            let bytes = transfer::export_database(&store, &destination)?;
            println!("Exported {} bytes to {}", bytes, destination.display());
        }
        Command::ImportDb { candidate } => {
            match transfer::import_database(store, &candidate) {
                Ok(outcome) => match outcome.phase {
                    TransferPhase::Adopted => println!("Imported {}", candidate.display()),
                    _ => {
                        println!(
                            "Import refused, previous database restored: {}",
                            outcome.rejection.unwrap_or_default()
                        );
                        std::process::exit(1);
                    }
                },
                Err(ImportError::Refused { reason, .. }) => {
                    println!("Import refused: {}", reason);
                    std::process::exit(1);
                }
                Err(ImportError::Unrecoverable(err)) => return Err(err.into()),
            }
        }
        Command::Verify => unreachable!("handled before the store is opened"),
    }

    Ok(())
}
