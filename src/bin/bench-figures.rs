use std::{path::PathBuf, process::exit};

use anyhow::Result;
use clap::Parser;
use itertools::Itertools;

use bench_figures::{
    config::FigureConfig,
    config_file::{save_config_file, LoadConfigFile, FILE_EXTENSIONS},
    figures::{FigureKind, Figures},
    get_terminal_width::get_terminal_width,
    info,
    ingest::layout::ResultLayout,
    utillib::logging::{set_log_level, LogLevelOpt},
};

#[derive(clap::Parser, Debug)]
#[clap(next_line_help = true)]
#[clap(set_term_width = get_terminal_width(4))]
/// Draw the comparative figures from a directory of benchmark
/// results. Figures are written to `fig/` below the results
/// directory.
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    /// Override the path to the config file (default: the paths
    /// `./bench-figures.*` where a single one exists where the `*` is
    /// one of the supported config file extensions, and if those are
    /// missing, use compiled-in default config values)
    #[clap(long)]
    config: Option<PathBuf>,

    /// The results directory written by the benchmark drivers
    #[clap(long, default_value = "data/result")]
    results: PathBuf,

    /// The subcommand to run. Use `--help` after the sub-command to
    /// get a list of the allowed options there.
    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Insert-only latency over throughput, one figure per database
    InsertOnly,
    /// Single-thread insert-only throughput and latency bars
    SqliteInsert,
    /// YCSB throughput per workload, one figure per database
    Ycsb,
    /// Raw write latency over size
    RawWrite,
    /// Raw read latency over size
    RawRead,
    /// Recovery time split into phases
    Recovery,
    /// All of the figures; a failing figure does not stop the others,
    /// but makes the exit code 1
    All,
    /// Print the aggregated series of a figure as JSON instead of
    /// drawing it
    Summary {
        /// insert-only|sqlite-insert|ycsb|raw-write|raw-read|recovery
        figure: FigureKind,
    },
    /// Show the supported config file extensions
    ConfigFormats,
    /// Save the effective configuration (serialization type
    /// determined by file extension) at the given path
    ConfigSave { path: PathBuf },
}

fn print_config_formats() {
    println!(
        "These configuration file extensions / formats are supported:\n\n  {}\n",
        FILE_EXTENSIONS
            .iter()
            .map(|(ext, backend)| format!("{ext}: {backend:?}"))
            .join("\n  ")
    );
}

fn render_one(figures: &Figures, kind: FigureKind) -> Result<()> {
    for path in figures.render(kind)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        config,
        results,
        subcommand,
    } = Opts::parse();

    set_log_level(log_level.try_into()?);

    // Doesn't need the config
    if let SubCommand::ConfigFormats = &subcommand {
        print_config_formats();
        return Ok(());
    }

    let config = FigureConfig::load_config(config.as_ref(), |msg| {
        info!("no config file ({msg}), using the built-in defaults");
        Ok(FigureConfig::default())
    })?;
    let styles = config.style_registry()?;
    let layout = ResultLayout::new(results);
    let figures = Figures {
        layout: &layout,
        config: &config,
        styles: &styles,
    };

    match subcommand {
        SubCommand::InsertOnly => render_one(&figures, FigureKind::InsertOnly)?,
        SubCommand::SqliteInsert => render_one(&figures, FigureKind::SqliteInsert)?,
        SubCommand::Ycsb => render_one(&figures, FigureKind::Ycsb)?,
        SubCommand::RawWrite => render_one(&figures, FigureKind::RawWrite)?,
        SubCommand::RawRead => render_one(&figures, FigureKind::RawRead)?,
        SubCommand::Recovery => render_one(&figures, FigureKind::Recovery)?,
        SubCommand::All => {
            let mut failed = false;
            for (_kind, res) in figures.render_all() {
                match res {
                    Ok(paths) => {
                        for path in paths {
                            println!("{}", path.display());
                        }
                    }
                    Err(e) => {
                        eprintln!("error: {e:#}");
                        failed = true;
                    }
                }
            }
            if failed {
                exit(1);
            }
        }
        SubCommand::Summary { figure } => {
            let data = figures.data(figure)?;
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        SubCommand::ConfigSave { path } => {
            save_config_file(&path, &config)?;
        }
        SubCommand::ConfigFormats => print_config_formats(),
    }
    Ok(())
}
