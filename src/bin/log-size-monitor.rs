use std::{
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use bench_figures::{
    get_terminal_width::get_terminal_width,
    info,
    monitor::{draw_record, monitor, MonitorRecord, POLL_INTERVAL},
    render::CanvasSize,
    utillib::logging::{set_log_level, LogLevelOpt},
};

#[derive(clap::Parser, Debug)]
#[clap(next_line_help = true)]
#[clap(set_term_width = get_terminal_width(4))]
/// Record the sizes of the (write-ahead) log files in a directory
/// while a benchmark runs, and chart them.
struct Opts {
    #[clap(flatten)]
    log_level: LogLevelOpt,

    #[clap(subcommand)]
    subcommand: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Poll the sizes of the files in `dir` every 100 ms until
    /// interrupted (Ctrl-C), then save them as YAML to `output`
    Mon { dir: PathBuf, output: PathBuf },
    /// Chart a record saved by `mon` as SVG
    Draw { record: PathBuf, output: PathBuf },
}

static STOP: AtomicBool = AtomicBool::new(false);

extern "C" fn handle_sigint(_: nix::libc::c_int) {
    STOP.store(true, Ordering::Relaxed);
}

fn install_sigint_handler() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(handle_sigint),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // Safe: the handler only stores to an atomic.
    unsafe { sigaction(Signal::SIGINT, &action) }
        .with_context(|| anyhow!("installing SIGINT handler"))?;
    Ok(())
}

fn main() -> Result<()> {
    let Opts {
        log_level,
        subcommand,
    } = Opts::parse();

    set_log_level(log_level.try_into()?);

    match subcommand {
        SubCommand::Mon { dir, output } => {
            install_sigint_handler()?;
            info!("monitoring {dir:?}, stop with Ctrl-C");
            let record = monitor(&dir, &STOP, POLL_INTERVAL);
            record.save(&output)?;
            info!("saved {} logs to {output:?}", record.0.len());
        }
        SubCommand::Draw { record, output } => {
            let r = MonitorRecord::load(&record)?;
            draw_record(&r, &output, CanvasSize::new(640, 480))?;
        }
    }
    Ok(())
}
