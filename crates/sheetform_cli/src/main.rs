//! Terminal form shell for the SheetForm record table.
//!
//! # Responsibility
//! - Resolve the workbook and log locations, start logging, run the shell.
//! - `sheetform init` grants the `sheet.json` credential and creates the
//!   record table in the workbook.
//!
//! Environment:
//! - `SHEETFORM_WORKBOOK_PATH`: workbook file (default `./sheet.sqlite3`).
//! - `SHEETFORM_LOG_DIR`: absolute log directory (default under temp dir).

mod shell;

use log::error;
use sheetform_core::{
    default_log_dir, default_log_level, init_logging, FormController, RecordService,
    WorkbookClient, DEFAULT_TABLE_TITLE, WORKBOOK_FILE_NAME,
};
use shell::Shell;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let log_dir = env_path("SHEETFORM_LOG_DIR").unwrap_or_else(default_log_dir);
    if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        eprintln!("logging disabled: {err}");
    }

    let workbook = env_path("SHEETFORM_WORKBOOK_PATH")
        .unwrap_or_else(|| PathBuf::from(WORKBOOK_FILE_NAME));
    let client = WorkbookClient::new(workbook);

    match std::env::args().nth(1).as_deref() {
        None => run_shell(client),
        Some("init") => provision(&client),
        Some(other) => {
            eprintln!("unknown argument `{other}`; usage: sheetform [init]");
            ExitCode::FAILURE
        }
    }
}

fn run_shell(client: WorkbookClient) -> ExitCode {
    let form = FormController::new(RecordService::new(client));
    let stdout = std::io::stdout();
    let mut shell = Shell::new(form, stdout.lock());
    match shell.run(std::io::stdin().lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=shell_exit module=cli status=error error={err}");
            eprintln!("shell I/O failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn provision(client: &WorkbookClient) -> ExitCode {
    match client.provision(DEFAULT_TABLE_TITLE) {
        Ok(created) => {
            let verb = if created { "created" } else { "already present" };
            println!(
                "table \"{DEFAULT_TABLE_TITLE}\" {verb} in {}",
                client.workbook_path().display()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=workbook_provision module=cli status=error error={err}");
            eprintln!("init failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    let raw = std::env::var(name).ok()?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}
