//! Timestamped job log on stdout, optionally mirrored to a file.
//!
//! Line format: `YYYY-MM-DD HH:MM:SS\t:: LEVEL ::\tmessage`. Opening the log
//! truncates the file and stamps a `:: START ::` line.

use std::cell::{Cell, RefCell};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;

use storehours_core::{Level, Reporter};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct JobLog {
    file: Option<RefCell<File>>,
    path: Option<PathBuf>,
    echo: bool,
    warnings: Cell<usize>,
}

impl JobLog {
    /// Log to stdout only.
    pub fn stdout() -> Self {
        let log = Self {
            file: None,
            path: None,
            echo: true,
            warnings: Cell::new(0),
        };
        log.start();
        log
    }

    /// Log to stdout and to `path`, truncating it.
    pub fn with_file(path: &Path) -> io::Result<Self> {
        Self::open(path, true)
    }

    fn open(path: &Path, echo: bool) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)?;
        let log = Self {
            file: Some(RefCell::new(file)),
            path: Some(path.to_path_buf()),
            echo,
            warnings: Cell::new(0),
        };
        log.start();
        Ok(log)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Warnings emitted so far.
    pub fn warnings(&self) -> usize {
        self.warnings.get()
    }

    fn start(&self) {
        self.write_line(&format!("{}\t:: START ::", timestamp()));
    }

    fn write_line(&self, line: &str) {
        if self.echo {
            println!("{line}");
        }
        if let Some(file) = &self.file {
            if let Err(err) = writeln!(file.borrow_mut(), "{line}") {
                tracing::warn!("could not append to job log file: {err}");
            }
        }
    }
}

impl Reporter for JobLog {
    fn emit(&self, level: Level, msg: &str) {
        if level == Level::Warning {
            self.warnings.set(self.warnings.get() + 1);
        }
        self.write_line(&format_line(&timestamp(), level, msg));
    }
}

fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_line(timestamp: &str, level: Level, msg: &str) -> String {
    format!("{timestamp}\t:: {level} ::\t{msg}")
}
