//! JSON-lines alert reader

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Lines};
use std::path::{Path, PathBuf};

use super::alert::{Alert, ParseError};
use super::SourceError;

/// Handle on a JSON-lines alert file
#[derive(Debug, Clone)]
pub struct AlertSource {
    path: PathBuf,
}

impl AlertSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open the file and iterate its alerts from the beginning
    pub fn open(&self) -> Result<AlertLines, SourceError> {
        let file = File::open(&self.path).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SourceError::Missing {
                    path: self.path.clone(),
                }
            } else {
                SourceError::Io {
                    path: self.path.clone(),
                    source: e,
                }
            }
        })?;

        Ok(AlertLines {
            path: self.path.clone(),
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }

    /// First alert with the given id
    pub fn find(&self, id: i64) -> Result<Option<Alert>, SourceError> {
        for alert in self.open()? {
            let alert = alert?;
            if alert.id == id {
                return Ok(Some(alert));
            }
        }
        Ok(None)
    }
}

/// Lazy sequence of parsed alerts; blank lines are skipped
pub struct AlertLines {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
}

impl Iterator for AlertLines {
    type Item = Result<Alert, SourceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(SourceError::Io {
                        path: self.path.clone(),
                        source: e,
                    }))
                }
            };
            self.line_no += 1;

            if line.trim().is_empty() {
                continue;
            }

            return Some(Alert::parse(&line).map_err(|e| match e {
                ParseError::Json(source) => SourceError::Json {
                    path: self.path.clone(),
                    line: self.line_no,
                    source,
                },
                ParseError::Field(source) => SourceError::Field {
                    path: self.path.clone(),
                    line: self.line_no,
                    source,
                },
            }));
        }
    }
}
