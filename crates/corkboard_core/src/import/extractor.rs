//! Extractor seam: image file in, `ExtractedBoard` out.

use super::ExtractedBoard;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Turns a board image into structured content.
pub trait BoardExtractor {
    fn extract(&self, image: &Path) -> Result<ExtractedBoard, ExtractError>;
}

#[derive(Debug)]
pub enum ExtractError {
    /// External program could not be started.
    Spawn(std::io::Error),
    /// External program exited unsuccessfully.
    Failed { code: Option<i32>, stderr: String },
    /// Standard output is not a valid board document.
    Parse(serde_json::Error),
}

impl Display for ExtractError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "failed to start extractor: {err}"),
            Self::Failed {
                code: Some(code),
                stderr,
            } => write!(f, "extractor exited with code {code}: {stderr}"),
            Self::Failed { code: None, stderr } => {
                write!(f, "extractor terminated by signal: {stderr}")
            }
            Self::Parse(err) => write!(f, "invalid extractor output: {err}"),
        }
    }
}

impl Error for ExtractError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::Failed { .. } => None,
            Self::Parse(err) => Some(err),
        }
    }
}

/// Runs `<program> <args..> -i <image>` and parses its JSON stdout.
#[derive(Debug, Clone)]
pub struct ProcessExtractor {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ProcessExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn command(&self, image: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg("-i").arg(image);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl BoardExtractor for ProcessExtractor {
    fn extract(&self, image: &Path) -> Result<ExtractedBoard, ExtractError> {
        let output = self.command(image).output().map_err(ExtractError::Spawn)?;
        if !output.status.success() {
            warn!(
                "event=board_extract module=import status=error code={:?}",
                output.status.code()
            );
            return Err(ExtractError::Failed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let board: ExtractedBoard =
            serde_json::from_str(stdout.trim()).map_err(ExtractError::Parse)?;
        info!(
            "event=board_extract module=import status=ok lists={} relations={}",
            board.lists.len(),
            board.relations.len()
        );
        Ok(board)
    }
}
