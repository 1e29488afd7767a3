use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};

/// Reads a whole snapshot from a file, or from stdin when the path is "-"
pub struct InputReader {
    reader: Box<dyn Read>,
    is_pipe: bool,
}

impl InputReader {
    /// Create a new InputReader from a path
    /// Use "-" for stdin pipe input
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path = input_path.as_ref();
        let is_pipe = path.as_os_str() == "-";

        let reader: Box<dyn Read> = if is_pipe {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        };

        Ok(Self { reader, is_pipe })
    }

    /// Check if this is pipe input
    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    /// Read all remaining data
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader.read_to_end(&mut data)?;
        Ok(data)
    }
}

/// Opens `path` for writing, or stdout when no path is given
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    })
}
