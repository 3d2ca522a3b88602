use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::TriageError;

pub mod samples;

pub use samples::{ScoredSample, load_samples, parse_samples};

/// Opens a text input, transparently decompressing `.gz` files.
pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, TriageError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            TriageError::MissingInput(path.display().to_string())
        } else {
            TriageError::Io(e)
        }
    })?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
