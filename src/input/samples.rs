use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;

use tracing::{info, warn};

use crate::error::TriageError;
use crate::input::open_maybe_gz;
use crate::model::labels::Label;
use crate::model::scores::ScoreVector;

/// One scored validation sample: the model-runner's per-class scores for an
/// image together with its ground-truth label.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSample {
    pub id: String,
    pub scores: ScoreVector,
    pub actual: Label,
}

const COL_ID: &str = "sample_id";
const COL_NORMAL: &str = "p_normal";
const COL_VIRAL: &str = "p_viral";
const COL_BACTERIAL: &str = "p_bacterial";
const COL_LABEL: &str = "label";

/// Loads a scored validation set from a TSV file (optionally gzipped).
///
/// Expected columns, located by header name: `sample_id`, `p_normal`,
/// `p_viral`, `p_bacterial`, `label`. Empty lines are skipped; duplicate
/// sample ids keep the first occurrence with a warning. Malformed scores or
/// labels reject the whole load: an evaluation over silently patched model
/// output proves nothing.
pub fn load_samples(path: &Path) -> Result<Vec<ScoredSample>, TriageError> {
    let reader = open_maybe_gz(path)?;
    let samples = parse_samples(reader)?;
    info!(
        "loaded {} scored samples from {}",
        samples.len(),
        path.display()
    );
    Ok(samples)
}

pub fn parse_samples(mut reader: impl BufRead) -> Result<Vec<ScoredSample>, TriageError> {
    let mut buf = String::new();

    let read = reader.read_line(&mut buf)?;
    if read == 0 {
        return Err(TriageError::Parse("samples file is empty".to_string()));
    }
    let columns = locate_columns(buf.trim_end())?;

    let mut samples = Vec::new();
    let mut seen = HashSet::new();
    let mut line_no = 1usize;

    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            break;
        }
        line_no += 1;
        let line = buf.trim_end();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let id = field(&fields, columns.id, COL_ID, line_no)?.to_string();
        if !seen.insert(id.clone()) {
            warn!(
                "duplicate sample id; keeping first (line {}, id {})",
                line_no, id
            );
            continue;
        }

        let normal = parse_score(&fields, columns.normal, COL_NORMAL, line_no)?;
        let viral = parse_score(&fields, columns.viral, COL_VIRAL, line_no)?;
        let bacterial = parse_score(&fields, columns.bacterial, COL_BACTERIAL, line_no)?;
        let scores = ScoreVector::new(normal, viral, bacterial).map_err(|e| {
            TriageError::Parse(format!("line {} (sample {}): {}", line_no, id, e))
        })?;

        let raw_label = field(&fields, columns.label, COL_LABEL, line_no)?;
        let actual = Label::parse(raw_label)
            .map_err(|e| TriageError::Parse(format!("line {} (sample {}): {}", line_no, id, e)))?;

        samples.push(ScoredSample { id, scores, actual });
    }

    if samples.is_empty() {
        return Err(TriageError::Parse(
            "samples file has a header but no rows".to_string(),
        ));
    }

    Ok(samples)
}

struct ColumnIndexes {
    id: usize,
    normal: usize,
    viral: usize,
    bacterial: usize,
    label: usize,
}

fn locate_columns(header: &str) -> Result<ColumnIndexes, TriageError> {
    let names: Vec<String> = header
        .split('\t')
        .map(|s| s.trim().to_ascii_lowercase())
        .collect();
    let locate = |wanted: &str| {
        names
            .iter()
            .position(|n| n == wanted)
            .ok_or_else(|| TriageError::Parse(format!("missing column: {}", wanted)))
    };
    Ok(ColumnIndexes {
        id: locate(COL_ID)?,
        normal: locate(COL_NORMAL)?,
        viral: locate(COL_VIRAL)?,
        bacterial: locate(COL_BACTERIAL)?,
        label: locate(COL_LABEL)?,
    })
}

fn field<'a>(
    fields: &[&'a str],
    idx: usize,
    name: &str,
    line_no: usize,
) -> Result<&'a str, TriageError> {
    let value = fields.get(idx).map(|s| s.trim()).unwrap_or("");
    if value.is_empty() {
        return Err(TriageError::Parse(format!(
            "line {}: missing value for {}",
            line_no, name
        )));
    }
    Ok(value)
}

fn parse_score(fields: &[&str], idx: usize, name: &str, line_no: usize) -> Result<f64, TriageError> {
    let raw = field(fields, idx, name, line_no)?;
    raw.parse::<f64>().map_err(|_| {
        TriageError::Parse(format!(
            "line {}: {} value {:?} is not a number",
            line_no, name, raw
        ))
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/samples.rs"]
mod tests;
