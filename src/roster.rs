use std::io::Read;
use std::path::Path;

use anyhow::Context;

use crate::models::GradeRow;

pub fn load_grades(csv_path: &Path) -> anyhow::Result<Vec<GradeRow>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    read_grades(file).with_context(|| format!("failed to read grades from {}", csv_path.display()))
}

/// Reads `student,subject,score[,recorded_at]` rows. Blank dates become `None`.
pub fn read_grades(reader: impl Read) -> anyhow::Result<Vec<GradeRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<GradeRow>().enumerate() {
        let mut row = result.with_context(|| format!("invalid grade row {}", index + 1))?;
        if row.recorded_at.as_deref().is_some_and(|value| value.is_empty()) {
            row.recorded_at = None;
        }
        rows.push(row);
    }

    Ok(rows)
}
