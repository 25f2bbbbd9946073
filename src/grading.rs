use std::collections::HashMap;

use crate::models::{CategorySummary, ClassifiedGrade, GradeRow, QualitativeCategory, StyleTag};

/// Maps a score to its qualitative category.
///
/// | Range        | Category |
/// |--------------|----------|
/// | >= 9.00      | DA       |
/// | >= 7.00      | AA       |
/// | >= 4.01      | PA       |
/// | otherwise    | NA       |
///
/// Out-of-range input is classified, never rejected. NaN falls through every
/// comparison and lands in NA.
pub fn classify(score: f64) -> QualitativeCategory {
    match score {
        s if s >= 9.00 => QualitativeCategory::DA,
        s if s >= 7.00 => QualitativeCategory::AA,
        s if s >= 4.01 => QualitativeCategory::PA,
        _ => QualitativeCategory::NA,
    }
}

pub fn style_for(category: QualitativeCategory) -> StyleTag {
    match category {
        QualitativeCategory::DA => StyleTag::Success,
        QualitativeCategory::AA => StyleTag::Info,
        QualitativeCategory::PA => StyleTag::Warning,
        QualitativeCategory::NA => StyleTag::Danger,
    }
}

/// Style for a textual code as it arrives from the backend. Unknown codes
/// render neutral.
pub fn style_for_code(code: &str) -> StyleTag {
    code.parse::<QualitativeCategory>()
        .map(style_for)
        .unwrap_or(StyleTag::Neutral)
}

pub fn format_score(score: f64) -> String {
    if score.is_finite() {
        format!("{score:.2}")
    } else {
        "-".to_string()
    }
}

pub fn classify_rows(rows: &[GradeRow]) -> Vec<ClassifiedGrade> {
    rows.iter()
        .map(|row| {
            let category = classify(row.score);
            ClassifiedGrade {
                student: row.student.clone(),
                subject: row.subject.clone(),
                score: row.score,
                category,
                style: style_for(category),
                recorded_at: row.recorded_at.clone(),
            }
        })
        .collect()
}

/// Counts per category, always all four in DA, AA, PA, NA order.
pub fn summarize_by_category(grades: &[ClassifiedGrade]) -> Vec<CategorySummary> {
    let mut map: HashMap<QualitativeCategory, (usize, f64)> = HashMap::new();

    for grade in grades {
        let entry = map.entry(grade.category).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += grade.score;
    }

    QualitativeCategory::ALL
        .iter()
        .map(|category| {
            let (count, total) = map.get(category).copied().unwrap_or((0, 0.0));
            CategorySummary {
                category: *category,
                count,
                avg_score: if count == 0 {
                    0.0
                } else {
                    total / count as f64
                },
            }
        })
        .collect()
}
