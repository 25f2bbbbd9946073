use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use uuid::Uuid;

/// Qualitative grade scale used on report cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QualitativeCategory {
    /// Domina los aprendizajes.
    DA,
    /// Alcanza los aprendizajes.
    AA,
    /// Próximo a alcanzar los aprendizajes.
    PA,
    /// No alcanza los aprendizajes.
    NA,
}

impl QualitativeCategory {
    /// Highest to lowest, the order thresholds are evaluated in.
    pub const ALL: [QualitativeCategory; 4] = [
        QualitativeCategory::DA,
        QualitativeCategory::AA,
        QualitativeCategory::PA,
        QualitativeCategory::NA,
    ];

    pub fn code(self) -> &'static str {
        match self {
            QualitativeCategory::DA => "DA",
            QualitativeCategory::AA => "AA",
            QualitativeCategory::PA => "PA",
            QualitativeCategory::NA => "NA",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            QualitativeCategory::DA => "Domina los aprendizajes",
            QualitativeCategory::AA => "Alcanza los aprendizajes",
            QualitativeCategory::PA => "Próximo a alcanzar los aprendizajes",
            QualitativeCategory::NA => "No alcanza los aprendizajes",
        }
    }

    /// Inclusive lower bound; NA has none.
    pub fn lower_bound(self) -> Option<f64> {
        match self {
            QualitativeCategory::DA => Some(9.00),
            QualitativeCategory::AA => Some(7.00),
            QualitativeCategory::PA => Some(4.01),
            QualitativeCategory::NA => None,
        }
    }
}

impl fmt::Display for QualitativeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for QualitativeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DA" => Ok(QualitativeCategory::DA),
            "AA" => Ok(QualitativeCategory::AA),
            "PA" => Ok(QualitativeCategory::PA),
            "NA" => Ok(QualitativeCategory::NA),
            other => Err(format!("unknown qualitative code: {other}")),
        }
    }
}

/// Presentation tag a grade badge is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleTag {
    Success,
    Info,
    Warning,
    Danger,
    Neutral,
}

impl StyleTag {
    pub fn class_name(self) -> &'static str {
        match self {
            StyleTag::Success => "success",
            StyleTag::Info => "info",
            StyleTag::Warning => "warning",
            StyleTag::Danger => "danger",
            StyleTag::Neutral => "neutral",
        }
    }
}

/// One line of a grade export.
#[derive(Debug, Clone, Deserialize)]
pub struct GradeRow {
    pub student: String,
    pub subject: String,
    pub score: f64,
    #[serde(default)]
    pub recorded_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClassifiedGrade {
    pub student: String,
    pub subject: String,
    pub score: f64,
    pub category: QualitativeCategory,
    pub style: StyleTag,
    pub recorded_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategorySummary {
    pub category: QualitativeCategory,
    pub count: usize,
    pub avg_score: f64,
}

/// What a report request points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportTarget {
    Student { student_id: String },
    Course { course_id: String },
    SubjectCourse { subject_course_id: String },
}

impl ReportTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            ReportTarget::Student { .. } => "libreta",
            ReportTarget::Course { .. } => "curso",
            ReportTarget::SubjectCourse { .. } => "materia",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            ReportTarget::Student { student_id } => student_id,
            ReportTarget::Course { course_id } => course_id,
            ReportTarget::SubjectCourse { subject_course_id } => subject_course_id,
        }
    }
}

/// A downloaded report, handed straight to a sink.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// One download attempt. Lives only as long as the fetch it drives.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub id: Uuid,
    pub target: ReportTarget,
    pub term_id: String,
    pub label: String,
    pub term_label: Option<String>,
}

impl ReportRequest {
    pub fn new(
        target: ReportTarget,
        term_id: &str,
        label: &str,
        term_label: Option<&str>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            term_id: term_id.to_string(),
            label: label.to_string(),
            term_label: term_label.map(str::to_string),
        }
    }

    /// Confirmation shown once the report is saved.
    pub fn success_message(&self) -> String {
        let term = self
            .term_label
            .as_deref()
            .map(|term| format!(" ({term})"))
            .unwrap_or_default();
        match self.target {
            ReportTarget::Student { .. } => {
                format!("Libreta de {}{} descargada", self.label, term)
            }
            ReportTarget::Course { .. } => {
                format!("Libretas del curso {}{} descargadas", self.label, term)
            }
            ReportTarget::SubjectCourse { .. } => {
                format!("Reporte de {}{} descargado", self.label, term)
            }
        }
    }
}
