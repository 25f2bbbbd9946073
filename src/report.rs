use std::fmt::Write;

use crate::dates;
use crate::grading;
use crate::models::ClassifiedGrade;

pub fn build_report(
    title: Option<&str>,
    generated_at: &str,
    grades: &[ClassifiedGrade],
) -> String {
    let summaries = grading::summarize_by_category(grades);

    let mut output = String::new();
    let title = title.unwrap_or("todos los cursos");

    let _ = writeln!(output, "# Resumen de calificaciones");
    let _ = writeln!(
        output,
        "Generado para {} el {}",
        title,
        dates::format_date_time(generated_at)
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Escala cualitativa");

    if grades.is_empty() {
        let _ = writeln!(output, "No hay calificaciones registradas.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {} ({}): {} calificaciones (promedio {})",
                summary.category,
                summary.category.description(),
                summary.count,
                if summary.count == 0 {
                    "-".to_string()
                } else {
                    grading::format_score(summary.avg_score)
                }
            );
        }
    }

    let mut ordered = grades.to_vec();
    ordered.sort_by(|a, b| a.student.cmp(&b.student).then_with(|| a.subject.cmp(&b.subject)));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Detalle por estudiante");

    if ordered.is_empty() {
        let _ = writeln!(output, "No hay estudiantes con calificaciones.");
    } else {
        for grade in ordered.iter() {
            let _ = writeln!(
                output,
                "- {} / {}: {} {} [{}] registrado {}",
                grade.student,
                grade.subject,
                grading::format_score(grade.score),
                grade.category,
                grade.style.class_name(),
                dates::format_date(grade.recorded_at.as_deref())
            );
        }
    }

    output
}
