use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use libretas::client::{DisconnectedFetcher, HttpReportClient};
use libretas::config::Config;
use libretas::controller::{Outcome, ReportRequestController, RequestResult, SkipReason};
use libretas::notify::ConsoleNotifier;
use libretas::sink::DirectorySink;
use libretas::{dates, grading, report, roster};

#[derive(Parser)]
#[command(name = "libretas")]
#[command(about = "Report cards and qualitative grades for school administration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map numeric scores to the qualitative scale
    Classify {
        #[arg(required = true, allow_negative_numbers = true)]
        scores: Vec<f64>,
    },
    /// Render dates the way report cards show them
    FormatDate {
        #[arg(required = true)]
        inputs: Vec<String>,
        #[arg(long)]
        with_time: bool,
    },
    /// Download one student's report card
    Libreta {
        #[arg(long)]
        student_id: String,
        #[arg(long)]
        student: String,
        #[arg(long)]
        term_id: String,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Download every report card of a course
    Curso {
        #[arg(long)]
        course_id: String,
        #[arg(long)]
        course: String,
        #[arg(long)]
        term_id: String,
        #[arg(long)]
        term: String,
        /// Enrolled students; zero skips the download
        #[arg(long)]
        students: usize,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Download a subject-course grade report
    Materia {
        #[arg(long)]
        subject_course_id: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        term_id: String,
        #[arg(long)]
        term: String,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Build a markdown grade summary from a CSV export
    Summary {
        #[arg(long)]
        csv: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, default_value = "resumen.md")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Classify { scores } => {
            for score in scores {
                let category = grading::classify(score);
                println!(
                    "{} {} ({}) [{}]",
                    grading::format_score(score),
                    category,
                    category.description(),
                    grading::style_for(category).class_name()
                );
            }
        }
        Commands::FormatDate { inputs, with_time } => {
            for input in inputs {
                let formatted = if with_time {
                    dates::format_date_time(input.as_str())
                } else {
                    dates::format_date(input.as_str())
                };
                println!("{formatted}");
            }
        }
        Commands::Libreta {
            student_id,
            student,
            term_id,
            out_dir,
        } => {
            let controller = backend_controller(out_dir)?;
            let result = controller
                .request_individual_report(&student_id, &student, &term_id)
                .await;
            finish(result)?;
        }
        Commands::Curso {
            course_id,
            course,
            term_id,
            term,
            students,
            out_dir,
        } => {
            let controller = backend_controller(out_dir)?;
            let result = controller
                .request_course_report(&course_id, &course, &term_id, &term, students)
                .await;
            finish(result)?;
        }
        Commands::Materia {
            subject_course_id,
            subject,
            term_id,
            term,
            out_dir,
        } => {
            let controller = backend_controller(out_dir)?;
            let result = controller
                .request_subject_report(&subject_course_id, &subject, &term_id, &term)
                .await;
            finish(result)?;
        }
        Commands::Summary { csv, title, out } => {
            let controller = local_controller();
            let (csv, title, out) = (&csv, title.as_deref(), &out);
            let result = controller
                .request_generic(move || async move {
                    let rows = roster::load_grades(csv)?;
                    let grades = grading::classify_rows(&rows);
                    let generated_at = chrono::Utc::now().to_rfc3339();
                    let summary =
                        report::build_report(title, &generated_at, &grades);
                    tokio::fs::write(out, summary)
                        .await
                        .with_context(|| format!("failed to write {}", out.display()))?;
                    println!(
                        "Summary of {} grades written to {}.",
                        grades.len(),
                        out.display()
                    );
                    Ok(())
                })
                .await;
            finish(result)?;
        }
    }

    Ok(())
}

fn backend_controller(out_dir: Option<PathBuf>) -> anyhow::Result<ReportRequestController> {
    let config = Config::from_env()?;
    let client = HttpReportClient::new(&config).context("failed to build HTTP client")?;
    let dir = out_dir.unwrap_or_else(|| config.output_dir.clone());

    Ok(ReportRequestController::new(
        Arc::new(client),
        Arc::new(DirectorySink::new(dir)),
        Arc::new(ConsoleNotifier),
    ))
}

/// Controller for ad-hoc actions that never reach the backend.
fn local_controller() -> ReportRequestController {
    ReportRequestController::new(
        Arc::new(DisconnectedFetcher),
        Arc::new(DirectorySink::new(".")),
        Arc::new(ConsoleNotifier),
    )
}

fn finish(result: RequestResult) -> anyhow::Result<()> {
    match result {
        Ok(Outcome::Delivered(_)) | Ok(Outcome::Completed) => Ok(()),
        Ok(Outcome::Skipped(SkipReason::NoEligibleItems)) => {
            println!("No students enrolled; nothing to download.");
            Ok(())
        }
        Ok(Outcome::Skipped(reason)) => {
            println!("Request skipped ({reason:?}).");
            Ok(())
        }
        Err(message) => anyhow::bail!(message),
    }
}
