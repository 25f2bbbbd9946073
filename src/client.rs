use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::ReportError;
use crate::models::{Artifact, ReportTarget};

/// Backend operations that produce downloadable reports.
#[async_trait]
pub trait ReportFetcher: Send + Sync {
    async fn fetch_individual_report(
        &self,
        student_id: &str,
        term_id: &str,
    ) -> Result<Artifact, ReportError>;

    async fn fetch_course_reports(
        &self,
        course_id: &str,
        term_id: &str,
    ) -> Result<Artifact, ReportError>;

    async fn fetch_subject_report(
        &self,
        subject_course_id: &str,
        term_id: &str,
    ) -> Result<Artifact, ReportError>;
}

pub struct HttpReportClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpReportClient {
    pub fn new(config: &Config) -> Result<Self, ReportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    async fn download(
        &self,
        target: &ReportTarget,
        term_id: &str,
    ) -> Result<Artifact, ReportError> {
        let url = format!("{}/{}", self.base_url, report_path(target));
        debug!("GET {} (trimestre {})", url, term_id);

        let mut request = self.client.get(&url).query(&[("trimestre", term_id)]);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReportError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| default_filename(target, term_id));
        let bytes = response.bytes().await?.to_vec();

        Ok(Artifact { filename, bytes })
    }
}

#[async_trait]
impl ReportFetcher for HttpReportClient {
    async fn fetch_individual_report(
        &self,
        student_id: &str,
        term_id: &str,
    ) -> Result<Artifact, ReportError> {
        let target = ReportTarget::Student {
            student_id: student_id.to_string(),
        };
        self.download(&target, term_id).await
    }

    async fn fetch_course_reports(
        &self,
        course_id: &str,
        term_id: &str,
    ) -> Result<Artifact, ReportError> {
        let target = ReportTarget::Course {
            course_id: course_id.to_string(),
        };
        self.download(&target, term_id).await
    }

    async fn fetch_subject_report(
        &self,
        subject_course_id: &str,
        term_id: &str,
    ) -> Result<Artifact, ReportError> {
        let target = ReportTarget::SubjectCourse {
            subject_course_id: subject_course_id.to_string(),
        };
        self.download(&target, term_id).await
    }
}

/// Stand-in for commands that run without a configured backend.
pub struct DisconnectedFetcher;

impl DisconnectedFetcher {
    fn refuse(&self) -> Result<Artifact, ReportError> {
        Err(ReportError::Action(anyhow::anyhow!("LIBRETAS_API_URL is not configured")))
    }
}

#[async_trait]
impl ReportFetcher for DisconnectedFetcher {
    async fn fetch_individual_report(
        &self,
        _student_id: &str,
        _term_id: &str,
    ) -> Result<Artifact, ReportError> {
        self.refuse()
    }

    async fn fetch_course_reports(
        &self,
        _course_id: &str,
        _term_id: &str,
    ) -> Result<Artifact, ReportError> {
        self.refuse()
    }

    async fn fetch_subject_report(
        &self,
        _subject_course_id: &str,
        _term_id: &str,
    ) -> Result<Artifact, ReportError> {
        self.refuse()
    }
}

/// Ids travel as a single escaped path segment.
fn report_path(target: &ReportTarget) -> String {
    let segment = match target {
        ReportTarget::Student { .. } => "libreta",
        ReportTarget::Course { .. } => "curso",
        ReportTarget::SubjectCourse { .. } => "materia",
    };
    format!("reportes/{}/{}", segment, urlencoding::encode(target.id()))
}

pub fn default_filename(target: &ReportTarget, term_id: &str) -> String {
    match target {
        ReportTarget::Student { student_id } => format!("libreta_{student_id}_T{term_id}.pdf"),
        ReportTarget::Course { course_id } => format!("libretas_curso_{course_id}_T{term_id}.zip"),
        ReportTarget::SubjectCourse { subject_course_id } => {
            format!("reporte_materia_{subject_course_id}_T{term_id}.pdf")
        }
    }
}

/// Pulls `filename` out of a Content-Disposition header value.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    disposition_params(value)
        .into_iter()
        .find_map(|param| {
            let (key, raw) = param.split_once('=')?;
            if !key.trim().eq_ignore_ascii_case("filename") {
                return None;
            }
            let raw = raw.trim();
            let name = raw
                .strip_prefix('"')
                .and_then(|rest| rest.strip_suffix('"'))
                .unwrap_or(raw);
            Some(name.to_string())
        })
        .filter(|name| !name.is_empty())
}

/// Splits on `;` outside double quotes.
fn disposition_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut quoted = false;

    for (index, c) in value.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                params.push(&value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

/// Reads the `message` (or `error`) field of a JSON error body. Validation
/// errors may carry `message` as a list of strings.
pub fn error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    text_field(&parsed, "message").or_else(|| text_field(&parsed, "error"))
}

fn text_field(body: &Value, key: &str) -> Option<String> {
    let text = match body.get(key)? {
        Value::String(text) => text.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect::<Vec<_>>()
            .join("; "),
        _ => return None,
    };
    Some(text).filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Answers one connection with `response` and hands back the raw request.
    async fn serve_once(response: String) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{addr}/api/"), handle)
    }

    fn http_response(status: &str, headers: &[(&str, &str)], body: &str) -> String {
        let mut response = format!("HTTP/1.1 {status}\r\n");
        for (name, value) in headers {
            response.push_str(&format!("{name}: {value}\r\n"));
        }
        response.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        ));
        response
    }

    fn client_for(api_url: String, token: Option<&str>) -> HttpReportClient {
        HttpReportClient::new(&Config {
            api_url,
            api_token: token.map(str::to_string),
            timeout_secs: 5,
            output_dir: ".".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn download_sends_term_and_token_and_names_the_file() {
        let response = http_response(
            "200 OK",
            &[
                ("Content-Type", "application/pdf"),
                ("Content-Disposition", r#"attachment; filename="libreta;T1.pdf""#),
            ],
            "%PDF-1.4",
        );
        let (api_url, server) = serve_once(response).await;
        let client = client_for(api_url, Some("secreto"));

        let artifact = client.fetch_individual_report("42#x", "1").await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(artifact.filename, "libreta;T1.pdf");
        assert_eq!(artifact.bytes, b"%PDF-1.4");
        assert!(request.starts_with("GET /api/reportes/libreta/42%23x?trimestre=1 HTTP/1.1"));
        assert!(request.to_ascii_lowercase().contains("authorization: bearer secreto"));
    }

    #[tokio::test]
    async fn download_without_disposition_uses_default_name() {
        let response = http_response("200 OK", &[("Content-Type", "application/zip")], "PK");
        let (api_url, server) = serve_once(response).await;
        let client = client_for(api_url, None);

        let artifact = client.fetch_course_reports("7", "2").await.unwrap();
        let request = server.await.unwrap();

        assert_eq!(artifact.filename, "libretas_curso_7_T2.zip");
        assert!(request.starts_with("GET /api/reportes/curso/7?trimestre=2 HTTP/1.1"));
        assert!(!request.to_ascii_lowercase().contains("authorization:"));
    }

    #[tokio::test]
    async fn failed_download_carries_status_and_body_message() {
        let response = http_response(
            "422 Unprocessable Entity",
            &[("Content-Type", "application/json")],
            r#"{"message":["Trimestre no existe"],"error":"Unprocessable Entity"}"#,
        );
        let (api_url, server) = serve_once(response).await;
        let client = client_for(api_url, None);

        let err = client.fetch_subject_report("15", "9").await.unwrap_err();
        server.await.unwrap();

        match err {
            ReportError::Status { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message.as_deref(), Some("Trimestre no existe"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn ids_are_escaped_into_one_segment() {
        let student = ReportTarget::Student {
            student_id: "42#x".to_string(),
        };
        let subject = ReportTarget::SubjectCourse {
            subject_course_id: "a/b?c".to_string(),
        };
        assert_eq!(report_path(&student), "reportes/libreta/42%23x");
        assert_eq!(report_path(&subject), "reportes/materia/a%2Fb%3Fc");
    }

    #[test]
    fn disposition_handles_quotes_case_and_spacing() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="a;b.pdf""#),
            Some("a;b.pdf".to_string())
        );
        assert_eq!(
            filename_from_disposition("attachment; FileName=Libreta.pdf"),
            Some("Libreta.pdf".to_string())
        );
        assert_eq!(
            filename_from_disposition(r#"attachment; filename = "x.pdf""#),
            Some("x.pdf".to_string())
        );
    }

    #[test]
    fn error_body_message_may_be_a_list() {
        assert_eq!(
            error_message(r#"{"message":["Trimestre no existe"],"error":"Bad Request"}"#),
            Some("Trimestre no existe".to_string())
        );
        assert_eq!(
            error_message(r#"{"message":["Nota inválida"," fuera de rango "]}"#),
            Some("Nota inválida; fuera de rango".to_string())
        );
        assert_eq!(
            error_message(r#"{"message":{"code":3},"error":"Bad Request"}"#),
            Some("Bad Request".to_string())
        );
        assert_eq!(
            error_message(r#"{"message":[],"error":"Bad Request"}"#),
            Some("Bad Request".to_string())
        );
    }

    #[test]
    fn disposition_filename_is_extracted() {
        assert_eq!(
            filename_from_disposition(r#"attachment; filename="libreta_Ana.pdf""#),
            Some("libreta_Ana.pdf".to_string())
        );
        assert_eq!(
            filename_from_disposition("attachment; filename=curso.zip"),
            Some("curso.zip".to_string())
        );
        assert_eq!(filename_from_disposition("attachment"), None);
        assert_eq!(filename_from_disposition(r#"attachment; filename="""#), None);
    }

    #[test]
    fn error_body_message_is_extracted() {
        assert_eq!(
            error_message(r#"{"message":"Trimestre cerrado"}"#),
            Some("Trimestre cerrado".to_string())
        );
        assert_eq!(
            error_message(r#"{"error":"No autorizado"}"#),
            Some("No autorizado".to_string())
        );
        assert_eq!(error_message(r#"{"message":"  "}"#), None);
        assert_eq!(error_message("<html>502</html>"), None);
    }

    #[test]
    fn default_names_follow_the_target() {
        let student = ReportTarget::Student {
            student_id: "42".to_string(),
        };
        let course = ReportTarget::Course {
            course_id: "7".to_string(),
        };
        let subject = ReportTarget::SubjectCourse {
            subject_course_id: "15".to_string(),
        };
        assert_eq!(default_filename(&student, "2"), "libreta_42_T2.pdf");
        assert_eq!(default_filename(&course, "1"), "libretas_curso_7_T1.zip");
        assert_eq!(default_filename(&subject, "3"), "reporte_materia_15_T3.pdf");
        assert_eq!(report_path(&course), "reportes/curso/7");
    }

    #[test]
    fn client_trims_trailing_slash() {
        let config = Config {
            api_url: "https://escuela.example/api/".to_string(),
            api_token: None,
            timeout_secs: 5,
            output_dir: ".".into(),
        };
        let client = HttpReportClient::new(&config).unwrap();
        assert_eq!(client.base_url, "https://escuela.example/api");
    }

    #[tokio::test]
    async fn disconnected_fetcher_refuses() {
        let err = DisconnectedFetcher
            .fetch_individual_report("1", "1")
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "LIBRETAS_API_URL is not configured");
    }
}
