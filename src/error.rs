use thiserror::Error;

/// Shown when the backend gives no usable reason.
pub const DEFAULT_FAILURE_MESSAGE: &str = "No se pudo descargar el reporte";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend answered {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    #[error("could not save report: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Action(#[from] anyhow::Error),
}

impl ReportError {
    /// Text surfaced to the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ReportError::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.trim().to_string(),
            ReportError::Status { .. } | ReportError::Transport(_) => {
                DEFAULT_FAILURE_MESSAGE.to_string()
            }
            ReportError::Io(err) => format!("{DEFAULT_FAILURE_MESSAGE}: {err}"),
            ReportError::Action(err) => {
                let text = err.to_string();
                if text.trim().is_empty() {
                    DEFAULT_FAILURE_MESSAGE.to_string()
                } else {
                    text
                }
            }
        }
    }
}
