use thiserror::Error;

/// Every way a generation run can fail.
///
/// All variants are terminal for the current run and end up as a single
/// status line for the user.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Invalid input: {0}")]
    InputValidation(String),
    #[error("No data available: {0}")]
    DataUnavailable(String),
    #[error("Rendering failed: {0}")]
    Render(String),
    #[error("Export failed: {0}")]
    Export(String),
}

/// Turn an error into the status line shown to the user
pub fn status_message(error: &GeneratorError) -> String {
    let message = error.to_string();
    let clean = message.trim();
    if clean.is_empty() {
        "❌ An error occurred while generating the animation.".to_string()
    } else {
        format!("❌ {}", clean)
    }
}
