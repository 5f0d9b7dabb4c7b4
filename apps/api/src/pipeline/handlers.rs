//! Axum route handlers for the interview question pipeline.

use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use tracing::info;

use crate::document::extract_text;
use crate::errors::AppError;
use crate::models::{GenerationConfig, InterviewQuestionSet, JobDescriptionAnalysis};
use crate::state::AppState;

/// Raw multipart fields. Option values are kept as text until
/// `GenerationConfig::from_form` validates them.
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Bytes)>,
    difficulty: Option<String>,
    num_questions: Option<String>,
    categories: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = UploadForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let data = field.bytes().await?;
                    form.file = Some((filename, data));
                }
                "difficulty" => form.difficulty = Some(field.text().await?),
                "num_questions" => form.num_questions = Some(field.text().await?),
                "categories" => form.categories = Some(field.text().await?),
                // Unknown fields are ignored.
                _ => {}
            }
        }

        Ok(form)
    }

    fn take_file(&mut self) -> Result<(String, Bytes), AppError> {
        self.file
            .take()
            .ok_or_else(|| AppError::Validation("a 'file' field is required".to_string()))
    }
}

/// Extracts the document text on the blocking pool.
async fn extract_document(filename: String, bytes: Bytes) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || extract_text(&filename, &bytes))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;
    Ok(text)
}

/// POST /api/generate
///
/// Multipart upload of a JD (.pdf or .docx) plus generation options.
/// Runs the full two-stage pipeline and returns an `InterviewQuestionSet`.
pub async fn handle_generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<InterviewQuestionSet>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let (filename, bytes) = form.take_file()?;

    let config = GenerationConfig::from_form(
        form.difficulty.as_deref(),
        form.num_questions.as_deref(),
        form.categories.as_deref(),
    )?;

    info!(
        "Generate request: file='{filename}' ({} bytes), {} {} questions",
        bytes.len(),
        config.num_questions(),
        config.difficulty()
    );

    let text = extract_document(filename, bytes).await?;
    let outcome = state.pipeline.run(&text, config).await;
    let set = outcome.into_question_set(state.pipeline.model())?;

    Ok(Json(set))
}

/// POST /api/analyze
///
/// Runs only the analysis stage. Useful for previewing what was extracted
/// from a document before generating questions.
pub async fn handle_analyze(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<JobDescriptionAnalysis>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let (filename, bytes) = form.take_file()?;

    let text = extract_document(filename, bytes).await?;
    let analysis = state.pipeline.analyze(&text).await?;

    Ok(Json(analysis))
}
