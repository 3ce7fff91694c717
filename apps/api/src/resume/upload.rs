use bytes::Bytes;
use tracing::warn;

use crate::errors::AppError;

const PDF_MAGIC: &[u8] = b"%PDF";

pub fn is_pdf(filename: Option<&str>, bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
        || filename.is_some_and(|name| name.to_ascii_lowercase().ends_with(".pdf"))
}

/// Plain text of an uploaded resume. PDFs are parsed on the blocking pool;
/// everything else is read as UTF-8, replacing invalid sequences.
pub async fn text_from_upload(filename: Option<&str>, bytes: Bytes) -> Result<String, AppError> {
    let text = if is_pdf(filename, &bytes) {
        pdf_text(bytes).await?
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation("resume_text_is_empty".to_string()));
    }
    Ok(text.to_string())
}

async fn pdf_text(bytes: Bytes) -> Result<String, AppError> {
    let joined = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;

    match joined {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            warn!("PDF extraction failed: {e}");
            Err(AppError::Validation("failed_to_read_pdf".to_string()))
        }
        // pdf-extract panics on some malformed files
        Err(e) if e.is_panic() => {
            warn!("PDF extraction panicked");
            Err(AppError::Validation("failed_to_read_pdf".to_string()))
        }
        Err(e) => Err(AppError::Internal(e.into())),
    }
}
