use tracing::warn;

use super::types::GenerateContentResponse;

/// Joins the text parts of the first candidate. When the model produced
/// nothing usable, the error carries the block or finish reason Gemini reported.
pub fn extract_text(response: &GenerateContentResponse) -> Result<String, String> {
    let candidate = response.candidates.as_ref().and_then(|c| c.first());

    let text = candidate
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .map(|part| part.text.as_str())
                .collect::<String>()
        })
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    if let Some(text) = text {
        return Ok(text);
    }

    let reason = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
        .or_else(|| candidate.and_then(|c| c.finish_reason.clone()))
        .unwrap_or_else(|| "no candidates".to_string());

    warn!(%reason, "Gemini returned empty answer (safety filter or empty response)");
    Err(reason)
}
