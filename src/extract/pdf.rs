use super::ExtractError;
use std::panic;

/// Extract text from an in-memory PDF, one entry per page.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractError> {
    // pdf-extract panics on some malformed documents instead of returning Err
    let result = panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(ExtractError::Pdf(format!("{:?}", e))),
        Err(_) => Err(ExtractError::Pdf("PDF parser aborted on malformed input".to_string())),
    }
}

/// Concatenate page texts, each followed by a newline. Pages without text
/// (scanned images, blank pages) are skipped.
pub fn join_pages<S: AsRef<str>>(pages: &[S]) -> String {
    let mut text = String::new();
    for page in pages {
        let page = page.as_ref();
        if page.trim().is_empty() {
            continue;
        }
        text.push_str(page);
        text.push('\n');
    }
    text
}

pub fn pdf_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let pages = extract_pages(bytes)?;
    Ok(join_pages(&pages))
}
