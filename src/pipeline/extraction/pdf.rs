use super::types::{PageExtraction, PdfExtractor};
use super::ExtractionError;

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers; scanned exams without a
/// text layer are rejected (no OCR in this tool).
pub struct PdfTextExtractor;

impl PdfExtractor for PdfTextExtractor {
    fn extract_text(&self, pdf_bytes: &[u8]) -> Result<Vec<PageExtraction>, ExtractionError> {
        let page_texts = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;

        let pages = page_texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let confidence = if text.trim().len() > 10 { 0.95 } else { 0.0 };
                PageExtraction {
                    page_number: i + 1,
                    text,
                    confidence,
                }
            })
            .collect();

        Ok(pages)
    }

    fn page_count(&self, pdf_bytes: &[u8]) -> Result<usize, ExtractionError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| ExtractionError::PdfParsing(e.to_string()))?;
        Ok(pages.len())
    }
}

/// Join all pages into one report text. Errors when the PDF carries no
/// extractable text at all.
pub fn extract_full_text(
    extractor: &dyn PdfExtractor,
    pdf_bytes: &[u8],
) -> Result<String, ExtractionError> {
    let pages = extractor.extract_text(pdf_bytes)?;
    let full: String = pages
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let full = full.trim().to_string();
    if full.is_empty() {
        return Err(ExtractionError::NoTextLayer);
    }
    Ok(full)
}
