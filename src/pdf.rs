//! Mission PDF export seam.
//!
//! Real PDF generation is an external collaborator; handlers only depend on
//! the [`MissionPdfRenderer`] trait. [`MinimalPdfRenderer`] ships as a
//! single-page plain-text fallback so the export route works end to end.

use crate::models::Document;

pub trait MissionPdfRenderer: Send + Sync {
    fn render(&self, doc: &Document) -> Vec<u8>;
}

/// Bare-bones renderer: one Letter-sized page of Helvetica text lines.
#[derive(Debug, Clone, Default)]
pub struct MinimalPdfRenderer;

impl MinimalPdfRenderer {
    fn summary_lines(doc: &Document) -> Vec<String> {
        let mut lines = vec![
            "AeroSafe Mission Export".to_string(),
            format!("Document: {}", doc.id),
            format!("Kind: {}", doc.kind),
            format!("Status: {}", doc.status),
            format!("Owner: {}", doc.owner_id),
            format!("Created: {}", doc.created_at.to_rfc3339()),
            format!("Updated: {}", doc.updated_at.to_rfc3339()),
        ];
        if let Some(fields) = doc.payload.as_object() {
            for (key, value) in fields.iter().take(20) {
                lines.push(format!("{key}: {value}"));
            }
        }
        lines
    }

    fn escape(text: &str) -> String {
        text.replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)")
    }
}

impl MissionPdfRenderer for MinimalPdfRenderer {
    fn render(&self, doc: &Document) -> Vec<u8> {
        let mut content = String::from("BT /F1 11 Tf 50 742 Td 14 TL\n");
        for line in Self::summary_lines(doc) {
            content.push_str(&format!("({}) Tj T*\n", Self::escape(&line)));
        }
        content.push_str("ET\n");

        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
                .to_string(),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}endstream",
                content.len(),
                content
            ),
        ];

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::with_capacity(objects.len());
        for (i, body) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
        }

        let xref_offset = out.len();
        out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
        out.push_str("0000000000 65535 f \n");
        for offset in &offsets {
            out.push_str(&format!("{offset:010} 00000 n \n"));
        }
        out.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        ));

        out.into_bytes()
    }
}
