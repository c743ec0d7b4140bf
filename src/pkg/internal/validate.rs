use axum::http::StatusCode;
use lazy_static::lazy_static;
use regex::Regex;
use standard_error::{StandardError, Status};
use url::Url;

use crate::prelude::Result;

pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email pattern");
}

/// Trimmed full name, rejected when empty.
pub fn full_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(StandardError::new("ERR-VAL-NAME").code(StatusCode::UNPROCESSABLE_ENTITY));
    }
    Ok(name.to_string())
}

pub fn email(raw: &str) -> Result<String> {
    let email = raw.trim();
    if !EMAIL_PATTERN.is_match(email) {
        return Err(StandardError::new("ERR-VAL-EMAIL").code(StatusCode::UNPROCESSABLE_ENTITY));
    }
    Ok(email.to_string())
}

/// Resume links are stored verbatim, so only absolute parseable URLs pass.
pub fn resume_url(raw: &str) -> Result<String> {
    let link = raw.trim();
    Url::parse(link)
        .map_err(|_| StandardError::new("ERR-VAL-RESUME-URL").code(StatusCode::UNPROCESSABLE_ENTITY))?;
    Ok(link.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeKind {
    Pdf,
    Doc,
    Docx,
}

impl ResumeKind {
    pub fn from_filename(filename: &str) -> Option<Self> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?
            .to_lowercase();
        match extension.as_str() {
            "pdf" => Some(ResumeKind::Pdf),
            "doc" => Some(ResumeKind::Doc),
            "docx" => Some(ResumeKind::Docx),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ResumeKind::Pdf => "application/pdf",
            ResumeKind::Doc => "application/msword",
            ResumeKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// File gate: type whitelist first, then the size cap.
pub fn resume_file(filename: &str, size: usize) -> Result<ResumeKind> {
    let kind = ResumeKind::from_filename(filename)
        .ok_or_else(|| StandardError::new("ERR-VAL-RESUME-TYPE").code(StatusCode::UNPROCESSABLE_ENTITY))?;
    if size > MAX_RESUME_BYTES {
        return Err(StandardError::new("ERR-VAL-RESUME-SIZE").code(StatusCode::UNPROCESSABLE_ENTITY));
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_trims() {
        assert_eq!(full_name("  Jane Doe ").unwrap(), "Jane Doe");
        assert!(full_name("   ").is_err());
        assert!(full_name("").is_err());
    }

    #[test]
    fn test_email_accepts_plain_addresses() {
        assert_eq!(email("jane@x.com").unwrap(), "jane@x.com");
        assert_eq!(email(" jane@x.com ").unwrap(), "jane@x.com");
    }

    #[test]
    fn test_email_rejects_malformed_addresses() {
        for bad in ["", "jane", "jane@", "@x.com", "jane@x", "jane@x.", "ja ne@x.com", "jane@x com.org"] {
            assert!(email(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_resume_url_requires_absolute_url() {
        assert_eq!(
            resume_url("https://x.com/r.pdf").unwrap(),
            "https://x.com/r.pdf"
        );
        assert!(resume_url("not a url").is_err());
        assert!(resume_url("/relative/path.pdf").is_err());
    }

    #[test]
    fn test_resume_file_whitelists_types() {
        assert_eq!(resume_file("cv.pdf", 1024).unwrap(), ResumeKind::Pdf);
        assert_eq!(resume_file("CV.DOCX", 1024).unwrap(), ResumeKind::Docx);
        assert!(resume_file("cv.exe", 1024).is_err());
        assert!(resume_file("cv", 1024).is_err());
    }

    #[test]
    fn test_resume_file_caps_size() {
        assert!(resume_file("cv.pdf", MAX_RESUME_BYTES).is_ok());
        assert!(resume_file("cv.pdf", MAX_RESUME_BYTES + 1).is_err());
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(ResumeKind::Pdf.mime_type(), "application/pdf");
        assert_eq!(ResumeKind::Doc.mime_type(), "application/msword");
    }
}
