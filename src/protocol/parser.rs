//! Request header parsing
//!
//! Extracts the upload target and flags from request headers, and builds the
//! `Content-Disposition` value for downloads.

use axum::http::HeaderValue;

use crate::error::RequestError;
use crate::transfer::DeclaredSize;

pub const ARCHIVE_HEADER: &str = "x-is-archive";
pub const FILE_SIZE_HEADER: &str = "x-file-size";

const FILENAME_PARAM: &str = "filename=";

/// Upload target from a `Content-Disposition` header such as
/// `attachment; filename="notes/todo.txt"`. Only surrounding quotes are
/// stripped; the path itself is validated later.
pub fn parse_upload_path(content_disposition: Option<&str>) -> Result<String, RequestError> {
    let header = content_disposition.ok_or(RequestError::MissingHeader("content-disposition"))?;
    let (_, value) = header.rsplit_once(FILENAME_PARAM).ok_or_else(|| {
        RequestError::InvalidInput("Content-Disposition carries no filename".to_string())
    })?;
    let value = value.split(';').next().unwrap_or_default().trim();
    Ok(value.trim_matches('"').to_string())
}

/// `X-File-Size` as sent. A value that is present but not UTF-8 is kept as
/// invalid input rather than treated as absent.
pub fn parse_declared_size(value: Option<&HeaderValue>) -> DeclaredSize {
    match value {
        None => DeclaredSize::Missing,
        Some(raw) => match raw.to_str() {
            Ok(text) => DeclaredSize::from_header(Some(text)),
            Err(_) => DeclaredSize::Invalid(String::from_utf8_lossy(raw.as_bytes()).into_owned()),
        },
    }
}

/// `X-Is-Archive`: absent means false, otherwise `true`/`false` in any case.
pub fn parse_archive_flag(value: Option<&str>) -> Result<bool, RequestError> {
    let Some(raw) = value.map(str::trim) else {
        return Ok(false);
    };
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(RequestError::InvalidInput(format!(
            "X-Is-Archive must be true or false, got '{}'",
            raw
        )))
    }
}

/// `attachment` disposition naming `file_name`. Non-ASCII names are sent in
/// the RFC 5987 `filename*` form with an ASCII fallback.
pub fn attachment_disposition(file_name: &str) -> HeaderValue {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();

    let value = if fallback == file_name {
        format!("attachment; filename=\"{}\"", fallback)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(file_name)
        )
    };
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_upload_path() {
        assert_eq!(
            parse_upload_path(Some("attachment; filename=\"notes/todo.txt\"")).unwrap(),
            "notes/todo.txt"
        );
        assert_eq!(
            parse_upload_path(Some("filename=backup")).unwrap(),
            "backup"
        );
        assert_eq!(
            parse_upload_path(Some("form-data; name=\"f\"; filename=\"a b.txt\"; size=3")).unwrap(),
            "a b.txt"
        );
    }

    #[test]
    fn upload_path_errors() {
        assert!(matches!(
            parse_upload_path(None),
            Err(RequestError::MissingHeader("content-disposition"))
        ));
        assert!(matches!(
            parse_upload_path(Some("attachment")),
            Err(RequestError::InvalidInput(_))
        ));
    }

    #[test]
    fn declared_size_distinguishes_absent_from_unreadable() {
        assert_eq!(parse_declared_size(None), DeclaredSize::Missing);
        assert_eq!(
            parse_declared_size(Some(&HeaderValue::from_static("42"))),
            DeclaredSize::Bytes(42)
        );
        let opaque = HeaderValue::from_bytes(b"4\xff2").unwrap();
        assert!(matches!(
            parse_declared_size(Some(&opaque)),
            DeclaredSize::Invalid(_)
        ));
    }

    #[test]
    fn archive_flag_is_case_insensitive() {
        assert!(!parse_archive_flag(None).unwrap());
        assert!(parse_archive_flag(Some("TRUE")).unwrap());
        assert!(parse_archive_flag(Some("True")).unwrap());
        assert!(!parse_archive_flag(Some("false")).unwrap());
        assert!(parse_archive_flag(Some("yes")).is_err());
        assert!(parse_archive_flag(Some("")).is_err());
    }

    #[test]
    fn disposition_for_plain_and_unicode_names() {
        assert_eq!(
            attachment_disposition(".backup.tar.gz"),
            "attachment; filename=\".backup.tar.gz\""
        );
        assert_eq!(
            attachment_disposition("café.txt"),
            "attachment; filename=\"caf_.txt\"; filename*=UTF-8''caf%C3%A9.txt"
        );
    }
}
