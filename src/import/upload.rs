use std::path::Path;

use super::ImportError;

/// Local file header of a zip archive; every .docx starts with it
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

pub fn has_docx_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("docx"))
}

/// Check that an uploaded file looks like a Word document
pub fn validate_docx(path: &Path, bytes: &[u8]) -> Result<(), ImportError> {
    if !has_docx_extension(path) || !bytes.starts_with(ZIP_SIGNATURE) {
        return Err(ImportError::UnsupportedFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Read and validate an upload in one step
///
/// The extension is checked before touching the disk so a wrong pick never
/// reads a large unrelated file.
pub fn read_upload(path: &Path) -> Result<Vec<u8>, ImportError> {
    if !has_docx_extension(path) {
        return Err(ImportError::UnsupportedFile {
            path: path.to_path_buf(),
        });
    }

    let bytes = std::fs::read(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    validate_docx(path, &bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_accepts_docx_with_zip_header() {
        let path = PathBuf::from("report.DOCX");
        assert!(validate_docx(&path, b"PK\x03\x04rest").is_ok());
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let path = PathBuf::from("report.pdf");
        assert!(matches!(
            validate_docx(&path, b"PK\x03\x04"),
            Err(ImportError::UnsupportedFile { .. })
        ));
    }

    #[test]
    fn test_rejects_docx_without_zip_header() {
        let path = PathBuf::from("report.docx");
        let err = validate_docx(&path, b"%PDF-1.7").unwrap_err();
        assert_eq!(err.to_string(), "Please upload a valid Word file.");
    }

    #[test]
    fn test_rejects_legacy_doc() {
        assert!(!has_docx_extension(Path::new("old.doc")));
        assert!(!has_docx_extension(Path::new("noext")));
    }

    #[test]
    fn test_read_upload_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.docx");
        assert!(matches!(read_upload(&path), Err(ImportError::Read { .. })));
    }

    #[test]
    fn test_read_upload_skips_read_for_wrong_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.txt");
        assert!(matches!(
            read_upload(&path),
            Err(ImportError::UnsupportedFile { .. })
        ));
    }

    #[test]
    fn test_read_upload_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.docx");
        std::fs::write(&path, b"PK\x03\x04body").unwrap();
        assert_eq!(read_upload(&path).unwrap(), b"PK\x03\x04body");
    }
}
