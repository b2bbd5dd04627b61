use std::io;
use std::path::Path;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;
use uuid::Uuid;

use crate::case::Payload;

#[derive(Error, Diagnostic, Debug)]
pub enum MultipartError {
    #[error("failed to read `{}`: {source}", .path.display())]
    File { path: PathBuf, source: io::Error },
}

/// Builds a multipart/form-data body in memory, for feeding file uploads
/// through the harness. The boundary and content type stay inspectable so a
/// case can attach them to its request.
pub struct MultipartForm {
    boundary: String,
    buf: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self {
            boundary: format!("----boundary-{}", Uuid::new_v4().simple()),
            buf: Vec::new(),
        }
    }

    /// Adds a plain text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.open_part(&format!(
            "Content-Disposition: form-data; name=\"{name}\"\r\n"
        ));
        self.buf.extend_from_slice(value.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
        self
    }

    /// Adds a file field, streaming the file's contents into the buffer.
    /// The part's MIME type is guessed from the path. A missing or
    /// unreadable file is an explicit error, never a corrupt buffer.
    pub async fn file(mut self, name: &str, path: impl AsRef<Path>) -> Result<Self, MultipartError> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path)
            .await
            .map_err(|source| MultipartError::File {
                path: path.to_path_buf(),
                source,
            })?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        self.open_part(&format!(
            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
             Content-Type: {mime}\r\n"
        ));
        self.buf.extend_from_slice(&contents);
        self.buf.extend_from_slice(b"\r\n");
        Ok(self)
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Closes the form and returns the encoded body and its content type.
    pub fn into_parts(self) -> (Vec<u8>, String) {
        let content_type = self.content_type();
        (self.into_bytes(), content_type)
    }

    /// Closes the form and returns the encoded body.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.buf
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        self.buf
    }

    /// Closes the form into a raw [`Payload`] for a [`crate::TestCase`] body.
    pub fn into_payload(self) -> Payload {
        Payload::Raw(self.into_bytes())
    }

    fn open_part(&mut self, headers: &str) {
        self.buf
            .extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
        self.buf.extend_from_slice(headers.as_bytes());
        self.buf.extend_from_slice(b"\r\n");
    }
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use std::env;

    use uuid::Uuid;

    use crate::multipart::MultipartError;
    use crate::multipart::MultipartForm;

    #[test]
    fn text_parts_are_framed_by_the_boundary() {
        let form = MultipartForm::new().text("user", "hansi");
        let boundary = form.boundary().to_string();
        let (body, content_type) = form.into_parts();
        let body = String::from_utf8(body).unwrap();

        assert_eq!(content_type, format!("multipart/form-data; boundary={boundary}"));
        assert!(body.starts_with(&format!("--{boundary}\r\n")));
        assert!(body.contains("Content-Disposition: form-data; name=\"user\"\r\n\r\nhansi\r\n"));
        assert!(body.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[tokio::test]
    async fn file_part_carries_contents_and_mime() {
        let path = env::temp_dir().join(format!("upload-{}.txt", Uuid::new_v4().simple()));
        std::fs::write(&path, b"file payload").unwrap();

        let form = MultipartForm::new()
            .file("upload", &path)
            .await
            .unwrap();
        let body = String::from_utf8(form.into_bytes()).unwrap();

        std::fs::remove_file(&path).unwrap();

        let filename = path.file_name().unwrap().to_str().unwrap();
        assert!(body.contains(&format!(
            "Content-Disposition: form-data; name=\"upload\"; filename=\"{filename}\"\r\n"
        )));
        assert!(body.contains("Content-Type: text/plain\r\n"));
        assert!(body.contains("\r\n\r\nfile payload\r\n"));
    }

    #[tokio::test]
    async fn missing_file_is_an_explicit_error() {
        let path = env::temp_dir().join(format!("missing-{}.bin", Uuid::new_v4().simple()));
        let result = MultipartForm::new().file("upload", &path).await;

        let Err(MultipartError::File { path: reported, .. }) = result else {
            panic!("expected a file error");
        };
        assert_eq!(reported, path);
    }
}
