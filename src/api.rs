// HTTP side of the tool: turns an `UploadRequest` into one multipart POST
// against the hosting endpoint and captures what comes back.
//
// Building the form is split in two. `FormPlan` is plain data describing
// the fields, so it can be inspected without touching the network or
// stdin; `FormPlan::into_form` opens files and produces the reqwest form.

use crate::error::{Error, Result};
use crate::source::Source;
use reqwest::blocking::{multipart, Client};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// The hosting service every upload goes to.
pub const DEFAULT_ENDPOINT: &str = "https://0x0.st";

/// Header names the service uses to echo the expiry and the deletion token.
pub const HIGHLIGHTED_HEADERS: [&str; 2] = ["x-expires", "x-token"];

/// Everything needed to perform one upload. Built once from the command
/// line and consumed by `UploadClient::upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub source: Source,
    /// Hours from now or an epoch-millisecond timestamp, as the digits the
    /// user typed. `None` or an all-zero value means the field is not sent.
    pub expires: Option<String>,
    /// Content-Type override for file and stdin uploads. Ignored for URLs.
    pub mime_type: Option<String>,
    /// Capture response headers as well as the body.
    pub verbose: bool,
}

/// One field of the multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormField {
    File {
        path: PathBuf,
        mime_type: Option<String>,
    },
    Stdin {
        mime_type: Option<String>,
    },
    Url(String),
    Expires(String),
}

impl FormField {
    /// Form field name on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            FormField::File { .. } | FormField::Stdin { .. } => "file",
            FormField::Url(_) => "url",
            FormField::Expires(_) => "expires",
        }
    }
}

/// Ordered fields of the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPlan {
    pub fields: Vec<FormField>,
}

impl UploadRequest {
    pub fn form_plan(&self) -> FormPlan {
        let mut fields = Vec::with_capacity(2);

        fields.push(match &self.source {
            Source::File(path) => FormField::File {
                path: path.clone(),
                mime_type: self.mime_type.clone(),
            },
            Source::Stdin => FormField::Stdin {
                mime_type: self.mime_type.clone(),
            },
            Source::Url(url) => FormField::Url(url.clone()),
        });

        if let Some(expires) = self.expires.as_deref().filter(|n| n.bytes().any(|b| b != b'0')) {
            fields.push(FormField::Expires(expires.to_string()));
        }

        FormPlan { fields }
    }
}

impl FormPlan {
    pub fn names(&self) -> Vec<&'static str> {
        self.fields.iter().map(FormField::name).collect()
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Materialize the multipart form. File content is streamed from disk
    /// and stdin content from the process's standard input.
    pub fn into_form(self) -> Result<multipart::Form> {
        self.into_form_with_stdin(io::stdin())
    }

    /// Same as `into_form`, with `stdin` standing in for standard input.
    pub fn into_form_with_stdin<R>(self, stdin: R) -> Result<multipart::Form>
    where
        R: Read + Send + 'static,
    {
        let mut stdin = Some(stdin);
        let mut form = multipart::Form::new();
        for field in self.fields {
            let name = field.name();
            form = match field {
                FormField::File { path, mime_type } => {
                    form.part(name, file_part(path, mime_type.as_deref())?)
                }
                FormField::Stdin { mime_type } => {
                    let Some(reader) = stdin.take() else {
                        continue;
                    };
                    let part = multipart::Part::reader(reader).file_name("-");
                    form.part(name, with_content_type(part, mime_type.as_deref())?)
                }
                FormField::Url(url) => form.text(name, url),
                FormField::Expires(expires) => form.text(name, expires),
            };
        }
        Ok(form)
    }
}

/// File part named after the path. Without an override the MIME type is
/// guessed from the extension.
fn file_part(path: PathBuf, mime_type: Option<&str>) -> Result<multipart::Part> {
    let Some(mime_type) = mime_type else {
        return multipart::Part::file(&path).map_err(|source| Error::Io { path, source });
    };

    let (file, len) = open_with_len(&path).map_err(|source| Error::Io {
        path: path.clone(),
        source,
    })?;
    let mut part = multipart::Part::reader_with_length(file, len);
    if let Some(name) = path.file_name() {
        part = part.file_name(name.to_string_lossy().into_owned());
    }
    with_content_type(part, Some(mime_type))
}

fn open_with_len(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

/// Set the part's Content-Type verbatim. The value is not parsed as a MIME
/// type, it only has to be a legal header value.
fn with_content_type(part: multipart::Part, mime_type: Option<&str>) -> Result<multipart::Part> {
    let Some(mime_type) = mime_type else {
        return Ok(part);
    };
    let value = HeaderValue::from_str(mime_type)
        .map_err(|_| Error::ContentType(mime_type.to_string()))?;
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, value);
    Ok(part.headers(headers))
}

/// What the service answered.
#[derive(Debug, Clone)]
pub struct UploadResponse {
    pub status: StatusCode,
    /// Raw body, normally the hosted URL followed by a newline.
    pub body: Vec<u8>,
    /// `name: value` lines, only filled for verbose requests.
    pub headers: Vec<String>,
}

impl UploadResponse {
    /// Captured header lines that mention the expiry or the deletion token.
    /// Matching is a case-sensitive substring check on the whole line.
    pub fn highlighted_headers(&self) -> impl Iterator<Item = &str> {
        self.headers
            .iter()
            .map(String::as_str)
            .filter(|line| HIGHLIGHTED_HEADERS.iter().any(|h| line.contains(h)))
    }
}

/// Blocking client bound to one endpoint.
#[derive(Clone)]
pub struct UploadClient {
    client: Client,
    endpoint: String,
}

impl UploadClient {
    /// Build a client for `endpoint`. No request timeout is configured, a
    /// large upload simply takes as long as it takes.
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .user_agent(concat!("0x0/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(UploadClient {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send exactly one POST. A non-2xx answer is not an error here: the
    /// body is returned as-is so the caller prints whatever the service said.
    pub fn upload(&self, request: UploadRequest) -> Result<UploadResponse> {
        self.upload_with_stdin(request, io::stdin())
    }

    /// `upload` with `stdin` read in place of the process's standard input.
    pub fn upload_with_stdin<R>(&self, request: UploadRequest, stdin: R) -> Result<UploadResponse>
    where
        R: Read + Send + 'static,
    {
        let plan = request.form_plan();
        debug!(fields = ?plan.names(), endpoint = %self.endpoint, "sending upload");

        let form = plan.into_form_with_stdin(stdin)?;
        let res = self.client.post(&self.endpoint).multipart(form).send()?;

        let status = res.status();
        if !status.is_success() {
            warn!(%status, "upload endpoint returned an error status");
        }
        let headers = if request.verbose {
            header_lines(res.headers())
        } else {
            Vec::new()
        };
        let body = res.bytes()?.to_vec();

        Ok(UploadResponse {
            status,
            body,
            headers,
        })
    }
}

fn header_lines(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| {
            format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn request(source: Source) -> UploadRequest {
        UploadRequest {
            source,
            expires: None,
            mime_type: None,
            verbose: false,
        }
    }

    #[test]
    fn file_with_expiry_and_mime_type() {
        let req = UploadRequest {
            expires: Some("24".into()),
            mime_type: Some("text/plain".into()),
            ..request(Source::File("somefile.txt".into()))
        };
        let plan = req.form_plan();

        assert_eq!(plan.names(), vec!["file", "expires"]);
        assert_eq!(
            plan.field("file"),
            Some(&FormField::File {
                path: "somefile.txt".into(),
                mime_type: Some("text/plain".into()),
            })
        );
        assert_eq!(plan.field("expires"), Some(&FormField::Expires("24".into())));
        assert!(plan.field("url").is_none());
    }

    #[test]
    fn zero_expiry_sends_no_field() {
        for zero in ["0", "000"] {
            let req = UploadRequest {
                expires: Some(zero.into()),
                ..request(Source::Stdin)
            };
            assert_eq!(req.form_plan().names(), vec!["file"]);
        }
    }

    #[test]
    fn expiry_is_sent_exactly_as_typed() {
        for typed in ["007", "123456789012345678901234567890"] {
            let req = UploadRequest {
                expires: Some(typed.into()),
                ..request(Source::Stdin)
            };
            assert_eq!(
                req.form_plan().field("expires"),
                Some(&FormField::Expires(typed.into()))
            );
        }
    }

    #[test]
    fn free_form_content_type_is_accepted() {
        let part = multipart::Part::text("x");
        assert!(with_content_type(part, Some("plaintext")).is_ok());
    }

    #[test]
    fn content_type_with_control_bytes_cannot_be_sent() {
        let part = multipart::Part::text("x");
        match with_content_type(part, Some("text/plain\r\nx-evil: 1")) {
            Err(Error::ContentType(value)) => assert!(value.starts_with("text/plain")),
            other => panic!("expected content type error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn stdin_carries_the_mime_type() {
        let req = UploadRequest {
            mime_type: Some("application/json".into()),
            ..request(Source::Stdin)
        };
        assert_eq!(
            req.form_plan().fields,
            vec![FormField::Stdin {
                mime_type: Some("application/json".into())
            }]
        );
    }

    #[test]
    fn url_sends_only_the_url_field() {
        let req = UploadRequest {
            expires: Some("5".into()),
            mime_type: Some("text/plain".into()),
            ..request(Source::Url("https://example.com/a.png".into()))
        };
        let plan = req.form_plan();
        assert_eq!(plan.names(), vec!["url", "expires"]);
        assert_eq!(
            plan.field("url"),
            Some(&FormField::Url("https://example.com/a.png".into()))
        );
        assert!(plan.field("file").is_none());
    }

    #[test]
    fn missing_file_fails_while_building_the_form() {
        let plan = request(Source::File("/no/such/upload.bin".into())).form_plan();
        match plan.into_form() {
            Err(Error::Io { path, .. }) => assert_eq!(path, PathBuf::from("/no/such/upload.bin")),
            other => panic!("expected io error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn highlighted_headers_are_filtered_case_sensitively() {
        let mut headers = HeaderMap::new();
        headers.insert("x-expires", HeaderValue::from_static("1700000000000"));
        headers.insert("x-token", HeaderValue::from_static("s3cr3t"));
        headers.insert("content-type", HeaderValue::from_static("text/plain"));

        let mut lines = header_lines(&headers);
        lines.push("X-Token: upper".into());
        let response = UploadResponse {
            status: StatusCode::OK,
            body: b"https://0x0.st/abc.txt\n".to_vec(),
            headers: lines,
        };

        let mut picked: Vec<_> = response.highlighted_headers().collect();
        picked.sort_unstable();
        assert_eq!(picked, vec!["x-expires: 1700000000000", "x-token: s3cr3t"]);
    }
}
