//! Upload transports: HTTP(S) PUT, `file://` directories, and an in-memory
//! store for dry runs and tests.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use hoist_util::errors::HoistError;

use crate::auth::{self, Credentials};
use crate::repository::RepositoryTarget;

const USER_AGENT: &str = concat!("hoist/", env!("CARGO_PKG_VERSION"));
const BODY_SNIPPET_LEN: usize = 200;

/// Moves bytes to and from a repository, addressed by repository-relative
/// paths such as `org/ow2/asm/asm/9.9/asm-9.9.jar`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Where `path` ends up, for logs and dry runs.
    fn describe(&self, path: &str) -> String;

    /// Store `data` at `path`, replacing anything already there.
    /// Returns the status reported by the repository.
    async fn put(&self, path: &str, data: &[u8], credentials: &Credentials)
        -> Result<u16, HoistError>;

    /// Fetch `path`, or `None` if it does not exist.
    async fn get(&self, path: &str, credentials: &Credentials)
        -> Result<Option<Vec<u8>>, HoistError>;
}

/// Choose a transport by the target's URL scheme.
pub fn transport_for(target: &RepositoryTarget, timeout: Duration) -> miette::Result<Box<dyn Transport>> {
    let url = target.url.as_str();
    if url.starts_with("file://") {
        Ok(Box::new(FileTransport::from_url(url)?))
    } else if url.starts_with("http://") || url.starts_with("https://") {
        Ok(Box::new(HttpTransport::new(url, timeout)?))
    } else {
        Err(HoistError::Config {
            message: format!(
                "Repository '{}' has unsupported URL '{url}' (expected http://, https:// or file://)",
                target.name
            ),
        }
        .into())
    }
}

/// Maven repository over HTTP(S).
pub struct HttpTransport {
    base_url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> miette::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HoistError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn describe(&self, path: &str) -> String {
        self.url(path)
    }

    async fn put(
        &self,
        path: &str,
        data: &[u8],
        credentials: &Credentials,
    ) -> Result<u16, HoistError> {
        let url = self.url(path);
        let request = auth::apply_auth(self.client.put(&url), credentials).body(data.to_vec());
        let resp = request.send().await.map_err(|e| HoistError::Upload {
            path: path.to_string(),
            message: format!("request to {url} failed: {e}"),
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(status.as_u16());
        }
        let message = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => format!(
                "HTTP {status}: the repository rejected the credentials ({})",
                credentials.describe()
            ),
            _ => {
                let body = resp.text().await.unwrap_or_default();
                let snippet: String = body.trim().chars().take(BODY_SNIPPET_LEN).collect();
                if snippet.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {snippet}")
                }
            }
        };
        Err(HoistError::Upload {
            path: path.to_string(),
            message,
        })
    }

    async fn get(
        &self,
        path: &str,
        credentials: &Credentials,
    ) -> Result<Option<Vec<u8>>, HoistError> {
        let url = self.url(path);
        let resp = auth::apply_auth(self.client.get(&url), credentials)
            .send()
            .await
            .map_err(|e| HoistError::Network {
                message: format!("GET {url} failed: {e}"),
            })?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(HoistError::Network {
                message: format!("HTTP {status} fetching {url}"),
            });
        }
        let bytes = resp.bytes().await.map_err(|e| HoistError::Network {
            message: format!("Failed to read response from {url}: {e}"),
        })?;
        Ok(Some(bytes.to_vec()))
    }
}

/// Maven repository laid out in a local directory (`file://` URLs).
///
/// Every write goes through a temporary file in the destination directory
/// and is renamed into place, so a destination path never holds a partial
/// file.
#[derive(Debug, Clone)]
pub struct FileTransport {
    root: PathBuf,
}

impl FileTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_url(url: &str) -> miette::Result<Self> {
        match url.strip_prefix("file://") {
            Some(path) if !path.is_empty() => Ok(Self::new(path)),
            _ => Err(HoistError::Config {
                message: format!("'{url}' is not a file:// URL with a path"),
            }
            .into()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, HoistError> {
        let rel = Path::new(path);
        let escapes = rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || path.is_empty() {
            return Err(HoistError::Upload {
                path: path.to_string(),
                message: "path must stay inside the repository".to_string(),
            });
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl Transport for FileTransport {
    fn describe(&self, path: &str) -> String {
        format!("file://{}", self.root.join(path).display())
    }

    async fn put(
        &self,
        path: &str,
        data: &[u8],
        _credentials: &Credentials,
    ) -> Result<u16, HoistError> {
        let dest = self.resolve(path)?;
        let data = data.to_vec();
        let existed = dest.is_file();
        let upload_err = |message: String| HoistError::Upload {
            path: path.to_string(),
            message,
        };

        // A dropped future discards the staged file; `dest` is left as it was.
        let staged_dest = dest.clone();
        let staged = tokio::task::spawn_blocking(move || {
            hoist_util::fs::stage_atomic(&staged_dest, &data)
        })
        .await
        .map_err(|e| upload_err(format!("write task failed: {e}")))?
        .map_err(|e| upload_err(e.to_string()))?;
        staged
            .persist(&dest)
            .map_err(|e| upload_err(e.error.to_string()))?;

        Ok(if existed { 200 } else { 201 })
    }

    async fn get(
        &self,
        path: &str,
        _credentials: &Credentials,
    ) -> Result<Option<Vec<u8>>, HoistError> {
        let src = self.resolve(path)?;
        match tokio::fs::read(&src).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(HoistError::Io(e)),
        }
    }
}

/// Keeps uploads in memory. Used for `--dry-run` and tests.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far, keyed by path.
    pub fn files(&self) -> BTreeMap<String, Vec<u8>> {
        self.lock().clone()
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.lock().get(path).cloned()
    }

    /// Seed a file, as if it had been published earlier.
    pub fn insert(&self, path: &str, data: impl Into<Vec<u8>>) {
        self.lock().insert(path.to_string(), data.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn describe(&self, path: &str) -> String {
        format!("memory:{path}")
    }

    async fn put(
        &self,
        path: &str,
        data: &[u8],
        _credentials: &Credentials,
    ) -> Result<u16, HoistError> {
        let previous = self.lock().insert(path.to_string(), data.to_vec());
        Ok(if previous.is_some() { 200 } else { 201 })
    }

    async fn get(
        &self,
        path: &str,
        _credentials: &Credentials,
    ) -> Result<Option<Vec<u8>>, HoistError> {
        Ok(self.file(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hoist_core::config::AuthMode;
    use secrecy::SecretString;

    const JAR: &str = "org/ow2/asm/asm-deprecated/9.9/asm-deprecated-9.9.jar";

    #[tokio::test]
    async fn file_put_then_get() {
        let tmp = tempfile::TempDir::new().unwrap();
        let transport = FileTransport::new(tmp.path());

        let status = transport.put(JAR, b"jar bytes", &Credentials::Anonymous).await.unwrap();
        assert_eq!(status, 201);
        assert_eq!(
            transport.get(JAR, &Credentials::Anonymous).await.unwrap().as_deref(),
            Some(&b"jar bytes"[..])
        );
        assert_eq!(std::fs::read(tmp.path().join(JAR)).unwrap(), b"jar bytes");
    }

    #[tokio::test]
    async fn file_overwrite_leaves_no_temp_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        let transport = FileTransport::new(tmp.path());

        transport.put(JAR, b"first", &Credentials::Anonymous).await.unwrap();
        let status = transport.put(JAR, b"second", &Credentials::Anonymous).await.unwrap();
        assert_eq!(status, 200);

        let dir = tmp.path().join("org/ow2/asm/asm-deprecated/9.9");
        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["asm-deprecated-9.9.jar"]);
        assert_eq!(std::fs::read(dir.join("asm-deprecated-9.9.jar")).unwrap(), b"second");
    }

    #[tokio::test]
    async fn file_put_dropped_mid_write_publishes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let transport = FileTransport::new(tmp.path());
        let data = vec![7u8; 16 * 1024 * 1024];

        let put = transport.put(JAR, &data, &Credentials::Anonymous);
        assert!(tokio::time::timeout(Duration::ZERO, put).await.is_err());
        tokio::time::sleep(Duration::from_millis(200)).await;

        let dir = tmp.path().join("org/ow2/asm/asm-deprecated/9.9");
        let entries = || std::fs::read_dir(&dir).map(|e| e.count()).unwrap_or(0);
        for _ in 0..100 {
            if entries() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!dir.join("asm-deprecated-9.9.jar").exists());
        assert_eq!(entries(), 0);
    }

    #[tokio::test]
    async fn file_get_missing_is_none() {
        let tmp = tempfile::TempDir::new().unwrap();
        let transport = FileTransport::new(tmp.path());
        assert!(transport
            .get("org/x/maven-metadata.xml", &Credentials::Anonymous)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn file_rejects_escaping_paths() {
        let tmp = tempfile::TempDir::new().unwrap();
        let transport = FileTransport::new(tmp.path().join("repo"));
        for path in ["../outside.jar", "/etc/passwd", "a/../../b"] {
            let err = transport.put(path, b"x", &Credentials::Anonymous).await.unwrap_err();
            assert!(matches!(err, HoistError::Upload { .. }), "{path}");
        }
        assert!(!tmp.path().join("outside.jar").exists());
    }

    #[tokio::test]
    async fn memory_reports_create_and_overwrite() {
        let transport = MemoryTransport::new();
        assert_eq!(transport.put(JAR, b"a", &Credentials::Anonymous).await.unwrap(), 201);
        assert_eq!(transport.put(JAR, b"b", &Credentials::Anonymous).await.unwrap(), 200);
        assert_eq!(transport.file(JAR).unwrap(), b"b");
        assert_eq!(transport.files().len(), 1);
    }

    #[tokio::test]
    async fn http_connection_failure_is_upload_error() {
        let transport = HttpTransport::new("http://127.0.0.1:9", Duration::from_secs(5)).unwrap();
        let err = transport.put(JAR, b"x", &Credentials::Anonymous).await.unwrap_err();
        match err {
            HoistError::Upload { path, .. } => assert_eq!(path, JAR),
            other => panic!("unexpected {other:?}"),
        }
    }

    fn header(head: &str, name: &str) -> Option<String> {
        head.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }

    /// Local HTTP server answering every request with `status`. Returns the
    /// base URL and the recorded request heads.
    async fn stub_server(status: &'static str) -> (String, std::sync::Arc<Mutex<Vec<String>>>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}/maven", listener.local_addr().unwrap());
        let heads = std::sync::Arc::new(Mutex::new(Vec::new()));
        let recorded = heads.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 8192];
                    let head_end = loop {
                        if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                            break i + 4;
                        }
                        let n = stream.read(&mut chunk).await.unwrap();
                        if n == 0 {
                            return;
                        }
                        buf.extend_from_slice(&chunk[..n]);
                    };
                    let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
                    let body_len = header(&head, "content-length")
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0);
                    while buf.len() < head_end + body_len {
                        let n = stream.read(&mut chunk).await.unwrap();
                        if n == 0 {
                            break;
                        }
                        buf.extend_from_slice(&chunk[..n]);
                    }
                    recorded.lock().unwrap().push(head);
                    let response = format!(
                        "HTTP/1.1 {status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });
        (base, heads)
    }

    #[tokio::test]
    async fn http_put_sends_basic_auth() {
        let (base, heads) = stub_server("201 Created").await;
        let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();
        let creds = Credentials::Basic {
            username: "deployer".to_string(),
            password: SecretString::new("s3cret".to_string().into()),
        };

        let status = transport.put(JAR, b"jar bytes", &creds).await.unwrap();
        assert_eq!(status, 201);

        let heads = heads.lock().unwrap();
        assert!(heads[0].starts_with(&format!("PUT /maven/{JAR} HTTP/1.1")), "{}", heads[0]);
        assert_eq!(
            header(&heads[0], "authorization").as_deref(),
            Some("Basic ZGVwbG95ZXI6czNjcmV0")
        );
    }

    #[tokio::test]
    async fn http_put_sends_bearer_token() {
        let (base, heads) = stub_server("200 OK").await;
        let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();
        let creds = Credentials::Bearer {
            token: SecretString::new("tok-123".to_string().into()),
        };

        assert_eq!(transport.put(JAR, b"x", &creds).await.unwrap(), 200);
        assert_eq!(
            header(&heads.lock().unwrap()[0], "authorization").as_deref(),
            Some("Bearer tok-123")
        );
    }

    #[tokio::test]
    async fn http_anonymous_put_has_no_authorization() {
        let (base, heads) = stub_server("201 Created").await;
        let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();

        transport.put(JAR, b"x", &Credentials::Anonymous).await.unwrap();
        assert_eq!(header(&heads.lock().unwrap()[0], "authorization"), None);
    }

    #[tokio::test]
    async fn http_rejected_credentials_do_not_leak_secret() {
        let (base, _heads) = stub_server("401 Unauthorized").await;
        let transport = HttpTransport::new(&base, Duration::from_secs(5)).unwrap();
        let creds = Credentials::Basic {
            username: "deployer".to_string(),
            password: SecretString::new("s3cret".to_string().into()),
        };

        let err = transport.put(JAR, b"x", &creds).await.unwrap_err();
        let shown = err.to_string();
        assert!(shown.contains("401"), "{shown}");
        assert!(shown.contains("rejected the credentials"), "{shown}");
        assert!(!shown.contains("s3cret"), "{shown}");
    }

    #[test]
    fn transport_chosen_by_scheme() {
        let timeout = Duration::from_secs(1);
        let file = RepositoryTarget::new("local", "file:///tmp/repo", AuthMode::None);
        assert_eq!(
            transport_for(&file, timeout).unwrap().describe("a/b.jar"),
            "file:///tmp/repo/a/b.jar"
        );

        let http = RepositoryTarget::new("remote", "https://repo.example.com/maven/", AuthMode::Auto);
        assert_eq!(
            transport_for(&http, timeout).unwrap().describe("a/b.jar"),
            "https://repo.example.com/maven/a/b.jar"
        );

        let ftp = RepositoryTarget::new("old", "ftp://repo.example.com", AuthMode::Auto);
        assert!(transport_for(&ftp, timeout).is_err());
    }
}
