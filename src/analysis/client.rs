use std::time::Duration;

use async_trait::async_trait;

use crate::analysis::types::AnalyzeImageResponse;
use crate::analysis::upload::ImageUpload;
use crate::config::ApiConfig;
use crate::errors::{ObscuraError, ObscuraResult};

/// Anything that can turn an uploaded image into findings.
/// The screen controller only talks to this trait.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze_image(&self, upload: &ImageUpload) -> ObscuraResult<AnalyzeImageResponse>;
}

/// Posts the image as multipart form data to the analysis service.
pub struct HttpAnalysisClient {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpAnalysisClient {
    pub fn new(endpoint: String, timeout: Option<Duration>) -> ObscuraResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            endpoint,
            client: builder.build()?,
        })
    }

    pub fn from_config(api: &ApiConfig) -> ObscuraResult<Self> {
        Self::new(api.endpoint_url(), api.timeout_secs.map(Duration::from_secs))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn analyze_image(&self, upload: &ImageUpload) -> ObscuraResult<AnalyzeImageResponse> {
        upload.validate()?;

        let request_id = uuid::Uuid::new_v4();
        let part = reqwest::multipart::Part::bytes(upload.bytes.clone())
            .file_name(upload.file_name.clone())
            .mime_str(&upload.mime)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        tracing::info!(
            %request_id,
            endpoint = %self.endpoint,
            mime = %upload.mime,
            bytes = upload.bytes.len(),
            "uploading image for analysis"
        );

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(%request_id, status = status.as_u16(), "analysis request rejected");
            return Err(ObscuraError::Analysis(format!("HTTP {}: {}", status.as_u16(), text)));
        }

        let parsed: AnalyzeImageResponse = serde_json::from_str(&text)?;
        tracing::info!(
            %request_id,
            findings = parsed.findings.len(),
            risk_score = parsed.risk_score,
            degraded = parsed.degraded,
            "analysis response received"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn jpeg_upload() -> ImageUpload {
        // JPEG magic followed by junk; enough for sniffing, not for probing.
        ImageUpload::from_bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F'], None)
    }

    fn local_client(endpoint: String) -> HttpAnalysisClient {
        HttpAnalysisClient {
            endpoint,
            client: reqwest::Client::builder()
                .no_proxy()
                .timeout(Duration::from_secs(5))
                .build()
                .unwrap(),
        }
    }

    /// Serve exactly one canned response and hand back the raw request text.
    async fn one_shot_server(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                raw.extend_from_slice(&buf[..n]);
                if request_complete(&raw) {
                    break;
                }
            }
            let reply = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(reply.as_bytes()).await.unwrap();
            sock.shutdown().await.ok();
            String::from_utf8_lossy(&raw).into_owned()
        });
        (format!("http://{addr}/analyze/image"), handle)
    }

    fn request_complete(raw: &[u8]) -> bool {
        let text = String::from_utf8_lossy(raw).to_ascii_lowercase();
        let Some(head_end) = text.find("\r\n\r\n") else {
            return false;
        };
        if text[..head_end].contains("transfer-encoding: chunked") {
            return text.ends_with("0\r\n\r\n");
        }
        let content_length = text[..head_end]
            .lines()
            .find_map(|l| {
                let (k, v) = l.split_once(':')?;
                (k == "content-length")
                    .then(|| v.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        raw.len() >= head_end + 4 + content_length
    }

    #[tokio::test]
    async fn posts_multipart_and_parses_findings() {
        let (url, server) = one_shot_server(
            "HTTP/1.1 200 OK",
            r#"{"findings":[{"kind":"face","bbox":[0.1,0.1,0.2,0.2],"conf":0.9}],"riskScore":30}"#,
        )
        .await;

        let client = local_client(url);
        let resp = client.analyze_image(&jpeg_upload()).await.unwrap();
        assert_eq!(resp.findings.len(), 1);
        assert_eq!(resp.findings[0].kind, "face");
        assert_eq!(resp.risk_score, 30);

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /analyze/image HTTP/1.1"));
        let lower = request.to_ascii_lowercase();
        assert!(lower.contains("multipart/form-data"));
        assert!(lower.contains("name=\"file\""));
        assert!(lower.contains("filename=\"upload.jpg\""));
        assert!(lower.contains("content-type: image/jpeg"));
    }

    #[tokio::test]
    async fn non_success_status_carries_body() {
        let (url, server) =
            one_shot_server("HTTP/1.1 400 Bad Request", r#"{"detail":"Unsupported image type"}"#).await;

        let client = local_client(url);
        let err = client.analyze_image(&jpeg_upload()).await.unwrap_err();
        match err {
            ObscuraError::Analysis(msg) => {
                assert!(msg.starts_with("HTTP 400: "));
                assert!(msg.contains("Unsupported image type"));
            }
            other => panic!("unexpected error: {other}"),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unsupported_upload_is_not_sent() {
        let client = HttpAnalysisClient::new("http://127.0.0.1:9/analyze/image".into(), None).unwrap();
        let upload = ImageUpload::from_bytes(b"plain text".to_vec(), Some("text/plain"));
        let err = client.analyze_image(&upload).await.unwrap_err();
        assert!(matches!(err, ObscuraError::Upload(_)));
    }
}
