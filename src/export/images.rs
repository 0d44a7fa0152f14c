//! Inline remote images as data URIs

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::CONTENT_TYPE;

use crate::html;

const FALLBACK_MIME: &str = "application/octet-stream";

pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// Replace every remote `<img src>` with its fetched content
///
/// Images that fail to download keep their original URL.
pub async fn embed_remote_images(client: &reqwest::Client, html: &str) -> String {
    let images = html::remote_images(html);
    if images.is_empty() {
        return html.to_string();
    }

    let mut fetched: HashMap<String, Option<String>> = HashMap::new();
    let mut edits = Vec::with_capacity(images.len());

    for image in images {
        if !fetched.contains_key(&image.src) {
            let uri = match fetch_data_uri(client, &image.src).await {
                Ok(uri) => Some(uri),
                Err(e) => {
                    log::warn!("Keeping remote image {}: {}", image.src, e);
                    None
                }
            };
            fetched.insert(image.src.clone(), uri);
        }

        if let Some(Some(uri)) = fetched.get(&image.src) {
            edits.push((image.range, uri.clone()));
        }
    }

    log::debug!("Inlined {} image reference(s)", edits.len());
    html::replace_ranges(html, edits)
}

async fn fetch_data_uri(client: &reqwest::Client, src: &str) -> Result<String, reqwest::Error> {
    let response = client.get(src).send().await?.error_for_status()?;
    let mime = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(FALLBACK_MIME)
        .to_string();
    let bytes = response.bytes().await?;
    Ok(data_uri(&mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve a 4-byte PNG to every request; returns the port and a hit counter
    async fn image_server() -> (u16, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = "HTTP/1.1 200 OK\r\nContent-Type: image/png; charset=binary\r\nContent-Length: 4\r\nConnection: close\r\n\r\n";
                let _ = stream.write_all(head.as_bytes()).await;
                let _ = stream.write_all(b"\x89PNG").await;
                let _ = stream.shutdown().await;
            }
        });

        (port, hits)
    }

    #[test]
    fn test_data_uri_format() {
        assert_eq!(data_uri("image/gif", b"GIF"), "data:image/gif;base64,R0lG");
    }

    #[tokio::test]
    async fn test_no_images_is_unchanged() {
        let html = "<p>No pictures</p>";
        assert_eq!(embed_remote_images(&reqwest::Client::new(), html).await, html);
    }

    #[tokio::test]
    async fn test_remote_image_is_inlined() {
        let (port, hits) = image_server().await;
        let html = format!(
            r#"<p>Chart</p><img alt="c" src="http://127.0.0.1:{p}/a.png"><img src="http://127.0.0.1:{p}/a.png">"#,
            p = port
        );

        let out = embed_remote_images(&reqwest::Client::new(), &html).await;

        assert_eq!(
            out,
            r#"<p>Chart</p><img alt="c" src="data:image/png;base64,iVBORw=="><img src="data:image/png;base64,iVBORw==">"#
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_reference() {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let html = format!(r#"<img src="http://127.0.0.1:{}/gone.png">"#, port);

        let out = embed_remote_images(&reqwest::Client::new(), &html).await;

        assert_eq!(out, html);
    }

    #[tokio::test]
    async fn test_inline_images_are_left_alone() {
        let html = r#"<img src="data:image/png;base64,AAAA">"#;
        assert_eq!(embed_remote_images(&reqwest::Client::new(), html).await, html);
    }
}
