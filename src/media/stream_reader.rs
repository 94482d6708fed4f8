use std::sync::Arc;

use futures::StreamExt;
use image::RgbaImage;
use reqwest::header::CONTENT_TYPE;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::mjpeg::{DEFAULT_BOUNDARY, MjpegDecoder, boundary_from_content_type};
use crate::backend::VIDEO_FEED;
use crate::error::{AppError, BackendError};

#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub sequence: u64,
    pub image: Arc<RgbaImage>,
}

/// Owns one connection to the video feed. Dropping the reader closes it.
pub struct StreamReader {
    url: String,
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
}

impl StreamReader {
    pub fn spawn(
        runtime: &Handle,
        client: reqwest::Client,
        url: String,
        frame_tx: watch::Sender<Option<VideoFrame>>,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let task = runtime.spawn({
            let url = url.clone();
            let cancel_token = cancel_token.clone();
            async move {
                info!(%url, "Opening video feed");
                match read_stream(client, &url, frame_tx, cancel_token).await {
                    Ok(frames) => info!(%url, frames, "Video feed closed"),
                    Err(e) => error!(%url, "Video feed failed: {}", e),
                }
            }
        });

        Self {
            url,
            cancel_token,
            task,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
        self.task.abort();
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn read_stream(
    client: reqwest::Client,
    url: &str,
    frame_tx: watch::Sender<Option<VideoFrame>>,
    cancel_token: CancellationToken,
) -> Result<u64, AppError> {
    let response = tokio::select! {
        _ = cancel_token.cancelled() => return Ok(0),
        response = client.get(url).send() => response.map_err(|e| BackendError::Request {
            endpoint: VIDEO_FEED,
            reason: e.to_string(),
        })?,
    };

    if !response.status().is_success() {
        return Err(BackendError::Status {
            endpoint: VIDEO_FEED,
            status: response.status().as_u16(),
        }
        .into());
    }

    let boundary = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(boundary_from_content_type)
        .unwrap_or_else(|| DEFAULT_BOUNDARY.to_string());
    debug!(%boundary, "Video feed connected");

    let mut decoder = MjpegDecoder::new(&boundary);
    let mut body = response.bytes_stream();
    let mut sequence = 0;

    loop {
        let chunk = tokio::select! {
            _ = cancel_token.cancelled() => break,
            chunk = body.next() => chunk,
        };
        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                return Err(BackendError::Request {
                    endpoint: VIDEO_FEED,
                    reason: e.to_string(),
                }
                .into());
            }
            None => {
                // The last part has no delimiter after it.
                if let Some(part) = decoder.finish() {
                    publish(&frame_tx, &mut sequence, &part);
                }
                break;
            }
        };

        for part in decoder.push(&bytes)? {
            publish(&frame_tx, &mut sequence, &part);
        }
    }

    Ok(sequence)
}

fn publish(frame_tx: &watch::Sender<Option<VideoFrame>>, sequence: &mut u64, part: &[u8]) {
    match image::load_from_memory(part) {
        Ok(image) => {
            *sequence += 1;
            frame_tx.send_replace(Some(VideoFrame {
                sequence: *sequence,
                image: Arc::new(image.to_rgba8()),
            }));
        }
        Err(e) => warn!("Skipping undecodable frame ({} bytes): {}", part.len(), e),
    }
}
