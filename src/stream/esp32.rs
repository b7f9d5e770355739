//! ESP32-CAM transport: MJPEG over HTTP, with single-JPEG snapshot fallback
//! and remote framesize control.

use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::time::Duration;
use url::Url;

use super::resilient::{CameraTransport, QualityLevel, ResilientSource};
use crate::frame::Frame;

/// ESP32-CAM source with reconnection and quality adaptation.
pub type Esp32Source = ResilientSource<HttpCameraTransport>;

const MAX_JPEG_BYTES: usize = 5 * 1024 * 1024;
const CONTROL_TIMEOUT: Duration = Duration::from_secs(3);

enum Connection {
    /// Persistent multipart stream.
    Mjpeg(MjpegStream),
    /// Endpoint serves one JPEG per request.
    Snapshot,
}

/// Blocking HTTP transport for an ESP32-CAM.
pub struct HttpCameraTransport {
    stream_url: Url,
    connection: Option<Connection>,
}

impl HttpCameraTransport {
    pub fn new(url: &str) -> Result<Self> {
        let stream_url = Url::parse(url).with_context(|| format!("parse stream url {}", url))?;
        Ok(Self {
            stream_url,
            connection: None,
        })
    }

    /// The camera's control endpoint. The ESP32 firmware serves the stream on
    /// port 81 and controls on the web server port.
    fn control_url(&self, level: QualityLevel) -> Url {
        let mut url = self.stream_url.clone();
        url.set_path("/control");
        url.set_query(Some(&format!("var=framesize&val={}", level.framesize)));
        if url.port() == Some(81) {
            let _ = url.set_port(None);
        }
        url
    }
}

impl CameraTransport for HttpCameraTransport {
    fn open(&mut self) -> Result<()> {
        let response = ureq::get(self.stream_url.as_str())
            .call()
            .context("connect to camera stream")?;

        let content_type = response.header("Content-Type").unwrap_or("");
        self.connection = if content_type.to_lowercase().contains("multipart") {
            Some(Connection::Mjpeg(MjpegStream::new(response.into_reader())))
        } else {
            Some(Connection::Snapshot)
        };
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        let connection = self
            .connection
            .as_mut()
            .ok_or_else(|| anyhow!("camera transport not connected"))?;

        let jpeg = match connection {
            Connection::Mjpeg(stream) => stream.next_jpeg()?,
            Connection::Snapshot => fetch_snapshot(self.stream_url.as_str())?,
        };
        Frame::from_jpeg(&jpeg)
    }

    fn close(&mut self) {
        self.connection = None;
    }

    fn request_quality(&mut self, level: QualityLevel) -> Result<()> {
        let url = self.control_url(level);
        ureq::get(url.as_str())
            .timeout(CONTROL_TIMEOUT)
            .call()
            .with_context(|| format!("send framesize control request to {}", url))?;
        Ok(())
    }
}

struct MjpegStream {
    reader: Box<dyn Read + Send>,
    buffer: Vec<u8>,
}

impl MjpegStream {
    fn new(reader: impl Read + Send + 'static) -> Self {
        Self {
            reader: Box::new(reader),
            buffer: Vec::with_capacity(64 * 1024),
        }
    }

    /// Pull bytes until a complete SOI..EOI JPEG sits in the buffer.
    fn next_jpeg(&mut self) -> Result<Vec<u8>> {
        let mut chunk = vec![0u8; 8192];
        loop {
            if let Some((start, end)) = jpeg_bounds(&self.buffer) {
                let jpeg = self.buffer[start..end].to_vec();
                self.buffer.drain(..end);
                return Ok(jpeg);
            }

            let read = self.reader.read(&mut chunk).context("read mjpeg chunk")?;
            if read == 0 {
                return Err(anyhow!("mjpeg stream ended"));
            }
            self.buffer.extend_from_slice(&chunk[..read]);

            if self.buffer.len() > MAX_JPEG_BYTES {
                self.buffer.clear();
                return Err(anyhow!("mjpeg frame exceeded {} bytes", MAX_JPEG_BYTES));
            }
        }
    }
}

fn fetch_snapshot(url: &str) -> Result<Vec<u8>> {
    let response = ureq::get(url)
        .call()
        .with_context(|| format!("fetch jpeg snapshot from {}", url))?;
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .context("read jpeg snapshot")?;
    if bytes.is_empty() {
        return Err(anyhow!("empty jpeg snapshot"));
    }
    Ok(bytes)
}

fn jpeg_bounds(buffer: &[u8]) -> Option<(usize, usize)> {
    let start = buffer.windows(2).position(|w| w == [0xFF, 0xD8])?;
    let end = buffer[start + 2..]
        .windows(2)
        .position(|w| w == [0xFF, 0xD9])
        .map(|p| start + 2 + p + 2)?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_bounds_finds_embedded_frame() {
        let mut data = vec![0x00, 0x01];
        data.extend_from_slice(&[0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9]);
        data.extend_from_slice(&[0x02]);
        let (start, end) = jpeg_bounds(&data).unwrap();
        assert_eq!(&data[start..end], &[0xFF, 0xD8, 0xAA, 0xBB, 0xFF, 0xD9]);
    }

    #[test]
    fn jpeg_bounds_waits_for_terminator() {
        let data = [0xFF, 0xD8, 0xAA, 0xBB];
        assert!(jpeg_bounds(&data).is_none());
    }

    #[test]
    fn control_url_targets_web_server_port() {
        let transport = HttpCameraTransport::new("http://192.168.1.17:81/stream").unwrap();
        let url = transport.control_url(QualityLevel {
            name: "QVGA",
            framesize: 5,
        });
        assert_eq!(url.as_str(), "http://192.168.1.17/control?var=framesize&val=5");
    }
}
