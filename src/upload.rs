//! HTTP transport: the multipart classify POST and the diagnostic probe.

use anyhow::{bail, Result};
use classifier_core::interpret::{parse_probe, ProbeReply, UploadResult};
use classifier_core::multipart::MultipartPayload;
use classifier_core::session::Transport;
use embedded_svc::http::client::Client;
use embedded_svc::http::Method;
use embedded_svc::io::{Read, Write};
use esp_idf_svc::http::client::{Configuration as HttpConfig, EspHttpConnection};
use std::time::Duration;

use crate::config::Config;

pub struct HttpTransport {
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
            response_timeout: config.response_timeout,
        }
    }

    // esp_http_client exposes a single socket timeout covering connect and
    // read; the upload runs on the response budget, the tiny diagnostic GET
    // on the connect budget.
    fn client(&self, timeout: Duration) -> Result<Client<EspHttpConnection>> {
        let config = HttpConfig {
            buffer_size: Some(4096),
            timeout: Some(timeout),
            crt_bundle_attach: Some(esp_idf_sys::esp_crt_bundle_attach),
            ..Default::default()
        };
        Ok(Client::wrap(EspHttpConnection::new(&config)?))
    }

    fn post_multipart(&self, url: &str, payload: &MultipartPayload) -> Result<(u16, String)> {
        let mut client = self.client(self.response_timeout)?;

        let content_type = payload.content_type();
        let content_length = payload.len().to_string();
        let headers = [
            ("Content-Type", content_type.as_str()),
            ("Content-Length", content_length.as_str()),
        ];

        let mut request = client.request(Method::Post, url, &headers)?;
        request.write_all(payload.as_bytes())?;
        let mut response = request.submit()?;

        let status = response.status();
        let mut body = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let bytes_read = response.read(&mut buf)?;
            if bytes_read == 0 {
                break;
            }
            body.extend_from_slice(&buf[..bytes_read]);
        }

        Ok((status, String::from_utf8_lossy(&body).into_owned()))
    }

    /// Diagnostic GET against the test endpoint (`get` command).
    pub fn probe(&self, url: &str) -> Result<ProbeReply> {
        let mut client = self.client(self.connect_timeout)?;
        let request = client.request(Method::Get, url, &[])?;
        let mut response = request.submit()?;

        let status = response.status();
        if status != 200 {
            bail!("probe returned HTTP {status}");
        }

        let mut body = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let bytes_read = response.read(&mut buf)?;
            if bytes_read == 0 {
                break;
            }
            body.extend_from_slice(&buf[..bytes_read]);
        }

        Ok(parse_probe(&String::from_utf8_lossy(&body))?)
    }
}

impl Transport for HttpTransport {
    /// One send per capture cycle, no internal retry. Transport-level
    /// failures come back as a non-positive status; error responses keep
    /// their body so server diagnostics survive.
    fn send(&mut self, url: &str, payload: &MultipartPayload) -> UploadResult {
        log::info!("POST {url} ({} bytes)", payload.len());
        match self.post_multipart(url, payload) {
            Ok((status, body)) => {
                log::info!("HTTP response code: {status}");
                UploadResult::received(status as i32, body)
            }
            Err(e) => {
                log::error!("upload transport failure: {e:?}");
                UploadResult::transport_failure(e.to_string())
            }
        }
    }
}
