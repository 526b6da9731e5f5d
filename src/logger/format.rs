//! Access log lines
//!
//! One [`AccessLogEntry`] per request, rendered in NCSA common/combined style or as
//! a JSON object.

use chrono::{DateTime, Local};
use hyper::header::{HeaderName, CONTENT_LENGTH, REFERER, USER_AGENT};
use hyper::http::request::Parts;
use hyper::HeaderMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Access log line layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Common,
    #[default]
    Combined,
    Json,
}

/// What gets logged for one request
#[derive(Debug, Clone, Serialize)]
pub struct AccessLogEntry {
    remote_addr: IpAddr,
    #[serde(serialize_with = "rfc3339")]
    time: DateTime<Local>,
    /// `METHOD /path?query HTTP/x.y`
    request: String,
    status: u16,
    /// Declared body length; `None` for bodies streamed without one
    body_bytes: Option<u64>,
    referer: Option<String>,
    user_agent: Option<String>,
    /// Time until the response head was handed to hyper
    head_us: u64,
}

fn rfc3339<S: serde::Serializer>(time: &DateTime<Local>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&time.to_rfc3339())
}

impl AccessLogEntry {
    /// Start an entry for a request, stamped with the current time
    pub fn from_request(parts: &Parts, peer_addr: SocketAddr) -> Self {
        let header = |name: HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        let target = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path(), |pq| pq.as_str());

        Self {
            remote_addr: peer_addr.ip(),
            time: Local::now(),
            request: format!("{} {target} {:?}", parts.method, parts.version),
            status: 0,
            body_bytes: None,
            referer: header(REFERER),
            user_agent: header(USER_AGENT),
            head_us: 0,
        }
    }

    /// Fill in the response side once the head is known
    pub fn record_response(&mut self, status: u16, headers: &HeaderMap, elapsed: Duration) {
        self.status = status;
        self.body_bytes = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        self.head_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
    }

    pub fn render(&self, format: LogFormat) -> String {
        match format {
            LogFormat::Json => serde_json::to_string(self).unwrap_or_default(),
            LogFormat::Common => self.common(),
            LogFormat::Combined => {
                let mut line = self.common();
                let _ = write!(
                    line,
                    " \"{}\" \"{}\"",
                    self.referer.as_deref().unwrap_or("-"),
                    self.user_agent.as_deref().unwrap_or("-"),
                );
                line
            }
        }
    }

    fn common(&self) -> String {
        let mut line = format!(
            "{} - - [{}] \"{}\" {} ",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.request,
            self.status,
        );
        match self.body_bytes {
            Some(n) => {
                let _ = write!(line, "{n}");
            }
            None => line.push('-'),
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;

    fn entry(uri: &str, length: Option<u64>) -> AccessLogEntry {
        let (parts, ()) = Request::builder()
            .method("GET")
            .uri(uri)
            .header(USER_AGENT, "curl/8.5.0")
            .header(REFERER, "https://example.com/")
            .body(())
            .unwrap()
            .into_parts();
        let mut entry = AccessLogEntry::from_request(&parts, "10.0.0.7:40112".parse().unwrap());

        let mut headers = HeaderMap::new();
        if let Some(n) = length {
            headers.insert(CONTENT_LENGTH, n.into());
        }
        entry.record_response(200, &headers, Duration::from_micros(830));
        entry
    }

    #[test]
    fn test_common_line() {
        let line = entry("/files/report.csv?v=2", Some(4096)).render(LogFormat::Common);
        assert!(line.starts_with("10.0.0.7 - - ["));
        assert!(line.ends_with("\"GET /files/report.csv?v=2 HTTP/1.1\" 200 4096"));
        assert!(!line.contains("curl"));
    }

    #[test]
    fn test_combined_appends_referer_and_agent() {
        let line = entry("/json", Some(15)).render(LogFormat::Combined);
        assert!(line.ends_with("200 15 \"https://example.com/\" \"curl/8.5.0\""));
    }

    #[test]
    fn test_streamed_body_without_length() {
        let line = entry("/endless", None).render(LogFormat::Common);
        assert!(line.ends_with(" 200 -"));
    }

    #[test]
    fn test_json_object() {
        let line = entry("/json", None).render(LogFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["remote_addr"], "10.0.0.7");
        assert_eq!(value["request"], "GET /json HTTP/1.1");
        assert_eq!(value["body_bytes"], serde_json::Value::Null);
        assert_eq!(value["head_us"], 830);
    }

    #[test]
    fn test_format_names() {
        let parse = |s: &str| serde_json::from_value::<LogFormat>(serde_json::json!(s));
        assert_eq!(parse("json").unwrap(), LogFormat::Json);
        assert_eq!(parse("common").unwrap(), LogFormat::Common);
        assert!(parse("apache").is_err());
        assert_eq!(LogFormat::default(), LogFormat::Combined);
    }
}
