// Access log format module
// One line per request in the Apache/Nginx combined shape.

use chrono::Local;

/// Access log entry containing the request/response information we record
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Client address, `X-Forwarded-For`-aware when the proxy is trusted
    pub remote_addr: String,
    pub time: chrono::DateTime<Local>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub body_bytes: usize,
}

impl AccessLogEntry {
    pub fn new(remote_addr: String, method: String, path: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            path,
            status: 200,
            body_bytes: 0,
        }
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    pub fn combined(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/1.1\" {} {}",
            self.remote_addr,
            self.time.format("%d/%b/%Y:%H:%M:%S %z"),
            self.method,
            self.path,
            self.status,
            self.body_bytes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_shape() {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1".to_string(),
            "GET".to_string(),
            "/helloworld".to_string(),
        );
        entry.status = 200;
        entry.body_bytes = 12;

        let line = entry.combined();
        assert!(line.starts_with("192.168.1.1 - - ["));
        assert!(line.contains("\"GET /helloworld HTTP/1.1\""));
        assert!(line.ends_with("200 12"));
    }
}
