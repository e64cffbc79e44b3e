use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::info;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE, USER_AGENT};

use crate::error::AppErr;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// Cadence at which the main thread re-checks the completion flag.
const POLL_TICK: Duration = Duration::from_millis(500);

// Slack past the network timeout before the waiter gives up on the worker.
const WAIT_GRACE: Duration = Duration::from_secs(15);

/// A single in-flight download running on a dedicated worker thread.
///
/// The worker publishes its result exactly once: it fills the slot, then
/// raises the completion flag. The waiter reads the slot only after it has
/// observed the flag.
pub struct Download {
    completed: Arc<AtomicBool>,
    slot: Arc<Mutex<Option<Result<Vec<u8>, AppErr>>>>,
}

impl Download {
    pub fn start(url: String) -> Download {
        Download::spawn(move || fetch_once(&url))
    }

    fn spawn<F>(work: F) -> Download
    where
        F: FnOnce() -> Result<Vec<u8>, AppErr> + Send + 'static,
    {
        let completed = Arc::new(AtomicBool::new(false));
        let slot = Arc::new(Mutex::new(None));

        let worker_completed = Arc::clone(&completed);
        let worker_slot = Arc::clone(&slot);
        thread::spawn(move || {
            let result = work();
            if let Ok(mut guard) = worker_slot.lock() {
                *guard = Some(result);
            }
            worker_completed.store(true, Ordering::Release);
        });

        Download { completed, slot }
    }

    /// Block until the worker signals completion, then take its result.
    pub fn wait(self) -> Result<Vec<u8>, AppErr> {
        self.wait_until(Instant::now() + FETCH_TIMEOUT + WAIT_GRACE)
    }

    fn wait_until(self, deadline: Instant) -> Result<Vec<u8>, AppErr> {
        while !self.completed.load(Ordering::Acquire) {
            if Instant::now() >= deadline {
                return Err(AppErr::new("download", "Worker did not complete before the deadline"));
            }
            thread::sleep(POLL_TICK);
        }

        let mut guard = self
            .slot
            .lock()
            .map_err(|_| AppErr::new("download", "Worker abandoned its result"))?;
        guard
            .take()
            .ok_or_else(|| AppErr::new("download", "Worker signalled completion without a result"))?
    }
}

fn fetch_once(url: &str) -> Result<Vec<u8>, AppErr> {
    let client = Client::builder()
        .timeout(FETCH_TIMEOUT)
        .default_headers(browser_headers())
        .build()?;

    info!("Sending request to download image...");
    let response = client.get(url).send().map_err(classify)?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppErr::new("http", &format!("Request failed with status {}", status)));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_owned();

    info!("Reading image data...");
    let body = response.bytes().map_err(classify)?;
    info!("Content type: {}", content_type);

    Ok(body.to_vec())
}

fn classify(err: reqwest::Error) -> AppErr {
    if err.is_timeout() {
        AppErr::new("timeout", "Request timeout - image download failed")
    } else if err.is_connect() {
        AppErr::new("connect", "Connection error - check internet connection")
    } else {
        AppErr::from(err)
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Linux; Android 10; SM-G973F) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.120 Mobile Safari/537.36",
        ),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("image/webp,image/apng,image/*,*/*;q=0.8"));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("upgrade-insecure-requests", HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("image"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("no-cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("cross-site"));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_mimic_a_browser() {
        let headers = browser_headers();
        assert_eq!(headers.len(), 8);
        let agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
        assert!(agent.map_or(false, |v| v.starts_with("Mozilla/5.0")));
        let accept = headers.get(ACCEPT).and_then(|v| v.to_str().ok());
        assert!(accept.map_or(false, |v| v.contains("image/webp")));
        assert_eq!(headers.get("sec-fetch-dest").and_then(|v| v.to_str().ok()), Some("image"));
    }

    #[test]
    fn wait_returns_the_worker_buffer() {
        let download = Download::spawn(|| Ok(vec![0xff, 0xd8, 0xff]));
        let buffer = download.wait().unwrap();
        assert_eq!(buffer, vec![0xff, 0xd8, 0xff]);
    }

    #[test]
    fn wait_surfaces_the_worker_error() {
        let download = Download::spawn(|| Err(AppErr::new("http", "Request failed with status 403")));
        let err = download.wait().unwrap_err();
        assert!(format!("{}", err).contains("[http]"));
    }

    #[test]
    fn wait_gives_up_when_the_worker_hangs() {
        let download = Download::spawn(|| {
            thread::sleep(Duration::from_secs(1));
            Ok(Vec::new())
        });
        let err = download.wait_until(Instant::now()).unwrap_err();
        assert!(format!("{}", err).contains("deadline"));
    }
}
