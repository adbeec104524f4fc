use std::io::Read;
use std::time::Duration;

/// Upper bound on a single response body; Forvo pages and clips are far smaller.
const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// Issues a GET and re-issues it immediately on any transport error or
/// non-2xx status until it succeeds or `attempts` requests have been made.
pub(crate) fn get_bytes_with_retries(
    url: &str,
    timeout: Duration,
    attempts: usize,
) -> Result<Vec<u8>, String> {
    get_bytes_capped(url, timeout, attempts, MAX_BODY_BYTES)
}

/// A body longer than `max_body` fails the attempt instead of being cut short.
fn get_bytes_capped(
    url: &str,
    timeout: Duration,
    attempts: usize,
    max_body: u64,
) -> Result<Vec<u8>, String> {
    let attempts = attempts.max(1);
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .timeout_write(timeout)
        .build();

    let mut last_error = String::from("no request issued");
    for attempt in 1..=attempts {
        match agent.get(url).call() {
            Ok(response) => {
                let mut body = Vec::new();
                match response
                    .into_reader()
                    .take(max_body + 1)
                    .read_to_end(&mut body)
                {
                    Ok(_) if body.len() as u64 > max_body => {
                        last_error = format!("response body exceeds {max_body} bytes");
                    }
                    Ok(_) => return Ok(body),
                    Err(err) => last_error = format!("response read failed: {err}"),
                }
            }
            Err(ureq::Error::Status(status, _)) => {
                last_error = format!("HTTP status {status}");
            }
            Err(ureq::Error::Transport(err)) => {
                last_error = format!("transport error: {err}");
            }
        }
        log::debug!("GET {url} attempt {attempt}/{attempts} failed: {last_error}");
    }

    Err(format!(
        "request failed after {attempts} attempt(s): {last_error}"
    ))
}
