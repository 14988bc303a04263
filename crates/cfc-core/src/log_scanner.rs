// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Endpoint discovery in the recent-log window.
//!
//! The window is re-fetched on every poll and may still contain endpoints
//! from earlier sessions, so a candidate is accepted only when its line is
//! strictly newer than the high-water mark and tagged with the requested
//! instance index under the source tag of the app's backend: `[App/N]` on
//! the legacy backend, `[APP/PROC/WEB/N]` on the next-generation one.

use crate::timestamp::Timestamp;
use cfc_platform_client::{BackendKind, PlatformApi, PlatformError};
use regex::Regex;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

const FETCH_BACKOFF_MAX: Duration = Duration::from_secs(30);

const TIMESTAMP_PATTERN: &str = r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+[+-]\d{4}";

const LEGACY_TAG: &str = "App";
const NEXT_GEN_TAG: &str = "APP/PROC/WEB";

/// Source tag the backend stamps on application output
pub fn source_tag(backend: BackendKind) -> &'static str {
    match backend {
        BackendKind::Legacy => LEGACY_TAG,
        BackendKind::NextGeneration => NEXT_GEN_TAG,
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no recent log lines for {app}")]
    EmptyLogs { app: String },

    #[error("none of the {lines} recent log lines of {app} carries a timestamp")]
    NoTimestamp { app: String, lines: usize },

    #[error("no endpoint from instance {index} of {app} within {waited:?}")]
    Timeout { app: String, index: u32, waited: Duration },

    #[error("endpoint discovery cancelled")]
    Cancelled,

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Endpoint announcement as it appears on one log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Announcement<'l> {
    pub backend: BackendKind,
    pub instance_index: u32,
    pub address: &'l str,
}

/// Remote-access address announced by a freshly started instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: String,
    pub instance_index: u32,
    pub observed_at: Timestamp,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}

/// Compiled recognisers for timestamps and endpoint announcements
#[derive(Debug, Clone)]
pub struct LogPattern {
    timestamp: Regex,
    endpoint: Regex,
}

impl LogPattern {
    pub fn new(endpoint_domain: &str) -> Result<Self, regex::Error> {
        let timestamp = Regex::new(&format!(r"^\s*({TIMESTAMP_PATTERN})\s"))?;
        let endpoint = Regex::new(&format!(
            r"^\s*{TIMESTAMP_PATTERN}\s+\[({}|{})/(\d+)\].*\s(\S+@[A-Za-z0-9-]+\.{})\b",
            regex::escape(LEGACY_TAG),
            regex::escape(NEXT_GEN_TAG),
            regex::escape(endpoint_domain)
        ))?;
        Ok(Self { timestamp, endpoint })
    }

    /// Timestamp prefix of a line, if any.
    pub fn timestamp(&self, line: &str) -> Option<Timestamp> {
        let caps = self.timestamp.captures(line)?;
        caps.get(1)?.as_str().parse().ok()
    }

    /// Endpoint announced on a line, if any.
    pub fn endpoint<'l>(&self, line: &'l str) -> Option<Announcement<'l>> {
        let caps = self.endpoint.captures(line)?;
        let backend = if caps.get(1)?.as_str() == LEGACY_TAG {
            BackendKind::Legacy
        } else {
            BackendKind::NextGeneration
        };
        Some(Announcement {
            backend,
            instance_index: caps.get(2)?.as_str().parse().ok()?,
            address: caps.get(3)?.as_str(),
        })
    }

    /// Last endpoint in `lines` from instance `index` of a `backend` app
    /// logged strictly after `after`.
    pub fn scan_window<S: AsRef<str>>(
        &self,
        lines: &[S],
        backend: BackendKind,
        index: u32,
        after: &Timestamp,
    ) -> Option<Endpoint> {
        let mut found = None;
        for line in lines {
            let line = line.as_ref();
            let Some(at) = self.timestamp(line) else { continue };
            if at <= *after {
                continue;
            }
            let Some(seen) = self.endpoint(line) else { continue };
            if seen.backend != backend || seen.instance_index != index {
                trace!(
                    tag = source_tag(seen.backend),
                    tagged = seen.instance_index,
                    wanted = index,
                    "skipping endpoint of another instance"
                );
                continue;
            }
            found = Some(Endpoint {
                address: seen.address.to_string(),
                instance_index: index,
                observed_at: at,
            });
        }
        found
    }

    /// Timestamp of the last timestamped line.
    pub fn latest<S: AsRef<str>>(&self, lines: &[S]) -> Option<Timestamp> {
        lines.iter().rev().find_map(|l| self.timestamp(l.as_ref()))
    }
}

/// Polls the platform's recent logs
#[derive(Debug, Clone)]
pub struct LogScanner {
    pattern: LogPattern,
    poll_interval: Duration,
    max_wait: Duration,
}

impl LogScanner {
    pub fn new(pattern: LogPattern, poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            pattern,
            poll_interval,
            max_wait,
        }
    }

    pub fn pattern(&self) -> &LogPattern {
        &self.pattern
    }

    /// High-water mark: the timestamp of the newest line already logged.
    pub async fn latest_timestamp<P>(&self, platform: &P, app: &str) -> Result<Timestamp, ScanError>
    where
        P: PlatformApi + ?Sized,
    {
        let lines = platform.fetch_recent_logs(app).await?;
        if lines.is_empty() {
            return Err(ScanError::EmptyLogs { app: app.to_string() });
        }
        let mark = self.pattern.latest(&lines).ok_or_else(|| ScanError::NoTimestamp {
            app: app.to_string(),
            lines: lines.len(),
        })?;
        debug!(app, mark = %mark, "recorded log high-water mark");
        Ok(mark)
    }

    /// Poll until instance `index` announces an endpoint newer than `after`.
    ///
    /// A fetch still running at the deadline is abandoned.
    pub async fn await_new_endpoint<P>(
        &self,
        platform: &P,
        app: &str,
        backend: BackendKind,
        index: u32,
        after: &Timestamp,
        cancel: &CancellationToken,
    ) -> Result<Endpoint, ScanError>
    where
        P: PlatformApi + ?Sized,
    {
        let started = Instant::now();
        let deadline = started + self.max_wait;
        let mut polls = 0u32;
        let mut failures = 0u32;
        let timeout = || ScanError::Timeout {
            app: app.to_string(),
            index,
            waited: Instant::now() - started,
        };

        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ScanError::Cancelled),
                fetched = platform.fetch_recent_logs(app) => fetched,
                _ = sleep_until(deadline) => return Err(timeout()),
            };

            let delay = match fetched {
                Ok(lines) => {
                    polls += 1;
                    failures = 0;
                    if let Some(endpoint) = self.pattern.scan_window(&lines, backend, index, after) {
                        debug!(app, index, polls, endpoint = %endpoint, "endpoint discovered");
                        return Ok(endpoint);
                    }
                    trace!(app, index, polls, lines = lines.len(), "no fresh endpoint yet");
                    self.poll_interval
                }
                Err(err) if err.is_retryable() => {
                    failures += 1;
                    let delay = self.fetch_backoff(failures);
                    warn!(app, failures, delay_ms = delay.as_millis() as u64, error = %err, "log fetch failed");
                    delay
                }
                Err(err) => return Err(err.into()),
            };

            let now = Instant::now();
            if now >= deadline {
                return Err(timeout());
            }

            if wait_or_cancel(delay.min(deadline - now), cancel).await {
                return Err(ScanError::Cancelled);
            }
        }
    }

    fn fetch_backoff(&self, failures: u32) -> Duration {
        let factor = 1u32 << failures.min(8);
        self.poll_interval.saturating_mul(factor).min(FETCH_BACKOFF_MAX.max(self.poll_interval))
    }
}

/// Sleep for `delay`; true when cancelled first.
async fn wait_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => true,
        _ = sleep(delay) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEGACY: BackendKind = BackendKind::Legacy;
    const NEXT_GEN: BackendKind = BackendKind::NextGeneration;

    fn pattern() -> LogPattern {
        LogPattern::new("tmate.io").unwrap()
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn announced(backend: BackendKind, instance_index: u32, address: &str) -> Option<Announcement<'_>> {
        Some(Announcement {
            backend,
            instance_index,
            address,
        })
    }

    #[test]
    fn test_endpoint_extraction_legacy_and_diego_tags() {
        let p = pattern();
        let legacy = "2016-06-14T13:44:38.14-0700 [App/2]      OUT ssh session: ssh aBc123@nyc1.tmate.io";
        let diego = "2016-06-14T13:44:38.14-0700 [APP/PROC/WEB/0] OUT ssh session: ssh xyz@lon1.tmate.io";

        assert_eq!(p.endpoint(legacy), announced(LEGACY, 2, "aBc123@nyc1.tmate.io"));
        assert_eq!(p.endpoint(diego), announced(NEXT_GEN, 0, "xyz@lon1.tmate.io"));
        assert_eq!(p.endpoint("2016-06-14T13:44:38.14-0700 [RTR/0] OUT GET /"), None);
        assert_eq!(p.endpoint("2016-06-14T13:44:38.14-0700 [APP/PROC/WORKER/0] OUT ssh x@a.tmate.io"), None);
        assert_eq!(p.endpoint("ssh aBc@nyc1.tmate.io"), None);
    }

    #[test]
    fn test_endpoint_domain_is_literal() {
        let p = pattern();
        let spoof = "2016-06-14T13:44:38.14-0700 [App/2] OUT ssh x@nyc1.tmatexio";
        assert_eq!(p.endpoint(spoof), None);

        let custom = LogPattern::new("relay.internal").unwrap();
        let line = "2016-06-14T13:44:38.14-0700 [App/1] OUT ssh x@a1.relay.internal";
        assert_eq!(custom.endpoint(line), announced(LEGACY, 1, "x@a1.relay.internal"));
    }

    #[test]
    fn test_scan_window_filters_by_mark_and_index() {
        let p = pattern();
        let lines = [
            "2016-06-14T13:00:00.00-0700 [App/2]      OUT ssh old@nyc1.tmate.io",
            "2016-06-14T13:00:01.00-0700 [App/2]      OUT ssh fresh@nyc1.tmate.io",
            "2016-06-14T13:00:02.00-0700 [App/1]      OUT ssh other@nyc1.tmate.io",
        ];
        let found = p.scan_window(&lines, LEGACY, 2, &ts("2016-06-14T13:00:00.00-0700")).unwrap();
        assert_eq!(found.address, "fresh@nyc1.tmate.io");
        assert_eq!(found.instance_index, 2);

        assert!(p.scan_window(&lines, LEGACY, 2, &ts("2016-06-14T13:00:01.00-0700")).is_none());
        assert!(p.scan_window(&lines, LEGACY, 0, &ts("2016-06-14T12:00:00.00-0700")).is_none());
    }

    #[test]
    fn test_scan_window_only_accepts_the_backend_tag() {
        let p = pattern();
        let lines = [
            "2016-06-14T13:00:01.00-0700 [APP/PROC/WEB/1] OUT ssh fresh@nyc1.tmate.io",
            "2016-06-14T13:00:02.00-0700 [App/1]          OUT ssh other@nyc1.tmate.io",
        ];
        let mark = ts("2016-06-14T13:00:00.00-0700");

        let next_gen = p.scan_window(&lines, NEXT_GEN, 1, &mark).unwrap();
        assert_eq!(next_gen.address, "fresh@nyc1.tmate.io");

        let legacy = p.scan_window(&lines, LEGACY, 1, &mark).unwrap();
        assert_eq!(legacy.address, "other@nyc1.tmate.io");
    }

    #[test]
    fn test_scan_window_last_accepted_wins() {
        let p = pattern();
        let lines = vec![
            "2016-06-14T13:00:01.00-0700 [App/2] OUT ssh first@nyc1.tmate.io".to_string(),
            "2016-06-14T13:00:02.00-0700 [App/2] OUT ssh second@nyc1.tmate.io".to_string(),
        ];
        let found = p.scan_window(&lines, LEGACY, 2, &ts("2016-06-14T13:00:00.00-0700")).unwrap();
        assert_eq!(found.address, "second@nyc1.tmate.io");
    }

    #[test]
    fn test_latest_skips_untimestamped_tail() {
        let p = pattern();
        let lines = [
            "Retrieving logs for app foo in org acme / space dev as me...",
            "2016-06-14T13:00:01.00-0700 [App/0] OUT listening",
            "   2016-06-14T13:00:02.00-0700 [RTR/0] OUT GET /",
            "",
        ];
        assert_eq!(p.latest(&lines), Some(ts("2016-06-14T13:00:02.00-0700")));
        assert_eq!(p.latest(&["no timestamps here"]), None);
    }
}
