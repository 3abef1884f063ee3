//! Asset fetching: images referenced by chapters, and the cover.
//!
//! Every asset is materialized from one of three source kinds:
//!
//! - `file://` URLs are copied straight from disk,
//! - `http://`/`https://` URLs are downloaded with bounded retry,
//! - anything else is a path resolved against the referencing chapter's
//!   directory and stream-copied.
//!
//! Jobs run on a fixed number of scoped worker threads. What happens when a
//! job fails depends on its [`FetchPolicy`].

mod retry;

pub use retry::{backoff_delay, is_retryable, with_retry};

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use reqwest::blocking::Client;
use tracing::{Dispatch, debug, warn};

use crate::catalog::OriginKind;
use crate::error::{Error, Result};

/// Browser user agent sent with every download; some image hosts refuse
/// unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_2) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/34.0.1847.116 Safari/537.36";

/// Download and worker pool settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Exponential backoff factor.
    pub factor: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Number of worker threads.
    pub concurrency: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            factor: 2,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            timeout: Duration::from_secs(30),
            concurrency: 8,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// What a failed fetch does to the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Log, delete the partial file, carry on. Used for chapter images.
    FailSoft,
    /// Propagate the error and abort the build. Used for the cover.
    FailFast,
}

/// One asset to materialize.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub url: String,
    /// Base directory for relative paths.
    pub dir: PathBuf,
    pub dest: PathBuf,
    pub policy: FetchPolicy,
}

/// Summary of a finished fetch stage.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub fetched: usize,
    /// URLs of fail-soft jobs that produced no file.
    pub skipped: Vec<String>,
}

enum JobOutcome {
    Fetched,
    Skipped(String),
}

/// Materializes assets into the working tree.
pub struct AssetFetcher {
    client: Client,
    config: FetchConfig,
}

impl AssetFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Run every job and wait for all of them to settle.
    ///
    /// Fail-soft failures end up in the report; the first fail-fast failure
    /// is returned as the error once all workers have finished.
    pub fn fetch_all(&self, jobs: &[FetchJob]) -> Result<FetchReport> {
        let mut report = FetchReport::default();
        if jobs.is_empty() {
            return Ok(report);
        }

        let workers = self.config.concurrency.clamp(1, jobs.len());
        let next = AtomicUsize::new(0);
        let next = &next;
        // Workers log through the caller's subscriber.
        let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
        let dispatch = &dispatch;

        let outcomes: Vec<Result<JobOutcome>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    scope.spawn(move || {
                        tracing::dispatcher::with_default(dispatch, || {
                            let mut outcomes = Vec::new();
                            loop {
                                let idx = next.fetch_add(1, Ordering::Relaxed);
                                let Some(job) = jobs.get(idx) else {
                                    break;
                                };
                                outcomes.push(self.run(job));
                            }
                            outcomes
                        })
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| match handle.join() {
                    Ok(outcomes) => outcomes,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut fatal = None;
        for outcome in outcomes {
            match outcome {
                Ok(JobOutcome::Fetched) => report.fetched += 1,
                Ok(JobOutcome::Skipped(url)) => report.skipped.push(url),
                Err(err) => {
                    fatal.get_or_insert(err);
                }
            }
        }

        match fatal {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Fetch one job and apply its failure policy.
    fn run(&self, job: &FetchJob) -> Result<JobOutcome> {
        match self.fetch(job) {
            Ok(()) => {
                debug!(url = %job.url, dest = %job.dest.display(), "asset fetched");
                Ok(JobOutcome::Fetched)
            }
            Err(err) => {
                remove_partial(&job.dest);
                match job.policy {
                    FetchPolicy::FailSoft => {
                        warn!(url = %job.url, error = %err, "error while downloading image, skipping it");
                        Ok(JobOutcome::Skipped(job.url.clone()))
                    }
                    FetchPolicy::FailFast => Err(err),
                }
            }
        }
    }

    /// Materialize one asset at `job.dest`.
    pub fn fetch(&self, job: &FetchJob) -> Result<()> {
        let result = match OriginKind::of(&job.url) {
            OriginKind::DataUri => return Ok(()),
            OriginKind::FileScheme => copy_file(&file_url_path(&job.url), &job.dest),
            OriginKind::RemoteHttp => self.download(&job.url, &job.dest),
            OriginKind::RelativeLocal => stream_copy(&job.dir.join(&job.url), &job.dest),
        };

        result.map_err(|source| Error::Fetch {
            url: job.url.clone(),
            source: Box::new(source),
        })
    }

    fn download(&self, url: &str, dest: &Path) -> Result<()> {
        with_retry(&self.config, url, || {
            let mut response = self.client.get(url).send()?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::HttpStatus {
                    url: url.to_string(),
                    status,
                });
            }

            let mut file = create_dest(dest)?;
            response.copy_to(&mut file)?;
            Ok(())
        })
    }
}

/// Filesystem path of a `file://` URL.
fn file_url_path(url: &str) -> PathBuf {
    let encoded = &url["file://".len()..];
    PathBuf::from(percent_decode_str(encoded).decode_utf8_lossy().into_owned())
}

fn create_dest(dest: &Path) -> Result<File> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(File::create(dest)?)
}

fn copy_file(src: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src, dest)?;
    Ok(())
}

fn stream_copy(src: &Path, dest: &Path) -> Result<()> {
    let mut reader = File::open(src)?;
    let mut file = create_dest(dest)?;
    io::copy(&mut reader, &mut file)?;
    Ok(())
}

fn remove_partial(dest: &Path) {
    if let Err(err) = fs::remove_file(dest)
        && err.kind() != io::ErrorKind::NotFound
    {
        warn!(path = %dest.display(), error = %err, "could not remove partial download");
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn fast_config() -> FetchConfig {
        FetchConfig {
            retries: 1,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            timeout: Duration::from_secs(2),
            concurrency: 2,
            ..FetchConfig::default()
        }
    }

    fn job(url: &str, dir: &Path, dest: PathBuf, policy: FetchPolicy) -> FetchJob {
        FetchJob {
            url: url.to_string(),
            dir: dir.to_path_buf(),
            dest,
            policy,
        }
    }

    #[test]
    fn test_file_url_path_is_decoded() {
        assert_eq!(
            file_url_path("file:///tmp/my%20image.png"),
            PathBuf::from("/tmp/my image.png")
        );
    }

    #[test]
    fn test_relative_and_file_scheme_sources() {
        let tmp = TempDir::new().unwrap();
        let src_dir = tmp.path().join("src");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("a.png"), b"png-bytes").unwrap();

        let fetcher = AssetFetcher::new(fast_config()).unwrap();
        let images = tmp.path().join("out/images");
        let file_url = format!("file://{}", src_dir.join("a.png").display());

        let jobs = vec![
            job("a.png", &src_dir, images.join("one.png"), FetchPolicy::FailSoft),
            job(&file_url, tmp.path(), images.join("two.png"), FetchPolicy::FailSoft),
        ];
        let report = fetcher.fetch_all(&jobs).unwrap();

        assert_eq!(report.fetched, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(fs::read(images.join("one.png")).unwrap(), b"png-bytes");
        assert_eq!(fs::read(images.join("two.png")).unwrap(), b"png-bytes");
    }

    #[test]
    fn test_fail_soft_skips_and_removes_partial() {
        let tmp = TempDir::new().unwrap();
        let fetcher = AssetFetcher::new(fast_config()).unwrap();
        let dest = tmp.path().join("images/missing.png");

        let report = fetcher
            .fetch_all(&[job("missing.png", tmp.path(), dest.clone(), FetchPolicy::FailSoft)])
            .unwrap();

        assert_eq!(report.fetched, 0);
        assert_eq!(report.skipped, vec!["missing.png".to_string()]);
        assert!(!dest.exists());
    }

    #[test]
    fn test_fail_fast_propagates_after_all_jobs_settle() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("ok.png"), b"x").unwrap();
        let fetcher = AssetFetcher::new(fast_config()).unwrap();

        let jobs = vec![
            job("nope.jpg", tmp.path(), tmp.path().join("cover.jpg"), FetchPolicy::FailFast),
            job("ok.png", tmp.path(), tmp.path().join("images/ok.png"), FetchPolicy::FailSoft),
        ];
        let err = fetcher.fetch_all(&jobs).unwrap_err();

        assert!(matches!(err, Error::Fetch { ref url, .. } if url == "nope.jpg"));
        assert!(tmp.path().join("images/ok.png").exists());
    }

    #[test]
    fn test_unreachable_remote_image_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let fetcher = AssetFetcher::new(fast_config()).unwrap();
        let dest = tmp.path().join("images/remote.png");

        let report = fetcher
            .fetch_all(&[job(
                "http://127.0.0.1:9/remote.png",
                tmp.path(),
                dest.clone(),
                FetchPolicy::FailSoft,
            )])
            .unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert!(!dest.exists());
    }

    #[test]
    fn test_data_uri_is_never_fetched() {
        let tmp = TempDir::new().unwrap();
        let fetcher = AssetFetcher::new(fast_config()).unwrap();
        let dest = tmp.path().join("images/inline.png");

        fetcher
            .fetch(&job("data:image/png;base64,AA", tmp.path(), dest.clone(), FetchPolicy::FailFast))
            .unwrap();
        assert!(!dest.exists());
    }
}
