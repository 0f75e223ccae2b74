//! Monitored copy with a crash window
//!
//! This module provides the risky half of a crash test:
//! - Baseline capture: the source digest is made durable before any copy
//! - Block copy on a background thread with a durability barrier per block
//! - An optional per-block delay to widen the window a human can react in
//! - Destination-size polling on the calling thread for progress
//! - A [`CrashWindow`] that fires once when progress enters 40-60%
//!
//! The two threads share only the destination file and the window's
//! `Arc<AtomicBool>`. Errors inside the copy thread are caught and returned
//! in [`CopyOutcome::error`] so the caller can still inspect the partial
//! destination.

use crate::baseline::ChecksumRecord;
use crate::checksum::{
    read_full, ChecksumAlgorithm, ChecksumConfig, ChecksumEngine, ChecksumProgress,
};
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default copy block size (1 MB)
pub const DEFAULT_COPY_BLOCK_SIZE: usize = 1024 * 1024;

/// Minimum block size (4 KB)
pub const MIN_COPY_BLOCK_SIZE: usize = 4 * 1024;

/// Maximum block size (64 MB)
pub const MAX_COPY_BLOCK_SIZE: usize = 64 * 1024 * 1024;

/// Default sleep after each block when the delay is enabled
pub const DEFAULT_BLOCK_DELAY: Duration = Duration::from_millis(200);

/// Default destination-size sampling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Shortest accepted sampling interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default lower bound of the crash window (fraction of the source)
pub const DEFAULT_WINDOW_LOWER: f64 = 0.40;

/// Default upper bound of the crash window (fraction of the source)
pub const DEFAULT_WINDOW_UPPER: f64 = 0.60;

/// Default time given to the operator to cut power
pub const DEFAULT_COUNTDOWN: Duration = Duration::from_secs(30);

/// Default countdown tick
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

// ============================================================================
// Configuration
// ============================================================================

/// Configuration for the monitored copy
#[derive(Debug, Clone)]
pub struct CopyConfig {
    /// Bytes read and written per block
    pub block_size: usize,

    /// Sleep inserted after each block, `None` for full speed
    pub block_delay: Option<Duration>,

    /// How often the destination size is sampled
    pub poll_interval: Duration,

    /// Algorithm of the baseline digest
    pub algorithm: ChecksumAlgorithm,

    /// Settings for the baseline checksum pass
    pub checksum: ChecksumConfig,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_COPY_BLOCK_SIZE,
            block_delay: Some(DEFAULT_BLOCK_DELAY),
            poll_interval: DEFAULT_POLL_INTERVAL,
            algorithm: ChecksumAlgorithm::default(),
            checksum: ChecksumConfig::default(),
        }
    }
}

impl CopyConfig {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set block size (clamped to valid range)
    pub fn block_size(mut self, size: usize) -> Self {
        self.block_size = size.clamp(MIN_COPY_BLOCK_SIZE, MAX_COPY_BLOCK_SIZE);
        self
    }

    /// Set the per-block delay
    pub fn block_delay(mut self, delay: Duration) -> Self {
        self.block_delay = Some(delay);
        self
    }

    /// Enable or disable the per-block delay
    ///
    /// Re-enabling restores [`DEFAULT_BLOCK_DELAY`] if no delay was set.
    pub fn use_delay(mut self, enabled: bool) -> Self {
        self.block_delay = if enabled {
            Some(self.block_delay.unwrap_or(DEFAULT_BLOCK_DELAY))
        } else {
            None
        };
        self
    }

    /// Set the sampling interval (at least [`MIN_POLL_INTERVAL`])
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Set the baseline checksum algorithm
    pub fn algorithm(mut self, algorithm: ChecksumAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the baseline checksum configuration
    pub fn checksum(mut self, checksum: ChecksumConfig) -> Self {
        self.checksum = checksum;
        self
    }
}

// ============================================================================
// Crash window
// ============================================================================

/// Progress range in which the operator is told to cut power
///
/// Fires at most once per run, no matter how often progress re-enters the
/// range. [`MonitoredCopy::run`] re-arms it before each copy.
#[derive(Debug, Clone)]
pub struct CrashWindow {
    lower: f64,
    upper: f64,
    countdown: Duration,
    tick: Duration,
    fired: Arc<AtomicBool>,
}

impl Default for CrashWindow {
    fn default() -> Self {
        Self {
            lower: DEFAULT_WINDOW_LOWER,
            upper: DEFAULT_WINDOW_UPPER,
            countdown: DEFAULT_COUNTDOWN,
            tick: DEFAULT_TICK,
            fired: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl CrashWindow {
    /// Create a window with the default 40-60% range and 30s countdown
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inclusive range as fractions, clamped to `[0, 1]`
    pub fn range(mut self, lower: f64, upper: f64) -> Self {
        let lower = if lower.is_nan() { 0.0 } else { lower.clamp(0.0, 1.0) };
        let upper = if upper.is_nan() { 1.0 } else { upper.clamp(0.0, 1.0) };
        self.lower = lower.min(upper);
        self.upper = lower.max(upper);
        self
    }

    /// Set how long the controlling thread blocks once the window fires
    pub fn countdown(mut self, countdown: Duration) -> Self {
        self.countdown = countdown;
        self
    }

    /// Set the countdown tick (at least 1 ms)
    pub fn tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    /// Lower bound as a fraction
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper bound as a fraction
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Countdown duration
    pub fn countdown_duration(&self) -> Duration {
        self.countdown
    }

    /// Whether `fraction` lies inside the inclusive range
    pub fn contains(&self, fraction: f64) -> bool {
        fraction >= self.lower && fraction <= self.upper
    }

    /// Fire the window if `fraction` is inside the range and it has not fired
    ///
    /// Returns `true` exactly once per window.
    pub fn try_fire(&self, fraction: f64) -> bool {
        self.contains(fraction)
            && self
                .fired
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
    }

    /// Clear the fired flag so the next run can fire again
    pub fn rearm(&self) {
        self.fired.store(false, Ordering::SeqCst);
    }

    /// Whether the window has fired
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Shared handle to the fired flag
    pub fn fired_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.fired)
    }

    /// Remaining time announced at each countdown tick, longest first
    pub fn ticks(&self) -> Vec<Duration> {
        let tick_ms = self.tick.as_millis().max(1);
        let count = self.countdown.as_millis().div_ceil(tick_ms);
        (1..=count)
            .rev()
            .map(|i| Duration::from_millis((i * tick_ms) as u64).min(self.countdown))
            .collect()
    }
}

// ============================================================================
// Progress
// ============================================================================

/// Copy progress as observed from the destination size
#[derive(Debug, Clone)]
pub struct CopyProgress {
    /// Current destination size
    pub bytes_copied: u64,

    /// Source size
    pub total_bytes: u64,

    /// Smoothed copy speed in bytes per second
    pub speed_bps: u64,

    /// Estimated time remaining in seconds
    pub eta_seconds: Option<u64>,

    /// Time since the copy thread started
    pub elapsed: Duration,
}

impl CopyProgress {
    /// Progress fraction in `[0, 1]`; an empty source counts as complete
    pub fn fraction(&self) -> f64 {
        if self.total_bytes == 0 {
            1.0
        } else {
            (self.bytes_copied as f64 / self.total_bytes as f64).clamp(0.0, 1.0)
        }
    }

    /// Completion percentage (0.0 to 100.0)
    pub fn percentage(&self) -> f64 {
        self.fraction() * 100.0
    }

    /// Whether the destination has reached the source size
    pub fn is_complete(&self) -> bool {
        self.bytes_copied >= self.total_bytes
    }

    /// Format speed for display (e.g., "45.2 MB/s")
    pub fn speed_display(&self) -> String {
        format_speed(self.speed_bps)
    }

    /// Format ETA for display (e.g., "2m 30s")
    pub fn eta_display(&self) -> String {
        match self.eta_seconds {
            Some(secs) if secs > 0 => format_duration(secs),
            _ => "calculating...".to_string(),
        }
    }
}

/// Receives events from the controlling thread of a [`MonitoredCopy`]
///
/// Every method has an empty default.
pub trait CopyObserver {
    /// A destination size sample was taken
    fn on_progress(&mut self, _progress: &CopyProgress) {}

    /// Progress entered the crash window; the countdown starts
    fn on_window_open(&mut self, _progress: &CopyProgress, _countdown: Duration) {}

    /// One countdown tick with the time still remaining
    fn on_countdown_tick(&mut self, _remaining: Duration) {}

    /// The countdown elapsed without a power loss
    fn on_window_closed(&mut self) {}

    /// The copy thread stopped with an error
    fn on_copy_error(&mut self, _error: &Error) {}
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentObserver;

impl CopyObserver for SilentObserver {}

// ============================================================================
// Monitored copy
// ============================================================================

/// Result of a monitored copy that survived to the end
#[derive(Debug)]
pub struct CopyOutcome {
    /// Baseline recorded before the copy started
    pub baseline: ChecksumRecord,

    /// Source size in bytes
    pub source_size: u64,

    /// Bytes written by the copy thread
    pub bytes_copied: u64,

    /// Time from thread start to thread end
    pub elapsed: Duration,

    /// Whether the crash window fired during this run
    pub window_fired: bool,

    /// Error that stopped the copy thread, if any
    pub error: Option<Error>,
}

impl CopyOutcome {
    /// Whether every source byte reached the destination
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.bytes_copied == self.source_size
    }

    /// Average speed in bytes per second
    pub fn average_speed(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.bytes_copied as f64 / secs) as u64
        } else {
            self.bytes_copied
        }
    }

    /// Format average speed for display
    pub fn speed_display(&self) -> String {
        format_speed(self.average_speed())
    }
}

/// Checksum progress callback used while capturing the baseline
pub type ChecksumProgressCallback = Box<dyn FnMut(&ChecksumProgress) + Send>;

/// Copies a source artifact while exposing a crash window
pub struct MonitoredCopy {
    config: CopyConfig,
    window: CrashWindow,
    checksum_progress: Option<ChecksumProgressCallback>,
}

impl MonitoredCopy {
    /// Create a copy with default configuration and window
    pub fn new() -> Self {
        Self::with_config(CopyConfig::default(), CrashWindow::default())
    }

    /// Create a copy with custom configuration and window
    pub fn with_config(config: CopyConfig, window: CrashWindow) -> Self {
        Self {
            config,
            window,
            checksum_progress: None,
        }
    }

    /// Report progress of the baseline checksum pass
    pub fn on_checksum_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&ChecksumProgress) + Send + 'static,
    {
        self.checksum_progress = Some(Box::new(callback));
        self
    }

    /// The configuration in use
    pub fn config(&self) -> &CopyConfig {
        &self.config
    }

    /// The crash window of this copy
    pub fn window(&self) -> &CrashWindow {
        &self.window
    }

    /// Run the test copy
    ///
    /// # Arguments
    /// * `source` - Existing source artifact
    /// * `destination` - Copy target; removed first if present
    /// * `record_path` - Where the baseline digest is persisted
    /// * `observer` - Receives progress and crash-window events
    ///
    /// # Returns
    /// * `Ok(CopyOutcome)` - The copy thread terminated (check `error`)
    /// * `Err(Error)` - Missing source or failed baseline capture
    pub fn run(
        &mut self,
        source: &Path,
        destination: &Path,
        record_path: &Path,
        observer: &mut dyn CopyObserver,
    ) -> Result<CopyOutcome> {
        if !source.is_file() {
            return Err(Error::SourceNotFound(source.to_path_buf()));
        }
        self.window.rearm();

        let baseline = self.capture_baseline(source, record_path)?;

        match fs::remove_file(destination) {
            Ok(()) => tracing::info!("Removed existing destination {:?}", destination),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(Error::Io(e)),
        }

        let source_size = fs::metadata(source)?.len();
        tracing::info!(
            "Copying {:?} -> {:?} ({} bytes, block {} bytes, delay {:?})",
            source,
            destination,
            source_size,
            self.config.block_size,
            self.config.block_delay
        );

        let start = Instant::now();
        let handle = spawn_copy(
            source.to_path_buf(),
            destination.to_path_buf(),
            self.config.block_size,
            self.config.block_delay,
        )?;

        let mut speed_tracker = SpeedTracker::new();
        while !handle.is_finished() {
            if let Some(progress) =
                sample_progress(destination, source_size, start, &mut speed_tracker)
            {
                observer.on_progress(&progress);

                if self.window.try_fire(progress.fraction()) {
                    self.hold_window(&progress, observer);
                }
            }
            thread::sleep(self.config.poll_interval);
        }

        let (bytes_copied, error) = match handle.join() {
            Ok(Ok(bytes)) => (bytes, None),
            Ok(Err(e)) => {
                tracing::error!("Error during copy: {}", e);
                observer.on_copy_error(&e);
                let bytes = fs::metadata(destination).map(|m| m.len()).unwrap_or(0);
                (bytes, Some(e))
            }
            Err(_) => {
                let e = Error::Io(std::io::Error::other("copy thread panicked"));
                tracing::error!("Error during copy: {}", e);
                observer.on_copy_error(&e);
                (0, Some(e))
            }
        };
        let elapsed = start.elapsed();

        if let Some(progress) =
            sample_progress(destination, source_size, start, &mut speed_tracker)
        {
            observer.on_progress(&progress);
        }

        tracing::info!(
            "Copy finished: {} of {} bytes in {:?}",
            bytes_copied,
            source_size,
            elapsed
        );

        Ok(CopyOutcome {
            baseline,
            source_size,
            bytes_copied,
            elapsed,
            window_fired: self.window.has_fired(),
            error,
        })
    }

    fn capture_baseline(&mut self, source: &Path, record_path: &Path) -> Result<ChecksumRecord> {
        let mut engine = ChecksumEngine::with_config(self.config.checksum.clone());
        if let Some(mut callback) = self.checksum_progress.take() {
            engine = engine.on_progress(move |p| callback(p));
        }

        let checksum = engine.calculate_file(source, self.config.algorithm)?;
        let record = ChecksumRecord::new(checksum);
        record.write_durable(record_path)?;

        tracing::info!("Baseline {} recorded in {:?}", record.digest(), record_path);
        Ok(record)
    }

    fn hold_window(&self, progress: &CopyProgress, observer: &mut dyn CopyObserver) {
        tracing::warn!(
            "Crash window reached at {:.1}%, holding for {:?}",
            progress.percentage(),
            self.window.countdown
        );
        observer.on_window_open(progress, self.window.countdown);

        let mut slept = Duration::ZERO;
        for remaining in self.window.ticks() {
            observer.on_countdown_tick(remaining);
            let step = self.window.tick.min(self.window.countdown - slept);
            thread::sleep(step);
            slept += step;
        }

        tracing::info!("Crash window passed, copy continuing");
        observer.on_window_closed();
    }
}

impl Default for MonitoredCopy {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_copy(
    source: PathBuf,
    destination: PathBuf,
    block_size: usize,
    delay: Option<Duration>,
) -> Result<thread::JoinHandle<Result<u64>>> {
    let handle = thread::Builder::new()
        .name("powercut-copy".to_string())
        .spawn(move || copy_blocks(&source, &destination, block_size, delay))?;
    Ok(handle)
}

/// Copy `source` to `destination` with a durability barrier after each block
fn copy_blocks(
    source: &Path,
    destination: &Path,
    block_size: usize,
    delay: Option<Duration>,
) -> Result<u64> {
    let mut src = File::open(source)?;
    let mut dst = create_destination(destination)?;
    let mut buffer = vec![0u8; block_size];
    let mut copied = 0u64;

    loop {
        let n = read_full(&mut src, &mut buffer)?;
        if n == 0 {
            break;
        }

        dst.write_all(&buffer[..n])?;
        dst.flush()?;
        powercut_platform::sync_file(&dst)?;
        copied += n as u64;

        if let Some(delay) = delay {
            thread::sleep(delay);
        }
    }

    Ok(copied)
}

/// Create (or truncate) the destination and make its directory entry durable
fn create_destination(destination: &Path) -> Result<File> {
    let file = File::create(destination)?;
    powercut_platform::sync_parent(destination)?;
    Ok(file)
}

fn sample_progress(
    destination: &Path,
    source_size: u64,
    start: Instant,
    speed_tracker: &mut SpeedTracker,
) -> Option<CopyProgress> {
    let bytes_copied = fs::metadata(destination).ok()?.len();
    speed_tracker.update(bytes_copied);
    let speed_bps = speed_tracker.current_speed();

    Some(CopyProgress {
        bytes_copied,
        total_bytes: source_size,
        speed_bps,
        eta_seconds: calculate_eta(bytes_copied, source_size, speed_bps),
        elapsed: start.elapsed(),
    })
}

/// Speed tracking with smoothing over the last samples
struct SpeedTracker {
    samples: VecDeque<(Instant, u64)>,
    max_samples: usize,
}

impl SpeedTracker {
    fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(10),
            max_samples: 10,
        }
    }

    fn update(&mut self, bytes: u64) {
        if self.samples.len() >= self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back((Instant::now(), bytes));
    }

    fn current_speed(&self) -> u64 {
        let (Some(first), Some(last)) = (self.samples.front(), self.samples.back()) else {
            return 0;
        };

        let duration = last.0.duration_since(first.0);
        let bytes = last.1.saturating_sub(first.1);

        if duration.as_millis() > 0 {
            (bytes as f64 / duration.as_secs_f64()) as u64
        } else {
            0
        }
    }
}

/// Calculate estimated time remaining
fn calculate_eta(bytes_copied: u64, total_bytes: u64, speed_bps: u64) -> Option<u64> {
    if speed_bps == 0 || bytes_copied >= total_bytes {
        return None;
    }

    Some(total_bytes.saturating_sub(bytes_copied) / speed_bps)
}

/// Format speed for display
pub fn format_speed(bytes_per_second: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes_per_second >= GB {
        format!("{:.1} GB/s", bytes_per_second as f64 / GB as f64)
    } else if bytes_per_second >= MB {
        format!("{:.1} MB/s", bytes_per_second as f64 / MB as f64)
    } else if bytes_per_second >= KB {
        format!("{:.1} KB/s", bytes_per_second as f64 / KB as f64)
    } else {
        format!("{} B/s", bytes_per_second)
    }
}

/// Format a number of seconds for display
pub fn format_duration(seconds: u64) -> String {
    if seconds >= 3600 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else if seconds >= 60 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
