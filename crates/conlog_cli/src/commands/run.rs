//! Run command implementation.

use conlog_bridge::{listen, BridgeConfig, SerialBridge};
use conlog_core::{ConsoleCapture, CoreError, CoreResult, RotationConfig, RotationEngine};
use conlog_storage::FileDirectory;
use conlog_stream::{
    open_device, open_source, stdin_source, ByteSource, DuplexStream, PeerListener,
    DEFAULT_RX_BUFFER,
};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Options of the run command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Log directory.
    pub log_dir: PathBuf,
    /// Console to capture; `-` is standard input.
    pub console: Option<PathBuf>,
    /// Serial line to bridge.
    pub serial: Option<PathBuf>,
    /// Listening address for network clients.
    pub bind: SocketAddr,
    /// Number of network client slots.
    pub max_peers: usize,
    /// Time between polls.
    pub poll_interval: Duration,
    /// Bytes moved per pump call.
    pub scratch: usize,
    /// Log budget.
    pub rotation: RotationConfig,
}

/// The capture and bridge state driven by the poll loop.
pub struct Daemon<C, S, L: PeerListener> {
    engine: RotationEngine,
    capture: Option<ConsoleCapture<C>>,
    bridge: Option<SerialBridge<S, L>>,
    scratch: Vec<u8>,
    renew_interval: Duration,
    retry_at: Option<Instant>,
}

impl<C: ByteSource, S: DuplexStream, L: PeerListener> Daemon<C, S, L> {
    /// Starts the engine and assembles the daemon.
    ///
    /// A log that cannot be opened does not stop the bridge; opening is
    /// retried on every renewal deadline.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] if the rotation config is out of
    /// range.
    pub fn new(
        mut engine: RotationEngine,
        capture: Option<ConsoleCapture<C>>,
        bridge: Option<SerialBridge<S, L>>,
        scratch: usize,
    ) -> CoreResult<Self> {
        engine.config().validate()?;
        let renew_interval = engine.config().renew_interval;
        let retry_at = match engine.start(renew_interval) {
            Ok(()) => None,
            Err(e @ CoreError::InvalidConfig { .. }) => return Err(e),
            Err(e) => {
                error!("Cannot open log: {}", e);
                Instant::now().checked_add(renew_interval)
            }
        };
        Ok(Self {
            engine,
            capture,
            bridge,
            scratch: vec![0; scratch.max(1)],
            renew_interval,
            retry_at,
        })
    }

    /// Runs the capture pump, then the bridge pump. Returns the bytes moved.
    ///
    /// Capture is skipped while the log is closed; console bytes wait in
    /// the source until the log reopens.
    pub fn poll(&mut self) -> usize {
        let mut moved = 0;
        if self.engine.is_open() {
            if let Some(capture) = self.capture.as_mut() {
                moved += capture.pump(&mut self.engine, &mut self.scratch);
            }
        }
        if let Some(bridge) = self.bridge.as_mut() {
            moved += bridge.pump(&mut self.scratch);
        }
        moved
    }

    /// Next time [`renew`](Self::renew) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.engine.next_renewal().or(self.retry_at)
    }

    /// Runs a due rotation check, or retries opening the log.
    pub fn renew(&mut self, now: Instant) {
        if self.engine.is_open() {
            self.engine.poll_timer(now);
            return;
        }
        if self.retry_at.is_some_and(|at| now >= at) {
            match self.engine.start(self.renew_interval) {
                Ok(()) => {
                    info!("Log opened");
                    self.retry_at = None;
                }
                Err(e @ CoreError::InvalidConfig { .. }) => {
                    error!("Cannot open log, giving up: {}", e);
                    self.retry_at = None;
                }
                Err(e) => {
                    warn!("Cannot open log: {}", e);
                    self.retry_at = now.checked_add(self.renew_interval);
                }
            }
        }
    }

    /// Returns the rotation engine.
    pub fn engine(&self) -> &RotationEngine {
        &self.engine
    }

    /// Stops the bridge and closes the log.
    pub fn shutdown(&mut self) {
        if let Some(bridge) = self.bridge.as_mut() {
            bridge.end();
        }
        self.engine.stop();
    }
}

/// Runs the run command until Ctrl-C.
pub async fn run(options: RunOptions) -> Result<(), Box<dyn std::error::Error>> {
    options.rotation.validate()?;
    let directory = FileDirectory::open(&options.log_dir)?;
    let engine = RotationEngine::new(Box::new(directory), options.rotation.clone());

    let capture = match &options.console {
        Some(path) => Some(ConsoleCapture::new(open_console(path).await?)),
        None => None,
    };

    let bridge = match &options.serial {
        Some(path) => {
            let config = BridgeConfig::new(options.bind).with_max_peers(options.max_peers);
            let serial =
                open_device(path, config.serial_rx_buffer, config.serial_tx_buffer).await?;
            let mut bridge = SerialBridge::new(serial, &config)?;
            let listener = listen(&config).await?;
            bridge.begin(
                listener,
                Some(Box::new(|connected| {
                    if connected {
                        info!("Network client connected");
                    } else {
                        info!("Network clients gone");
                    }
                })),
            );
            Some(bridge)
        }
        None => None,
    };

    if capture.is_none() && bridge.is_none() {
        warn!("Neither --console nor --serial given, only maintaining the log");
    }

    let mut daemon = Daemon::new(engine, capture, bridge, options.scratch)?;
    info!("Running, log in {:?}", options.log_dir);

    let mut ticker = tokio::time::interval(options.poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let deadline = daemon.next_deadline();

        tokio::select! {
            _ = ticker.tick() => {
                daemon.poll();
            }
            _ = renewal(deadline) => {
                daemon.renew(Instant::now());
            }
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Cannot listen for Ctrl-C: {}", e);
                }
                break;
            }
        }
    }

    daemon.shutdown();
    info!("Stopped");
    Ok(())
}

async fn renewal(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

async fn open_console(path: &Path) -> Result<conlog_stream::StreamPort, Box<dyn std::error::Error>> {
    if path == Path::new("-") {
        Ok(stdin_source(DEFAULT_RX_BUFFER))
    } else {
        Ok(open_source(path, DEFAULT_RX_BUFFER).await?)
    }
}
