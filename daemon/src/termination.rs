//! Graceful shutdown plumbing: a broadcast channel fed by OS signals (and by
//! the `daemon_shutdown` RPC), drained by the server loop.

use std::sync::{Arc, atomic::AtomicBool};

#[cfg(unix)]
use tokio::signal::unix::signal;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    OsSigInt,
    OsSigQuit,
    OsSigTerm,
    UserInt,
}

const FORCE_QUIT_THRESHOLD: u8 = 3;

/// The receiving side of the interrupt channel.
#[derive(Debug)]
pub struct InterruptReceiver {
    interrupt_rx: broadcast::Receiver<Interrupted>,
    stopped: Arc<AtomicBool>,
}

impl InterruptReceiver {
    #[must_use]
    #[inline]
    pub fn new(interrupt_rx: broadcast::Receiver<Interrupted>) -> Self {
        Self {
            interrupt_rx,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Wait for an interrupt signal to be received.
    ///
    /// # Errors
    ///
    /// Fails if the interrupt signal cannot be received (e.g. the sender has
    /// been dropped)
    #[inline]
    pub async fn wait(&mut self) -> Result<Interrupted, broadcast::error::RecvError> {
        let interrupted = self.interrupt_rx.recv().await?;
        self.stopped
            .store(true, std::sync::atomic::Ordering::SeqCst);
        Ok(interrupted)
    }

    /// A new receiver on the same channel, sharing the stopped flag.
    #[must_use]
    #[inline]
    pub fn resubscribe(&self) -> Self {
        Self {
            interrupt_rx: self.interrupt_rx.resubscribe(),
            stopped: self.stopped.clone(),
        }
    }

    /// Check if an interrupt signal has been received previously.
    #[must_use]
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// The sending side of the interrupt channel.
#[derive(Debug, Clone)]
pub struct Terminator {
    interrupt_tx: broadcast::Sender<Interrupted>,
}

impl Terminator {
    #[must_use]
    #[inline]
    pub const fn new(interrupt_tx: broadcast::Sender<Interrupted>) -> Self {
        Self { interrupt_tx }
    }

    /// Send an interrupt signal to the application.
    ///
    /// # Errors
    ///
    /// Fails if the interrupt signal cannot be sent (e.g. the receiver has
    /// been dropped)
    #[inline]
    pub fn terminate(&self, interrupted: Interrupted) -> anyhow::Result<()> {
        self.interrupt_tx.send(interrupted)?;
        Ok(())
    }
}

#[cfg(unix)]
#[inline]
async fn terminate_by_signal(terminator: Terminator) {
    let mut interrupt_signal = signal(tokio::signal::unix::SignalKind::interrupt())
        .expect("failed to create interrupt signal stream");
    let mut term_signal = signal(tokio::signal::unix::SignalKind::terminate())
        .expect("failed to create terminate signal stream");
    let mut quit_signal = signal(tokio::signal::unix::SignalKind::quit())
        .expect("failed to create quit signal stream");

    let mut kill_count: u8 = 0;

    loop {
        // a stuck shutdown should still be killable: enough repeats and we
        // stop being graceful about it
        if kill_count >= FORCE_QUIT_THRESHOLD {
            log::warn!(
                "Received {FORCE_QUIT_THRESHOLD} signals, forcefully terminating the application"
            );
            std::process::exit(1);
        }

        let (signal_kind, result) = tokio::select! {
            _ = interrupt_signal.recv() => (Interrupted::OsSigInt, Ok(())),
            _ = term_signal.recv() => (Interrupted::OsSigTerm, Ok(())),
            _ = quit_signal.recv() => (Interrupted::OsSigQuit, Ok(())),
            r = tokio::signal::ctrl_c() => (Interrupted::UserInt, r),
        };
        if let Err(e) = result {
            log::warn!("failed to listen for ctrl-c: {e}");
        }
        if let Err(e) = terminator.terminate(signal_kind) {
            log::warn!("failed to send interrupt signal: {e}");
        }
        kill_count += 1;
    }
}

#[cfg(not(unix))]
async fn terminate_by_signal(terminator: Terminator) {
    // On non-unix systems, ctrl-c is the only signal we handle.
    let mut kill_count: u8 = 0;

    loop {
        if kill_count >= FORCE_QUIT_THRESHOLD {
            log::warn!(
                "Received {FORCE_QUIT_THRESHOLD} signals, forcefully terminating the application"
            );
            std::process::exit(1);
        }

        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to listen for ctrl-c: {e}");
        }
        if let Err(e) = terminator.terminate(Interrupted::UserInt) {
            log::warn!("failed to send interrupt signal: {e}");
        }
        kill_count += 1;
    }
}

/// create a broadcast channel for retrieving the application kill signal
///
/// # Panics
///
/// This function will panic if the signal-listener runtime cannot be created.
#[allow(clippy::module_name_repetitions)]
#[must_use]
#[inline]
pub fn create_termination() -> (Terminator, InterruptReceiver) {
    let (tx, rx) = broadcast::channel(2);
    let terminator = Terminator::new(tx);
    let interrupt = InterruptReceiver::new(rx);

    // a dedicated runtime so signal handling survives the main runtime
    // winding down
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .thread_name("songboard-terminator")
        .build()
        .unwrap();
    let terminator_clone = terminator.clone();

    std::thread::spawn(move || {
        rt.block_on(async {
            terminate_by_signal(terminator_clone).await;
        });
    });

    (terminator, interrupt)
}
