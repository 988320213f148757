//! Two-task runtime around the Sans-IO client.
//!
//! One task reads user input, the other reads the broker connection. Both
//! feed the same [`Client`] and both write to the same console, so the client
//! and the console live together behind one async mutex. The connection's
//! write half has a lock of its own and is never written while the client lock
//! is held: a long report blocked on broker backpressure must not stop the
//! inbound task from draining the echoes that cause it.
//!
//! ```text
//!   input lines ──> input task ──┬─> Mutex<Shared>   (client, console)
//!                                │
//!  broker bytes ──> inbound task ┘   Mutex<link> ──> write half ──> broker
//! ```
//!
//! The read half travels from the task that connected to the inbound task
//! over a channel. A `watch` flag stops both tasks; the write half is shut
//! down once, after both have exited.

use std::{collections::VecDeque, io, path::PathBuf, sync::Arc};

use bytes::Bytes;
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf},
    sync::{Mutex, mpsc, watch},
    task::JoinError,
};
use touchline_client::{
    Client, ClientAction, ClientEvent, Notice, SessionPhase, transport::Connector,
};
use touchline_proto::Frame;
use tracing::{debug, info, warn};

use crate::{
    command::InputCommand,
    config::RuntimeConfig,
    report::read_report,
    summary::write_summary,
};

/// Errors that end the runtime.
///
/// Protocol and transport failures are not among them: those are reported on
/// the console and end the session through the client.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Console could not be written
    #[error("console output failed: {0}")]
    Output(#[source] io::Error),

    /// A runtime task panicked or was cancelled
    #[error("runtime task failed: {0}")]
    Task(#[from] JoinError),
}

/// Runtime wiring a [`Client`] to a connector, an input source and a console.
///
/// # Type Parameters
///
/// - `C`: Opens broker connections
/// - `I`: Line-oriented user input
/// - `O`: Console output
pub struct Runtime<C, I, O> {
    config: RuntimeConfig,
    connector: C,
    input: I,
    output: O,
}

/// Client and console, guarded by one lock.
struct Shared<O> {
    client: Client,
    console: O,
}

/// Everything the tasks share.
struct Context<C: Connector, O> {
    shared: Mutex<Shared<O>>,
    link: Mutex<Option<WriteHalf<C::Stream>>>,
    connector: C,
    readers: mpsc::UnboundedSender<ReadHalf<C::Stream>>,
    shutdown: watch::Sender<bool>,
    summary_dir: PathBuf,
    read_buffer: usize,
}

impl<C, I, O> Runtime<C, I, O>
where
    C: Connector + 'static,
    I: AsyncBufRead + Unpin + Send + 'static,
    O: AsyncWrite + Unpin + Send + 'static,
{
    /// Create a runtime. Nothing happens until [`Runtime::run`].
    pub fn new(config: RuntimeConfig, connector: C, input: I, output: O) -> Self {
        Self { config, connector, input, output }
    }

    /// Run until input ends or the session ends.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::Output` if the console cannot be written
    /// - `RuntimeError::Task` if a task panicked
    pub async fn run(self) -> Result<(), RuntimeError> {
        let (shutdown, _) = watch::channel(false);
        let (readers, readers_rx) = mpsc::unbounded_channel();

        let context = Arc::new(Context {
            shared: Mutex::new(Shared { client: Client::new(self.config.client), console: self.output }),
            link: Mutex::new(None),
            connector: self.connector,
            readers,
            shutdown,
            summary_dir: self.config.summary_dir,
            read_buffer: self.config.read_buffer.max(1),
        });

        let inbound = tokio::spawn(inbound_task(Arc::clone(&context), readers_rx));
        let input = tokio::spawn(input_task(Arc::clone(&context), self.input));

        let input_result = input.await?;
        let inbound_result = inbound.await?;

        // Both tasks are gone: release the connection exactly once
        let link = context.link.lock().await.take();
        if let Some(mut link) = link {
            if let Err(e) = link.shutdown().await {
                debug!(error = %e, "connection shutdown failed");
            }
        }
        context.shared.lock().await.console.flush().await.map_err(RuntimeError::Output)?;

        info!("runtime stopped");
        input_result.and(inbound_result)
    }
}

async fn input_task<C, I, O>(context: Arc<Context<C, O>>, input: I) -> Result<(), RuntimeError>
where
    C: Connector,
    I: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin + Send,
{
    let mut stop = context.shutdown.subscribe();
    let mut lines = input.lines();

    loop {
        let line = tokio::select! {
            () = stopped(&mut stop) => break,
            line = lines.next_line() => line,
        };

        match line {
            Ok(Some(line)) => context.handle_line(&line).await?,
            Ok(None) => {
                context.stop("input closed");
                break;
            },
            Err(e) => {
                warn!(error = %e, "input read failed");
                context.stop("input failed");
                break;
            },
        }
    }

    Ok(())
}

async fn inbound_task<C, O>(
    context: Arc<Context<C, O>>,
    mut readers: mpsc::UnboundedReceiver<ReadHalf<C::Stream>>,
) -> Result<(), RuntimeError>
where
    C: Connector,
    O: AsyncWrite + Unpin + Send,
{
    let mut stop = context.shutdown.subscribe();
    let mut buf = vec![0u8; context.read_buffer];

    loop {
        let mut reader = tokio::select! {
            () = stopped(&mut stop) => return Ok(()),
            reader = readers.recv() => match reader {
                Some(reader) => reader,
                None => return Ok(()),
            },
        };

        loop {
            let read = tokio::select! {
                () = stopped(&mut stop) => return Ok(()),
                read = reader.read(&mut buf) => read,
            };

            let event = match read {
                Ok(0) => ClientEvent::TransportClosed {
                    reason: "connection closed by broker".to_string(),
                },
                Ok(n) => ClientEvent::BytesReceived(Bytes::copy_from_slice(&buf[..n])),
                Err(e) => ClientEvent::TransportClosed { reason: e.to_string() },
            };
            let closed = matches!(event, ClientEvent::TransportClosed { .. });

            context.dispatch(event).await?;

            if closed {
                break;
            }
        }
    }
}

/// Resolves once the shutdown flag is set.
async fn stopped(stop: &mut watch::Receiver<bool>) {
    // Sender lives in the context, which outlives both tasks
    let _ = stop.wait_for(|stop| *stop).await;
}

impl<C, O> Context<C, O>
where
    C: Connector,
    O: AsyncWrite + Unpin + Send,
{
    fn stop(&self, reason: &str) {
        info!(reason, "shutting down");
        self.shutdown.send_replace(true);
    }

    async fn say(&self, line: &str) -> Result<(), RuntimeError> {
        self.shared.lock().await.say(line).await
    }

    async fn handle_line(&self, line: &str) -> Result<(), RuntimeError> {
        let command = match InputCommand::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return Ok(()),
            Err(e) => return self.say(&e.to_string()).await,
        };
        debug!(?command, "input command");

        let event = match command {
            InputCommand::Login { addr, username, passcode } => {
                ClientEvent::Login { addr, username, passcode }
            },
            InputCommand::Join { channel } => ClientEvent::Join { channel },
            InputCommand::Exit { channel } => ClientEvent::Exit { channel },
            InputCommand::Logout => ClientEvent::Logout,
            InputCommand::Report { file } => {
                // Session first, so a missing file does not mask it
                if self.shared.lock().await.client.phase() != SessionPhase::Connected {
                    return self.say(&Notice::LoginRequired.to_string()).await;
                }
                match read_report(&file) {
                    Ok(report) => ClientEvent::Report(report),
                    Err(e) => {
                        warn!(error = %e, "report not loaded");
                        return self.say(&e.to_string()).await;
                    },
                }
            },
            InputCommand::Summary { channel, user, file } => {
                return self.summarize(&channel, &user, &file).await;
            },
        };

        self.dispatch(event).await
    }

    async fn summarize(&self, channel: &str, user: &str, file: &str) -> Result<(), RuntimeError> {
        let mut shared = self.shared.lock().await;

        let summary = match shared.client.summarize(channel, user) {
            Ok(summary) => summary,
            Err(e) => {
                return match e.notice() {
                    Some(notice) => shared.say(&notice.to_string()).await,
                    None => Ok(()),
                };
            },
        };

        match write_summary(&self.summary_dir, file, &summary) {
            Ok(path) => {
                info!(path = %path.display(), events = summary.events.len(), "summary written");
                shared.say(&format!("Summary written to {file}")).await
            },
            Err(e) => {
                warn!(error = %e, "summary not written");
                shared.say("Failed to open output file").await
            },
        }
    }

    /// Feed one event to the client and carry out what it asks for.
    async fn dispatch(&self, event: ClientEvent) -> Result<(), RuntimeError> {
        let outcome = self.shared.lock().await.client.handle(event);

        match outcome {
            Ok(actions) => self.execute(actions).await,
            Err(e) => {
                debug!(error = %e, "event rejected");
                if let Some(notice) = e.notice() {
                    self.say(&notice.to_string()).await?;
                }
                if e.is_fatal() {
                    self.stop(&e.to_string());
                }
                Ok(())
            },
        }
    }

    /// Follow-up actions for an event that cannot be rejected.
    async fn feed(&self, event: ClientEvent) -> Vec<ClientAction> {
        self.shared.lock().await.client.handle(event).unwrap_or_default()
    }

    async fn execute(&self, actions: Vec<ClientAction>) -> Result<(), RuntimeError> {
        let mut queue = VecDeque::from(actions);

        while let Some(action) = queue.pop_front() {
            match action {
                ClientAction::Connect { addr } => match self.connector.connect(&addr).await {
                    Ok(stream) => {
                        let (reader, writer) = tokio::io::split(stream);
                        let stale = self.link.lock().await.replace(writer);
                        if let Some(mut stale) = stale {
                            if let Err(e) = stale.shutdown().await {
                                debug!(error = %e, "stale connection shutdown failed");
                            }
                        }
                        if self.readers.send(reader).is_err() {
                            warn!("inbound task gone, connection will not be read");
                        }
                    },
                    Err(e) => {
                        // The rest of the batch assumed a connection
                        queue.clear();
                        queue.extend(self.feed(ClientEvent::ConnectFailed { reason: e.to_string() }).await);
                    },
                },
                ClientAction::Send(frame) => {
                    if let Err(e) = self.write(&frame).await {
                        queue.clear();
                        queue.extend(self.feed(ClientEvent::TransportClosed { reason: e.to_string() }).await);
                    }
                },
                ClientAction::SendUnsubscribe { channel, frame } => match self.write(&frame).await {
                    Ok(()) => {
                        let notice = self.shared.lock().await.client.commit_unsubscribe(&channel);
                        if let Some(notice) = notice {
                            self.say(&notice.to_string()).await?;
                        }
                    },
                    Err(e) => {
                        queue.clear();
                        queue.extend(self.feed(ClientEvent::TransportClosed { reason: e.to_string() }).await);
                    },
                },
                ClientAction::Notify(notice) => self.say(&notice.to_string()).await?,
                ClientAction::Shutdown { reason } => self.stop(&reason),
            }
        }

        Ok(())
    }

    /// Write one frame. Holds only the link lock.
    async fn write(&self, frame: &Frame) -> io::Result<()> {
        let mut link = self.link.lock().await;
        let link = link
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no broker connection"))?;

        debug!(command = %frame.command, bytes = frame.encoded_len(), "frame sent");
        link.write_all(&frame.to_bytes()).await?;
        link.flush().await
    }
}

impl<O> Shared<O>
where
    O: AsyncWrite + Unpin,
{
    async fn say(&mut self, line: &str) -> Result<(), RuntimeError> {
        self.console.write_all(line.as_bytes()).await.map_err(RuntimeError::Output)?;
        self.console.write_all(b"\n").await.map_err(RuntimeError::Output)?;
        self.console.flush().await.map_err(RuntimeError::Output)
    }
}
