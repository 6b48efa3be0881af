//! # Lobby Server
//!
//! One tokio task per connection reads token lines; a second task per connection writes
//! frames from an unbounded channel. The lobby and every outbox sit behind a single mutex,
//! held while a command is handled and its frames are queued, so commands never interleave.

use crate::net::{encode_frame, Lobby, Outbound, PeerId};
use crate::{parse_token, CrawlResult, GameConfig};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};

/// Everything guarded by the lobby lock.
struct Shared {
    lobby: Lobby,
    outboxes: HashMap<PeerId, mpsc::UnboundedSender<String>>,
}

impl Shared {
    fn deliver(&self, frames: Vec<Outbound>) {
        for frame in frames {
            match frame {
                Outbound::To(id, text) => self.send(id, &text),
                Outbound::All(text) => {
                    for &id in self.outboxes.keys() {
                        self.send(id, &text);
                    }
                }
            }
        }
    }

    fn send(&self, id: PeerId, text: &str) {
        if let Some(outbox) = self.outboxes.get(&id) {
            if outbox.send(encode_frame(text)).is_err() {
                log::debug!("Outbox of peer {} is closed", id);
            }
        }
    }
}

/// Binds `addr` and serves the lobby until the listener fails.
pub async fn serve(addr: &str, config: GameConfig) -> CrawlResult<()> {
    let listener = TcpListener::bind(addr).await?;
    run(listener, config).await
}

/// Serves the lobby on an already bound listener.
pub async fn run(listener: TcpListener, config: GameConfig) -> CrawlResult<()> {
    let shared = Arc::new(Mutex::new(Shared {
        lobby: Lobby::new(config)?,
        outboxes: HashMap::new(),
    }));
    log::info!("Lobby listening on {}", listener.local_addr()?);

    loop {
        let (stream, addr) = listener.accept().await?;
        log::info!("Connection from {}", addr);
        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, shared).await {
                log::warn!("Connection {} closed with error: {}", addr, e);
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, shared: Arc<Mutex<Shared>>) -> CrawlResult<()> {
    let (reader, mut writer) = stream.into_split();
    let (outbox, mut frames) = mpsc::unbounded_channel::<String>();

    let joined = {
        let mut guard = shared.lock().await;
        match guard.lobby.join() {
            Ok((id, prompt)) => {
                guard.outboxes.insert(id, outbox);
                guard.deliver(prompt);
                Ok(id)
            }
            Err(e) => Err(e),
        }
    };
    let id = match joined {
        Ok(id) => id,
        Err(e) => {
            log::info!("Turning a connection away: {}", e);
            writer.write_all(encode_frame(&e.to_string()).as_bytes()).await?;
            return Ok(());
        }
    };

    let writer_task = tokio::spawn(async move {
        while let Some(frame) = frames.recv().await {
            if writer.write_all(frame.as_bytes()).await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(reader).lines();
    let result: CrawlResult<()> = async {
        while let Some(line) = lines.next_line().await? {
            let mut guard = shared.lock().await;
            let replies = match parse_token(&line) {
                Ok(token) => guard.lobby.handle(id, token)?,
                Err(e) => vec![Outbound::To(id, e.to_string())],
            };
            guard.deliver(replies);
        }
        Ok(())
    }
    .await;

    {
        let mut guard = shared.lock().await;
        guard.outboxes.remove(&id);
        match guard.lobby.leave(id) {
            Ok(notices) => guard.deliver(notices),
            Err(e) => log::warn!("Could not remove peer {}: {}", id, e),
        }
    }
    if writer_task.await.is_err() {
        log::debug!("Writer of peer {} was cancelled", id);
    }
    log::info!("Peer {} disconnected", id);
    result
}
