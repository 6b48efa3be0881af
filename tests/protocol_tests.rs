//! The lobby server over real TCP connections.

use cryptcrawl::net::{decode_frame, run, serve, Lobby, Outbound};
use cryptcrawl::{CrawlError, GameConfig, Token};
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};

struct Client {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(addr: SocketAddr) -> Self {
        let (reader, writer) = TcpStream::connect(addr).await.unwrap().into_split();
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send(&mut self, token: &str) {
        self.writer
            .write_all(format!("{}\n", token).as_bytes())
            .await
            .unwrap();
    }

    /// Next frame with newlines restored, or `None` once the server hung up.
    async fn frame(&mut self) -> Option<String> {
        timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("no frame within five seconds")
            .unwrap()
            .map(|line| decode_frame(&line))
    }
}

async fn start_server(seed: u64) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(run(listener, GameConfig::new(seed)));
    addr
}

#[tokio::test]
async fn test_join_play_and_reset_over_tcp() {
    let addr = start_server(99).await;

    let mut ann = Client::connect(addr).await;
    assert_eq!(
        ann.frame().await.unwrap(),
        "Welcome to Cryptcrawl! Enter your nickname: "
    );
    ann.send("A").await;
    assert!(ann.frame().await.unwrap().ends_with("nickname: A"));
    ann.send("ENTER").await;
    assert!(ann.frame().await.unwrap().starts_with("Hello A!"));

    ann.send("JUMP").await;
    assert_eq!(
        ann.frame().await.unwrap(),
        "Protocol error: Unknown input token: JUMP"
    );

    ann.send("2").await;
    let snapshot = ann.frame().await.unwrap();
    assert!(snapshot.contains(">@ A the Mage"));
    assert!(snapshot.lines().count() > 40);

    let mut ben = Client::connect(addr).await;
    assert!(ben.frame().await.unwrap().starts_with("Welcome"));

    let mut third = Client::connect(addr).await;
    assert_eq!(third.frame().await.unwrap(), "Protocol error: The lobby is full");
    assert_eq!(third.frame().await, None);

    ben.send("B").await;
    ben.frame().await.unwrap();
    ben.send("ENTER").await;
    ben.frame().await.unwrap();
    ben.send("1").await;
    assert!(ben.frame().await.unwrap().contains("& B the Warrior"));
    assert!(ann.frame().await.unwrap().contains("& B the Warrior"));

    // Not Ben's turn: nothing is broadcast before the disconnect notice
    ben.send("d").await;
    drop(ben);
    let notice = ann.frame().await.unwrap();
    assert!(notice.starts_with("A player left. The game has been reset."));
    assert!(notice.contains("Choose your class"));
}

#[test]
fn test_serve_reports_bad_address() {
    let result = tokio_test::block_on(serve("not an address", GameConfig::new(1)));
    assert!(matches!(result, Err(CrawlError::Io(_))));
}

#[test]
fn test_one_broadcast_per_command() {
    let mut lobby = Lobby::new(GameConfig::new(8)).unwrap();
    let (id, _) = lobby.join().unwrap();
    for token in [Token::Char('C'), Token::Enter, Token::Char('3')] {
        lobby.handle(id, token).unwrap();
    }

    let frames = lobby.handle(id, Token::Char('h')).unwrap();
    assert_eq!(frames.len(), 1);
    assert!(matches!(&frames[0], Outbound::All(text) if text.contains("C the Rogue")));

    assert!(lobby.handle(id, Token::Char('z')).unwrap().is_empty());
    assert!(matches!(lobby.handle(99, Token::Enter), Err(CrawlError::Protocol(_))));
}
