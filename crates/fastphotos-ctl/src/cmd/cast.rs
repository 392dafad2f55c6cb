//! Sender-side commands: talk to the receiver over its transport.
//!
//! Each command opens one connection, announces itself with `newSession`,
//! sends its frame, and prints every response line it receives.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::TcpStream;

use fastphotos_core::protocol::{
    names, Frame, MediaCommand, MediaLoadRequest, NewAssetPayload, PrecachePayload,
};
use fastphotos_core::{AssetDescriptor, Command, Inbound, ResponseEnvelope};

/// Longer than the receiver's default image load timeout.
const SHOW_WAIT: Duration = Duration::from_secs(40);

struct Connection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl Connection {
    async fn open(addr: &str, token: Option<String>) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to receiver at {}; is it running?", addr))?;
        let (read_half, writer) = stream.into_split();
        let mut conn = Self {
            lines: BufReader::new(read_half).lines(),
            writer,
        };
        conn.send(&Inbound::Photos(Command::NewSession {
            session_token: token,
        }))
        .await?;
        Ok(conn)
    }

    async fn send(&mut self, message: &Inbound) -> Result<()> {
        let line = message.encode()?;
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    /// Next response envelope, or `None` once the receiver hangs up.
    async fn recv(&mut self) -> Result<Option<ResponseEnvelope>> {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                continue;
            }
            let frame: Frame = serde_json::from_str(&line).context("malformed response frame")?;
            let envelope = serde_json::from_value(frame.data).context("malformed response")?;
            return Ok(Some(envelope));
        }
    }
}

fn print_envelope(envelope: &ResponseEnvelope) -> Result<()> {
    println!("← {}", serde_json::to_string(envelope)?);
    Ok(())
}

/// Print responses until the receiver hangs up or Ctrl-C.
async fn follow(conn: &mut Connection) -> Result<()> {
    println!("Attached. Press Ctrl-C to disconnect.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            next = conn.recv() => match next? {
                Some(envelope) => print_envelope(&envelope)?,
                None => {
                    println!("Receiver closed the connection.");
                    return Ok(());
                }
            },
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

/// Display one image and wait for the receiver's verdict.
pub async fn cmd_show(addr: &str, url: &str, precache: &[String]) -> Result<()> {
    let mut conn = Connection::open(addr, None).await?;
    let precache = (!precache.is_empty())
        .then(|| precache.iter().map(AssetDescriptor::remote_image).collect());
    conn.send(&Inbound::Photos(Command::NewAsset {
        payload: NewAssetPayload {
            asset: AssetDescriptor::remote_image(url),
            precache,
        },
    }))
    .await?;

    let verdict = tokio::time::timeout(SHOW_WAIT, async {
        while let Some(envelope) = conn.recv().await? {
            print_envelope(&envelope)?;
            if envelope.name == names::NEW_ASSET && envelope.payload.is_some() {
                return Ok(envelope.result());
            }
        }
        anyhow::Ok(None)
    })
    .await
    .context("timed out waiting for the receiver")??;

    match verdict {
        Some(code) if code.is_success() => {
            println!("Displayed {}", url);
            Ok(())
        }
        Some(code) => bail!("receiver reported {}", code),
        None => bail!("receiver closed the connection before answering"),
    }
}

/// Hand a list of images to the preload queue and stay attached.
pub async fn cmd_precache(addr: &str, urls: &[String]) -> Result<()> {
    if urls.is_empty() {
        bail!("precache needs at least one URL");
    }
    let mut conn = Connection::open(addr, None).await?;
    conn.send(&Inbound::Photos(Command::PrecacheAssets {
        payload: PrecachePayload {
            precache: Some(urls.iter().map(AssetDescriptor::remote_image).collect()),
        },
    }))
    .await?;
    // The receiver keeps only the head of each precache list.
    println!("Queued {} for preloading.", urls[0]);
    if urls.len() > 1 {
        println!(
            "Ignored {} further URL(s); the receiver preloads one per request.",
            urls.len() - 1
        );
    }
    follow(&mut conn).await
}

/// Start a video from ranked stream URLs, highest quality first.
pub async fn cmd_video(addr: &str, streams: &[String]) -> Result<()> {
    let Some(first) = streams.first() else {
        bail!("video needs at least one stream URL");
    };
    let refs: Vec<&str> = streams.iter().map(String::as_str).collect();
    let mut conn = Connection::open(addr, None).await?;
    conn.send(&Inbound::Media(MediaCommand::Load(
        MediaLoadRequest::with_streams(first.as_str(), &refs),
    )))
    .await?;
    println!("Sent LOAD with {} stream(s).", streams.len());
    follow(&mut conn).await
}
