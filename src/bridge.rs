//! TCP-in / UDP-out service around the recognizer.
//!
//! A capture client streams fixed-size raw frames over TCP. Each frame is
//! analyzed on the blocking pool and the resulting line is sent as one UDP
//! datagram to the consumer.

use std::io::ErrorKind;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream, UdpSocket};

use crate::detection::CardDetector;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:50001";
pub const DEFAULT_FORWARD: &str = "127.0.0.1:50002";

/// Everything the receive/forward loop needs, passed explicitly.
#[derive(Clone)]
pub struct BridgeContext {
    pub detector: Arc<CardDetector>,
    pub forward: SocketAddr,
    /// Don't forward frames with no cards instead of sending the sentinel.
    pub skip_empty: bool,
}

/// Bind `listen`, serve until Ctrl-C.
pub async fn serve(ctx: BridgeContext, listen: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    log::info!("listening on {}", listener.local_addr()?);

    tokio::select! {
        res = run(ctx, listener) => res,
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted, shutting down");
            Ok(())
        }
    }
}

/// Accept capture clients one at a time and forward their frames.
pub async fn run(ctx: BridgeContext, listener: TcpListener) -> Result<()> {
    let bind_addr: SocketAddr = if ctx.forward.is_ipv4() {
        "0.0.0.0:0".parse()?
    } else {
        "[::]:0".parse()?
    };
    let udp = UdpSocket::bind(bind_addr).await?;
    log::info!("forwarding to {}", ctx.forward);

    loop {
        let (stream, peer) = listener.accept().await?;
        log::info!("connection from {peer}");
        match handle_connection(&ctx, stream, &udp).await {
            Ok(frames) => log::info!("{peer} disconnected after {frames} frames"),
            Err(e) => log::warn!("connection from {peer} failed: {e:#}"),
        }
    }
}

/// Read frames until the peer closes. Returns the number of frames read.
async fn handle_connection(ctx: &BridgeContext, mut stream: TcpStream, udp: &UdpSocket) -> Result<usize> {
    let mut buf = vec![0u8; ctx.detector.frame_len()];
    let mut frames = 0;

    loop {
        match stream.read_exact(&mut buf).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(frames),
            Err(e) => return Err(e.into()),
        }
        frames += 1;
        log::trace!("frame {frames} received");

        let detector = ctx.detector.clone();
        let bytes = buf.clone();
        let report = match tokio::task::spawn_blocking(move || detector.analyze_bytes(bytes)).await {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                log::warn!("frame {frames} skipped: {e}");
                continue;
            }
            Err(e) => {
                log::warn!("frame {frames} skipped, analysis task failed: {e}");
                continue;
            }
        };

        if report.is_empty() && ctx.skip_empty {
            log::debug!("frame {frames}: no cards, nothing sent");
            continue;
        }
        let line = report.wire_line();
        log::debug!("frame {frames}: {line}");
        if let Err(e) = udp.send_to(line.as_bytes(), ctx.forward).await {
            log::warn!("frame {frames}: failed to forward: {e}");
        }
    }
}
