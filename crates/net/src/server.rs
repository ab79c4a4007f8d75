use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use session::SessionId;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;

use crate::channels::{IngressTx, NetToTick};
use crate::codec::{FrameError, FrameReader, FrameWriter};
use crate::rate_limiter::{ConnectionLimiter, PacketThrottle};
use crate::registry::OpcodeSet;

/// Network-side runtime knobs, converted from the top-level config at boot.
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub out_queue_size: usize,
    pub packets_per_second: u32,
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Accept connections and spawn the per-session I/O task pair until
/// shutdown is signaled.
pub async fn run_listener(
    addr: String,
    cfg: NetConfig,
    ingress: IngressTx,
    opcodes: Arc<OpcodeSet>,
    limiter: Arc<Mutex<ConnectionLimiter>>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");

    loop {
        let (stream, peer) = tokio::select! {
            accepted = listener.accept() => accepted?,
            _ = shutdown.changed() => {
                tracing::info!("listener stopping");
                return Ok(());
            }
        };

        if let Err(rejection) = limiter.lock().unwrap().try_admit(peer.ip()) {
            tracing::warn!(%peer, %rejection, "connection rejected");
            continue;
        }

        let session_id = SessionId(NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::info!(%session_id, %peer, "connection accepted");

        let cfg = cfg.clone();
        let ingress = ingress.clone();
        let opcodes = opcodes.clone();
        let limiter = limiter.clone();
        tokio::spawn(async move {
            handle_session(stream, peer, session_id, cfg, ingress, opcodes).await;
            limiter.lock().unwrap().release(peer.ip());
        });
    }
}

/// One connection: a writer task draining the egress channel and an inline
/// reader loop feeding the ingress channel. The tick thread owns everything
/// else.
async fn handle_session(
    stream: TcpStream,
    peer: SocketAddr,
    session_id: SessionId,
    cfg: NetConfig,
    ingress: IngressTx,
    opcodes: Arc<OpcodeSet>,
) {
    let _ = stream.set_nodelay(true);
    let (read_half, write_half) = stream.into_split();

    let (egress_tx, mut egress_rx) = mpsc::channel::<Bytes>(cfg.out_queue_size);
    let (close_tx, mut close_rx) = watch::channel(false);

    if ingress
        .send(NetToTick::Connected {
            session_id,
            peer,
            egress: egress_tx,
            close: close_tx,
        })
        .await
        .is_err()
    {
        return; // tick thread already gone
    }

    // Writer: egress channel -> frame codec, one deadline per frame. Exits
    // when the Session (and with it the egress sender) is dropped; on a
    // write failure it drops the receiver, which the tick thread observes at
    // the next flush.
    let write_timeout = cfg.write_timeout;
    let mut writer = tokio::spawn(async move {
        let mut fw = FrameWriter::new(write_half);
        while let Some(packet) = egress_rx.recv().await {
            match timeout(write_timeout, fw.write_frame(&packet)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::debug!(%session_id, %err, "write failed");
                    return;
                }
                Err(_) => {
                    tracing::debug!(%session_id, "write deadline exceeded");
                    return;
                }
            }
        }
    });

    // Reader: frame codec -> opcode pre-check -> throttle -> blocking
    // ingress push. Backpressure from a full ingress stalls this loop rather
    // than dropping a command.
    let mut fr = FrameReader::new(read_half);
    let mut throttle = PacketThrottle::new(cfg.packets_per_second);
    loop {
        let frame = tokio::select! {
            _ = close_rx.changed() => break,
            read = timeout(cfg.read_timeout, fr.read_frame()) => read,
        };

        let payload = match frame {
            Ok(Ok(Some(payload))) => payload,
            Ok(Ok(None)) => break, // clean EOF
            Ok(Err(FrameError::Length(len))) => {
                tracing::warn!(%session_id, len, "bad frame length");
                break;
            }
            Ok(Err(err)) => {
                tracing::debug!(%session_id, %err, "read failed");
                break;
            }
            Err(_) => {
                tracing::debug!(%session_id, "read deadline exceeded");
                break;
            }
        };

        match throttle.on_packet() {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(%session_id, "packet over rate budget, dropped");
                continue;
            }
            Err(()) => {
                tracing::warn!(%session_id, "packet rate violations exceeded threshold");
                break;
            }
        }

        match payload.first() {
            Some(&opcode) if opcodes.contains(opcode) => {}
            Some(&opcode) => {
                tracing::debug!(%session_id, opcode, "unknown opcode dropped at reader");
                continue;
            }
            None => continue,
        }

        if ingress
            .send(NetToTick::Packet {
                session_id,
                payload,
            })
            .await
            .is_err()
        {
            break;
        }
    }

    let _ = ingress.send(NetToTick::Disconnected { session_id }).await;

    // Best-effort egress drain within the write deadline, then cut it off.
    if timeout(cfg.write_timeout, &mut writer).await.is_err() {
        writer.abort();
    }
    tracing::info!(%session_id, %peer, "session ended");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limiter::LimiterConfig;
    use crate::registry::Registry;
    use session::SessionState;
    use tokio::io::AsyncWriteExt;

    fn test_config() -> NetConfig {
        NetConfig {
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            out_queue_size: 16,
            packets_per_second: 0,
        }
    }

    fn test_registry() -> Registry<()> {
        fn noop(_: &mut (), _: SessionId, _: &mut crate::packet::PacketReader<'_>) {}
        let mut reg = Registry::new();
        reg.register(0x29, &[SessionState::InWorld], noop);
        reg
    }

    async fn start_server(
        ingress: IngressTx,
    ) -> (SocketAddr, watch::Sender<bool>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let opcodes = test_registry().opcode_set();
        let limiter = ConnectionLimiter::new(LimiterConfig::default());
        tokio::spawn(run_listener(
            addr.to_string(),
            test_config(),
            ingress,
            opcodes,
            limiter,
            shutdown_rx,
        ));
        // Give the listener a moment to bind.
        tokio::time::sleep(Duration::from_millis(50)).await;
        (addr, shutdown_tx)
    }

    #[tokio::test]
    async fn connection_produces_connected_and_disconnected() {
        let (ingress_tx, mut ingress_rx) = mpsc::channel(16);
        let (addr, _shutdown) = start_server(ingress_tx).await;

        let client = TcpStream::connect(addr).await.unwrap();
        match ingress_rx.recv().await.unwrap() {
            NetToTick::Connected { session_id, .. } => assert!(session_id.0 > 0),
            other => panic!("expected Connected, got {other:?}"),
        }

        drop(client);
        match ingress_rx.recv().await.unwrap() {
            NetToTick::Disconnected { .. } => {}
            other => panic!("expected Disconnected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn framed_packet_reaches_ingress() {
        let (ingress_tx, mut ingress_rx) = mpsc::channel(16);
        let (addr, _shutdown) = start_server(ingress_tx).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        let _ = ingress_rx.recv().await.unwrap(); // Connected

        // total length 5 = header(2) + opcode(1) + two bytes.
        client.write_all(&[0x05, 0x00, 0x29, 0xaa, 0xbb]).await.unwrap();

        match ingress_rx.recv().await.unwrap() {
            NetToTick::Packet { payload, .. } => {
                assert_eq!(&payload[..], &[0x29, 0xaa, 0xbb]);
            }
            other => panic!("expected Packet, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_opcode_dropped_before_ingress() {
        let (ingress_tx, mut ingress_rx) = mpsc::channel(16);
        let (addr, _shutdown) = start_server(ingress_tx).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        let _ = ingress_rx.recv().await.unwrap(); // Connected

        // Opcode 0x77 is not registered; the session must stay open and the
        // packet must not reach the tick thread.
        client.write_all(&[0x03, 0x00, 0x77]).await.unwrap();
        client.write_all(&[0x03, 0x00, 0x29]).await.unwrap();

        match ingress_rx.recv().await.unwrap() {
            NetToTick::Packet { payload, .. } => assert_eq!(&payload[..], &[0x29]),
            other => panic!("expected Packet, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_frame_length_closes_session() {
        let (ingress_tx, mut ingress_rx) = mpsc::channel(16);
        let (addr, _shutdown) = start_server(ingress_tx).await;

        let mut client = TcpStream::connect(addr).await.unwrap();
        let _ = ingress_rx.recv().await.unwrap(); // Connected

        client.write_all(&[0x00, 0x00]).await.unwrap();

        match ingress_rx.recv().await.unwrap() {
            NetToTick::Disconnected { .. } => {}
            other => panic!("expected Disconnected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn egress_packets_are_framed_to_client() {
        let (ingress_tx, mut ingress_rx) = mpsc::channel(16);
        let (addr, _shutdown) = start_server(ingress_tx).await;

        let client = TcpStream::connect(addr).await.unwrap();
        let egress = match ingress_rx.recv().await.unwrap() {
            NetToTick::Connected { egress, .. } => egress,
            other => panic!("expected Connected, got {other:?}"),
        };

        egress.send(Bytes::from_static(&[0x01, 0x02, 0x03])).await.unwrap();

        let mut fr = FrameReader::new(client);
        let payload = fr.read_frame().await.unwrap().unwrap();
        assert_eq!(&payload[..], &[0x01, 0x02, 0x03]);
    }
}
