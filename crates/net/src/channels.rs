use std::net::SocketAddr;

use bytes::Bytes;
use session::SessionId;
use tokio::sync::{mpsc, watch};

/// Messages from the network tasks to the tick thread.
///
/// The ingress channel is bounded and the reader pushes with `send().await`:
/// backpressure on a slow drain stalls that client's reads instead of
/// dropping its commands.
#[derive(Debug)]
pub enum NetToTick {
    /// A connection was accepted. Carries the write-side handles so the tick
    /// thread can construct the Session.
    Connected {
        session_id: SessionId,
        peer: SocketAddr,
        egress: mpsc::Sender<Bytes>,
        close: watch::Sender<bool>,
    },
    /// One framed packet payload (opcode byte included).
    Packet {
        session_id: SessionId,
        payload: Bytes,
    },
    /// The reader task ended (EOF, error, deadline, or close request).
    Disconnected { session_id: SessionId },
}

pub type IngressTx = mpsc::Sender<NetToTick>;
pub type IngressRx = mpsc::Receiver<NetToTick>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ingress_preserves_order() {
        let (tx, mut rx) = mpsc::channel::<NetToTick>(4);
        let sid = SessionId(1);

        tx.send(NetToTick::Packet {
            session_id: sid,
            payload: Bytes::from_static(b"\x01A"),
        })
        .await
        .unwrap();
        tx.send(NetToTick::Packet {
            session_id: sid,
            payload: Bytes::from_static(b"\x01B"),
        })
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            NetToTick::Packet { payload, .. } => assert_eq!(&payload[..], b"\x01A"),
            other => panic!("unexpected {other:?}"),
        }
        match rx.recv().await.unwrap() {
            NetToTick::Packet { payload, .. } => assert_eq!(&payload[..], b"\x01B"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn bounded_ingress_blocks_then_delivers_both() {
        // A saturated channel must not drop packets: the second send waits
        // for the drain and both arrive in order.
        let (tx, mut rx) = mpsc::channel::<NetToTick>(1);
        let sid = SessionId(2);

        tx.send(NetToTick::Packet {
            session_id: sid,
            payload: Bytes::from_static(b"\x01A"),
        })
        .await
        .unwrap();

        let tx2 = tx.clone();
        let pusher = tokio::spawn(async move {
            tx2.send(NetToTick::Packet {
                session_id: sid,
                payload: Bytes::from_static(b"\x01B"),
            })
            .await
            .unwrap();
        });

        // The pusher is parked until we drain A.
        tokio::task::yield_now().await;
        assert!(!pusher.is_finished());

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        pusher.await.unwrap();

        for (msg, expected) in [(first, b"\x01A" as &[u8]), (second, b"\x01B")] {
            match msg {
                NetToTick::Packet { payload, .. } => assert_eq!(&payload[..], expected),
                other => panic!("unexpected {other:?}"),
            }
        }
    }
}
