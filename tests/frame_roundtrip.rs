//! Frame codec wire-level scenarios.

use net::{FrameReader, FrameWriter, MAX_PAYLOAD_LEN};
use tokio::io::AsyncReadExt;

#[tokio::test]
async fn literal_wire_bytes() {
    // Payload 01 02 03 must produce exactly 05 00 01 02 03 on the wire.
    let (a, mut b) = tokio::io::duplex(64);
    let mut fw = FrameWriter::new(a);
    fw.write_frame(&[0x01, 0x02, 0x03]).await.unwrap();
    drop(fw);

    let mut wire = Vec::new();
    b.read_to_end(&mut wire).await.unwrap();
    assert_eq!(wire, vec![0x05, 0x00, 0x01, 0x02, 0x03]);
}

#[tokio::test]
async fn literal_wire_bytes_decode() {
    use tokio::io::AsyncWriteExt;
    let (a, mut b) = tokio::io::duplex(64);
    b.write_all(&[0x05, 0x00, 0x01, 0x02, 0x03]).await.unwrap();
    drop(b);

    let mut fr = FrameReader::new(a);
    let payload = fr.read_frame().await.unwrap().unwrap();
    assert_eq!(&payload[..], &[0x01, 0x02, 0x03]);
    assert!(fr.read_frame().await.unwrap().is_none());
}

#[tokio::test]
async fn round_trip_various_sizes() {
    for len in [1usize, 2, 7, 255, 256, 1024, 60_000, MAX_PAYLOAD_LEN] {
        let payload: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        let (a, b) = tokio::io::duplex(8192);
        let writer = tokio::spawn(async move {
            let mut fw = FrameWriter::new(b);
            fw.write_frame(&payload).await.unwrap();
        });

        let mut fr = FrameReader::new(a);
        let got = fr.read_frame().await.unwrap().unwrap();
        writer.await.unwrap();
        assert_eq!(&got[..], &expected[..], "len {len}");
    }
}

#[tokio::test]
async fn no_extra_bytes_consumed_or_produced() {
    // Two frames back to back: each read consumes exactly one frame.
    let (a, b) = tokio::io::duplex(256);
    tokio::spawn(async move {
        let mut fw = FrameWriter::new(b);
        fw.write_frame(&[0xaa]).await.unwrap();
        fw.write_frame(&[0xbb, 0xcc]).await.unwrap();
    });

    let mut fr = FrameReader::new(a);
    assert_eq!(&fr.read_frame().await.unwrap().unwrap()[..], &[0xaa]);
    assert_eq!(&fr.read_frame().await.unwrap().unwrap()[..], &[0xbb, 0xcc]);
    assert!(fr.read_frame().await.unwrap().is_none());
}
