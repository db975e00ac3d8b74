#![forbid(unsafe_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use muninn_ingest_lib::codec::{parse_frame, proto, Frame};
use muninn_ingest_lib::handlers::{dispatch, HandlerError};
use muninn_ingest_lib::sink::{collections, MemorySink, Record, RecordSink, SinkError, Value};
use muninn_ingest_lib::tcp::session::{Session, SessionRegistry};

type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

fn session() -> Arc<Session> {
    let registry = SessionRegistry::new();
    let addr: SocketAddr = "127.0.0.1:9000".parse().expect("valid addr");
    registry.open(addr).1
}

fn login_frame() -> Frame {
    Frame {
        protocol: proto::LOGIN,
        payload: vec![
            0x03, 0x51, 0x60, 0x72, 0x70, 0x42, 0x10, 0x46, 0x50, 0x90, 0x32, 0x00,
        ],
        serial: 0x0001,
    }
}

#[tokio::test]
async fn login_dispatch_inserts_and_acks() -> TestResult<()> {
    let sink = MemorySink::new();
    let ack = dispatch(&login_frame(), &session(), &sink)
        .await?
        .expect("login always acks");

    let parsed = parse_frame(&ack)?;
    assert_eq!(parsed.protocol, proto::LOGIN);
    assert_eq!(parsed.serial, 0x0001);

    let records = sink.records(collections::LOGIN);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("terminal_id"), Some(&Value::Str("0351607270421046".into())));
    Ok(())
}

#[tokio::test]
async fn truncated_login_payload_is_a_decode_error() {
    let sink = MemorySink::new();
    let frame = Frame { protocol: proto::LOGIN, payload: vec![0u8; 5], serial: 1 };
    let err = dispatch(&frame, &session(), &sink).await.expect_err("must fail");
    assert!(matches!(err, HandlerError::Decode(_)));
    assert_eq!(sink.count(collections::LOGIN), 0);
}

#[tokio::test]
async fn reserved_language_bits_are_a_decode_error() {
    let sink = MemorySink::new();
    let mut frame = login_frame();
    // Set both language bits in the timezone word.
    frame.payload[11] = 0x03;
    let err = dispatch(&frame, &session(), &sink).await.expect_err("must fail");
    assert!(matches!(err, HandlerError::Decode(_)));
}

#[tokio::test]
async fn unknown_protocol_is_reported() {
    let sink = MemorySink::new();
    let frame = Frame { protocol: 0xFF, payload: vec![], serial: 1 };
    let err = dispatch(&frame, &session(), &sink).await.expect_err("must fail");
    assert!(matches!(err, HandlerError::UnknownProtocol(0xFF)));
}

struct StalledSink;

#[async_trait]
impl RecordSink for StalledSink {
    async fn insert(&self, _collection: &str, _record: Record) -> Result<String, SinkError> {
        // Longer than the handler deadline.
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok("never".to_string())
    }
}

#[tokio::test(start_paused = true)]
async fn stalled_sink_hits_the_deadline() {
    let err = dispatch(&login_frame(), &session(), &StalledSink)
        .await
        .expect_err("deadline must fire");
    match err {
        HandlerError::Sink(SinkError::Deadline { collection, seconds }) => {
            assert_eq!(collection, collections::LOGIN);
            assert_eq!(seconds, 5);
        }
        other => panic!("expected deadline error, got {other:?}"),
    }
}
