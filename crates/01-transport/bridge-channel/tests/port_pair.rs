//! Integration tests for the string-framed port pair.

use bridge_channel::{pair, CallBatch, ChannelError, Envelope, HostMessage, WorkerMessage};
use proptest::prelude::*;
use serde_json::json;
use std::time::Duration;

#[test]
fn frames_flow_in_both_directions() {
    let (host, worker) = pair();

    host.send(&HostMessage::Flush).expect("send flush");
    let frame = worker.recv().expect("worker receives");
    let envelope = Envelope::decode(&frame).expect("decode");
    assert_eq!(HostMessage::from_envelope(envelope), Ok(HostMessage::Flush));

    let mut batch = CallBatch::new();
    batch.push(0, 1, vec![json!("x")]);
    worker
        .send(&WorkerMessage::FlushedQueue(batch.clone()))
        .expect("send batch");
    let frame = host.try_recv().expect("open").expect("frame present");
    assert_eq!(frame, r#"{"topic":"flushedQueue","payload":[[0],[1],[["x"]]]}"#);
    let envelope = Envelope::decode(&frame).expect("decode");
    assert_eq!(
        WorkerMessage::from_envelope(envelope),
        Ok(WorkerMessage::FlushedQueue(batch))
    );
}

#[test]
fn empty_and_closed_are_distinguished() {
    let (host, worker) = pair();
    assert!(matches!(host.try_recv(), Ok(None)));
    assert!(matches!(
        host.recv_timeout(Duration::from_millis(1)),
        Ok(None)
    ));

    drop(worker);
    assert!(matches!(host.try_recv(), Err(ChannelError::Closed)));
    assert!(matches!(host.send(&HostMessage::Flush), Err(ChannelError::Closed)));
}

#[test]
fn outbound_clones_share_the_channel() {
    let (host, worker) = pair();
    let outbound = host.outbound();
    outbound
        .send(&HostMessage::InvokeCallback {
            callback_id: 7,
            args: vec![json!(1)],
        })
        .expect("send");
    let frame = worker.recv().expect("recv");
    assert_eq!(
        frame,
        r#"{"topic":"invokeCallbackAndReturnFlushedQueue","payload":[7,[1]]}"#
    );
}

proptest! {
    #[test]
    fn decoded_batch_preserves_length_and_order(
        calls in prop::collection::vec((0usize..64, 0usize..64, prop::collection::vec(any::<i32>(), 0..4)), 0..32)
    ) {
        let payload = json!([
            calls.iter().map(|c| c.0).collect::<Vec<_>>(),
            calls.iter().map(|c| c.1).collect::<Vec<_>>(),
            calls.iter().map(|c| c.2.clone()).collect::<Vec<_>>(),
        ]);
        let batch = CallBatch::from_payload(&payload).expect("well-formed batch");
        prop_assert_eq!(batch.len(), calls.len());
        for (decoded, (module_id, method_id, args)) in batch.into_calls().zip(calls.iter()) {
            prop_assert_eq!(decoded.module_id, *module_id);
            prop_assert_eq!(decoded.method_id, *method_id);
            prop_assert_eq!(decoded.args, args.iter().map(|a| json!(a)).collect::<Vec<_>>());
        }
    }
}
