//! Criterion benchmarks for the wschat JSON codec.
//!
//! Run with:
//! ```bash
//! cargo bench --package wschat-core --bench codec_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wschat_core::protocol::codec::{decode, decode_frame, encode};
use wschat_core::protocol::messages::{MessageBody, ProtocolMessage, UserListData};
use wschat_core::OnlineUser;

// ── Message fixtures ──────────────────────────────────────────────────────────

fn make_private() -> ProtocolMessage {
    ProtocolMessage::private(1, 2, "a reasonably short chat line for benchmarking")
}

fn make_heartbeat() -> ProtocolMessage {
    ProtocolMessage::heartbeat()
}

fn make_user_list(n: u64) -> ProtocolMessage {
    ProtocolMessage::new(MessageBody::UserList {
        data: UserListData {
            users: (1..=n).map(|id| OnlineUser::new(id, format!("user-{id}"))).collect(),
        },
    })
}

// ── Benchmarks ────────────────────────────────────────────────────────────────

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let cases = [
        ("private", make_private()),
        ("heartbeat", make_heartbeat()),
        ("user_list_100", make_user_list(100)),
    ];
    for (name, msg) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), msg, |b, msg| {
            b.iter(|| encode(black_box(msg)).unwrap())
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let cases = [
        ("private", encode(&make_private()).unwrap()),
        ("heartbeat", encode(&make_heartbeat()).unwrap()),
        ("user_list_100", encode(&make_user_list(100)).unwrap()),
        ("malformed", "{not json".to_string()),
    ];
    for (name, text) in &cases {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, text| {
            b.iter(|| {
                let _ = decode(black_box(text));
            })
        });
    }
    group.finish();
}

fn bench_decode_coalesced_frame(c: &mut Criterion) {
    let line = encode(&make_private()).unwrap();
    let frame = vec![line; 16].join("\n");
    c.bench_function("decode_frame_16_lines", |b| {
        b.iter(|| decode_frame(black_box(&frame)))
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_decode_coalesced_frame);
criterion_main!(benches);
