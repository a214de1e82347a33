//! Benchmarks for record encoding
//!
//! Measures the per-write encoding cost:
//! 1. Single parameter encoding by value type
//! 2. Full record build with a typical parameter set
//! 3. Decoding a built record

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

use sysevent_protocol::{EncodedParam, EventType, RecordBuilder, TraceInfo, decode_record};

fn typical_builder(param_count: usize) -> RecordBuilder {
    let mut builder = RecordBuilder::new("KERNEL_VENDOR", "POWER_KEY", EventType::Behavior);
    builder
        .timestamp(1_700_000_000_000)
        .time_zone("+0800")
        .uid(1000)
        .pid(1234)
        .tid(1235)
        .trace_info(TraceInfo::new(0xDEAD_BEEF, 1, 0, 0));

    for i in 0..param_count {
        let param = match i % 4 {
            0 => EncodedParam::new(format!("INT_{i}"), i as i64 * -1_000),
            1 => EncodedParam::new(format!("UINT_{i}"), i as u32 * 7),
            2 => EncodedParam::new(format!("STR_{i}"), "reason: \"timeout\"\nretry"),
            _ => EncodedParam::new(format!("ARR_{i}"), vec![1.5f64; 16]),
        };
        let _ = builder.append_value(param);
    }
    builder
}

fn bench_param_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("param_encode");
    group.throughput(Throughput::Elements(1));

    let int = EncodedParam::new("VALUE", -123_456_789i64);
    group.bench_function("int64", |b| b.iter(|| black_box(int.encode())));

    let text = EncodedParam::new("VALUE", "a line with \"quotes\"\nand a newline");
    group.bench_function("escaped_string", |b| b.iter(|| black_box(text.encode())));

    let array = EncodedParam::new("VALUE", (0..100u64).collect::<Vec<_>>());
    group.bench_function("uint64_array_100", |b| b.iter(|| black_box(array.encode())));

    group.finish();
}

fn bench_record_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_build");

    for count in [4, 32, 128] {
        let mut builder = typical_builder(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("{count}_params"), |b| {
            b.iter(|| black_box(builder.build()))
        });
    }

    group.finish();
}

fn bench_record_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_decode");

    for count in [4, 32] {
        let record = match typical_builder(count).build() {
            Ok(record) => record,
            Err(e) => panic!("failed to build bench record: {e}"),
        };
        group.throughput(Throughput::Bytes(record.len() as u64));
        group.bench_function(format!("{count}_params"), |b| {
            b.iter(|| black_box(decode_record(record.as_bytes())))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_param_encode,
    bench_record_build,
    bench_record_decode
);
criterion_main!(benches);
