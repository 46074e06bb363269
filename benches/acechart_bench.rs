use acechart::ace::{self, Compression, EncodeOptions};
use acechart::json::JsonParser;
use acechart::{Antigen, Chart, ChartTiters, Layout, Projection, Serum, Titer};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn synthetic_chart(antigens: usize, sera: usize) -> Chart {
    let titer = |ag: usize, sr: usize| match (ag + sr) % 4 {
        0 => Titer::Regular(10 << (ag % 8)),
        1 => Titer::LessThan(10),
        2 => Titer::Dodgy(80),
        _ => Titer::DontCare,
    };

    let points = antigens + sera;
    Chart {
        antigens: (0..antigens)
            .map(|i| Antigen {
                passage: String::from("MDCK2/SIAT1"),
                date: format!("2017-{:02}-{:02}", i % 12 + 1, i % 28 + 1),
                ..Antigen::new(format!("A/SINGAPORE/{}/2017", i))
            })
            .collect(),
        sera: (0..sera)
            .map(|i| Serum {
                serum_id: format!("F{}", i),
                ..Serum::new(format!("A/HONG KONG/{}/2014", i))
            })
            .collect(),
        titers: ChartTiters {
            list: (0..antigens)
                .map(|ag| (0..sera).map(|sr| titer(ag, sr)).collect())
                .collect(),
            ..ChartTiters::default()
        },
        projections: vec![Projection {
            stress: 1234.5,
            layout: Layout::new(
                (0..points)
                    .map(|i| vec![i as f64 * 0.125, -(i as f64) / 3.0])
                    .collect(),
            ),
            ..Projection::default()
        }],
        ..Chart::default()
    }
}

pub fn tokenize_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenize");
    for size in [16, 128, 1024].iter() {
        let data = ace::write_chart(&synthetic_chart(*size, *size / 8), &EncodeOptions::new())
            .unwrap();
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &_size| {
            b.iter(|| JsonParser::new(black_box(&data)).count())
        });
    }
    group.finish();
}

pub fn decode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for size in [16, 128, 1024].iter() {
        let data = ace::write_chart(&synthetic_chart(*size, *size / 8), &EncodeOptions::new())
            .unwrap();
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("ace", size), size, |b, &_size| {
            b.iter(|| ace::read_chart(black_box(&data)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("serde_json-value", size), size, |b, &_size| {
            b.iter(|| serde_json::from_slice::<serde_json::Value>(black_box(&data)).unwrap())
        });
    }
    group.finish();
}

pub fn encode_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let chart = synthetic_chart(1024, 128);
    let len = ace::write_chart(&chart, &EncodeOptions::new()).unwrap().len();
    group.throughput(Throughput::Bytes(len as u64));
    group.bench_function("compact", |b| {
        b.iter(|| ace::write_chart(black_box(&chart), &EncodeOptions::new()).unwrap())
    });
    #[cfg(feature = "gzip")]
    group.bench_function("gzip", |b| {
        let options = EncodeOptions::new().with_compression(Compression::Gzip);
        b.iter(|| ace::write_chart(black_box(&chart), &options).unwrap())
    });
    #[cfg(feature = "xz")]
    group.bench_function("xz", |b| {
        let options = EncodeOptions::new().with_compression(Compression::Xz);
        b.iter(|| ace::write_chart(black_box(&chart), &options).unwrap())
    });
    group.finish();
}

criterion_group!(
    benches,
    tokenize_benchmark,
    decode_benchmark,
    encode_benchmark
);
criterion_main!(benches);
