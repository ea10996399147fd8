/// Benchmarks for decoding, loading and chunking uploaded files
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use doc_rag::indexer::{MultiFileLoader, TextChunker, UploadedFile, decode_text};

fn sample_text(chars: usize) -> String {
    "Quarterly revenue grew in every region except the north. "
        .chars()
        .cycle()
        .take(chars)
        .collect()
}

fn cp1252_bytes(chars: usize) -> Vec<u8> {
    // Curly quotes push the decoder past UTF-8, UTF-16 and Latin-1
    sample_text(chars)
        .bytes()
        .map(|b| if b == b' ' { 0x93 } else { b })
        .collect()
}

fn benchmark_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoding");

    for size in [10_000, 100_000, 1_000_000].iter() {
        let utf8 = sample_text(*size).into_bytes();
        let cp1252 = cp1252_bytes(*size);

        group.bench_with_input(BenchmarkId::new("utf8", size), &utf8, |b, bytes| {
            b.iter(|| decode_text(black_box(bytes)))
        });
        group.bench_with_input(BenchmarkId::new("cp1252", size), &cp1252, |b, bytes| {
            b.iter(|| decode_text(black_box(bytes)))
        });
    }

    group.finish();
}

fn benchmark_chunking(c: &mut Criterion) {
    let mut group = c.benchmark_group("chunking");
    let chunker = TextChunker::default();

    for size in [10_000, 100_000, 1_000_000].iter() {
        let text = sample_text(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| chunker.split(black_box(text)))
        });
    }

    group.finish();
}

fn benchmark_batch_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_loading");

    for file_count in [10, 50, 100].iter() {
        let files: Vec<UploadedFile> = (0..*file_count)
            .map(|i| UploadedFile::from_bytes(format!("file_{}.txt", i), cp1252_bytes(20_000)))
            .collect();

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_files", file_count)),
            &files,
            |b, files| {
                b.iter(|| {
                    let mut loader = MultiFileLoader::new();
                    loader.load_batch(black_box(files)).unwrap()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_decoding,
    benchmark_chunking,
    benchmark_batch_loading
);
criterion_main!(benches);
