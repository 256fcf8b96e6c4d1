use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use playbook_rs::{PageSession, RenderContext, StrategyRegistry, embedded_guides, markup, placeholder};
use std::io::Cursor;
use zstd::stream::decode_all;

static GUIDE_BYTES: &[u8] = include_bytes!(env!("PLAYBOOK_GUIDES"));

fn bench_cold_load(c: &mut Criterion) {
    c.bench_function("cold_load::decompress_guides", |b| {
        b.iter(|| {
            let json = decode_all(Cursor::new(GUIDE_BYTES)).expect("decompress guides");
            black_box(json.len());
        });
    });
}

fn bench_translate(c: &mut Criterion) {
    let source = embedded_guides().expect("embedded guides");
    for (idx, guide) in source.instructions.iter().enumerate() {
        let content = placeholder::resolve(&guide.content, Some("bench01"));
        c.bench_with_input(BenchmarkId::new("translate", idx + 1), &content, |b, content| {
            b.iter(|| black_box(markup::translate_with_class(content)));
        });
    }
}

fn bench_render_page(c: &mut Criterion) {
    let source = embedded_guides().expect("embedded guides");
    let registry = StrategyRegistry::default();
    let options = playbook_rs::PlaybookConfig::default().page_options(Some("bench01"));
    c.bench_function("render::full_page", |b| {
        b.iter(|| {
            let ctx = RenderContext::render(&source, &options, &registry);
            black_box(ctx.html().len());
        });
    });
    c.bench_function("session::search", |b| {
        let ctx = RenderContext::render(&source, &options, &registry);
        let mut session: PageSession = PageSession::new(ctx, &options, playbook_rs::NoClipboard);
        b.iter(|| {
            session.search(black_box("referral"));
            session.search("");
        });
    });
}

criterion_group!(benches, bench_cold_load, bench_translate, bench_render_page);
criterion_main!(benches);
