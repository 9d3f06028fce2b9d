use criterion::{black_box, criterion_group, criterion_main, Criterion};
use hover_translate::model::{NormalizedPoint, NormalizedRect, RecognizedWord};
use hover_translate::ocr::parse_tsv;
use hover_translate::selection::{select_word, DEFAULT_HIT_TOLERANCE};
use hover_translate::stems::candidate_forms;

/// A dense page of words laid out on a grid, as OCR returns for a full capture.
fn page(rows: usize, cols: usize) -> Vec<RecognizedWord> {
    let w = 1.0 / cols as f64;
    let h = 1.0 / rows as f64;
    (0..rows * cols)
        .map(|i| RecognizedWord {
            text: format!("word{i}"),
            bounds: NormalizedRect::new((i % cols) as f64 * w, (i / cols) as f64 * h, w * 0.9, h * 0.8),
        })
        .collect()
}

fn tsv_page(rows: usize, cols: usize) -> String {
    let mut out = String::from("level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n");
    for r in 0..rows {
        for c in 0..cols {
            out.push_str(&format!("5\t1\t1\t1\t{r}\t{c}\t{}\t{}\t40\t12\t93.1\tword{r}x{c}\n", c * 42, r * 14));
        }
    }
    out
}

fn bench_word_selection(c: &mut Criterion) {
    let words = page(40, 25);
    let point = NormalizedPoint { x: 0.51, y: 0.49 };
    c.bench_function("select_word_1000", |b| {
        b.iter(|| select_word(black_box(&words), black_box(point), DEFAULT_HIT_TOLERANCE))
    });

    let tsv = tsv_page(40, 25);
    c.bench_function("parse_tsv_1000", |b| b.iter(|| parse_tsv(black_box(&tsv), 1050, 560)));

    c.bench_function("candidate_forms", |b| {
        b.iter(|| candidate_forms(black_box("Stopping")))
    });
}

criterion_group!(benches, bench_word_selection);
criterion_main!(benches);
