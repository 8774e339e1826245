use criterion::{criterion_group, criterion_main, Criterion};

macro_rules! gen_bench {
    ($name:ident, $samples:expr, $desc:literal, $re:literal, $data:expr) => {
        fn $name(c: &mut Criterion) {
            let mut group = c.benchmark_group($desc);
            let data: &str = $data;

            group.sample_size($samples);

            group.bench_function("regex-automata", |b| {
                let re = regex_automata::meta::Regex::new($re).unwrap();
                b.iter(|| re.find_iter(data).count())
            });

            group.bench_function("regulus", |b| {
                let pattern = regulus::Pattern::new($re).unwrap();
                b.iter(|| {
                    let mut matcher = pattern.matcher(data);
                    let mut count = 0;
                    while matcher.find() {
                        count += 1;
                    }
                    count
                })
            });
        }
    };
}

const TEXT: &str = include_str!("../src/matcher/mod.rs");

gen_bench!(
    bench_literal,
    50,
    "Long literal",
    r"character boundary",
    TEXT
);

gen_bench!(
    bench_short_literal,
    50,
    "Short literal",
    r"fn",
    TEXT
);

gen_bench!(bench_class, 50, "Word class", r"\w+", TEXT);

gen_bench!(
    bench_alternation,
    50,
    "Alternation",
    r"(?:pub|fn|let|mut)\s+\w+",
    TEXT
);

gen_bench!(
    bench_case_insensitive,
    50,
    "Case-insensitive literal",
    r"(?i)MATCHER",
    TEXT
);

gen_bench!(
    bench_group_loop,
    50,
    "Variable-length group repetition",
    r"(?:\w+\s?)+;",
    TEXT
);

gen_bench!(
    bench_anchored_lines,
    20,
    "Multiline anchors",
    r"(?m)^\s*///.*$",
    TEXT
);

fn bench_back_reference(c: &mut Criterion) {
    let mut group = c.benchmark_group("Back reference");
    let data = "abcabc xyzxyz ".repeat(1000);

    group.sample_size(20);

    group.bench_function("regulus", |b| {
        let pattern = regulus::Pattern::new(r"(\w{3})\1").unwrap();
        b.iter(|| {
            let mut matcher = pattern.matcher(&data);
            let mut count = 0;
            while matcher.find() {
                count += 1;
            }
            count
        })
    });
}

criterion_group!(
    benches,
    bench_literal,
    bench_short_literal,
    bench_class,
    bench_alternation,
    bench_case_insensitive,
    bench_group_loop,
    bench_anchored_lines,
    bench_back_reference,
);

criterion_main!(benches);
