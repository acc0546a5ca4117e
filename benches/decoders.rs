use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gitrelay::git::{parse_branches, parse_commit, parse_log, parse_remotes, parse_status};

// Sample git outputs for realistic benchmarking
const SMALL_STATUS: &str = "M  README.md\n M src/main.rs\n?? untracked.txt";

const MEDIUM_STATUS: &str = "M  README.md
 M src/main.rs
MM src/lib.rs
A  src/error.rs
 D old_file.rs
?? untracked1.txt
?? untracked2.txt
?? untracked3.txt
?? untracked4.txt
?? untracked5.txt
M  Cargo.toml
 M Cargo.lock
M  docs/readme.md
 M tests/test.rs
A  benches/bench.rs";

const SMALL_UNTRACKED: &str = "untracked.txt";

fn generate_large_status(num_files: usize) -> String {
    let mut output = String::new();
    for i in 0..num_files {
        output.push_str(&format!("M  file_{}.rs\n", i));
    }
    output
}

fn generate_log(num_commits: usize) -> String {
    let mut output = String::new();
    for i in 0..num_commits {
        output.push_str(&format!(
            "{{\"commit\":\"{:040x}\",\"author\":\"Dev {} <dev{}@example.com>\",\"date\":\"Fri Aug 21 10:00:00 2026 +0000\",\"message\":\"commit {}\"}},\n",
            i, i, i, i
        ));
    }
    output
}

const BRANCH_LIST: &str = "* main
  feature-x
  bugfix-123
  experiment
  release-v1.0";

const REMOTE_LIST: &str = "origin\thttps://example.com/repo.git (fetch)
origin\thttps://example.com/repo.git (push)
upstream\thttps://example.com/upstream.git (fetch)
upstream\tgit@example.com:upstream.git (push)";

const COMMIT_SUMMARY: &str = "[main 5f2a91c] add relay timeouts
 2 files changed, 40 insertions(+), 3 deletions(-)";

fn bench_parse_status(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_status");

    group.bench_with_input(
        BenchmarkId::new("small", "3 files"),
        &(SMALL_STATUS, SMALL_UNTRACKED),
        |b, (porcelain, untracked)| {
            b.iter(|| parse_status(black_box(porcelain), black_box(untracked)))
        },
    );

    group.bench_with_input(
        BenchmarkId::new("medium", "15 files"),
        &MEDIUM_STATUS,
        |b, input| b.iter(|| parse_status(black_box(input), black_box(SMALL_UNTRACKED))),
    );

    let large_status = generate_large_status(100);
    group.bench_with_input(
        BenchmarkId::new("large", "100 files"),
        &large_status,
        |b, input| b.iter(|| parse_status(black_box(input), black_box(""))),
    );

    let xlarge_status = generate_large_status(1000);
    group.bench_with_input(
        BenchmarkId::new("xlarge", "1000 files"),
        &xlarge_status,
        |b, input| b.iter(|| parse_status(black_box(input), black_box(""))),
    );

    group.finish();
}

fn bench_parse_log(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_log");

    let small_log = generate_log(3);
    group.bench_with_input(
        BenchmarkId::new("small", "3 commits"),
        &small_log,
        |b, input| b.iter(|| parse_log(black_box(input))),
    );

    let medium_log = generate_log(50);
    group.bench_with_input(
        BenchmarkId::new("medium", "50 commits"),
        &medium_log,
        |b, input| b.iter(|| parse_log(black_box(input))),
    );

    let large_log = generate_log(500);
    group.bench_with_input(
        BenchmarkId::new("large", "500 commits"),
        &large_log,
        |b, input| b.iter(|| parse_log(black_box(input))),
    );

    group.finish();
}

fn bench_parse_branches(c: &mut Criterion) {
    c.bench_function("parse_branches", |b| {
        b.iter(|| parse_branches(black_box(BRANCH_LIST)))
    });
}

fn bench_parse_remotes(c: &mut Criterion) {
    c.bench_function("parse_remotes", |b| {
        b.iter(|| parse_remotes(black_box(REMOTE_LIST)))
    });
}

fn bench_parse_commit(c: &mut Criterion) {
    c.bench_function("parse_commit", |b| {
        b.iter(|| parse_commit(black_box(COMMIT_SUMMARY)))
    });
}

criterion_group!(
    benches,
    bench_parse_status,
    bench_parse_log,
    bench_parse_branches,
    bench_parse_remotes,
    bench_parse_commit
);
criterion_main!(benches);
