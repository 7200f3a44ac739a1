use std::fmt::Write as _;
use std::process::{Command, Stdio};

use assert_cmd::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use tempfile::TempDir;

fn confstack() -> Command {
    let mut cmd = Command::cargo_bin("confstack").expect("failed to locate confstack binary");
    cmd.env_remove("CONFSTACK_BASE_PATH")
        .env_remove("CONFSTACK_LOG_MODE");
    cmd
}

fn write_large_ini(dir: &TempDir, sections: usize) {
    let mut content = String::new();
    for s in 0..sections {
        writeln!(content, "[Section{s}]").unwrap();
        for k in 0..10 {
            writeln!(content, "Key{k} = value-{s}-{k}").unwrap();
        }
    }
    std::fs::write(dir.path().join("large.ini"), content).expect("failed to write bench file");
}

fn bench_cli_startup(c: &mut Criterion) {
    c.bench_function("cli_startup_version", |b| {
        b.iter(|| {
            let output = confstack()
                .arg("--version")
                .output()
                .expect("failed to run confstack");
            black_box(output);
        });
    });
}

fn bench_cli_get(c: &mut Criterion) {
    c.bench_function("cli_get", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().expect("failed to create temp dir");
                write_large_ini(&dir, 100);
                dir
            },
            |dir| {
                let status = confstack()
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .arg("--base-path")
                    .arg(dir.path())
                    .args(["-s", "ini:large.ini", "-s", "env", "get", "Section50:Key5"])
                    .status()
                    .expect("failed to execute confstack get");
                black_box(status.success());
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_cli_export(c: &mut Criterion) {
    c.bench_function("cli_export_json", |b| {
        b.iter_batched(
            || {
                let dir = TempDir::new().expect("failed to create temp dir");
                write_large_ini(&dir, 100);
                dir
            },
            |dir| {
                let output = confstack()
                    .arg("--base-path")
                    .arg(dir.path())
                    .args(["-s", "ini:large.ini", "export", "--format", "json"])
                    .output()
                    .expect("failed to execute confstack export");
                black_box(output);
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(cli_benches, bench_cli_startup, bench_cli_get, bench_cli_export);
criterion_main!(cli_benches);
