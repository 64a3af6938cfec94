use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const UTT2LEN: &str = "\
utt_aa 900
utt_ab 1500
utt_ba 700
utt_bb 1100
";

const UTT2LANG: &str = "\
utt_aa 0
utt_ab 0
utt_ba 1
utt_bb 1
";

fn write_tables(dir: &Path, utt2lang: &str) -> (std::path::PathBuf, std::path::PathBuf) {
    let utt2len_path = dir.join("utt2len");
    let utt2lang_path = dir.join("utt2lang");
    fs::write(&utt2len_path, UTT2LEN).unwrap();
    fs::write(&utt2lang_path, utt2lang).unwrap();
    (utt2len_path, utt2lang_path)
}

fn examplan() -> Command {
    Command::cargo_bin("examplan").unwrap()
}

#[test]
fn end_to_end_run_succeeds() {
    let dir = TempDir::new().unwrap();
    let (utt2len, utt2lang) = write_tables(dir.path(), UTT2LANG);
    let egs = dir.path().join("egs");

    examplan()
        .arg(&utt2len)
        .arg(&utt2lang)
        .arg(&egs)
        .args(["--num-archives", "4", "--num-jobs", "2"])
        .args(["--frames-per-iter", "1000"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 4 utterances"));

    assert!(egs.join("temp/archive_chunk_lengths").is_file());
    assert!(egs.join("temp/ranges.1").is_file());
    assert!(egs.join("temp/ranges.2").is_file());
    assert!(egs.join("temp/outputs.1").is_file());
    assert!(egs.join("temp/outputs.2").is_file());
    assert!(egs.join("pdf2num").is_file());
}

#[test]
fn same_seed_runs_are_byte_identical() {
    let dir = TempDir::new().unwrap();
    let (utt2len, utt2lang) = write_tables(dir.path(), UTT2LANG);
    let egs = dir.path().join("egs");
    let names = ["temp/ranges.1", "temp/outputs.1", "pdf2num"];

    let run = |egs: &Path| {
        examplan()
            .arg(&utt2len)
            .arg(&utt2lang)
            .arg(egs)
            .args(["--num-archives", "3", "--num-jobs", "1", "--seed", "4"])
            .args(["--frames-per-iter", "1000"])
            .assert()
            .success();
    };

    run(&egs);
    let first: Vec<Vec<u8>> = names.iter().map(|n| fs::read(egs.join(n)).unwrap()).collect();
    fs::remove_dir_all(&egs).unwrap();
    run(&egs);
    let second: Vec<Vec<u8>> = names.iter().map(|n| fs::read(egs.join(n)).unwrap()).collect();

    assert_eq!(first, second);
}

#[test]
fn geometric_lengths_match_documented_sequence() {
    let dir = TempDir::new().unwrap();
    let (utt2len, utt2lang) = write_tables(dir.path(), UTT2LANG);
    let egs = dir.path().join("egs");

    examplan()
        .arg(&utt2len)
        .arg(&utt2lang)
        .arg(&egs)
        .args(["--num-archives", "3", "--num-jobs", "3"])
        .args(["--min-frames-per-chunk", "50", "--max-frames-per-chunk", "200"])
        .args(["--randomize-chunk-length", "false"])
        .args(["--frames-per-iter", "1000"])
        .assert()
        .success();

    let report = fs::read_to_string(egs.join("temp/archive_chunk_lengths")).unwrap();
    assert_eq!(report, "1 50\n2 100\n3 200\n");
}

#[test]
fn misaligned_category_table_aborts_before_writing() {
    let dir = TempDir::new().unwrap();
    let misaligned = "utt_aa 0\nutt_zz 0\nutt_ba 1\nutt_bb 1\n";
    let (utt2len, utt2lang) = write_tables(dir.path(), misaligned);
    let egs = dir.path().join("egs");

    examplan()
        .arg(&utt2len)
        .arg(&utt2lang)
        .arg(&egs)
        .args(["--num-archives", "2", "--num-jobs", "1"])
        .args(["--frames-per-iter", "1000"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad input table"));

    assert!(!egs.exists());
}

#[test]
fn rejects_more_jobs_than_archives() {
    let dir = TempDir::new().unwrap();
    let (utt2len, utt2lang) = write_tables(dir.path(), UTT2LANG);

    examplan()
        .arg(&utt2len)
        .arg(&utt2lang)
        .arg(dir.path().join("egs"))
        .args(["--num-archives", "2", "--num-jobs", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not exceed num-archives"));
}

#[test]
fn rejects_missing_input_file() {
    let dir = TempDir::new().unwrap();
    let (utt2len, _) = write_tables(dir.path(), UTT2LANG);

    examplan()
        .arg(&utt2len)
        .arg(dir.path().join("nonexistent"))
        .arg(dir.path().join("egs"))
        .args(["--num-archives", "2", "--num-jobs", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("utt2lang file does not exist"));
}

#[test]
fn plan_file_drives_the_run() {
    let dir = TempDir::new().unwrap();
    let (utt2len, utt2lang) = write_tables(dir.path(), UTT2LANG);
    let egs = dir.path().join("egs");
    let plan_path = dir.path().join("plan.json");
    fs::write(
        &plan_path,
        r#"{"num_archives": 2, "num_jobs": 2, "frames_per_iter": 1000, "prefix": "train"}"#,
    )
    .unwrap();

    examplan()
        .arg(&utt2len)
        .arg(&utt2lang)
        .arg(&egs)
        .arg("--plan-file")
        .arg(&plan_path)
        .assert()
        .success();

    assert!(egs.join("temp/train_ranges.1").is_file());
    assert!(egs.join("temp/train_ranges.2").is_file());
    assert!(egs.join("train_pdf2num").is_file());
}

#[test]
fn rejects_invalid_plan_json() {
    let dir = TempDir::new().unwrap();
    let (utt2len, utt2lang) = write_tables(dir.path(), UTT2LANG);

    examplan()
        .arg(&utt2len)
        .arg(&utt2lang)
        .arg(dir.path().join("egs"))
        .args(["--plan-json", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse plan JSON"));
}
