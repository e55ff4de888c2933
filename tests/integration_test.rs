use std::fs::File;
use std::path::Path;

use assert_fs::TempDir;
use assert_fs::prelude::*;
use chrono::{NaiveDate, NaiveDateTime};
use flate2::read::GzDecoder;
use meshback::cli::{Cli, Commands};
use meshback::commands::execute_at;
use meshback::tier::Tier;
use predicates::prelude::*;

fn at(y: i32, mo: u32, d: u32, h: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, 0, 0)
        .unwrap()
}

/// A small project tree resembling the tracked deployment.
fn seed_project(temp: &TempDir) {
    temp.child("project/collector.py").write_str("import mqtt\n").unwrap();
    temp.child("project/schema.sql").write_str("CREATE TABLE t();\n").unwrap();
    temp.child("project/data/positions.csv")
        .write_str("lat,lon\n")
        .unwrap();
    temp.child("project/server.log").write_str("noise\n").unwrap();
    temp.child("project/.git/HEAD").write_str("ref: main\n").unwrap();
}

fn cli_for(temp: &TempDir, command: Commands) -> Cli {
    Cli::builder()
        .source_dir(temp.path().join("project"))
        .backup_dir(temp.path().join("project/backups"))
        .quiet(true)
        .command(command)
        .build()
        .unwrap()
}

fn run_cmd(tier: Tier) -> Commands {
    Commands::Run {
        tier,
        keep: None,
        timeout_secs: None,
        dry_run: false,
    }
}

fn archive_entries(path: &Path) -> Vec<String> {
    let mut archive = tar::Archive::new(GzDecoder::new(File::open(path).unwrap()));
    archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn run_daily_creates_named_archive() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);

    let cli = cli_for(&temp, run_cmd(Tier::Daily));
    execute_at(&cli, at(2025, 6, 1, 3)).unwrap();

    temp.child("project/backups/daily/meshtracking_daily_2025-06-01_03-00-00.tar.gz")
        .assert(predicate::path::is_file());
}

#[test]
fn archive_honors_exclusions_and_self_reference() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);

    // First run leaves an archive behind; the second run must not pick it
    // up even though backups/ sits inside the source tree.
    let cli = cli_for(&temp, run_cmd(Tier::Daily));
    execute_at(&cli, at(2025, 6, 1, 3)).unwrap();
    execute_at(&cli, at(2025, 6, 2, 3)).unwrap();

    let second = temp
        .path()
        .join("project/backups/daily/meshtracking_daily_2025-06-02_03-00-00.tar.gz");
    let entries = archive_entries(&second);

    assert!(entries.iter().any(|e| e == "collector.py"));
    assert!(entries.iter().any(|e| e == "data/positions.csv"));
    assert!(!entries.iter().any(|e| e.starts_with("backups")));
    assert!(!entries.iter().any(|e| e.contains(".git")));
    assert!(!entries.iter().any(|e| e.ends_with(".log")));
}

#[test]
fn yearly_rerun_overwrites_instead_of_accumulating() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);

    let cli = cli_for(&temp, run_cmd(Tier::Yearly));
    execute_at(&cli, at(2025, 3, 1, 4)).unwrap();
    execute_at(&cli, at(2025, 11, 20, 4)).unwrap();

    let yearly = temp.child("project/backups/yearly");
    yearly.assert(predicate::path::is_dir());
    let count = std::fs::read_dir(yearly.path()).unwrap().count();
    assert_eq!(count, 1, "same-year re-run must overwrite, not accumulate");

    yearly
        .child("meshtracking_yearly_2025.tar.gz")
        .assert(predicate::path::is_file());
}

#[test]
fn weekly_same_iso_week_produces_one_artifact() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);

    let cli = cli_for(&temp, run_cmd(Tier::Weekly));
    // Monday and Friday of ISO week 23, 2025.
    execute_at(&cli, at(2025, 6, 2, 4)).unwrap();
    execute_at(&cli, at(2025, 6, 6, 4)).unwrap();

    let count = std::fs::read_dir(temp.path().join("project/backups/weekly"))
        .unwrap()
        .count();
    assert_eq!(count, 1);
}

#[test]
fn daily_reruns_coexist_within_a_day() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);

    let cli = cli_for(&temp, run_cmd(Tier::Daily));
    execute_at(&cli, at(2025, 6, 1, 3)).unwrap();
    execute_at(&cli, at(2025, 6, 1, 9)).unwrap();

    let count = std::fs::read_dir(temp.path().join("project/backups/daily"))
        .unwrap()
        .count();
    assert_eq!(count, 2, "daily names are run-unique; manual re-runs coexist");
}

#[test]
fn repeated_runs_stay_bounded_by_keep_count() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);

    let cli = cli_for(&temp, run_cmd(Tier::Daily));
    for day in 1..=14 {
        execute_at(&cli, at(2025, 6, day, 3)).unwrap();
    }

    let count = std::fs::read_dir(temp.path().join("project/backups/daily"))
        .unwrap()
        .count();
    assert_eq!(count, 10);
}

#[test]
fn rotate_subcommand_with_keep_override() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);

    let run_cli = cli_for(&temp, run_cmd(Tier::Daily));
    for hour in 1..=6 {
        execute_at(&run_cli, at(2025, 6, 1, hour)).unwrap();
    }

    let rotate_cli = cli_for(
        &temp,
        Commands::Rotate {
            tier: Tier::Daily,
            keep: Some(2),
            dry_run: false,
        },
    );
    execute_at(&rotate_cli, at(2025, 6, 1, 7)).unwrap();

    let daily = temp.path().join("project/backups/daily");
    assert_eq!(std::fs::read_dir(&daily).unwrap().count(), 2);
    // The newest two survive.
    temp.child("project/backups/daily/meshtracking_daily_2025-06-01_06-00-00.tar.gz")
        .assert(predicate::path::is_file());
    temp.child("project/backups/daily/meshtracking_daily_2025-06-01_05-00-00.tar.gz")
        .assert(predicate::path::is_file());
}

#[test]
fn rotate_dry_run_leaves_directory_unchanged() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);

    let run_cli = cli_for(&temp, run_cmd(Tier::Daily));
    for hour in 1..=4 {
        execute_at(&run_cli, at(2025, 6, 1, hour)).unwrap();
    }

    let dry_cli = cli_for(
        &temp,
        Commands::Rotate {
            tier: Tier::Daily,
            keep: Some(1),
            dry_run: true,
        },
    );
    execute_at(&dry_cli, at(2025, 6, 1, 5)).unwrap();

    let count = std::fs::read_dir(temp.path().join("project/backups/daily"))
        .unwrap()
        .count();
    assert_eq!(count, 4);
}

#[test]
fn failed_archive_leaves_existing_artifacts_untouched() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);

    // Build up three daily archives, then point a run at a missing source.
    let cli = cli_for(&temp, run_cmd(Tier::Daily));
    for day in 1..=3 {
        execute_at(&cli, at(2025, 6, day, 3)).unwrap();
    }

    let broken_cli = Cli::builder()
        .source_dir(temp.path().join("gone"))
        .backup_dir(temp.path().join("project/backups"))
        .quiet(true)
        .command(run_cmd(Tier::Daily))
        .build()
        .unwrap();

    let result = execute_at(&broken_cli, at(2025, 6, 4, 3));
    assert!(result.is_err(), "missing source must fail the run");

    // No rotation ran: all three prior artifacts are still there.
    let count = std::fs::read_dir(temp.path().join("project/backups/daily"))
        .unwrap()
        .count();
    assert_eq!(count, 3);
}

#[test]
fn status_reports_without_side_effects() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);

    let status_cli = cli_for(&temp, Commands::Status);
    execute_at(&status_cli, at(2025, 6, 1, 3)).unwrap();

    // Status never creates tier directories.
    temp.child("project/backups")
        .assert(predicate::path::missing());
}

#[test]
fn extra_exclude_patterns_are_applied() {
    let temp = TempDir::new().unwrap();
    seed_project(&temp);
    temp.child("project/mesh.sqlite3").write_str("db").unwrap();

    let cli = Cli::builder()
        .source_dir(temp.path().join("project"))
        .backup_dir(temp.path().join("project/backups"))
        .exclude("*.sqlite3")
        .quiet(true)
        .command(run_cmd(Tier::Monthly))
        .build()
        .unwrap();
    execute_at(&cli, at(2025, 6, 1, 3)).unwrap();

    let archive = temp
        .path()
        .join("project/backups/monthly/meshtracking_monthly_2025-06.tar.gz");
    let entries = archive_entries(&archive);
    assert!(!entries.iter().any(|e| e.ends_with(".sqlite3")));
    assert!(entries.iter().any(|e| e == "schema.sql"));
}
