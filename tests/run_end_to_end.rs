use std::fs;
use std::path::Path;

use tcrit_curves::app::execute_run;
use tcrit_curves::data::{SyntheticConfig, generate_plate};
use tcrit_curves::domain::{RawFormat, RunConfig};
use tcrit_curves::error::EXIT_INPUT;
use tcrit_curves::io::{pending_raw_files, write_raw_table};
use tempfile::TempDir;

fn write_plate(path: &Path, seed: u64) {
    let plate = generate_plate(&SyntheticConfig {
        seed,
        rows: 1,
        columns: 3,
        ..SyntheticConfig::default()
    })
    .unwrap();
    write_raw_table(path, &plate.table, &RawFormat::default(), &[]).unwrap();
}

fn config(input: &Path, out_dir: &Path) -> RunConfig {
    RunConfig {
        input: input.to_path_buf(),
        labels: None,
        out_dir: out_dir.to_path_buf(),
        plots: true,
        format: RawFormat::default(),
        analysis: Default::default(),
    }
}

#[test]
fn writes_table_summary_and_plots() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("plate_01.txt");
    let out_dir = tmp.path().join("results");
    write_plate(&input, 3);

    let report = execute_run(&config(&input, &out_dir)).unwrap();
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.plots_written, 3);

    let table = fs::read_to_string(out_dir.join("plate_01.csv")).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0], "well,Tmax,T50,Tcrit,Tcrit_se,status");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("A1,") && lines[1].ends_with(",ok"), "{}", lines[1]);

    for well in ["A1", "A2", "A3"] {
        assert!(out_dir.join("plate_01").join(format!("{well}.png")).is_file());
    }

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("plate_01_summary.json")).unwrap()).unwrap();
    assert_eq!(summary["counts"]["ok"], 3);
    assert_eq!(summary["wells"].as_array().map(Vec::len), Some(3));
}

#[test]
fn labels_are_left_joined() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("plate_02.txt");
    let labels = tmp.path().join("labels.csv");
    let out_dir = tmp.path().join("results");
    write_plate(&input, 4);
    fs::write(&labels, "well,species,site\nA1,Acropora,North\nA3,Porites,South\nH12,Unused,None\n").unwrap();

    let mut cfg = config(&input, &out_dir);
    cfg.labels = Some(labels);
    cfg.plots = false;
    let report = execute_run(&cfg).unwrap();
    assert_eq!(report.plots_written, 0);
    assert!(!out_dir.join("plate_02").exists());

    let table = fs::read_to_string(out_dir.join("plate_02.csv")).unwrap();
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines[0], "well,Tmax,T50,Tcrit,Tcrit_se,status,species,site");
    assert_eq!(lines.len(), 4);
    assert!(lines[1].ends_with(",ok,Acropora,North"), "{}", lines[1]);
    assert!(lines[2].ends_with(",ok,,"), "{}", lines[2]);
    assert!(lines[3].ends_with(",ok,Porites,South"), "{}", lines[3]);
}

#[test]
fn malformed_input_is_fatal_and_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("broken.txt");
    let out_dir = tmp.path().join("results");
    fs::write(&input, "export\nrun\nTime\tTemp\tA1\n0\t25.0\t10\n2\tabc\t11\n").unwrap();

    let err = execute_run(&config(&input, &out_dir)).unwrap_err();
    assert_eq!(err.exit_code(), EXIT_INPUT);
    assert!(!out_dir.join("broken.csv").exists());
}

#[test]
fn processed_files_leave_the_pending_list() {
    let tmp = TempDir::new().unwrap();
    let raw_dir = tmp.path().join("raw");
    let out_dir = tmp.path().join("results");
    fs::create_dir_all(&raw_dir).unwrap();
    write_plate(&raw_dir.join("a.txt"), 1);
    write_plate(&raw_dir.join("b.txt"), 2);

    let pending = pending_raw_files(&raw_dir, &out_dir).unwrap();
    assert_eq!(pending, vec![raw_dir.join("a.txt"), raw_dir.join("b.txt")]);

    let mut cfg = config(&pending[0], &out_dir);
    cfg.plots = false;
    execute_run(&cfg).unwrap();
    assert_eq!(pending_raw_files(&raw_dir, &out_dir).unwrap(), vec![raw_dir.join("b.txt")]);
}

#[test]
fn failed_output_leaves_input_pending() {
    let tmp = TempDir::new().unwrap();
    let raw_dir = tmp.path().join("raw");
    let out_dir = tmp.path().join("results");
    fs::create_dir_all(&raw_dir).unwrap();
    fs::create_dir_all(&out_dir).unwrap();
    let input = raw_dir.join("plate_03.txt");
    write_plate(&input, 5);
    // A regular file where the plot directory should go.
    fs::write(out_dir.join("plate_03"), "not a directory").unwrap();

    assert!(execute_run(&config(&input, &out_dir)).is_err());
    assert!(!out_dir.join("plate_03.csv").exists());
    assert_eq!(pending_raw_files(&raw_dir, &out_dir).unwrap(), vec![input]);
}

#[test]
fn zero_padded_well_headers_join_labels_verbatim() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("plate_04.txt");
    let labels = tmp.path().join("labels.csv");
    let out_dir = tmp.path().join("results");

    let plate = generate_plate(&SyntheticConfig {
        seed: 6,
        rows: 1,
        columns: 2,
        ..SyntheticConfig::default()
    })
    .unwrap();
    let mut table = plate.table;
    table.labels = vec!["A01".to_string(), "A02".to_string()];
    write_raw_table(&input, &table, &RawFormat::default(), &[]).unwrap();
    fs::write(&labels, "well,site\nA01,North\nA02,South\n").unwrap();

    let mut cfg = config(&input, &out_dir);
    cfg.labels = Some(labels);
    cfg.plots = false;
    execute_run(&cfg).unwrap();

    let text = fs::read_to_string(out_dir.join("plate_04.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[1].starts_with("A01,") && lines[1].ends_with(",North"), "{}", lines[1]);
    assert!(lines[2].starts_with("A02,") && lines[2].ends_with(",South"), "{}", lines[2]);

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out_dir.join("plate_04_summary.json")).unwrap()).unwrap();
    assert_eq!(summary["wells"][0]["well"], "A01");
}
