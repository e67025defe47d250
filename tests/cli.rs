use std::path::{Path, PathBuf};

use assert_cmd::Command;
use calamine::{open_workbook_auto, Data, Reader};
use predicates::prelude::*;
use rust_xlsxwriter::Workbook;

fn write_timesheet(path: &Path, month: &str, name: &str, id: f64, rows: &[(&str, f64, &str)]) {
    let mut book = Workbook::new();
    let ws = book.add_worksheet();
    ws.set_name("Project Monthly Summary").unwrap();
    ws.write_string(1, 1, month).unwrap();
    ws.write_string(1, 2, name).unwrap();
    ws.write_number(1, 3, id).unwrap();
    ws.write_string(2, 1, "Customer").unwrap();
    for (i, (customer, hours, code)) in rows.iter().enumerate() {
        let row = 3 + i as u32;
        ws.write_string(row, 1, *customer).unwrap();
        ws.write_number(row, 3, *hours).unwrap();
        ws.write_string(row, 4, *code).unwrap();
    }
    book.save(path).unwrap();
}

fn write_cost_table(path: &Path) {
    let mut book = Workbook::new();
    for month in [7, 8, 9, 10, 11, 12, 1, 2, 3, 4, 5, 6] {
        let ws = book.add_worksheet();
        // Mix notations the way hand-maintained books do.
        let name = match month {
            8 => "８月".to_string(),
            12 => "１２月".to_string(),
            m => format!("{m}月"),
        };
        ws.set_name(name).unwrap();
        ws.write_string(0, 0, "Category").unwrap();
        match month {
            7 => {
                ws.write_string(1, 0, "売上").unwrap();
                ws.write_string(1, 2, "Dev").unwrap();
                ws.write_string(1, 3, "Acme").unwrap();
                ws.write_string(1, 4, "SES").unwrap();
                ws.write_number(1, 8, 100.0).unwrap();
                ws.write_number(1, 9, 90.0).unwrap();
                ws.write_string(2, 0, "仕入").unwrap();
                ws.write_string(2, 3, "Acme").unwrap();
                ws.write_string(2, 4, "SES").unwrap();
                ws.write_number(2, 8, 30.0).unwrap();
                ws.write_number(2, 9, 20.0).unwrap();
            }
            3 => {
                ws.write_string(1, 0, "sale").unwrap();
                ws.write_string(1, 2, "Ops").unwrap();
                ws.write_string(1, 3, "Globex").unwrap();
                ws.write_string(1, 4, "Fixed").unwrap();
                ws.write_number(1, 8, 500.0).unwrap();
            }
            _ => {}
        }
    }
    book.save(path).unwrap();
}

fn write_output_book(path: &Path, rates: &[(f64, &str, f64)]) {
    let mut book = Workbook::new();
    let ws = book.add_worksheet();
    ws.set_name("Rate Settings").unwrap();
    ws.write_string(0, 0, "Id").unwrap();
    for (i, (id, name, rate)) in rates.iter().enumerate() {
        let row = 1 + i as u32;
        ws.write_number(row, 0, *id).unwrap();
        ws.write_string(row, 1, *name).unwrap();
        ws.write_number(row, 2, *rate).unwrap();
    }
    let ws = book.add_worksheet();
    ws.set_name("Customer Settings").unwrap();
    ws.write_string(0, 0, "Name").unwrap();
    ws.write_string(1, 0, "Acme").unwrap();
    ws.write_string(1, 1, "C001").unwrap();
    let ws = book.add_worksheet();
    ws.set_name("Employee Detail").unwrap();
    ws.write_string(0, 0, "stale").unwrap();
    book.save(path).unwrap();
}

struct Fixture {
    dir: tempfile::TempDir,
    config: PathBuf,
    output: PathBuf,
}

fn fixture(rates: &[(f64, &str, f64)]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let ts = dir.path().join("timesheets");
    let cost = dir.path().join("cost");
    std::fs::create_dir_all(&ts).unwrap();
    std::fs::create_dir_all(&cost).unwrap();

    write_timesheet(
        &ts.join("sato.xlsx"),
        "2024/05",
        "Sato",
        5.0,
        &[("Acme", 80.0, "C001"), ("Globex", 100.0, "C002"), ("Hooli", 0.0, "C003")],
    );
    write_cost_table(&cost.join("売上原価表2024.xlsx"));
    std::fs::write(cost.join("notes.txt"), "ignored").unwrap();

    let output = dir.path().join("report.xlsx");
    write_output_book(&output, rates);

    let config = dir.path().join("appsettings.json");
    let json = serde_json::json!({
        "TimesheetFolder": ts,
        "CostTableFolder": cost,
        "OutputFile": output,
        "ReportYear": "2024",
        "ActualsHandoverDay": 10,
        "TimesheetExtension": "xlsx",
    });
    std::fs::write(&config, json.to_string()).unwrap();
    Fixture { dir, config, output }
}

fn cell(path: &Path, sheet: &str, row: u32, col: u32) -> Data {
    let mut book = open_workbook_auto(path).unwrap();
    let range = book.worksheet_range(sheet).unwrap();
    range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
}

fn number(data: Data) -> f64 {
    match data {
        Data::Float(f) => f,
        Data::Int(i) => i as f64,
        Data::DateTime(dt) => dt.as_f64(),
        other => panic!("not a number: {other:?}"),
    }
}

fn workcost() -> Command {
    Command::cargo_bin("workcost").unwrap()
}

#[test]
fn run_writes_both_report_sheets() {
    let fx = fixture(&[(5.0, "Sato", 3000.0)]);

    workcost()
        .args(["run", "--today", "2024-07-05", "--config"])
        .arg(&fx.config)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 employee rows"));

    let emp = "Employee Detail";
    assert_eq!(cell(&fx.output, emp, 0, 0), Data::String("Employee Id".into()));
    assert_eq!(number(cell(&fx.output, emp, 1, 0)), 5.0);
    assert_eq!(cell(&fx.output, emp, 1, 4), Data::String("Acme".into()));
    assert_eq!(number(cell(&fx.output, emp, 1, 6)), 180.0);
    assert_eq!(number(cell(&fx.output, emp, 1, 7)), 3600.0);
    assert_eq!(number(cell(&fx.output, emp, 1, 8)), 1600.0);
    assert_eq!(number(cell(&fx.output, emp, 2, 8)), 2000.0);
    assert_eq!(cell(&fx.output, emp, 3, 0), Data::Empty);

    let proj = "Customer Job Profitability";
    // Dev/2024-07/Acme/SES: today is before the 10th, so actuals are used.
    assert_eq!(cell(&fx.output, proj, 1, 0), Data::String("Dev".into()));
    assert_eq!(cell(&fx.output, proj, 1, 2), Data::String("C001".into()));
    assert_eq!(number(cell(&fx.output, proj, 1, 5)), 90.0);
    assert_eq!(number(cell(&fx.output, proj, 1, 6)), 20.0);
    // Ops/2025-03/Globex/Fixed is sorted after Dev and has no customer code.
    assert_eq!(cell(&fx.output, proj, 2, 0), Data::String("Ops".into()));
    let code = cell(&fx.output, proj, 2, 2);
    assert!(
        matches!(&code, Data::Empty) || code == Data::String(String::new()),
        "{code:?}"
    );

    // Reference sheets survive the rewrite.
    assert_eq!(number(cell(&fx.output, "Rate Settings", 1, 2)), 3000.0);
    assert_eq!(cell(&fx.output, "Customer Settings", 1, 1), Data::String("C001".into()));
}

#[test]
fn run_uses_planned_figures_after_cutover() {
    let fx = fixture(&[(5.0, "Sato", 3000.0)]);
    workcost()
        .args(["run", "--today", "2024-07-11", "--config"])
        .arg(&fx.config)
        .assert()
        .success();

    let proj = "Customer Job Profitability";
    assert_eq!(number(cell(&fx.output, proj, 1, 5)), 100.0);
    assert_eq!(number(cell(&fx.output, proj, 1, 6)), 30.0);
}

#[test]
fn run_fails_without_rate_entry() {
    let fx = fixture(&[(6.0, "Suzuki", 2500.0)]);
    workcost()
        .args(["run", "--config"])
        .arg(&fx.config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No standard rate for employee 5 (Sato)"));

    // Nothing was rewritten.
    assert_eq!(cell(&fx.output, "Employee Detail", 0, 0), Data::String("stale".into()));
}

#[test]
fn run_skips_missing_input_folders() {
    let fx = fixture(&[(5.0, "Sato", 3000.0)]);
    std::fs::remove_dir_all(fx.dir.path().join("timesheets")).unwrap();
    std::fs::remove_dir_all(fx.dir.path().join("cost")).unwrap();

    workcost()
        .args(["run", "--config"])
        .arg(&fx.config)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 employee rows and 0 project rows"))
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn run_skips_timesheets_that_cannot_be_decrypted() {
    use std::io::Write;

    let fx = fixture(&[(5.0, "Sato", 3000.0)]);
    let locked = fx.dir.path().join("timesheets").join("locked.xlsx");
    let mut compound = cfb::create(&locked).unwrap();
    let mut stream = compound.create_stream("/EncryptedPackage").unwrap();
    stream.write_all(&[0u8; 64]).unwrap();
    drop(stream);
    compound.flush().unwrap();

    let mut json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&fx.config).unwrap()).unwrap();
    json["TimesheetPassword"] = serde_json::Value::from("0901");
    std::fs::write(&fx.config, json.to_string()).unwrap();

    workcost()
        .args(["run", "--today", "2024-07-05", "--config"])
        .arg(&fx.config)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 employee rows"))
        .stdout(predicate::str::contains("Skipped 1 restricted file(s)"))
        .stdout(predicate::str::contains("locked.xlsx"));
}

#[test]
fn run_keeps_formulas_outside_report_sheets() {
    let fx = fixture(&[(5.0, "Sato", 3000.0)]);
    // Rebuild the output book with a summary sheet that sums the report.
    let mut book = Workbook::new();
    let ws = book.add_worksheet();
    ws.set_name("Rate Settings").unwrap();
    ws.write_number(1, 0, 5.0).unwrap();
    ws.write_string(1, 1, "Sato").unwrap();
    ws.write_number(1, 2, 3000.0).unwrap();
    let ws = book.add_worksheet();
    ws.set_name("Customer Settings").unwrap();
    ws.write_string(1, 0, "Acme").unwrap();
    ws.write_string(1, 1, "C001").unwrap();
    let ws = book.add_worksheet();
    ws.set_name("Summary").unwrap();
    ws.write_formula(0, 0, "=SUM('Employee Detail'!I:I)").unwrap();
    book.save(&fx.output).unwrap();

    workcost()
        .args(["run", "--today", "2024-07-05", "--config"])
        .arg(&fx.config)
        .assert()
        .success();

    let mut written = open_workbook_auto(&fx.output).unwrap();
    let formulas = written.worksheet_formula("Summary").unwrap();
    let formula = formulas.get_value((0, 0)).cloned().unwrap_or_default();
    assert!(formula.contains("Employee Detail"), "{formula:?}");
    assert_eq!(number(cell(&fx.output, "Employee Detail", 1, 8)), 1600.0);
}

#[test]
fn show_prints_tables_without_writing() {
    let fx = fixture(&[(5.0, "Sato", 3000.0)]);
    workcost()
        .args(["show", "--today", "2024-07-05", "--config"])
        .arg(&fx.config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Globex"))
        .stdout(predicate::str::contains("3,600"))
        .stdout(predicate::str::contains("actual"));

    assert_eq!(cell(&fx.output, "Employee Detail", 0, 0), Data::String("stale".into()));
}

#[test]
fn init_writes_template_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("appsettings.json");
    workcost()
        .args(["init", "--path"])
        .arg(&path)
        .assert()
        .success();
    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("\"ActualsHandoverDay\": 10"));

    workcost()
        .args(["init", "--path"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn run_reports_missing_settings() {
    let dir = tempfile::tempdir().unwrap();
    workcost()
        .args(["run", "--config"])
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Settings error"));
}
