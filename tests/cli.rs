mod common;

use std::fs;

use assert_cmd::Command;
use common::{QUARTER_SALES_CSV, TestWorkspace};
use predicates::{prelude::PredicateBooleanExt, str::contains};

const LEGACY_CSV: &str = "\
Order Number,Part Number,Qty Shipped,Product Type,Pieces per Carton,Date Ordered,Price
PO-1,BR-100,100,Bracket,10,2024-01-03,120.5
PO-2,BR-200,40,Bracket,10,2024-02-11,99
PO-3,HG-300,oops,Hinge,25,2024-02-20,12
";

fn bin() -> Command {
    Command::cargo_bin("sales-insights").expect("binary exists")
}

#[test]
fn analyze_prints_tables_and_insights() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("quarter.csv", QUARTER_SALES_CSV);
    bin()
        .args(["analyze", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            contains("Detected column roles")
                .and(contains("Unit Price"))
                .and(contains("Top 3 Products by Revenue"))
                .and(contains("$180.00"))
                .and(contains("Monthly Revenue Trend"))
                .and(contains("Healthy average monthly growth of 5.0%")),
        );
}

#[test]
fn analyze_json_contains_structured_insights() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("quarter.csv", QUARTER_SALES_CSV);
    let output = bin()
        .args(["analyze", "-i", input.to_str().unwrap(), "--format", "json"])
        .output()
        .expect("run analyze");
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(json["roles"]["quantity"]["name"], "Quantity");
    let insights = json["insights"].as_array().expect("insights array");
    assert_eq!(insights[0]["category"], "revenue_concentration");
    assert_eq!(
        insights.last().unwrap()["category"],
        "positive_growth"
    );
}

#[test]
fn analyze_with_stats_lists_descriptive_and_correlation() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("quarter.csv", QUARTER_SALES_CSV);
    bin()
        .args(["analyze", "-i", input.to_str().unwrap(), "--show-stats"])
        .assert()
        .success()
        .stdout(
            contains("Descriptive statistics")
                .and(contains("skewness"))
                .and(contains("Correlation"))
                .and(contains("Price elasticity")),
        );
}

#[test]
fn missing_price_column_reports_role_and_fails() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("no_price.csv", "Item,Qty\nA,1\n");
    bin()
        .args(["analyze", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Missing required column role(s): price"));
}

#[test]
fn corrupt_workbook_reports_ingestion_guidance() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("broken.xlsx", "this is not a workbook");
    bin()
        .args(["analyze", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("password protected"));
}

#[test]
fn legacy_layout_passes_verify_and_analyze() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("legacy.csv", LEGACY_CSV);
    bin()
        .args(["verify", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Layout OK"));
    bin()
        .args([
            "analyze",
            "-i",
            input.to_str().unwrap(),
            "--legacy-layout",
        ])
        .assert()
        .success()
        .stdout(contains("Our #1 product (BR-100)").and(contains("premium products")));
}

#[test]
fn verify_with_yaml_layout_reports_mismatch() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("quarter.csv", QUARTER_SALES_CSV);
    let layout = workspace.write("layout.yml", "columns:\n  - SKU\n  - Quantity\n");
    bin()
        .args([
            "verify",
            "-i",
            input.to_str().unwrap(),
            "--layout",
            layout.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("missing: [SKU]"));
}

#[test]
fn classify_lists_every_role() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("legacy.csv", LEGACY_CSV);
    bin()
        .args(["classify", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            contains("quantity")
                .and(contains("Qty Shipped"))
                .and(contains("Part Number"))
                .and(contains("Date Ordered"))
                .and(contains("Order Number")),
        );
}

#[test]
fn export_writes_semicolon_delimited_rows_with_revenue() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("legacy.csv", LEGACY_CSV);
    let output = workspace.path().join("derived.csv");
    bin()
        .args([
            "export",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--output-delimiter",
            ";",
        ])
        .assert()
        .success();
    let contents = fs::read_to_string(&output).expect("read export");
    let lines = contents.lines().collect::<Vec<_>>();
    assert_eq!(
        lines[0],
        "Order Number;Part Number;Qty Shipped;Product Type;Pieces per Carton;Date Ordered;Price;Revenue"
    );
    assert_eq!(lines[1], "PO-1;BR-100;100;Bracket;10;2024-01-03;120.5;12050");
    assert_eq!(lines[3], "PO-3;HG-300;oops;Hinge;25;2024-02-20;12;");
}

#[test]
fn stats_command_prints_monthly_growth() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("quarter.csv", QUARTER_SALES_CSV);
    bin()
        .args(["stats", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Monthly growth").and(contains("Average monthly growth: 5.0%")));
}
