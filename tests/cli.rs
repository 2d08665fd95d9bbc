use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

const HPI: &str = "Date,UK_HPI,London_HPI,North East\n\
Jan-20,100,120,80\n\
Feb-20,101,123,81\n\
Mar-20,102,125,82\n";

const RENTS: &str = "Date,London,UK,Wales\n\
2023-01,100,100,100\n\
2023-02,104,102,101\n\
2023-03,108,104,103\n";

const YOY: &str = "Date,PIPR,UK_HPI\n\
2020-01,1.5,2.0\n\
2020-02,1.8,2.4\n\
2020-03,2.1,-0.5\n\
2020-04,2.6,1.0\n";

const INFLATION: &str = "Date,Rate\n\
2020-01,0.8\n\
2020-02,1.1\n\
2020-04,3.2\n";

const SALARY: &str = "la_name,metric,2022,2024\n\
Westminster,salary,\"£48,000\",\"£52,500\"\n\
Camden,salary,\"£45,000\",\"£47,250\"\n\
Camden,jobs,10,12\n";

const METRICS: &str = "year,la_code,la_name,affordability,house_price,workplace\n\
2023,A,Camden,18.0,\"£500,000\",\"£41,000\"\n\
2024,A,Camden,17.0,\"£495,000\",\"£42,000\"\n\
2024,B,Hackney,12.5,\"£450,000\",\"£38,000\"\n";

const BOUNDARIES: &str = r#"{"type":"FeatureCollection","features":[
{"type":"Feature","properties":{"code":"A","name":"Camden"},
 "geometry":{"type":"Polygon","coordinates":[[[-0.20,51.50],[-0.18,51.50],[-0.18,51.52],[-0.20,51.52],[-0.20,51.50]]]}},
{"type":"Feature","properties":{"code":"B","name":"Hackney"},
 "geometry":{"type":"Polygon","coordinates":[[[-0.10,51.50],[-0.08,51.50],[-0.08,51.52],[-0.10,51.52],[-0.10,51.50]]]}}
]}"#;

/// Writes every default-named source into `dir`.
fn write_sources(dir: &Path) {
    for (name, text) in [
        ("hpi_uk_london.csv", HPI),
        ("pipr_uk.csv", RENTS),
        ("pipr_hpi_uk.csv", YOY),
        ("uk_inflation_rate.csv", INFLATION),
        ("ldn_salary_growth.csv", SALARY),
        ("ldn_ar_we_hp.csv", METRICS),
        ("london_boroughs.geojson", BOUNDARIES),
    ] {
        fs::write(dir.join(name), text).unwrap();
    }
}

fn write_config(dir: &Path, data: &Path) -> std::path::PathBuf {
    let path = dir.join("charts.toml");
    fs::write(&path, format!("base_url = '{}'\nwidth = 700\n", data.display())).unwrap();
    path
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("housing-charts").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("housing-charts"))
        .stdout(predicate::str::contains("--pointer"));
}

#[test]
fn renders_every_view() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("data");
    fs::create_dir(&data).unwrap();
    write_sources(&data);
    let config = write_config(tmp.path(), &data);
    let out = tmp.path().join("out");

    let mut cmd = Command::cargo_bin("housing-charts").unwrap();
    cmd.arg("--config").arg(&config).arg("--out-dir").arg(&out);
    cmd.assert().success();

    for slug in ["hpi", "rents", "inflation", "salary", "map"] {
        let svg = fs::read_to_string(out.join(format!("{slug}.svg"))).unwrap();
        assert!(svg.contains("<svg"), "{slug}.svg is not an SVG document");
        assert!(!svg.contains("Error:"), "{slug}.svg rendered its error placeholder");
    }
    let map = fs::read_to_string(out.join("map.svg")).unwrap();
    assert!(map.contains("Affordability ratio"));
    let salary = fs::read_to_string(out.join("salary.svg")).unwrap();
    assert!(salary.contains("Westminster"));
}

#[test]
fn failed_view_renders_error_placeholder() {
    let tmp = tempfile::tempdir().unwrap();
    let data = tmp.path().join("empty");
    fs::create_dir(&data).unwrap();
    let config = write_config(tmp.path(), &data);

    let mut cmd = Command::cargo_bin("housing-charts").unwrap();
    cmd.arg("--config")
        .arg(&config)
        .arg("--out-dir")
        .arg(tmp.path())
        .args(["--view", "salary"]);
    cmd.assert().success();

    let svg = fs::read_to_string(tmp.path().join("salary.svg")).unwrap();
    assert!(svg.contains("Error:"));
    assert!(!tmp.path().join("hpi.svg").exists());
}

#[test]
fn pointer_draws_tooltip() {
    let tmp = tempfile::tempdir().unwrap();
    write_sources(tmp.path());
    let config = write_config(tmp.path(), tmp.path());
    let out = tmp.path().join("out");

    // 700px wide lines chart: the plot spans x 80..628 and x=354 is nearest the February row.
    let mut cmd = Command::cargo_bin("housing-charts").unwrap();
    cmd.arg("--config")
        .arg(&config)
        .arg("--out-dir")
        .arg(&out)
        .args(["--view", "hpi", "--pointer", "354,200"]);
    cmd.assert().success();

    let svg = fs::read_to_string(out.join("hpi.svg")).unwrap();
    let february = ["UK: 101.0", "London: 123.0", "North East: 81.0"];
    assert!(february.iter().any(|line| svg.contains(line)));
}

#[test]
fn rejects_malformed_pointer() {
    let mut cmd = Command::cargo_bin("housing-charts").unwrap();
    cmd.args(["--pointer", "12"]);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("expected X,Y"));
}

#[test]
fn rejects_invalid_config() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("bad.toml");
    fs::write(&path, "[salary]\nfrom_year = 2024\nto_year = 2022\n").unwrap();
    let mut cmd = Command::cargo_bin("housing-charts").unwrap();
    cmd.arg("--config").arg(&path).arg("--out-dir").arg(tmp.path());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("from_year"));
}
