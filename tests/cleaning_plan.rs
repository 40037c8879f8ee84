//! Running a cleaning plan end to end against files on disk.

use anyhow::Result;
use rusty_sieve::data::{load_dataset, Sample, SheetSelector};
use rusty_sieve::plan::CleaningPlan;
use rusty_sieve::present::Presenter;

/// Records every render call instead of drawing.
#[derive(Default)]
struct RecordingPresenter {
    calls: Vec<(String, usize, Option<String>)>,
}

impl Presenter for RecordingPresenter {
    fn render(&mut self, sequence: &[Sample], label: &str, annotations: Option<&str>) -> Result<()> {
        self.calls.push((
            label.to_string(),
            sequence.len(),
            annotations.map(str::to_string),
        ));
        Ok(())
    }
}

fn write_input(dir: &std::path::Path) -> std::path::PathBuf {
    let path = dir.join("sonde.csv");
    let mut text = String::from("minutes,chlorophyll\n");
    for (i, v) in [1.0, 1.0, 1.0, 1.0, 50.0, 1.0, 1.0, 1.0, 1.0].iter().enumerate() {
        text.push_str(&format!("{},{v:?}\n", i * 5));
    }
    std::fs::write(&path, text).unwrap();
    path
}

fn plan_json(input: &std::path::Path, output: &std::path::Path, review: bool) -> String {
    format!(
        r#"{{
            "input": {input:?},
            "column": "chlorophyll",
            "steps": [
                {{ "kind": "rolling_mean", "threshold": 10.0, "window": 5 }},
                {{ "kind": "neighbor", "threshold": 0.5 }}
            ],
            "output": {output:?},
            "review": {review}
        }}"#
    )
}

#[test]
fn test_plan_commits_each_step_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let output = dir.path().join("clean.csv");
    let plan_path = dir.path().join("plan.json");
    std::fs::write(&plan_path, plan_json(&input, &output, false)).unwrap();

    let plan = CleaningPlan::from_path(&plan_path).unwrap();
    let mut presenter = RecordingPresenter::default();
    let report = plan.run(&mut presenter).unwrap();

    assert!(presenter.calls.is_empty());
    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.steps[0].flagged, vec![4]);
    assert_eq!(report.steps[1].kept_before, 8);
    assert_eq!(report.rows, 9);
    assert_eq!(report.kept, 8);

    let saved = load_dataset(&output, &SheetSelector::Default).unwrap();
    let values = saved.sequence("chlorophyll").unwrap();
    assert_eq!(values[4], None);
    assert_eq!(values.iter().flatten().count(), 8);

    // The input file is never touched.
    let source = load_dataset(&input, &SheetSelector::Default).unwrap();
    assert_eq!(source.sequence("chlorophyll").unwrap()[4], Some(50.0));
}

#[test]
fn test_plan_review_renders_source_and_each_step() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let output = dir.path().join("clean.json");
    let plan_path = dir.path().join("plan.json");
    std::fs::write(&plan_path, plan_json(&input, &output, true)).unwrap();

    let plan = CleaningPlan::from_path(&plan_path).unwrap();
    let mut presenter = RecordingPresenter::default();
    plan.run(&mut presenter).unwrap();

    assert_eq!(presenter.calls.len(), 3);
    assert_eq!(presenter.calls[0].0, "chlorophyll (source)");
    assert!(presenter.calls[0].2.is_none());
    let note = presenter.calls[1].2.as_deref().unwrap();
    assert!(note.contains("8 / 9"));
    assert!(note.contains("Number of data for moving average: 5"));
}

#[test]
fn test_plan_unknown_column_fails_before_saving() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let output = dir.path().join("clean.csv");
    let plan_path = dir.path().join("plan.json");
    std::fs::write(
        &plan_path,
        plan_json(&input, &output, false).replace("\"chlorophyll\"", "\"salinity\""),
    )
    .unwrap();

    let plan = CleaningPlan::from_path(&plan_path).unwrap();
    let err = plan.run(&mut RecordingPresenter::default()).unwrap_err();
    assert!(format!("{err:#}").contains("salinity"));
    assert!(!output.exists());
}
