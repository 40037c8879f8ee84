use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    load_dataset, save_dataset, FilterStrategy, FilterSummary, SavePolicy, SheetSelector,
    StagedSeries, DEFAULT_SHEET,
};
use crate::present::{review_note, Presenter};

fn default_sheet() -> String {
    DEFAULT_SHEET.to_string()
}

/// A cleaning run described in JSON:
///
/// ```json
/// {
///   "input": "DATA2019.xlsx",
///   "sheet": "GENERAL",
///   "column": "chlorophyll",
///   "steps": [
///     { "kind": "rolling_mean", "threshold": 0.5, "window": 10 },
///     { "kind": "neighbor", "threshold": 0.3 }
///   ],
///   "output": "clean.xlsx"
/// }
/// ```
///
/// Each step is committed before the next one runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningPlan {
    pub input: PathBuf,
    #[serde(default)]
    pub sheet: Option<String>,
    pub column: String,
    pub steps: Vec<FilterStrategy>,
    pub output: PathBuf,
    #[serde(default = "default_sheet")]
    pub output_sheet: String,
    #[serde(default)]
    pub policy: SavePolicy,
    /// Show the source and every filtered result before committing it.
    #[serde(default)]
    pub review: bool,
}

/// What a plan did.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanReport {
    pub steps: Vec<FilterSummary>,
    pub rows: usize,
    /// Non-missing samples left in the column after the last step.
    pub kept: usize,
}

impl CleaningPlan {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading plan {}", path.display()))?;
        let plan: CleaningPlan = serde_json::from_str(&text)
            .with_context(|| format!("parsing plan {}", path.display()))?;
        for step in &plan.steps {
            step.validate()?;
        }
        Ok(plan)
    }

    /// Load, filter step by step, and save the committed result.
    pub fn run(&self, presenter: &mut dyn Presenter) -> Result<PlanReport> {
        let dataset = load_dataset(&self.input, &SheetSelector::from(self.sheet.clone()))?;
        let mut staged = StagedSeries::new(dataset);

        if self.review {
            let source = staged.source_sequence(&self.column)?;
            presenter.render(&source, &format!("{} (source)", self.column), None)?;
        }

        let mut steps = Vec::with_capacity(self.steps.len());
        for strategy in &self.steps {
            let summary = staged.apply_filter(&self.column, *strategy)?;
            if self.review {
                if let Some(values) = staged.working_sequence(&self.column) {
                    presenter.render(values, &self.column, Some(&review_note(&summary)))?;
                }
            }
            steps.push(staged.commit()?);
        }

        save_dataset(staged.export(), &self.output, &self.output_sheet, self.policy)?;

        let committed = staged.committed_sequence(&self.column)?;
        Ok(PlanReport {
            steps,
            rows: committed.len(),
            kept: committed.iter().flatten().count(),
        })
    }
}
