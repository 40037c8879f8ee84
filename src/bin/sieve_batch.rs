use std::path::PathBuf;

use anyhow::{Context, Result};
use rusty_sieve::plan::CleaningPlan;
use rusty_sieve::present::{LogPresenter, Presenter};
use rusty_sieve::ui::viewer::PlotPresenter;

fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: sieve-batch <plan.json>")?;
    let plan = CleaningPlan::from_path(&path)?;

    let mut presenter: Box<dyn Presenter> = if plan.review {
        Box::new(PlotPresenter::default())
    } else {
        Box::new(LogPresenter)
    };
    let report = plan.run(presenter.as_mut())?;

    for (i, step) in report.steps.iter().enumerate() {
        println!(
            "step {}: {:?} removed {} samples",
            i + 1,
            step.strategy,
            step.removed()
        );
    }
    println!(
        "{}: {} / {} samples kept, written to {}",
        plan.column,
        report.kept,
        report.rows,
        plan.output.display()
    );
    Ok(())
}
