use anyhow::Result;

use crate::data::{FilterSummary, Sample};

/// Something that can show a sequence to the operator.
///
/// Implementations may block (a plot window stays open until it is closed).
pub trait Presenter {
    fn render(&mut self, sequence: &[Sample], label: &str, annotations: Option<&str>) -> Result<()>;
}

/// Summary text shown next to a filtered sequence.
pub fn review_note(summary: &FilterSummary) -> String {
    format!(
        "Number of data left after outliers removal is: {} / {}\n{}",
        summary.kept_after, summary.total, summary.strategy
    )
}

/// Headless presenter: logs what would have been plotted.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn render(&mut self, sequence: &[Sample], label: &str, annotations: Option<&str>) -> Result<()> {
        let present = sequence.iter().flatten().count();
        log::info!("{label}: {present} / {} samples", sequence.len());
        if let Some(note) = annotations {
            for line in note.lines() {
                log::info!("  {line}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FilterStrategy;

    #[test]
    fn test_review_note() {
        let summary = FilterSummary::new(
            "chlorophyll",
            FilterStrategy::RollingMean {
                threshold: 0.5,
                window: 60,
            },
            &[Some(1.0), Some(2.0), Some(3.0)],
            &[Some(1.0), None, Some(3.0)],
        );
        assert_eq!(
            review_note(&summary),
            "Number of data left after outliers removal is: 2 / 3\n\
             Number of data for moving average: 60\n\
             Max difference between value and moving average: 0.5"
        );
    }

    #[test]
    fn test_log_presenter_never_fails() {
        let mut presenter = LogPresenter;
        assert!(presenter
            .render(&[Some(1.0), None], "chlorophyll", Some("a\nb"))
            .is_ok());
    }
}
