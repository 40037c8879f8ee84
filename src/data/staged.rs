use super::error::{Result, SieveError};
use super::filter::{FilterStrategy, FilterSummary};
use super::model::{Dataset, Sample, Sequence};

// ---------------------------------------------------------------------------
// Pending result of the last filter run
// ---------------------------------------------------------------------------

/// A filter result held for review.
#[derive(Debug, Clone, PartialEq)]
pub struct Working {
    pub values: Sequence,
    pub summary: FilterSummary,
}

impl Working {
    pub fn column(&self) -> &str {
        &self.summary.column
    }

    pub fn strategy(&self) -> FilterStrategy {
        self.summary.strategy
    }
}

// ---------------------------------------------------------------------------
// StagedSeries
// ---------------------------------------------------------------------------

/// Source, working and committed views of a loaded dataset.
///
/// * `source` is what was loaded and never changes.
/// * `working` is the output of the last [`apply_filter`](Self::apply_filter)
///   that has been neither committed nor discarded.
/// * `committed` starts as a deep copy of `source` and is the only state
///   meant to be written back to disk.
#[derive(Debug, Clone)]
pub struct StagedSeries {
    source: Dataset,
    committed: Dataset,
    working: Option<Working>,
}

impl StagedSeries {
    pub fn new(source: Dataset) -> Self {
        let committed = source.clone();
        StagedSeries {
            source,
            committed,
            working: None,
        }
    }

    /// Run `strategy` on the committed values of `column` and hold the result
    /// for review.
    ///
    /// Filters compose: each run starts from the committed state, so a
    /// result must be committed before the next filter builds on it. A
    /// result that is still pending is replaced.
    pub fn apply_filter(
        &mut self,
        column: &str,
        strategy: FilterStrategy,
    ) -> Result<FilterSummary> {
        let before = self.committed.sequence(column)?;
        let after = strategy.apply(&before)?;
        let summary = FilterSummary::new(column, strategy, &before, &after);

        log::info!(
            "Filtered column '{column}' ({strategy:?}): {} / {} samples left, {} removed",
            summary.kept_after,
            summary.total,
            summary.removed()
        );
        if let Some(prev) = self.working.take() {
            log::warn!(
                "Replacing uncommitted result for column '{}' ({:?})",
                prev.column(),
                prev.strategy()
            );
        }

        self.working = Some(Working {
            values: after,
            summary: summary.clone(),
        });
        Ok(summary)
    }

    /// Write the pending result into the committed dataset.
    ///
    /// The committed column is replaced wholesale, missing markers included.
    pub fn commit(&mut self) -> Result<FilterSummary> {
        let working = self.working.take().ok_or(SieveError::NothingToCommit)?;
        if let Err(e) = self
            .committed
            .replace_sequence(working.column(), &working.values)
        {
            self.working = Some(working);
            return Err(e);
        }
        log::info!("Changes to column '{}' have been saved", working.column());
        Ok(working.summary)
    }

    /// Drop the pending result. Returns what was dropped, if anything.
    pub fn discard(&mut self) -> Option<FilterSummary> {
        let dropped = self.working.take().map(|w| w.summary);
        match &dropped {
            Some(summary) => log::info!("Discarded pending result for column '{}'", summary.column),
            None => log::debug!("Nothing to discard"),
        }
        dropped
    }

    /// Committed dataset, ready to hand to the writer.
    pub fn export(&self) -> &Dataset {
        &self.committed
    }

    pub fn source(&self) -> &Dataset {
        &self.source
    }

    pub fn committed(&self) -> &Dataset {
        &self.committed
    }

    pub fn working(&self) -> Option<&Working> {
        self.working.as_ref()
    }

    /// Whether a result is waiting for commit or discard.
    pub fn is_dirty(&self) -> bool {
        self.working.is_some()
    }

    pub fn source_sequence(&self, column: &str) -> Result<Sequence> {
        self.source.sequence(column)
    }

    pub fn committed_sequence(&self, column: &str) -> Result<Sequence> {
        self.committed.sequence(column)
    }

    /// Pending values for `column`, if the pending result targets it.
    pub fn working_sequence(&self, column: &str) -> Option<&[Sample]> {
        self.working
            .as_ref()
            .filter(|w| w.column() == column)
            .map(|w| w.values.as_slice())
    }
}
