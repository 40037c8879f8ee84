use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::color::ColorMap;
use crate::data::{
    CellValue, Dataset, FilterStrategy, FilterSummary, SavePolicy, Sequence, SieveError,
    StagedSeries,
};
use crate::present::review_note;

// ---------------------------------------------------------------------------
// Filter form
// ---------------------------------------------------------------------------

/// Which tier of the staged series the plot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    Source,
    #[default]
    Working,
    Committed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Neighbor,
    RollingMean,
}

/// Editable filter parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterForm {
    pub kind: StrategyKind,
    pub threshold: f64,
    pub window: usize,
}

impl Default for FilterForm {
    fn default() -> Self {
        Self {
            kind: StrategyKind::RollingMean,
            threshold: 0.5,
            window: 60,
        }
    }
}

impl FilterForm {
    pub fn strategy(&self) -> FilterStrategy {
        match self.kind {
            StrategyKind::Neighbor => FilterStrategy::Neighbor {
                threshold: self.threshold,
            },
            StrategyKind::RollingMean => FilterStrategy::RollingMean {
                threshold: self.threshold,
                window: self.window,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded data (None until user loads a file).
    pub staged: Option<StagedSeries>,

    /// File the data came from.
    pub source_path: Option<PathBuf>,

    /// Column being cleaned.
    pub column: Option<String>,

    /// Column whose values split the plot into coloured sections.
    pub section_column: Option<String>,

    /// Rows of each section, cached for the plot.
    pub sections: BTreeMap<CellValue, Vec<usize>>,

    /// Active colour map for the sections.
    pub color_map: Option<ColorMap>,

    /// Which tier is plotted.
    pub view: View,

    pub form: FilterForm,

    /// Add the saved sheet to an existing workbook instead of replacing it.
    pub append_sheet: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a newly loaded dataset and pick the first numeric column.
    pub fn set_dataset(&mut self, path: PathBuf, dataset: Dataset) {
        self.column = dataset.numeric_column_names().into_iter().next();
        self.section_column = None;
        self.sections.clear();
        self.color_map = None;
        self.staged = Some(StagedSeries::new(dataset));
        self.source_path = Some(path);
        self.view = View::Working;
        self.status_message = None;
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.staged.as_ref().map(StagedSeries::source)
    }

    /// Switch the column being cleaned. A pending result stays attached to
    /// its own column.
    pub fn select_column(&mut self, column: String) {
        self.column = Some(column);
    }

    /// Set (or clear) the section column and rebuild the colour map.
    pub fn set_section_column(&mut self, column: Option<String>) {
        self.sections.clear();
        self.color_map = None;
        let grouped = match (&column, self.dataset()) {
            (Some(col), Some(ds)) => Some(ds.group_rows(col)),
            _ => None,
        };
        match (&column, grouped) {
            (Some(col), Some(Ok(groups))) => {
                self.color_map = Some(ColorMap::new(col, groups.keys()));
                self.sections = groups;
            }
            (_, Some(Err(e))) => self.status_message = Some(format!("Error: {e}")),
            _ => {}
        }
        self.section_column = column;
    }

    fn staged_mut(&mut self) -> Result<&mut StagedSeries, SieveError> {
        self.staged.as_mut().ok_or(SieveError::NotLoaded)
    }

    /// Run the filter described by the form on the selected column.
    pub fn apply_filter(&mut self) -> Result<FilterSummary, SieveError> {
        let column = self.column.clone().ok_or(SieveError::NoColumnSelected)?;
        let strategy = self.form.strategy();
        let summary = self.staged_mut()?.apply_filter(&column, strategy)?;
        self.view = View::Working;
        Ok(summary)
    }

    pub fn commit(&mut self) -> Result<FilterSummary, SieveError> {
        let summary = self.staged_mut()?.commit()?;
        self.view = View::Committed;
        Ok(summary)
    }

    pub fn discard(&mut self) -> Result<Option<FilterSummary>, SieveError> {
        let dropped = self.staged_mut()?.discard();
        self.view = View::Committed;
        Ok(dropped)
    }

    /// Show the outcome of a UI action in the status line.
    pub fn report<T>(&mut self, result: Result<T, SieveError>) {
        match result {
            Ok(_) => self.status_message = None,
            Err(e) => {
                log::error!("{e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Values of the selected column for the current view.
    ///
    /// The working view falls back to the committed values when no result
    /// is pending for this column.
    pub fn displayed_sequence(&self) -> Option<Sequence> {
        let staged = self.staged.as_ref()?;
        let column = self.column.as_deref()?;
        match self.view {
            View::Source => staged.source_sequence(column).ok(),
            View::Working => staged
                .working_sequence(column)
                .map(<[_]>::to_vec)
                .or_else(|| staged.committed_sequence(column).ok()),
            View::Committed => staged.committed_sequence(column).ok(),
        }
    }

    /// Points removed by the pending result, with their committed values.
    pub fn flagged_points(&self) -> Vec<[f64; 2]> {
        let Some(staged) = &self.staged else {
            return Vec::new();
        };
        let Some(column) = self.column.as_deref() else {
            return Vec::new();
        };
        if self.view != View::Working {
            return Vec::new();
        }
        let (Some(working), Ok(committed)) =
            (staged.working(), staged.committed_sequence(column))
        else {
            return Vec::new();
        };
        if working.column() != column {
            return Vec::new();
        }
        working
            .summary
            .flagged
            .iter()
            .filter_map(|&i| committed[i].map(|v| [i as f64, v]))
            .collect()
    }

    /// Annotation for the pending result, when the working view shows it.
    pub fn annotation(&self) -> Option<String> {
        let working = self.staged.as_ref()?.working()?;
        (self.view == View::Working && self.column.as_deref() == Some(working.column()))
            .then(|| review_note(&working.summary))
    }

    pub fn save_policy(&self) -> SavePolicy {
        if self.append_sheet {
            SavePolicy::AppendSheet
        } else {
            SavePolicy::Replace
        }
    }
}
