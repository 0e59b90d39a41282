//! Search lifecycle stages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a search currently is.
///
/// `Validating -> Retrieving -> Ranking -> Filtering -> Mixing -> Done`,
/// with `Errored` reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStage {
    Validating,
    Retrieving,
    Ranking,
    Filtering,
    Mixing,
    Done,
    Errored,
}

impl SearchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchStage::Validating => "validating",
            SearchStage::Retrieving => "retrieving",
            SearchStage::Ranking => "ranking",
            SearchStage::Filtering => "filtering",
            SearchStage::Mixing => "mixing",
            SearchStage::Done => "done",
            SearchStage::Errored => "errored",
        }
    }

    /// Terminal stages accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, SearchStage::Done | SearchStage::Errored)
    }

    /// The stage that follows this one on the happy path
    pub fn next(&self) -> Option<SearchStage> {
        match self {
            SearchStage::Validating => Some(SearchStage::Retrieving),
            SearchStage::Retrieving => Some(SearchStage::Ranking),
            SearchStage::Ranking => Some(SearchStage::Filtering),
            SearchStage::Filtering => Some(SearchStage::Mixing),
            SearchStage::Mixing => Some(SearchStage::Done),
            SearchStage::Done | SearchStage::Errored => None,
        }
    }

    /// Whether a search may move from this stage to `to`
    pub fn can_advance_to(&self, to: SearchStage) -> bool {
        if to == SearchStage::Errored {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }
}

impl fmt::Display for SearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
