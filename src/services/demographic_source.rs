//! Trait and query types for retrieving per-tract demographic counts.

use crate::config::CensusVariables;
use crate::error::Result;
use crate::table::Table;

/// Region and survey selection for a demographic request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurveyQuery {
    /// Two-digit state FIPS code, e.g. `"06"`.
    pub state: String,
    /// Three-digit county FIPS code, e.g. `"037"`.
    pub county: String,
    pub year: u16,
    /// Survey variant such as `acs5` or `acs1`.
    pub survey: String,
    pub variables: CensusVariables,
}

impl SurveyQuery {
    /// Short label for logs and error messages.
    pub fn describe(&self) -> String {
        format!(
            "{} {} state {} county {}",
            self.year, self.survey, self.state, self.county
        )
    }
}

/// Abstraction over a provider of per-tract demographic tables.
///
/// Implementations return a [`Table`] with a `GEOID` column and one column
/// per requested variable code.
#[async_trait::async_trait]
pub trait DemographicSource: Send + Sync {
    async fn fetch_tracts(&self, query: &SurveyQuery) -> Result<Table>;
}
