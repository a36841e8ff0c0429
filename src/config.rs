//! Census variable codes and food-access column names.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::tract::Group;

/// Maps each raw race/ethnicity sub-count to its census variable code.
///
/// Defaults to ACS table B03002 (Hispanic or Latino origin by race). Any
/// subset of fields may be overridden from a JSON file:
/// ```json
/// {
///   "total": "B03002_001E",
///   "hispanic": "B03002_012E"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CensusVariables {
    pub total: String,
    pub white: String,
    pub black: String,
    pub aian: String,
    pub asian: String,
    pub nhpi: String,
    pub other_race: String,
    pub two_or_more: String,
    pub hispanic: String,
}

impl Default for CensusVariables {
    fn default() -> Self {
        Self {
            total: "B03002_001E".to_string(),
            white: "B03002_003E".to_string(),
            black: "B03002_004E".to_string(),
            aian: "B03002_005E".to_string(),
            asian: "B03002_006E".to_string(),
            nhpi: "B03002_007E".to_string(),
            other_race: "B03002_008E".to_string(),
            two_or_more: "B03002_009E".to_string(),
            hispanic: "B03002_012E".to_string(),
        }
    }
}

impl CensusVariables {
    /// Loads overrides from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Raw variable codes summed into `group`. AAPI and Multiracial each
    /// combine two source sub-categories.
    pub fn components(&self, group: Group) -> Vec<&str> {
        match group {
            Group::White => vec![self.white.as_str()],
            Group::Black => vec![self.black.as_str()],
            Group::Aapi => vec![self.asian.as_str(), self.nhpi.as_str()],
            Group::Aian => vec![self.aian.as_str()],
            Group::Multiracial => vec![self.other_race.as_str(), self.two_or_more.as_str()],
            Group::HispanicLatino => vec![self.hispanic.as_str()],
        }
    }

    /// Every code to request, total first.
    pub fn codes(&self) -> Vec<&str> {
        std::iter::once(self.total.as_str())
            .chain(Group::ALL.iter().flat_map(|g| self.components(*g)))
            .collect()
    }
}

/// Column names read from the food-access table.
///
/// Defaults follow the USDA Food Access Research Atlas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoodAccessColumns {
    pub tract: String,
    pub low_access: String,
    pub poverty_rate: String,
}

impl Default for FoodAccessColumns {
    fn default() -> Self {
        Self {
            tract: "CensusTract".to_string(),
            low_access: "LA1and10".to_string(),
            poverty_rate: "PovertyRate".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_codes_are_unique() {
        let vars = CensusVariables::default();
        let mut codes = vars.codes();
        assert_eq!(codes.len(), 9);
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 9);
    }

    #[test]
    fn test_combined_groups_have_two_components() {
        let vars = CensusVariables::default();
        assert_eq!(vars.components(Group::Aapi), vec!["B03002_006E", "B03002_007E"]);
        assert_eq!(
            vars.components(Group::Multiracial),
            vec!["B03002_008E", "B03002_009E"]
        );
        assert_eq!(vars.components(Group::White).len(), 1);
    }

    #[test]
    fn test_load_partial_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "total": "B01003_001E" }}"#).unwrap();

        let vars = CensusVariables::load(file.path()).unwrap();
        assert_eq!(vars.total, "B01003_001E");
        assert_eq!(vars.white, CensusVariables::default().white);
    }

    #[test]
    fn test_load_missing_file() {
        let err = CensusVariables::load(Path::new("/nonexistent/vars.json")).unwrap_err();
        assert!(matches!(err, PipelineError::FileNotFound { .. }));
    }

    #[test]
    fn test_load_rejects_unknown_field() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "asain": "B03002_006E" }}"#).unwrap();

        assert!(matches!(
            CensusVariables::load(file.path()),
            Err(PipelineError::Json(_))
        ));
    }
}
