use async_trait::async_trait;
use reqwest::{Method, Request, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::demographics::{GEOID_COLUMN, NAME_COLUMN};
use crate::error::{PipelineError, Result};
use crate::fetch::HttpClient;
use crate::services::demographic_source::{DemographicSource, SurveyQuery};
use crate::table::Table;

pub const DEFAULT_BASE_URL: &str = "https://api.census.gov";

const SOURCE_NAME: &str = "census api";

/// Client for the census data API's ACS tract endpoints.
pub struct CensusClient<C> {
    base_url: String,
    http: C,
}

impl<C: HttpClient> CensusClient<C> {
    pub fn new(base_url: impl Into<String>, http: C) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Builds the tract-level request URL for `query`.
    pub fn request_url(&self, query: &SurveyQuery) -> Result<Url> {
        let endpoint = format!(
            "{}/data/{}/acs/{}",
            self.base_url, query.year, query.survey
        );
        let get = std::iter::once(NAME_COLUMN)
            .chain(query.variables.codes())
            .collect::<Vec<_>>()
            .join(",");

        Url::parse_with_params(
            &endpoint,
            &[
                ("get", get),
                ("for", "tract:*".to_string()),
                ("in", format!("state:{}", query.state)),
                ("in", format!("county:{}", query.county)),
            ],
        )
        .map_err(|e| PipelineError::DataUnavailable {
            source_name: SOURCE_NAME.to_string(),
            message: format!("cannot build request URL from '{endpoint}': {e}"),
        })
    }
}

#[async_trait]
impl<C: HttpClient> DemographicSource for CensusClient<C> {
    #[instrument(skip_all, fields(query = %query.describe()))]
    async fn fetch_tracts(&self, query: &SurveyQuery) -> Result<Table> {
        let url = self.request_url(query)?;
        debug!(endpoint = %url.path(), "Requesting tract counts");

        let response = self.http.execute(Request::new(Method::GET, url)).await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() || status == StatusCode::NO_CONTENT || body.trim().is_empty() {
            return Err(PipelineError::DataUnavailable {
                source_name: SOURCE_NAME.to_string(),
                message: format!(
                    "no published data for {} (status {}): {}",
                    query.describe(),
                    status,
                    body.trim()
                ),
            });
        }

        let table = parse_census_response(&body)?;
        info!(tracts = table.rows.len(), "Census tracts fetched");
        Ok(table)
    }
}

/// Converts the API's array-of-arrays JSON into a [`Table`].
///
/// The first row is the header. A `GEOID` column is prepended, built from the
/// `state`, `county` and `tract` columns.
///
/// # Errors
///
/// `DataUnavailable` when the response has no data rows, `SchemaMismatch`
/// when a geography column is missing.
pub fn parse_census_response(body: &str) -> Result<Table> {
    let raw: Vec<Vec<Value>> = serde_json::from_str(body)?;
    let mut rows = raw.into_iter().map(|r| r.into_iter().map(cell_text).collect::<Vec<_>>());

    let header = rows.next().ok_or_else(|| PipelineError::DataUnavailable {
        source_name: SOURCE_NAME.to_string(),
        message: "empty response".to_string(),
    })?;

    let position = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| PipelineError::missing_column(SOURCE_NAME, name))
    };
    let state = position("state")?;
    let county = position("county")?;
    let tract = position("tract")?;

    let mut headers = Vec::with_capacity(header.len() + 1);
    headers.push(GEOID_COLUMN.to_string());
    headers.extend(header.iter().cloned());

    let data = rows
        .enumerate()
        .map(|(i, cells)| {
            if cells.len() != header.len() {
                return Err(PipelineError::integrity(
                    "census response",
                    Some(i + 1),
                    None,
                    format!("expected {} cells, found {}", header.len(), cells.len()),
                ));
            }
            let geoid = format!("{}{}{}", cells[state], cells[county], cells[tract]);
            Ok(std::iter::once(geoid).chain(cells).collect())
        })
        .collect::<Result<Vec<Vec<String>>>>()?;

    if data.is_empty() {
        return Err(PipelineError::DataUnavailable {
            source_name: SOURCE_NAME.to_string(),
            message: "response contains no tracts".to_string(),
        });
    }

    Ok(Table::new(SOURCE_NAME, headers, data))
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
