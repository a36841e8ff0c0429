//! CLI entry point for the food-desert tract analysis.
//!
//! Provides subcommands for running the full pipeline, saving census tract
//! counts for offline runs, and classifying tracts without a join.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use food_desert_tracts::{
    config::{CensusVariables, FoodAccessColumns},
    demographics::DemographicTable,
    enrich::{ClassifiedRow, enrich, validate_tracts},
    fetch::{BasicClient, auth::UrlParam, fetch_bytes, is_remote},
    food_access::{FoodAccessRecord, load_food_access, parse_food_access},
    infra::{
        census::{CensusClient, DEFAULT_BASE_URL},
        csv_file::CsvFileSource,
    },
    output::{RunSources, print_summary, write_outputs, write_records},
    pipeline::run_pipeline,
    services::demographic_source::{DemographicSource, SurveyQuery},
    table::Table,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "food_desert_tracts")]
#[command(
    about = "Compare racial/ethnic tract majorities against low food access",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both datasets, classify, join, aggregate and write the results
    Run {
        #[command(flatten)]
        survey: SurveyArgs,

        /// Food-access table: path or URL of a delimited file with a header row
        #[arg(long, value_name = "FILE_OR_URL")]
        food_access: String,

        #[command(flatten)]
        columns: ColumnArgs,

        /// Directory for summary tables, charts and the run manifest
        #[arg(short, long, default_value = "out")]
        output_dir: PathBuf,
    },
    /// Download tract counts from the census API and save them as CSV
    Fetch {
        /// Two-digit state FIPS code
        #[arg(long)]
        state: String,

        /// Three-digit county FIPS code
        #[arg(long)]
        county: String,

        #[arg(long, default_value_t = 2019)]
        year: u16,

        #[arg(long, default_value = "acs5")]
        survey: String,

        /// JSON file overriding the census variable codes
        #[arg(long, value_name = "JSON")]
        variables: Option<PathBuf>,

        #[arg(short, long, default_value = "demographics.csv")]
        output: PathBuf,
    },
    /// Classify the tracts of a saved demographic table
    Classify {
        /// Demographic CSV, e.g. written by `fetch`
        #[arg(long, value_name = "FILE")]
        demographics: PathBuf,

        /// JSON file overriding the census variable codes
        #[arg(long, value_name = "JSON")]
        variables: Option<PathBuf>,

        #[arg(short, long, default_value = "tracts.csv")]
        output: PathBuf,
    },
}

#[derive(Args)]
struct SurveyArgs {
    /// Saved demographic CSV to use instead of querying the census API
    #[arg(long, value_name = "FILE", conflicts_with_all = ["state", "county"])]
    demographics: Option<PathBuf>,

    /// Two-digit state FIPS code
    #[arg(long, required_unless_present = "demographics")]
    state: Option<String>,

    /// Three-digit county FIPS code
    #[arg(long, required_unless_present = "demographics")]
    county: Option<String>,

    /// Survey year
    #[arg(long, default_value_t = 2019)]
    year: u16,

    /// Survey variant
    #[arg(long, default_value = "acs5")]
    survey: String,

    /// JSON file overriding the census variable codes
    #[arg(long, value_name = "JSON")]
    variables: Option<PathBuf>,
}

#[derive(Args)]
struct ColumnArgs {
    /// Tract identifier column in the food-access table
    #[arg(long, default_value = "CensusTract")]
    tract_column: String,

    /// Binary low-access indicator column
    #[arg(long, default_value = "LA1and10")]
    flag_column: String,

    /// Poverty rate column
    #[arg(long, default_value = "PovertyRate")]
    poverty_column: String,

    /// Field delimiter of the food-access table
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

impl ColumnArgs {
    fn columns(&self) -> FoodAccessColumns {
        FoodAccessColumns {
            tract: self.tract_column.clone(),
            low_access: self.flag_column.clone(),
            poverty_rate: self.poverty_column.clone(),
        }
    }

    fn delimiter(&self) -> Result<u8> {
        match u8::try_from(self.delimiter) {
            Ok(b) if b.is_ascii() => Ok(b),
            _ => bail!("delimiter must be a single ASCII character"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/food_desert_tracts.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("food_desert_tracts.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            survey,
            food_access,
            columns,
            output_dir,
        } => {
            let variables = load_variables(survey.variables.as_deref())?;
            let (source, query, demographics_desc) = demographic_source(&survey, variables)?;

            let table = source
                .fetch_tracts(&query)
                .await
                .context("loading demographic data")?;
            let demographics = DemographicTable::from_table(&table, &query.variables)
                .context("reading demographic table")?;

            let records = food_access_records(&food_access, &columns)
                .await
                .context("loading food-access data")?;

            let output = run_pipeline(&demographics, &records).context("running pipeline")?;
            print_summary(&output.summary);

            let sources = RunSources {
                demographics: demographics_desc,
                food_access,
            };
            write_outputs(&output, &output_dir, &sources).context("writing outputs")?;
        }
        Commands::Fetch {
            state,
            county,
            year,
            survey,
            variables,
            output,
        } => {
            let query = SurveyQuery {
                state,
                county,
                year,
                survey,
                variables: load_variables(variables.as_deref())?,
            };
            let table = census_client()?
                .fetch_tracts(&query)
                .await
                .context("fetching census tracts")?;
            table
                .write_csv(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(path = %output.display(), tracts = table.rows.len(), "Demographic table saved");
        }
        Commands::Classify {
            demographics,
            variables,
            output,
        } => {
            let variables = load_variables(variables.as_deref())?;
            let table = Table::read_csv(&demographics, b',')
                .with_context(|| format!("reading {}", demographics.display()))?;
            let demographics = DemographicTable::from_table(&table, &variables)?;
            let enriched = enrich(validate_tracts(&demographics)?)?;

            write_records(&output, enriched.iter().map(ClassifiedRow::from))
                .with_context(|| format!("writing {}", output.display()))?;
            info!(path = %output.display(), tracts = enriched.len(), "Classified tracts saved");
        }
    }

    Ok(())
}

fn load_variables(path: Option<&Path>) -> Result<CensusVariables> {
    match path {
        Some(path) => CensusVariables::load(path)
            .with_context(|| format!("loading variable codes from {}", path.display())),
        None => Ok(CensusVariables::default()),
    }
}

/// Picks the saved CSV when one is given, else the census API.
fn demographic_source(
    args: &SurveyArgs,
    variables: CensusVariables,
) -> Result<(Box<dyn DemographicSource>, SurveyQuery, String)> {
    let query = SurveyQuery {
        state: args.state.clone().unwrap_or_default(),
        county: args.county.clone().unwrap_or_default(),
        year: args.year,
        survey: args.survey.clone(),
        variables,
    };

    match &args.demographics {
        Some(path) => {
            let source: Box<dyn DemographicSource> = Box::new(CsvFileSource::new(path));
            Ok((source, query, path.display().to_string()))
        }
        None => {
            let desc = format!("census api: {}", query.describe());
            Ok((census_client()?, query, desc))
        }
    }
}

/// Builds a census client, adding the API key from `CENSUS_API_KEY` if set.
fn census_client() -> Result<Box<dyn DemographicSource>> {
    let base_url =
        std::env::var("CENSUS_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let http = BasicClient::with_timeouts(Duration::from_secs(30), Duration::from_secs(10))?;

    let client: Box<dyn DemographicSource> = match std::env::var("CENSUS_API_KEY") {
        Ok(key) if !key.is_empty() => {
            Box::new(CensusClient::new(base_url, UrlParam::census_key(http, key)))
        }
        _ => {
            warn!("CENSUS_API_KEY not set, sending unauthenticated requests");
            Box::new(CensusClient::new(base_url, http))
        }
    };
    Ok(client)
}

/// Loads food-access records from a local file or fetches them over HTTP.
#[tracing::instrument(skip(columns))]
async fn food_access_records(source: &str, columns: &ColumnArgs) -> Result<Vec<FoodAccessRecord>> {
    let delimiter = columns.delimiter()?;
    let records = if is_remote(source) {
        let client = BasicClient::new();
        let bytes = fetch_bytes(&client, source).await?;
        parse_food_access(source, &bytes, &columns.columns(), delimiter)?
    } else {
        load_food_access(Path::new(source), &columns.columns(), delimiter)?
    };
    Ok(records)
}
