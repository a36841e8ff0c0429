pub mod demographic_source;
