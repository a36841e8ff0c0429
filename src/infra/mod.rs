pub mod census;
pub mod csv_file;
