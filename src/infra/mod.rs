// Adapters for the ports in `app::ports`: the Google geocoder, reference data and output sinks

pub mod google_geocoder;
pub mod reference_loader;
pub mod table_sink;

pub use google_geocoder::GoogleGeocoder;
pub use reference_loader::{load_reference_csv, read_reference_csv};
pub use table_sink::{CsvTableSink, JsonTableSink};
