pub mod enrich;
pub mod format;
pub mod join;
pub mod normalize;

pub use enrich::{clean_address, AddressEnricher};
pub use format::FieldFormatter;
pub use join::join;
pub use normalize::SchemaNormalizer;
