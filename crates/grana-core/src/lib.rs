// Domain core for the GranaApp assistant: record types, category
// normalization, money and date helpers, configuration, and the data store
// abstraction with its SQLite and PostgREST backends.

pub mod category;
pub mod classify;
pub mod config;
pub mod dates;
pub mod money;
pub mod records;
pub mod store;
