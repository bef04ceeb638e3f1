pub mod audit;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod table;
pub mod transform;

pub use audit::AuditLog;
pub use config::Config;
pub use pipeline::{Phase, Pipeline, RunReport};
pub use table::{Record, Table, Value};
