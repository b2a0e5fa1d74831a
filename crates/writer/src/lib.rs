//! Quarry Writer - positional bulk writes with transaction pulsing
//!
//! A `DataWriter` is bound to one `WriterInfo` and one `Connection`. Rows are
//! buffered positionally, written as inserts, keyed updates or upserts, and
//! committed in pulses of a configurable row count.

mod connection;
mod error;
mod info;
mod schema;
mod writer;

pub use connection::Connection;
pub use error::{Error, Result};
pub use info::{WriteMode, WriterInfo, WriterInfoBuilder};
pub use schema::{ColumnDef, TableDef};
pub use writer::{DataWriter, WriterState};
