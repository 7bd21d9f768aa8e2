pub mod emitter;

pub use emitter::{check_rows, write_skipped, CsvEmitter, JsonEmitter, ResultEmitter};
