//! Daily aggregate files

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use crate::error::{CallRecError, Result};

/// Append a finished call file to its daily aggregate
///
/// The aggregate is created if missing and always opened in append mode,
/// so calls accumulate in the order they finish. Returns the number of
/// bytes appended.
///
/// # Errors
///
/// Returns `CallRecError::Aggregate` if either file cannot be opened or the
/// copy fails. The call file itself is never modified.
pub fn append_to_aggregate(call_file: &Path, aggregate: &Path) -> Result<u64> {
    let wrap = |source: io::Error| CallRecError::Aggregate {
        call_file: call_file.to_path_buf(),
        aggregate: aggregate.to_path_buf(),
        source,
    };

    let mut input = File::open(call_file).map_err(wrap)?;
    let mut output = OpenOptions::new()
        .append(true)
        .create(true)
        .open(aggregate)
        .map_err(wrap)?;

    io::copy(&mut input, &mut output).map_err(wrap)
}
