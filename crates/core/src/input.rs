//! Legacy account-ID source.
//!
//! The input is a headerless CSV whose first column holds one legacy account
//! ID per row. Values are passed through exactly as read.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::errors::InputError;

/// Yield the first field of every CSV record in `reader`.
pub fn read_account_ids<R: Read>(reader: R) -> impl Iterator<Item = Result<String, InputError>> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
        .into_records()
        .filter_map(|record| match record {
            Ok(record) => record.get(0).map(|id| Ok(id.to_string())),
            Err(e) => Some(Err(InputError::Csv(e))),
        })
}

/// Open `path` and read account IDs from it.
pub fn open_account_ids(
    path: &Path,
) -> Result<impl Iterator<Item = Result<String, InputError>>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.display().to_string(),
        source,
    })?;
    Ok(read_account_ids(file))
}
