//! [`CsvDatasetStream`] (C9): a [`DatasetStream`] over a CSV or TSV file.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use ind_core::DatasetStream;

fn to_io_error(e: csv::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

/// Reads rows from a delimited file via [`csv::ByteRecord`] -- cells reach
/// the engine as raw bytes, never assumed to be UTF-8. The column count is
/// fixed at open time from the header row (if `has_headers`) or otherwise
/// the first data row; rows of a different width are passed through as-is
/// and left for the consumer to skip and log -- [`ind_core::BlockDatasetStream`]
/// does this for discovery, and [`ind_core::verify`] does it directly for
/// its two streams -- the same way any other `DatasetStream` implementation's
/// ragged rows are handled.
pub struct CsvDatasetStream {
    path: PathBuf,
    delimiter: u8,
    has_headers: bool,
    num_columns: usize,
    reader: csv::Reader<File>,
    pending: Option<csv::ByteRecord>,
}

impl CsvDatasetStream {
    pub fn open(path: impl Into<PathBuf>, delimiter: u8, has_headers: bool) -> io::Result<Self> {
        let path = path.into();
        let mut reader = Self::build_reader(&path, delimiter, has_headers)?;
        let pending = Self::read_one(&mut reader)?;
        let num_columns = pending.as_ref().map_or(0, csv::ByteRecord::len);
        Ok(Self {
            path,
            delimiter,
            has_headers,
            num_columns,
            reader,
            pending,
        })
    }

    fn build_reader(path: &Path, delimiter: u8, has_headers: bool) -> io::Result<csv::Reader<File>> {
        csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(has_headers)
            .flexible(true)
            .from_path(path)
            .map_err(to_io_error)
    }

    fn read_one(reader: &mut csv::Reader<File>) -> io::Result<Option<csv::ByteRecord>> {
        let mut record = csv::ByteRecord::new();
        if reader.read_byte_record(&mut record).map_err(to_io_error)? {
            Ok(Some(record))
        } else {
            Ok(None)
        }
    }
}

impl DatasetStream for CsvDatasetStream {
    fn reset(&mut self) -> io::Result<()> {
        self.reader = Self::build_reader(&self.path, self.delimiter, self.has_headers)?;
        self.pending = Self::read_one(&mut self.reader)?;
        Ok(())
    }

    fn has_next_row(&mut self) -> io::Result<bool> {
        Ok(self.pending.is_some())
    }

    fn get_next_row(&mut self) -> io::Result<Vec<Box<[u8]>>> {
        let record = self
            .pending
            .take()
            .expect("get_next_row called without a prior has_next_row check");
        let row = record.iter().map(Box::from).collect();
        self.pending = Self::read_one(&mut self.reader)?;
        Ok(row)
    }

    fn number_of_columns(&self) -> usize {
        self.num_columns
    }
}
