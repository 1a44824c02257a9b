//! Minimal RFC 4180 CSV writer for ledger exports

use std::borrow::Cow;
use std::io::{self, Write};

const LINE_END: &str = "\r\n";

/// Quote `value` when it contains a delimiter, a quote or a line break
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

pub struct CsvWriter<W: Write> {
    inner: W,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_record<I, S>(&mut self, fields: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut first = true;
        for field in fields {
            if !first {
                self.inner.write_all(b",")?;
            }
            first = false;
            self.inner.write_all(escape_field(field.as_ref()).as_bytes())?;
        }
        self.inner.write_all(LINE_END.as_bytes())
    }

    pub fn into_inner(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_write_records() {
        let mut writer = CsvWriter::new(Vec::new());
        writer.write_record(["file_id", "name"]).unwrap();
        writer.write_record(["abc", "Trip, day 1.mp4"]).unwrap();
        writer.write_record(["def", ""]).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();

        assert_eq!(out, "file_id,name\r\nabc,\"Trip, day 1.mp4\"\r\ndef,\r\n");
    }
}
