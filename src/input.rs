use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// Reads a stream from a file or from stdin ("-") in fixed-size pieces.
pub struct InputReader {
    reader: Box<dyn Read>,
    len: Option<u64>,
    bytes_read: u64,
}

impl InputReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.as_os_str() == "-" {
            return Ok(Self {
                reader: Box::new(io::stdin().lock()),
                len: None,
                bytes_read: 0,
            });
        }

        let file =
            File::open(path).with_context(|| format!("Cannot open {}", path.display()))?;
        let len = file.metadata().ok().map(|meta| meta.len());

        Ok(Self {
            reader: Box::new(BufReader::new(file)),
            len,
            bytes_read: 0,
        })
    }

    /// Input size when it is known up front (regular files).
    pub fn total_len(&self) -> Option<u64> {
        self.len
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Feeds the input to `callback` in pieces of at most `chunk_size` bytes.
    ///
    /// The callback returns `Ok(false)` to stop early.
    pub fn for_each_chunk<F>(&mut self, chunk_size: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<bool>,
    {
        let mut buffer = vec![0u8; chunk_size.max(1)];

        loop {
            let n = match self.reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            self.bytes_read += n as u64;

            if !callback(&buffer[..n])? {
                break;
            }
        }

        Ok(())
    }
}
