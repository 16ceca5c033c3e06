//! Buffered Reader wrapper, for efficient SP3 reading
//! and integrated .gz decompression.
#[cfg(feature = "flate2")]
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Error as IoError, ErrorKind};
use std::path::Path;

#[derive(Debug)]
pub enum BufferedReader {
    /// Readable (plain) file
    PlainFile(BufReader<File>),
    /// gzip compressed SP3
    #[cfg(feature = "flate2")]
    GzFile(BufReader<GzDecoder<File>>),
}

impl BufferedReader {
    /// Opens given file for line by line iteration,
    /// with possible .gz decompression
    pub fn new(path: &Path) -> std::io::Result<Self> {
        let f = File::open(path)?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();

        if extension.eq_ignore_ascii_case("gz") {
            #[cfg(feature = "flate2")]
            {
                Ok(Self::GzFile(BufReader::new(GzDecoder::new(f))))
            }
            #[cfg(not(feature = "flate2"))]
            {
                Err(IoError::new(
                    ErrorKind::Unsupported,
                    ".gz data requires the flate2 feature",
                ))
            }
        } else if extension.eq("Z") {
            Err(IoError::new(
                ErrorKind::Unsupported,
                ".Z decompression is not supported: uncompress manually",
            ))
        } else {
            // Assumes no extra compression
            Ok(Self::PlainFile(BufReader::new(f)))
        }
    }
}

impl std::io::Read for BufferedReader {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, std::io::Error> {
        match self {
            Self::PlainFile(ref mut h) => h.read(buf),
            #[cfg(feature = "flate2")]
            Self::GzFile(ref mut h) => h.read(buf),
        }
    }
}

impl std::io::BufRead for BufferedReader {
    fn fill_buf(&mut self) -> Result<&[u8], std::io::Error> {
        match self {
            Self::PlainFile(ref mut bufreader) => bufreader.fill_buf(),
            #[cfg(feature = "flate2")]
            Self::GzFile(ref mut bufreader) => bufreader.fill_buf(),
        }
    }
    fn consume(&mut self, s: usize) {
        match self {
            Self::PlainFile(ref mut bufreader) => bufreader.consume(s),
            #[cfg(feature = "flate2")]
            Self::GzFile(ref mut bufreader) => bufreader.consume(s),
        }
    }
}
