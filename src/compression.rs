//! Transparent compression for input and output streams.
//!
//! Input codecs are sniffed from the leading magic bytes, so compressed data
//! arriving on standard input is handled the same way as a named file.
//! Output codecs are chosen from the output file name suffix:
//!
//! - `.bgz`, `.bgzf` → BGZF (block gzip, splittable and gzip compatible)
//! - `.gz`, `.gzip` → gzip
//! - `.bz2` → bzip2
//! - anything else, or standard output → uncompressed

use crate::config::{DEFAULT_INPUT_BUFFER, DEFAULT_OUTPUT_BUFFER, SNIFF_LENGTH};
use crate::error::Result;
use bzip2::read::MultiBzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

/// Gzip magic bytes (ID1, ID2).
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Bzip2 stream signature.
const BZIP2_MAGIC: &[u8] = b"BZh";

/// FEXTRA bit of the gzip FLG byte.
const FEXTRA: u8 = 0x04;

/// Supported compression codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bgzf,
    Bzip2,
}

impl Compression {
    /// Identify a codec from the first bytes of a stream.
    ///
    /// BGZF is gzip with the FEXTRA flag set and a `BC` subfield immediately
    /// after XLEN, so it needs at least 14 bytes to be told apart from gzip.
    pub fn sniff(magic: &[u8]) -> Self {
        if magic.starts_with(&GZIP_MAGIC) {
            if magic.len() >= 14 && magic[3] & FEXTRA != 0 && &magic[12..14] == b"BC" {
                return Compression::Bgzf;
            }
            return Compression::Gzip;
        }
        if magic.starts_with(BZIP2_MAGIC) {
            return Compression::Bzip2;
        }
        Compression::None
    }

    /// Codec implied by a file name suffix.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("bgz") | Some("bgzf") => Compression::Bgzf,
            Some("gz") | Some("gzip") => Compression::Gzip,
            Some("bz2") => Compression::Bzip2,
            _ => Compression::None,
        }
    }

    /// Canonical file extension for this codec, without the leading dot.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Compression::None => None,
            Compression::Gzip => Some("gz"),
            Compression::Bgzf => Some("bgz"),
            Compression::Bzip2 => Some("bz2"),
        }
    }

    /// Split a trailing compression extension off a file name.
    ///
    /// `"sample.vcf.gz"` becomes `("sample.vcf", Some("gz"))`.
    pub fn strip_extension(name: &str) -> (&str, Option<&str>) {
        if let Some(dot) = name.rfind('.') {
            let extension = &name[dot + 1..];
            if Compression::from_path(name) != Compression::None {
                return (&name[..dot], Some(extension));
            }
        }
        (name, None)
    }
}

/// True when `path` names standard input or output.
#[inline]
pub fn is_stdio(path: &Path) -> bool {
    path.to_string_lossy() == "-"
}

/// Open `path` (or standard input when `None` or `-`) for reading,
/// decompressing transparently.
///
/// Returns the reader together with the codec that was detected.
pub fn open_input(path: Option<&Path>) -> Result<(Box<dyn BufRead>, Compression)> {
    let raw: Box<dyn Read> = match path {
        Some(p) if !is_stdio(p) => Box::new(File::open(p)?),
        _ => Box::new(io::stdin().lock()),
    };
    Ok(decode(raw)?)
}

/// Sniff the codec of `raw` and wrap it in the matching decoder.
pub fn decode<R: Read + 'static>(mut raw: R) -> io::Result<(Box<dyn BufRead>, Compression)> {
    let mut magic = Vec::with_capacity(SNIFF_LENGTH);
    (&mut raw)
        .take(SNIFF_LENGTH as u64)
        .read_to_end(&mut magic)?;
    let compression = Compression::sniff(&magic);
    let stream = Cursor::new(magic).chain(raw);

    let reader: Box<dyn BufRead> = match compression {
        Compression::None => Box::new(BufReader::with_capacity(DEFAULT_INPUT_BUFFER, stream)),
        Compression::Gzip => Box::new(BufReader::with_capacity(
            DEFAULT_INPUT_BUFFER,
            MultiGzDecoder::new(stream),
        )),
        Compression::Bgzf => Box::new(BufReader::with_capacity(
            DEFAULT_INPUT_BUFFER,
            noodles_bgzf::Reader::new(stream),
        )),
        Compression::Bzip2 => Box::new(BufReader::with_capacity(
            DEFAULT_INPUT_BUFFER,
            MultiBzDecoder::new(stream),
        )),
    };
    Ok((reader, compression))
}

/// A possibly compressed output stream.
///
/// Compressed variants must be finished to write their trailers, so callers
/// should end with [`OutputStream::finish`] rather than relying on drop.
pub enum OutputStream {
    Plain(Box<dyn Write>),
    Gzip(GzEncoder<Box<dyn Write>>),
    Bgzf(noodles_bgzf::Writer<Box<dyn Write>>),
    Bzip2(BzEncoder<Box<dyn Write>>),
}

impl OutputStream {
    /// Wrap `inner` in an encoder for `compression`.
    pub fn new(inner: Box<dyn Write>, compression: Compression) -> Self {
        match compression {
            Compression::None => OutputStream::Plain(inner),
            Compression::Gzip => {
                OutputStream::Gzip(GzEncoder::new(inner, flate2::Compression::default()))
            }
            Compression::Bgzf => OutputStream::Bgzf(noodles_bgzf::Writer::new(inner)),
            Compression::Bzip2 => {
                OutputStream::Bzip2(BzEncoder::new(inner, bzip2::Compression::default()))
            }
        }
    }

    /// Codec this stream writes.
    pub fn compression(&self) -> Compression {
        match self {
            OutputStream::Plain(_) => Compression::None,
            OutputStream::Gzip(_) => Compression::Gzip,
            OutputStream::Bgzf(_) => Compression::Bgzf,
            OutputStream::Bzip2(_) => Compression::Bzip2,
        }
    }

    /// Write any compression trailer and flush the underlying sink.
    pub fn finish(self) -> io::Result<()> {
        let mut inner = match self {
            OutputStream::Plain(w) => w,
            OutputStream::Gzip(encoder) => encoder.finish()?,
            OutputStream::Bgzf(writer) => writer.finish()?,
            OutputStream::Bzip2(encoder) => encoder.finish()?,
        };
        inner.flush()
    }
}

impl Write for OutputStream {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputStream::Plain(w) => w.write(buf),
            OutputStream::Gzip(w) => w.write(buf),
            OutputStream::Bgzf(w) => w.write(buf),
            OutputStream::Bzip2(w) => w.write(buf),
        }
    }

    #[inline]
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match self {
            OutputStream::Plain(w) => w.write_all(buf),
            OutputStream::Gzip(w) => w.write_all(buf),
            OutputStream::Bgzf(w) => w.write_all(buf),
            OutputStream::Bzip2(w) => w.write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputStream::Plain(w) => w.flush(),
            OutputStream::Gzip(w) => w.flush(),
            OutputStream::Bgzf(w) => w.flush(),
            OutputStream::Bzip2(w) => w.flush(),
        }
    }
}

/// Create `path` (or standard output when `None` or `-`) for writing,
/// compressing according to the file name suffix.
pub fn create_output(path: Option<&Path>) -> Result<OutputStream> {
    match path {
        Some(p) if !is_stdio(p) => {
            let file = File::create(p)?;
            let sink = BufWriter::with_capacity(DEFAULT_OUTPUT_BUFFER, file);
            Ok(OutputStream::new(Box::new(sink), Compression::from_path(p)))
        }
        _ => {
            let sink = BufWriter::with_capacity(DEFAULT_OUTPUT_BUFFER, io::stdout());
            Ok(OutputStream::new(Box::new(sink), Compression::None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_and_read(name: &str, content: &str) -> (String, Compression) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(name);

        let mut output = create_output(Some(&path)).unwrap();
        output.write_all(content.as_bytes()).unwrap();
        output.finish().unwrap();

        let (mut reader, compression) = open_input(Some(&path)).unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        (text, compression)
    }

    #[test]
    fn test_sniff_plain() {
        assert_eq!(Compression::sniff(b">seq1\nACGT\n"), Compression::None);
        assert_eq!(Compression::sniff(b""), Compression::None);
    }

    #[test]
    fn test_sniff_gzip_and_bzip2() {
        let gzip = [0x1f, 0x8b, 0x08, 0x00, 0, 0, 0, 0, 0, 0xff];
        assert_eq!(Compression::sniff(&gzip), Compression::Gzip);
        assert_eq!(Compression::sniff(b"BZh91AY&SY"), Compression::Bzip2);
    }

    #[test]
    fn test_sniff_bgzf_header() {
        let bgzf = [
            0x1f, 0x8b, 0x08, 0x04, 0, 0, 0, 0, 0, 0xff, 0x06, 0x00, b'B', b'C', 0x02, 0x00,
        ];
        assert_eq!(Compression::sniff(&bgzf), Compression::Bgzf);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Compression::from_path("a.vcf.gz"), Compression::Gzip);
        assert_eq!(Compression::from_path("a.vcf.bgz"), Compression::Bgzf);
        assert_eq!(Compression::from_path("a.fa.bz2"), Compression::Bzip2);
        assert_eq!(Compression::from_path("a.fa"), Compression::None);
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(
            Compression::strip_extension("sample.vcf.gz"),
            ("sample.vcf", Some("gz"))
        );
        assert_eq!(Compression::strip_extension("sample.vcf"), ("sample.vcf", None));
        assert_eq!(Compression::strip_extension("noext"), ("noext", None));
    }

    #[test]
    fn test_plain_output_is_uncompressed() {
        let (text, compression) = write_and_read("out.bed", "chr1\t1\t2\n");
        assert_eq!(text, "chr1\t1\t2\n");
        assert_eq!(compression, Compression::None);
    }

    #[test]
    fn test_gzip_output_detected_on_read() {
        let (text, compression) = write_and_read("out.bed.gz", "chr1\t1\t2\n");
        assert_eq!(text, "chr1\t1\t2\n");
        assert_eq!(compression, Compression::Gzip);
    }

    #[test]
    fn test_bgzf_output_detected_on_read() {
        let (text, compression) = write_and_read("out.vcf.bgz", "#CHROM\nchr1\t5\n");
        assert_eq!(text, "#CHROM\nchr1\t5\n");
        assert_eq!(compression, Compression::Bgzf);
    }

    #[test]
    fn test_bzip2_output_detected_on_read() {
        let (text, compression) = write_and_read("out.fa.bz2", ">a\nACGT\n");
        assert_eq!(text, ">a\nACGT\n");
        assert_eq!(compression, Compression::Bzip2);
    }

    #[test]
    fn test_decode_short_stream() {
        let (mut reader, compression) = decode(Cursor::new(b"AC".to_vec())).unwrap();
        let mut text = String::new();
        reader.read_to_string(&mut text).unwrap();
        assert_eq!(text, "AC");
        assert_eq!(compression, Compression::None);
    }
}
