use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, Chain, Cursor, Read};
use std::path::Path;

use crate::error::{DigestError, Result};

/// Compression detected from the first bytes of an input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Zstd,
    None,
}

impl Compression {
    /// Gzip is 1F 8B 08, zstd is 28 B5 2F FD.
    pub fn detect(head: &[u8]) -> Self {
        match head {
            [0x1F, 0x8B, 0x08, ..] => Compression::Gzip,
            [0x28, 0xB5, 0x2F, 0xFD, ..] => Compression::Zstd,
            _ => Compression::None,
        }
    }
}

/// Peek at the magic bytes and wrap the reader in the matching decoder.
/// The peeked bytes are chained back in front so nothing is lost.
pub fn maybe_decompress<R: Read + Send + 'static>(
    mut reader: R,
) -> io::Result<(Box<dyn Read + Send>, Compression)> {
    let mut head = [0u8; 4];
    let n = read_head(&mut reader, &mut head)?;

    let prefix = Cursor::new(head[..n].to_vec());
    let chained: Chain<Cursor<Vec<u8>>, R> = prefix.chain(reader);

    let compression = Compression::detect(&head[..n]);
    let reader: Box<dyn Read + Send> = match compression {
        Compression::Gzip => Box::new(MultiGzDecoder::new(chained)),
        Compression::Zstd => Box::new(zstd::Decoder::new(chained)?),
        Compression::None => Box::new(chained),
    };
    Ok((reader, compression))
}

/// Fill `head` as far as the stream allows; short reads from pipes are retried.
fn read_head<R: Read>(reader: &mut R, head: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < head.len() {
        match reader.read(&mut head[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Open a file or stdin (`None` or `-`) with transparent decompression.
pub fn open_input(path: Option<&Path>) -> Result<(Box<dyn Read + Send>, Compression)> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path).map_err(|source| DigestError::Open {
                path: path.to_path_buf(),
                source,
            })?;
            maybe_decompress(file).map_err(|source| DigestError::Open {
                path: path.to_path_buf(),
                source,
            })
        }
        _ => Ok(maybe_decompress(io::stdin())?),
    }
}
