//! Chunked streaming encrypt/decrypt with bounded memory.
//!
//! Both directions process the data in fixed-size chunks so peak memory is
//! independent of file size. The encrypted layout is
//! `salt || ciphertext || tag`, where the ciphertext length is always a
//! strictly positive multiple of the block size and the tag covers salt and
//! ciphertext only.

use std::io::{self, Read, Write};

use flate2::read::DeflateEncoder;
use flate2::write::DeflateDecoder;
use flate2::Compression;

use sealstream_common::Result;

use crate::session::CipherSession;

/// Chunk size for streaming transforms (1 MiB).
///
/// Throughput tuning only: chunk boundaries are never encoded in the file
/// layout, so the encrypting and decrypting side may disagree on this value.
pub const CHUNK_SIZE: usize = 1_048_576;

/// Plaintext source with an optional deflate stage in front of the cipher.
enum PlainSource<R: Read> {
    Raw(R),
    Deflate(DeflateEncoder<R>),
}

impl<R: Read> Read for PlainSource<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Raw(reader) => reader.read(buf),
            Self::Deflate(reader) => reader.read(buf),
        }
    }
}

/// Plaintext sink with an optional inflate stage behind the cipher.
enum PlainSink<W: Write> {
    Raw(W),
    Inflate(DeflateDecoder<W>),
}

impl<W: Write> PlainSink<W> {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Self::Raw(writer) => writer.write_all(data),
            Self::Inflate(writer) => writer.write_all(data),
        }
    }

    fn finish(self) -> io::Result<()> {
        match self {
            Self::Raw(mut writer) => writer.flush(),
            Self::Inflate(decoder) => {
                let mut writer = decoder.finish()?;
                writer.flush()
            }
        }
    }
}

/// Encrypt `reader` into `writer` as `salt || ciphertext || tag`.
///
/// The final chunk is padded with `block_size - (len mod block_size)` bytes,
/// each holding the padding length, so padding is always present and always
/// in `[1, block_size]` (a full block when the input is already aligned).
///
/// Returns the total number of bytes written.
pub(crate) fn encrypt_stream<R: Read, W: Write>(
    session: &CipherSession,
    reader: R,
    writer: &mut W,
    compress: bool,
) -> Result<u64> {
    let block = session.block_size();
    let mut mac = session.start_mac()?;

    writer.write_all(session.salt())?;
    let mut written = session.salt_size() as u64;

    let mut source = if compress {
        PlainSource::Deflate(DeflateEncoder::new(reader, Compression::default()))
    } else {
        PlainSource::Raw(reader)
    };

    // One block of headroom so the final chunk can absorb its padding.
    let mut buf = vec![0u8; CHUNK_SIZE + block];
    loop {
        let n = read_full(&mut source, &mut buf[..CHUNK_SIZE])?;
        if n == CHUNK_SIZE {
            session.cipher().encrypt_blocks(&mut buf[..n])?;
            mac.update(&buf[..n]);
            writer.write_all(&buf[..n])?;
            written += n as u64;
            continue;
        }

        // Final, possibly empty, chunk.
        let pad = block - n % block;
        buf[n..n + pad].fill(pad as u8);
        let padded = n + pad;

        session.cipher().encrypt_blocks(&mut buf[..padded])?;
        mac.update(&buf[..padded]);
        writer.write_all(&buf[..padded])?;
        written += padded as u64;
        break;
    }

    let tag = mac.finalize();
    writer.write_all(&tag)?;
    written += tag.len() as u64;

    Ok(written)
}

/// Decrypt the post-salt remainder of `reader` into `writer`.
///
/// The true ciphertext/tag boundary is only known at end-of-input, so a
/// sliding window always retains the last `tag_size + block_size` unconsumed
/// bytes: the tag plus the padded final block, which needs special handling.
///
/// Returns `true` when the trailing tag matches the recomputed MAC. Any
/// structural defect (truncation, misalignment, malformed padding, a corrupt
/// compressed stream) yields `false` without further detail.
pub(crate) fn decrypt_stream<R: Read, W: Write>(
    session: &CipherSession,
    mut reader: R,
    writer: W,
    decompress: bool,
) -> Result<bool> {
    let block = session.block_size();
    let tag_size = session.tag_size();
    let holdback = tag_size + block;

    let mut mac = session.start_mac()?;
    let mut sink = if decompress {
        PlainSink::Inflate(DeflateDecoder::new(writer))
    } else {
        PlainSink::Raw(writer)
    };

    let mut pending: Vec<u8> = Vec::with_capacity(CHUNK_SIZE + holdback + block);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    loop {
        let n = read_full(&mut reader, &mut chunk)?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&chunk[..n]);

        if pending.len() > holdback {
            let mut consumable = pending.len() - holdback;
            consumable -= consumable % block;
            if consumable > 0 {
                mac.update(&pending[..consumable]);
                session.cipher().decrypt_blocks(&mut pending[..consumable])?;
                match sink.write_all(&pending[..consumable]) {
                    Ok(()) => {}
                    Err(e) if is_corrupt_stream(&e) => return Ok(false),
                    Err(e) => return Err(e.into()),
                }
                pending.drain(..consumable);
            }
        }
    }

    // The remainder must be at least one ciphertext block plus the tag.
    if pending.len() < holdback {
        return Ok(false);
    }
    let tail = pending.split_off(pending.len() - tag_size);
    if pending.len() % block != 0 {
        return Ok(false);
    }

    mac.update(&pending);
    session.cipher().decrypt_blocks(&mut pending)?;
    let unpadded = match strip_padding(&pending, block) {
        Some(span) => span,
        None => return Ok(false),
    };
    match sink.write_all(unpadded) {
        Ok(()) => {}
        Err(e) if is_corrupt_stream(&e) => return Ok(false),
        Err(e) => return Err(e.into()),
    }
    match sink.finish() {
        Ok(()) => {}
        Err(e) if is_corrupt_stream(&e) => return Ok(false),
        Err(e) => return Err(e.into()),
    }

    Ok(mac.verify(&tail))
}

/// Validate and remove trailing padding from the final plaintext span.
///
/// The padding value must be in `[1, block]` and every padding byte must
/// repeat it.
fn strip_padding(data: &[u8], block: usize) -> Option<&[u8]> {
    let pad = *data.last()? as usize;
    if pad == 0 || pad > block || pad > data.len() {
        return None;
    }
    let body = data.len() - pad;
    if data[body..].iter().any(|&b| b as usize != pad) {
        return None;
    }
    Some(&data[..body])
}

/// Read until `buf` is full or the source is exhausted.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// flate2 reports a corrupt deflate stream as `InvalidInput`/`InvalidData`,
/// and a prematurely ending one as `UnexpectedEof`. Tampered compressed
/// ciphertext must read as verification failure, not as an I/O fault; real
/// write failures never carry these kinds.
fn is_corrupt_stream(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::InvalidInput | io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
    )
}
