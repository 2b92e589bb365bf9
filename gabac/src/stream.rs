//! Byte framing around coded payloads.
//!
//! The arithmetic coder produces opaque byte payloads without embedded
//! lengths; the drivers frame every transformed stream with its symbol
//! count and payload size so that a compressed blob is self-contained.
//! All fields are little-endian.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// Writes one framed stream: `u64` symbol count, `u32` payload size,
/// payload bytes.
pub fn write_stream<W: Write>(writer: &mut W, num_symbols: u64, payload: &[u8]) -> std::io::Result<()> {
    writer.write_u64::<LittleEndian>(num_symbols)?;
    writer.write_u32::<LittleEndian>(payload.len() as u32)?;
    writer.write_all(payload)?;
    Ok(())
}

/// Reads one framed stream, returning the symbol count and the payload.
pub fn read_stream<R: Read>(reader: &mut R) -> std::io::Result<(u64, Vec<u8>)> {
    let num_symbols = reader.read_u64::<LittleEndian>()?;
    let payload_size = reader.read_u32::<LittleEndian>()?;

    let mut payload = vec![0u8; payload_size as usize];
    reader.read_exact(&mut payload)?;

    Ok((num_symbols, payload))
}
