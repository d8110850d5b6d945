//! circom `.wtns` witness files.
//!
//! ```text
//! "wtns" | version u32 (2) | n_sections u32 (2)
//!   1: n8 u32 | prime[n8] | n_witness u32
//!   2: n_witness * value[n8]
//! ```

use crate::WitnessError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use groth16_field::{
    bytes::{read_element, write_element},
    Curve, FieldError, FieldLike,
};
use groth16_r1cs::Witness;
use std::io::{self, Read, Write};

const MAGIC: [u8; 4] = *b"wtns";
const VERSION: u32 = 2;

fn malformed(msg: impl Into<String>) -> WitnessError {
    WitnessError::MalformedWitnessFile(msg.into())
}

fn io_error(err: io::Error) -> WitnessError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        malformed("unexpected end of data")
    } else {
        WitnessError::Io(err)
    }
}

/// Write `witness` in `.wtns` format.
pub fn write_wtns<F: FieldLike, W: Write>(witness: &Witness<F>, writer: &mut W) -> Result<(), WitnessError> {
    let n8 = F::byte_len();
    let count = u32::try_from(witness.len()).map_err(|_| malformed("witness too large"))?;

    writer.write_all(&MAGIC)?;
    writer.write_u32::<LittleEndian>(VERSION)?;
    writer.write_u32::<LittleEndian>(2)?;

    writer.write_u32::<LittleEndian>(1)?;
    writer.write_u64::<LittleEndian>(4 + n8 as u64 + 4)?;
    writer.write_u32::<LittleEndian>(n8 as u32)?;
    writer.write_all(&F::modulus_le_bytes())?;
    writer.write_u32::<LittleEndian>(count)?;

    writer.write_u32::<LittleEndian>(2)?;
    writer.write_u64::<LittleEndian>(witness.len() as u64 * n8 as u64)?;
    for value in witness.values() {
        write_element(writer, value, n8).map_err(|err| match err {
            FieldError::Io(io) => WitnessError::Io(io),
            other => malformed(other.to_string()),
        })?;
    }
    Ok(())
}

/// Read a `.wtns` file written for field `F`.
///
/// Sections are expected in order, header first.
pub fn read_wtns<F: FieldLike, R: Read>(reader: &mut R) -> Result<Witness<F>, WitnessError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(io_error)?;
    if magic != MAGIC {
        return Err(malformed(format!("bad magic {magic:?}")));
    }
    let version = reader.read_u32::<LittleEndian>().map_err(io_error)?;
    if version != VERSION {
        return Err(malformed(format!("unsupported version {version}")));
    }
    let n_sections = reader.read_u32::<LittleEndian>().map_err(io_error)?;
    if n_sections < 2 {
        return Err(malformed(format!("expected 2 sections, found {n_sections}")));
    }

    let kind = reader.read_u32::<LittleEndian>().map_err(io_error)?;
    let _size = reader.read_u64::<LittleEndian>().map_err(io_error)?;
    if kind != 1 {
        return Err(malformed(format!("expected header section, found type {kind}")));
    }
    let n8 = reader.read_u32::<LittleEndian>().map_err(io_error)? as usize;
    if n8 == 0 || n8 > 1024 {
        return Err(malformed(format!("invalid field size {n8}")));
    }
    let mut prime = vec![0u8; n8];
    reader.read_exact(&mut prime).map_err(io_error)?;
    if n8 != F::byte_len() || prime != F::modulus_le_bytes() {
        return Err(WitnessError::FieldMismatch {
            expected: F::CURVE,
            found: Curve::from_prime_le(&prime),
        });
    }
    let count = reader.read_u32::<LittleEndian>().map_err(io_error)?;

    let kind = reader.read_u32::<LittleEndian>().map_err(io_error)?;
    let size = reader.read_u64::<LittleEndian>().map_err(io_error)?;
    if kind != 2 || size != count as u64 * n8 as u64 {
        return Err(malformed("witness values section does not match the header"));
    }

    let mut values = Vec::with_capacity(count.min(1 << 20) as usize);
    for index in 0..count {
        let value = read_element::<F, _>(reader, n8).map_err(|err| match err {
            FieldError::Io(io) => io_error(io),
            _ => malformed(format!("value {index} is not canonical")),
        })?;
        values.push(value);
    }

    Witness::new(values).map_err(|_| malformed("signal 0 is not one"))
}
