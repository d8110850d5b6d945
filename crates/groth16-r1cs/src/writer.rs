//! Encoder for the binary `.r1cs` format read by [`crate::loader`].

use crate::loader::{MAGIC, SECTION_CONSTRAINTS, SECTION_HEADER, SECTION_WIRE2LABEL, VERSION};
use crate::{ConstraintSystem, LinearCombination, R1CSError};
use byteorder::{LittleEndian, WriteBytesExt};
use groth16_field::{bytes::write_element, FieldLike};
use std::io::Write;

fn encode_lc<F: FieldLike>(out: &mut Vec<u8>, lc: &LinearCombination<F>, n8: usize) -> Result<(), R1CSError> {
    out.write_u32::<LittleEndian>(lc.len() as u32).map_err(map_io)?;
    for (var, coeff) in lc.iter() {
        out.write_u32::<LittleEndian>(var.index() as u32).map_err(map_io)?;
        write_element(out, coeff, n8)?;
    }
    Ok(())
}

fn map_io(err: std::io::Error) -> R1CSError {
    R1CSError::FieldError(err.into())
}

fn write_section<W: Write>(writer: &mut W, kind: u32, body: &[u8]) -> Result<(), R1CSError> {
    writer.write_u32::<LittleEndian>(kind).map_err(map_io)?;
    writer.write_u64::<LittleEndian>(body.len() as u64).map_err(map_io)?;
    writer.write_all(body).map_err(map_io)
}

/// Serialize `cs` with header, constraints and wire-label sections.
///
/// Systems without labels get the identity labelling.
pub fn write_r1cs<F: FieldLike, W: Write>(cs: &ConstraintSystem<F>, writer: &mut W) -> Result<(), R1CSError> {
    cs.validate()?;
    let n8 = F::byte_len();

    let mut header = Vec::with_capacity(32 + n8);
    header.write_u32::<LittleEndian>(n8 as u32).map_err(map_io)?;
    header.extend_from_slice(&F::modulus_le_bytes());
    for count in [
        cs.num_signals,
        cs.num_public_outputs,
        cs.num_public_inputs,
        cs.num_private_inputs,
    ] {
        header.write_u32::<LittleEndian>(count as u32).map_err(map_io)?;
    }
    header.write_u64::<LittleEndian>(cs.num_signals as u64).map_err(map_io)?;
    header.write_u32::<LittleEndian>(cs.num_constraints() as u32).map_err(map_io)?;

    let mut constraints = Vec::new();
    for constraint in &cs.constraints {
        encode_lc(&mut constraints, &constraint.a, n8)?;
        encode_lc(&mut constraints, &constraint.b, n8)?;
        encode_lc(&mut constraints, &constraint.c, n8)?;
    }

    let mut labels = Vec::with_capacity(cs.num_signals * 8);
    let ids: Vec<u64> = match &cs.labels {
        Some(ids) => ids.clone(),
        None => (0..cs.num_signals as u64).collect(),
    };
    for id in ids {
        labels.write_u64::<LittleEndian>(id).map_err(map_io)?;
    }

    writer.write_all(&MAGIC).map_err(map_io)?;
    writer.write_u32::<LittleEndian>(VERSION).map_err(map_io)?;
    writer.write_u32::<LittleEndian>(3).map_err(map_io)?;
    write_section(writer, SECTION_HEADER, &header)?;
    write_section(writer, SECTION_CONSTRAINTS, &constraints)?;
    write_section(writer, SECTION_WIRE2LABEL, &labels)?;
    Ok(())
}
