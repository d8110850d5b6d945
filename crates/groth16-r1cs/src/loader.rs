//! Loader for the circom-compatible binary `.r1cs` format.
//!
//! File layout (little-endian):
//!
//! ```text
//! "r1cs" | version u32 | n_sections u32 | { type u32 | size u64 | body }*
//!   1: header       n8 u32 | prime[n8] | n_wires u32 | n_pub_out u32
//!                   | n_pub_in u32 | n_prv_in u32 | n_labels u64 | n_constraints u32
//!   2: constraints  n_constraints * (A, B, C), each n u32 | n * (wire u32 | coeff[n8])
//!   3: wire2label   n_wires * u64
//! ```
//!
//! Sections may come in any order and unknown section types are skipped.

use crate::{Constraint, ConstraintSystem, LinearCombination, Variable};
use byteorder::{LittleEndian, ReadBytesExt};
use groth16_field::{bytes::read_element, Curve, FieldError, FieldLike};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, info};

/// File magic
pub const MAGIC: [u8; 4] = *b"r1cs";
/// Only supported format version
pub const VERSION: u32 = 1;

pub(crate) const SECTION_HEADER: u32 = 1;
pub(crate) const SECTION_CONSTRAINTS: u32 = 2;
pub(crate) const SECTION_WIRE2LABEL: u32 = 3;

/// Parsed header section, independent of the target field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct R1csHeader {
    /// Field element width in bytes (`n8`)
    pub field_size: u32,
    /// Field prime, little-endian, `field_size` bytes
    pub prime: Vec<u8>,
    /// Total number of wires (signals)
    pub n_wires: u32,
    /// Number of public outputs
    pub n_pub_out: u32,
    /// Number of public inputs
    pub n_pub_in: u32,
    /// Number of private inputs
    pub n_prv_in: u32,
    /// Number of labels
    pub n_labels: u64,
    /// Number of constraints
    pub n_constraints: u32,
}

impl R1csHeader {
    /// Curve whose scalar field matches the header prime
    pub fn curve(&self) -> Option<Curve> {
        Curve::from_prime_le(&self.prime)
    }
}

/// Caps applied to header counts before anything is allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Maximum number of constraints accepted
    pub max_constraints: u64,
    /// Maximum number of signals accepted
    pub max_signals: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            max_constraints: u32::MAX as u64,
            max_signals: u32::MAX as u64,
        }
    }
}

/// Ways a constraint-system file can be malformed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Malformation {
    /// Wrong file magic
    #[error("bad magic {0:?}, expected \"r1cs\"")]
    BadMagic([u8; 4]),

    /// Version other than 1
    #[error("unsupported version {0}")]
    UnsupportedVersion(u32),

    /// A required section is absent
    #[error("missing {0} section")]
    MissingSection(&'static str),

    /// A known section appears twice
    #[error("duplicate section of type {0}")]
    DuplicateSection(u32),

    /// A section extends past the end of the file
    #[error("section of type {section_type} extends past the end of the file")]
    SectionOutOfBounds {
        /// Section type
        section_type: u32,
    },

    /// Field width not a positive multiple of 8
    #[error("invalid field element size {0}")]
    InvalidFieldSize(u32),

    /// Declared section size disagrees with its content
    #[error("section of type {section_type} declares {declared} bytes but holds {actual}")]
    SectionSizeMismatch {
        /// Section type
        section_type: u32,
        /// Size from the section table
        declared: u64,
        /// Size implied by the content
        actual: u64,
    },

    /// Prime does not match the field the caller asked for
    #[error("field prime belongs to {found:?}, expected {expected}")]
    FieldMismatch {
        /// Field the caller is loading into
        expected: Curve,
        /// Curve the file's prime belongs to, if known
        found: Option<Curve>,
    },

    /// Primary signal counts exceed the wire count
    #[error("{primary} primary signals declared but only {n_wires} wires")]
    InconsistentCounts {
        /// Constant plus inputs and outputs
        primary: u64,
        /// Declared wires
        n_wires: u32,
    },

    /// Stream ended early
    #[error("unexpected end of data")]
    Truncated,

    /// Coefficient not below the modulus
    #[error("non-canonical coefficient in constraint {row}")]
    NonCanonicalCoefficient {
        /// Row of the offending constraint
        row: usize,
    },

    /// Constraint references a wire beyond `n_wires`
    #[error("constraint {row} references signal {signal} but only {num_signals} signals exist")]
    SignalOutOfBounds {
        /// Row of the offending constraint
        row: usize,
        /// Offending signal index
        signal: u32,
        /// Declared signal count
        num_signals: u32,
    },
}

/// Errors raised by the loader
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The input is not a valid constraint system
    #[error("malformed constraint system: {0}")]
    MalformedConstraintSystem(#[from] Malformation),

    /// The header asks for more than the configured limits
    #[error("constraint system exceeds resource limit: {what} = {requested} (limit {limit})")]
    ResourceLimit {
        /// Which count exceeded its limit
        what: &'static str,
        /// Requested amount
        requested: u64,
        /// Configured limit
        limit: u64,
    },

    /// Underlying I/O failure
    #[error("I/O error reading constraint system: {0}")]
    Io(io::Error),
}

impl From<io::Error> for LoadError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            LoadError::MalformedConstraintSystem(Malformation::Truncated)
        } else {
            LoadError::Io(err)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Section {
    kind: u32,
    offset: u64,
    size: u64,
}

fn scan_sections<R: Read + Seek>(reader: &mut R) -> Result<Vec<Section>, LoadError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(Malformation::BadMagic(magic).into());
    }

    let version = reader.read_u32::<LittleEndian>()?;
    if version != VERSION {
        return Err(Malformation::UnsupportedVersion(version).into());
    }

    let num_sections = reader.read_u32::<LittleEndian>()?;
    let table_start = reader.stream_position()?;
    let file_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(table_start))?;

    let mut sections: Vec<Section> = Vec::new();
    for _ in 0..num_sections {
        let kind = reader.read_u32::<LittleEndian>()?;
        let size = reader.read_u64::<LittleEndian>()?;
        let offset = reader.stream_position()?;

        let end = offset
            .checked_add(size)
            .filter(|&end| end <= file_len)
            .ok_or(Malformation::SectionOutOfBounds { section_type: kind })?;

        let known = matches!(kind, SECTION_HEADER | SECTION_CONSTRAINTS | SECTION_WIRE2LABEL);
        if known && sections.iter().any(|s| s.kind == kind) {
            return Err(Malformation::DuplicateSection(kind).into());
        }

        sections.push(Section { kind, offset, size });
        reader.seek(SeekFrom::Start(end))?;
    }

    debug!(num_sections, "scanned r1cs section table");
    Ok(sections)
}

fn find(sections: &[Section], kind: u32) -> Option<Section> {
    sections.iter().copied().find(|s| s.kind == kind)
}

fn parse_header_section<R: Read>(reader: &mut R, section: Section) -> Result<R1csHeader, LoadError> {
    let field_size = reader.read_u32::<LittleEndian>()?;
    if field_size == 0 || field_size % 8 != 0 {
        return Err(Malformation::InvalidFieldSize(field_size).into());
    }

    let expected_size = 32 + field_size as u64;
    if section.size != expected_size {
        return Err(Malformation::SectionSizeMismatch {
            section_type: SECTION_HEADER,
            declared: section.size,
            actual: expected_size,
        }
        .into());
    }

    let mut prime = vec![0u8; field_size as usize];
    reader.read_exact(&mut prime)?;

    Ok(R1csHeader {
        field_size,
        prime,
        n_wires: reader.read_u32::<LittleEndian>()?,
        n_pub_out: reader.read_u32::<LittleEndian>()?,
        n_pub_in: reader.read_u32::<LittleEndian>()?,
        n_prv_in: reader.read_u32::<LittleEndian>()?,
        n_labels: reader.read_u64::<LittleEndian>()?,
        n_constraints: reader.read_u32::<LittleEndian>()?,
    })
}

/// Read only the header of an `.r1cs` stream.
///
/// Used to pick the curve before committing to a field type.
pub fn read_header<R: Read + Seek>(reader: &mut R) -> Result<R1csHeader, LoadError> {
    let sections = scan_sections(reader)?;
    let section = find(&sections, SECTION_HEADER).ok_or(Malformation::MissingSection("header"))?;
    reader.seek(SeekFrom::Start(section.offset))?;
    parse_header_section(reader, section)
}

fn read_lc<F: FieldLike, R: Read>(
    reader: &mut R,
    header: &R1csHeader,
    row: usize,
    section_size: u64,
) -> Result<LinearCombination<F>, LoadError> {
    let n8 = header.field_size as usize;
    let n_terms = reader.read_u32::<LittleEndian>()?;
    if n_terms as u64 * (4 + n8 as u64) > section_size {
        return Err(Malformation::Truncated.into());
    }

    let mut lc = LinearCombination::new();
    for _ in 0..n_terms {
        let wire = reader.read_u32::<LittleEndian>()?;
        if wire >= header.n_wires {
            return Err(Malformation::SignalOutOfBounds {
                row,
                signal: wire,
                num_signals: header.n_wires,
            }
            .into());
        }

        let coeff = read_element::<F, _>(reader, n8).map_err(|err| match err {
            FieldError::Io(io) => LoadError::from(io),
            _ => Malformation::NonCanonicalCoefficient { row }.into(),
        })?;
        lc.add_term(Variable::new(wire as usize), coeff);
    }
    Ok(lc)
}

/// Read and validate a constraint system over `F`.
pub fn read_r1cs<F: FieldLike, R: Read + Seek>(
    reader: &mut R,
    options: &LoadOptions,
) -> Result<ConstraintSystem<F>, LoadError> {
    let sections = scan_sections(reader)?;

    let header_section = find(&sections, SECTION_HEADER).ok_or(Malformation::MissingSection("header"))?;
    reader.seek(SeekFrom::Start(header_section.offset))?;
    let header = parse_header_section(reader, header_section)?;

    if header.field_size as usize != F::byte_len() || header.prime != F::modulus_le_bytes() {
        return Err(Malformation::FieldMismatch {
            expected: F::CURVE,
            found: header.curve(),
        }
        .into());
    }

    let primary = 1 + header.n_pub_out as u64 + header.n_pub_in as u64 + header.n_prv_in as u64;
    if primary > header.n_wires as u64 {
        return Err(Malformation::InconsistentCounts {
            primary,
            n_wires: header.n_wires,
        }
        .into());
    }

    if header.n_constraints as u64 > options.max_constraints {
        return Err(LoadError::ResourceLimit {
            what: "constraints",
            requested: header.n_constraints as u64,
            limit: options.max_constraints,
        });
    }
    if header.n_wires as u64 > options.max_signals {
        return Err(LoadError::ResourceLimit {
            what: "signals",
            requested: header.n_wires as u64,
            limit: options.max_signals,
        });
    }

    let mut constraints = Vec::new();
    match find(&sections, SECTION_CONSTRAINTS) {
        Some(section) => {
            reader.seek(SeekFrom::Start(section.offset))?;
            // Every row needs at least three term counts.
            constraints.reserve((header.n_constraints as u64).min(section.size / 12) as usize);
            for row in 0..header.n_constraints as usize {
                let a = read_lc(reader, &header, row, section.size)?;
                let b = read_lc(reader, &header, row, section.size)?;
                let c = read_lc(reader, &header, row, section.size)?;
                constraints.push(Constraint::new(a, b, c));
            }

            let consumed = reader.stream_position()? - section.offset;
            if consumed != section.size {
                return Err(Malformation::SectionSizeMismatch {
                    section_type: SECTION_CONSTRAINTS,
                    declared: section.size,
                    actual: consumed,
                }
                .into());
            }
        }
        None if header.n_constraints == 0 => {}
        None => return Err(Malformation::MissingSection("constraints").into()),
    }

    let labels = match find(&sections, SECTION_WIRE2LABEL) {
        Some(section) => {
            let expected = header.n_wires as u64 * 8;
            if section.size != expected {
                return Err(Malformation::SectionSizeMismatch {
                    section_type: SECTION_WIRE2LABEL,
                    declared: section.size,
                    actual: expected,
                }
                .into());
            }
            reader.seek(SeekFrom::Start(section.offset))?;
            let mut labels = Vec::with_capacity(header.n_wires as usize);
            for _ in 0..header.n_wires {
                labels.push(reader.read_u64::<LittleEndian>()?);
            }
            Some(labels)
        }
        None => None,
    };

    info!(
        curve = %F::CURVE,
        wires = header.n_wires,
        public_outputs = header.n_pub_out,
        public_inputs = header.n_pub_in,
        private_inputs = header.n_prv_in,
        constraints = header.n_constraints,
        "parsed constraint system"
    );

    Ok(ConstraintSystem {
        constraints,
        num_public_outputs: header.n_pub_out as usize,
        num_public_inputs: header.n_pub_in as usize,
        num_private_inputs: header.n_prv_in as usize,
        num_signals: header.n_wires as usize,
        labels,
    })
}

/// Open and read an `.r1cs` file.
pub fn load_r1cs<F: FieldLike, P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<ConstraintSystem<F>, LoadError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading constraint system");
    let file = File::open(path).map_err(LoadError::Io)?;
    read_r1cs(&mut BufReader::new(file), options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write_r1cs;
    use byteorder::WriteBytesExt;
    use groth16_field::{Bls12381Fr, F};
    use std::io::Cursor;

    /// out = a * b with one public output and two private inputs
    fn multiplier() -> ConstraintSystem<F> {
        let mut cs = ConstraintSystem::<F>::new(1, 0, 2);
        cs.enforce_multiplication(
            LinearCombination::from_variable(cs.private_input(0)),
            LinearCombination::from_variable(cs.private_input(1)),
            LinearCombination::from_variable(cs.public_output(0)),
        );
        cs
    }

    fn encoded(cs: &ConstraintSystem<F>) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_r1cs(cs, &mut bytes).unwrap();
        bytes
    }

    fn load(bytes: Vec<u8>) -> Result<ConstraintSystem<F>, LoadError> {
        read_r1cs(&mut Cursor::new(bytes), &LoadOptions::default())
    }

    fn malformation(result: Result<ConstraintSystem<F>, LoadError>) -> Malformation {
        match result {
            Err(LoadError::MalformedConstraintSystem(m)) => m,
            other => panic!("expected a malformation, got {other:?}"),
        }
    }

    /// Hand-assembled file: header + one constraint referencing `wire`.
    fn handmade(wire: u32, n_wires: u32) -> Vec<u8> {
        let prime = F::modulus_le_bytes();
        let mut header = Vec::new();
        header.write_u32::<LittleEndian>(32).unwrap();
        header.extend_from_slice(&prime);
        for count in [n_wires, 1, 0, 1] {
            header.write_u32::<LittleEndian>(count).unwrap();
        }
        header.write_u64::<LittleEndian>(n_wires as u64).unwrap();
        header.write_u32::<LittleEndian>(1).unwrap();

        let mut one = vec![0u8; 32];
        one[0] = 1;
        let mut constraints = Vec::new();
        for _ in 0..3 {
            constraints.write_u32::<LittleEndian>(1).unwrap();
            constraints.write_u32::<LittleEndian>(wire).unwrap();
            constraints.extend_from_slice(&one);
        }

        let mut file = b"r1cs".to_vec();
        file.write_u32::<LittleEndian>(1).unwrap();
        file.write_u32::<LittleEndian>(2).unwrap();
        // Constraints first: sections may come in any order.
        for (kind, body) in [(2u32, &constraints), (1u32, &header)] {
            file.write_u32::<LittleEndian>(kind).unwrap();
            file.write_u64::<LittleEndian>(body.len() as u64).unwrap();
            file.extend_from_slice(body);
        }
        file
    }

    #[test]
    fn test_roundtrip_with_writer() {
        let cs = multiplier();
        let loaded = load(encoded(&cs)).unwrap();
        assert_eq!(loaded.constraints, cs.constraints);
        assert_eq!(loaded.num_signals, 4);
        assert_eq!(loaded.num_public(), 1);
        assert_eq!(loaded.num_private_inputs, 2);
        assert_eq!(loaded.labels, Some(vec![0, 1, 2, 3]));
        assert_eq!(loaded.digest(), cs.digest());
    }

    #[test]
    fn test_out_of_order_sections() {
        let cs = load(handmade(2, 3)).unwrap();
        assert_eq!(cs.num_constraints(), 1);
        assert_eq!(cs.labels, None);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encoded(&multiplier());
        bytes[..4].copy_from_slice(b"wtns");
        assert_eq!(malformation(load(bytes)), Malformation::BadMagic(*b"wtns"));
    }

    #[test]
    fn test_bad_version() {
        let mut bytes = encoded(&multiplier());
        bytes[4] = 2;
        assert_eq!(malformation(load(bytes)), Malformation::UnsupportedVersion(2));
    }

    #[test]
    fn test_signal_out_of_bounds() {
        assert_eq!(
            malformation(load(handmade(7, 3))),
            Malformation::SignalOutOfBounds {
                row: 0,
                signal: 7,
                num_signals: 3
            }
        );
    }

    #[test]
    fn test_field_mismatch() {
        let bytes = encoded(&multiplier());
        let result = read_r1cs::<Bls12381Fr, _>(&mut Cursor::new(bytes), &LoadOptions::default());
        match result {
            Err(LoadError::MalformedConstraintSystem(Malformation::FieldMismatch { expected, found })) => {
                assert_eq!(expected, Curve::Bls12_381);
                assert_eq!(found, Some(Curve::Bn254));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_truncated_file() {
        let mut bytes = encoded(&multiplier());
        bytes.truncate(bytes.len() - 5);
        // The last section's declared size now runs past the end of the data.
        assert!(matches!(
            malformation(load(bytes)),
            Malformation::SectionOutOfBounds { .. } | Malformation::Truncated
        ));

        assert_eq!(malformation(load(b"r1c".to_vec())), Malformation::Truncated);
    }

    #[test]
    fn test_missing_header() {
        let mut file = b"r1cs".to_vec();
        file.write_u32::<LittleEndian>(1).unwrap();
        file.write_u32::<LittleEndian>(0).unwrap();
        assert_eq!(malformation(load(file)), Malformation::MissingSection("header"));
    }

    #[test]
    fn test_resource_limit() {
        let options = LoadOptions {
            max_constraints: 0,
            ..LoadOptions::default()
        };
        let result = read_r1cs::<F, _>(&mut Cursor::new(encoded(&multiplier())), &options);
        assert!(matches!(
            result,
            Err(LoadError::ResourceLimit {
                what: "constraints",
                requested: 1,
                limit: 0
            })
        ));
    }

    #[test]
    fn test_header_only_read_detects_curve() {
        let header = read_header(&mut Cursor::new(encoded(&multiplier()))).unwrap();
        assert_eq!(header.curve(), Some(Curve::Bn254));
        assert_eq!(header.n_constraints, 1);
        assert_eq!(header.n_wires, 4);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multiplier.r1cs");
        std::fs::write(&path, encoded(&multiplier())).unwrap();

        let cs: ConstraintSystem<F> = load_r1cs(&path, &LoadOptions::default()).unwrap();
        assert_eq!(cs.num_constraints(), 1);

        let missing = load_r1cs::<F, _>(dir.path().join("nope.r1cs"), &LoadOptions::default());
        assert!(matches!(missing, Err(LoadError::Io(_))));
    }
}
