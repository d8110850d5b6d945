//! Compiled witness program: the artifact that sits in a circuit's
//! `X_js/X.wasm` slot.
//!
//! Binary layout (little-endian):
//!
//! ```text
//! "zkwp" | version u32 | n8 u32 | prime[n8] | n_signals u32
//! inputs       count u32 | count * (name_len u32 | name | offset u32 | len u32)
//! outputs      same as inputs
//! constants    count u32 | count * value[n8]
//! instructions count u32 | count * (opcode u8 | dst u32 | a u32 | b u32)
//! ```

use crate::WitnessError;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use groth16_field::{
    bytes::{read_element, write_element},
    Curve, FieldError, FieldLike,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::ops::Range;
use std::path::Path;
use tracing::debug;

/// File magic
pub const MAGIC: [u8; 4] = *b"zkwp";
/// Current format version
pub const VERSION: u32 = 1;

/// Signal cap applied when no constraint system bounds the program
pub const DEFAULT_MAX_SIGNALS: usize = 1 << 24;

const MAX_NAME_LEN: u32 = 1 << 16;
const MAX_BIT_INDEX: u32 = 1024;

mod opcode {
    pub const CONST: u8 = 0x01;
    pub const COPY: u8 = 0x02;
    pub const ADD: u8 = 0x03;
    pub const SUB: u8 = 0x04;
    pub const MUL: u8 = 0x05;
    pub const DIV: u8 = 0x06;
    pub const NEG: u8 = 0x07;
    pub const ISZERO: u8 = 0x08;
    pub const ASSERT_EQ: u8 = 0x09;
    pub const BIT: u8 = 0x0a;
}

/// One step of a witness program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `dst = constants[index]`
    Const {
        /// Destination signal
        dst: usize,
        /// Constant pool index
        index: usize,
    },
    /// `dst = src`
    Copy {
        /// Destination signal
        dst: usize,
        /// Source signal
        src: usize,
    },
    /// `dst = a + b`
    Add {
        /// Destination signal
        dst: usize,
        /// Left operand
        a: usize,
        /// Right operand
        b: usize,
    },
    /// `dst = a - b`
    Sub {
        /// Destination signal
        dst: usize,
        /// Left operand
        a: usize,
        /// Right operand
        b: usize,
    },
    /// `dst = a * b`
    Mul {
        /// Destination signal
        dst: usize,
        /// Left operand
        a: usize,
        /// Right operand
        b: usize,
    },
    /// `dst = a / b`, failing when `b` is zero
    Div {
        /// Destination signal
        dst: usize,
        /// Dividend
        a: usize,
        /// Divisor
        b: usize,
    },
    /// `dst = -src`
    Neg {
        /// Destination signal
        dst: usize,
        /// Source signal
        src: usize,
    },
    /// `dst = 1` if `src` is zero, else `0`
    IsZero {
        /// Destination signal
        dst: usize,
        /// Source signal
        src: usize,
    },
    /// Fail unless `a == b`
    AssertEq {
        /// Left operand
        a: usize,
        /// Right operand
        b: usize,
    },
    /// `dst` = bit `bit` of the canonical value of `src`
    Bit {
        /// Destination signal
        dst: usize,
        /// Source signal
        src: usize,
        /// Bit position, least significant first
        bit: usize,
    },
}

impl Instruction {
    /// Signal written by this instruction, if any
    pub fn destination(&self) -> Option<usize> {
        match *self {
            Instruction::Const { dst, .. }
            | Instruction::Copy { dst, .. }
            | Instruction::Add { dst, .. }
            | Instruction::Sub { dst, .. }
            | Instruction::Mul { dst, .. }
            | Instruction::Div { dst, .. }
            | Instruction::Neg { dst, .. }
            | Instruction::IsZero { dst, .. }
            | Instruction::Bit { dst, .. } => Some(dst),
            Instruction::AssertEq { .. } => None,
        }
    }

    /// Signals read by this instruction
    pub fn operands(&self) -> Vec<usize> {
        match *self {
            Instruction::Const { .. } => vec![],
            Instruction::Copy { src, .. }
            | Instruction::Neg { src, .. }
            | Instruction::IsZero { src, .. }
            | Instruction::Bit { src, .. } => vec![src],
            Instruction::Add { a, b, .. }
            | Instruction::Sub { a, b, .. }
            | Instruction::Mul { a, b, .. }
            | Instruction::Div { a, b, .. }
            | Instruction::AssertEq { a, b } => vec![a, b],
        }
    }

    /// Rewrite every signal index through `f`
    pub fn map_signals(self, f: impl Fn(usize) -> usize) -> Self {
        match self {
            Instruction::Const { dst, index } => Instruction::Const { dst: f(dst), index },
            Instruction::Copy { dst, src } => Instruction::Copy { dst: f(dst), src: f(src) },
            Instruction::Add { dst, a, b } => Instruction::Add {
                dst: f(dst),
                a: f(a),
                b: f(b),
            },
            Instruction::Sub { dst, a, b } => Instruction::Sub {
                dst: f(dst),
                a: f(a),
                b: f(b),
            },
            Instruction::Mul { dst, a, b } => Instruction::Mul {
                dst: f(dst),
                a: f(a),
                b: f(b),
            },
            Instruction::Div { dst, a, b } => Instruction::Div {
                dst: f(dst),
                a: f(a),
                b: f(b),
            },
            Instruction::Neg { dst, src } => Instruction::Neg { dst: f(dst), src: f(src) },
            Instruction::IsZero { dst, src } => Instruction::IsZero { dst: f(dst), src: f(src) },
            Instruction::AssertEq { a, b } => Instruction::AssertEq { a: f(a), b: f(b) },
            Instruction::Bit { dst, src, bit } => Instruction::Bit {
                dst: f(dst),
                src: f(src),
                bit,
            },
        }
    }

    fn encode(&self) -> (u8, usize, usize, usize) {
        match *self {
            Instruction::Const { dst, index } => (opcode::CONST, dst, index, 0),
            Instruction::Copy { dst, src } => (opcode::COPY, dst, src, 0),
            Instruction::Add { dst, a, b } => (opcode::ADD, dst, a, b),
            Instruction::Sub { dst, a, b } => (opcode::SUB, dst, a, b),
            Instruction::Mul { dst, a, b } => (opcode::MUL, dst, a, b),
            Instruction::Div { dst, a, b } => (opcode::DIV, dst, a, b),
            Instruction::Neg { dst, src } => (opcode::NEG, dst, src, 0),
            Instruction::IsZero { dst, src } => (opcode::ISZERO, dst, src, 0),
            Instruction::AssertEq { a, b } => (opcode::ASSERT_EQ, 0, a, b),
            Instruction::Bit { dst, src, bit } => (opcode::BIT, dst, src, bit),
        }
    }

    fn decode(op: u8, dst: usize, a: usize, b: usize) -> Option<Self> {
        Some(match op {
            opcode::CONST => Instruction::Const { dst, index: a },
            opcode::COPY => Instruction::Copy { dst, src: a },
            opcode::ADD => Instruction::Add { dst, a, b },
            opcode::SUB => Instruction::Sub { dst, a, b },
            opcode::MUL => Instruction::Mul { dst, a, b },
            opcode::DIV => Instruction::Div { dst, a, b },
            opcode::NEG => Instruction::Neg { dst, src: a },
            opcode::ISZERO => Instruction::IsZero { dst, src: a },
            opcode::ASSERT_EQ => Instruction::AssertEq { a, b },
            opcode::BIT => Instruction::Bit { dst, src: a, bit: b },
            _ => return None,
        })
    }
}

/// Named, contiguous run of signals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalRange {
    /// Signal name as it appears in input JSON
    pub name: String,
    /// First signal index
    pub offset: usize,
    /// Number of signals (1 for scalars)
    pub len: usize,
}

impl SignalRange {
    /// Create a range
    pub fn new(name: impl Into<String>, offset: usize, len: usize) -> Self {
        Self {
            name: name.into(),
            offset,
            len,
        }
    }

    /// Signal indices covered
    pub fn indices(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Magic, version and field prime; returns `(n8, prime)`
fn read_preamble<R: Read>(reader: &mut R) -> Result<(usize, Vec<u8>), WitnessError> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(io_error)?;
    if magic != MAGIC {
        return Err(malformed(format!("bad magic {magic:?}")));
    }
    let version = reader.read_u32::<LittleEndian>().map_err(io_error)?;
    if version != VERSION {
        return Err(malformed(format!("unsupported version {version}")));
    }

    let n8 = reader.read_u32::<LittleEndian>().map_err(io_error)? as usize;
    if n8 == 0 || n8 % 8 != 0 || n8 > 1024 {
        return Err(malformed(format!("invalid field size {n8}")));
    }
    let mut prime = vec![0u8; n8];
    reader.read_exact(&mut prime).map_err(io_error)?;
    Ok((n8, prime))
}

/// Curve a program was compiled for, read from its header only.
pub fn read_program_curve<R: Read>(reader: &mut R) -> Result<Option<Curve>, WitnessError> {
    let (_, prime) = read_preamble(reader)?;
    Ok(Curve::from_prime_le(&prime))
}

/// A compiled witness program over `F`
#[derive(Debug, Clone, PartialEq)]
pub struct WitnessProgram<F: FieldLike> {
    /// Total number of signals, including the constant one
    pub num_signals: usize,
    /// Named input ranges
    pub inputs: Vec<SignalRange>,
    /// Named output ranges
    pub outputs: Vec<SignalRange>,
    /// Constant pool
    pub constants: Vec<F>,
    /// Instructions in evaluation order
    pub instructions: Vec<Instruction>,
}

/// Caps checked against a program header before anything is allocated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramLimits {
    /// Maximum number of signals accepted
    pub max_signals: usize,
    /// Exact signal count required, when the constraint system is known
    pub expected_signals: Option<usize>,
}

impl Default for ProgramLimits {
    fn default() -> Self {
        Self {
            max_signals: DEFAULT_MAX_SIGNALS,
            expected_signals: None,
        }
    }
}

impl ProgramLimits {
    /// Accept only programs with exactly `num_signals` signals
    pub fn expecting(num_signals: usize) -> Self {
        Self {
            max_signals: num_signals,
            expected_signals: Some(num_signals),
        }
    }

    fn check(&self, num_signals: usize) -> Result<(), WitnessError> {
        if let Some(expected) = self.expected_signals.filter(|&n| n != num_signals) {
            return Err(WitnessError::SignalCountMismatch {
                expected,
                found: num_signals,
            });
        }
        if num_signals > self.max_signals {
            return Err(WitnessError::ResourceLimit {
                what: "signals",
                requested: num_signals as u64,
                limit: self.max_signals as u64,
            });
        }
        Ok(())
    }
}

fn malformed(msg: impl Into<String>) -> WitnessError {
    WitnessError::MalformedProgram(msg.into())
}

fn io_error(err: io::Error) -> WitnessError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        malformed("unexpected end of data")
    } else {
        WitnessError::Io(err)
    }
}

fn to_u32(value: usize, what: &str) -> Result<u32, WitnessError> {
    u32::try_from(value).map_err(|_| malformed(format!("{what} {value} does not fit in u32")))
}

impl<F: FieldLike> WitnessProgram<F> {
    /// Input range with the given name
    pub fn input(&self, name: &str) -> Option<&SignalRange> {
        self.inputs.iter().find(|r| r.name == name)
    }

    /// Output range with the given name
    pub fn output(&self, name: &str) -> Option<&SignalRange> {
        self.outputs.iter().find(|r| r.name == name)
    }

    /// Structural checks shared by the decoder and the builder.
    pub fn validate(&self) -> Result<(), WitnessError> {
        if self.num_signals == 0 {
            return Err(malformed("a program needs at least the constant signal"));
        }

        let mut claimed = vec![false; self.num_signals];
        for range in &self.inputs {
            if range.offset == 0 || range.offset + range.len > self.num_signals {
                return Err(malformed(format!("input `{}` is out of range", range.name)));
            }
            for index in range.indices() {
                if std::mem::replace(&mut claimed[index], true) {
                    return Err(malformed(format!("input `{}` overlaps another input", range.name)));
                }
            }
        }
        for range in &self.outputs {
            if range.offset + range.len > self.num_signals {
                return Err(malformed(format!("output `{}` is out of range", range.name)));
            }
        }

        for (position, instruction) in self.instructions.iter().enumerate() {
            let signals = instruction.destination().into_iter().chain(instruction.operands());
            for signal in signals {
                if signal >= self.num_signals {
                    return Err(malformed(format!(
                        "instruction {position} references signal {signal} of {}",
                        self.num_signals
                    )));
                }
            }
            match *instruction {
                Instruction::Const { index, .. } if index >= self.constants.len() => {
                    return Err(malformed(format!(
                        "instruction {position} references constant {index} of {}",
                        self.constants.len()
                    )));
                }
                Instruction::Bit { bit, .. } if bit >= MAX_BIT_INDEX as usize => {
                    return Err(malformed(format!("instruction {position} extracts bit {bit}")));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Decode and validate a program under the default limits.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, WitnessError> {
        Self::read_with_limits(reader, &ProgramLimits::default())
    }

    /// Decode and validate a program, rejecting a header that exceeds `limits`.
    pub fn read_with_limits<R: Read>(reader: &mut R, limits: &ProgramLimits) -> Result<Self, WitnessError> {
        let (n8, prime) = read_preamble(reader)?;
        if n8 != F::byte_len() || prime != F::modulus_le_bytes() {
            return Err(WitnessError::FieldMismatch {
                expected: F::CURVE,
                found: Curve::from_prime_le(&prime),
            });
        }

        let num_signals = reader.read_u32::<LittleEndian>().map_err(io_error)? as usize;
        limits.check(num_signals)?;
        let inputs = read_ranges(reader)?;
        let outputs = read_ranges(reader)?;

        let n_constants = reader.read_u32::<LittleEndian>().map_err(io_error)?;
        let mut constants = Vec::with_capacity(n_constants.min(1 << 16) as usize);
        for index in 0..n_constants {
            let value = read_element::<F, _>(reader, n8).map_err(|err| match err {
                FieldError::Io(io) => io_error(io),
                _ => malformed(format!("constant {index} is not canonical")),
            })?;
            constants.push(value);
        }

        let n_instructions = reader.read_u32::<LittleEndian>().map_err(io_error)?;
        let mut instructions = Vec::with_capacity(n_instructions.min(1 << 20) as usize);
        for position in 0..n_instructions {
            let op = reader.read_u8().map_err(io_error)?;
            let dst = reader.read_u32::<LittleEndian>().map_err(io_error)? as usize;
            let a = reader.read_u32::<LittleEndian>().map_err(io_error)? as usize;
            let b = reader.read_u32::<LittleEndian>().map_err(io_error)? as usize;
            let instruction = Instruction::decode(op, dst, a, b)
                .ok_or_else(|| malformed(format!("unknown opcode {op:#04x} at instruction {position}")))?;
            instructions.push(instruction);
        }

        let program = Self {
            num_signals,
            inputs,
            outputs,
            constants,
            instructions,
        };
        program.validate()?;
        debug!(
            signals = program.num_signals,
            instructions = program.instructions.len(),
            constants = program.constants.len(),
            "decoded witness program"
        );
        Ok(program)
    }

    /// Encode the program.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), WitnessError> {
        let n8 = F::byte_len();
        writer.write_all(&MAGIC)?;
        writer.write_u32::<LittleEndian>(VERSION)?;
        writer.write_u32::<LittleEndian>(n8 as u32)?;
        writer.write_all(&F::modulus_le_bytes())?;
        writer.write_u32::<LittleEndian>(to_u32(self.num_signals, "signal count")?)?;
        write_ranges(writer, &self.inputs)?;
        write_ranges(writer, &self.outputs)?;

        writer.write_u32::<LittleEndian>(to_u32(self.constants.len(), "constant count")?)?;
        for constant in &self.constants {
            write_element(writer, constant, n8).map_err(|err| match err {
                FieldError::Io(io) => WitnessError::Io(io),
                other => malformed(other.to_string()),
            })?;
        }

        writer.write_u32::<LittleEndian>(to_u32(self.instructions.len(), "instruction count")?)?;
        for instruction in &self.instructions {
            let (op, dst, a, b) = instruction.encode();
            writer.write_u8(op)?;
            writer.write_u32::<LittleEndian>(to_u32(dst, "signal")?)?;
            writer.write_u32::<LittleEndian>(to_u32(a, "operand")?)?;
            writer.write_u32::<LittleEndian>(to_u32(b, "operand")?)?;
        }
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WitnessError> {
        let mut bytes = Vec::new();
        self.write_to(&mut bytes)?;
        Ok(bytes)
    }

    /// Read a program file under the default limits.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, WitnessError> {
        Self::load_with_limits(path, &ProgramLimits::default())
    }

    /// Read a program file, rejecting a header that exceeds `limits`.
    pub fn load_with_limits<P: AsRef<Path>>(path: P, limits: &ProgramLimits) -> Result<Self, WitnessError> {
        let file = File::open(path.as_ref())?;
        Self::read_with_limits(&mut BufReader::new(file), limits)
    }

    /// Write a program file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), WitnessError> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

fn read_ranges<R: Read>(reader: &mut R) -> Result<Vec<SignalRange>, WitnessError> {
    let count = reader.read_u32::<LittleEndian>().map_err(io_error)?;
    let mut ranges = Vec::with_capacity(count.min(1 << 10) as usize);
    for _ in 0..count {
        let name_len = reader.read_u32::<LittleEndian>().map_err(io_error)?;
        if name_len > MAX_NAME_LEN {
            return Err(malformed(format!("signal name of {name_len} bytes")));
        }
        let mut name = vec![0u8; name_len as usize];
        reader.read_exact(&mut name).map_err(io_error)?;
        let name = String::from_utf8(name).map_err(|_| malformed("signal name is not valid UTF-8"))?;
        let offset = reader.read_u32::<LittleEndian>().map_err(io_error)? as usize;
        let len = reader.read_u32::<LittleEndian>().map_err(io_error)? as usize;
        ranges.push(SignalRange { name, offset, len });
    }
    Ok(ranges)
}

fn write_ranges<W: Write>(writer: &mut W, ranges: &[SignalRange]) -> Result<(), WitnessError> {
    writer.write_u32::<LittleEndian>(to_u32(ranges.len(), "range count")?)?;
    for range in ranges {
        writer.write_u32::<LittleEndian>(to_u32(range.name.len(), "name length")?)?;
        writer.write_all(range.name.as_bytes())?;
        writer.write_u32::<LittleEndian>(to_u32(range.offset, "offset")?)?;
        writer.write_u32::<LittleEndian>(to_u32(range.len, "length")?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use groth16_field::{Bls12381Fr, F};
    use std::io::Cursor;

    /// out = a * b + 3 over signals [1, out, a, b, ab, three]
    fn sample() -> WitnessProgram<F> {
        WitnessProgram {
            num_signals: 6,
            inputs: vec![SignalRange::new("a", 2, 1), SignalRange::new("b", 3, 1)],
            outputs: vec![SignalRange::new("out", 1, 1)],
            constants: vec![F::from(3u64)],
            instructions: vec![
                Instruction::Mul { dst: 4, a: 2, b: 3 },
                Instruction::Const { dst: 5, index: 0 },
                Instruction::Add { dst: 1, a: 4, b: 5 },
            ],
        }
    }

    fn decode(bytes: Vec<u8>) -> Result<WitnessProgram<F>, WitnessError> {
        WitnessProgram::read_from(&mut Cursor::new(bytes))
    }

    #[test]
    fn test_encode_decode() {
        let program = sample();
        let decoded = decode(program.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, program);
        assert_eq!(decoded.input("b"), Some(&SignalRange::new("b", 3, 1)));
        assert_eq!(decoded.output("out").map(SignalRange::indices), Some(1..2));
        assert!(decoded.input("c").is_none());
    }

    #[test]
    fn test_rejects_bad_header() {
        let mut bytes = sample().to_bytes().unwrap();
        bytes[0] = b'x';
        assert!(matches!(decode(bytes), Err(WitnessError::MalformedProgram(_))));

        let mut bytes = sample().to_bytes().unwrap();
        bytes[4] = 9;
        assert!(matches!(decode(bytes), Err(WitnessError::MalformedProgram(_))));
    }

    #[test]
    fn test_reads_curve_from_header() {
        let bytes = sample().to_bytes().unwrap();
        assert_eq!(read_program_curve(&mut Cursor::new(&bytes[..])).unwrap(), Some(Curve::Bn254));
        assert!(read_program_curve(&mut Cursor::new(&bytes[..10])).is_err());
    }

    #[test]
    fn test_rejects_truncation() {
        let bytes = sample().to_bytes().unwrap();
        for cut in [3, 20, bytes.len() - 1] {
            let result = decode(bytes[..cut].to_vec());
            assert!(matches!(result, Err(WitnessError::MalformedProgram(_))), "cut at {cut}");
        }
    }

    #[test]
    fn test_rejects_unknown_opcode() {
        let mut bytes = sample().to_bytes().unwrap();
        // Last instruction starts 13 bytes from the end.
        let at = bytes.len() - 13;
        bytes[at] = 0xee;
        let err = decode(bytes).unwrap_err();
        assert!(err.to_string().contains("unknown opcode"), "{err}");
    }

    #[test]
    fn test_rejects_out_of_range_references() {
        let mut program = sample();
        program.instructions.push(Instruction::Copy { dst: 9, src: 1 });
        assert!(program.validate().is_err());

        let mut program = sample();
        program.instructions.push(Instruction::Const { dst: 5, index: 4 });
        assert!(program.validate().is_err());

        let mut program = sample();
        program.inputs.push(SignalRange::new("c", 3, 2));
        assert!(program.validate().is_err());

        let mut program = sample();
        program.inputs.push(SignalRange::new("one", 0, 1));
        assert!(program.validate().is_err());
    }

    #[test]
    fn test_field_mismatch() {
        let bytes = sample().to_bytes().unwrap();
        let result = WitnessProgram::<Bls12381Fr>::read_from(&mut Cursor::new(bytes));
        assert!(matches!(
            result,
            Err(WitnessError::FieldMismatch {
                expected: Curve::Bls12_381,
                found: Some(Curve::Bn254)
            })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.wasm");
        sample().save(&path).unwrap();
        assert_eq!(WitnessProgram::<F>::load(&path).unwrap(), sample());
    }

    /// Header followed by nothing but a signal count
    fn header_with_signals(num_signals: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC);
        bytes.write_u32::<LittleEndian>(VERSION).unwrap();
        bytes.write_u32::<LittleEndian>(F::byte_len() as u32).unwrap();
        bytes.extend_from_slice(&F::modulus_le_bytes());
        bytes.write_u32::<LittleEndian>(num_signals).unwrap();
        bytes
    }

    #[test]
    fn test_signal_limit_checked_before_allocation() {
        let err = decode(header_with_signals(u32::MAX)).unwrap_err();
        assert!(
            matches!(
                err,
                WitnessError::ResourceLimit {
                    what: "signals",
                    requested,
                    limit,
                } if requested == u32::MAX as u64 && limit == DEFAULT_MAX_SIGNALS as u64
            ),
            "{err}"
        );

        // within the limit, the short body is what fails
        let err = decode(header_with_signals(6)).unwrap_err();
        assert!(matches!(err, WitnessError::MalformedProgram(_)), "{err}");

        let tight = ProgramLimits {
            max_signals: 5,
            expected_signals: None,
        };
        let bytes = sample().to_bytes().unwrap();
        assert!(matches!(
            WitnessProgram::<F>::read_with_limits(&mut Cursor::new(&bytes), &tight),
            Err(WitnessError::ResourceLimit { requested: 6, limit: 5, .. })
        ));
    }

    #[test]
    fn test_expected_signal_count() {
        let bytes = sample().to_bytes().unwrap();
        let exact = WitnessProgram::<F>::read_with_limits(&mut Cursor::new(&bytes), &ProgramLimits::expecting(6)).unwrap();
        assert_eq!(exact, sample());

        let err = WitnessProgram::<F>::read_with_limits(&mut Cursor::new(&bytes), &ProgramLimits::expecting(4)).unwrap_err();
        assert!(matches!(err, WitnessError::SignalCountMismatch { expected: 4, found: 6 }));

        // a huge header against a small circuit never reaches the allocator
        let err = WitnessProgram::<F>::read_with_limits(
            &mut Cursor::new(header_with_signals(u32::MAX)),
            &ProgramLimits::expecting(6),
        )
        .unwrap_err();
        assert!(matches!(err, WitnessError::SignalCountMismatch { expected: 6, .. }));
    }
}
