//! Witness generation for the Groth16 pipeline.
//!
//! A circuit ships as two artifacts: the constraint system (`.r1cs`) and a
//! compiled [`WitnessProgram`] that computes every signal from the named
//! inputs. This crate holds the program format, the JSON input parser,
//! the [`WitnessCalculator`] that runs a program, the [`CircuitBuilder`]
//! used to emit both artifacts from one description, and the circom
//! `.wtns` export.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use groth16_field::Curve;

pub mod builder;
pub mod evaluator;
pub mod input;
pub mod program;
pub mod wtns;

pub use builder::CircuitBuilder;
pub use evaluator::WitnessCalculator;
pub use input::InputAssignment;
pub use program::{read_program_curve, Instruction, ProgramLimits, SignalRange, WitnessProgram};
pub use wtns::{read_wtns, write_wtns};

/// Errors raised while loading programs, parsing inputs or evaluating
#[derive(Debug, thiserror::Error)]
pub enum WitnessError {
    /// Program bytes are not a valid witness program
    #[error("malformed witness program: {0}")]
    MalformedProgram(String),

    /// `.wtns` bytes are not a valid witness file
    #[error("malformed witness file: {0}")]
    MalformedWitnessFile(String),

    /// Artifact prime does not match the field being evaluated in
    #[error("artifact field {found:?} does not match {expected}")]
    FieldMismatch {
        /// Field requested by the caller
        expected: Curve,
        /// Field the artifact was compiled for, if recognised
        found: Option<Curve>,
    },

    /// Input document is not a JSON object
    #[error("invalid input JSON: {0}")]
    InvalidInputJson(String),

    /// A declared input has no value
    #[error("input signal `{0}` is not assigned")]
    UnassignedInputSignal(String),

    /// The input document names a signal the program does not declare
    #[error("unknown input signal `{0}`")]
    UnknownInputSignal(String),

    /// An input array has the wrong number of elements
    #[error("input signal `{name}` expects {expected} values, got {actual}")]
    InputLengthMismatch {
        /// Input name
        name: String,
        /// Declared length
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// A value is not an integer literal
    #[error("invalid literal `{literal}` for input `{name}`")]
    InvalidLiteral {
        /// Input name
        name: String,
        /// Offending text
        literal: String,
    },

    /// A literal's magnitude is not below the field modulus
    #[error("literal `{literal}` for input `{name}` is out of the field range")]
    FieldElementOutOfRange {
        /// Input name
        name: String,
        /// Offending text
        literal: String,
    },

    /// An instruction read a signal nothing has written yet
    #[error("instruction {instruction} reads unassigned signal {signal}")]
    UnassignedSignal {
        /// Instruction position
        instruction: usize,
        /// Signal index
        signal: usize,
    },

    /// An instruction wrote a signal that already had a value
    #[error("instruction {instruction} reassigns signal {signal}")]
    SignalReassigned {
        /// Instruction position
        instruction: usize,
        /// Signal index
        signal: usize,
    },

    /// Division by a zero-valued signal
    #[error("instruction {instruction} divides by zero")]
    DivisionByZero {
        /// Instruction position
        instruction: usize,
    },

    /// An in-program equality assertion failed
    #[error("assertion at instruction {instruction} failed")]
    AssertionFailed {
        /// Instruction position
        instruction: usize,
    },

    /// A signal was still unassigned after the last instruction
    #[error("signal {0} left unassigned after evaluation")]
    IncompleteWitness(usize),

    /// The program header asks for more than the configured limit
    #[error("witness program exceeds resource limit: {what} = {requested} (limit {limit})")]
    ResourceLimit {
        /// Which count exceeded its limit
        what: &'static str,
        /// Requested amount
        requested: u64,
        /// Configured limit
        limit: u64,
    },

    /// The program was compiled for a circuit with another signal count
    #[error("witness program has {found} signals, expected {expected}")]
    SignalCountMismatch {
        /// Signal count of the constraint system
        expected: usize,
        /// Signal count in the program header
        found: usize,
    },

    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
