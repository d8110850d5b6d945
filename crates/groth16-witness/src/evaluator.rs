//! Single-pass evaluation of a witness program.

use crate::{program::Instruction, InputAssignment, WitnessError, WitnessProgram};
use ark_ff::{BigInteger, PrimeField};
use groth16_field::FieldLike;
use groth16_r1cs::Witness;
use tracing::{debug, instrument};

/// Runs a [`WitnessProgram`] against named inputs
#[derive(Debug, Clone)]
pub struct WitnessCalculator<F: FieldLike> {
    program: WitnessProgram<F>,
}

struct Signals<F: FieldLike> {
    values: Vec<Option<F>>,
}

impl<F: FieldLike> Signals<F> {
    fn read(&self, signal: usize, instruction: usize) -> Result<F, WitnessError> {
        self.values[signal].ok_or(WitnessError::UnassignedSignal { instruction, signal })
    }

    fn write(&mut self, signal: usize, value: F, instruction: usize) -> Result<(), WitnessError> {
        match self.values[signal].replace(value) {
            Some(_) => Err(WitnessError::SignalReassigned { instruction, signal }),
            None => Ok(()),
        }
    }
}

impl<F: FieldLike> WitnessCalculator<F> {
    /// Wrap a validated program
    pub fn new(program: WitnessProgram<F>) -> Result<Self, WitnessError> {
        program.validate()?;
        Ok(Self { program })
    }

    /// The wrapped program
    pub fn program(&self) -> &WitnessProgram<F> {
        &self.program
    }

    /// Compute the full witness.
    ///
    /// Signal 0 is fixed to one, inputs are copied to their declared ranges
    /// and the instructions run once in order. Every signal must end up
    /// assigned exactly once.
    #[instrument(skip_all, fields(signals = self.program.num_signals))]
    pub fn calculate(&self, inputs: &InputAssignment<F>) -> Result<Witness<F>, WitnessError> {
        inputs.check_against(&self.program)?;

        let mut signals = Signals {
            values: vec![None; self.program.num_signals],
        };
        signals.values[0] = Some(<F as FieldLike>::one());

        for range in &self.program.inputs {
            let values = inputs
                .get(&range.name)
                .ok_or_else(|| WitnessError::UnassignedInputSignal(range.name.clone()))?;
            for (index, value) in range.indices().zip(values) {
                signals.values[index] = Some(*value);
            }
        }

        for (position, instruction) in self.program.instructions.iter().enumerate() {
            self.step(&mut signals, position, instruction)?;
        }

        let values = signals
            .values
            .into_iter()
            .enumerate()
            .map(|(index, value)| value.ok_or(WitnessError::IncompleteWitness(index)))
            .collect::<Result<Vec<F>, _>>()?;

        debug!(instructions = self.program.instructions.len(), "witness computed");
        Witness::new(values).map_err(|_| WitnessError::IncompleteWitness(0))
    }

    fn step(&self, signals: &mut Signals<F>, position: usize, instruction: &Instruction) -> Result<(), WitnessError> {
        let value = match *instruction {
            Instruction::Const { index, .. } => self.program.constants[index],
            Instruction::Copy { src, .. } => signals.read(src, position)?,
            Instruction::Add { a, b, .. } => signals.read(a, position)? + signals.read(b, position)?,
            Instruction::Sub { a, b, .. } => signals.read(a, position)? - signals.read(b, position)?,
            Instruction::Mul { a, b, .. } => signals.read(a, position)? * signals.read(b, position)?,
            Instruction::Div { a, b, .. } => {
                let divisor = <F as FieldLike>::inverse(&signals.read(b, position)?)
                    .ok_or(WitnessError::DivisionByZero { instruction: position })?;
                signals.read(a, position)? * divisor
            }
            Instruction::Neg { src, .. } => -signals.read(src, position)?,
            Instruction::IsZero { src, .. } => {
                if <F as FieldLike>::is_zero(&signals.read(src, position)?) {
                    <F as FieldLike>::one()
                } else {
                    <F as FieldLike>::zero()
                }
            }
            Instruction::Bit { src, bit, .. } => {
                let value = signals.read(src, position)?.into_bigint();
                if bit < value.num_bits() as usize && value.get_bit(bit) {
                    <F as FieldLike>::one()
                } else {
                    <F as FieldLike>::zero()
                }
            }
            Instruction::AssertEq { a, b } => {
                if signals.read(a, position)? != signals.read(b, position)? {
                    return Err(WitnessError::AssertionFailed { instruction: position });
                }
                return Ok(());
            }
        };

        match instruction.destination() {
            Some(dst) => signals.write(dst, value, position),
            None => Ok(()),
        }
    }

    /// Values of a named output in `witness`
    pub fn output<'w>(&self, witness: &'w Witness<F>, name: &str) -> Option<&'w [F]> {
        let range = self.program.output(name)?;
        witness.values().get(range.indices())
    }
}
