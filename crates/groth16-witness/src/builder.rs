//! Emit a constraint system and its witness program from one description.
//!
//! Every gadget pushes both the instructions that compute a signal and the
//! constraints that check it, so the two artifacts cannot drift apart.
//! Signals may be declared in any order; [`CircuitBuilder::finish`]
//! renumbers them into the circom layout
//! `[1 | public outputs | public inputs | private inputs | intermediates]`.
//! Handles returned before `finish` are only meaningful to the builder.

use crate::program::{Instruction, SignalRange, WitnessProgram};
use groth16_field::FieldLike;
use groth16_r1cs::{Constraint, ConstraintSystem, LinearCombination, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    One,
    PublicOutput,
    PublicInput,
    PrivateInput,
    Intermediate,
}

/// Builder for hand-written circuits
#[derive(Debug, Clone)]
pub struct CircuitBuilder<F: FieldLike> {
    kinds: Vec<Kind>,
    ranges: Vec<(Kind, SignalRange)>,
    constraints: Vec<Constraint<F>>,
    constants: Vec<F>,
    instructions: Vec<Instruction>,
}

impl<F: FieldLike> Default for CircuitBuilder<F> {
    fn default() -> Self {
        Self::new()
    }
}

fn lc<F: FieldLike>(var: Variable) -> LinearCombination<F> {
    LinearCombination::from_variable(var)
}

impl<F: FieldLike> CircuitBuilder<F> {
    /// Empty circuit holding only the constant signal
    pub fn new() -> Self {
        Self {
            kinds: vec![Kind::One],
            ranges: Vec::new(),
            constraints: Vec::new(),
            constants: Vec::new(),
            instructions: Vec::new(),
        }
    }

    fn alloc(&mut self, kind: Kind) -> Variable {
        let var = Variable::new(self.kinds.len());
        self.kinds.push(kind);
        var
    }

    fn declare(&mut self, kind: Kind, name: &str, len: usize) -> Vec<Variable> {
        let offset = self.kinds.len();
        let vars = (0..len).map(|_| self.alloc(kind)).collect();
        self.ranges.push((kind, SignalRange::new(name, offset, len)));
        vars
    }

    fn declare_scalar(&mut self, kind: Kind, name: &str) -> Variable {
        let var = Variable::new(self.kinds.len());
        self.declare(kind, name, 1);
        var
    }

    /// Declare a scalar public output
    pub fn public_output(&mut self, name: &str) -> Variable {
        self.declare_scalar(Kind::PublicOutput, name)
    }

    /// Declare a public output array
    pub fn public_outputs(&mut self, name: &str, len: usize) -> Vec<Variable> {
        self.declare(Kind::PublicOutput, name, len)
    }

    /// Declare a scalar public input
    pub fn public_input(&mut self, name: &str) -> Variable {
        self.declare_scalar(Kind::PublicInput, name)
    }

    /// Declare a public input array
    pub fn public_inputs(&mut self, name: &str, len: usize) -> Vec<Variable> {
        self.declare(Kind::PublicInput, name, len)
    }

    /// Declare a scalar private input
    pub fn private_input(&mut self, name: &str) -> Variable {
        self.declare_scalar(Kind::PrivateInput, name)
    }

    /// Declare a private input array
    pub fn private_inputs(&mut self, name: &str, len: usize) -> Vec<Variable> {
        self.declare(Kind::PrivateInput, name, len)
    }

    /// Number of constraints emitted so far
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    fn push_constant(&mut self, value: F) -> usize {
        match self.constants.iter().position(|c| *c == value) {
            Some(index) => index,
            None => {
                self.constants.push(value);
                self.constants.len() - 1
            }
        }
    }

    fn fresh(&mut self) -> Variable {
        self.alloc(Kind::Intermediate)
    }

    /// New signal fixed to `value`
    pub fn constant(&mut self, value: F) -> Variable {
        let dst = self.fresh();
        let index = self.push_constant(value);
        self.instructions.push(Instruction::Const { dst: dst.index(), index });
        self.constraints.push(Constraint::new(
            LinearCombination::from_constant(value),
            lc(Variable::ONE),
            lc(dst),
        ));
        dst
    }

    /// `a + b`
    pub fn add(&mut self, a: Variable, b: Variable) -> Variable {
        let dst = self.fresh();
        self.instructions.push(Instruction::Add {
            dst: dst.index(),
            a: a.index(),
            b: b.index(),
        });
        self.constraints.push(Constraint::new(lc(a) + lc(b), lc(Variable::ONE), lc(dst)));
        dst
    }

    /// `a - b`
    pub fn sub(&mut self, a: Variable, b: Variable) -> Variable {
        let dst = self.fresh();
        self.instructions.push(Instruction::Sub {
            dst: dst.index(),
            a: a.index(),
            b: b.index(),
        });
        self.constraints.push(Constraint::new(lc(a) - lc(b), lc(Variable::ONE), lc(dst)));
        dst
    }

    /// `a * b`
    pub fn mul(&mut self, a: Variable, b: Variable) -> Variable {
        let dst = self.fresh();
        self.mul_into(dst, a, b);
        dst
    }

    /// `dst <== a * b` for an already declared `dst`
    pub fn mul_into(&mut self, dst: Variable, a: Variable, b: Variable) {
        self.instructions.push(Instruction::Mul {
            dst: dst.index(),
            a: a.index(),
            b: b.index(),
        });
        self.constraints.push(Constraint::new(lc(a), lc(b), lc(dst)));
    }

    /// `a / b`; evaluation fails when `b` is zero
    pub fn div(&mut self, a: Variable, b: Variable) -> Variable {
        let dst = self.fresh();
        self.instructions.push(Instruction::Div {
            dst: dst.index(),
            a: a.index(),
            b: b.index(),
        });
        self.constraints.push(Constraint::new(lc(b), lc(dst), lc(a)));
        dst
    }

    /// `dst <== src` for an already declared `dst`
    pub fn assign(&mut self, dst: Variable, src: Variable) {
        self.instructions.push(Instruction::Copy {
            dst: dst.index(),
            src: src.index(),
        });
        self.constraints.push(Constraint::new(lc(src), lc(Variable::ONE), lc(dst)));
    }

    /// `a === b`, checked both during evaluation and by the constraints
    pub fn assert_equal(&mut self, a: Variable, b: Variable) {
        self.instructions.push(Instruction::AssertEq { a: a.index(), b: b.index() });
        self.constraints.push(Constraint::new(
            lc(a) - lc(b),
            lc(Variable::ONE),
            LinearCombination::new(),
        ));
    }

    /// `x * x === x`
    pub fn assert_boolean(&mut self, x: Variable) {
        self.constraints.push(Constraint::new(lc(x), lc(x), lc(x)));
    }

    /// 1 if `x` is zero, else 0.
    ///
    /// Uses the inverse trick: `x * inv = 1 - out` and `x * out = 0`.
    pub fn is_zero(&mut self, x: Variable) -> Variable {
        let out = self.fresh();
        self.instructions.push(Instruction::IsZero {
            dst: out.index(),
            src: x.index(),
        });

        // inv = 1 / (x + out) equals 1/x whenever x != 0 and is never a division by zero
        let shifted = self.fresh();
        self.instructions.push(Instruction::Add {
            dst: shifted.index(),
            a: x.index(),
            b: out.index(),
        });
        let inv = self.fresh();
        self.instructions.push(Instruction::Div {
            dst: inv.index(),
            a: Variable::ONE.index(),
            b: shifted.index(),
        });

        self.constraints.push(Constraint::new(lc(x), lc(inv), lc(Variable::ONE) - lc(out)));
        self.constraints.push(Constraint::new(lc(x), lc(out), LinearCombination::new()));
        out
    }

    /// Little-endian bits of `x`, constrained to recompose to `x`
    pub fn num2bits(&mut self, x: Variable, n: usize) -> Vec<Variable> {
        let mut sum = LinearCombination::new();
        let mut weight = <F as FieldLike>::one();
        let mut bits = Vec::with_capacity(n);

        for bit in 0..n {
            let b = self.fresh();
            self.instructions.push(Instruction::Bit {
                dst: b.index(),
                src: x.index(),
                bit,
            });
            self.assert_boolean(b);
            sum.add_term(b, weight);
            weight = weight + weight;
            bits.push(b);
        }

        self.constraints.push(Constraint::new(sum, lc(Variable::ONE), lc(x)));
        bits
    }

    /// 1 if `a < b`, else 0, for operands below `2^n`
    pub fn less_than(&mut self, a: Variable, b: Variable, n: usize) -> Variable {
        let mut offset = <F as FieldLike>::one();
        for _ in 0..n {
            offset = offset + offset;
        }
        let offset = self.constant(offset);
        let shifted = self.add(a, offset);
        let diff = self.sub(shifted, b);
        let bits = self.num2bits(diff, n + 1);
        self.sub(Variable::ONE, bits[n])
    }

    /// Renumber into the circom layout and return both artifacts.
    pub fn finish(self) -> (ConstraintSystem<F>, WitnessProgram<F>) {
        let mut map = vec![0usize; self.kinds.len()];
        let mut next = 1;
        for kind in [Kind::PublicOutput, Kind::PublicInput, Kind::PrivateInput, Kind::Intermediate] {
            for (provisional, _) in self.kinds.iter().enumerate().filter(|(_, k)| **k == kind) {
                map[provisional] = next;
                next += 1;
            }
        }

        let count = |kind: Kind| self.kinds.iter().filter(|k| **k == kind).count();
        let mut cs = ConstraintSystem::new(
            count(Kind::PublicOutput),
            count(Kind::PublicInput),
            count(Kind::PrivateInput),
        );
        cs.num_signals = self.kinds.len();

        let remap = |source: &LinearCombination<F>| {
            let mut out = LinearCombination::new();
            for (var, coeff) in source.iter() {
                out.add_term(Variable::new(map[var.index()]), *coeff);
            }
            out
        };
        cs.constraints = self
            .constraints
            .iter()
            .map(|c| Constraint::new(remap(&c.a), remap(&c.b), remap(&c.c)))
            .collect();

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for (kind, range) in self.ranges {
            let range = SignalRange::new(range.name, map.get(range.offset).copied().unwrap_or(next), range.len);
            match kind {
                Kind::PublicOutput => outputs.push(range),
                Kind::PublicInput | Kind::PrivateInput => inputs.push(range),
                Kind::One | Kind::Intermediate => {}
            }
        }
        inputs.sort_by_key(|r| r.offset);
        outputs.sort_by_key(|r| r.offset);

        let program = WitnessProgram {
            num_signals: self.kinds.len(),
            inputs,
            outputs,
            constants: self.constants,
            instructions: self.instructions.into_iter().map(|i| i.map_signals(|s| map[s])).collect(),
        };
        (cs, program)
    }
}
