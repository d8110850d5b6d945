//! AND gate walkthrough: witness, setup, proof and verification in-process.

use anyhow::{ensure, Result};
use ark_bn254::Bn254;
use groth16_core::{create_proof, prepare_verifying_key, verify_proof};
use groth16_examples::and_gate;
use groth16_field::F;
use groth16_setup::{generate_parameters, seeded_rng};
use groth16_witness::{InputAssignment, WitnessCalculator};

fn main() -> Result<()> {
    println!("Groth16 AND gate example");
    println!("========================\n");

    let circuit = and_gate::<F>();
    let cs = &circuit.constraint_system;
    println!(
        "{}: {} signals, {} constraints",
        circuit.name,
        cs.num_signals,
        cs.num_constraints()
    );

    let mut rng = seeded_rng(Some(2024));
    let pk = generate_parameters::<Bn254, _>(cs, &mut rng)?;
    let pvk = prepare_verifying_key(&pk.vk);
    let calc = WitnessCalculator::new(circuit.program.clone())?;

    for (a, b) in [(0u8, 0u8), (0, 1), (1, 0), (1, 1)] {
        let inputs = InputAssignment::from_json_str(&format!(r#"{{"a": {a}, "b": {b}}}"#))?;
        let witness = calc.calculate(&inputs)?;
        let (proof, public) = create_proof(&pk, cs, witness.values(), &mut rng)?;
        let valid = verify_proof(&pvk, &proof, &public)?;
        ensure!(valid, "proof for {a} AND {b} did not verify");
        println!("{a} AND {b} = {}  (proof verified)", public[0]);
    }

    Ok(())
}
