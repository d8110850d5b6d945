//! Per-stage pipeline benchmarks over BN254.

use ark_bn254::{Bn254, Fr, G1Projective};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use groth16_benchmarks::{msm_inputs, power_chain, r1cs_bytes, SIZES};
use groth16_core::msm::msm;
use groth16_core::{create_proof, prepare_verifying_key, verify_proof};
use groth16_qap::QAP;
use groth16_r1cs::{read_r1cs, LoadOptions};
use groth16_setup::{generate_parameters, seeded_rng};
use groth16_witness::WitnessCalculator;
use std::io::Cursor;

fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_r1cs");
    for rows in SIZES {
        let bytes = r1cs_bytes(&power_chain::<Fr>(rows).cs);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &bytes, |b, bytes| {
            b.iter(|| read_r1cs::<Fr, _>(&mut Cursor::new(bytes), &LoadOptions::default()).unwrap())
        });
    }
    group.finish();
}

fn bench_witness(c: &mut Criterion) {
    let mut group = c.benchmark_group("witness");
    for rows in SIZES {
        let workload = power_chain::<Fr>(rows);
        let calculator = WitnessCalculator::new(workload.program).unwrap();
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &workload.inputs, |b, inputs| {
            b.iter(|| calculator.calculate(inputs).unwrap())
        });
    }
    group.finish();
}

fn bench_witness_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("qap_witness_map");
    for rows in SIZES {
        let workload = power_chain::<Fr>(rows);
        let witness = WitnessCalculator::new(workload.program).unwrap().calculate(&workload.inputs).unwrap();
        let qap = QAP::new(&workload.cs).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(rows), witness.values(), |b, z| {
            b.iter(|| qap.witness_map(z).unwrap())
        });
    }
    group.finish();
}

fn bench_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("setup");
    group.sample_size(10);
    for rows in SIZES {
        let workload = power_chain::<Fr>(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &workload.cs, |b, cs| {
            let mut rng = seeded_rng(Some(1));
            b.iter(|| generate_parameters::<Bn254, _>(cs, &mut rng).unwrap())
        });
    }
    group.finish();
}

fn bench_prove_verify(c: &mut Criterion) {
    let mut prove = c.benchmark_group("prove");
    prove.sample_size(10);
    let mut fixtures = Vec::new();
    for rows in SIZES {
        let workload = power_chain::<Fr>(rows);
        let witness = WitnessCalculator::new(workload.program).unwrap().calculate(&workload.inputs).unwrap();
        let mut rng = seeded_rng(Some(2));
        let pk = generate_parameters::<Bn254, _>(&workload.cs, &mut rng).unwrap();
        prove.bench_function(BenchmarkId::from_parameter(rows), |b| {
            b.iter(|| create_proof(&pk, &workload.cs, witness.values(), &mut rng).unwrap())
        });
        let (proof, public) = create_proof(&pk, &workload.cs, witness.values(), &mut rng).unwrap();
        fixtures.push((rows, prepare_verifying_key(&pk.vk), proof, public));
    }
    prove.finish();

    let mut verify = c.benchmark_group("verify");
    for (rows, pvk, proof, public) in &fixtures {
        verify.bench_function(BenchmarkId::from_parameter(rows), |b| {
            b.iter(|| assert!(verify_proof(pvk, proof, public).unwrap()))
        });
    }
    verify.finish();
}

fn bench_msm(c: &mut Criterion) {
    let mut group = c.benchmark_group("msm_g1");
    group.sample_size(10);
    for exp in [10, 14] {
        let n = 1usize << exp;
        let (bases, scalars) = msm_inputs(n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(BenchmarkId::new("msm", format!("2^{exp}")), |b| {
            b.iter(|| msm::<G1Projective>(&bases, &scalars).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_load,
    bench_witness,
    bench_witness_map,
    bench_setup,
    bench_prove_verify,
    bench_msm
);
criterion_main!(benches);
