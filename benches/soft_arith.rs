//! Criterion micro-benchmarks for soft float, wide division and the heap.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use minirt::hw::{HardwareUnit, RegisterMap, SimulatedBus};
use minirt::{float, wide, Heap, HeapArena};

// 1.1, 3.3 and a subnormal.
const OPERANDS: [u32; 3] = [0x3F8C_CCCD, 0x4053_3333, 0x0000_1234];

fn bench_float(c: &mut Criterion) {
    c.bench_function("float_add", |b| {
        b.iter(|| float::add(black_box(OPERANDS[0]), black_box(OPERANDS[1])))
    });
    c.bench_function("float_mul", |b| {
        b.iter(|| float::mul(black_box(OPERANDS[0]), black_box(OPERANDS[1])))
    });
    c.bench_function("float_mul_subnormal", |b| {
        b.iter(|| float::mul(black_box(OPERANDS[2]), black_box(OPERANDS[1])))
    });
    c.bench_function("float_div", |b| {
        b.iter(|| float::div(black_box(OPERANDS[0]), black_box(OPERANDS[1])))
    });

    let unit = HardwareUnit::new(SimulatedBus::new(RegisterMap::default(), 2));
    c.bench_function("float_mul_simulated_unit", |b| {
        b.iter(|| float::mul_with(&unit, black_box(OPERANDS[0]), black_box(OPERANDS[1])))
    });
}

fn bench_wide(c: &mut Criterion) {
    c.bench_function("udivmod32", |b| {
        b.iter(|| wide::udivmod32(black_box(0xDEAD_BEEF), black_box(12_345)))
    });
    c.bench_function("udivmod64", |b| {
        b.iter(|| wide::udivmod64(black_box(0xDEAD_BEEF_CAFE_F00D), black_box(0x1234_5678)))
    });
    c.bench_function("mul64_software", |b| {
        b.iter(|| {
            wide::mul64(
                &wide::SoftwareUnit,
                black_box(0x0123_4567_89AB_CDEF),
                black_box(0xFEDC_BA98),
            )
        })
    });
}

fn bench_heap(c: &mut Criterion) {
    c.bench_function("heap_allocate_free_64", |b| {
        let mut heap = Heap::new(HeapArena::new(256 * 1024));
        let mut ptrs = Vec::with_capacity(64);
        b.iter(|| {
            for i in 0..64u32 {
                ptrs.push(heap.allocate(black_box(16 + i * 8)));
            }
            for ptr in ptrs.drain(..).rev() {
                heap.free(ptr);
            }
        })
    });
}

criterion_group!(benches, bench_float, bench_wide, bench_heap);
criterion_main!(benches);
