// minirt/tests/properties.rs

//! Property tests. The soft float is checked bit for bit against the host's
//! IEEE-754 binary32 arithmetic, the integer routines against native ops.

use minirt::bits::{self, QUIET_NAN};
use minirt::hw::{HardwareUnit, RegisterMap, SimulatedBus};
use minirt::wide::{self, DivMod, MulDivUnit, SoftwareUnit};
use minirt::{float, Heap, HeapArena};
use proptest::collection::vec;
use proptest::prelude::*;

const ONE: u32 = 0x3F80_0000;

fn host(bits: u32) -> f32 {
    f32::from_bits(bits)
}

// Soft result must equal the host result, or both must be NaN.
fn same_result(soft: u32, native: f32) -> bool {
    if native.is_nan() {
        bits::is_nan(soft)
    } else {
        soft == native.to_bits()
    }
}

proptest! {
    #[test]
    fn prop_add_matches_host(a in any::<u32>(), b in any::<u32>()) {
        let soft = float::add(a, b);
        prop_assert!(same_result(soft, host(a) + host(b)), "{:#010x} + {:#010x} = {:#010x}", a, b, soft);
    }

    #[test]
    fn prop_sub_matches_host(a in any::<u32>(), b in any::<u32>()) {
        let soft = float::sub(a, b);
        prop_assert!(same_result(soft, host(a) - host(b)), "{:#010x} - {:#010x} = {:#010x}", a, b, soft);
    }

    #[test]
    fn prop_mul_matches_host(a in any::<u32>(), b in any::<u32>()) {
        let soft = float::mul(a, b);
        prop_assert!(same_result(soft, host(a) * host(b)), "{:#010x} * {:#010x} = {:#010x}", a, b, soft);
    }

    #[test]
    fn prop_div_matches_host(a in any::<u32>(), b in any::<u32>()) {
        let soft = float::div(a, b);
        prop_assert!(same_result(soft, host(a) / host(b)), "{:#010x} / {:#010x} = {:#010x}", a, b, soft);
    }

    #[test]
    fn prop_compare_matches_host(a in any::<u32>(), b in any::<u32>()) {
        prop_assert_eq!(float::compare(a, b), host(a).partial_cmp(&host(b)));
        prop_assert_eq!(float::ge(a, b), host(a) >= host(b));
        prop_assert_eq!(float::lt(a, b), host(a) < host(b));
    }

    #[test]
    fn prop_add_commutes(a in any::<u32>(), b in any::<u32>()) {
        prop_assume!(!bits::is_nan(a) && !bits::is_nan(b));
        prop_assert_eq!(float::add(a, b), float::add(b, a));
        prop_assert_eq!(float::mul(a, b), float::mul(b, a));
    }

    #[test]
    fn prop_add_negation_is_positive_zero(a in any::<u32>()) {
        prop_assume!(!bits::is_nan(a) && !bits::is_infinite(a));
        prop_assert_eq!(float::add(a, float::neg(a)), bits::POSITIVE_ZERO);
    }

    #[test]
    fn prop_mul_by_one_is_identity(x in any::<u32>()) {
        prop_assume!(!bits::is_nan(x));
        prop_assert_eq!(float::mul(ONE, x), x);
    }

    #[test]
    fn prop_divide_by_zero_is_signed_infinity(x in any::<u32>()) {
        prop_assume!(!bits::is_nan(x) && !bits::is_zero(x));
        prop_assert_eq!(float::div(x, bits::POSITIVE_ZERO), bits::infinity(bits::sign_of(x)));
        prop_assert_eq!(float::div(bits::POSITIVE_ZERO, bits::POSITIVE_ZERO), QUIET_NAN);
    }

    #[test]
    fn prop_int_to_float_matches_host(n in any::<i32>(), u in any::<u32>()) {
        prop_assert_eq!(float::from_i32(n), (n as f32).to_bits());
        prop_assert_eq!(float::from_u32(u), (u as f32).to_bits());
    }

    #[test]
    fn prop_float_to_int_matches_host(x in any::<u32>()) {
        prop_assume!(!bits::is_nan(x));
        prop_assert_eq!(float::to_i32(x), host(x) as i32);
        prop_assert_eq!(float::to_u32(x), host(x) as u32);
    }

    #[test]
    fn prop_small_int_round_trip(n in -(1i32 << 24) + 1..(1i32 << 24)) {
        prop_assert_eq!(float::to_i32(float::from_i32(n)), n);
    }

    #[test]
    fn prop_divmod32_matches_native(a in any::<u32>(), b in 1u32..) {
        prop_assert_eq!(wide::udivmod32(a, b), DivMod { quotient: a / b, remainder: a % b });
    }

    #[test]
    fn prop_divmod64_matches_native(a in any::<u64>(), b in 1u64..) {
        prop_assert_eq!(wide::udivmod64(a, b), DivMod { quotient: a / b, remainder: a % b });
    }

    #[test]
    fn prop_signed_division_matches_native(a in any::<i64>(), b in any::<i64>()) {
        prop_assume!(b != 0);
        prop_assert_eq!(wide::div_i64(a, b), a.wrapping_div(b));
        prop_assert_eq!(wide::mod_i64(a, b), a.wrapping_rem(b));

        let (a, b) = (a as i32, b as i32);
        prop_assume!(b != 0);
        prop_assert_eq!(wide::div_i32(&SoftwareUnit, a, b), a.wrapping_div(b));
        prop_assert_eq!(wide::mod_i32(&SoftwareUnit, a, b), a.wrapping_rem(b));
    }

    #[test]
    fn prop_multiply_matches_native(a in any::<u64>(), b in any::<u64>()) {
        prop_assert_eq!(wide::mul32(a as u32, b as u32), (a as u32).wrapping_mul(b as u32));
        prop_assert_eq!(wide::mul32_wide(a as u32, b as u32), (a as u32 as u64) * (b as u32 as u64));
        prop_assert_eq!(wide::mul64(&SoftwareUnit, a, b), a.wrapping_mul(b));
        prop_assert_eq!(wide::mul_i64(&SoftwareUnit, a as i64, b as i64), (a as i64).wrapping_mul(b as i64));
    }

    #[test]
    fn prop_shifts_match_native(value in any::<u64>(), amount in 0u32..64) {
        prop_assert_eq!(wide::shl64(value, amount), value << amount);
        prop_assert_eq!(wide::lshr64(value, amount), value >> amount);
        prop_assert_eq!(wide::ashr64(value as i64, amount), (value as i64) >> amount);
    }

    #[test]
    fn prop_clz_matches_native(x in any::<u32>()) {
        prop_assert_eq!(wide::clz32(x), x.leading_zeros());
    }

    #[test]
    fn prop_hardware_unit_matches_software(a in any::<u32>(), b in any::<u32>(), latency in 0u32..4) {
        let unit = HardwareUnit::new(SimulatedBus::new(RegisterMap::default(), latency));
        prop_assert_eq!(unit.multiply(a, b), SoftwareUnit.multiply(a, b));
        prop_assert_eq!(unit.divide(a, b), SoftwareUnit.divide(a, b));
        prop_assert_eq!(float::mul_with(&unit, a, b), float::mul(a, b));
    }

    #[test]
    fn prop_heap_coalesces_everything(
        (sizes, order) in (1usize..48).prop_flat_map(|n| {
            (vec(0u32..300, n), Just((0..n).collect::<Vec<_>>()).prop_shuffle())
        })
    ) {
        let mut heap = Heap::new(HeapArena::new(128 * 1024));
        let ptrs: Vec<_> = sizes.iter().map(|&size| heap.allocate(size).unwrap()).collect();

        for (i, &ptr) in ptrs.iter().enumerate() {
            prop_assert!(heap.usable_size(ptr) >= sizes[i]);
            heap.bytes_mut(ptr).fill(i as u8);
        }
        for (i, &ptr) in ptrs.iter().enumerate() {
            prop_assert!(heap.bytes(ptr).iter().all(|&byte| byte == i as u8));
        }

        for i in order {
            heap.free(ptrs[i]);
        }

        let report = heap.storage_report();
        prop_assert_eq!(report.free_blocks, 1);
        prop_assert_eq!(report.free_list_bytes, heap.arena().len() - report.unclaimed_bytes);
    }
}
