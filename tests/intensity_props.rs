use envload::load::intensity::{Intensity, worker_count};
use envload::load::memory::MemoryBudget;
use envload::system::sampler::synthetic_cpu_percent;
use envload::system::snapshot::ram_percent;
use proptest::prelude::*;

proptest! {
    #[test]
    fn worker_count_matches_rounded_share(
        value in 0i64..=100,
        parallelism in 1usize..=256,
    ) {
        // Half-up rounding of value * parallelism / 100, done in integers.
        let expected = (value as usize * parallelism + 50) / 100;
        let count = worker_count(Intensity::new(value), parallelism);
        prop_assert_eq!(count, expected.min(parallelism));
        prop_assert!(count <= parallelism);
    }

    #[test]
    fn any_input_clamps_into_range(value in any::<i64>()) {
        let intensity = Intensity::new(value);
        prop_assert!(intensity.value() <= 100);
        if value <= 0 {
            prop_assert!(intensity.is_zero());
        }
        if value >= 100 {
            prop_assert_eq!(intensity, Intensity::MAX);
        }
    }

    #[test]
    fn memory_target_never_exceeds_budget(
        budget in 0u64..(1u64 << 40),
        value in any::<i64>(),
    ) {
        let budget = MemoryBudget::from_bytes(budget);
        let target = budget.target(Intensity::new(value));
        prop_assert!(target <= budget.bytes());
    }

    #[test]
    fn reported_percentages_stay_in_range(
        total in any::<u64>(),
        available in any::<u64>(),
        value in any::<i64>(),
    ) {
        let ram = ram_percent(total, available);
        prop_assert!((0.0..=100.0).contains(&ram));
        let cpu = synthetic_cpu_percent(Intensity::new(value));
        prop_assert!((0.0..=100.0).contains(&cpu));
    }
}
