//! Allocation engine: reduces order lines into crate counts.
//!
//! The engine runs in three steps:
//! - reduction: each order line becomes a supplier-crate count plus leftover
//!   units bucketed by size class (`DispatchTotals::from_order_line`)
//! - aggregation: the per-line totals are folded into one running total
//!   (`DispatchTotals::merge`, a commutative monoid)
//! - packing: the aggregated leftovers are placed into the minimal set of
//!   standard crates (`DispatchTotals::to_manifest`), greedily and in a
//!   fixed stage order
//!
//! The whole pipeline is a pure function over non-negative integers; it
//! performs no I/O and holds no state across calls.

use crate::model::{CrateManifest, OrderLine, ProductSize};

/// Nominal capacity of the big-class primary crate category.
pub const SLOT12_CAPACITY: u64 = 12;
/// Effective capacity of a 12-slot crate once huge units are present.
pub const HUGE_EFFECTIVE_CAPACITY: u64 = 10;
/// Nominal capacity of the overflow crate category.
pub const SLOT6_CAPACITY: u64 = 6;
/// Effective capacity of a 6-slot overflow crate holding huge units.
pub const HUGE_OVERFLOW_CAPACITY: u64 = 5;
/// Nominal capacity of the small-class crate category.
pub const SLOT20_CAPACITY: u64 = 20;
/// Slots lost when huge units are introduced into a big-oriented crate.
pub const HUGE_HANDLING_OVERHEAD: u64 = 2;

/// Configuration for the crate packer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Compute the spare capacity of overflow crates as `capacity - occupied`
    /// instead of the historical `occupied % capacity`. The historical rule
    /// treats the occupied slot count itself as spare (except for an exactly
    /// full crate, where it yields 0); it is kept as the default for
    /// behavioral parity with the system this one replaces.
    pub corrected_secondary_spare: bool,
}

impl DispatchConfig {
    pub const DEFAULT_CORRECTED_SECONDARY_SPARE: bool = false;
}

/// Running totals of the reduction step: supplier crates already accounted
/// for, plus leftover units per size class still waiting for a standard
/// crate.
///
/// Forms a commutative monoid under `merge` with `empty` as identity, so
/// aggregation order never affects the result.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchTotals {
    pub supplier_count: u64,
    pub small_units: u64,
    pub big_units: u64,
    pub huge_units: u64,
}

impl DispatchTotals {
    /// The monoid identity: no crates, no leftovers.
    pub const fn empty() -> Self {
        Self {
            supplier_count: 0,
            small_units: 0,
            big_units: 0,
            huge_units: 0,
        }
    }

    /// Reduces one order line.
    ///
    /// When the line carries a case size, whole multiples of it are shipped
    /// as supplier crates and only the remainder is bucketed. The leftover
    /// lands in exactly one bucket, chosen by size class; a pair of
    /// `TwoInABig` units shares one big-class slot, an unpaired unit still
    /// needs a full slot.
    ///
    /// # Examples
    /// ```
    /// use crate_dispatch::dispatch::DispatchTotals;
    /// use crate_dispatch::model::{OrderLine, ProductSize};
    ///
    /// let line = OrderLine::new(20, Some(12), ProductSize::Huge);
    /// let totals = DispatchTotals::from_order_line(&line);
    /// assert_eq!(totals.supplier_count, 1);
    /// assert_eq!(totals.huge_units, 8);
    /// ```
    pub fn from_order_line(line: &OrderLine) -> Self {
        let mut totals = Self::empty();

        let leftover = match line.packing {
            Some(case_size) => {
                let case_size = u64::from(case_size);
                totals.supplier_count = line.unit_count / case_size;
                line.unit_count % case_size
            }
            None => line.unit_count,
        };

        match line.size {
            ProductSize::Small => totals.small_units = leftover,
            ProductSize::Big => totals.big_units = leftover,
            ProductSize::Huge => totals.huge_units = leftover,
            ProductSize::TwoInABig => totals.big_units = leftover.div_ceil(2),
        }

        totals
    }

    /// Component-wise sum; associative and commutative.
    pub fn merge(self, other: Self) -> Self {
        Self {
            supplier_count: self.supplier_count + other.supplier_count,
            small_units: self.small_units + other.small_units,
            big_units: self.big_units + other.big_units,
            huge_units: self.huge_units + other.huge_units,
        }
    }

    /// Aggregates a batch of order lines into one total.
    pub fn aggregate(lines: &[OrderLine]) -> Self {
        lines
            .iter()
            .map(Self::from_order_line)
            .fold(Self::empty(), Self::merge)
    }

    /// Packs the aggregated leftovers into standard crates.
    ///
    /// Runs in five ordered stages; each stage only ever adds crates or
    /// fills spare capacity in crates a previous stage opened, never
    /// removes one.
    pub fn to_manifest(&self, config: &DispatchConfig) -> CrateManifest {
        // Big-class primary packing. Opening an extra 12-slot crate is only
        // worth it once the remainder exceeds half the overflow crate's
        // capacity; at or below 6 the remainder is carried forward instead.
        let whole_crates_of_12 = self.big_units / SLOT12_CAPACITY;
        let rem_big = self.big_units % SLOT12_CAPACITY;
        let (crates_of_12, mut free_slots_last_12, mut remaining_big) = if rem_big > 6 {
            (whole_crates_of_12 + 1, SLOT12_CAPACITY - rem_big, 0)
        } else {
            (whole_crates_of_12, 0, rem_big)
        };
        debug_assert!(remaining_big <= 6);

        // Huge-class primary packing, same rule at effective capacity 10.
        let whole_crates_of_10 = self.huge_units / HUGE_EFFECTIVE_CAPACITY;
        let rem_huge = self.huge_units % HUGE_EFFECTIVE_CAPACITY;
        let (crates_of_10, mut free_slots_last_10, mut remaining_huge) = if rem_huge > 5 {
            (whole_crates_of_10 + 1, HUGE_EFFECTIVE_CAPACITY - rem_huge, 0)
        } else {
            (whole_crates_of_10, 0, rem_huge)
        };
        debug_assert!(remaining_huge <= 5);

        // Cross-fill huge units into the spare slots of the last 12-slot
        // crate. Introducing a huge unit costs 2 slots of handling overhead
        // up front, so the spare must hold at least that.
        if remaining_huge > 0 && free_slots_last_12 >= HUGE_HANDLING_OVERHEAD {
            free_slots_last_12 -= HUGE_HANDLING_OVERHEAD;
            (remaining_huge, free_slots_last_12) = transfer(remaining_huge, free_slots_last_12);
        }

        // Big units move into the spare slots of the last 10-crate for free.
        (remaining_big, free_slots_last_10) = transfer(remaining_big, free_slots_last_10);

        // At most 6 big units remain, fitting in at most one 6-slot crate.
        let crates_of_6 = u64::from(remaining_big > 0);
        let mut free_slots_last_6 = secondary_spare(remaining_big, SLOT6_CAPACITY, config);

        // Same for huge units at overflow capacity 5.
        let crates_of_5 = u64::from(remaining_huge > 0);
        let mut free_slots_last_5 = secondary_spare(remaining_huge, HUGE_OVERFLOW_CAPACITY, config);

        // Small-class packing; the remainder cascades through the spare
        // pools in fixed order (12, 10, 6, 5) before a new crate is opened.
        let mut crates_of_20 = self.small_units / SLOT20_CAPACITY;
        let mut remaining_small = self.small_units % SLOT20_CAPACITY;

        for spare in [
            &mut free_slots_last_12,
            &mut free_slots_last_10,
            &mut free_slots_last_6,
            &mut free_slots_last_5,
        ] {
            (remaining_small, *spare) = transfer(remaining_small, *spare);
        }

        if remaining_small > 0 {
            crates_of_20 += 1;
        }

        CrateManifest {
            supplier: self.supplier_count,
            slot6: crates_of_6 + crates_of_5,
            slot12: crates_of_12 + crates_of_10,
            slot20: crates_of_20,
        }
    }
}

/// Moves as many units as fit from `stock` into `free_slots`.
fn transfer(stock: u64, free_slots: u64) -> (u64, u64) {
    let moved = stock.min(free_slots);
    (stock - moved, free_slots - moved)
}

/// Spare capacity of a freshly opened overflow crate holding `occupied`
/// units.
///
/// The historical rule is `occupied % capacity`, which equals `occupied`
/// itself for every non-full crate. The corrected rule (`capacity -
/// occupied`) is opt-in; see `DispatchConfig::corrected_secondary_spare`.
fn secondary_spare(occupied: u64, capacity: u64, config: &DispatchConfig) -> u64 {
    if occupied == 0 {
        return 0;
    }
    if config.corrected_secondary_spare {
        capacity - occupied
    } else {
        occupied % capacity
    }
}

/// Dispatches a batch of classified order lines with the default packer
/// configuration.
pub fn dispatch_lines(lines: &[OrderLine]) -> CrateManifest {
    dispatch_lines_with_config(lines, &DispatchConfig::default())
}

/// Dispatches a batch of classified order lines.
///
/// Reduction, aggregation and packing in one pass; pure and total for any
/// input.
pub fn dispatch_lines_with_config(lines: &[OrderLine], config: &DispatchConfig) -> CrateManifest {
    DispatchTotals::aggregate(lines).to_manifest(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(unit_count: u64, packing: Option<u32>, size: ProductSize) -> OrderLine {
        OrderLine::new(unit_count, packing, size)
    }

    #[test]
    fn empty_order_yields_empty_manifest() {
        assert_eq!(dispatch_lines(&[]), CrateManifest::empty());
    }

    #[test]
    fn zero_units_yield_zero_totals() {
        let totals = DispatchTotals::from_order_line(&line(0, Some(6), ProductSize::Big));
        assert_eq!(totals, DispatchTotals::empty());
    }

    #[test]
    fn reduction_splits_supplier_crates_and_leftover() {
        let totals = DispatchTotals::from_order_line(&line(26, Some(12), ProductSize::Big));
        assert_eq!(totals.supplier_count, 2);
        assert_eq!(totals.big_units, 2);
        assert_eq!(totals.small_units, 0);
        assert_eq!(totals.huge_units, 0);
    }

    #[test]
    fn reduction_without_packing_keeps_all_units() {
        let totals = DispatchTotals::from_order_line(&line(26, None, ProductSize::Small));
        assert_eq!(totals.supplier_count, 0);
        assert_eq!(totals.small_units, 26);
    }

    #[test]
    fn two_in_a_big_pairs_share_a_slot() {
        let even = DispatchTotals::from_order_line(&line(8, None, ProductSize::TwoInABig));
        assert_eq!(even.big_units, 4, "8 paired units need 4 big slots");

        let odd = DispatchTotals::from_order_line(&line(9, None, ProductSize::TwoInABig));
        assert_eq!(odd.big_units, 5, "the unpaired unit still needs a slot");
    }

    #[test]
    fn leftover_is_below_case_size() {
        for unit_count in 0..40 {
            let totals = DispatchTotals::from_order_line(&line(unit_count, Some(12), ProductSize::Huge));
            assert!(totals.huge_units < 12);
        }
    }

    #[test]
    fn merge_is_commutative_and_associative() {
        let a = DispatchTotals::from_order_line(&line(26, Some(12), ProductSize::Big));
        let b = DispatchTotals::from_order_line(&line(7, None, ProductSize::Small));
        let c = DispatchTotals::from_order_line(&line(13, Some(4), ProductSize::Huge));

        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
        assert_eq!(a.merge(DispatchTotals::empty()), a);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let forward = [
            line(26, None, ProductSize::Small),
            line(5, None, ProductSize::Big),
            line(20, Some(12), ProductSize::Huge),
        ];
        let backward = [
            line(20, Some(12), ProductSize::Huge),
            line(5, None, ProductSize::Big),
            line(26, None, ProductSize::Small),
        ];
        assert_eq!(
            DispatchTotals::aggregate(&forward),
            DispatchTotals::aggregate(&backward)
        );
    }

    #[test]
    fn supplier_crate_plus_huge_leftover() {
        // 1 whole supplier crate + 8 remaining huge units in 1 slot12.
        let manifest = dispatch_lines(&[line(20, Some(12), ProductSize::Huge)]);
        assert_eq!(
            manifest,
            CrateManifest {
                supplier: 1,
                slot6: 0,
                slot12: 1,
                slot20: 0,
            }
        );
    }

    #[test]
    fn small_overflow_cascades_into_overflow_crate_spare() {
        // 1 whole slot20, 1 slot6 with 5 big units, 1 slot20 with the
        // 6 small units that did not fit elsewhere.
        let manifest = dispatch_lines(&[
            line(26, None, ProductSize::Small),
            line(5, None, ProductSize::Big),
        ]);
        assert_eq!(
            manifest,
            CrateManifest {
                supplier: 0,
                slot6: 1,
                slot12: 0,
                slot20: 2,
            }
        );
    }

    #[test]
    fn big_remainder_of_exactly_six_does_not_open_an_extra_crate_of_12() {
        // 78 = 6*12 + 6: the remainder equal to 6 is carried to the
        // overflow stage, only a strictly greater remainder adds a 12.
        let manifest = dispatch_lines(&[line(78, None, ProductSize::Big)]);
        assert_eq!(manifest.slot12, 6);
        assert_eq!(manifest.slot6, 1);
    }

    #[test]
    fn big_remainder_above_six_opens_an_extra_crate_of_12() {
        let manifest = dispatch_lines(&[line(79, None, ProductSize::Big)]);
        assert_eq!(manifest.slot12, 7);
        assert_eq!(manifest.slot6, 0);
    }

    #[test]
    fn huge_remainder_above_five_opens_an_extra_crate() {
        // 8 huge units: more than 5 remain, so one reduced-capacity crate
        // is opened and reported under the 12-slot field.
        let manifest = dispatch_lines(&[line(8, None, ProductSize::Huge)]);
        assert_eq!(manifest.slot12, 1);
        assert_eq!(manifest.slot6, 0);
    }

    #[test]
    fn huge_remainder_of_exactly_five_goes_to_an_overflow_crate() {
        let manifest = dispatch_lines(&[line(5, None, ProductSize::Huge)]);
        assert_eq!(manifest.slot12, 0);
        assert_eq!(manifest.slot6, 1);
    }

    #[test]
    fn huge_cross_fill_reserves_handling_overhead() {
        // Big: 19 -> 2 crates of 12 with 5 spare slots. Huge: 3 remain.
        // The cross-fill costs 2 of the 5 spare slots, the 3 huge units
        // fill the rest, so no extra crate is needed for them.
        let manifest = dispatch_lines(&[
            line(19, None, ProductSize::Big),
            line(3, None, ProductSize::Huge),
        ]);
        assert_eq!(
            manifest,
            CrateManifest {
                supplier: 0,
                slot6: 0,
                slot12: 2,
                slot20: 0,
            }
        );
    }

    #[test]
    fn huge_cross_fill_needs_at_least_the_overhead() {
        // Big: 23 -> 2 crates of 12 with 1 spare slot, below the 2-slot
        // handling overhead; the huge unit falls through to an overflow
        // crate instead.
        let manifest = dispatch_lines(&[
            line(23, None, ProductSize::Big),
            line(1, None, ProductSize::Huge),
        ]);
        assert_eq!(manifest.slot12, 2);
        assert_eq!(manifest.slot6, 1);
    }

    #[test]
    fn big_remainder_fills_spare_huge_capacity() {
        // Huge: 6 -> one crate of effective capacity 10 with 4 spare
        // slots; the 4 remaining big units ride along in it.
        let manifest = dispatch_lines(&[
            line(6, None, ProductSize::Huge),
            line(4, None, ProductSize::Big),
        ]);
        assert_eq!(
            manifest,
            CrateManifest {
                supplier: 0,
                slot6: 0,
                slot12: 1,
                slot20: 0,
            }
        );
    }

    #[test]
    fn small_cascade_prefers_primary_crate_spare() {
        // Big: 7 -> one crate of 12 with 5 spare slots; the 5 small
        // overflow units all fit there, no second slot20 crate.
        let manifest = dispatch_lines(&[
            line(7, None, ProductSize::Big),
            line(25, None, ProductSize::Small),
        ]);
        assert_eq!(
            manifest,
            CrateManifest {
                supplier: 0,
                slot6: 0,
                slot12: 1,
                slot20: 1,
            }
        );
    }

    #[test]
    fn conservation_of_slots_for_pure_big_loads() {
        // Every big unit ends up in exactly one opened crate: the opened
        // capacity must cover the unit count.
        for big in 0..200 {
            let manifest = dispatch_lines(&[line(big, None, ProductSize::Big)]);
            let capacity = manifest.slot12 * SLOT12_CAPACITY + manifest.slot6 * SLOT6_CAPACITY;
            assert!(capacity >= big, "big={big}: capacity {capacity} too small");
            // No crate is opened gratuitously either.
            if big > 0 {
                assert!(capacity < big + SLOT12_CAPACITY + SLOT6_CAPACITY);
            }
        }
    }

    #[test]
    fn crate_counts_never_decrease_when_input_grows() {
        let mut previous = CrateManifest::empty();
        for small in 0..100 {
            let manifest = dispatch_lines(&[line(small, None, ProductSize::Small)]);
            assert!(manifest.slot20 >= previous.slot20, "regression at small={small}");
            previous = manifest;
        }

        let mut previous = CrateManifest::empty();
        for huge in 0..100 {
            let manifest = dispatch_lines(&[line(huge, None, ProductSize::Huge)]);
            assert!(
                manifest.total_crate_count() >= previous.total_crate_count(),
                "regression at huge={huge}"
            );
            previous = manifest;
        }
    }

    #[test]
    fn corrected_secondary_spare_changes_the_cascade() {
        // Big: 5 -> one overflow crate. Historical rule leaves 5 "spare"
        // slots there, absorbing all 5 small overflow units; the corrected
        // rule leaves only 1, so a second slot20 crate is opened.
        let lines = [
            line(5, None, ProductSize::Big),
            line(25, None, ProductSize::Small),
        ];

        let legacy = dispatch_lines(&lines);
        assert_eq!(legacy.slot20, 1);

        let corrected = dispatch_lines_with_config(
            &lines,
            &DispatchConfig {
                corrected_secondary_spare: true,
            },
        );
        assert_eq!(corrected.slot20, 2);
        assert_eq!(corrected.slot6, legacy.slot6);
    }

    #[test]
    fn full_overflow_crate_has_no_spare_under_either_rule() {
        let legacy = DispatchConfig::default();
        let corrected = DispatchConfig {
            corrected_secondary_spare: true,
        };
        assert_eq!(secondary_spare(6, SLOT6_CAPACITY, &legacy), 0);
        assert_eq!(secondary_spare(6, SLOT6_CAPACITY, &corrected), 0);
        assert_eq!(secondary_spare(5, HUGE_OVERFLOW_CAPACITY, &legacy), 0);
        assert_eq!(secondary_spare(5, HUGE_OVERFLOW_CAPACITY, &corrected), 0);
    }

    #[test]
    fn mixed_order_with_all_size_classes() {
        let manifest = dispatch_lines(&[
            line(26, Some(12), ProductSize::Big),   // 2 supplier, 2 big
            line(9, None, ProductSize::TwoInABig),  // 5 big
            line(41, None, ProductSize::Small),     // 2 slot20, 1 leftover
            line(20, Some(12), ProductSize::Huge),  // 1 supplier, 8 huge
        ]);
        // Big: 7 > 6 -> one crate of 12 with 5 spare slots. Huge: 8 > 5 ->
        // one crate of 10, leaving no huge remainder to cross-fill. The
        // single leftover small unit cascades into the 12-crate spare.
        assert_eq!(
            manifest,
            CrateManifest {
                supplier: 3,
                slot6: 0,
                slot12: 2,
                slot20: 2,
            }
        );
    }
}
