use std::cmp::Ordering;
use std::collections::HashMap;

use uuid::Uuid;

use crate::engine::scoring::ScoredCandidate;
use crate::models::donation::Allocation;

/// Split `donation_qty` units across scored candidates in proportion to
/// score, honoring per-candidate capacity.
///
/// Apportionment is the largest-remainder method: floor every proportional
/// share, then hand the leftover units to the biggest fractional parts.
/// That is what guarantees the quantities sum to exactly `donation_qty`;
/// plain rounding does not. When capacities bind, the excess spills to the
/// next-best candidates with headroom, and if every candidate is at
/// capacity the total comes up short of `donation_qty` — a constrained
/// plan, not an error. Supply is never invented.
///
/// `capacity_overrides` (by food-bank id) take precedence over each
/// candidate's `capacity_daily`.
pub fn allocate_units(
    donation_qty: u32,
    scored: &[ScoredCandidate],
    capacity_overrides: Option<&HashMap<Uuid, u32>>,
) -> Vec<Allocation> {
    if donation_qty == 0 || scored.is_empty() {
        return Vec::new();
    }

    let n = scored.len();
    let total_score: f64 = scored.iter().map(|candidate| candidate.score).sum();

    // zero or negative total score cannot form a distribution; split evenly
    let weights: Vec<f64> = if total_score > 0.0 {
        scored.iter().map(|candidate| candidate.score).collect()
    } else {
        vec![1.0; n]
    };
    let weight_sum: f64 = weights.iter().sum();

    let mut quantities = vec![0u32; n];
    let mut fractions = vec![0f64; n];
    for i in 0..n {
        let raw_share = weights[i] / weight_sum * donation_qty as f64;
        quantities[i] = raw_share.floor() as u32;
        fractions[i] = raw_share - raw_share.floor();
    }

    let assigned: u32 = quantities.iter().sum();
    let remainder = donation_qty.saturating_sub(assigned);

    // largest fractional part first; ties go to the higher-scored
    // candidate, which is the earlier index since input is score-descending
    let mut by_fraction: Vec<usize> = (0..n).collect();
    by_fraction.sort_by(|&a, &b| {
        fractions[b]
            .partial_cmp(&fractions[a])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });
    for &i in by_fraction.iter().cycle().take(remainder as usize) {
        quantities[i] += 1;
    }

    let capacity_of = |i: usize| -> Option<u32> {
        let bank = &scored[i].bank;
        capacity_overrides
            .and_then(|overrides| overrides.get(&bank.id).copied())
            .or(bank.capacity_daily)
    };

    let mut spill: u32 = 0;
    for i in 0..n {
        if let Some(cap) = capacity_of(i) {
            if quantities[i] > cap {
                spill += quantities[i] - cap;
                quantities[i] = cap;
            }
        }
    }

    // hand spill back one unit at a time, best score first, until it is
    // gone or every candidate is at capacity
    while spill > 0 {
        let mut placed = false;
        for i in 0..n {
            if spill == 0 {
                break;
            }
            let at_capacity = capacity_of(i).is_some_and(|cap| quantities[i] >= cap);
            if !at_capacity {
                quantities[i] += 1;
                spill -= 1;
                placed = true;
            }
        }
        if !placed {
            break;
        }
    }

    scored
        .iter()
        .zip(quantities)
        .filter(|(_, qty)| *qty > 0)
        .map(|(candidate, qty)| Allocation {
            food_bank_id: candidate.bank.id,
            name: candidate.bank.name.clone(),
            address: candidate.bank.address.clone(),
            phone: candidate.bank.phone.clone(),
            qty,
            duration_minutes: candidate.duration_minutes,
            score: candidate.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use uuid::Uuid;

    use super::allocate_units;
    use crate::engine::scoring::ScoredCandidate;
    use crate::geo::GeoPoint;
    use crate::models::food_bank::FoodBank;

    fn candidate(score: f64, capacity_daily: Option<u32>) -> ScoredCandidate {
        ScoredCandidate {
            bank: FoodBank {
                id: Uuid::new_v4(),
                name: "bank".to_string(),
                address: None,
                phone: None,
                location: GeoPoint {
                    lat: 42.36,
                    lng: -71.06,
                },
                need_weight: 1.0,
                capacity_daily,
                active: true,
                created_at: Utc::now(),
            },
            duration_minutes: Some(10.0),
            score,
        }
    }

    fn quantities(allocations: &[crate::models::donation::Allocation]) -> Vec<u32> {
        allocations.iter().map(|a| a.qty).collect()
    }

    #[test]
    fn proportional_split_with_exact_shares() {
        let scored = vec![candidate(6.0, None), candidate(3.0, None), candidate(1.0, None)];
        let allocations = allocate_units(10, &scored, None);
        assert_eq!(quantities(&allocations), vec![6, 3, 1]);
    }

    #[test]
    fn integer_shares_need_no_remainder_distribution() {
        let scored = vec![candidate(5.0, None), candidate(3.0, None), candidate(2.0, None)];
        let allocations = allocate_units(10, &scored, None);
        assert_eq!(quantities(&allocations), vec![5, 3, 2]);
    }

    #[test]
    fn remainder_tie_goes_to_the_earlier_candidate() {
        let scored = vec![candidate(1.0, None), candidate(1.0, None)];
        let allocations = allocate_units(3, &scored, None);
        assert_eq!(quantities(&allocations), vec![2, 1]);
    }

    #[test]
    fn sole_candidate_at_capacity_yields_a_short_plan() {
        let scored = vec![candidate(1.0, Some(2))];
        let allocations = allocate_units(5, &scored, None);
        assert_eq!(quantities(&allocations), vec![2]);
    }

    #[test]
    fn largest_fraction_takes_the_leftover_unit() {
        // raw shares [6.667, 3.333]: the larger fraction sits on the
        // first candidate
        let scored = vec![candidate(2.0, None), candidate(1.0, None)];
        let allocations = allocate_units(10, &scored, None);
        assert_eq!(quantities(&allocations), vec![7, 3]);
    }

    #[test]
    fn spill_flows_to_candidates_with_headroom() {
        // raw [8.33, 1.67] -> floors [8, 1], leftover to the second,
        // then the first clamps to 3 and the spill lands on the second
        let scored = vec![candidate(5.0, Some(3)), candidate(1.0, None)];
        let allocations = allocate_units(10, &scored, None);
        assert_eq!(quantities(&allocations), vec![3, 7]);
        assert_eq!(allocations.iter().map(|a| a.qty).sum::<u32>(), 10);
    }

    #[test]
    fn zero_total_score_splits_evenly() {
        let scored = vec![candidate(0.0, None), candidate(0.0, None), candidate(0.0, None)];
        let allocations = allocate_units(7, &scored, None);
        assert_eq!(quantities(&allocations), vec![3, 2, 2]);
    }

    #[test]
    fn zero_quantity_candidates_are_omitted() {
        let scored = vec![candidate(1000.0, None), candidate(1.0, None)];
        let allocations = allocate_units(1, &scored, None);
        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].qty, 1);
    }

    #[test]
    fn capacity_overrides_beat_daily_capacity() {
        let scored = vec![candidate(1.0, Some(100)), candidate(1.0, None)];
        let mut overrides = HashMap::new();
        overrides.insert(scored[0].bank.id, 1u32);

        let allocations = allocate_units(6, &scored, Some(&overrides));

        assert_eq!(quantities(&allocations), vec![1, 5]);
    }

    #[test]
    fn sum_matches_donation_qty_across_awkward_splits() {
        for qty in 1..=50u32 {
            let scored = vec![candidate(0.37, None), candidate(0.21, None), candidate(0.13, None)];
            let allocations = allocate_units(qty, &scored, None);
            assert_eq!(allocations.iter().map(|a| a.qty).sum::<u32>(), qty);
            assert!(allocations.iter().all(|a| a.qty > 0));
        }
    }

    #[test]
    fn identical_inputs_allocate_identically() {
        let scored = vec![candidate(0.5, None), candidate(0.5, None), candidate(0.25, None)];
        let first = allocate_units(11, &scored, None);
        let second = allocate_units(11, &scored, None);
        assert_eq!(quantities(&first), quantities(&second));
    }

    #[test]
    fn all_capacities_zero_allocates_nothing() {
        let scored = vec![candidate(2.0, Some(0)), candidate(1.0, Some(0))];
        let allocations = allocate_units(4, &scored, None);
        assert!(allocations.is_empty());
    }
}
