use mesh_halo::algs::partition::{GlobalDomain, imbalance, owner_of, partition, partition_all};
use mesh_halo::debug_invariants::DebugInvariants;
use mesh_halo::topology::ring::neighbors;
use proptest::prelude::*;

#[test]
fn concrete_split_ten_over_three() {
    let parts = partition_all(GlobalDomain::new(10), 3).unwrap();
    let summary: Vec<_> = parts
        .iter()
        .map(|p| (p.local_length(), p.global_start(), p.global_end()))
        .collect();
    assert_eq!(summary, vec![(4, 0, Some(3)), (3, 4, Some(6)), (3, 7, Some(9))]);
}

proptest! {
    #[test]
    fn lengths_sum_to_global(n in 0usize..5000, p in 1usize..64) {
        let parts = partition_all(GlobalDomain::new(n), p).unwrap();
        prop_assert_eq!(parts.iter().map(|q| q.local_length()).sum::<usize>(), n);
    }

    #[test]
    fn split_is_near_equal(n in 0usize..5000, p in 1usize..64) {
        let parts = partition_all(GlobalDomain::new(n), p).unwrap();
        prop_assert!(imbalance(&parts) <= 1);
        // larger slices come first
        prop_assert!(parts.windows(2).all(|w| w[0].local_length() >= w[1].local_length()));
    }

    #[test]
    fn slices_are_contiguous(n in 0usize..5000, p in 1usize..64) {
        let parts = partition_all(GlobalDomain::new(n), p).unwrap();
        prop_assert_eq!(parts[0].global_start(), 0);
        for w in parts.windows(2) {
            prop_assert_eq!(w[1].global_start(), w[0].global_range().end);
        }
        prop_assert_eq!(parts[p - 1].global_range().end, n);
        for q in &parts {
            prop_assert!(q.validate_invariants().is_ok());
            if let Some(end) = q.global_end() {
                prop_assert_eq!(end, q.global_start() + q.local_length() - 1);
            }
        }
    }

    #[test]
    fn owner_agrees_with_slices(n in 1usize..2000, p in 1usize..32, pick in any::<prop::sample::Index>()) {
        let g = pick.index(n);
        let domain = GlobalDomain::new(n);
        let owner = owner_of(domain, p, g).unwrap();
        let part = partition(domain, p, owner).unwrap();
        prop_assert!(part.contains(g));
    }

    #[test]
    fn ring_neighbours_are_inverse(p in 1usize..100, pick in any::<prop::sample::Index>()) {
        let r = pick.index(p);
        let n = neighbors(r, p).unwrap();
        prop_assert_eq!(neighbors(n.previous_rank, p).unwrap().next_rank, r);
        prop_assert_eq!(neighbors(n.next_rank, p).unwrap().previous_rank, r);
    }
}
