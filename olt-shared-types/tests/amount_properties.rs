use olt_shared_types::{Amount, U256};
use proptest::prelude::*;

fn amount_strategy() -> impl Strategy<Value = Amount> {
    prop::array::uniform4(any::<u64>()).prop_map(|limbs| Amount::new(U256(limbs)))
}

proptest! {
    #[test]
    fn test_basis_point_shares_never_exceed_the_whole(
        amount in amount_strategy(),
        a in 0u16..=10_000,
        b in 0u16..=10_000,
    ) {
        let (a, b) = if a as u32 + b as u32 > 10_000 { (a, 10_000 - a) } else { (a, b) };
        let c = 10_000 - a - b;
        let shares = [amount.basis_points(a), amount.basis_points(b), amount.basis_points(c)];
        let total = Amount::checked_sum(shares).expect("shares fit");
        prop_assert!(total <= amount);
        // Each floor loses less than one unit.
        prop_assert!(amount.checked_sub(total).unwrap() < Amount::from_u64(3));
    }

    #[test]
    fn test_decimal_text_is_preserved(amount in amount_strategy()) {
        let text = amount.to_string();
        prop_assert_eq!(text.parse::<Amount>().unwrap(), amount);
        let json = serde_json::to_string(&amount).unwrap();
        prop_assert_eq!(json, format!("\"{}\"", text));
    }

    #[test]
    fn test_split_reassembles(amount in any::<u64>(), parts in 1u64..64) {
        let (piece, rest) = Amount::from_u64(amount).split(parts);
        let rebuilt = piece.checked_mul_u64(parts).unwrap().checked_add(rest).unwrap();
        prop_assert_eq!(rebuilt, Amount::from_u64(amount));
        prop_assert!(rest < Amount::from_u64(parts));
    }
}
