//! Weight math shared by the normalizer and the repository implementations.

use uuid::Uuid;

use crate::models::Keyword;

/// Compute the normalized weight share for every row in one token group.
///
/// The group is every keyword row of one account whose `text` matches the
/// token. Returns `None` when the combined total weight is zero, in which
/// case existing normalized weights must be left unchanged (divide-by-zero
/// guard). A singleton group with nonzero weight normalizes to 1.0.
pub fn normalized_shares(group: &[Keyword]) -> Option<Vec<(Uuid, f64)>> {
    let sum: i64 = group.iter().map(Keyword::total_weight).sum();
    if sum <= 0 {
        return None;
    }

    Some(
        group
            .iter()
            .map(|k| (k.id, k.total_weight() as f64 / sum as f64))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn keyword(manual: i32, auto: i32) -> Keyword {
        Keyword {
            id: Uuid::new_v4(),
            category_id: Uuid::new_v4(),
            text: "coffee".into(),
            auto_usage_count: auto,
            manual_usage_count: manual,
            normalized_weight: 1.0,
            created_at: Utc::now(),
            last_used_at: Utc::now(),
        }
    }

    #[test]
    fn test_zero_sum_returns_none() {
        let group = vec![keyword(0, 0), keyword(0, 0)];
        assert!(normalized_shares(&group).is_none());
    }

    #[test]
    fn test_singleton_normalizes_to_one() {
        let group = vec![keyword(1, 0)];
        let shares = normalized_shares(&group).unwrap();
        assert_eq!(shares.len(), 1);
        assert!((shares[0].1 - 1.0).abs() < crate::defaults::WEIGHT_EPSILON);
    }

    #[test]
    fn test_shares_sum_to_one() {
        let group = vec![keyword(2, 1), keyword(0, 3), keyword(1, 0)];
        let shares = normalized_shares(&group).unwrap();
        let sum: f64 = shares.iter().map(|(_, w)| w).sum();
        assert!((sum - 1.0).abs() < crate::defaults::WEIGHT_EPSILON);
    }

    #[test]
    fn test_manual_outweighs_auto() {
        // manual=1 (weight 3) vs auto=1 (weight 1): shares 0.75 / 0.25
        let a = keyword(1, 0);
        let b = keyword(0, 1);
        let shares = normalized_shares(&[a.clone(), b]).unwrap();
        assert!((shares[0].1 - 0.75).abs() < 1e-12);
        assert!((shares[1].1 - 0.25).abs() < 1e-12);
        assert_eq!(shares[0].0, a.id);
    }
}
