use std::cmp::Reverse;

/// Number of favorite exercises reported in [`Statistics`].
pub const FAVORITES_LIMIT: usize = 3;

/// Point-in-time aggregate over all completed activities of a user.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Statistics {
    pub total_count: u32,
    pub total_minutes: u64,
    pub total_calories: u64,
    pub favorites: Vec<FavoriteExercise>,
}

impl Statistics {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoriteExercise {
    pub name: String,
    pub count: u32,
}

/// Rank completion counts per exercise name.
///
/// Higher counts come first, equal counts are ordered by name.
#[must_use]
pub fn rank_favorites(
    tally: impl IntoIterator<Item = (String, u32)>,
    limit: usize,
) -> Vec<FavoriteExercise> {
    let mut favorites = tally
        .into_iter()
        .map(|(name, count)| FavoriteExercise { name, count })
        .collect::<Vec<_>>();
    favorites.sort_by(|a, b| (Reverse(a.count), &a.name).cmp(&(Reverse(b.count), &b.name)));
    favorites.truncate(limit);
    favorites
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn favorite(name: &str, count: u32) -> FavoriteExercise {
        FavoriteExercise {
            name: name.to_string(),
            count,
        }
    }

    #[rstest]
    #[case(vec![], 3, vec![])]
    #[case(
        vec![("Plank", 1), ("Squats", 3)],
        3,
        vec![favorite("Squats", 3), favorite("Plank", 1)]
    )]
    #[case(
        vec![("Yoga", 2), ("Cycling", 2), ("Running", 5), ("Plank", 1)],
        3,
        vec![favorite("Running", 5), favorite("Cycling", 2), favorite("Yoga", 2)]
    )]
    #[case(vec![("Yoga", 2), ("Cycling", 2)], 1, vec![favorite("Cycling", 2)])]
    fn test_rank_favorites(
        #[case] tally: Vec<(&str, u32)>,
        #[case] limit: usize,
        #[case] expected: Vec<FavoriteExercise>,
    ) {
        assert_eq!(
            rank_favorites(tally.into_iter().map(|(n, c)| (n.to_string(), c)), limit),
            expected
        );
    }

    #[test]
    fn test_statistics_default_is_empty() {
        let statistics = Statistics::default();
        assert!(statistics.is_empty());
        assert_eq!(
            statistics,
            Statistics {
                total_count: 0,
                total_minutes: 0,
                total_calories: 0,
                favorites: vec![],
            }
        );
    }
}
