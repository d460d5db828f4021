use review_radar_common::round_to;

/// Map a signed score in [-1, 1] linearly onto 1..=5 stars, two decimals.
/// Out-of-range scores are clamped; non-finite scores read as neutral.
pub fn to_stars(score: f64) -> f64 {
    let score = if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    round_to(((score + 1.0) / 2.0) * 4.0 + 1.0, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchors() {
        assert_eq!(to_stars(-1.0), 1.0);
        assert_eq!(to_stars(0.0), 3.0);
        assert_eq!(to_stars(1.0), 5.0);
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(to_stars(0.123), 3.25);
        assert_eq!(to_stars(-0.5), 2.0);
    }

    #[test]
    fn clamps_out_of_range() {
        assert_eq!(to_stars(3.0), 5.0);
        assert_eq!(to_stars(-7.5), 1.0);
        assert_eq!(to_stars(f64::NAN), 3.0);
    }

    #[test]
    fn monotonic() {
        let mut prev = to_stars(-1.0);
        for i in -100..=100 {
            let stars = to_stars(i as f64 / 100.0);
            assert!(stars >= prev);
            assert!((1.0..=5.0).contains(&stars));
            prev = stars;
        }
    }
}
