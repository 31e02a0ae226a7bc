use crate::error::{ensure_finite, GradeError};
use crate::report::{ScoreAspect, RESERVED_ASPECT_NAME};

/// Unweighted mean of the aspect scores in a category.
///
/// Scores are summed in ascending order so the result does not depend on the
/// display order of the aspects.
pub fn aggregate(aspects: &[ScoreAspect]) -> Result<f64, GradeError> {
    if aspects.is_empty() {
        return Err(GradeError::EmptyCategory);
    }

    let mut scores = Vec::with_capacity(aspects.len());
    for aspect in aspects {
        if aspect.name == RESERVED_ASPECT_NAME {
            return Err(GradeError::ReservedAspectName);
        }
        scores.push(ensure_finite(&aspect.name, aspect.score())?);
    }

    scores.sort_by(f64::total_cmp);
    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    if mean.is_finite() {
        return Ok(mean);
    }

    // The sum overflowed; scale each term first.
    ensure_finite("category score", scores.iter().map(|s| s / n).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn aspect(name: &str, score: f64) -> ScoreAspect {
        ScoreAspect::new(name, score, vec![])
    }

    #[test]
    fn mean_of_two() {
        let aspects = [aspect("a", 8.0), aspect("b", 10.0)];
        assert_eq!(aggregate(&aspects).unwrap(), 9.0);
    }

    #[test]
    fn single_aspect_is_its_own_mean() {
        assert_eq!(aggregate(&[aspect("tempo", 7.25)]).unwrap(), 7.25);
    }

    #[test]
    fn empty_category_is_an_error() {
        assert_eq!(aggregate(&[]), Err(GradeError::EmptyCategory));
    }

    #[test]
    fn reserved_name_is_rejected() {
        let aspects = [aspect("pitch", 8.0), aspect("score", 9.0)];
        assert_eq!(aggregate(&aspects), Err(GradeError::ReservedAspectName));
    }

    #[test]
    fn non_finite_score_is_rejected() {
        let aspects = [aspect("pitch", 8.0), aspect("rhythm", f64::NAN)];
        assert!(matches!(
            aggregate(&aspects),
            Err(GradeError::InvalidScore { context, .. }) if context == "rhythm"
        ));
    }

    #[test]
    fn order_does_not_change_the_mean() {
        let forward = [
            aspect("posture", 9.13),
            aspect("finger_position", 8.07),
            aspect("confidence", 9.91),
            aspect("movement", 0.1),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(1);

        let expected = aggregate(&forward).unwrap();
        assert_eq!(aggregate(&reversed).unwrap(), expected);
        assert_eq!(aggregate(&rotated).unwrap(), expected);
    }

    #[test]
    fn huge_scores_do_not_overflow_the_mean() {
        let aspects = [aspect("a", f64::MAX), aspect("b", f64::MAX)];
        assert_eq!(aggregate(&aspects).unwrap(), f64::MAX);

        let aspects = [aspect("a", -f64::MAX), aspect("b", -f64::MAX), aspect("c", 0.0)];
        let mean = aggregate(&aspects).unwrap();
        assert!(mean.is_finite());
        assert!(mean < 0.0);
    }

    #[test]
    fn out_of_range_scores_are_averaged_as_given() {
        let aspects = [aspect("a", -2.0), aspect("b", 14.0)];
        assert_eq!(aggregate(&aspects).unwrap(), 6.0);
    }
}
