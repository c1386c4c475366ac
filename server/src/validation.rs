use crate::catalog::{Catalog, Category};
use crate::error::InvalidInput;
use crate::store::ScoreKey;

pub const MAX_SUBMITTER_LEN: usize = 64;
/// Upper bound on a single score; keeps every per-submitter total within `i64`.
pub const MAX_SCORE: i64 = 1_000_000_000;

pub fn validate_category(raw: &str) -> Result<Category, InvalidInput> {
    raw.trim()
        .parse()
        .map_err(|_| InvalidInput::UnknownCategory(raw.to_string()))
}

pub fn validate_course_variant(
    catalog: &Catalog,
    course: &str,
    variant: &str,
) -> Result<(), InvalidInput> {
    if !catalog.is_valid_course(course) {
        return Err(InvalidInput::UnknownCourse(course.to_string()));
    }
    if !catalog.is_valid_variant(course, variant) {
        return Err(InvalidInput::UnknownVariant {
            course: course.to_string(),
            variant: variant.to_string(),
        });
    }
    Ok(())
}

/// Trims the name; empty or overlong names are refused rather than
/// truncated, since two distinct long names would otherwise collide.
pub fn validate_submitter(name: &str) -> Result<String, InvalidInput> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_SUBMITTER_LEN {
        Err(InvalidInput::BadSubmitter {
            max: MAX_SUBMITTER_LEN,
        })
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn validate_score(score: i64) -> Result<i64, InvalidInput> {
    if score <= 0 {
        Err(InvalidInput::NonPositiveScore(score))
    } else if score > MAX_SCORE {
        Err(InvalidInput::ScoreTooLarge {
            score,
            max: MAX_SCORE,
        })
    } else {
        Ok(score)
    }
}

/// Builds the composite key, checking components in tuple order.
pub fn score_key(
    catalog: &Catalog,
    category: &str,
    course: &str,
    variant: &str,
    submitter: &str,
) -> Result<ScoreKey, InvalidInput> {
    let category = validate_category(category)?;
    validate_course_variant(catalog, course, variant)?;
    let submitter = validate_submitter(submitter)?;
    Ok(ScoreKey {
        category,
        course: course.to_string(),
        variant: variant.to_string(),
        submitter,
    })
}
