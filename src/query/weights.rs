use crate::models::Skill;

pub const MIN_WEIGHT: u8 = 1;
pub const MAX_WEIGHT: u8 = 5;

/// Weight given to an optional skill whose importance the provider did not state.
pub const DEFAULT_WEIGHT: u8 = 3;

/// Importance weights the provider is asked to assign to `optional_count`
/// optional skills, most important first.
///
/// Up to four skills count down to 1 (`[3, 2, 1]` for three). From five on,
/// the top four get `[5, 4, 3, 2]` and every remaining skill gets 1.
pub fn weight_ladder(optional_count: usize) -> Vec<u8> {
    if optional_count < 5 {
        return (1..=optional_count as u8).rev().collect();
    }
    let mut ladder = vec![5, 4, 3, 2];
    ladder.resize(optional_count, 1);
    ladder
}

/// True when the optional skills, in reply order, carry exactly the ladder weights.
pub fn follows_weight_ladder(skills: &[Skill]) -> bool {
    let weights: Vec<u8> = skills
        .iter()
        .filter(|s| !s.is_required())
        .map(|s| s.weight.unwrap_or_default())
        .collect();
    weights == weight_ladder(weights.len())
}

pub fn clamp_weight(weight: i64) -> u8 {
    weight.clamp(MIN_WEIGHT as i64, MAX_WEIGHT as i64) as u8
}
