//! Twelve-unit grid arithmetic
//!
//! Every function here takes and returns plain unit vectors and keeps
//! their sum fixed.

use std::cmp::Ordering;

use tracing::warn;

use crate::config::GridConfig;
use crate::model::GRID_UNITS;

use super::MutationError;

/// Split `total` units over `n` slots, remainder to the first slots
pub(crate) fn equal_split(total: usize, n: usize) -> Vec<u8> {
    if n == 0 {
        return vec![];
    }
    let base = total / n;
    let remainder = total % n;
    (0..n)
        .map(|i| (base + usize::from(i < remainder)) as u8)
        .collect()
}

/// Largest-remainder scaling of widths to exactly 12 units, at least one each
pub(crate) fn scale_units(widths: &[u8]) -> Vec<u8> {
    let target = u32::from(GRID_UNITS);
    let sum: u32 = widths.iter().map(|&w| u32::from(w)).sum();
    if sum == 0 {
        return equal_split(usize::from(GRID_UNITS), widths.len());
    }

    let exact: Vec<f64> = widths
        .iter()
        .map(|&w| f64::from(w) * f64::from(target) / f64::from(sum))
        .collect();
    let mut units: Vec<u32> = exact.iter().map(|e| (e.floor() as u32).max(1)).collect();
    let deficit = |units: &[u32], i: usize| exact[i] - f64::from(units[i]);

    let mut assigned: u32 = units.iter().sum();
    while assigned < target {
        let Some(i) = (0..units.len()).max_by(|&a, &b| {
            deficit(&units, a)
                .partial_cmp(&deficit(&units, b))
                .unwrap_or(Ordering::Equal)
                .then(b.cmp(&a))
        }) else {
            break;
        };
        units[i] += 1;
        assigned += 1;
    }
    while assigned > target {
        let Some(i) = (0..units.len()).filter(|&i| units[i] > 1).min_by(|&a, &b| {
            deficit(&units, a)
                .partial_cmp(&deficit(&units, b))
                .unwrap_or(Ordering::Equal)
        }) else {
            break;
        };
        units[i] -= 1;
        assigned -= 1;
    }

    units.into_iter().map(|u| u as u8).collect()
}

/// Grid units for a row's columns from their declared widths
///
/// Unsized columns share whatever the sized ones leave. When every column
/// is sized and the total is not 12 the widths are scaled to fit.
pub(crate) fn assign_units(declared: &[Option<u8>]) -> Vec<u8> {
    let total = usize::from(GRID_UNITS);
    let specified: usize = declared.iter().flatten().map(|&u| usize::from(u)).sum();
    let open = declared.iter().filter(|w| w.is_none()).count();

    if open == 0 {
        let widths: Vec<u8> = declared.iter().flatten().copied().collect();
        if specified == total {
            return widths;
        }
        warn!(
            declared = specified,
            columns = widths.len(),
            "column widths do not fill the row, scaling to 12 units"
        );
        return scale_units(&widths);
    }

    let remaining = total.saturating_sub(specified);
    if remaining < open {
        warn!(
            declared = specified,
            unsized = open,
            "no width left for unsized columns, splitting the row evenly"
        );
        return equal_split(total, declared.len());
    }

    let mut shares = equal_split(remaining, open).into_iter();
    declared
        .iter()
        .map(|width| width.unwrap_or_else(|| shares.next().unwrap_or(1)))
        .collect()
}

/// Move the divider between two adjacent columns
///
/// `left_percent` is the desired width of the left column as a share of the
/// whole row. The pair keeps its combined width and each side keeps at
/// least `min_column_units`.
pub(crate) fn resize_pair(
    left: u8,
    right: u8,
    left_percent: f64,
    config: &GridConfig,
) -> Result<(u8, u8), MutationError> {
    if !left_percent.is_finite() {
        return Err(MutationError::InvalidWidths(format!("{}%", left_percent)));
    }
    let total = left + right;
    let min = config.min_column_units;
    if total < min.saturating_mul(2) {
        return Err(MutationError::BelowMinimum { units: total, min });
    }

    let wanted = (left_percent / 100.0 * f64::from(GRID_UNITS)).round();
    let left = wanted.clamp(f64::from(min), f64::from(total - min)) as u8;
    Ok((left, total - left))
}

/// Widths after appending a column, and the index of the donor column
///
/// The donor is the last column wide enough to give up
/// `new_column_units` and still keep at least one unit.
pub(crate) fn add_column(units: &[u8], config: &GridConfig) -> Result<(usize, Vec<u8>), MutationError> {
    if units.len() >= config.max_columns {
        return Err(MutationError::ColumnLimit {
            max: config.max_columns,
        });
    }
    let donor = units
        .iter()
        .rposition(|&u| u >= config.donor_min_units && u > config.new_column_units)
        .ok_or(MutationError::NoDonorColumn)?;

    let mut next = units.to_vec();
    next[donor] -= config.new_column_units;
    next.push(config.new_column_units);
    Ok((donor, next))
}

/// Widths after removing the column at `index`
///
/// The freed units are spread evenly; the integer remainder goes to the
/// first remaining column.
pub(crate) fn delete_column(units: &[u8], index: usize) -> Result<Vec<u8>, MutationError> {
    if units.len() <= 1 {
        return Err(MutationError::LastColumn);
    }
    let Some(&freed) = units.get(index) else {
        return Err(MutationError::InvalidWidths(format!(
            "no column at index {}",
            index
        )));
    };

    let mut next: Vec<u8> = units
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != index)
        .map(|(_, &u)| u)
        .collect();
    let share = freed / next.len() as u8;
    let remainder = freed % next.len() as u8;
    for u in next.iter_mut() {
        *u += share;
    }
    next[0] += remainder;
    Ok(next)
}

/// Grid units for a new row from column percentages
pub(crate) fn units_from_percentages(percentages: &[f64]) -> Result<Vec<u8>, MutationError> {
    if percentages.is_empty() || percentages.len() > usize::from(GRID_UNITS) {
        return Err(MutationError::InvalidWidths(format!(
            "{} columns",
            percentages.len()
        )));
    }
    if let Some(bad) = percentages
        .iter()
        .find(|p| !p.is_finite() || **p <= 0.0 || **p > 100.0)
    {
        return Err(MutationError::InvalidWidths(format!("{}%", bad)));
    }

    let units: Vec<u8> = percentages
        .iter()
        .map(|&p| crate::model::percent_to_units(p))
        .collect();
    if units.iter().map(|&u| u32::from(u)).sum::<u32>() == u32::from(GRID_UNITS) {
        Ok(units)
    } else {
        Ok(scale_units(&units))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(units: &[u8]) -> u32 {
        units.iter().map(|&u| u32::from(u)).sum()
    }

    #[test]
    fn test_equal_split_gives_remainder_to_first() {
        assert_eq!(equal_split(12, 5), vec![3, 3, 2, 2, 2]);
        assert_eq!(equal_split(12, 3), vec![4, 4, 4]);
        assert_eq!(equal_split(12, 0), Vec::<u8>::new());
    }

    #[test]
    fn test_scale_units() {
        assert_eq!(scale_units(&[6, 6, 6]), vec![4, 4, 4]);
        assert_eq!(scale_units(&[6, 4]), vec![7, 5]);
        assert_eq!(total(&scale_units(&[1, 1, 1, 1, 1])), 12);
        assert_eq!(total(&scale_units(&[1; 12])), 12);
    }

    #[test]
    fn test_assign_units_fills_unsized_columns() {
        assert_eq!(assign_units(&[Some(6), None, None]), vec![6, 3, 3]);
        assert_eq!(assign_units(&[None, None]), vec![6, 6]);
    }

    #[test]
    fn test_assign_units_scales_explicit_widths() {
        assert_eq!(assign_units(&[Some(6), Some(6), Some(6)]), vec![4, 4, 4]);
        assert_eq!(assign_units(&[Some(6), Some(4)]), vec![7, 5]);
        let units = assign_units(&[Some(1), Some(1), Some(1), Some(1), Some(1)]);
        assert_eq!(units.iter().map(|&u| u32::from(u)).sum::<u32>(), 12);
    }

    #[test]
    fn test_assign_units_overfull_falls_back_to_even() {
        assert_eq!(assign_units(&[Some(12), None]), vec![6, 6]);
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let config = GridConfig::default();
        assert_eq!(resize_pair(6, 6, 25.0, &config).unwrap(), (3, 9));
        assert_eq!(resize_pair(6, 6, 0.0, &config).unwrap(), (2, 10));
        assert_eq!(resize_pair(6, 6, 100.0, &config).unwrap(), (10, 2));
        assert_eq!(resize_pair(4, 2, 10.0, &config).unwrap(), (2, 4));
    }

    #[test]
    fn test_resize_rejects_narrow_pair() {
        let config = GridConfig::default();
        assert_eq!(
            resize_pair(2, 1, 20.0, &config),
            Err(MutationError::BelowMinimum { units: 3, min: 2 })
        );
    }

    #[test]
    fn test_add_column_prefers_last_donor() {
        let config = GridConfig::default();
        assert_eq!(add_column(&[12], &config).unwrap(), (0, vec![10, 2]));
        assert_eq!(add_column(&[6, 6], &config).unwrap(), (1, vec![6, 4, 2]));
        assert_eq!(add_column(&[8, 2, 2], &config).unwrap(), (0, vec![6, 2, 2, 2]));
    }

    #[test]
    fn test_add_column_limits() {
        let config = GridConfig::default();
        assert_eq!(
            add_column(&[3, 3, 3, 3], &config),
            Err(MutationError::ColumnLimit { max: 4 })
        );
        let config = GridConfig::default().with_max_columns(8);
        assert_eq!(
            add_column(&[2, 2, 2, 2, 2, 2], &config),
            Err(MutationError::NoDonorColumn)
        );
    }

    #[test]
    fn test_delete_column_remainder_to_first() {
        assert_eq!(delete_column(&[4, 4, 4], 1).unwrap(), vec![6, 6]);
        assert_eq!(delete_column(&[2, 2, 3, 5], 3).unwrap(), vec![5, 3, 4]);
        assert_eq!(delete_column(&[12], 0), Err(MutationError::LastColumn));
    }

    #[test]
    fn test_units_from_percentages() {
        assert_eq!(units_from_percentages(&[50.0, 50.0]).unwrap(), vec![6, 6]);
        assert_eq!(
            units_from_percentages(&[33.33, 33.33, 33.33]).unwrap(),
            vec![4, 4, 4]
        );
        assert_eq!(total(&units_from_percentages(&[70.0, 70.0]).unwrap()), 12);
        assert!(units_from_percentages(&[]).is_err());
        assert!(units_from_percentages(&[0.0, 100.0]).is_err());
    }
}
