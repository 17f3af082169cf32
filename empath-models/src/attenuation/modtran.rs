//! Offline helpers that reduce MODTRAN spectral transmittance output to the
//! single band-average figure the tabular attenuation files carry.

use itertools::Itertools;

use crate::ModelError;

/// Builds the normalized band-response vector over a spectral grid.
///
/// Bins entirely inside `[lower, upper]` get weight 1, bins straddling a
/// band edge get the covered fraction, everything else 0. `grid` holds the
/// bin-center wavenumbers and must be strictly increasing.
pub fn build_response_vector(
    grid: &[f64],
    lower: f64,
    upper: f64,
) -> Result<Vec<f64>, ModelError> {
    if grid.len() < 2 {
        return Err(ModelError::EmptyTable("spectral grid"));
    }
    if grid.iter().tuple_windows().any(|(a, b)| b <= a) {
        return Err(ModelError::NonMonotonicAxis("spectral grid"));
    }
    if upper <= lower {
        return Err(ModelError::OutOfRange {
            name: "band upper edge",
            value: upper,
        });
    }
    let response = grid
        .iter()
        .enumerate()
        .map(|(i, &center)| {
            // Bin edges halfway to the neighbours; end bins mirror inward.
            let below = if i > 0 {
                (grid[i - 1] + center) / 2.0
            } else {
                center - (grid[1] - center) / 2.0
            };
            let above = if i + 1 < grid.len() {
                (center + grid[i + 1]) / 2.0
            } else {
                center + (center - grid[i - 1]) / 2.0
            };
            let covered = (above.min(upper) - below.max(lower)).max(0.0);
            covered / (above - below)
        })
        .collect();
    Ok(response)
}

/// Response-weighted average transmittance over the band.
///
/// `transmittance` and `response` come from the same spectral grid; the
/// result is the in-band average, 1.0 when the response is empty of weight.
pub fn compute_average_transmittance(
    transmittance: &[f64],
    response: &[f64],
) -> Result<f64, ModelError> {
    if transmittance.len() != response.len() {
        return Err(ModelError::ValueCountMismatch {
            got: transmittance.len(),
            want: response.len(),
        });
    }
    if transmittance.is_empty() {
        return Err(ModelError::EmptyTable("transmittance"));
    }
    let weight: f64 = response.iter().sum();
    if weight <= 0.0 {
        return Ok(1.0);
    }
    let sum: f64 = transmittance
        .iter()
        .zip(response)
        .map(|(t, w)| t * w)
        .sum();
    Ok((sum / weight).clamp(0.0, 1.0))
}
