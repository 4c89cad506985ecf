//! Which zone borders a player should currently see.
use crate::consts::zones::{DANGER_MARGIN, NEARBY_MARGIN};

use super::Zone;

/// A zone border to display to a player.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderHint<'a> {
    pub zone: &'a Zone,
    /// The player stands inside this zone (safe side of the border).
    pub inside: bool,
}

/// Borders to display for a player at `(x, z)` among the zones of its dimension.
///
/// Nearby zones are shown while the player is close to their edge from the inside. A player
/// outside every nearby zone also sees the closest zone, when within `radius + DANGER_MARGIN`.
pub fn visible_borders<'a>(
    zones: &'a [Zone],
    x: f64,
    z: f64,
    threshold: f64,
) -> Vec<BorderHint<'a>> {
    let nearby: Vec<&Zone> = zones
        .iter()
        .filter(|zone| zone.center_distance(x, z) <= zone.radius as f64 + NEARBY_MARGIN)
        .collect();

    let mut hints: Vec<BorderHint<'a>> = nearby
        .iter()
        .filter(|zone| zone.is_near_border(x, z, threshold))
        .map(|&zone| BorderHint { zone, inside: true })
        .collect();

    if nearby.iter().all(|zone| !zone.contains_point(x, z)) {
        let closest = zones
            .iter()
            .min_by(|a, b| a.center_distance(x, z).total_cmp(&b.center_distance(x, z)));
        if let Some(zone) = closest {
            if zone.center_distance(x, z) <= zone.radius as f64 + DANGER_MARGIN {
                hints.push(BorderHint {
                    zone,
                    inside: false,
                });
            }
        }
    }

    hints
}
