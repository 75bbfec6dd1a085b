use crate::window::{DisplayId, DisplayInfo, Rect};

pub fn primary_display(displays: &[DisplayInfo]) -> Option<&DisplayInfo> {
    displays
        .iter()
        .find(|d| d.is_primary)
        .or_else(|| displays.first())
}

/// A frame is visible when it intersects at least one display.
pub fn is_visible(frame: &Rect, displays: &[DisplayInfo]) -> bool {
    displays.iter().any(|d| d.bounds.intersects(frame))
}

/// Pick the display a window belongs to.
///
/// The display with the largest overlap wins. A frame that overlaps nothing
/// keeps its previous assignment if that display still exists, and otherwise
/// goes to the primary display.
pub fn assign_display(
    frame: &Rect,
    displays: &[DisplayInfo],
    previous: Option<DisplayId>,
) -> Option<DisplayId> {
    let best = displays
        .iter()
        .map(|d| (d.id, d.bounds.intersection_area(frame)))
        .filter(|(_, area)| *area > 0.0)
        .fold(None, |best: Option<(DisplayId, f64)>, (id, area)| match best {
            Some((_, best_area)) if best_area >= area => best,
            _ => Some((id, area)),
        });

    if let Some((id, _)) = best {
        return Some(id);
    }
    if let Some(previous) = previous
        && displays.iter().any(|d| d.id == previous)
    {
        return Some(previous);
    }
    primary_display(displays).map(|d| d.id)
}
