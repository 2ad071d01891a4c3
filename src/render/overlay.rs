//! Interactive overlay regions positioned over a rendered page

use serde::Serialize;

use crate::content::{ElementTag, PageContent};
use crate::geometry::{MIN_HIT_TARGET_PX, SurfaceBox, to_surface_box};

/// One element's clickable region on the surface
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OverlayRegion {
    pub element_id: String,
    pub tag: ElementTag,
    pub surface_box: SurfaceBox,
}

/// Map every element of a page onto the surface at `scale`.
///
/// Called once per accepted render; results are not cached across scales.
#[must_use]
pub fn layout_overlay(page: &PageContent, scale: f32) -> Vec<OverlayRegion> {
    page.elements
        .iter()
        .map(|element| OverlayRegion {
            element_id: element.id.clone(),
            tag: element.tag(),
            surface_box: to_surface_box(&element.bbox, scale),
        })
        .collect()
}

/// Find the region under a surface point.
///
/// Regions below the minimum hit target are grown around their centre. When
/// regions overlap, the smallest one wins so cells stay reachable inside
/// their table; on equal area the later region wins.
#[must_use]
pub fn hit_test(regions: &[OverlayRegion], x: f64, y: f64) -> Option<&OverlayRegion> {
    regions
        .iter()
        .map(|region| (region, region.surface_box.hit_area(MIN_HIT_TARGET_PX)))
        .filter(|(_, hit)| hit.contains(x, y))
        .fold(None, |best: Option<(&OverlayRegion, f64)>, (region, hit)| {
            let area = hit.area();
            match best {
                Some((_, best_area)) if best_area < area => best,
                _ => Some((region, area)),
            }
        })
        .map(|(region, _)| region)
}
