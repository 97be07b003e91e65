//! Geometry-derived print pricing.
//!
//! Volume uses the divergence theorem: the signed volumes of the tetrahedra
//! spanned by the origin and each triangle sum to the enclosed volume.

use serde::{Deserialize, Serialize};

use crate::config::PricingConfig;
use crate::core::Triangle;

/// Mesh units (mm³) to the unit prices are expressed in (cm³).
pub const VOLUME_UNIT_SCALE: f64 = 0.001;
/// Grams per unit of volume.
pub const WEIGHT_PER_VOLUME: f64 = 1.25;

/// Cubic bounds of a mesh.
///
/// One range is shared by all three axes: it spans the lowest and highest
/// coordinate seen on any axis. The range starts at the origin, so it always
/// contains zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Lowest coordinate on any axis.
    pub bottom: f64,
    /// Highest coordinate on any axis.
    pub top: f64,
}

impl BoundingBox {
    /// Lower corner.
    #[must_use]
    pub const fn min(&self) -> [f64; 3] {
        [self.bottom; 3]
    }

    /// Upper corner.
    #[must_use]
    pub const fn max(&self) -> [f64; 3] {
        [self.top; 3]
    }

    /// Extent, the same on every axis.
    #[must_use]
    pub fn size(&self) -> f64 {
        self.top - self.bottom
    }

    fn include(&mut self, vertex: &[f64; 3]) {
        for &coord in vertex {
            if self.top < coord {
                self.top = coord;
            }
            if self.bottom > coord {
                self.bottom = coord;
            }
        }
    }
}

/// Result of measuring a mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshMeasure {
    /// Scaled signed volume.
    pub volume: f64,
    /// Bounds of all vertices.
    pub bounding_box: BoundingBox,
}

/// Price and its inputs for one artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Scaled volume.
    pub volume: f64,
    /// Estimated weight in grams.
    pub weight: f64,
    /// Estimated print duration.
    pub print_duration: f64,
    /// Total price rounded to the nearest whole unit.
    pub total_price: f64,
    /// Bounds of the mesh. Informational only.
    pub bounding_box: BoundingBox,
}

/// Signed volume of the tetrahedron spanned by the origin and `p1`, `p2`, `p3`.
#[must_use]
pub fn signed_volume_of_triangle(p1: &[f64; 3], p2: &[f64; 3], p3: &[f64; 3]) -> f64 {
    let v321 = p3[0] * p2[1] * p1[2];
    let v231 = p2[0] * p3[1] * p1[2];
    let v312 = p3[0] * p1[1] * p2[2];
    let v132 = p1[0] * p3[1] * p2[2];
    let v213 = p2[0] * p1[1] * p3[2];
    let v123 = p1[0] * p2[1] * p3[2];
    (-v321 + v231 + v312 - v132 - v213 + v123) / 6.0
}

/// Scaled signed volume and bounding box of a triangle soup.
#[must_use]
pub fn measure(triangles: &[Triangle]) -> MeshMeasure {
    let mut volume = 0.0;
    let mut bounding_box = BoundingBox::default();

    for [a, b, c] in triangles {
        volume += signed_volume_of_triangle(a, b, c);
        bounding_box.include(a);
        bounding_box.include(b);
        bounding_box.include(c);
    }

    MeshMeasure {
        volume: volume * VOLUME_UNIT_SCALE,
        bounding_box,
    }
}

/// Price a mesh with the configured constants.
#[must_use]
pub fn quote(triangles: &[Triangle], pricing: &PricingConfig) -> PriceQuote {
    let MeshMeasure {
        volume,
        bounding_box,
    } = measure(triangles);

    let weight = WEIGHT_PER_VOLUME * volume;
    let print_duration = (volume * volume * volume / pricing.print_speed) / 24.0;
    let total = pricing.material_cost_per_gram() * weight
        + pricing.print_cost_per_hour * (print_duration / 3600.0);

    PriceQuote {
        volume,
        weight,
        print_duration,
        total_price: total.round(),
        bounding_box,
    }
}
