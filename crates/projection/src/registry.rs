//! Projection registry: which CRS each source lives in, and how to get to
//! the common EASE-Grid target.

use std::collections::HashMap;

use ndarray::{Array2, Zip};
use seaice_common::{CrsCode, PrepError, PrepResult, Region, SourceKind};

use crate::ease::EaseGrid;
use crate::polar_stereographic::PolarStereographic;

/// A concrete coordinate system that can be converted to and from
/// geographic coordinates.
#[derive(Debug, Clone)]
pub enum Projection {
    /// EPSG:4326, coordinates are (lat, lon) in degrees
    Geographic,
    Ease(EaseGrid),
    Stereographic(PolarStereographic),
}

impl Projection {
    /// Build the projection for a CRS code.
    pub fn for_crs(code: CrsCode) -> Self {
        match code {
            CrsCode::Epsg4326 => Projection::Geographic,
            CrsCode::Epsg3408 => Projection::Ease(EaseGrid::north()),
            CrsCode::Epsg3409 => Projection::Ease(EaseGrid::south()),
            CrsCode::Epsg3411 => Projection::Stereographic(PolarStereographic::nsidc_north()),
            CrsCode::Epsg3412 => Projection::Stereographic(PolarStereographic::nsidc_south()),
        }
    }

    /// Native coordinates to (lat, lon) degrees. NaN when undefined.
    pub fn to_geographic(&self, a: f64, b: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (a, b),
            Projection::Ease(p) => p.inverse(a, b).unwrap_or((f64::NAN, f64::NAN)),
            Projection::Stereographic(p) => p.inverse(a, b),
        }
    }

    /// (lat, lon) degrees to native coordinates.
    pub fn from_geographic(&self, lat: f64, lon: f64) -> (f64, f64) {
        match self {
            Projection::Geographic => (lat, lon),
            Projection::Ease(p) => p.forward(lat, lon),
            Projection::Stereographic(p) => p.forward(lat, lon),
        }
    }
}

/// Forward coordinate transform between two registered CRSs.
///
/// Projected-to-projected transforms pass through geographic coordinates.
#[derive(Debug, Clone)]
pub struct CrsTransform {
    source: CrsCode,
    target: CrsCode,
    from: Projection,
    to: Projection,
}

impl CrsTransform {
    /// Create a transform between two CRSs.
    ///
    /// Only transforms onto the EASE-Grid targets are supported, and the
    /// source must belong to the same hemisphere.
    pub fn new(source: CrsCode, target: CrsCode) -> PrepResult<Self> {
        let supported = matches!(
            (source, target),
            (CrsCode::Epsg4326, CrsCode::Epsg3408)
                | (CrsCode::Epsg4326, CrsCode::Epsg3409)
                | (CrsCode::Epsg3411, CrsCode::Epsg3408)
                | (CrsCode::Epsg3412, CrsCode::Epsg3409)
                | (CrsCode::Epsg3408, CrsCode::Epsg3408)
                | (CrsCode::Epsg3409, CrsCode::Epsg3409)
        );
        if !supported {
            return Err(PrepError::configuration(format!(
                "unsupported transform {} -> {}",
                source, target
            )));
        }

        Ok(Self {
            source,
            target,
            from: Projection::for_crs(source),
            to: Projection::for_crs(target),
        })
    }

    pub fn source(&self) -> CrsCode {
        self.source
    }

    pub fn target(&self) -> CrsCode {
        self.target
    }

    /// Transform one coordinate pair. Geographic input is (lat, lon).
    pub fn transform(&self, a: f64, b: f64) -> (f64, f64) {
        if self.source == self.target {
            return (a, b);
        }
        let (lat, lon) = self.from.to_geographic(a, b);
        if lat.is_nan() || lon.is_nan() {
            return (f64::NAN, f64::NAN);
        }
        self.to.from_geographic(lat, lon)
    }

    /// Transform two equally shaped coordinate arrays elementwise.
    pub fn transform_arrays(
        &self,
        a: &Array2<f64>,
        b: &Array2<f64>,
    ) -> PrepResult<(Array2<f64>, Array2<f64>)> {
        if a.dim() != b.dim() {
            return Err(PrepError::shape_mismatch(format!(
                "coordinate arrays differ: {:?} vs {:?}",
                a.dim(),
                b.dim()
            )));
        }
        let mut x = Array2::zeros(a.dim());
        let mut y = Array2::zeros(a.dim());
        Zip::from(&mut x)
            .and(&mut y)
            .and(a)
            .and(b)
            .for_each(|x, y, &a, &b| {
                let (tx, ty) = self.transform(a, b);
                *x = tx;
                *y = ty;
            });
        Ok((x, y))
    }
}

/// Maps (region, source kind) to its (source CRS, target CRS) pair.
#[derive(Debug, Clone)]
pub struct ProjectionRegistry {
    pairs: HashMap<(Region, SourceKind), (CrsCode, CrsCode)>,
}

impl Default for ProjectionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl ProjectionRegistry {
    /// An empty registry; every lookup fails until pairs are registered.
    pub fn empty() -> Self {
        Self {
            pairs: HashMap::new(),
        }
    }

    /// The pairs needed for the two hemispheric domains.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        for region in [Region::North, Region::South] {
            let target = region.target_crs();
            for kind in [
                SourceKind::Motion,
                SourceKind::Reanalysis,
                SourceKind::SwathConcentration,
            ] {
                registry.register(region, kind, CrsCode::Epsg4326, target);
            }
        }
        registry.register(
            Region::North,
            SourceKind::DailyConcentration,
            CrsCode::Epsg3411,
            CrsCode::Epsg3408,
        );
        registry.register(
            Region::South,
            SourceKind::DailyConcentration,
            CrsCode::Epsg3412,
            CrsCode::Epsg3409,
        );
        registry
    }

    /// Register or replace a pair.
    pub fn register(&mut self, region: Region, kind: SourceKind, source: CrsCode, target: CrsCode) {
        self.pairs.insert((region, kind), (source, target));
    }

    /// Look up the (source, target) CRS pair.
    pub fn lookup(&self, region: Region, kind: SourceKind) -> PrepResult<(CrsCode, CrsCode)> {
        self.pairs.get(&(region, kind)).copied().ok_or_else(|| {
            PrepError::configuration(format!(
                "no projection registered for region {} and source {}",
                region, kind
            ))
        })
    }

    /// Look up a pair from textual tags such as `("NH", "noaa")`.
    pub fn lookup_tags(&self, region: &str, kind: &str) -> PrepResult<(CrsCode, CrsCode)> {
        self.lookup(region.parse()?, kind.parse()?)
    }

    /// Build the forward transform for a (region, source kind).
    pub fn transform(&self, region: Region, kind: SourceKind) -> PrepResult<CrsTransform> {
        let (source, target) = self.lookup(region, kind)?;
        CrsTransform::new(source, target)
    }
}
