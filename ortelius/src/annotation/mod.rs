//! Annotation subsystem: user-supplied markers, lines and shapes overlaid on the map.
//!
//! Annotations live in an [`AnnotationStore`] keyed by stable [`AnnotationId`]s. Before each
//! render pass the [`AnnotationLayer`] regenerates tile-local geometry for the tiles that were
//! affected by mutations since the previous pass, and rebuilds a [`SpatialQueryIndex`] so that
//! rendered annotations can be queried back by screen position.

use ortelius_types::cartesian::{Point2d, Rect};
use ortelius_types::geo::{GeoPoint2d, Projection, WebMercator};
use ortelius_types::{Contour, Polygon};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Color;

mod icons;
mod layer;
mod scheduler;
mod spatial_index;
mod store;
mod tiler;

pub use icons::{Icon, IconRegistry};
pub use layer::{
    shape_layer_id, AnnotationLayer, PassSummary, ANNOTATION_SOURCE_ID, POINT_LAYER_ID,
};
pub use scheduler::{PendingUpdates, UpdateScheduler};
pub use spatial_index::SpatialQueryIndex;
pub use store::AnnotationStore;
pub use tiler::{
    AnnotationTile, AnnotationTileEntry, MarkerGlyph, TileAnnotationIndex, TileGeometry,
    TilePrimitive,
};

/// Stable identifier of an annotation.
///
/// Ids are allocated from a monotonic counter and are never reused within the lifetime of the
/// owning map, even after the annotation is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnnotationId(u64);

impl AnnotationId {
    pub(crate) fn new(value: u64) -> Self {
        Self(value)
    }

    /// Numeric value of the id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// A single annotation overlaid on the map.
///
/// The variant defines how the annotation is rendered. An update may replace an annotation with
/// one of a different variant, but the stored value itself is never mutated in place.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Annotation {
    /// Icon marker at a single geographic position.
    Symbol(SymbolAnnotation),
    /// Stroked polyline.
    Line(LineAnnotation),
    /// Filled polygon.
    Fill(FillAnnotation),
    /// Shape that takes its paint properties from an existing style layer.
    StyleSourced(StyleSourcedAnnotation),
}

impl Annotation {
    /// Name of the icon this annotation renders with, if it is a symbol.
    pub fn icon_name(&self) -> Option<&str> {
        match self {
            Annotation::Symbol(symbol) => Some(&symbol.icon),
            _ => None,
        }
    }

    /// Bounding rectangle of the annotation geometry in projected map coordinates.
    ///
    /// Returns `None` if the geometry is empty or cannot be projected.
    pub fn projected_bounds(&self, projection: &WebMercator) -> Option<Rect> {
        match self {
            Annotation::Symbol(symbol) => {
                let point = projection.project(&symbol.position)?;
                Some(Rect::new(point.x, point.y, point.x, point.y))
            }
            Annotation::Line(line) => project_contour(&line.line, projection)?.bounding_rect(),
            Annotation::Fill(fill) => project_polygon(&fill.polygon, projection)?.bounding_rect(),
            Annotation::StyleSourced(sourced) => match &sourced.geometry {
                ShapeGeometry::Line(contour) => {
                    project_contour(contour, projection)?.bounding_rect()
                }
                ShapeGeometry::Polygon(polygon) => {
                    project_polygon(polygon, projection)?.bounding_rect()
                }
            },
        }
    }
}

impl From<SymbolAnnotation> for Annotation {
    fn from(value: SymbolAnnotation) -> Self {
        Annotation::Symbol(value)
    }
}

impl From<LineAnnotation> for Annotation {
    fn from(value: LineAnnotation) -> Self {
        Annotation::Line(value)
    }
}

impl From<FillAnnotation> for Annotation {
    fn from(value: FillAnnotation) -> Self {
        Annotation::Fill(value)
    }
}

impl From<StyleSourcedAnnotation> for Annotation {
    fn from(value: StyleSourcedAnnotation) -> Self {
        Annotation::StyleSourced(value)
    }
}

/// Icon marker placed at a geographic position.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SymbolAnnotation {
    /// Geographic position of the marker.
    pub position: GeoPoint2d,
    /// Name of the icon to render the marker with.
    ///
    /// The icon is looked up in the [`IconRegistry`] by name at render time, so the referenced
    /// icon does not need to exist when the annotation is added.
    pub icon: String,
    /// Markers with a higher z-order are drawn on top of markers with a lower one.
    pub z_order: f32,
    /// Opacity multiplier in `0.0..=1.0`.
    pub opacity: f32,
}

impl SymbolAnnotation {
    /// Creates a new symbol annotation with default z-order and opacity.
    pub fn new(position: GeoPoint2d, icon: impl Into<String>) -> Self {
        Self {
            position,
            icon: icon.into(),
            z_order: 0.0,
            opacity: 1.0,
        }
    }
}

/// Stroked polyline annotation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineAnnotation {
    /// Geographic positions of the polyline vertices.
    pub line: Contour<GeoPoint2d>,
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f64,
    /// Opacity multiplier in `0.0..=1.0`.
    pub opacity: f32,
}

impl LineAnnotation {
    /// Creates a new line annotation with default paint properties.
    pub fn new(line: Contour<GeoPoint2d>) -> Self {
        Self {
            line,
            color: Color::BLACK,
            width: 1.0,
            opacity: 1.0,
        }
    }
}

/// Filled polygon annotation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FillAnnotation {
    /// Polygon geometry: outer ring plus optional holes.
    pub polygon: Polygon<GeoPoint2d>,
    /// Fill color.
    pub color: Color,
    /// Opacity multiplier in `0.0..=1.0`.
    pub opacity: f32,
    /// Outline color, if the polygon is outlined.
    pub outline_color: Option<Color>,
}

impl FillAnnotation {
    /// Creates a new fill annotation with default paint properties.
    pub fn new(polygon: Polygon<GeoPoint2d>) -> Self {
        Self {
            polygon,
            color: Color::BLACK,
            opacity: 1.0,
            outline_color: None,
        }
    }
}

/// Geometry of a shape annotation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeGeometry {
    /// Polyline geometry.
    Line(Contour<GeoPoint2d>),
    /// Polygon geometry.
    Polygon(Polygon<GeoPoint2d>),
}

/// Shape annotation that delegates its paint properties to an existing style layer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StyleSourcedAnnotation {
    /// Geometry of the shape.
    pub geometry: ShapeGeometry,
    /// Id of the style layer the shape is painted as.
    pub layer_id: String,
}

impl StyleSourcedAnnotation {
    /// Creates a new style-sourced annotation.
    pub fn new(geometry: ShapeGeometry, layer_id: impl Into<String>) -> Self {
        Self {
            geometry,
            layer_id: layer_id.into(),
        }
    }
}

pub(crate) fn project_contour(
    contour: &Contour<GeoPoint2d>,
    projection: &WebMercator,
) -> Option<Contour<Point2d>> {
    if contour.is_empty() {
        return None;
    }

    contour.try_map_points(|p| projection.project(p))
}

pub(crate) fn project_polygon(
    polygon: &Polygon<GeoPoint2d>,
    projection: &WebMercator,
) -> Option<Polygon<Point2d>> {
    if polygon.outer_contour.is_empty() {
        return None;
    }

    polygon.try_map_points(|p| projection.project(p))
}
