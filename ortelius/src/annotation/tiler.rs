//! Translation of annotation entities into tile-local renderable geometry.

use ortelius_types::cartesian::{Point2d, Rect};
use ortelius_types::geo::{GeoPoint2d, Projection, WebMercator};
use ortelius_types::{ClosedContour, Contour, Polygon};

use crate::annotation::{
    project_contour, project_polygon, Annotation, AnnotationId, AnnotationStore, IconRegistry,
    ShapeGeometry,
};
use crate::tile_schema::{TileIndex, TileSchema};
use crate::Color;

/// Extra clip margin around a tile, in tile pixels, so that stroke caps and outlines of shapes
/// crossing the tile edge are not cut visibly.
const SHAPE_BUFFER_PX: f64 = 4.0;

/// Footprint of a marker icon, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerGlyph {
    /// Width of the icon.
    pub width: f32,
    /// Height of the icon.
    pub height: f32,
}

/// Geometry of a delegated (style-sourced) primitive in tile-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum TileGeometry {
    /// Polyline geometry.
    Line(Contour<Point2d>),
    /// Polygon geometry.
    Polygon(Polygon<Point2d>),
}

/// Renderable primitive produced for one annotation in one tile.
///
/// All coordinates are tile-local pixels: `(0, 0)` is the top-left corner of the tile and both
/// axes span `0..tile_size`, possibly exceeded by the clip buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum TilePrimitive {
    /// Placement of an icon marker.
    Marker {
        /// Position of the marker anchor.
        position: Point2d,
        /// Name of the referenced icon. The image is looked up by name at render time, so the
        /// glyph a marker renders with can change without regenerating the tile.
        icon: String,
        /// Footprint of the resolved icon. `None` if the icon name is currently unresolved; the
        /// placement is still emitted so the marker stays addressable, it just renders nothing.
        glyph: Option<MarkerGlyph>,
        /// Markers with a higher z-order are drawn on top.
        z_order: f32,
        /// Opacity multiplier in `0.0..=1.0`.
        opacity: f32,
    },
    /// Stroked polyline piece.
    Stroke {
        /// Clipped polyline geometry.
        line: Contour<Point2d>,
        /// Stroke color.
        color: Color,
        /// Stroke width in pixels.
        width: f64,
        /// Opacity multiplier in `0.0..=1.0`.
        opacity: f32,
    },
    /// Filled polygon.
    Shape {
        /// Clipped polygon geometry.
        polygon: Polygon<Point2d>,
        /// Fill color.
        color: Color,
        /// Opacity multiplier in `0.0..=1.0`.
        opacity: f32,
        /// Outline color, if the shape is outlined.
        outline_color: Option<Color>,
    },
    /// Geometry that is painted by an existing style layer.
    Delegate {
        /// Clipped geometry of the shape.
        geometry: TileGeometry,
        /// Id of the style layer that provides the paint properties.
        layer_id: String,
    },
}

/// Renderable geometry generated for one annotation in one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationTileEntry {
    /// Id of the annotation the geometry was generated from.
    pub id: AnnotationId,
    /// Position of the entry in the paint order of the tile. Entries with a higher value are
    /// drawn on top.
    pub paint_order: u32,
    /// The renderable primitive.
    pub primitive: TilePrimitive,
}

/// Complete renderable content of one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationTile {
    /// Index of the tile.
    pub index: TileIndex,
    /// Generation of the annotation state the tile was generated from.
    pub generation: u64,
    /// Entries of the tile in paint order.
    pub entries: Vec<AnnotationTileEntry>,
}

impl AnnotationTile {
    /// Returns true if the tile contains no renderable entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Generates tile-local renderable geometry from annotation store and icon registry snapshots.
///
/// Generation is a pure function of its inputs: for a fixed store, registry and schema the same
/// tile index always produces the same entries, which makes tile content safe to cache and
/// compare.
pub struct TileAnnotationIndex<'a> {
    store: &'a AnnotationStore,
    icons: &'a IconRegistry,
    schema: &'a TileSchema,
}

impl<'a> TileAnnotationIndex<'a> {
    /// Creates a generator over the given snapshots.
    pub fn new(store: &'a AnnotationStore, icons: &'a IconRegistry, schema: &'a TileSchema) -> Self {
        Self {
            store,
            icons,
            schema,
        }
    }

    /// Generates renderable entries for the given tile.
    ///
    /// Returns `None` if the tile index is outside the schema. Annotations with empty or
    /// degenerate geometry produce no entries but are not an error.
    pub fn generate(&self, index: TileIndex) -> Option<Vec<AnnotationTileEntry>> {
        let bbox = self.schema.tile_bbox(index)?;
        let resolution = self.schema.lod_resolution(index.z)?;
        let tile_size = self.schema.tile_size() as f64;

        let to_local = |p: &Point2d| {
            Point2d::new(
                (p.x - bbox.x_min()) / resolution,
                (bbox.y_max() - p.y) / resolution,
            )
        };

        let mut shapes = Vec::new();
        let mut markers = Vec::new();

        for id in self.store.ordered_ids() {
            let Some(annotation) = self.store.get(id) else {
                continue;
            };

            match annotation {
                Annotation::Symbol(symbol) => {
                    let Some(projected) = WebMercator.project(&symbol.position) else {
                        continue;
                    };

                    let glyph = self.icons.get(&symbol.icon).map(|icon| {
                        let (width, height) = icon.size();
                        MarkerGlyph { width, height }
                    });
                    if glyph.is_none() {
                        log::debug!(
                            "icon \"{}\" referenced by annotation {id:?} is not registered",
                            symbol.icon
                        );
                    }

                    // The icon footprint determines how far outside its own tile a marker is
                    // still visible.
                    let buffer = glyph
                        .map(|g| f64::from(g.width.max(g.height)) / 2.0)
                        .unwrap_or(0.0);
                    let position = to_local(&projected);
                    if position.x >= -buffer
                        && position.x <= tile_size + buffer
                        && position.y >= -buffer
                        && position.y <= tile_size + buffer
                    {
                        markers.push((
                            id,
                            TilePrimitive::Marker {
                                position,
                                icon: symbol.icon.clone(),
                                glyph,
                                z_order: symbol.z_order,
                                opacity: symbol.opacity,
                            },
                        ));
                    }
                }
                Annotation::Line(line) => {
                    let buffer = line.width / 2.0 + SHAPE_BUFFER_PX;
                    for piece in clip_projected_contour(&line.line, &to_local, tile_size, buffer) {
                        shapes.push((
                            id,
                            TilePrimitive::Stroke {
                                line: piece,
                                color: line.color,
                                width: line.width,
                                opacity: line.opacity,
                            },
                        ));
                    }
                }
                Annotation::Fill(fill) => {
                    if let Some(polygon) =
                        clip_projected_polygon(&fill.polygon, &to_local, tile_size, SHAPE_BUFFER_PX)
                    {
                        shapes.push((
                            id,
                            TilePrimitive::Shape {
                                polygon,
                                color: fill.color,
                                opacity: fill.opacity,
                                outline_color: fill.outline_color,
                            },
                        ));
                    }
                }
                Annotation::StyleSourced(sourced) => match &sourced.geometry {
                    ShapeGeometry::Line(contour) => {
                        for piece in
                            clip_projected_contour(contour, &to_local, tile_size, SHAPE_BUFFER_PX)
                        {
                            shapes.push((
                                id,
                                TilePrimitive::Delegate {
                                    geometry: TileGeometry::Line(piece),
                                    layer_id: sourced.layer_id.clone(),
                                },
                            ));
                        }
                    }
                    ShapeGeometry::Polygon(polygon) => {
                        if let Some(polygon) =
                            clip_projected_polygon(polygon, &to_local, tile_size, SHAPE_BUFFER_PX)
                        {
                            shapes.push((
                                id,
                                TilePrimitive::Delegate {
                                    geometry: TileGeometry::Polygon(polygon),
                                    layer_id: sourced.layer_id.clone(),
                                },
                            ));
                        }
                    }
                },
            }
        }

        // Shapes are painted below markers; markers are ordered by z-order, then by age.
        markers.sort_by(|(a_id, a), (b_id, b)| {
            let (a_z, b_z) = match (a, b) {
                (TilePrimitive::Marker { z_order: a_z, .. }, TilePrimitive::Marker { z_order: b_z, .. }) => {
                    (*a_z, *b_z)
                }
                _ => (0.0, 0.0),
            };
            a_z.total_cmp(&b_z).then(a_id.cmp(b_id))
        });

        Some(
            shapes
                .into_iter()
                .chain(markers)
                .enumerate()
                .map(|(order, (id, primitive))| AnnotationTileEntry {
                    id,
                    paint_order: order as u32,
                    primitive,
                })
                .collect(),
        )
    }
}

fn clip_projected_contour(
    contour: &Contour<GeoPoint2d>,
    to_local: &impl Fn(&Point2d) -> Point2d,
    tile_size: f64,
    buffer: f64,
) -> Vec<Contour<Point2d>> {
    let Some(projected) = project_contour(contour, &WebMercator) else {
        return vec![];
    };
    if projected.len() < 2 {
        return vec![];
    }

    let local: Vec<Point2d> = projected.points().iter().map(to_local).collect();
    let clip = clip_rect(tile_size, buffer);
    match Rect::from_points(local.iter()) {
        Some(bounds) if bounds.intersects(&clip) => clip_polyline(&local, clip)
            .into_iter()
            .map(Contour::new)
            .collect(),
        _ => vec![],
    }
}

fn clip_projected_polygon(
    polygon: &Polygon<GeoPoint2d>,
    to_local: &impl Fn(&Point2d) -> Point2d,
    tile_size: f64,
    buffer: f64,
) -> Option<Polygon<Point2d>> {
    let projected = project_polygon(polygon, &WebMercator)?;
    if projected.outer_contour.len() < 3 {
        return None;
    }

    let clip = clip_rect(tile_size, buffer);
    let map_ring = |ring: &ClosedContour<Point2d>| {
        let local: Vec<Point2d> = ring.points().iter().map(to_local).collect();
        clip_ring(&local, clip)
    };

    let outer = map_ring(&projected.outer_contour);
    if outer.len() < 3 {
        return None;
    }

    let holes = projected
        .inner_contours
        .iter()
        .map(|ring| map_ring(ring))
        .filter(|points| points.len() >= 3)
        .map(ClosedContour::new)
        .collect();

    Some(Polygon::new(ClosedContour::new(outer), holes))
}

fn clip_rect(tile_size: f64, buffer: f64) -> Rect {
    Rect::new(-buffer, -buffer, tile_size + buffer, tile_size + buffer)
}

/// Clips a polyline to the given rectangle, splitting it into pieces where it leaves the
/// rectangle.
fn clip_polyline(points: &[Point2d], rect: Rect) -> Vec<Vec<Point2d>> {
    const EPS: f64 = 1e-9;

    let mut pieces = Vec::new();
    let mut current: Vec<Point2d> = Vec::new();

    for pair in points.windows(2) {
        match clip_segment(pair[0], pair[1], rect) {
            Some((start, end)) => {
                let continues = current
                    .last()
                    .is_some_and(|last| (last.x - start.x).abs() < EPS && (last.y - start.y).abs() < EPS);
                if !continues {
                    if current.len() >= 2 {
                        pieces.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                    current.push(start);
                }
                current.push(end);
            }
            None => {
                if current.len() >= 2 {
                    pieces.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }

    if current.len() >= 2 {
        pieces.push(current);
    }

    pieces
}

/// Liang-Barsky segment clipping.
fn clip_segment(a: Point2d, b: Point2d, rect: Rect) -> Option<(Point2d, Point2d)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    let checks = [
        (-dx, a.x - rect.x_min()),
        (dx, rect.x_max() - a.x),
        (-dy, a.y - rect.y_min()),
        (dy, rect.y_max() - a.y),
    ];

    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }

    Some((
        Point2d::new(a.x + t0 * dx, a.y + t0 * dy),
        Point2d::new(a.x + t1 * dx, a.y + t1 * dy),
    ))
}

/// Sutherland-Hodgman ring clipping against an axis-aligned rectangle.
fn clip_ring(points: &[Point2d], rect: Rect) -> Vec<Point2d> {
    enum Edge {
        Left(f64),
        Right(f64),
        Bottom(f64),
        Top(f64),
    }

    impl Edge {
        fn is_inside(&self, p: &Point2d) -> bool {
            match self {
                Edge::Left(x) => p.x >= *x,
                Edge::Right(x) => p.x <= *x,
                Edge::Bottom(y) => p.y >= *y,
                Edge::Top(y) => p.y <= *y,
            }
        }

        fn intersect(&self, a: &Point2d, b: &Point2d) -> Point2d {
            match self {
                Edge::Left(x) | Edge::Right(x) => {
                    let t = (x - a.x) / (b.x - a.x);
                    Point2d::new(*x, a.y + t * (b.y - a.y))
                }
                Edge::Bottom(y) | Edge::Top(y) => {
                    let t = (y - a.y) / (b.y - a.y);
                    Point2d::new(a.x + t * (b.x - a.x), *y)
                }
            }
        }
    }

    let edges = [
        Edge::Left(rect.x_min()),
        Edge::Right(rect.x_max()),
        Edge::Bottom(rect.y_min()),
        Edge::Top(rect.y_max()),
    ];

    let mut output = points.to_vec();
    for edge in edges {
        if output.is_empty() {
            break;
        }

        let input = std::mem::take(&mut output);
        for i in 0..input.len() {
            let current = input[i];
            let previous = input[(i + input.len() - 1) % input.len()];
            let current_inside = edge.is_inside(&current);
            let previous_inside = edge.is_inside(&previous);

            if current_inside {
                if !previous_inside {
                    output.push(edge.intersect(&previous, &current));
                }
                output.push(current);
            } else if previous_inside {
                output.push(edge.intersect(&previous, &current));
            }
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use ortelius_types::latlon;

    use super::*;
    use crate::annotation::{FillAnnotation, LineAnnotation, SymbolAnnotation};
    use crate::decoded_image::DecodedImage;

    fn icon_image(size: u32) -> DecodedImage {
        DecodedImage::from_raw(vec![0; (size * size * 4) as usize], size, size)
            .expect("valid buffer size")
    }

    fn world_polygon(points: &[(f64, f64)]) -> Polygon<GeoPoint2d> {
        Polygon::from(ClosedContour::new(
            points.iter().map(|(lat, lon)| latlon!(*lat, *lon)).collect(),
        ))
    }

    #[test]
    fn symbol_is_placed_in_tile_center() {
        let mut store = AnnotationStore::new();
        let mut icons = IconRegistry::new();
        icons.add_icon("marker", icon_image(16), 1.0);
        let id = store.add(SymbolAnnotation::new(latlon!(0.0, 0.0), "marker").into());

        let schema = TileSchema::web(3);
        let entries = TileAnnotationIndex::new(&store, &icons, &schema)
            .generate(TileIndex::new(0, 0, 0))
            .expect("tile is within the schema");

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, id);
        match &entries[0].primitive {
            TilePrimitive::Marker { position, glyph, icon, .. } => {
                assert!((position.x - 128.0).abs() < 1e-6);
                assert!((position.y - 128.0).abs() < 1e-6);
                assert_eq!(icon, "marker");
                assert_eq!(*glyph, Some(MarkerGlyph { width: 16.0, height: 16.0 }));
            }
            other => panic!("expected a marker, got {other:?}"),
        }
    }

    #[test]
    fn unresolved_icon_emits_placement_without_glyph() {
        let mut store = AnnotationStore::new();
        let icons = IconRegistry::new();
        store.add(SymbolAnnotation::new(latlon!(0.0, 0.0), "missing").into());

        let schema = TileSchema::web(3);
        let entries = TileAnnotationIndex::new(&store, &icons, &schema)
            .generate(TileIndex::new(0, 0, 0))
            .expect("tile is within the schema");

        assert_eq!(entries.len(), 1);
        match &entries[0].primitive {
            TilePrimitive::Marker { glyph, .. } => assert!(glyph.is_none()),
            other => panic!("expected a marker, got {other:?}"),
        }
    }

    #[test]
    fn line_is_clipped_to_tile() {
        let mut store = AnnotationStore::new();
        let icons = IconRegistry::new();
        let mut line =
            LineAnnotation::new(Contour::new(vec![latlon!(10.0, 10.0), latlon!(40.0, 40.0)]));
        line.width = 5.0;
        store.add(line.into());

        let schema = TileSchema::web(3);
        // At z == 1 the north-east quadrant of the world is tile (1, 0).
        let entries = TileAnnotationIndex::new(&store, &icons, &schema)
            .generate(TileIndex::new(1, 0, 1))
            .expect("tile is within the schema");

        assert_eq!(entries.len(), 1);
        match &entries[0].primitive {
            TilePrimitive::Stroke { line, width, .. } => {
                assert_eq!(*width, 5.0);
                assert!(line.len() >= 2);
                let clip = clip_rect(256.0, 5.0 / 2.0 + SHAPE_BUFFER_PX);
                for point in line.points() {
                    assert!(clip.contains(point), "{point:?} is outside the clip rect");
                }
            }
            other => panic!("expected a stroke, got {other:?}"),
        }

        // The south-west quadrant does not contain the line.
        let entries = TileAnnotationIndex::new(&store, &icons, &schema)
            .generate(TileIndex::new(0, 1, 1))
            .expect("tile is within the schema");
        assert!(entries.is_empty());
    }

    #[test]
    fn degenerate_geometry_produces_no_entries() {
        let mut store = AnnotationStore::new();
        let icons = IconRegistry::new();
        store.add(LineAnnotation::new(Contour::default()).into());
        store.add(LineAnnotation::new(Contour::new(vec![latlon!(0.0, 0.0)])).into());
        store.add(FillAnnotation::new(world_polygon(&[(0.0, 0.0), (10.0, 10.0)])).into());

        let schema = TileSchema::web(3);
        let entries = TileAnnotationIndex::new(&store, &icons, &schema)
            .generate(TileIndex::new(0, 0, 0))
            .expect("tile is within the schema");
        assert!(entries.is_empty());
    }

    #[test]
    fn fill_covering_tile_is_clipped_to_buffer() {
        let mut store = AnnotationStore::new();
        let icons = IconRegistry::new();
        store.add(
            FillAnnotation::new(world_polygon(&[
                (-80.0, -170.0),
                (-80.0, 170.0),
                (80.0, 170.0),
                (80.0, -170.0),
            ]))
            .into(),
        );

        let schema = TileSchema::web(3);
        let entries = TileAnnotationIndex::new(&store, &icons, &schema)
            .generate(TileIndex::new(1, 1, 2))
            .expect("tile is within the schema");

        assert_eq!(entries.len(), 1);
        match &entries[0].primitive {
            TilePrimitive::Shape { polygon, .. } => {
                let clip = clip_rect(256.0, SHAPE_BUFFER_PX);
                for point in polygon.outer_contour.points() {
                    assert!(clip.contains(point));
                }
            }
            other => panic!("expected a shape, got {other:?}"),
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let mut store = AnnotationStore::new();
        let mut icons = IconRegistry::new();
        icons.add_icon("marker", icon_image(8), 1.0);
        store.add(SymbolAnnotation::new(latlon!(10.0, 10.0), "marker").into());
        store.add(
            LineAnnotation::new(Contour::new(vec![latlon!(0.0, 0.0), latlon!(30.0, 30.0)])).into(),
        );

        let schema = TileSchema::web(3);
        let index = TileAnnotationIndex::new(&store, &icons, &schema);
        let first = index.generate(TileIndex::new(1, 0, 1)).expect("valid tile");
        let second = index.generate(TileIndex::new(1, 0, 1)).expect("valid tile");
        assert_eq!(first, second);
    }

    #[test]
    fn shapes_are_painted_below_markers() {
        let mut store = AnnotationStore::new();
        let mut icons = IconRegistry::new();
        icons.add_icon("marker", icon_image(8), 1.0);
        // The marker is added first but must still be painted on top of the shape.
        store.add(SymbolAnnotation::new(latlon!(0.0, 0.0), "marker").into());
        store.add(
            FillAnnotation::new(world_polygon(&[
                (-10.0, -10.0),
                (-10.0, 10.0),
                (10.0, 10.0),
                (10.0, -10.0),
            ]))
            .into(),
        );

        let schema = TileSchema::web(3);
        let entries = TileAnnotationIndex::new(&store, &icons, &schema)
            .generate(TileIndex::new(0, 0, 0))
            .expect("valid tile");

        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0].primitive, TilePrimitive::Shape { .. }));
        assert!(matches!(entries[1].primitive, TilePrimitive::Marker { .. }));
        assert!(entries[0].paint_order < entries[1].paint_order);
    }

    #[test]
    fn clip_polyline_splits_into_pieces() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let points = [
            Point2d::new(-5.0, 5.0),
            Point2d::new(5.0, 5.0),
            Point2d::new(15.0, 5.0),
            Point2d::new(15.0, 8.0),
            Point2d::new(5.0, 8.0),
        ];

        let pieces = clip_polyline(&points, rect);
        assert_eq!(pieces.len(), 2);
        assert_eq!(pieces[0].first(), Some(&Point2d::new(0.0, 5.0)));
        assert_eq!(pieces[0].last(), Some(&Point2d::new(10.0, 5.0)));
        assert_eq!(pieces[1].first(), Some(&Point2d::new(10.0, 8.0)));
        assert_eq!(pieces[1].last(), Some(&Point2d::new(5.0, 8.0)));
    }

    #[test]
    fn clip_ring_cuts_corners() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let ring = [
            Point2d::new(-5.0, -5.0),
            Point2d::new(15.0, -5.0),
            Point2d::new(15.0, 15.0),
            Point2d::new(-5.0, 15.0),
        ];

        let clipped = clip_ring(&ring, rect);
        assert_eq!(clipped.len(), 4);
        for point in &clipped {
            assert!(rect.contains(point));
        }

        let outside = [
            Point2d::new(20.0, 20.0),
            Point2d::new(30.0, 20.0),
            Point2d::new(30.0, 30.0),
        ];
        assert!(clip_ring(&outside, rect).is_empty());
    }
}
