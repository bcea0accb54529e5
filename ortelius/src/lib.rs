//! Ortelius is a cross-platform map rendering engine core.
//!
//! This crate contains the annotation subsystem of the engine: user-supplied markers, lines and
//! polygons overlaid on top of a tiled vector map. Annotations are added and mutated through the
//! [`Map`] facade, translated into tile-local renderable geometry before each render pass, bound
//! into the active [style document](style::Style) as synthetic sources and layers, and queryable
//! back by screen position.
//!
//! # Quick start
//!
//! ```
//! use ortelius::annotation::SymbolAnnotation;
//! use ortelius::tile_schema::TileSchema;
//! use ortelius::view::MapView;
//! use ortelius::Map;
//! use ortelius_types::cartesian::{Point2d, Size};
//! use ortelius_types::latlon;
//!
//! let view = MapView::new(Point2d::new(0.0, 0.0), 156543.03392800014)
//!     .with_size(Size::new(256.0, 256.0));
//! let mut map = Map::new(view, TileSchema::web(18));
//!
//! let id = map.add_annotation(SymbolAnnotation::new(latlon!(52.37, 4.90), "marker").into());
//! map.render();
//!
//! assert!(map.annotation(id).is_some());
//! ```

pub mod annotation;
mod color;
pub mod decoded_image;
pub mod error;
mod map;
pub mod messenger;
pub mod style;
pub mod tile_schema;
pub mod view;

pub use color::Color;
pub use map::Map;

pub use ortelius_types;
