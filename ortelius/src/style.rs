//! Minimal style document model the annotation engine binds itself into.
//!
//! The actual style cascade and parsing live in an external engine. This module only models the
//! parts the annotation subsystem interacts with: named sources, an ordered list of layers, and
//! the paint properties that [style-sourced annotations](crate::annotation::StyleSourcedAnnotation)
//! delegate to.

use crate::Color;

/// Ordered collection of style layers with the sources they draw from.
///
/// Layers are painted in the order they appear in the document: later layers are drawn on top of
/// earlier ones.
#[derive(Debug, Default, Clone)]
pub struct Style {
    sources: Vec<String>,
    layers: Vec<StyleLayer>,
}

impl Style {
    /// Creates an empty style with no sources and no layers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a source with the given id. Does nothing if the source is already registered.
    pub fn ensure_source(&mut self, id: &str) {
        if !self.has_source(id) {
            self.sources.push(id.to_string());
        }
    }

    /// Returns true if a source with the given id is registered.
    pub fn has_source(&self, id: &str) -> bool {
        self.sources.iter().any(|s| s == id)
    }

    /// Appends a layer to the top of the document.
    pub fn add_layer(&mut self, layer: StyleLayer) {
        self.layers.push(layer);
    }

    /// Removes the layer with the given id, returning it if it was present.
    pub fn remove_layer(&mut self, id: &str) -> Option<StyleLayer> {
        let index = self.layers.iter().position(|l| l.id == id)?;
        Some(self.layers.remove(index))
    }

    /// Returns the layer with the given id.
    pub fn layer(&self, id: &str) -> Option<&StyleLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Position of the layer with the given id in the paint order.
    pub fn layer_index(&self, id: &str) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    /// All layers of the style in paint order.
    pub fn layers(&self) -> &[StyleLayer] {
        &self.layers
    }
}

/// Single layer of a style document.
#[derive(Debug, Clone)]
pub struct StyleLayer {
    id: String,
    source: Option<String>,
    paint: LayerPaint,
}

impl StyleLayer {
    /// Creates a new layer with the given id and paint.
    pub fn new(id: impl Into<String>, paint: LayerPaint) -> Self {
        Self {
            id: id.into(),
            source: None,
            paint,
        }
    }

    /// Returns a copy of the layer bound to the given source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Id of the layer.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the source the layer draws from.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Paint properties of the layer.
    pub fn paint(&self) -> &LayerPaint {
        &self.paint
    }
}

/// Paint properties of a style layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerPaint {
    /// Solid background fill.
    Background {
        /// Background color.
        color: Color,
    },
    /// Icon markers placed at point locations.
    Symbol,
    /// Stroked lines.
    Line {
        /// Stroke color.
        color: Color,
        /// Stroke width in pixels.
        width: f64,
        /// Opacity multiplier in `0.0..=1.0`.
        opacity: f32,
    },
    /// Filled polygons.
    Fill {
        /// Fill color.
        color: Color,
        /// Opacity multiplier in `0.0..=1.0`.
        opacity: f32,
        /// Outline color, if the fill is outlined.
        outline_color: Option<Color>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_order_and_lookup() {
        let mut style = Style::new();
        style.add_layer(StyleLayer::new(
            "water",
            LayerPaint::Fill {
                color: Color::BLUE,
                opacity: 1.0,
                outline_color: None,
            },
        ));
        style.add_layer(StyleLayer::new(
            "roads",
            LayerPaint::Line {
                color: Color::BLACK,
                width: 2.0,
                opacity: 1.0,
            },
        ));

        assert_eq!(style.layer_index("water"), Some(0));
        assert_eq!(style.layer_index("roads"), Some(1));
        assert!(style.layer("tunnels").is_none());

        let removed = style.remove_layer("water").expect("layer exists");
        assert_eq!(removed.id(), "water");
        assert_eq!(style.layer_index("roads"), Some(0));
    }

    #[test]
    fn sources_are_deduplicated() {
        let mut style = Style::new();
        style.ensure_source("annotations");
        style.ensure_source("annotations");
        assert!(style.has_source("annotations"));
        assert_eq!(style.sources.len(), 1);
    }
}
