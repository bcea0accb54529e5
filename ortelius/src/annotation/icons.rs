//! Name-keyed registry of marker icons.

use std::collections::HashMap;
use std::sync::Arc;

use crate::decoded_image::DecodedImage;

/// A marker image registered with the map.
#[derive(Debug, Clone)]
pub struct Icon {
    image: Arc<DecodedImage>,
    pixel_ratio: f32,
}

impl Icon {
    /// Decoded image of the icon.
    pub fn image(&self) -> &Arc<DecodedImage> {
        &self.image
    }

    /// Pixel ratio the image was produced for.
    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    /// Logical (scale-independent) size of the icon in pixels.
    pub fn size(&self) -> (f32, f32) {
        (
            self.image.width() as f32 / self.pixel_ratio,
            self.image.height() as f32 / self.pixel_ratio,
        )
    }
}

/// Store of marker icons, keyed by name.
///
/// Annotations reference icons by name only. Removing an icon leaves referencing annotations
/// intact: they render without a glyph until an icon with the same name is registered again.
/// Reference counts are advisory: they are used to warn about unused icons, not to prevent
/// removal.
#[derive(Debug, Default)]
pub struct IconRegistry {
    icons: HashMap<String, Icon, ahash::RandomState>,
    refs: HashMap<String, usize, ahash::RandomState>,
}

impl IconRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the icon with the given name.
    ///
    /// Returns true if an icon with this name was already registered.
    pub fn add_icon(
        &mut self,
        name: impl Into<String>,
        image: DecodedImage,
        pixel_ratio: f32,
    ) -> bool {
        let name = name.into();
        let pixel_ratio = if pixel_ratio.is_finite() && pixel_ratio > 0.0 {
            pixel_ratio
        } else {
            log::warn!("invalid pixel ratio {pixel_ratio} for icon \"{name}\", using 1.0");
            1.0
        };

        self.icons
            .insert(
                name,
                Icon {
                    image: Arc::new(image),
                    pixel_ratio,
                },
            )
            .is_some()
    }

    /// Removes the icon with the given name. Returns true if it was registered.
    pub fn remove_icon(&mut self, name: &str) -> bool {
        self.icons.remove(name).is_some()
    }

    /// Returns the icon registered under the given name.
    pub fn get(&self, name: &str) -> Option<&Icon> {
        self.icons.get(name)
    }

    /// Returns true if an icon with the given name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.icons.contains_key(name)
    }

    /// Records that one more annotation references the given icon name.
    pub fn retain_name(&mut self, name: &str) {
        *self.refs.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Records that one less annotation references the given icon name.
    pub fn release_name(&mut self, name: &str) {
        match self.refs.get_mut(name) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.refs.remove(name);
            }
            None => log::debug!("released icon name \"{name}\" that was not retained"),
        }
    }

    /// Number of annotations currently referencing the given icon name.
    pub fn ref_count(&self, name: &str) -> usize {
        self.refs.get(name).copied().unwrap_or(0)
    }

    /// Names of registered icons that no annotation references.
    pub fn iter_unreferenced(&self) -> impl Iterator<Item = &str> {
        self.icons
            .keys()
            .filter(|name| self.ref_count(name) == 0)
            .map(|name| name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32) -> DecodedImage {
        DecodedImage::from_raw(vec![0; (width * height * 4) as usize], width, height)
            .expect("valid buffer size")
    }

    #[test]
    fn add_replaces_by_name() {
        let mut registry = IconRegistry::new();
        assert!(!registry.add_icon("marker", image(8, 8), 1.0));
        assert!(registry.add_icon("marker", image(16, 16), 2.0));

        let icon = registry.get("marker").expect("icon is registered");
        assert_eq!(icon.size(), (8.0, 8.0));
    }

    #[test]
    fn remove_does_not_touch_refs() {
        let mut registry = IconRegistry::new();
        registry.add_icon("marker", image(8, 8), 1.0);
        registry.retain_name("marker");

        assert!(registry.remove_icon("marker"));
        assert!(!registry.remove_icon("marker"));
        assert_eq!(registry.ref_count("marker"), 1);
    }

    #[test]
    fn ref_counting() {
        let mut registry = IconRegistry::new();
        registry.add_icon("marker", image(8, 8), 1.0);
        registry.retain_name("marker");
        registry.retain_name("marker");
        registry.release_name("marker");
        assert_eq!(registry.ref_count("marker"), 1);
        registry.release_name("marker");
        assert_eq!(registry.ref_count("marker"), 0);

        assert_eq!(registry.iter_unreferenced().count(), 1);
    }
}
