//! Ring layout for one gallery page.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub radius: f32,
    pub panel_width: f32,
    /// Height of a panel's bottom edge above the floor.
    pub base_height: f32,
    pub panel_depth: f32,
    pub plate_height: f32,
    /// Gap between the panel's bottom edge and the title plate.
    pub plate_gap: f32,
    /// Extra width of the plate over the panel.
    pub plate_margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            radius: 0.75,
            panel_width: 0.5,
            base_height: 1.3,
            panel_depth: 0.001,
            plate_height: 0.1,
            plate_gap: 0.05,
            plate_margin: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemLayout {
    pub angle: f32,
    /// Panel centre relative to the gallery root.
    pub position: Vec3,
    /// Rotation about +Y turning local -Z towards the ring centre.
    pub yaw: f32,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Title plate centre in the panel's local frame.
    pub plate_offset: Vec3,
    pub plate_width: f32,
    pub plate_height: f32,
}

impl ItemLayout {
    /// Panel transform under a gallery root rotated by `gallery_yaw`, with
    /// the item lifted by `y_offset` (page transition animation).
    pub fn transform(&self, gallery_yaw: f32, y_offset: f32) -> Mat4 {
        Mat4::from_rotation_y(gallery_yaw)
            * Mat4::from_rotation_translation(
                Quat::from_rotation_y(self.yaw),
                self.position + Vec3::Y * y_offset,
            )
    }

    pub fn plate_transform(&self, gallery_yaw: f32, y_offset: f32) -> Mat4 {
        self.transform(gallery_yaw, y_offset) * Mat4::from_translation(self.plate_offset)
    }

    /// Direction the panel's front face points, ignoring the gallery root.
    pub fn facing(&self) -> Vec3 {
        Quat::from_rotation_y(self.yaw) * Vec3::NEG_Z
    }
}

/// Place item `index` of `count` on the ring. `aspect` is width / height of
/// the decoded image; non-positive values are treated as square.
pub fn layout_item(index: usize, count: usize, aspect: f32, config: &LayoutConfig) -> ItemLayout {
    let angle = if count == 0 {
        0.0
    } else {
        TAU * index as f32 / count as f32
    };
    let aspect = if aspect.is_finite() && aspect > 0.0 { aspect } else { 1.0 };
    let width = config.panel_width;
    let height = width / aspect;
    let position = Vec3::new(
        config.radius * angle.cos(),
        height / 2.0 + config.base_height,
        config.radius * angle.sin(),
    );
    let plate_y = -height / 2.0 - config.plate_gap - config.plate_height / 2.0;

    ItemLayout {
        angle,
        position,
        yaw: FRAC_PI_2 - angle,
        width,
        height,
        depth: config.panel_depth,
        // Slightly in front of the panel face.
        plate_offset: Vec3::new(0.0, plate_y, -0.01),
        plate_width: width + config.plate_margin,
        plate_height: config.plate_height,
    }
}

/// `ceil(item_count / page_size)`; zero items means zero pages.
pub fn total_pages(item_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    item_count.div_ceil(page_size)
}

/// The items on `page`, empty when the page is out of range.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_mul(page_size).min(items.len());
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_pages_rounds_up() {
        let size = 8;
        assert_eq!(total_pages(0, size), 0);
        assert_eq!(total_pages(1, size), 1);
        assert_eq!(total_pages(size, size), 1);
        assert_eq!(total_pages(size + 1, size), 2);
        assert_eq!(total_pages(2 * size, size), 2);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn page_slice_clamps() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(page_slice(&items, 0, 8), &items[0..8]);
        assert_eq!(page_slice(&items, 1, 8), &items[8..10]);
        assert!(page_slice(&items, 2, 8).is_empty());
    }

    #[test]
    fn angles_are_evenly_spaced() {
        let config = LayoutConfig::default();
        for n in [1usize, 3, 8] {
            let layouts: Vec<_> = (0..n).map(|i| layout_item(i, n, 1.5, &config)).collect();
            for pair in layouts.windows(2) {
                assert!((pair[1].angle - pair[0].angle - TAU / n as f32).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn every_panel_faces_the_centre() {
        let config = LayoutConfig::default();
        let n = 8;
        for i in 0..n {
            let item = layout_item(i, n, 0.75, &config);
            let to_centre = Vec3::new(-item.position.x, 0.0, -item.position.z).normalize();
            assert!(
                item.facing().dot(to_centre) > 0.9999,
                "item {i} faces {}",
                item.facing()
            );
            let horizontal = Vec3::new(item.position.x, 0.0, item.position.z).length();
            assert!((horizontal - 0.75).abs() < 1e-5);
        }
    }

    #[test]
    fn height_follows_aspect_ratio() {
        let config = LayoutConfig::default();
        let wide = layout_item(0, 1, 2.0, &config);
        assert_eq!(wide.width, 0.5);
        assert!((wide.height - 0.25).abs() < 1e-6);
        assert!((wide.position.y - (0.125 + 1.3)).abs() < 1e-6);
        assert!((wide.plate_width - 0.55).abs() < 1e-6);
        assert!((wide.plate_offset.y - (-0.125 - 0.05 - 0.05)).abs() < 1e-6);

        let broken = layout_item(0, 1, 0.0, &config);
        assert!((broken.height - 0.5).abs() < 1e-6);
    }

    #[test]
    fn transform_applies_lift_and_gallery_rotation() {
        let item = layout_item(0, 4, 1.0, &LayoutConfig::default());
        let lifted = item.transform(0.0, 0.5).transform_point3(Vec3::ZERO);
        assert!((lifted.y - (item.position.y + 0.5)).abs() < 1e-6);

        let turned = item
            .transform(std::f32::consts::PI, 0.0)
            .transform_point3(Vec3::ZERO);
        assert!((turned.x + item.position.x).abs() < 1e-5);
    }
}
