//! GPU side of the scenes: keeps one mesh, uniform and texture binding per
//! scene object and records the frame.
//!
//! Scene logic never touches wgpu. Each frame the active scene is mirrored
//! into `objects` (`sync_bubbles` / `sync_gallery`), then `render` draws the
//! sky, opaque objects, transparent objects back to front, and the HUD.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Vec3};
use pf_core::time::TimeState;
use pf_overlay::{Hud, HudActions, HudModel, HudStats};
use pf_render::{
    Camera3D, DrawItem, GpuContext, GpuMesh, Lighting, MeshData, MeshPipeline, ObjectBinding,
    ObjectUniform, Texture,
};
use winit::window::Window;

use crate::bubbles::{BubblesScene, BUBBLE_COLOR};
use crate::gallery::{
    GalleryScene, ItemId, AUDIO_PANEL_SIZE, GROUND_COLOR, GROUND_SIZE, PAGE_PANEL_COLOR,
    PAGE_PANEL_SIZE, PLATE_COLOR,
};
use crate::motion::ObjectId;

// Inside the camera's far plane.
const SKY_RADIUS: f32 = 500.0;
const BUBBLE_SPECULAR: f32 = 1.0;

/// Declaration order is draw order for opaque keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectKey {
    Ground,
    Item(ItemId),
    Plate(ItemId),
    AudioPanel,
    PagePanel,
    Bubble(ObjectId),
}

struct GpuObject {
    mesh: GpuMesh,
    binding: ObjectBinding,
    /// `None` draws with the shared white texture.
    texture: Option<(Texture, wgpu::BindGroup)>,
    center: Vec3,
    transparent: bool,
}

/// Origin of an object's model transform, used for back-to-front sorting.
fn world_center(uniform: &ObjectUniform) -> Vec3 {
    Mat4::from_cols_array_2d(&uniform.model).transform_point3(Vec3::ZERO)
}

struct Sky {
    mesh: GpuMesh,
    binding: ObjectBinding,
    _texture: Texture,
    bind_group: wgpu::BindGroup,
}

pub struct SceneRenderer {
    pub window: Arc<Window>,
    pub gpu: GpuContext,
    pub hud: Hud,
    pipeline: MeshPipeline,
    _white: Texture,
    white_group: wgpu::BindGroup,
    sky: Option<Sky>,
    objects: BTreeMap<ObjectKey, GpuObject>,
}

impl SceneRenderer {
    pub fn new(window: Arc<Window>) -> Result<Self, String> {
        let gpu = GpuContext::new(window.clone())?;
        let pipeline = MeshPipeline::new(&gpu.device, gpu.surface_format);
        let hud = Hud::new(&gpu.device, gpu.surface_format, &window);
        let white = Texture::white(&gpu.device, &gpu.queue)?;
        let white_group = pipeline.create_texture_bind_group(&gpu.device, &white);
        Ok(Self {
            window,
            gpu,
            hud,
            pipeline,
            _white: white,
            white_group,
            sky: None,
            objects: BTreeMap::new(),
        })
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Load an equirectangular backdrop onto an inverted sphere. Returns its
    /// mean colour for the ambient light, or `None` when the file could not
    /// be used.
    pub fn load_environment(&mut self, path: &Path) -> Option<Vec3> {
        let image = match pf_render::texture::load_rgba(path) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("{e}; environment backdrop disabled");
                return None;
            }
        };
        let ambient = Vec3::from(pf_render::texture::average_color(&image));
        let uploaded =
            Texture::from_image(&self.gpu.device, &self.gpu.queue, &image, "environment");
        let texture = match uploaded {
            Ok(texture) => texture,
            Err(e) => {
                log::warn!("{e}; environment backdrop disabled");
                return Some(ambient);
            }
        };
        let bind_group = self.pipeline.create_texture_bind_group(&self.gpu.device, &texture);
        let mesh = GpuMesh::new(&self.gpu.device, &MeshData::sky_sphere(SKY_RADIUS, 32), "sky");
        let binding = self.pipeline.create_object_binding(
            &self.gpu.device,
            &ObjectUniform::new(Mat4::IDENTITY, [1.0; 4]).unlit(),
        );
        self.sky = Some(Sky {
            mesh,
            binding,
            _texture: texture,
            bind_group,
        });
        log::info!("Environment loaded from {}, ambient {ambient:?}", path.display());
        Some(ambient)
    }

    fn insert(
        &mut self,
        key: ObjectKey,
        mesh: &MeshData,
        uniform: &ObjectUniform,
        transparent: bool,
    ) {
        let label = format!("{key:?}");
        let object = GpuObject {
            mesh: GpuMesh::new(&self.gpu.device, mesh, &label),
            binding: self.pipeline.create_object_binding(&self.gpu.device, uniform),
            texture: None,
            center: world_center(uniform),
            transparent,
        };
        self.objects.insert(key, object);
    }

    fn write(&mut self, key: ObjectKey, uniform: &ObjectUniform) {
        if let Some(object) = self.objects.get_mut(&key) {
            object.binding.write(&self.gpu.queue, uniform);
            object.center = world_center(uniform);
        }
    }

    pub fn remove(&mut self, key: ObjectKey) {
        // Dropping the wgpu handles releases the buffers.
        self.objects.remove(&key);
    }

    pub fn sync_bubbles(&mut self, scene: &BubblesScene, dirty: &[ObjectId]) {
        for (&id, mesh) in scene.meshes() {
            let key = ObjectKey::Bubble(id);
            let uniform =
                ObjectUniform::new(scene.model(id), BUBBLE_COLOR).with_specular(BUBBLE_SPECULAR);
            if !self.objects.contains_key(&key) {
                self.insert(key, mesh, &uniform, true);
            } else if dirty.contains(&id) {
                if let Some(object) = self.objects.get(&key) {
                    if let Err(e) = object.mesh.update_vertices(&self.gpu.queue, mesh) {
                        log::error!("Bubble {id:?}: {e}");
                    }
                }
            }
            self.write(key, &uniform);
        }
    }

    pub fn sync_gallery(&mut self, scene: &mut GalleryScene) {
        for id in scene.take_retired() {
            self.remove(ObjectKey::Item(id));
            self.remove(ObjectKey::Plate(id));
        }

        if !self.objects.contains_key(&ObjectKey::Ground) {
            let ground = MeshData::ground(GROUND_SIZE, GROUND_SIZE);
            self.insert(
                ObjectKey::Ground,
                &ground,
                &ObjectUniform::new(Mat4::IDENTITY, GROUND_COLOR),
                false,
            );
            let audio = MeshData::panel(AUDIO_PANEL_SIZE.x, AUDIO_PANEL_SIZE.y);
            let uniform = ObjectUniform::new(Mat4::IDENTITY, scene.audio_panel_color()).unlit();
            self.insert(ObjectKey::AudioPanel, &audio, &uniform, true);
            let page = MeshData::panel(PAGE_PANEL_SIZE.x, PAGE_PANEL_SIZE.y);
            let uniform = ObjectUniform::new(Mat4::IDENTITY, PAGE_PANEL_COLOR).unlit();
            self.insert(ObjectKey::PagePanel, &page, &uniform, true);
        }

        for item in scene.items_mut() {
            let Some(image) = item.image.take() else {
                continue;
            };
            let key = ObjectKey::Item(item.id);
            let label = &item.record.image_url;
            let uploaded = Texture::from_image(&self.gpu.device, &self.gpu.queue, &image, label);
            let texture = match uploaded {
                Ok(texture) => texture,
                Err(e) => {
                    log::error!("{e}");
                    continue;
                }
            };
            let bind_group = self.pipeline.create_texture_bind_group(&self.gpu.device, &texture);
            let panel = MeshData::panel(item.layout.width, item.layout.height);
            self.insert(key, &panel, &ObjectUniform::new(Mat4::IDENTITY, [1.0; 4]), false);
            if let Some(object) = self.objects.get_mut(&key) {
                object.texture = Some((texture, bind_group));
            }
            let plate = MeshData::panel(item.layout.plate_width, item.layout.plate_height);
            self.insert(
                ObjectKey::Plate(item.id),
                &plate,
                &ObjectUniform::new(Mat4::IDENTITY, PLATE_COLOR).unlit(),
                true,
            );
        }

        let mut updates = Vec::with_capacity(scene.items().len() * 2 + 3);
        for item in scene.items() {
            let (_, visibility) = item.pose();
            updates.push((
                ObjectKey::Item(item.id),
                ObjectUniform::new(scene.item_transform(item), [1.0; 4])
                    .unlit()
                    .with_visibility(visibility),
            ));
            updates.push((
                ObjectKey::Plate(item.id),
                ObjectUniform::new(scene.plate_transform(item), PLATE_COLOR)
                    .unlit()
                    .with_visibility(visibility),
            ));
        }
        updates.push((
            ObjectKey::AudioPanel,
            ObjectUniform::new(scene.audio_panel_transform(), scene.audio_panel_color()).unlit(),
        ));
        updates.push((
            ObjectKey::PagePanel,
            ObjectUniform::new(scene.page_panel_transform(), PAGE_PANEL_COLOR).unlit(),
        ));
        updates.push((ObjectKey::Ground, ObjectUniform::new(Mat4::IDENTITY, GROUND_COLOR)));
        for (key, uniform) in updates {
            // Item panels fade too, so they join the sorted transparent set.
            if let (ObjectKey::Item(_), Some(object)) = (key, self.objects.get_mut(&key)) {
                object.transparent = uniform.params[1] < 1.0;
            }
            self.write(key, &uniform);
        }
    }

    pub fn render(
        &mut self,
        time: &TimeState,
        clear: [f64; 3],
        camera: &Camera3D,
        lighting: &Lighting,
        model: &HudModel,
        stats: &mut HudStats,
    ) -> HudActions {
        if self.gpu.size.0 == 0 || self.gpu.size.1 == 0 {
            return HudActions::default();
        }

        self.pipeline
            .update_scene(&self.gpu.queue, &camera.build_uniform(lighting));
        if let Some(sky) = &self.sky {
            let uniform = ObjectUniform::new(Mat4::from_translation(camera.eye), [1.0; 4]).unlit();
            sky.binding.write(&self.gpu.queue, &uniform);
        }

        let mut opaque = Vec::new();
        let mut transparent = Vec::new();
        for object in self.objects.values() {
            if object.transparent {
                transparent.push(object);
            } else {
                opaque.push(object);
            }
        }
        transparent.sort_by(|a, b| {
            let da = a.center.distance_squared(camera.eye);
            let db = b.center.distance_squared(camera.eye);
            db.total_cmp(&da)
        });

        let white = &self.white_group;
        let mut items: Vec<DrawItem> = Vec::with_capacity(self.objects.len() + 1);
        if let Some(sky) = &self.sky {
            items.push(DrawItem {
                mesh: &sky.mesh,
                object: &sky.binding,
                texture: &sky.bind_group,
            });
        }
        for object in opaque.into_iter().chain(transparent) {
            items.push(DrawItem {
                mesh: &object.mesh,
                object: &object.binding,
                texture: object.texture.as_ref().map_or(white, |(_, group)| group),
            });
        }
        stats.draw_calls = items.len() as u32;

        let Some((output, view)) = self.gpu.begin_frame() else {
            return HudActions::default();
        };

        let (egui_primitives, egui_textures_delta, actions) =
            self.hud.prepare(&self.window, time, model, stats);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: clear[0],
                            g: clear[1],
                            b: clear[2],
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.gpu.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            self.pipeline.draw(&mut render_pass, items);
        }

        self.hud.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );

        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.hud
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }

        self.hud.cleanup(&egui_textures_delta);
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_center_follows_the_model_transform() {
        let at = Vec3::new(0.75, 1.8, -0.2);
        let uniform = ObjectUniform::new(Mat4::from_translation(at), [1.0; 4]);
        assert!((world_center(&uniform) - at).length() < 1e-6);
    }
}
