//! Material Parser

use glam::Vec3;
use model_common::{Material, MaterialId, Model, NodeId};

use crate::device::GraphicsDevice;
use crate::scene::ForeignNode;
use crate::texture::TextureResolver;

/// Append the node's material to the model and attach it to `node_id`
///
/// Never fails: an absent material slot becomes [`Material::default`], absent
/// or non-finite colours take the default values, and a texture that cannot
/// be loaded leaves the material untextured.
pub fn parse_material<D: GraphicsDevice + ?Sized>(
    model: &mut Model,
    node_id: NodeId,
    node: &dyn ForeignNode,
    resolver: &mut TextureResolver,
    device: &mut D,
) -> MaterialId {
    let material = match node.material() {
        Some(foreign) => {
            let defaults = Material::default();
            let name = foreign.name();
            let ambient = color(foreign.ambient(), defaults.ambient, &name, "ambient");
            let diffuse = color(foreign.diffuse(), defaults.diffuse, &name, "diffuse");

            let texture = foreign.diffuse_texture_path().and_then(|path| {
                match resolver.load_texture(model, device, &path) {
                    Ok(id) => Some(id),
                    Err(e) => {
                        tracing::warn!("Material '{}': texture '{}' dropped: {}", name, path, e);
                        None
                    }
                }
            });

            Material {
                name,
                ambient,
                diffuse,
                texture,
            }
        }
        None => {
            tracing::debug!("Node '{}' has no material, using default", node.name());
            Material::default()
        }
    };

    let id = model.add_material(material);
    if let Some(scene_node) = model.node_mut(node_id) {
        scene_node.material = Some(id);
    }
    id
}

fn color(value: Option<[f64; 3]>, fallback: Vec3, material: &str, channel: &str) -> Vec3 {
    match value {
        Some(rgb) if rgb.iter().all(|c| c.is_finite()) => {
            Vec3::new(rgb[0] as f32, rgb[1] as f32, rgb[2] as f32)
        }
        Some(rgb) => {
            tracing::warn!("Material '{}': invalid {} colour {:?}", material, channel, rgb);
            fallback
        }
        None => fallback,
    }
}
