//! Export collaborators: vector-source serialization to disk and PNG
//! rasterization of the composed frame.
//!
//! Failures here are [`LiquitypeError::Export`] and never touch live render
//! state; the caller logs and moves on.

use std::path::Path;

use anyhow::Context as _;

use crate::{
    error::{LiquitypeError, LiquitypeResult},
    scene::FrameScene,
    svg::write_svg,
};

/// Fixed pixel-density multiplier for raster export.
pub const DEFAULT_EXPORT_SCALE: f64 = 2.0;

/// Raster output guard, matching common substrate limits.
const MAX_DIM: u32 = 16_384;

/// Straight-alpha RGBA8 pixels of a rasterized frame.
#[derive(Clone, Debug)]
pub struct RgbaFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Write the scene's vector source to `path`.
#[tracing::instrument(skip(scene))]
pub fn export_svg(scene: &FrameScene, path: &Path) -> LiquitypeResult<()> {
    let svg = write_svg(scene);
    std::fs::write(path, svg)
        .with_context(|| format!("write svg '{}'", path.display()))
        .map_err(LiquitypeError::Other)
}

/// Rasterize the scene at `scale` times its canvas size.
#[tracing::instrument(skip(scene))]
pub fn rasterize(scene: &FrameScene, scale: f64) -> LiquitypeResult<RgbaFrame> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(LiquitypeError::export("export scale must be > 0"));
    }

    let width = ((f64::from(scene.canvas.width) * scale).ceil() as u32).max(1);
    let height = ((f64::from(scene.canvas.height) * scale).ceil() as u32).max(1);
    if width > MAX_DIM || height > MAX_DIM {
        return Err(LiquitypeError::export(format!(
            "raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let svg = write_svg(scene);
    let mut opt = usvg::Options::default();
    opt.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(&svg, &opt)
        .map_err(|e| LiquitypeError::export(format!("scene svg did not parse: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| LiquitypeError::export("failed to allocate export pixmap"))?;

    let sx = (width as f32) / tree.size().width();
    let sy = (height as f32) / tree.size().height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);
    resvg::render(&tree, xform, &mut pixmap.as_mut());

    // Pixmap data is premultiplied; PNG wants straight alpha.
    let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    Ok(RgbaFrame {
        width,
        height,
        data,
    })
}

/// Rasterize and encode the scene as a PNG at `path`.
#[tracing::instrument(skip(scene))]
pub fn export_png(scene: &FrameScene, scale: f64, path: &Path) -> LiquitypeResult<()> {
    let frame = rasterize(scene, scale)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))
            .map_err(LiquitypeError::Other)?;
    }

    image::save_buffer_with_format(
        path,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .map_err(|e| LiquitypeError::export(format!("write png '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::Canvas, scene::compose_frame, settings::TypeSettings};

    fn small_scene() -> FrameScene {
        // No metaballs and no blur halo, so the canvas corners stay
        // background-only.
        let settings = TypeSettings {
            text: "x".to_string(),
            font_size: 12.0,
            num_metaballs: 0,
            blur_std_dev: 0.0,
            distortion_strength: 0.0,
            ..Default::default()
        };
        compose_frame(
            &settings,
            Canvas {
                width: 80,
                height: 60,
            },
            0.0,
        )
        .unwrap()
    }

    #[test]
    fn rasterize_scales_pixel_dimensions() {
        let frame = rasterize(&small_scene(), 2.0).unwrap();
        assert_eq!(frame.width, 160);
        assert_eq!(frame.height, 120);
        assert_eq!(frame.data.len(), 160 * 120 * 4);
    }

    #[test]
    fn rasterize_rejects_bad_scale() {
        assert!(rasterize(&small_scene(), 0.0).is_err());
        assert!(rasterize(&small_scene(), -1.0).is_err());
        assert!(rasterize(&small_scene(), f64::NAN).is_err());
    }

    #[test]
    fn rasterize_rejects_oversized_output() {
        let scene = compose_frame(
            &TypeSettings::default(),
            Canvas {
                width: 4000,
                height: 4000,
            },
            0.0,
        )
        .unwrap();
        assert!(matches!(
            rasterize(&scene, 8.0),
            Err(LiquitypeError::Export(_))
        ));
    }

    #[test]
    fn background_reaches_the_raster() {
        // The background rect is unfiltered, so its color must survive
        // rasterization verbatim in a corner pixel.
        let frame = rasterize(&small_scene(), 1.0).unwrap();
        assert_eq!(&frame.data[0..4], &[0x12, 0x14, 0x1c, 0xff]);
    }
}
