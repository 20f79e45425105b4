use crate::{
    clock::AnimationClock,
    compile::{FilterGraph, compile},
    core::{Affine, Canvas, Rgba8},
    error::LiquitypeResult,
    metaballs::{animated_position, derive_anchors},
    settings::{FontFamily, TypeSettings},
};

/// The laid-out text block: line stack plus the block transform.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub font_family: FontFamily,
    pub font_size: f64,
    pub letter_spacing: f64,
    /// Baseline-to-baseline distance, `line_height * font_size`.
    pub leading: f64,
    /// Rotation and skew about the block's own center.
    pub transform: Affine,
    pub fill: Option<Rgba8>,
    pub stroke: Option<StrokeStyle>,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct StrokeStyle {
    pub color: Rgba8,
    pub width: f64,
}

impl TextBlock {
    /// Per-line baseline offsets from the block center, vertically centering
    /// the stack: the first line sits at `-(n - 1) * leading / 2`.
    pub fn baseline_offsets(&self) -> Vec<f64> {
        let n = self.lines.len();
        let first = -((n.saturating_sub(1)) as f64) * self.leading / 2.0;
        (0..n).map(|i| first + (i as f64) * self.leading).collect()
    }
}

/// A metaball circle at its current animated position, pixel space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct Circle {
    pub cx: f64,
    pub cy: f64,
    pub radius: f64,
}

/// Everything the rendering substrate needs for one frame: the compiled
/// filter graph plus the shapes that feed its source buffer.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FrameScene {
    pub canvas: Canvas,
    pub graph: FilterGraph,
    pub text: TextBlock,
    pub circles: Vec<Circle>,
    pub background: Rgba8,
}

/// Compose a frame from a settings snapshot and an explicit clock time.
///
/// Pure: identical inputs yield an identical scene. Validates the snapshot
/// first; everything downstream assumes validated input.
#[tracing::instrument(skip(settings), fields(mode = ?settings.texture_mode))]
pub fn compose_frame(
    settings: &TypeSettings,
    canvas: Canvas,
    clock_time: f64,
) -> LiquitypeResult<FrameScene> {
    settings.validate()?;

    let graph = compile(settings);
    let text = layout_text(settings, canvas);
    let circles = place_circles(settings, canvas, clock_time);

    Ok(FrameScene {
        canvas,
        graph,
        text,
        circles,
        background: settings.background_color,
    })
}

fn layout_text(settings: &TypeSettings, canvas: Canvas) -> TextBlock {
    let lines = settings
        .text
        .split('\n')
        .map(|l| l.to_string())
        .collect::<Vec<_>>();

    let center = canvas.center();
    let rotation = settings.rotation.to_radians();
    let skew = Affine::skew(
        settings.skew_x.to_radians().tan(),
        settings.skew_y.to_radians().tan(),
    );
    // Rotate and skew about the block center, not the canvas origin.
    let transform = Affine::translate(center.to_vec2())
        * Affine::rotate(rotation)
        * skew
        * Affine::translate(-center.to_vec2());

    TextBlock {
        lines,
        font_family: settings.font_family,
        font_size: settings.font_size,
        letter_spacing: settings.letter_spacing,
        leading: settings.line_height * settings.font_size,
        transform,
        fill: settings.show_fill.then_some(settings.fill_color),
        stroke: (settings.show_stroke && settings.stroke_width > 0.0).then_some(StrokeStyle {
            color: settings.stroke_color,
            width: settings.stroke_width,
        }),
    }
}

fn place_circles(settings: &TypeSettings, canvas: Canvas, clock_time: f64) -> Vec<Circle> {
    let anchors = derive_anchors(
        settings.num_metaballs,
        settings.metaball_spread,
        settings.noise_seed,
    );
    let frozen = !AnimationClock::is_live(settings);
    anchors
        .iter()
        .map(|anchor| {
            // Frozen output sits exactly on the anchor: a stopped animation
            // must not leave circles at some mid-orbit residue.
            let (x, y) = if frozen {
                (anchor.base_x, anchor.base_y)
            } else {
                animated_position(anchor, clock_time)
            };
            Circle {
                cx: x / 100.0 * f64::from(canvas.width),
                cy: y / 100.0 * f64::from(canvas.height),
                radius: anchor.radius,
            }
        })
        .collect()
}
