//! SVG serialization of a composed frame.
//!
//! The compiled filter graph maps onto SVG filter primitives one stage per
//! element, with each buffer label becoming a `result` name. The document is
//! the vector-source export format and doubles as the executable form of the
//! graph for any SVG-filter-capable consumer.

use std::fmt::Write as _;

use crate::{
    compile::{FilterGraph, FilterStage, StageOp},
    scene::FrameScene,
    settings::{MorphOperator, NoiseKind},
};

const FILTER_ID: &str = "liquify";

/// Serialize the scene as a standalone SVG document.
pub fn write_svg(scene: &FrameScene) -> String {
    let w = scene.canvas.width;
    let h = scene.canvas.height;

    let mut out = String::with_capacity(4096);
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );

    out.push_str("  <defs>\n");
    write_filter(&mut out, &scene.graph);
    out.push_str("  </defs>\n");

    let _ = writeln!(
        out,
        r#"  <rect width="100%" height="100%" fill="{}"/>"#,
        scene.background.to_hex_rgb()
    );

    let _ = writeln!(out, r#"  <g filter="url(#{FILTER_ID})">"#);
    write_text(&mut out, scene);
    write_circles(&mut out, scene);
    out.push_str("  </g>\n");
    out.push_str("</svg>\n");
    out
}

/// The filter region is widened well past the shape bounds so blur halos and
/// displaced pixels are not clipped.
fn write_filter(out: &mut String, graph: &FilterGraph) {
    let _ = writeln!(
        out,
        r#"    <filter id="{FILTER_ID}" x="-50%" y="-50%" width="200%" height="200%" color-interpolation-filters="sRGB">"#
    );
    for stage in &graph.stages {
        write_stage(out, graph, stage);
    }
    out.push_str("    </filter>\n");
}

fn write_stage(out: &mut String, graph: &FilterGraph, stage: &FilterStage) {
    let result = graph.label(stage.output).name();
    let name = |id| graph.label(id).name();

    match &stage.op {
        StageOp::Morphology {
            input,
            operator,
            radius,
        } => {
            let op = match operator {
                MorphOperator::Dilate => "dilate",
                MorphOperator::Erode => "erode",
            };
            let _ = writeln!(
                out,
                r#"      <feMorphology in="{}" operator="{op}" radius="{radius}" result="{result}"/>"#,
                name(*input)
            );
        }
        StageOp::NoiseFill {
            kind,
            base_frequency,
            seed,
            octaves,
        } => {
            let ty = match kind {
                NoiseKind::Turbulence => "turbulence",
                NoiseKind::FractalNoise => "fractalNoise",
            };
            let _ = writeln!(
                out,
                r#"      <feTurbulence type="{ty}" baseFrequency="{} {}" numOctaves="{octaves}" seed="{seed}" result="{result}"/>"#,
                base_frequency.0, base_frequency.1
            );
        }
        StageOp::DisplacementMap {
            shape,
            noise,
            scale,
        } => {
            let _ = writeln!(
                out,
                r#"      <feDisplacementMap in="{}" in2="{}" scale="{scale}" xChannelSelector="R" yChannelSelector="G" result="{result}"/>"#,
                name(*shape),
                name(*noise)
            );
        }
        StageOp::GaussianBlur { input, std_dev } => {
            let _ = writeln!(
                out,
                r#"      <feGaussianBlur in="{}" stdDeviation="{std_dev}" result="{result}"/>"#,
                name(*input)
            );
        }
        StageOp::AlphaContrast {
            input,
            gain,
            offset,
        } => {
            let _ = writeln!(
                out,
                r#"      <feColorMatrix in="{}" type="matrix" values="1 0 0 0 0  0 1 0 0 0  0 0 1 0 0  0 0 0 {gain} {offset}" result="{result}"/>"#,
                name(*input)
            );
        }
        StageOp::SpecularLighting {
            input,
            surface_scale,
            constant,
            exponent,
            light,
        } => {
            let _ = writeln!(
                out,
                r##"      <feSpecularLighting in="{}" surfaceScale="{surface_scale}" specularConstant="{constant}" specularExponent="{exponent}" lighting-color="#ffffff" result="{result}">"##,
                name(*input)
            );
            let _ = writeln!(
                out,
                r#"        <fePointLight x="{}" y="{}" z="{}"/>"#,
                light.x, light.y, light.z
            );
            out.push_str("      </feSpecularLighting>\n");
        }
        StageOp::CompositeIn { input, mask } => {
            let _ = writeln!(
                out,
                r#"      <feComposite in="{}" in2="{}" operator="in" result="{result}"/>"#,
                name(*input),
                name(*mask)
            );
        }
        StageOp::CompositeOver { over, under } => {
            let _ = writeln!(
                out,
                r#"      <feComposite in="{}" in2="{}" operator="over" result="{result}"/>"#,
                name(*over),
                name(*under)
            );
        }
        StageOp::Arithmetic { a, b, k } => {
            let _ = writeln!(
                out,
                r#"      <feComposite in="{}" in2="{}" operator="arithmetic" k1="{}" k2="{}" k3="{}" k4="{}" result="{result}"/>"#,
                name(*a),
                name(*b),
                k[0],
                k[1],
                k[2],
                k[3]
            );
        }
        StageOp::AlphaScale { input, factor } => {
            let _ = writeln!(
                out,
                r#"      <feColorMatrix in="{}" type="matrix" values="1 0 0 0 0  0 1 0 0 0  0 0 1 0 0  0 0 0 {factor} 0" result="{result}"/>"#,
                name(*input)
            );
        }
        StageOp::Merge { inputs } => {
            let _ = writeln!(out, r#"      <feMerge result="{result}">"#);
            for &id in inputs {
                let _ = writeln!(out, r#"        <feMergeNode in="{}"/>"#, name(id));
            }
            out.push_str("      </feMerge>\n");
        }
    }
}

fn write_text(out: &mut String, scene: &FrameScene) {
    let block = &scene.text;
    let center = scene.canvas.center();
    let [a, b, c, d, e, f] = block.transform.as_coeffs();

    let fill = match block.fill {
        Some(color) => color.to_hex_rgb(),
        None => "none".to_string(),
    };

    let mut attrs = format!(
        r#"font-family="{}" font-size="{}" letter-spacing="{}" text-anchor="middle" fill="{fill}""#,
        block.font_family.family_name(),
        block.font_size,
        block.letter_spacing
    );
    if let Some(color) = block.fill
        && !color.is_opaque()
    {
        let _ = write!(attrs, r#" fill-opacity="{}""#, color.alpha_f64());
    }
    if let Some(stroke) = block.stroke {
        let _ = write!(
            attrs,
            r#" stroke="{}" stroke-width="{}""#,
            stroke.color.to_hex_rgb(),
            stroke.width
        );
    }

    let _ = writeln!(
        out,
        r#"    <text {attrs} transform="matrix({a} {b} {c} {d} {e} {f})">"#
    );
    for (line, offset) in block.lines.iter().zip(block.baseline_offsets()) {
        let _ = writeln!(
            out,
            r#"      <tspan x="{}" y="{}">{}</tspan>"#,
            center.x,
            center.y + offset,
            escape_text(line)
        );
    }
    out.push_str("    </text>\n");
}

fn write_circles(out: &mut String, scene: &FrameScene) {
    let fill = match scene.text.fill {
        Some(color) => color.to_hex_rgb(),
        None => "none".to_string(),
    };
    for circle in &scene.circles {
        let _ = writeln!(
            out,
            r#"    <circle cx="{}" cy="{}" r="{}" fill="{fill}"/>"#,
            circle.cx, circle.cy, circle.radius
        );
    }
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
