//! Effect-pipeline compiler.
//!
//! `compile` maps a validated [`TypeSettings`] snapshot to a [`FilterGraph`]:
//! an arena of named intermediate buffers plus an ordered stage list whose
//! inputs are typed buffer handles. The graph is acyclic by construction —
//! a stage can only reference buffers that already exist when it is pushed —
//! so an elided stage (zero-radius morphology) cannot leave a dangling
//! reference behind; downstream stages are wired to whatever buffer actually
//! precedes them.

use crate::settings::{MorphOperator, NoiseKind, TextureMode, TypeSettings};

/// Fixed octave count for the noise stage.
const NOISE_OCTAVES: u32 = 2;

/// Chrome material constants: hard metallic highlight.
const CHROME_BUMP_STD_DEV: f64 = 1.0;
const CHROME_SURFACE_SCALE: f64 = 2.0;
const CHROME_SPECULAR_CONSTANT: f64 = 1.2;
const CHROME_SPECULAR_EXPONENT: f64 = 20.0;

/// Glass material constants: wider bump, softer highlight, translucent base.
const GLASS_BUMP_STD_DEV: f64 = 3.0;
const GLASS_SURFACE_SCALE: f64 = 2.0;
const GLASS_SPECULAR_CONSTANT: f64 = 0.9;
const GLASS_SPECULAR_EXPONENT: f64 = 8.0;
const GLASS_BASE_ALPHA: f64 = 0.4;

/// Neon glow blur radii, innermost first.
const NEON_GLOW_STD_DEVS: [f64; 3] = [2.0, 6.0, 12.0];

/// Shared far point light for the lit materials.
const LIGHT_POSITION: PointLight = PointLight {
    x: -100.0,
    y: -200.0,
    z: 300.0,
};

/// Handle into the graph's buffer arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct BufferId(pub u32);

/// What an intermediate buffer holds. Labels are stable identifiers used by
/// serializers (SVG `result` names) and by tests; the wiring itself is done
/// through [`BufferId`] handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum BufferLabel {
    /// The raw text-and-circles shape, defined by the executor, not a stage.
    SourceShape,
    Morphed,
    Noise,
    Distorted,
    Blurred,
    GooShape,
    BumpMap,
    Specular,
    SpecularMasked,
    TranslucentBase,
    GlowSmall,
    GlowMedium,
    GlowLarge,
    Composite,
}

impl BufferLabel {
    /// Serialization name, usable as an SVG filter `result` attribute.
    pub fn name(self) -> &'static str {
        match self {
            Self::SourceShape => "SourceGraphic",
            Self::Morphed => "morphed",
            Self::Noise => "noise",
            Self::Distorted => "distorted",
            Self::Blurred => "blurred",
            Self::GooShape => "gooShape",
            Self::BumpMap => "bumpMap",
            Self::Specular => "specular",
            Self::SpecularMasked => "specularMasked",
            Self::TranslucentBase => "translucentBase",
            Self::GlowSmall => "glow1",
            Self::GlowMedium => "glow2",
            Self::GlowLarge => "glow3",
            Self::Composite => "composite",
        }
    }
}

/// Point light position in filter space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct PointLight {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A single image-processing operation with typed buffer inputs.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub enum StageOp {
    /// Dilate or erode the shape silhouette.
    Morphology {
        input: BufferId,
        operator: MorphOperator,
        radius: f64,
    },
    /// Generate a two-channel noise field. No shape input.
    NoiseFill {
        kind: NoiseKind,
        base_frequency: (f64, f64),
        seed: u32,
        octaves: u32,
    },
    /// Displace `shape` by offsets read from `noise` (R drives x, G drives y).
    DisplacementMap {
        shape: BufferId,
        noise: BufferId,
        scale: f64,
    },
    /// Gaussian blur. Zero std-dev is identity, never elided.
    GaussianBlur { input: BufferId, std_dev: f64 },
    /// Affine remap of the alpha channel; RGB passes through unchanged.
    AlphaContrast {
        input: BufferId,
        gain: f64,
        offset: f64,
    },
    /// Point-light specular highlight over a height field.
    SpecularLighting {
        input: BufferId,
        surface_scale: f64,
        constant: f64,
        exponent: f64,
        light: PointLight,
    },
    /// Porter-Duff "in": keep `input` only where `mask` has coverage.
    CompositeIn { input: BufferId, mask: BufferId },
    /// Porter-Duff "over".
    CompositeOver { over: BufferId, under: BufferId },
    /// Arithmetic blend `k1*a*b + k2*a + k3*b + k4`.
    Arithmetic {
        a: BufferId,
        b: BufferId,
        k: [f64; 4],
    },
    /// Scale the alpha channel by a constant factor.
    AlphaScale { input: BufferId, factor: f64 },
    /// Back-to-front merge; first input is painted first (bottom).
    Merge { inputs: Vec<BufferId> },
}

impl StageOp {
    /// Buffer handles this stage reads.
    pub fn inputs(&self) -> Vec<BufferId> {
        match self {
            Self::Morphology { input, .. }
            | Self::GaussianBlur { input, .. }
            | Self::AlphaContrast { input, .. }
            | Self::SpecularLighting { input, .. }
            | Self::AlphaScale { input, .. } => vec![*input],
            Self::NoiseFill { .. } => vec![],
            Self::DisplacementMap { shape, noise, .. } => vec![*shape, *noise],
            Self::CompositeIn { input, mask } => vec![*input, *mask],
            Self::CompositeOver { over, under } => vec![*over, *under],
            Self::Arithmetic { a, b, .. } => vec![*a, *b],
            Self::Merge { inputs } => inputs.clone(),
        }
    }
}

/// One node of the compiled graph.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FilterStage {
    pub op: StageOp,
    pub output: BufferId,
}

/// The compiled effect pipeline: buffer arena, ordered stages, final output.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FilterGraph {
    /// Arena of buffer descriptors; index 0 is always [`BufferLabel::SourceShape`].
    pub buffers: Vec<BufferLabel>,
    pub stages: Vec<FilterStage>,
    pub output: BufferId,
}

impl FilterGraph {
    fn new() -> Self {
        Self {
            buffers: vec![BufferLabel::SourceShape],
            stages: Vec::new(),
            output: BufferId(0),
        }
    }

    /// The executor-defined source shape buffer.
    pub fn source(&self) -> BufferId {
        BufferId(0)
    }

    pub fn label(&self, id: BufferId) -> BufferLabel {
        self.buffers[id.0 as usize]
    }

    /// Find the producing stage for a buffer, if any (the source has none).
    pub fn producer(&self, id: BufferId) -> Option<&FilterStage> {
        self.stages.iter().find(|s| s.output == id)
    }

    fn push(&mut self, op: StageOp, label: BufferLabel) -> BufferId {
        let id = BufferId(self.buffers.len() as u32);
        self.buffers.push(label);
        self.stages.push(FilterStage { op, output: id });
        id
    }
}

/// Compile a validated settings snapshot into its filter graph.
///
/// Total over validated input: every snapshot yields a graph with the four
/// mandatory stages (noise, displacement, blur, contrast remap) plus the
/// optional morphology stage and exactly one material branch.
pub fn compile(settings: &TypeSettings) -> FilterGraph {
    let mut g = FilterGraph::new();
    let source = g.source();

    // 1. Morphology, only when it would do anything. Elision (not a no-op
    //    pass) rewires downstream consumers to the source shape.
    let shape = if settings.morph_radius > 0.0 {
        g.push(
            StageOp::Morphology {
                input: source,
                operator: settings.morph_operator,
                radius: settings.morph_radius,
            },
            BufferLabel::Morphed,
        )
    } else {
        source
    };

    // 2. Noise field; independent of the shape chain.
    let noise = g.push(
        StageOp::NoiseFill {
            kind: settings.noise_kind,
            base_frequency: (settings.distortion_x, settings.distortion_y),
            seed: settings.noise_seed,
            octaves: NOISE_OCTAVES,
        },
        BufferLabel::Noise,
    );

    // 3. Displacement of whichever shape buffer precedes it.
    let distorted = g.push(
        StageOp::DisplacementMap {
            shape,
            noise,
            scale: settings.distortion_strength,
        },
        BufferLabel::Distorted,
    );

    // 4. Blur, emitted even at zero std-dev so material branches always read
    //    a buffer labeled Blurred.
    let blurred = g.push(
        StageOp::GaussianBlur {
            input: distorted,
            std_dev: settings.blur_std_dev,
        },
        BufferLabel::Blurred,
    );

    // 5. Alpha contrast remap. The offset recenters the blur falloff around
    //    its midpoint before the gain sharpens it, which is what makes
    //    nearby soft shapes merge or vanish.
    let goo = g.push(
        StageOp::AlphaContrast {
            input: blurred,
            gain: settings.contrast,
            offset: -(settings.contrast * 0.5),
        },
        BufferLabel::GooShape,
    );

    // 6. Material branch; exactly one.
    g.output = match settings.texture_mode {
        TextureMode::Solid => goo,
        TextureMode::Chrome => compile_chrome(&mut g, goo),
        TextureMode::Glass => compile_glass(&mut g, goo),
        TextureMode::Neon => compile_neon(&mut g, goo),
    };

    g
}

fn compile_chrome(g: &mut FilterGraph, goo: BufferId) -> BufferId {
    let bump = g.push(
        StageOp::GaussianBlur {
            input: goo,
            std_dev: CHROME_BUMP_STD_DEV,
        },
        BufferLabel::BumpMap,
    );
    let specular = g.push(
        StageOp::SpecularLighting {
            input: bump,
            surface_scale: CHROME_SURFACE_SCALE,
            constant: CHROME_SPECULAR_CONSTANT,
            exponent: CHROME_SPECULAR_EXPONENT,
            light: LIGHT_POSITION,
        },
        BufferLabel::Specular,
    );
    let masked = g.push(
        StageOp::CompositeIn {
            input: specular,
            mask: goo,
        },
        BufferLabel::SpecularMasked,
    );
    // Additive blend of the masked highlight over the goo shape.
    g.push(
        StageOp::Arithmetic {
            a: masked,
            b: goo,
            k: [0.0, 1.0, 1.0, 0.0],
        },
        BufferLabel::Composite,
    )
}

fn compile_glass(g: &mut FilterGraph, goo: BufferId) -> BufferId {
    let bump = g.push(
        StageOp::GaussianBlur {
            input: goo,
            std_dev: GLASS_BUMP_STD_DEV,
        },
        BufferLabel::BumpMap,
    );
    let specular = g.push(
        StageOp::SpecularLighting {
            input: bump,
            surface_scale: GLASS_SURFACE_SCALE,
            constant: GLASS_SPECULAR_CONSTANT,
            exponent: GLASS_SPECULAR_EXPONENT,
            light: LIGHT_POSITION,
        },
        BufferLabel::Specular,
    );
    let masked = g.push(
        StageOp::CompositeIn {
            input: specular,
            mask: goo,
        },
        BufferLabel::SpecularMasked,
    );
    let translucent = g.push(
        StageOp::AlphaScale {
            input: goo,
            factor: GLASS_BASE_ALPHA,
        },
        BufferLabel::TranslucentBase,
    );
    g.push(
        StageOp::CompositeOver {
            over: masked,
            under: translucent,
        },
        BufferLabel::Composite,
    )
}

fn compile_neon(g: &mut FilterGraph, goo: BufferId) -> BufferId {
    let labels = [
        BufferLabel::GlowSmall,
        BufferLabel::GlowMedium,
        BufferLabel::GlowLarge,
    ];
    let mut glows = [BufferId(0); 3];
    for (i, (&std_dev, &label)) in NEON_GLOW_STD_DEVS.iter().zip(labels.iter()).enumerate() {
        glows[i] = g.push(
            StageOp::GaussianBlur {
                input: goo,
                std_dev,
            },
            label,
        );
    }
    // Largest halo at the bottom, sharp core on top; the goo shape is merged
    // twice for a saturated bright core.
    g.push(
        StageOp::Merge {
            inputs: vec![glows[2], glows[1], glows[0], goo, goo],
        },
        BufferLabel::Composite,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> TypeSettings {
        TypeSettings::default()
    }

    fn labels_of(g: &FilterGraph) -> Vec<BufferLabel> {
        g.stages.iter().map(|s| g.label(s.output)).collect()
    }

    #[test]
    fn compile_is_pure() {
        let s = TypeSettings {
            morph_radius: 3.0,
            texture_mode: TextureMode::Chrome,
            ..base()
        };
        assert_eq!(compile(&s), compile(&s));
    }

    #[test]
    fn zero_morph_radius_elides_stage_and_rewires_displacement() {
        let s = TypeSettings {
            morph_radius: 0.0,
            ..base()
        };
        let g = compile(&s);
        assert!(
            !labels_of(&g).contains(&BufferLabel::Morphed),
            "morphology stage must be absent, not a pass-through"
        );

        let displace = g
            .stages
            .iter()
            .find(|st| matches!(st.op, StageOp::DisplacementMap { .. }))
            .unwrap();
        let StageOp::DisplacementMap { shape, .. } = &displace.op else {
            unreachable!()
        };
        assert_eq!(g.label(*shape), BufferLabel::SourceShape);
    }

    #[test]
    fn positive_morph_radius_feeds_displacement() {
        let s = TypeSettings {
            morph_radius: 2.5,
            morph_operator: MorphOperator::Erode,
            ..base()
        };
        let g = compile(&s);
        let StageOp::DisplacementMap { shape, .. } = &g
            .stages
            .iter()
            .find(|st| matches!(st.op, StageOp::DisplacementMap { .. }))
            .unwrap()
            .op
        else {
            unreachable!()
        };
        assert_eq!(g.label(*shape), BufferLabel::Morphed);

        let StageOp::Morphology {
            operator, radius, ..
        } = &g.stages[0].op
        else {
            panic!("first stage must be morphology");
        };
        assert_eq!(*operator, MorphOperator::Erode);
        assert_eq!(*radius, 2.5);
    }

    #[test]
    fn solid_graph_is_exactly_the_four_mandatory_stages() {
        let s = TypeSettings {
            morph_radius: 0.0,
            blur_std_dev: 0.0,
            texture_mode: TextureMode::Solid,
            num_metaballs: 0,
            ..base()
        };
        let g = compile(&s);
        assert_eq!(
            labels_of(&g),
            vec![
                BufferLabel::Noise,
                BufferLabel::Distorted,
                BufferLabel::Blurred,
                BufferLabel::GooShape,
            ]
        );
        assert_eq!(g.label(g.output), BufferLabel::GooShape);
    }

    #[test]
    fn zero_blur_still_emits_the_stage() {
        let s = TypeSettings {
            blur_std_dev: 0.0,
            ..base()
        };
        let g = compile(&s);
        let blur = g
            .stages
            .iter()
            .find(|st| g.label(st.output) == BufferLabel::Blurred)
            .unwrap();
        let StageOp::GaussianBlur { std_dev, .. } = &blur.op else {
            panic!("expected blur stage");
        };
        assert_eq!(*std_dev, 0.0);
    }

    #[test]
    fn contrast_remap_offset_recenters_gain() {
        let s = TypeSettings {
            contrast: 24.0,
            ..base()
        };
        let g = compile(&s);
        let StageOp::AlphaContrast { gain, offset, .. } = &g
            .stages
            .iter()
            .find(|st| g.label(st.output) == BufferLabel::GooShape)
            .unwrap()
            .op
        else {
            panic!("expected contrast stage");
        };
        assert_eq!(*gain, 24.0);
        assert_eq!(*offset, -12.0);
    }

    #[test]
    fn material_branch_is_exhaustive_and_exclusive() {
        for mode in [
            TextureMode::Solid,
            TextureMode::Chrome,
            TextureMode::Glass,
            TextureMode::Neon,
        ] {
            let g = compile(&TypeSettings {
                texture_mode: mode,
                ..base()
            });
            let labels = labels_of(&g);
            let has_lighting = labels.contains(&BufferLabel::Specular);
            let has_glow = labels.contains(&BufferLabel::GlowLarge);
            let has_translucent = labels.contains(&BufferLabel::TranslucentBase);
            match mode {
                TextureMode::Solid => {
                    assert!(!has_lighting && !has_glow && !has_translucent);
                }
                TextureMode::Chrome => {
                    assert!(has_lighting && !has_glow && !has_translucent);
                }
                TextureMode::Glass => {
                    assert!(has_lighting && has_translucent && !has_glow);
                }
                TextureMode::Neon => {
                    assert!(has_glow && !has_lighting && !has_translucent);
                }
            }
        }
    }

    #[test]
    fn neon_merge_order_is_fixed() {
        let g = compile(&TypeSettings {
            texture_mode: TextureMode::Neon,
            ..base()
        });
        let StageOp::Merge { inputs } = &g.stages.last().unwrap().op else {
            panic!("neon must end in a merge");
        };
        let names: Vec<_> = inputs.iter().map(|&id| g.label(id).name()).collect();
        assert_eq!(names, ["glow3", "glow2", "glow1", "gooShape", "gooShape"]);
    }

    #[test]
    fn chrome_blends_masked_specular_additively() {
        let g = compile(&TypeSettings {
            texture_mode: TextureMode::Chrome,
            ..base()
        });
        let StageOp::Arithmetic { a, b, k } = &g.stages.last().unwrap().op else {
            panic!("chrome must end in an arithmetic blend");
        };
        assert_eq!(*k, [0.0, 1.0, 1.0, 0.0]);
        assert_eq!(g.label(*a), BufferLabel::SpecularMasked);
        assert_eq!(g.label(*b), BufferLabel::GooShape);
    }

    #[test]
    fn glass_composites_highlight_over_translucent_base() {
        let g = compile(&TypeSettings {
            texture_mode: TextureMode::Glass,
            ..base()
        });
        let StageOp::CompositeOver { over, under } = &g.stages.last().unwrap().op else {
            panic!("glass must end in an over composite");
        };
        assert_eq!(g.label(*over), BufferLabel::SpecularMasked);
        assert_eq!(g.label(*under), BufferLabel::TranslucentBase);

        let StageOp::AlphaScale { factor, .. } = &g
            .stages
            .iter()
            .find(|st| g.label(st.output) == BufferLabel::TranslucentBase)
            .unwrap()
            .op
        else {
            panic!("expected alpha scale stage");
        };
        assert_eq!(*factor, GLASS_BASE_ALPHA);
    }

    #[test]
    fn noise_stage_carries_settings_verbatim() {
        let s = TypeSettings {
            distortion_x: 0.02,
            distortion_y: 0.07,
            noise_kind: NoiseKind::FractalNoise,
            noise_seed: 77,
            ..base()
        };
        let g = compile(&s);
        let StageOp::NoiseFill {
            kind,
            base_frequency,
            seed,
            octaves,
        } = &g
            .stages
            .iter()
            .find(|st| g.label(st.output) == BufferLabel::Noise)
            .unwrap()
            .op
        else {
            panic!("expected noise stage");
        };
        assert_eq!(*kind, NoiseKind::FractalNoise);
        assert_eq!(*base_frequency, (0.02, 0.07));
        assert_eq!(*seed, 77);
        assert_eq!(*octaves, NOISE_OCTAVES);
    }

    #[test]
    fn every_stage_reads_already_defined_buffers() {
        for mode in [
            TextureMode::Solid,
            TextureMode::Chrome,
            TextureMode::Glass,
            TextureMode::Neon,
        ] {
            for morph in [0.0, 2.0] {
                let g = compile(&TypeSettings {
                    texture_mode: mode,
                    morph_radius: morph,
                    ..base()
                });
                for stage in &g.stages {
                    for input in stage.op.inputs() {
                        assert!(
                            input.0 < stage.output.0,
                            "{mode:?}: stage {:?} reads a buffer defined later",
                            g.label(stage.output)
                        );
                    }
                }
                assert!(
                    (g.output.0 as usize) < g.buffers.len(),
                    "output handle out of range"
                );
            }
        }
    }
}
