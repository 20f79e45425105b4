use crate::{
    core::Rgba8,
    error::{LiquitypeError, LiquitypeResult},
};

/// Upper bound on the metaball count. The layout RNG is sized for small
/// anchor sets; 64 leaves headroom over any sensible composition.
pub const MAX_METABALLS: u32 = 64;

/// The flat parameter record driving the whole pipeline.
///
/// One snapshot fully determines the compiled filter graph and the metaball
/// layout. The host replaces snapshots wholesale; nothing here is mutated
/// mid-frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TypeSettings {
    // Content.
    pub text: String,
    pub font_family: FontFamily,
    pub font_size: f64,
    pub letter_spacing: f64,
    pub line_height: f64, // multiplier of font_size

    // Transform, degrees, about the block's own center.
    pub rotation: f64,
    pub skew_x: f64,
    pub skew_y: f64,

    // Morphology. Zero radius elides the stage entirely.
    pub morph_radius: f64,
    pub morph_operator: MorphOperator,

    // Distortion.
    pub distortion_x: f64,
    pub distortion_y: f64,
    pub distortion_strength: f64,
    pub noise_kind: NoiseKind,
    pub noise_seed: u32, // shared by the noise stage and the metaball field

    // Liquification.
    pub blur_std_dev: f64,
    pub contrast: f64, // >= 1, alpha gain post-blur

    // Material.
    pub texture_mode: TextureMode,

    // Metaballs.
    pub num_metaballs: u32,
    pub metaball_spread: f64, // percentage-space jitter magnitude
    pub metaball_speed: f64,  // 0 = frozen

    // Style.
    pub fill_color: Rgba8,
    pub stroke_color: Rgba8,
    pub background_color: Rgba8,
    pub stroke_width: f64,
    pub show_fill: bool,
    pub show_stroke: bool,
}

impl Default for TypeSettings {
    fn default() -> Self {
        Self {
            text: "goo".to_string(),
            font_family: FontFamily::Inter,
            font_size: 120.0,
            letter_spacing: 0.0,
            line_height: 1.1,
            rotation: 0.0,
            skew_x: 0.0,
            skew_y: 0.0,
            morph_radius: 0.0,
            morph_operator: MorphOperator::Dilate,
            distortion_x: 0.01,
            distortion_y: 0.01,
            distortion_strength: 0.0,
            noise_kind: NoiseKind::Turbulence,
            noise_seed: 1,
            blur_std_dev: 4.0,
            contrast: 20.0,
            texture_mode: TextureMode::Solid,
            num_metaballs: 6,
            metaball_spread: 40.0,
            metaball_speed: 1.0,
            fill_color: Rgba8::rgb(0xf2, 0x4e, 0x1e),
            stroke_color: Rgba8::BLACK,
            background_color: Rgba8::rgb(0x12, 0x14, 0x1c),
            stroke_width: 0.0,
            show_fill: true,
            show_stroke: false,
        }
    }
}

/// Closed set of bundled typefaces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FontFamily {
    Inter,
    PlayfairDisplay,
    SpaceGrotesk,
    JetBrainsMono,
    Fraunces,
}

impl FontFamily {
    /// The CSS/fontdb family name.
    pub fn family_name(self) -> &'static str {
        match self {
            Self::Inter => "Inter",
            Self::PlayfairDisplay => "Playfair Display",
            Self::SpaceGrotesk => "Space Grotesk",
            Self::JetBrainsMono => "JetBrains Mono",
            Self::Fraunces => "Fraunces",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MorphOperator {
    Dilate,
    Erode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NoiseKind {
    Turbulence,
    FractalNoise,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TextureMode {
    Solid,
    Chrome,
    Glass,
    Neon,
}

impl TypeSettings {
    /// Boundary validation. The compiler and the metaball field assume a
    /// snapshot that passed here; they never re-check ranges.
    pub fn validate(&self) -> LiquitypeResult<()> {
        fn finite(v: f64, what: &str) -> LiquitypeResult<f64> {
            if !v.is_finite() {
                return Err(LiquitypeError::validation(format!("{what} must be finite")));
            }
            Ok(v)
        }

        fn positive(v: f64, what: &str) -> LiquitypeResult<()> {
            if finite(v, what)? <= 0.0 {
                return Err(LiquitypeError::validation(format!("{what} must be > 0")));
            }
            Ok(())
        }

        fn non_negative(v: f64, what: &str) -> LiquitypeResult<()> {
            if finite(v, what)? < 0.0 {
                return Err(LiquitypeError::validation(format!("{what} must be >= 0")));
            }
            Ok(())
        }

        positive(self.font_size, "font_size")?;
        positive(self.line_height, "line_height")?;
        finite(self.letter_spacing, "letter_spacing")?;
        finite(self.rotation, "rotation")?;
        finite(self.skew_x, "skew_x")?;
        finite(self.skew_y, "skew_y")?;

        non_negative(self.morph_radius, "morph_radius")?;
        non_negative(self.distortion_x, "distortion_x")?;
        non_negative(self.distortion_y, "distortion_y")?;
        non_negative(self.distortion_strength, "distortion_strength")?;
        non_negative(self.blur_std_dev, "blur_std_dev")?;
        non_negative(self.metaball_spread, "metaball_spread")?;
        non_negative(self.metaball_speed, "metaball_speed")?;
        non_negative(self.stroke_width, "stroke_width")?;

        if finite(self.contrast, "contrast")? < 1.0 {
            return Err(LiquitypeError::validation("contrast must be >= 1"));
        }
        if self.noise_seed == 0 {
            return Err(LiquitypeError::validation("noise_seed must be > 0"));
        }
        if self.num_metaballs > MAX_METABALLS {
            return Err(LiquitypeError::validation(format!(
                "num_metaballs must be <= {MAX_METABALLS}"
            )));
        }

        Ok(())
    }
}

/// Partial settings proposed by the style-suggestion collaborator.
///
/// Structurally excludes `text`: the suggestion service may restyle the
/// composition but never rewrite its content.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skew_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morph_radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub morph_operator: Option<MorphOperator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distortion_x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distortion_y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distortion_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_kind: Option<NoiseKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur_std_dev: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture_mode: Option<TextureMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_metaballs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metaball_spread: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metaball_speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_color: Option<Rgba8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<Rgba8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Rgba8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_fill: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_stroke: Option<bool>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Produce a new snapshot with this patch applied on top of `base`.
    ///
    /// Does not validate; callers re-validate the result and discard the
    /// whole patch on failure, never applying it piecemeal.
    pub fn apply_to(&self, base: &TypeSettings) -> TypeSettings {
        let mut out = base.clone();

        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = self.$field {
                    out.$field = v;
                })*
            };
        }

        apply!(
            font_family,
            font_size,
            letter_spacing,
            line_height,
            rotation,
            skew_x,
            skew_y,
            morph_radius,
            morph_operator,
            distortion_x,
            distortion_y,
            distortion_strength,
            noise_kind,
            noise_seed,
            blur_std_dev,
            contrast,
            texture_mode,
            num_metaballs,
            metaball_spread,
            metaball_speed,
            fill_color,
            stroke_color,
            background_color,
            stroke_width,
            show_fill,
            show_stroke,
        );

        out
    }
}
