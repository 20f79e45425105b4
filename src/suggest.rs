//! Style-suggestion collaborator seam.
//!
//! The provider maps a natural-language prompt plus the current settings to a
//! partial parameter patch. It is the one fallible external call in the
//! system, and its failure mode is always "no change": the caller keeps the
//! current snapshot, logs, and does not retry.

use crate::{
    error::LiquitypeResult,
    settings::{SettingsPatch, TypeSettings},
};

/// External service proposing settings patches from a prompt.
///
/// Implementations must only populate fields present in [`SettingsPatch`];
/// the patch type itself excludes the text content from the schema.
pub trait SuggestionProvider {
    fn suggest(
        &mut self,
        prompt: &str,
        current: &TypeSettings,
    ) -> LiquitypeResult<SettingsPatch>;
}

/// Ask the provider for a patch and apply it, degrading to a no-op.
///
/// The patch is applied wholesale and the result re-validated; a patch that
/// fails validation is discarded entirely rather than applied piecemeal, so
/// the returned settings are always valid and either fully patched or
/// untouched.
#[tracing::instrument(skip(settings, provider))]
pub fn apply_suggestion(
    settings: &TypeSettings,
    provider: &mut dyn SuggestionProvider,
    prompt: &str,
) -> TypeSettings {
    let patch = match provider.suggest(prompt, settings) {
        Ok(patch) => patch,
        Err(err) => {
            tracing::warn!(%err, "style suggestion failed; keeping current settings");
            return settings.clone();
        }
    };

    if patch.is_empty() {
        tracing::debug!("style suggestion returned an empty patch");
        return settings.clone();
    }

    let patched = patch.apply_to(settings);
    match patched.validate() {
        Ok(()) => patched,
        Err(err) => {
            tracing::warn!(%err, "suggested patch failed validation; keeping current settings");
            settings.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::LiquitypeError,
        settings::{TextureMode, TypeSettings},
    };

    struct Failing;
    impl SuggestionProvider for Failing {
        fn suggest(
            &mut self,
            _prompt: &str,
            _current: &TypeSettings,
        ) -> LiquitypeResult<SettingsPatch> {
            Err(LiquitypeError::suggestion("network unreachable"))
        }
    }

    struct Fixed(SettingsPatch);
    impl SuggestionProvider for Fixed {
        fn suggest(
            &mut self,
            _prompt: &str,
            _current: &TypeSettings,
        ) -> LiquitypeResult<SettingsPatch> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn provider_failure_leaves_settings_unchanged() {
        let settings = TypeSettings::default();
        let out = apply_suggestion(&settings, &mut Failing, "make it dramatic");
        assert_eq!(out, settings);
    }

    #[test]
    fn valid_patch_is_applied() {
        let settings = TypeSettings::default();
        let patch = SettingsPatch {
            texture_mode: Some(TextureMode::Glass),
            blur_std_dev: Some(8.0),
            ..Default::default()
        };
        let out = apply_suggestion(&settings, &mut Fixed(patch), "glassy");
        assert_eq!(out.texture_mode, TextureMode::Glass);
        assert_eq!(out.blur_std_dev, 8.0);
        assert_eq!(out.text, settings.text);
    }

    #[test]
    fn invalid_patch_is_discarded_wholesale() {
        let settings = TypeSettings::default();
        let patch = SettingsPatch {
            texture_mode: Some(TextureMode::Glass), // valid on its own
            contrast: Some(0.2),                    // invalid; sinks the whole patch
            ..Default::default()
        };
        let out = apply_suggestion(&settings, &mut Fixed(patch), "broken");
        assert_eq!(out, settings);
    }

    #[test]
    fn empty_patch_is_a_no_op() {
        let settings = TypeSettings::default();
        let out = apply_suggestion(&settings, &mut Fixed(SettingsPatch::default()), "nothing");
        assert_eq!(out, settings);
    }
}
