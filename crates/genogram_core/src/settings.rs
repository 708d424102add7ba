//! Editor configuration.
//!
//! # Responsibility
//! - Hold grid, spacing, export and history tuning for one editor session.
//! - Apply partial updates coming from the embedding host.
//!
//! # Invariants
//! - Size and spacing values stay finite and strictly positive.
//! - A rejected patch leaves the current settings untouched.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_GRID_SIZE: f64 = 20.0;
pub const DEFAULT_PERSON_SIZE: f64 = 60.0;
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Colour scheme requested by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Canvas background used when exporting opaque images.
    pub fn background(self) -> &'static str {
        match self {
            Self::Light => "#ffffff",
            Self::Dark => "#1e1e1e",
        }
    }

    /// Default stroke/text colour.
    pub fn foreground(self) -> &'static str {
        match self {
            Self::Light => "#212121",
            Self::Dark => "#eeeeee",
        }
    }
}

/// Session settings; serialized with the host's camelCase naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorSettings {
    pub grid_size: f64,
    pub snap_to_grid: bool,
    pub theme: Theme,
    /// Side of the square drawn for every person.
    pub person_size: f64,
    /// Vertical distance from parents to a newly created child.
    pub generation_gap: f64,
    /// Horizontal distance from a person to a newly created partner.
    pub partner_spacing: f64,
    /// Horizontal distance between siblings of one union.
    pub sibling_spacing: f64,
    /// Auto-arrange column width.
    pub column_width: f64,
    /// Auto-arrange row height per generation.
    pub row_height: f64,
    pub export_padding: f64,
    /// Pixel density multiplier for raster export.
    pub export_scale: f64,
    pub history_limit: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            snap_to_grid: false,
            theme: Theme::Light,
            person_size: DEFAULT_PERSON_SIZE,
            generation_gap: 150.0,
            partner_spacing: 150.0,
            sibling_spacing: 100.0,
            column_width: 120.0,
            row_height: 150.0,
            export_padding: 40.0,
            export_scale: 2.0,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Partial settings update (`UPDATE_SETTINGS` payload).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub grid_size: Option<f64>,
    pub snap_to_grid: Option<bool>,
    pub theme: Option<Theme>,
    pub person_size: Option<f64>,
    pub generation_gap: Option<f64>,
    pub partner_spacing: Option<f64>,
    pub sibling_spacing: Option<f64>,
    pub column_width: Option<f64>,
    pub row_height: Option<f64>,
    pub export_padding: Option<f64>,
    pub export_scale: Option<f64>,
    pub history_limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// Named field must be a finite, strictly positive number.
    NotPositive { field: &'static str, value: f64 },
    /// Padding may be zero but not negative.
    NegativePadding(f64),
    ZeroHistoryLimit,
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive { field, value } => {
                write!(f, "setting `{field}` must be a positive number, got {value}")
            }
            Self::NegativePadding(value) => {
                write!(f, "setting `exportPadding` must not be negative, got {value}")
            }
            Self::ZeroHistoryLimit => write!(f, "setting `historyLimit` must be at least 1"),
        }
    }
}

impl Error for SettingsError {}

impl EditorSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("gridSize", self.grid_size),
            ("personSize", self.person_size),
            ("generationGap", self.generation_gap),
            ("partnerSpacing", self.partner_spacing),
            ("siblingSpacing", self.sibling_spacing),
            ("columnWidth", self.column_width),
            ("rowHeight", self.row_height),
            ("exportScale", self.export_scale),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::NotPositive { field, value });
            }
        }
        if !(self.export_padding.is_finite() && self.export_padding >= 0.0) {
            return Err(SettingsError::NegativePadding(self.export_padding));
        }
        if self.history_limit == 0 {
            return Err(SettingsError::ZeroHistoryLimit);
        }
        Ok(())
    }

    /// Applies `patch` atomically; invalid patches change nothing.
    pub fn apply(&mut self, patch: SettingsPatch) -> Result<(), SettingsError> {
        let mut next = self.clone();
        macro_rules! take {
            ($($field:ident),*) => {
                $(if let Some(value) = patch.$field {
                    next.$field = value;
                })*
            };
        }
        take!(
            grid_size,
            snap_to_grid,
            theme,
            person_size,
            generation_gap,
            partner_spacing,
            sibling_spacing,
            column_width,
            row_height,
            export_padding,
            export_scale,
            history_limit
        );
        next.validate()?;
        *self = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{EditorSettings, SettingsError, SettingsPatch, Theme};

    #[test]
    fn defaults_are_valid() {
        let settings = EditorSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.grid_size, 20.0);
        assert!(!settings.snap_to_grid);
    }

    #[test]
    fn patch_deserializes_from_camel_case() {
        let patch: SettingsPatch = serde_json::from_value(serde_json::json!({
            "gridSize": 25.0,
            "snapToGrid": true,
            "theme": "dark"
        }))
        .unwrap();
        let mut settings = EditorSettings::default();
        settings.apply(patch).unwrap();
        assert_eq!(settings.grid_size, 25.0);
        assert!(settings.snap_to_grid);
        assert_eq!(settings.theme, Theme::Dark);
    }

    #[test]
    fn invalid_patch_leaves_settings_untouched() {
        let mut settings = EditorSettings::default();
        let err = settings
            .apply(SettingsPatch {
                snap_to_grid: Some(true),
                grid_size: Some(-5.0),
                ..SettingsPatch::default()
            })
            .unwrap_err();
        assert!(matches!(err, SettingsError::NotPositive { field: "gridSize", .. }));
        assert!(!settings.snap_to_grid);
        assert_eq!(settings.grid_size, 20.0);
    }
}
