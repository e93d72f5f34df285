//! Rain-on-windows configuration file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// File name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "RainOnWindowsConfig.json";

/// Key the config UI registers the file under.
pub const CONFIG_UI_KEY: &str = "RainOnWindowsConfig";

/// Title shown by the config UI.
pub const CONFIG_UI_TITLE: &str = "Rain on Windows";

/// Player-tunable settings of the rain-on-glass sampler.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RainOnWindowsConfig {
    /// Master switch.
    pub enable_rain_sounds_on_windows: bool,
    /// Treat any glass-material block as a candidate, not just blocks with
    /// the `glass` attribute.
    pub enable_rain_sounds_on_all_glass: bool,
    /// Extra volume multiplier, clamped to `[0, 2]` when applied.
    pub volume_scale: f32,
}

impl Default for RainOnWindowsConfig {
    fn default() -> Self {
        Self {
            enable_rain_sounds_on_windows: true,
            enable_rain_sounds_on_all_glass: false,
            volume_scale: 1.0,
        }
    }
}

impl RainOnWindowsConfig {
    /// Path of the config file inside `dir`.
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(CONFIG_FILE_NAME)
    }

    /// Load from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RainOnWindowsConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    RainOnWindowsConfig::default()
                }
            },
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound {
                    warn!("Rain config not found at {}. Using defaults", path.display());
                } else {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                }
                RainOnWindowsConfig::default()
            }
        }
    }

    /// Load the config in `dir`. A missing or unreadable file is replaced by
    /// the defaults on disk.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        let path = Self::path_in(dir);
        let valid = fs::read_to_string(&path)
            .ok()
            .and_then(|contents| serde_json::from_str::<RainOnWindowsConfig>(&contents).ok());
        match valid {
            Some(cfg) => Ok(cfg),
            None => {
                let cfg = Self::load_from_path(&path);
                cfg.save_to_path(&path)?;
                info!("Wrote default rain config to {}", path.display());
                Ok(cfg)
            }
        }
    }

    /// Save to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    /// Volume multiplier as applied to sounds.
    pub fn effective_volume_scale(&self) -> f32 {
        self.volume_scale.clamp(0.0, 2.0)
    }
}

/// Called with the edited config when the player saves it in the UI.
pub type ConfigApply = Box<dyn FnMut(RainOnWindowsConfig)>;

/// Optional in-game config editor.
pub trait ConfigUi {
    /// Register an editable config. Failures are reported, not fatal.
    fn register_config(
        &mut self,
        key: &str,
        current: &RainOnWindowsConfig,
        on_apply: ConfigApply,
        title: &str,
    ) -> Result<()>;
}

/// Register with the config UI when one is present. Applied edits are
/// handed to `apply` and written to `config_dir`.
///
/// Returns whether registration succeeded.
pub fn try_register_with_config_ui(
    ui: Option<&mut dyn ConfigUi>,
    current: &RainOnWindowsConfig,
    config_dir: &Path,
    mut apply: impl FnMut(RainOnWindowsConfig) + 'static,
) -> bool {
    let Some(ui) = ui else {
        return false;
    };
    let path = RainOnWindowsConfig::path_in(config_dir);
    let on_apply: ConfigApply = Box::new(move |cfg: RainOnWindowsConfig| {
        if let Err(err) = cfg.save_to_path(&path) {
            warn!("Failed to store rain config: {err:#}");
        }
        apply(cfg);
    });
    match ui.register_config(CONFIG_UI_KEY, current, on_apply, CONFIG_UI_TITLE) {
        Ok(()) => {
            info!("Registered rain config with the config UI");
            true
        }
        Err(err) => {
            warn!("Config UI registration failed: {err:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn keys_are_pascal_case_and_optional() {
        let cfg: RainOnWindowsConfig =
            serde_json::from_str(r#"{ "EnableRainSoundsOnAllGlass": true }"#).unwrap();
        assert!(cfg.enable_rain_sounds_on_windows);
        assert!(cfg.enable_rain_sounds_on_all_glass);
        assert_eq!(cfg.volume_scale, 1.0);

        let json = serde_json::to_string(&RainOnWindowsConfig::default()).unwrap();
        assert!(json.contains("\"VolumeScale\":1.0"));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RainOnWindowsConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(cfg, RainOnWindowsConfig::default());
        assert!(RainOnWindowsConfig::path_in(dir.path()).exists());
    }

    #[test]
    fn corrupt_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = RainOnWindowsConfig::path_in(dir.path());
        fs::write(&path, "{ not json").unwrap();
        let cfg = RainOnWindowsConfig::load_or_create(dir.path()).unwrap();
        assert_eq!(cfg, RainOnWindowsConfig::default());
        let reread: RainOnWindowsConfig =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reread, cfg);
    }

    #[test]
    fn volume_scale_is_clamped_when_applied() {
        let cfg = RainOnWindowsConfig {
            volume_scale: 5.0,
            ..Default::default()
        };
        assert_eq!(cfg.effective_volume_scale(), 2.0);
    }

    struct RecordingUi {
        apply: Option<ConfigApply>,
        fail: bool,
    }

    impl ConfigUi for RecordingUi {
        fn register_config(
            &mut self,
            key: &str,
            _current: &RainOnWindowsConfig,
            on_apply: ConfigApply,
            _title: &str,
        ) -> Result<()> {
            if self.fail {
                anyhow::bail!("no such method");
            }
            assert_eq!(key, CONFIG_UI_KEY);
            self.apply = Some(on_apply);
            Ok(())
        }
    }

    #[test]
    fn ui_edits_are_applied_and_stored() {
        let dir = tempfile::tempdir().unwrap();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let mut ui = RecordingUi {
            apply: None,
            fail: false,
        };
        let ok = try_register_with_config_ui(
            Some(&mut ui),
            &RainOnWindowsConfig::default(),
            dir.path(),
            move |cfg| *sink.borrow_mut() = Some(cfg),
        );
        assert!(ok);

        let edited = RainOnWindowsConfig {
            volume_scale: 0.5,
            ..Default::default()
        };
        (ui.apply.as_mut().unwrap())(edited.clone());
        assert_eq!(seen.borrow().as_ref(), Some(&edited));
        let stored = RainOnWindowsConfig::load_from_path(&RainOnWindowsConfig::path_in(dir.path()));
        assert_eq!(stored, edited);
    }

    #[test]
    fn absent_or_failing_ui_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = RainOnWindowsConfig::default();
        assert!(!try_register_with_config_ui(None, &cfg, dir.path(), |_| {}));
        let mut ui = RecordingUi {
            apply: None,
            fail: true,
        };
        assert!(!try_register_with_config_ui(Some(&mut ui), &cfg, dir.path(), |_| {}));
    }
}
