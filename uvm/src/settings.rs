use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use log::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebuggerSettings {
    // Panel visibility
    pub show_registers: bool,
    pub show_heap: bool,
    pub show_disassembly: bool,

    // Display preferences
    pub hex_registers: bool,
    pub disassembly_lines: usize,
}

impl Default for DebuggerSettings {
    fn default() -> Self {
        Self {
            show_registers: true,
            show_heap: false,
            show_disassembly: true,
            hex_registers: true,
            disassembly_lines: crate::constants::DEBUG_DISASM_CONTEXT,
        }
    }
}

impl DebuggerSettings {
    /// Get the path to the settings file
    pub fn settings_path() -> PathBuf {
        if let Ok(config_dir) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(config_dir).join("uvm").join("debugger.json")
        } else if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config").join("uvm").join("debugger.json")
        } else {
            PathBuf::from(".uvm_debugger.json")
        }
    }

    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load_from(path: &std::path::Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str(&contents) {
                    Ok(settings) => return settings,
                    Err(e) => warn!("Failed to parse debugger settings: {e}"),
                },
                Err(e) => warn!("Failed to read debugger settings: {e}"),
            }
        }

        Self::default()
    }

    /// Save settings to disk
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {e}"))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {e}"))?;

        fs::write(path, json).map_err(|e| format!("Failed to write settings: {e}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("uvm-settings-test-missing").join("debugger.json");
        assert_eq!(DebuggerSettings::load_from(&path), DebuggerSettings::default());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let settings: DebuggerSettings = serde_json::from_str(r#"{ "show_heap": true }"#).unwrap();
        assert!(settings.show_heap);
        assert!(settings.show_registers);
        assert_eq!(settings.disassembly_lines, crate::constants::DEBUG_DISASM_CONTEXT);
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir()
            .join(format!("uvm-settings-test-{}", std::process::id()))
            .join("debugger.json");
        let settings = DebuggerSettings {
            hex_registers: false,
            disassembly_lines: 7,
            ..Default::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(DebuggerSettings::load_from(&path), settings);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
