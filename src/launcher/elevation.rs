//! Privilege elevation for ports below 1024
//!
//! The template is chosen once at startup by probing for known tools and is
//! then handed to the launcher.

use log::{debug, info, warn};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

use crate::config::StartupConfig;
use crate::error::SettingsError;

const PLACEHOLDER: &str = "%s";

/// A command wrapper with a single `%s` substitution point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElevationTemplate(String);

impl ElevationTemplate {
    pub fn new(template: &str) -> Result<Self, SettingsError> {
        if template.matches(PLACEHOLDER).count() != 1 {
            return Err(SettingsError::InvalidTemplate(template.to_string()));
        }
        Ok(Self(template.to_string()))
    }

    /// The "no elevation" template; applying it leaves commands unchanged
    pub fn identity() -> Self {
        Self(PLACEHOLDER.to_string())
    }

    pub fn is_identity(&self) -> bool {
        self.0 == PLACEHOLDER
    }

    pub fn apply(&self, command: &str) -> String {
        self.0.replacen(PLACEHOLDER, command, 1)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ElevationTemplate {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Display for ElevationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An elevation tool to look for and the template used when it is present
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ElevationCandidate {
    pub path: String,
    pub template: String,
}

impl ElevationCandidate {
    /// polkit first, graphical sudo second
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                path: "/usr/bin/pkexec".to_string(),
                template: "pkexec %s".to_string(),
            },
            Self {
                path: "/usr/bin/gksu".to_string(),
                template: "gksu '%s'".to_string(),
            },
        ]
    }
}

/// Probes the filesystem for the first available elevation tool.
///
/// Falls back to the identity template when none is installed, in which case
/// privileged ports are attempted unprivileged.
pub fn determine_elevation_template(candidates: &[ElevationCandidate]) -> ElevationTemplate {
    for candidate in candidates {
        if !Path::new(&candidate.path).exists() {
            debug!("Elevation tool {} not found", candidate.path);
            continue;
        }

        match ElevationTemplate::new(&candidate.template) {
            Ok(template) => {
                info!("Using {} for privileged ports", candidate.path);
                return template;
            }
            Err(e) => warn!("Skipping elevation tool {}: {}", candidate.path, e),
        }
    }

    info!("No elevation tool found; ports below 1024 will run unprivileged");
    ElevationTemplate::identity()
}

/// Resolves the template for this process: an explicit override wins over probing
pub fn resolve_elevation(startup: &StartupConfig) -> Result<ElevationTemplate, SettingsError> {
    match &startup.elevation_template {
        Some(template) => {
            info!("Using configured elevation template '{}'", template);
            ElevationTemplate::new(template)
        }
        None => Ok(determine_elevation_template(&startup.elevation_candidates)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(path: &Path, template: &str) -> ElevationCandidate {
        ElevationCandidate {
            path: path.to_string_lossy().to_string(),
            template: template.to_string(),
        }
    }

    #[test]
    fn test_identity_leaves_command_unchanged() {
        let identity = ElevationTemplate::identity();
        assert!(identity.is_identity());
        assert_eq!(identity.apply("php -S a:80"), "php -S a:80");
    }

    #[test]
    fn test_template_requires_one_placeholder() {
        assert!(ElevationTemplate::new("sudo").is_err());
        assert!(ElevationTemplate::new("%s %s").is_err());
        assert_eq!(
            ElevationTemplate::new("gksu '%s'").unwrap().apply("php"),
            "gksu 'php'"
        );
    }

    #[test]
    fn test_first_present_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("pkexec");
        let fallback = dir.path().join("gksu");
        std::fs::write(&primary, "").unwrap();
        std::fs::write(&fallback, "").unwrap();

        let candidates = vec![candidate(&primary, "pkexec %s"), candidate(&fallback, "gksu '%s'")];
        assert_eq!(determine_elevation_template(&candidates).as_str(), "pkexec %s");
    }

    #[test]
    fn test_fallback_candidate_used_when_primary_missing() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("pkexec");
        let fallback = dir.path().join("gksu");
        std::fs::write(&fallback, "").unwrap();

        let candidates = vec![candidate(&primary, "pkexec %s"), candidate(&fallback, "gksu '%s'")];
        assert_eq!(determine_elevation_template(&candidates).as_str(), "gksu '%s'");
    }

    #[test]
    fn test_no_candidates_present_degrades_to_identity() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = vec![candidate(&dir.path().join("pkexec"), "pkexec %s")];
        assert!(determine_elevation_template(&candidates).is_identity());
        assert!(determine_elevation_template(&[]).is_identity());
    }

    #[test]
    fn test_configured_template_skips_probing() {
        let startup = StartupConfig {
            elevation_template: Some("doas %s".to_string()),
            elevation_candidates: Vec::new(),
            ..StartupConfig::default()
        };
        assert_eq!(resolve_elevation(&startup).unwrap().as_str(), "doas %s");
    }
}
