//! Display settings singleton edited from the admin panel.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default)]
    pub background_image_url: String,
    #[serde(default)]
    pub tap_image_url: String,
    #[serde(default)]
    pub tap_video_url: String,
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub background_image_url: Option<String>,
    pub tap_image_url: Option<String>,
    pub tap_video_url: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.background_image_url.is_none()
            && self.tap_image_url.is_none()
            && self.tap_video_url.is_none()
    }

    pub fn apply(self, settings: &mut DisplaySettings) {
        if let Some(url) = self.background_image_url {
            settings.background_image_url = url;
        }
        if let Some(url) = self.tap_image_url {
            settings.tap_image_url = url;
        }
        if let Some(url) = self.tap_video_url {
            settings.tap_video_url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_update() {
        let mut settings = DisplaySettings {
            background_image_url: "bg.png".to_string(),
            tap_image_url: "tap.png".to_string(),
            tap_video_url: "tap.mp4".to_string(),
        };
        let update = SettingsUpdate {
            tap_image_url: Some("new.png".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut settings);

        assert_eq!(settings.background_image_url, "bg.png");
        assert_eq!(settings.tap_image_url, "new.png");
        assert!(SettingsUpdate::default().is_empty());
    }
}
