use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Behaviour when a watch trigger arrives for a task that is already running.
///
/// - `Overlap`: start another, independent run right away (default). Rapid
///   edits may therefore produce overlapping invocations of the same task.
/// - `Queue`: remember the trigger and start a single follow-up run once the
///   running invocation has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    #[default]
    Overlap,
    Queue,
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "overlap" => Ok(TriggerWhileRunningBehaviour::Overlap),
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            other => Err(format!(
                "invalid triggered_while_running_behaviour: {other} (expected \"overlap\" or \"queue\")"
            )),
        }
    }
}

/// What connected browsers should do after a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReloadKind {
    /// Re-fetch stylesheets in place.
    Styles,
    /// Reload the whole page.
    Full,
}

impl ReloadKind {
    /// Payload sent over the live-reload event stream.
    pub fn as_event_data(self) -> &'static str {
        match self {
            ReloadKind::Styles => "css",
            ReloadKind::Full => "reload",
        }
    }
}

/// CSS output style for the style transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Compressed,
    Expanded,
}

/// Logical asset categories known to the path registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetCategory {
    Style,
    Script,
    VendorScript,
    Template,
    Image,
    Font,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 6] = [
        AssetCategory::Style,
        AssetCategory::Script,
        AssetCategory::VendorScript,
        AssetCategory::Template,
        AssetCategory::Image,
        AssetCategory::Font,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AssetCategory::Style => "style",
            AssetCategory::Script => "script",
            AssetCategory::VendorScript => "vendor_script",
            AssetCategory::Template => "template",
            AssetCategory::Image => "image",
            AssetCategory::Font => "font",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
