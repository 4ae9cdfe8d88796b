//! Control protocol methods.

use nosleep_types::ExecFlags;
use std::str::FromStr;

/// Service identity that namespaces every method on the wire.
pub const SERVICE_NAME: &str = "ExecStateManager";

/// A remotely invokable control operation.
///
/// | Method | Flags requested | Effect |
/// |--------|-----------------|--------|
/// | `Clear` | `CONTINUOUS` | release all holds |
/// | `Display` | `SYSTEM_REQUIRED \| DISPLAY_REQUIRED` | system and display awake |
/// | `System` | `SYSTEM_REQUIRED` | system awake, display may sleep |
/// | `Critical` | `SYSTEM_REQUIRED \| AWAYMODE_REQUIRED` | away mode |
/// | `Read` | none | last recorded snapshot |
/// | `Shutdown` | none | stop serving |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Clear,
    Display,
    System,
    Critical,
    Read,
    Shutdown,
}

impl Method {
    /// Every method, in protocol order.
    pub const ALL: [Self; 6] = [
        Self::Clear,
        Self::Display,
        Self::System,
        Self::Critical,
        Self::Read,
        Self::Shutdown,
    ];

    /// Bare method name, e.g. `"Display"`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Display => "Display",
            Self::System => "System",
            Self::Critical => "Critical",
            Self::Read => "Read",
            Self::Shutdown => "Shutdown",
        }
    }

    /// Namespaced wire name, e.g. `"ExecStateManager.Display"`.
    #[must_use]
    pub fn wire_name(self) -> String {
        format!("{SERVICE_NAME}.{}", self.name())
    }

    /// Resolves an exact wire name. Unknown names yield `None`.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        let (service, method) = name.split_once('.')?;
        if service != SERVICE_NAME {
            return None;
        }
        Self::ALL.into_iter().find(|m| m.name() == method)
    }

    /// Flags this method requests, or `None` for non-mutating methods.
    #[must_use]
    pub fn target_flags(self) -> Option<ExecFlags> {
        match self {
            Self::Clear => Some(ExecFlags::CLEAR),
            Self::Display => Some(ExecFlags::DISPLAY),
            Self::System => Some(ExecFlags::SYSTEM),
            Self::Critical => Some(ExecFlags::CRITICAL),
            Self::Read | Self::Shutdown => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Lenient parse for command-line use: case-insensitive, with or without
/// the service prefix.
impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s
            .split_once('.')
            .filter(|(service, _)| service.eq_ignore_ascii_case(SERVICE_NAME))
            .map_or(s, |(_, method)| method);
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(bare))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|m| m.name()).collect();
                format!("unknown method '{s}', expected one of: {}", names.join(", "))
            })
    }
}
