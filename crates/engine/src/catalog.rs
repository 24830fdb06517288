//! Engine catalog – the static, ordered registry of rendering engines.
//!
//! Display order is the order of [`BUILTIN_ENGINES`]. Lookups are by exact id;
//! `chrome` and `chromeCanary` are unrelated entries.

use serde::Serialize;
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// Host platform, using the desktop-runtime naming (`darwin`, `win32`, `linux`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Darwin,
    Win32,
    Linux,
    Unknown,
}

impl Platform {
    /// Parse a host identifier. Anything unrecognised becomes `Unknown`.
    pub fn from_id(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "darwin" | "macos" => Platform::Darwin,
            "win32" | "windows" => Platform::Win32,
            "linux" => Platform::Linux,
            _ => Platform::Unknown,
        }
    }

    /// The platform this process runs on.
    pub fn current() -> Self {
        Self::from_id(std::env::consts::OS)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Darwin => "darwin",
            Platform::Win32 => "win32",
            Platform::Linux => "linux",
            Platform::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of platforms an engine is offered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformMask {
    All,
    Only(&'static [Platform]),
}

impl PlatformMask {
    /// `All` matches any platform, `Unknown` included. `Only` never matches
    /// `Unknown`, so platform-scoped engines vanish on unrecognised hosts.
    pub fn contains(&self, platform: Platform) -> bool {
        match self {
            PlatformMask::All => true,
            PlatformMask::Only(_) if platform == Platform::Unknown => false,
            PlatformMask::Only(list) => list.contains(&platform),
        }
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    /// Isolated app window.
    Standard,
    /// Native multi-tab browser UI.
    Tabbed,
}

impl Variant {
    /// Suffix used in selection keys (`chrome/tabs`). `Standard` has none.
    pub fn tag(&self) -> Option<&'static str> {
        match self {
            Variant::Standard => None,
            Variant::Tabbed => Some("tabs"),
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "tabs" => Some(Variant::Tabbed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Variant::Standard => "Standard",
            Variant::Tabbed => "Tabbed",
        }
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineDescriptor {
    pub id: &'static str,
    pub display_name: &'static str,
    /// Opaque asset reference resolved by the presentation layer.
    pub icon_ref: &'static str,
    /// Never empty. The first entry is the default variant.
    pub variants: &'static [Variant],
    pub platforms: PlatformMask,
    pub experimental: bool,
}

impl EngineDescriptor {
    pub fn default_variant(&self) -> Variant {
        self.variants.first().copied().unwrap_or(Variant::Standard)
    }

    pub fn supports(&self, variant: Variant) -> bool {
        self.variants.contains(&variant)
    }

    pub fn is_multi_variant(&self) -> bool {
        self.variants.len() > 1
    }
}

const STANDARD_ONLY: &[Variant] = &[Variant::Standard];
const TABBED_ONLY: &[Variant] = &[Variant::Tabbed];
const BOTH: &[Variant] = &[Variant::Standard, Variant::Tabbed];

const DARWIN: &[Platform] = &[Platform::Darwin];
const DARWIN_WIN32: &[Platform] = &[Platform::Darwin, Platform::Win32];

const fn browser(
    id: &'static str,
    display_name: &'static str,
    icon_ref: &'static str,
    variants: &'static [Variant],
    platforms: PlatformMask,
) -> EngineDescriptor {
    EngineDescriptor {
        id,
        display_name,
        icon_ref,
        variants,
        platforms,
        experimental: true,
    }
}

/// Built-in engines in display order.
pub static BUILTIN_ENGINES: &[EngineDescriptor] = &[
    EngineDescriptor {
        id: "electron",
        display_name: "WebCatalog Engine",
        icon_ref: "default-icon.png",
        variants: STANDARD_ONLY,
        platforms: PlatformMask::All,
        experimental: false,
    },
    browser("webkit", "WebKit (part of Safari)", "webkit.png", STANDARD_ONLY, PlatformMask::Only(DARWIN)),
    browser("firefox", "Mozilla Firefox", "firefox.png", BOTH, PlatformMask::Only(DARWIN_WIN32)),
    browser("chrome", "Google Chrome", "chrome.png", BOTH, PlatformMask::All),
    browser("brave", "Brave", "brave.png", BOTH, PlatformMask::All),
    browser("chromeCanary", "Google Chrome Canary", "chrome-canary.png", BOTH, PlatformMask::Only(DARWIN)),
    browser("chromium", "Chromium", "chromium.png", BOTH, PlatformMask::Only(DARWIN)),
    browser("coccoc", "Cốc Cốc", "coccoc.png", BOTH, PlatformMask::Only(DARWIN_WIN32)),
    browser("edge", "Microsoft Edge", "edge.png", BOTH, PlatformMask::Only(DARWIN_WIN32)),
    browser("opera", "Opera", "opera.png", TABBED_ONLY, PlatformMask::All),
    browser("vivaldi", "Vivaldi", "vivaldi.png", BOTH, PlatformMask::All),
    browser("yandex", "Yandex Browser", "yandex.png", BOTH, PlatformMask::All),
];

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("engine '{0}' declares no variants")]
    EmptyVariants(&'static str),
    #[error("duplicate engine id '{0}'")]
    DuplicateId(&'static str),
}

/// Immutable, ordered view over a set of engine descriptors.
#[derive(Debug, Clone, Copy)]
pub struct EngineCatalog {
    entries: &'static [EngineDescriptor],
}

impl EngineCatalog {
    pub fn new(entries: &'static [EngineDescriptor]) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for e in entries {
            if e.variants.is_empty() {
                return Err(CatalogError::EmptyVariants(e.id));
            }
            if !seen.insert(e.id) {
                return Err(CatalogError::DuplicateId(e.id));
            }
        }
        Ok(Self { entries })
    }

    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_ENGINES,
        }
    }

    pub fn list(&self) -> &'static [EngineDescriptor] {
        self.entries
    }

    pub fn get(&self, id: &str) -> Option<&'static EngineDescriptor> {
        self.entries.iter().find(|e| e.id == id)
    }
}

impl Default for EngineCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
