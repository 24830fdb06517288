//! Availability resolver – which catalog entries are shown and which can be
//! picked for a given host platform and app configuration.

use crate::catalog::{EngineCatalog, EngineDescriptor, Platform, Variant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const WIDEVINE_INCOMPATIBLE: &str = "This app is incompatible with WebCatalog Engine.";
pub const MULTISITE_INCOMPATIBLE: &str = "This app is incompatible with WebKit.";

/// Inputs to a resolution. Platform is fixed for the process; the flags come
/// from the app configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityContext {
    #[serde(with = "platform_id")]
    pub platform: Platform,
    #[serde(default)]
    pub multisite: bool,
    #[serde(default)]
    pub widevine: bool,
}

impl AvailabilityContext {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            multisite: false,
            widevine: false,
        }
    }

    pub fn current() -> Self {
        Self::new(Platform::current())
    }

    pub fn with_multisite(mut self, multisite: bool) -> Self {
        self.multisite = multisite;
        self
    }

    pub fn with_widevine(mut self, widevine: bool) -> Self {
        self.widevine = widevine;
        self
    }
}

impl Default for AvailabilityContext {
    fn default() -> Self {
        Self::current()
    }
}

mod platform_id {
    use crate::catalog::Platform;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(p: &Platform, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(p.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Platform, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(Platform::from_id(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailabilityResult {
    pub visible: bool,
    pub selectable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled_reason: Option<&'static str>,
    /// Variants a selection may name. Empty when invisible.
    pub offered_variants: Vec<Variant>,
    /// Whether the Standard/Tabbed toggle is rendered at all.
    pub show_variant_toggle: bool,
}

/// Result of [`resolve`], keyed by engine id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Availability {
    entries: BTreeMap<&'static str, AvailabilityResult>,
}

impl Availability {
    pub fn get(&self, id: &str) -> Option<&AvailabilityResult> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in catalog display order.
    pub fn in_display_order<'a>(
        &'a self,
        catalog: &EngineCatalog,
    ) -> impl Iterator<Item = (&'static EngineDescriptor, &'a AvailabilityResult)> + 'a {
        let list = catalog.list();
        list.iter()
            .filter_map(move |d| self.entries.get(d.id).map(|r| (d, r)))
    }
}

/// Resolve availability for every catalog entry. Total and pure.
pub fn resolve(catalog: &EngineCatalog, ctx: &AvailabilityContext) -> Availability {
    let entries = catalog
        .list()
        .iter()
        .map(|d| (d.id, resolve_one(d, ctx)))
        .collect();
    Availability { entries }
}

fn resolve_one(d: &EngineDescriptor, ctx: &AvailabilityContext) -> AvailabilityResult {
    let visible = d.platforms.contains(ctx.platform);
    if !visible {
        return AvailabilityResult {
            visible: false,
            selectable: false,
            disabled_reason: None,
            offered_variants: Vec::new(),
            show_variant_toggle: false,
        };
    }

    let blocked = incompatibility(d, ctx);
    let offered_variants = if ctx.multisite {
        vec![d.default_variant()]
    } else {
        d.variants.to_vec()
    };

    AvailabilityResult {
        visible: true,
        selectable: blocked.is_none(),
        disabled_reason: blocked,
        offered_variants,
        show_variant_toggle: !ctx.multisite && d.is_multi_variant(),
    }
}

/// Hard incompatibility rules. Returns the tooltip text of the rule that fired.
fn incompatibility(d: &EngineDescriptor, ctx: &AvailabilityContext) -> Option<&'static str> {
    match d.id {
        "electron" if ctx.widevine => Some(WIDEVINE_INCOMPATIBLE),
        "webkit" if ctx.multisite => Some(MULTISITE_INCOMPATIBLE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(platform: Platform) -> AvailabilityContext {
        AvailabilityContext::new(platform)
    }

    #[test]
    fn test_invisible_is_never_selectable() {
        let catalog = EngineCatalog::builtin();
        for platform in [Platform::Darwin, Platform::Win32, Platform::Linux, Platform::Unknown] {
            for multisite in [false, true] {
                for widevine in [false, true] {
                    let c = ctx(platform).with_multisite(multisite).with_widevine(widevine);
                    let availability = resolve(&catalog, &c);
                    assert_eq!(availability.len(), catalog.list().len());
                    for (d, r) in availability.in_display_order(&catalog) {
                        if !r.visible {
                            assert!(!r.selectable, "{} selectable while hidden", d.id);
                            assert!(r.disabled_reason.is_none());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_resolve_is_pure() {
        let catalog = EngineCatalog::builtin();
        let c = ctx(Platform::Darwin).with_multisite(true);
        assert_eq!(resolve(&catalog, &c), resolve(&catalog, &c));
    }

    #[test]
    fn test_linux_visibility() {
        let catalog = EngineCatalog::builtin();
        let a = resolve(&catalog, &ctx(Platform::Linux));
        for hidden in ["webkit", "firefox", "edge", "chromium", "coccoc"] {
            assert!(!a.get(hidden).unwrap().visible, "{} should be hidden", hidden);
        }
        for shown in ["chrome", "brave"] {
            let r = a.get(shown).unwrap();
            assert!(r.visible && r.selectable, "{} should be selectable", shown);
        }
    }

    #[test]
    fn test_widevine_blocks_embedded_engine() {
        let catalog = EngineCatalog::builtin();
        let a = resolve(&catalog, &ctx(Platform::Darwin).with_widevine(true));
        let electron = a.get("electron").unwrap();
        assert!(electron.visible);
        assert!(!electron.selectable);
        assert_eq!(electron.disabled_reason, Some(WIDEVINE_INCOMPATIBLE));
    }

    #[test]
    fn test_multisite_blocks_webkit_and_hides_toggles() {
        let catalog = EngineCatalog::builtin();
        let a = resolve(&catalog, &ctx(Platform::Darwin).with_multisite(true));

        let webkit = a.get("webkit").unwrap();
        assert!(webkit.visible && !webkit.selectable);
        assert_eq!(webkit.disabled_reason, Some(MULTISITE_INCOMPATIBLE));

        let chrome = a.get("chrome").unwrap();
        assert!(chrome.selectable);
        assert!(!chrome.show_variant_toggle);
        assert_eq!(chrome.offered_variants, vec![Variant::Standard]);

        let opera = a.get("opera").unwrap();
        assert_eq!(opera.offered_variants, vec![Variant::Tabbed]);
    }

    #[test]
    fn test_toggle_only_for_multi_variant_engines() {
        let catalog = EngineCatalog::builtin();
        let a = resolve(&catalog, &ctx(Platform::Darwin));
        assert!(a.get("chrome").unwrap().show_variant_toggle);
        assert!(!a.get("electron").unwrap().show_variant_toggle);
        assert!(!a.get("opera").unwrap().show_variant_toggle);
    }

    #[test]
    fn test_unknown_platform_keeps_unscoped_engines() {
        let catalog = EngineCatalog::builtin();
        let a = resolve(&catalog, &ctx(Platform::Unknown));
        assert!(a.get("chrome").unwrap().visible);
        assert!(!a.get("webkit").unwrap().visible);
        assert!(!a.get("firefox").unwrap().visible);
    }

    #[test]
    fn test_context_deserializes_platform_ids() {
        let c: AvailabilityContext =
            serde_json::from_value(serde_json::json!({ "platform": "win32", "multisite": true }))
                .unwrap();
        assert_eq!(c.platform, Platform::Win32);
        assert!(c.multisite);
        assert!(!c.widevine);
    }
}
