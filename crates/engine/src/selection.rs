//! Selection state – the engine/variant an app is built on.
//!
//! The held key only changes through [`SelectionState::select`], which
//! re-validates the candidate against a fresh resolution every time.

use crate::availability::{resolve, Availability, AvailabilityContext};
use crate::catalog::{EngineCatalog, Variant};
use serde::{Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// SelectionKey
// ---------------------------------------------------------------------------

/// Structured engine key. Text form is `id` or `id/<tag>` (e.g. `chrome/tabs`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub engine_id: String,
    /// `None` means the engine's default variant.
    pub variant: Option<Variant>,
}

impl SelectionKey {
    pub fn new(engine_id: impl Into<String>, variant: Option<Variant>) -> Self {
        Self {
            engine_id: engine_id.into(),
            variant,
        }
    }

    /// Parse `id` or `id/tag`. Fails on empty ids, unknown tags and extra
    /// path segments.
    pub fn parse(raw: &str) -> Result<Self, SelectionRejected> {
        let malformed = || SelectionRejected::Malformed(raw.to_string());
        let mut parts = raw.split('/');
        let id = parts.next().filter(|s| !s.is_empty()).ok_or_else(malformed)?;
        let variant = match parts.next() {
            None => None,
            Some(tag) => Some(Variant::from_tag(tag).ok_or_else(|| {
                SelectionRejected::VariantNotOffered {
                    engine: id.to_string(),
                    variant: tag.to_string(),
                }
            })?),
        };
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(Self::new(id, variant))
    }
}

impl fmt::Display for SelectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant.and_then(|v| v.tag()) {
            Some(tag) => write!(f, "{}/{}", self.engine_id, tag),
            None => f.write_str(&self.engine_id),
        }
    }
}

impl Serialize for SelectionKey {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Why a candidate was refused. State is never touched on rejection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionRejected {
    #[error("malformed selection key '{0}'")]
    Malformed(String),
    #[error("unknown engine '{0}'")]
    UnknownEngine(String),
    #[error("engine '{engine}' is not selectable: {reason}")]
    NotSelectable { engine: String, reason: String },
    #[error("variant '{variant}' is not offered for engine '{engine}'")]
    VariantNotOffered { engine: String, variant: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectOutcome {
    Changed,
    Unchanged,
}

pub type SelectionObserver = Box<dyn FnMut(&SelectionKey) + Send>;

// ---------------------------------------------------------------------------
// SelectionState
// ---------------------------------------------------------------------------

pub struct SelectionState {
    catalog: EngineCatalog,
    context: AvailabilityContext,
    availability: Availability,
    current: Option<SelectionKey>,
    observer: Option<SelectionObserver>,
}

impl SelectionState {
    pub fn new(catalog: EngineCatalog, context: AvailabilityContext) -> Self {
        let availability = resolve(&catalog, &context);
        Self {
            catalog,
            context,
            availability,
            current: None,
            observer: None,
        }
    }

    /// Register the single observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl FnMut(&SelectionKey) + Send + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Recompute availability for a new context. The held key is kept as is.
    pub fn set_context(&mut self, context: AvailabilityContext) {
        if context != self.context {
            tracing::debug!(
                platform = %context.platform,
                multisite = context.multisite,
                widevine = context.widevine,
                "availability context changed"
            );
            self.context = context;
            self.availability = resolve(&self.catalog, &self.context);
        }
    }

    pub fn context(&self) -> &AvailabilityContext {
        &self.context
    }

    pub fn catalog(&self) -> &EngineCatalog {
        &self.catalog
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    /// `None` while in the initial unselected state.
    pub fn current(&self) -> Option<&SelectionKey> {
        self.current.as_ref()
    }

    pub fn select(&mut self, candidate: &str) -> Result<SelectOutcome, SelectionRejected> {
        let key = match self.validate(candidate) {
            Ok(k) => k,
            Err(e) => {
                tracing::debug!(candidate, error = %e, "engine selection rejected");
                return Err(e);
            }
        };

        if self.current.as_ref() == Some(&key) {
            return Ok(SelectOutcome::Unchanged);
        }

        tracing::info!(selection = %key, "engine selection changed");
        let key: &SelectionKey = self.current.insert(key);
        if let Some(observer) = self.observer.as_mut() {
            observer(key);
        }
        Ok(SelectOutcome::Changed)
    }

    /// Normalise `candidate` to a concrete key, or say why it cannot be held.
    fn validate(&self, candidate: &str) -> Result<SelectionKey, SelectionRejected> {
        let parsed = SelectionKey::parse(candidate)?;
        let descriptor = self
            .catalog
            .get(&parsed.engine_id)
            .ok_or_else(|| SelectionRejected::UnknownEngine(parsed.engine_id.clone()))?;

        let result = self
            .availability
            .get(descriptor.id)
            .filter(|r| r.visible)
            .ok_or_else(|| SelectionRejected::NotSelectable {
                engine: descriptor.id.to_string(),
                reason: format!("not available on {}", self.context.platform),
            })?;

        if !result.selectable {
            return Err(SelectionRejected::NotSelectable {
                engine: descriptor.id.to_string(),
                reason: result.disabled_reason.unwrap_or("incompatible").to_string(),
            });
        }

        let variant = parsed.variant.unwrap_or_else(|| descriptor.default_variant());
        if !result.offered_variants.contains(&variant) {
            return Err(SelectionRejected::VariantNotOffered {
                engine: descriptor.id.to_string(),
                variant: variant.label().to_ascii_lowercase(),
            });
        }

        Ok(SelectionKey::new(descriptor.id, Some(variant)))
    }
}

impl fmt::Debug for SelectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionState")
            .field("context", &self.context)
            .field("current", &self.current)
            .field("has_observer", &self.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Platform;
    use std::sync::{Arc, Mutex};

    fn state_with_log(ctx: AvailabilityContext) -> (SelectionState, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut state = SelectionState::new(EngineCatalog::builtin(), ctx);
        let sink = log.clone();
        state.set_observer(move |k| sink.lock().unwrap().push(k.to_string()));
        (state, log)
    }

    #[test]
    fn test_key_parsing() {
        assert_eq!(
            SelectionKey::parse("chrome/tabs").unwrap(),
            SelectionKey::new("chrome", Some(Variant::Tabbed))
        );
        assert_eq!(SelectionKey::parse("chrome").unwrap().variant, None);
        assert!(matches!(
            SelectionKey::parse(""),
            Err(SelectionRejected::Malformed(_))
        ));
        assert!(matches!(
            SelectionKey::parse("chrome/tabs/extra"),
            Err(SelectionRejected::Malformed(_))
        ));
        assert!(matches!(
            SelectionKey::parse("chrome/windowed"),
            Err(SelectionRejected::VariantNotOffered { .. })
        ));
    }

    #[test]
    fn test_starts_unselected() {
        let (state, log) = state_with_log(AvailabilityContext::new(Platform::Linux));
        assert!(state.current().is_none());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_select_is_idempotent() {
        let (mut state, log) = state_with_log(AvailabilityContext::new(Platform::Linux));
        assert_eq!(state.select("chrome/tabs").unwrap(), SelectOutcome::Changed);
        assert_eq!(state.select("chrome/tabs").unwrap(), SelectOutcome::Unchanged);
        assert_eq!(state.current().unwrap().to_string(), "chrome/tabs");
        assert_eq!(*log.lock().unwrap(), vec!["chrome/tabs".to_string()]);
    }

    #[test]
    fn test_bare_id_equals_default_variant() {
        let (mut state, log) = state_with_log(AvailabilityContext::new(Platform::Linux));
        state.select("chrome").unwrap();
        assert_eq!(state.select("chrome").unwrap(), SelectOutcome::Unchanged);
        assert_eq!(state.current().unwrap().to_string(), "chrome");
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_rejections_leave_state_alone() {
        let (mut state, log) = state_with_log(AvailabilityContext::new(Platform::Linux));
        state.select("brave").unwrap();

        for bad in ["bogus", "webkit", "electron/tabs", "chrome/nope", "/tabs"] {
            assert!(state.select(bad).is_err(), "{} should be rejected", bad);
        }
        assert_eq!(state.current().unwrap().to_string(), "brave");
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_widevine_rejects_embedded_engine() {
        let ctx = AvailabilityContext::new(Platform::Darwin).with_widevine(true);
        let (mut state, log) = state_with_log(ctx);
        let err = state.select("electron").unwrap_err();
        assert!(matches!(err, SelectionRejected::NotSelectable { .. }));
        assert!(state.current().is_none());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_multisite_refuses_tabbed_variant() {
        let ctx = AvailabilityContext::new(Platform::Darwin).with_multisite(true);
        let (mut state, _log) = state_with_log(ctx);
        assert!(matches!(
            state.select("chrome/tabs"),
            Err(SelectionRejected::VariantNotOffered { .. })
        ));
        assert!(matches!(
            state.select("webkit"),
            Err(SelectionRejected::NotSelectable { .. })
        ));
        assert_eq!(state.select("chrome").unwrap(), SelectOutcome::Changed);
    }

    #[test]
    fn test_opera_resolves_to_its_only_variant() {
        let (mut state, log) = state_with_log(AvailabilityContext::new(Platform::Darwin));
        state.select("opera").unwrap();
        assert_eq!(state.current().unwrap().to_string(), "opera/tabs");
        assert_eq!(state.select("opera/tabs").unwrap(), SelectOutcome::Unchanged);
        assert_eq!(*log.lock().unwrap(), vec!["opera/tabs".to_string()]);
    }

    #[test]
    fn test_unknown_engine() {
        let (mut state, _log) = state_with_log(AvailabilityContext::new(Platform::Darwin));
        assert_eq!(
            state.select("bogus").unwrap_err(),
            SelectionRejected::UnknownEngine("bogus".into())
        );
        assert!(state.current().is_none());
    }

    #[test]
    fn test_context_change_revalidates_later_selects() {
        let (mut state, _log) = state_with_log(AvailabilityContext::new(Platform::Darwin));
        state.select("webkit").unwrap();
        state.set_context(state.context().with_multisite(true));
        // Held key survives; new selections see the new rules.
        assert_eq!(state.current().unwrap().to_string(), "webkit");
        assert!(state.select("webkit").is_err());
    }
}
