//! Help text shown next to each engine in the picker.

use crate::catalog::EngineDescriptor;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineHelp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabbed: Option<String>,
}

/// Tooltip text for an engine, split per variant where both exist.
pub fn describe(engine: &EngineDescriptor) -> EngineHelp {
    let name = help_name(engine);
    match engine.id {
        "webkit" => EngineHelp {
            standard: Some(format!(
                "This option creates lightweight {name}-based app, optimized to save memory & battery."
            )),
            tabbed: None,
        },
        "electron" => EngineHelp {
            standard: Some(format!(
                "This option creates {name}-based app with many exclusive features such as workspaces, \
                 notifications, badges and email handling. {name} does not support WebExtensions and \
                 DRM-protected apps such as Netflix or Spotify."
            )),
            tabbed: None,
        },
        "opera" => EngineHelp {
            standard: None,
            tabbed: Some(tabbed_text(name)),
        },
        id => {
            let extensions = if id == "firefox" {
                ""
            } else {
                " with WebExtension support"
            };
            EngineHelp {
                standard: Some(format!(
                    "This option creates bare-bone {name}-based app{extensions}."
                )),
                tabbed: Some(tabbed_text(name)),
            }
        }
    }
}

fn tabbed_text(name: &str) -> String {
    format!(
        "This option creates {name}-based app with traditional browser user interface, tab and WebExtension support."
    )
}

fn help_name(engine: &EngineDescriptor) -> &'static str {
    match engine.id {
        "electron" => "WebCatalog Engine (Electron)",
        "webkit" => "WebKit",
        _ => engine.display_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EngineCatalog;

    fn help(id: &str) -> EngineHelp {
        describe(EngineCatalog::builtin().get(id).unwrap())
    }

    #[test]
    fn test_firefox_omits_webextension_wording() {
        let ff = help("firefox");
        assert_eq!(
            ff.standard.as_deref(),
            Some("This option creates bare-bone Mozilla Firefox-based app.")
        );
        assert!(help("chrome")
            .standard
            .unwrap()
            .ends_with("with WebExtension support."));
    }

    #[test]
    fn test_single_text_engines() {
        assert!(help("opera").standard.is_none());
        assert!(help("opera").tabbed.is_some());
        assert!(help("webkit").tabbed.is_none());
        assert!(help("electron")
            .standard
            .unwrap()
            .starts_with("This option creates WebCatalog Engine (Electron)-based app"));
    }
}
