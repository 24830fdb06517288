use crate::config::LoggingConfig;
use regex::Regex;
use std::io;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

/// Built-in PII patterns applied when `use_default_pii` is on.
const DEFAULT_PII: &[(&str, &str)] = &[
    (r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}", "[EMAIL]"),
    (r"(?i)bearer\s+[A-Za-z0-9._~+/-]+=*", "Bearer [TOKEN]"),
];

struct RedactingWriter<W> {
    inner: W,
    patterns: Vec<(Regex, String)>,
}

impl<W: io::Write> io::Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let mut redacted = s.to_string();
        for (re, replacement) in &self.patterns {
            redacted = re.replace_all(&redacted, replacement.as_str()).to_string();
        }
        self.inner.write_all(redacted.as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter {
    patterns: Vec<(Regex, String)>,
}

impl<'a> fmt::MakeWriter<'a> for RedactingMakeWriter {
    type Writer = RedactingWriter<io::Stderr>;

    // stdout carries command results, so logs go to stderr.
    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: io::stderr(),
            patterns: self.patterns.clone(),
        }
    }
}

/// Most verbose level enabled in the config.
fn level_for(config: &LoggingConfig) -> &'static str {
    let levels = &config.levels;
    if levels.debug || config.verbose {
        "debug"
    } else if levels.info {
        "info"
    } else if levels.warning {
        "warn"
    } else if levels.error || levels.critical {
        "error"
    } else {
        "off"
    }
}

fn redaction_patterns(config: &LoggingConfig) -> Vec<(Regex, String)> {
    let redaction = &config.redaction;
    if !redaction.enabled {
        return Vec::new();
    }
    let mut patterns = Vec::new();
    if redaction.use_default_pii {
        for (re, placeholder) in DEFAULT_PII {
            if let Ok(re) = Regex::new(re) {
                patterns.push((re, placeholder.to_string()));
            }
        }
    }
    for p in &redaction.patterns {
        match Regex::new(&p.regex) {
            Ok(re) => patterns.push((re, p.placeholder.clone())),
            Err(e) => eprintln!("warning: redaction pattern '{}' ignored: {}", p.name, e),
        }
    }
    patterns
}

/// Install the global subscriber. `RUST_LOG` wins over the config levels.
/// Calling it twice is harmless.
pub fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_for(config)));

    let show_file = config.format.location.show_file;
    let show_line = config.format.location.show_line;
    let make_writer = RedactingMakeWriter {
        patterns: redaction_patterns(config),
    };

    // Layer::boxed() unifies the branch types
    let fmt_layer = if !config.format.show_time {
        fmt::layer()
            .with_writer(make_writer)
            .with_target(show_file)
            .with_file(show_file)
            .with_line_number(show_line)
            .without_time()
            .boxed()
    } else {
        fmt::layer()
            .with_writer(make_writer)
            .with_target(show_file)
            .with_file(show_file)
            .with_line_number(show_line)
            .boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        LoggingFormatConfig, LoggingLevelsConfig, LoggingLocationConfig, RedactionConfig,
        RedactionPattern,
    };
    use std::io::Write;

    fn logging(redaction: RedactionConfig) -> LoggingConfig {
        LoggingConfig {
            verbose: false,
            format: LoggingFormatConfig {
                show_time: false,
                location: LoggingLocationConfig {
                    show_file: false,
                    show_line: false,
                },
            },
            levels: LoggingLevelsConfig {
                debug: false,
                info: true,
                warning: true,
                error: true,
                critical: true,
            },
            redaction,
        }
    }

    fn redact(config: &LoggingConfig, line: &str) -> String {
        let mut w = RedactingWriter {
            inner: Vec::new(),
            patterns: redaction_patterns(config),
        };
        w.write_all(line.as_bytes()).unwrap();
        String::from_utf8(w.inner).unwrap()
    }

    #[test]
    fn test_default_pii_redaction() {
        let config = logging(RedactionConfig {
            enabled: true,
            use_default_pii: true,
            patterns: vec![],
        });
        let out = redact(&config, "created user ada@example.com with Bearer abc.def");
        assert_eq!(out, "created user [EMAIL] with Bearer [TOKEN]");
    }

    #[test]
    fn test_custom_patterns_and_disabled() {
        let custom = logging(RedactionConfig {
            enabled: true,
            use_default_pii: false,
            patterns: vec![RedactionPattern {
                name: "app id".into(),
                regex: r"persist:[a-z-]+".into(),
                placeholder: "persist:[APP]".into(),
            }],
        });
        assert_eq!(
            redact(&custom, "cleared persist:gmail for a@b.io"),
            "cleared persist:[APP] for a@b.io"
        );

        let off = logging(RedactionConfig {
            enabled: false,
            use_default_pii: true,
            patterns: vec![],
        });
        assert_eq!(redact(&off, "a@b.io"), "a@b.io");
    }

    #[test]
    fn test_level_selection() {
        let mut config = logging(RedactionConfig::default());
        assert_eq!(level_for(&config), "info");
        config.verbose = true;
        assert_eq!(level_for(&config), "debug");
        config.verbose = false;
        config.levels.info = false;
        assert_eq!(level_for(&config), "warn");
    }
}
