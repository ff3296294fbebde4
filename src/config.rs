// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Explicit configuration threaded through patch operations.
//!
//! Nothing here is global. A caller decides per call how much checking it
//! wants and where diagnostics go.

use std::str::FromStr;

use log::Level;
use log::Log;
use log::Metadata;
use log::Record;
use serde::Deserialize;
use serde::Serialize;

/// Log target used for every record this crate emits.
pub const TARGET: &str = "converge";

/// How much invariant checking to do on each call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verify {
    /// Trust inputs. Structural checks only run when asked for explicitly.
    #[default]
    Off,
    /// Re-verify hashes and invariants on every mutating call.
    Strict,
}

impl Verify {
    pub fn is_strict(self) -> bool {
        return self == Verify::Strict;
    }
}

impl FromStr for Verify {
    type Err = String;

    fn from_str(s: &str) -> Result<Verify, String> {
        return match s.trim().to_ascii_lowercase().as_str() {
            "off" => Ok(Verify::Off),
            "strict" => Ok(Verify::Strict),
            other => Err(format!("unknown verification level {:?}", other)),
        };
    }
}

/// Per-call configuration: verification level plus the logging collaborator.
#[derive(Clone, Copy)]
pub struct Config<'a> {
    pub verify: Verify,
    pub logger: &'a dyn Log,
}

impl Config<'static> {
    /// Strict verification, logging to the process-wide logger.
    pub fn strict() -> Config<'static> {
        return Config {
            verify: Verify::Strict,
            logger: log::logger(),
        };
    }
}

impl Default for Config<'static> {
    fn default() -> Self {
        return Config {
            verify: Verify::Off,
            logger: log::logger(),
        };
    }
}

impl<'a> Config<'a> {
    /// Same verification level, different logger.
    pub fn with_logger<'b>(self, logger: &'b dyn Log) -> Config<'b> {
        return Config {
            verify: self.verify,
            logger,
        };
    }

    pub(crate) fn warn(&self, args: std::fmt::Arguments<'_>) {
        self.emit(Level::Warn, args);
    }

    pub(crate) fn debug(&self, args: std::fmt::Arguments<'_>) {
        self.emit(Level::Debug, args);
    }

    fn emit(&self, level: Level, args: std::fmt::Arguments<'_>) {
        let metadata = Metadata::builder().level(level).target(TARGET).build();
        if !self.logger.enabled(&metadata) {
            return;
        }
        self.logger.log(
            &Record::builder()
                .metadata(metadata)
                .module_path_static(Some(module_path!()))
                .args(args)
                .build(),
        );
    }
}

impl std::fmt::Debug for Config<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Config {{ verify: {:?} }}", self.verify);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_parses_case_insensitively() {
        assert_eq!("strict".parse::<Verify>(), Ok(Verify::Strict));
        assert_eq!(" OFF ".parse::<Verify>(), Ok(Verify::Off));
        assert!("loud".parse::<Verify>().is_err());
    }

    #[test]
    fn verify_deserializes_lowercase() {
        let v: Verify = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(v, Verify::Strict);
        assert_eq!(serde_json::to_string(&Verify::Off).unwrap(), "\"off\"");
    }

    #[test]
    fn with_logger_keeps_verification() {
        let cfg = Config::strict().with_logger(log::logger());
        assert!(cfg.verify.is_strict());
    }

    #[test]
    fn default_is_off() {
        assert!(!Config::default().verify.is_strict());
        assert!(Config::strict().verify.is_strict());
    }
}
