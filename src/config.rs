//! Layout configuration shared by one or more nodes.
//!
//! A config carries the behavior toggles the algorithm consults (web
//! defaults, errata, point scale factor, experimental features) plus the
//! logger and clone-node callbacks. Configs live in the tree arena and are
//! referenced by [`ConfigId`](crate::tree::ConfigId).

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use tracing::{debug, error};

use crate::enums::LogLevel;
use crate::node::Node;
use crate::tree::NodeId;

bitflags! {
    /// Deliberate compatibility deviations from W3C behavior. Layouts
    /// created against older engine versions may depend on these.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Errata: u32 {
        const STRETCH_FLEX_BASIS = 1;
        const ABSOLUTE_POSITIONING_INCORRECT = 2;
        const ABSOLUTE_PERCENT_AGAINST_INNER_SIZE = 4;
        /// Legacy behaviors except stretch flex basis.
        const CLASSIC = 0x7FFF_FFFE;
        /// All legacy behaviors.
        const ALL = 0x7FFF_FFFF;
    }
}

bitflags! {
    /// Unsupported features gated off by default.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExperimentalFeatures: u32 {
        /// Recompute flex basis when the computed value is stale by
        /// generation rather than reusing it within one session.
        const WEB_FLEX_BASIS = 1 << 0;
        /// Resolve absolute-child percentage offsets against the padding
        /// edge instead of the border edge.
        const ABSOLUTE_PERCENTAGE_AGAINST_PADDING_EDGE = 1 << 1;
    }
}

/// Log sink callback. Receives the level and the formatted message.
pub type LoggerFn = Rc<dyn Fn(LogLevel, &str)>;

/// Copy-on-write hook: may produce a customized clone of `node` for the
/// given owner and child slot. Returning `None` falls back to a structural
/// clone.
pub type CloneNodeFn = Rc<dyn Fn(&Node, NodeId, usize) -> Option<Node>>;

/// Behavior toggles plus callback slots. May back a single tree or be
/// shared across many nodes.
#[derive(Clone)]
pub struct Config {
    use_web_defaults: bool,
    point_scale_factor: f32,
    errata: Errata,
    experimental_features: ExperimentalFeatures,
    logger: Option<LoggerFn>,
    clone_node: Option<CloneNodeFn>,
}

impl Config {
    pub fn new() -> Config {
        Config {
            use_web_defaults: false,
            point_scale_factor: 1.0,
            errata: Errata::empty(),
            experimental_features: ExperimentalFeatures::empty(),
            logger: None,
            clone_node: None,
        }
    }

    pub fn set_use_web_defaults(&mut self, enabled: bool) {
        self.use_web_defaults = enabled;
    }

    pub fn use_web_defaults(&self) -> bool {
        self.use_web_defaults
    }

    /// Grid density for final rounding. Zero disables rounding.
    pub fn set_point_scale_factor(&mut self, pixels_in_point: f32) {
        self.point_scale_factor = pixels_in_point;
    }

    pub fn point_scale_factor(&self) -> f32 {
        self.point_scale_factor
    }

    pub fn set_errata(&mut self, errata: Errata) {
        self.errata = errata;
    }

    pub fn add_errata(&mut self, errata: Errata) {
        self.errata |= errata;
    }

    pub fn remove_errata(&mut self, errata: Errata) {
        self.errata &= !errata;
    }

    pub fn errata(&self) -> Errata {
        self.errata
    }

    pub fn has_errata(&self, errata: Errata) -> bool {
        self.errata.intersects(errata)
    }

    pub fn set_experimental_feature_enabled(
        &mut self,
        feature: ExperimentalFeatures,
        enabled: bool,
    ) {
        self.experimental_features.set(feature, enabled);
    }

    pub fn is_experimental_feature_enabled(&self, feature: ExperimentalFeatures) -> bool {
        self.experimental_features.contains(feature)
    }

    pub fn enabled_experiments(&self) -> ExperimentalFeatures {
        self.experimental_features
    }

    /// Replace the log sink. Without one, diagnostics go to `tracing`.
    pub fn set_logger(&mut self, logger: Option<LoggerFn>) {
        self.logger = logger;
    }

    pub fn set_clone_node_fn(&mut self, clone_node: Option<CloneNodeFn>) {
        self.clone_node = clone_node;
    }

    pub(crate) fn clone_node_fn(&self) -> Option<CloneNodeFn> {
        self.clone_node.clone()
    }

    /// Route a diagnostic through the configured logger, or `tracing` when
    /// none is set.
    pub fn log(&self, level: LogLevel, message: &str) {
        match &self.logger {
            Some(logger) => logger(level, message),
            None => match level {
                LogLevel::Error | LogLevel::Fatal => error!("{message}"),
                _ => debug!("{message}"),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

impl Default for Errata {
    fn default() -> Errata {
        Errata::empty()
    }
}

impl Default for ExperimentalFeatures {
    fn default() -> ExperimentalFeatures {
        ExperimentalFeatures::empty()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("use_web_defaults", &self.use_web_defaults)
            .field("point_scale_factor", &self.point_scale_factor)
            .field("errata", &self.errata)
            .field("experimental_features", &self.experimental_features)
            .field("has_logger", &self.logger.is_some())
            .field("has_clone_node", &self.clone_node.is_some())
            .finish()
    }
}

/// Whether replacing one config with another invalidates computed layout.
pub(crate) fn config_update_invalidates_layout(a: &Config, b: &Config) -> bool {
    a.errata != b.errata
        || a.experimental_features != b.experimental_features
        || a.point_scale_factor != b.point_scale_factor
        || a.use_web_defaults != b.use_web_defaults
}

/// Fatal precondition check. Programmer errors abort layout; there is no
/// recoverable error channel.
pub(crate) fn assert_fatal(config: &Config, condition: bool, message: &str) {
    if !condition {
        config.log(LogLevel::Fatal, message);
        panic!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn errata_aggregates() {
        let mut config = Config::new();
        config.set_errata(Errata::ALL);
        assert!(config.has_errata(Errata::STRETCH_FLEX_BASIS));
        config.set_errata(Errata::CLASSIC);
        assert!(!config.has_errata(Errata::STRETCH_FLEX_BASIS));
        assert!(config.has_errata(Errata::ABSOLUTE_POSITIONING_INCORRECT));
    }

    #[test]
    fn experimental_feature_toggles() {
        let mut config = Config::new();
        assert!(!config.is_experimental_feature_enabled(ExperimentalFeatures::WEB_FLEX_BASIS));
        config.set_experimental_feature_enabled(ExperimentalFeatures::WEB_FLEX_BASIS, true);
        assert!(config.is_experimental_feature_enabled(ExperimentalFeatures::WEB_FLEX_BASIS));
        config.set_experimental_feature_enabled(ExperimentalFeatures::WEB_FLEX_BASIS, false);
        assert!(!config.is_experimental_feature_enabled(ExperimentalFeatures::WEB_FLEX_BASIS));
    }

    #[test]
    fn update_invalidation() {
        let a = Config::new();
        let mut b = Config::new();
        assert!(!config_update_invalidates_layout(&a, &b));
        b.set_point_scale_factor(2.0);
        assert!(config_update_invalidates_layout(&a, &b));
    }

    #[test]
    fn custom_logger_receives_messages() {
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut config = Config::new();
        config.set_logger(Some(Rc::new(move |_, msg: &str| {
            sink.borrow_mut().push(msg.to_owned());
        })));
        config.log(LogLevel::Debug, "hello");
        assert_eq!(seen.borrow().as_slice(), ["hello".to_owned()]);
    }

    #[test]
    #[should_panic]
    fn failed_assert_panics() {
        assert_fatal(&Config::new(), false, "boom");
    }

    #[test]
    fn default_logger_falls_back_to_tracing() {
        use std::io;
        use std::sync::{Arc, Mutex};

        #[derive(Clone, Default)]
        struct Capture(Arc<Mutex<Vec<u8>>>);

        impl io::Write for Capture {
            fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Capture {
            type Writer = Capture;

            fn make_writer(&'a self) -> Capture {
                self.clone()
            }
        }

        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(capture.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let config = Config::new();
            config.log(LogLevel::Error, "unbalanced axis constraint");
            config.log(LogLevel::Debug, "cache primed");
        });

        let output = String::from_utf8(capture.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("unbalanced axis constraint"));
        assert!(output.contains("cache primed"));
    }
}
