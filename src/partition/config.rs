//! External PhyloNet evaluator configuration.

use std::path::PathBuf;

use crate::error::{Result, SearchError};

/// How PhyloNet jobs are launched.
///
/// # Examples
///
/// ```
/// use u_labelsearch::partition::PhyloNetConfig;
///
/// let config = PhyloNetConfig::new("/opt/phylonet/PhyloNet.jar")
///     .with_max_procs(4)
///     .with_working_directory("/tmp/run1");
/// assert_eq!(config.command, "Infer_ST_MDC");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhyloNetConfig {
    /// Java launcher.
    pub java: PathBuf,
    /// PhyloNet jar file.
    pub jar_path: PathBuf,
    /// Options passed to the JVM before `-jar`.
    pub java_options: Vec<String>,
    /// PhyloNet inference command.
    pub command: String,
    /// Directory receiving job inputs and outputs.
    pub working_directory: PathBuf,
    /// Maximal number of concurrently running jobs.
    pub max_procs: usize,
}

impl PhyloNetConfig {
    /// Default settings for the given jar.
    pub fn new(jar_path: impl Into<PathBuf>) -> Self {
        Self {
            java: PathBuf::from("java"),
            jar_path: jar_path.into(),
            java_options: vec!["-Xmx1200m".to_string()],
            command: "Infer_ST_MDC".to_string(),
            working_directory: PathBuf::from("."),
            max_procs: 1,
        }
    }

    /// Sets the Java launcher.
    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    /// Replaces the JVM options.
    pub fn with_java_options(mut self, options: Vec<String>) -> Self {
        self.java_options = options;
        self
    }

    /// Sets the inference command.
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Sets the scratch directory.
    pub fn with_working_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = dir.into();
        self
    }

    /// Sets the job concurrency.
    pub fn with_max_procs(mut self, n: usize) -> Self {
        self.max_procs = n;
        self
    }

    /// Validates parameter ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_procs == 0 {
            return Err(SearchError::InvalidConfig("max_procs must be positive".into()));
        }
        if self.command.is_empty() {
            return Err(SearchError::InvalidConfig("command must not be empty".into()));
        }
        if self.jar_path.as_os_str().is_empty() {
            return Err(SearchError::InvalidConfig("jar_path must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phylonet_config_defaults() {
        let config = PhyloNetConfig::new("PhyloNet.jar");
        assert_eq!(config.java, PathBuf::from("java"));
        assert_eq!(config.java_options, vec!["-Xmx1200m".to_string()]);
        assert_eq!(config.max_procs, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_phylonet_config_validation() {
        assert!(PhyloNetConfig::new("x.jar").with_max_procs(0).validate().is_err());
        assert!(PhyloNetConfig::new("x.jar").with_command("").validate().is_err());
        assert!(PhyloNetConfig::new("").validate().is_err());
    }
}
