//! Minimal CLI parsing for the inspection binary.

use std::env;

use typeshape::LogFormat;

#[derive(Debug, Default)]
pub struct CliOptions {
    /// Print summaries as JSON instead of text
    pub json: bool,
    /// Only print the type whose name matches
    pub type_filter: Option<String>,
    pub log_format_override: Option<LogFormat>,
}

impl CliOptions {
    pub fn from_args() -> Self {
        Self::parse(env::args().skip(1))
    }

    fn parse(args: impl IntoIterator<Item = String>) -> Self {
        let mut options = CliOptions::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--json" => options.json = true,
                "--type" => {
                    if let Some(value) = args.next() {
                        options.type_filter = Some(value);
                    }
                }
                "--log-format" => {
                    if let Some(value) = args.next() {
                        options.log_format_override = LogFormat::from_arg(&value);
                    }
                }
                _ if arg.starts_with("--type=") => {
                    if let Some((_, value)) = arg.split_once('=') {
                        options.type_filter = Some(value.to_string());
                    }
                }
                _ if arg.starts_with("--log-format=") => {
                    if let Some((_, value)) = arg.split_once('=') {
                        options.log_format_override = LogFormat::from_arg(value);
                    }
                }
                _ => {}
            }
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliOptions {
        CliOptions::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_flags() {
        let options = parse(&["--json", "--type", "Show"]);
        assert!(options.json);
        assert_eq!(options.type_filter.as_deref(), Some("Show"));
    }

    #[test]
    fn test_equals_form() {
        let options = parse(&["--type=Episode", "--log-format=json"]);
        assert_eq!(options.type_filter.as_deref(), Some("Episode"));
        assert_eq!(options.log_format_override, Some(LogFormat::Json));
    }

    #[test]
    fn test_unknown_arguments_are_ignored() {
        let options = parse(&["--verbose"]);
        assert!(!options.json);
        assert!(options.type_filter.is_none());
    }
}
