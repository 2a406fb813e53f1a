//! Separates configuration flags from command tokens.
//!
//! `ortho_config` rejects arguments it does not recognise, so each binary
//! hands it only the leading configuration flags and parses the remaining
//! tokens with its own command grammar.

use std::ffi::{OsStr, OsString};

/// Flags accepted by the configuration loader.
///
/// Configuration flags must precede the command. A flag appearing after the
/// first command token is treated as part of the command.
pub const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--host",
    "--port",
    "--runtime-dir",
    "--output-dir",
    "--font-family",
    "--log-filter",
    "--log-format",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }

    let (flag, has_inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (text.as_ref(), false),
    };

    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Result of splitting a command line into loader and command arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigArgumentSplit {
    /// Program name followed by the leading configuration flags.
    pub config_arguments: Vec<OsString>,
    /// Index of the first command token in the original arguments.
    pub command_start: usize,
}

impl ConfigArgumentSplit {
    /// Configuration flags without the program name, ready to forward to a
    /// spawned process.
    pub fn forwarded_flags(&self) -> &[OsString] {
        self.config_arguments.get(1..).unwrap_or_default()
    }
}

/// Splits `args` (program name first) at the first non-configuration token.
pub fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let mut iter = args.iter();
    let Some(program) = iter.next() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut config_arguments = vec![program.clone()];
    let mut pending_value = false;

    for argument in iter {
        if pending_value {
            config_arguments.push(argument.clone());
            pending_value = false;
            continue;
        }

        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                pending_value = needs_value;
            }
            FlagAction::Stop => break,
        }
    }

    let command_start = config_arguments.len();
    ConfigArgumentSplit {
        config_arguments,
        command_start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn os_args(values: &[&str]) -> Vec<OsString> {
        values.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case("--log-filter=debug", FlagAction::Include { needs_value: false })]
    #[case("--port", FlagAction::Include { needs_value: true })]
    #[case("render", FlagAction::Stop)]
    #[case("--unknown", FlagAction::Stop)]
    fn classifies_arguments(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(classify(OsStr::new(argument)), expected);
    }

    #[test]
    fn splits_leading_configuration_flags() {
        let args = os_args(&[
            "texpng",
            "--port",
            "4000",
            "--log-format=compact",
            "render",
            "input.tex",
        ]);
        let split = split_config_arguments(&args);
        assert_eq!(
            split.config_arguments,
            os_args(&["texpng", "--port", "4000", "--log-format=compact"])
        );
        assert_eq!(split.command_start, 4);
        assert_eq!(
            split.forwarded_flags(),
            os_args(&["--port", "4000", "--log-format=compact"]).as_slice()
        );
    }

    #[test]
    fn flags_after_the_command_stay_with_the_command() {
        let args = os_args(&["texpng", "render", "--port", "4000"]);
        let split = split_config_arguments(&args);
        assert_eq!(split.config_arguments, os_args(&["texpng"]));
        assert_eq!(split.command_start, 1);
        assert!(split.forwarded_flags().is_empty());
    }

    #[test]
    fn empty_arguments_produce_empty_split() {
        let split = split_config_arguments(&[]);
        assert!(split.config_arguments.is_empty());
        assert_eq!(split.command_start, 0);
    }
}
