//! Launch request and separation of codezure flags from Codex passthrough.
use tracing::warn;

/// Prefix reserved for flags consumed by codezure.
pub const OWN_FLAG_PREFIX: &str = "--codezure-";
/// First argument that switches to the management commands.
pub const MANAGE_COMMAND: &str = "manage";
/// Own flags that take the following argument as their value.
const VALUE_FLAGS: [&str; 1] = ["--codezure-profile"];
const META_FLAGS: [&str; 4] = ["--help", "-h", "--version", "-V"];

/// What to launch, after codezure's own flags have been removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchRequest {
    pub profile_override: Option<String>,
    pub passthrough: Vec<String>,
}

/// Result of [`split_passthrough_args`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitArgs {
    /// Recognized `--codezure-*` flags (with values), in order.
    pub own: Vec<String>,
    /// Everything destined for Codex, in order.
    pub passthrough: Vec<String>,
}

/// Separate `--codezure-*` flags from the rest.
///
/// Value flags consume the next argument unless written as `--flag=value`.
/// Unrecognized `--codezure-*` flags are dropped.
pub fn split_passthrough_args(args: &[String]) -> SplitArgs {
    let mut split = SplitArgs::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if !arg.starts_with(OWN_FLAG_PREFIX) {
            split.passthrough.push(arg.clone());
            continue;
        }

        let flag = arg.split_once('=').map_or(arg.as_str(), |(flag, _)| flag);
        if !VALUE_FLAGS.contains(&flag) {
            warn!(target: "codezure::cli", flag = %arg, "Ignoring unknown codezure flag");
            continue;
        }
        split.own.push(arg.clone());
        if !arg.contains('=') {
            if let Some(value) = iter.next() {
                split.own.push(value.clone());
            }
        }
    }
    split
}

/// True when the only argument is a help or version flag.
pub fn is_sole_meta_flag(passthrough: &[String]) -> bool {
    matches!(passthrough, [only] if META_FLAGS.contains(&only.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn profile_flag_and_value_are_removed() {
        let split = split_passthrough_args(&args(&["--codezure-profile", "x", "exec", "-c", "a=1"]));
        assert_eq!(split.own, args(&["--codezure-profile", "x"]));
        assert_eq!(split.passthrough, args(&["exec", "-c", "a=1"]));
    }

    #[test]
    fn equals_form_is_a_single_argument() {
        let split = split_passthrough_args(&args(&["resume", "--codezure-profile=x", "--last"]));
        assert_eq!(split.own, args(&["--codezure-profile=x"]));
        assert_eq!(split.passthrough, args(&["resume", "--last"]));
    }

    #[test]
    fn unknown_own_flags_are_dropped_without_eating_values() {
        let split = split_passthrough_args(&args(&["--codezure-debug", "exec", "--codezure-x=1"]));
        assert!(split.own.is_empty());
        assert_eq!(split.passthrough, args(&["exec"]));
    }

    #[test]
    fn trailing_value_flag_without_value_is_kept_for_clap() {
        let split = split_passthrough_args(&args(&["--codezure-profile"]));
        assert_eq!(split.own, args(&["--codezure-profile"]));
        assert!(split.passthrough.is_empty());
    }

    #[test]
    fn meta_flag_must_stand_alone() {
        assert!(is_sole_meta_flag(&args(&["--help"])));
        assert!(is_sole_meta_flag(&args(&["-V"])));
        assert!(!is_sole_meta_flag(&args(&["exec", "--help"])));
        assert!(!is_sole_meta_flag(&[]));
    }
}
