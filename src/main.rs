//! Native viewer entry point.
//!
//! Usage: `clockview [--name=value ...] [MODEL_PATH]`

use std::process::ExitCode;

use clockview::{DisplayResult, ViewerConfig};

fn parse_args(args: impl IntoIterator<Item = String>) -> DisplayResult<ViewerConfig> {
    let mut config = ViewerConfig::new();
    for arg in args {
        match arg.strip_prefix("--") {
            Some(option) => {
                // A bare `--flag` switches a boolean option on.
                let (name, value) = option.split_once('=').unwrap_or((option, "true"));
                config.set_option(name, value)?;
            }
            None => config.model.path = arg,
        }
    }
    Ok(config)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match parse_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match clockview::run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("clockview: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_positional_model_path() {
        let config = parse_args(args(&["--damping=false", "models/wall.glb"])).unwrap();
        assert_eq!(config.model.path, "models/wall.glb");
        assert!(!config.controls.damping);
    }

    #[test]
    fn test_bare_flag_is_true() {
        let config = parse_args(args(&["--wireframe-toggle=false", "--wireframe-toggle"])).unwrap();
        assert!(config.panel.wireframe_toggle);
    }

    #[test]
    fn test_unknown_option_fails() {
        assert!(parse_args(args(&["--nope=1"])).is_err());
    }
}
