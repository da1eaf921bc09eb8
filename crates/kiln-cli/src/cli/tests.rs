#[cfg(test)]
mod tests {
    use crate::cli::{Cli, Command, ModeArg};
    use clap::{Parser, ValueEnum};
    use kiln_config::BuildMode;
    use std::path::PathBuf;

    #[test]
    fn test_mode_enum_values() {
        let modes: Vec<_> = ModeArg::value_variants()
            .iter()
            .map(|v| v.to_possible_value().unwrap().get_name().to_string())
            .collect();
        assert_eq!(modes, vec!["development", "production"]);
    }

    #[test]
    fn test_mode_arg_conversion() {
        assert_eq!(BuildMode::from(ModeArg::Development), BuildMode::Development);
        assert_eq!(BuildMode::from(ModeArg::Production), BuildMode::Production);
    }

    #[test]
    fn test_build_defaults() {
        let cli = Cli::try_parse_from(["kiln", "build"]).unwrap();
        match cli.command {
            Command::Build(args) => {
                assert!(args.mode.is_none());
                assert!(args.project.root.is_none());
                assert!(args.project.config.is_none());
                assert_eq!(args.optimize_override(), None);
            }
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn test_build_mode_alias() {
        let cli = Cli::try_parse_from(["kiln", "build", "--mode", "dev"]).unwrap();
        match cli.command {
            Command::Build(args) => assert_eq!(args.mode, Some(ModeArg::Development)),
            other => panic!("expected build, got {other:?}"),
        }
    }

    #[test]
    fn test_build_optimize_flags() {
        let cli = Cli::try_parse_from(["kiln", "build", "--optimize"]).unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.optimize_override(), Some(true));

        let cli = Cli::try_parse_from(["kiln", "build", "--no-optimize"]).unwrap();
        let Command::Build(args) = cli.command else {
            panic!("expected build");
        };
        assert_eq!(args.optimize_override(), Some(false));
    }

    #[test]
    fn test_optimize_flags_conflict() {
        let result = Cli::try_parse_from(["kiln", "build", "--optimize", "--no-optimize"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        let result = Cli::try_parse_from(["kiln", "-v", "-q", "build"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["kiln", "build", "--no-color", "-v"]).unwrap();
        assert!(cli.no_color);
        assert!(cli.verbose);
    }

    #[test]
    fn test_dev_args() {
        let cli = Cli::try_parse_from([
            "kiln",
            "dev",
            "--root",
            "site",
            "--port",
            "3000",
            "--no-overlay",
            "--write-to-disk",
        ])
        .unwrap();
        let Command::Dev(args) = cli.command else {
            panic!("expected dev");
        };
        assert_eq!(args.project.root, Some(PathBuf::from("site")));
        assert_eq!(args.port, Some(3000));
        assert!(args.no_overlay);
        assert!(args.write_to_disk);
        assert!(!args.no_watch);
    }

    #[test]
    fn test_check_schema_flag() {
        let cli = Cli::try_parse_from(["kiln", "check", "--schema"]).unwrap();
        let Command::Check(args) = cli.command else {
            panic!("expected check");
        };
        assert!(args.schema);
        assert!(args.mode.is_none());
    }

    #[test]
    fn test_init_default_dir() {
        let cli = Cli::try_parse_from(["kiln", "init"]).unwrap();
        let Command::Init(args) = cli.command else {
            panic!("expected init");
        };
        assert_eq!(args.dir, PathBuf::from("."));
        assert!(!args.force);
    }

    #[test]
    fn test_invalid_mode_rejected() {
        assert!(Cli::try_parse_from(["kiln", "build", "--mode", "staging"]).is_err());
    }
}
