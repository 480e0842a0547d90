//! Integration tests for the sandbuild CLI

use std::path::Path;
use std::process::{Command, Output};

fn sandbuild(args: &[&str], config: Option<&Path>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sandbuild"));
    cmd.args(args).env_remove("SANDBUILD_TOOLCHAIN");
    if let Some(config) = config {
        cmd.arg("--config").arg(config);
    }
    cmd.output().expect("Failed to execute sandbuild")
}

#[test]
fn test_cli_version() {
    let output = sandbuild(&["--version"], None);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("sandbuild"));
}

#[test]
fn test_cli_help() {
    let output = sandbuild(&["--help"], None);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Build throwaway .NET projects"));
    assert!(stdout.contains("check"));
}

#[test]
fn test_check_requires_files() {
    let output = sandbuild(&["check"], None);
    assert!(!output.status.success());
}

#[test]
fn test_missing_source_file() {
    let temp = tempfile::tempdir().unwrap();
    let missing = temp.path().join("Nope.cs");
    let output = sandbuild(&["check", missing.to_str().unwrap()], None);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Nope.cs"));
}

#[cfg(unix)]
mod fake_toolchain {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    /// Writes a config whose toolchain answers every build with `report`
    fn setup(dir: &Path, report: &str) -> std::path::PathBuf {
        let program = dir.join("dotnet");
        std::fs::write(
            &program,
            format!(
                "#!/bin/sh\n\
                 [ -f global.json ] && cp global.json '{pin}'\n\
                 [ \"$1\" = build ] && echo '{report}' > \"${{ErrorLog%%,*}}\"\n\
                 exit 0\n",
                pin = dir.join("pin.json").display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();

        let workspaces = dir.join("workspaces");
        std::fs::create_dir_all(&workspaces).unwrap();
        let config = dir.join("config.toml");
        std::fs::write(
            &config,
            format!(
                "[toolchain]\nprogram = \"{}\"\n\n[paths]\nworkspace_root = \"{}\"\n",
                program.display(),
                workspaces.display()
            ),
        )
        .unwrap();
        std::fs::write(dir.join("Program.cs"), "class P { static void Main() {} }").unwrap();
        config
    }

    #[test]
    fn test_clean_build_exits_zero() {
        let temp = tempfile::tempdir().unwrap();
        let config = setup(temp.path(), r#"{"runs":[{"results":[]}]}"#);
        let source = temp.path().join("Program.cs");

        let output = sandbuild(&["check", source.to_str().unwrap()], Some(&config));
        assert!(output.status.success(), "{output:?}");
        assert!(String::from_utf8_lossy(&output.stdout).contains("No diagnostics."));
        // the workspace was torn down
        let left: Vec<_> = std::fs::read_dir(temp.path().join("workspaces"))
            .unwrap()
            .collect();
        assert!(left.is_empty());
    }

    #[test]
    fn test_errors_exit_one_with_json() {
        let temp = tempfile::tempdir().unwrap();
        let config = setup(
            temp.path(),
            r#"{"runs":[{"results":[{"ruleId":"CS1002","level":"error","message":{"text":"; expected"}}]}]}"#,
        );
        let source = temp.path().join("Program.cs");

        let output = sandbuild(&["check", source.to_str().unwrap(), "--json"], Some(&config));
        assert_eq!(output.status.code(), Some(1));
        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(json["runs"][0]["results"][0]["ruleId"], "CS1002");
        assert_eq!(json["runs"][0]["results"][0]["level"], "error");
    }

    #[test]
    fn test_bad_package_spec() {
        let temp = tempfile::tempdir().unwrap();
        let config = setup(temp.path(), r#"{"runs":[]}"#);
        let source = temp.path().join("Program.cs");

        let output = sandbuild(
            &["check", source.to_str().unwrap(), "--package", "NoVersion"],
            Some(&config),
        );
        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("NAME@VERSION"));
    }

    #[test]
    fn test_sdk_pin_omits_unset_prerelease_flag() {
        let temp = tempfile::tempdir().unwrap();
        let config = setup(temp.path(), r#"{"runs":[]}"#);
        let source = temp.path().join("Program.cs");

        let output = sandbuild(
            &["check", source.to_str().unwrap(), "--sdk", "8.0.100"],
            Some(&config),
        );
        assert!(output.status.success(), "{output:?}");
        let pin: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(temp.path().join("pin.json")).unwrap())
                .unwrap();
        assert_eq!(pin["sdk"]["version"], "8.0.100");
        assert!(pin["sdk"].get("allowPrerelease").is_none(), "{pin}");

        let output = sandbuild(
            &[
                "check",
                source.to_str().unwrap(),
                "--sdk",
                "8.0.100",
                "--allow-prerelease",
            ],
            Some(&config),
        );
        assert!(output.status.success(), "{output:?}");
        let pin: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(temp.path().join("pin.json")).unwrap())
                .unwrap();
        assert_eq!(pin["sdk"]["allowPrerelease"], true);
    }

    #[test]
    fn test_relative_local_package_resolves_against_working_dir() {
        let temp = tempfile::tempdir().unwrap();
        let config = setup(temp.path(), r#"{"runs":[]}"#);
        std::fs::create_dir_all(temp.path().join("Lib")).unwrap();
        std::fs::write(temp.path().join("Lib/Lib.csproj"), "<Project />").unwrap();

        let pack_log = temp.path().join("pack.log");
        let pack_tool = temp.path().join("nuget");
        std::fs::write(
            &pack_tool,
            format!(
                "#!/bin/sh\n[ -e \"$2\" ] && echo \"found $2\" >> '{}'\n",
                pack_log.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&pack_tool, std::fs::Permissions::from_mode(0o755)).unwrap();
        let mut toml = std::fs::read_to_string(&config).unwrap();
        toml.push_str(&format!(
            "\n[pack]\ntool = \"command\"\ncommand = \"{}\"\n",
            pack_tool.display()
        ));
        std::fs::write(&config, toml).unwrap();

        let output = Command::new(env!("CARGO_BIN_EXE_sandbuild"))
            .current_dir(temp.path())
            .env_remove("SANDBUILD_TOOLCHAIN")
            .args(["check", "Program.cs", "--local-package", "Lib/Lib.csproj", "--config"])
            .arg(&config)
            .output()
            .expect("Failed to execute sandbuild");
        assert!(output.status.success(), "{output:?}");

        let log = std::fs::read_to_string(&pack_log).unwrap();
        let line = log.lines().next().unwrap();
        assert!(line.starts_with("found /"), "{line}");
        assert!(line.ends_with("Lib/Lib.csproj"), "{line}");
    }
}
