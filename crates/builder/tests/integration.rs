//! Integration tests for the build orchestrator

#[cfg(test)]
mod tests {
    use sandbuild_builder::*;
    use sandbuild_config::{Config, ToolMode};
    use sandbuild_descriptor::*;
    use sandbuild_errors::{BuildError, Error};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    fn config_in(root: &Path) -> Config {
        let mut config = Config::default();
        config.paths.workspace_root = Some(root.to_path_buf());
        config
    }

    fn project(orch: &BuildOrchestrator) -> Arc<dyn DescriptorBuilder> {
        let mut project = ProjectDescriptor::new(orch.workspace().root(), "App.csproj").unwrap();
        project.set_target_framework("net8.0");
        Arc::new(project)
    }

    #[tokio::test]
    async fn test_build_without_builders_fails_before_io() {
        let temp = tempfile::tempdir().unwrap();
        let orch = BuildOrchestrator::new(&config_in(temp.path()));

        let err = orch.build(&[], &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::NoBuilders)));
        assert!(err.is_precondition());
        assert!(!orch.workspace().path().exists());
    }

    #[tokio::test]
    async fn test_build_without_project_fails_before_io() {
        let temp = tempfile::tempdir().unwrap();
        let mut orch = BuildOrchestrator::new(&config_in(temp.path()));
        let pin = SdkPinDescriptor::new(orch.workspace().root(), "8.0.100").unwrap();
        let source = SourceFile::new(orch.workspace().root(), "Program.cs", "").unwrap();
        orch.register(Arc::new(pin)).unwrap();
        orch.register(Arc::new(source)).unwrap();

        let err = orch.build(&[], &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::NoProjectDescriptor)));
        assert!(!orch.workspace().path().exists());
    }

    #[test]
    fn test_same_instance_cannot_register_twice() {
        let temp = tempfile::tempdir().unwrap();
        let mut orch = BuildOrchestrator::new(&config_in(temp.path()));
        let first = project(&orch);

        orch.register(Arc::clone(&first)).unwrap();
        let err = orch.register(Arc::clone(&first)).unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::DuplicateBuilder { .. })));
        assert!(err.is_precondition());

        // an equal but distinct instance is fine
        orch.register(project(&orch)).unwrap();
        assert_eq!(orch.builders().len(), 2);
    }

    #[test]
    fn test_environment_overrides() {
        let temp = tempfile::tempdir().unwrap();
        let mut orch = BuildOrchestrator::new(&config_in(temp.path()));
        assert_eq!(orch.environment().get("DOTNET_NOLOGO"), Some(&Some("1".into())));
        assert_eq!(orch.environment().get("CI"), Some(&None));

        orch.add_environment_variable("DOTNET_NOLOGO", Some("0".into()))
            .add_environment_variable("Configuration", Some("Release".into()));
        assert_eq!(orch.environment().get("DOTNET_NOLOGO"), Some(&Some("0".into())));
        assert_eq!(
            orch.environment().get("Configuration"),
            Some(&Some("Release".into()))
        );
    }

    #[cfg(unix)]
    mod fake_toolchain {
        use super::*;
        use sandbuild_events::{channel, AppEvent, BuildEvent};
        use sandbuild_pack::LocalPackageBuilder;
        use std::os::unix::fs::PermissionsExt;

        const REPORT: &str = r#"{"version":"2.1.0","runs":[{"results":[{"ruleId":"CS0168","level":"warning","message":{"text":"The variable x is declared but never used"}}]}]}"#;

        /// A stand-in toolchain. Each call logs its arguments, working
        /// directory and selected environment to `log`.
        fn write_toolchain(dir: &Path, log: &Path, build_body: &str) -> PathBuf {
            let script = format!(
                "#!/bin/sh\n\
                 {{\n\
                 echo \"args=$*\"\n\
                 echo \"pwd=$(pwd)\"\n\
                 echo \"CI=[${{CI-unset}}] NOLOGO=[$DOTNET_NOLOGO] SOURCES=[$RestoreAdditionalProjectSources]\"\n\
                 echo \"ErrorLog=[$ErrorLog]\"\n\
                 }} >> '{log}'\n\
                 case \"$1\" in\n\
                 restore)\n\
                 echo '  Determining projects to restore...'\n\
                 echo \"$(pwd)/App.csproj : error NU1101: Unable to find package Missing.Package.\" >&2\n\
                 echo \"$(pwd)/App.csproj : error NU1101: Unable to find package Missing.Package.\"\n\
                 exit 1 ;;\n\
                 build)\n\
                 {build_body}\n\
                 ;;\n\
                 esac\n",
                log = log.display()
            );
            let path = dir.join("dotnet");
            std::fs::write(&path, script).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn write_report_body() -> String {
            format!("echo '{REPORT}' > \"${{ErrorLog%%,*}}\"\necho 'Build FAILED.'")
        }

        fn log_of(path: &Path) -> String {
            std::fs::read_to_string(path).unwrap()
        }

        #[tokio::test]
        async fn test_full_pipeline() {
            let temp = tempfile::tempdir().unwrap();
            let log = temp.path().join("calls.log");
            let mut config = config_in(temp.path());
            config.toolchain.program = write_toolchain(temp.path(), &log, &write_report_body())
                .display()
                .to_string();

            let (tx, mut rx) = channel();
            let mut orch = BuildOrchestrator::new(&config).with_events(tx);
            let root = orch.workspace().root().clone();
            let mut project = ProjectDescriptor::new(&root, "App.csproj").unwrap();
            project.set_target_framework("net8.0").set_output_type(OutputType::Exe);
            project.add_package_reference("Missing.Package", "1.0.0");
            orch.register(Arc::new(project)).unwrap();
            orch.register(Arc::new(SdkPinDescriptor::new(&root, "8.0.100").unwrap()))
                .unwrap();
            orch.register(Arc::new(
                SourceFile::new(&root, "src/Program.cs", "class P { static void Main() {} }")
                    .unwrap(),
            ))
            .unwrap();

            let report = orch
                .build(&["-c".to_string(), "Release".to_string()], &CancellationToken::new())
                .await
                .unwrap();

            // descriptors landed in the workspace
            let ws = orch.workspace().path().to_path_buf();
            assert!(ws.join("App.csproj").exists());
            assert!(ws.join("global.json").exists());
            assert!(ws.join("src/Program.cs").exists());

            // restore ran before build, both in the workspace
            let log = log_of(&log);
            let args: Vec<_> = log.lines().filter(|l| l.starts_with("args=")).collect();
            assert_eq!(args, ["args=restore -v quiet", "args=build -c Release"]);
            assert!(log.contains(&format!("pwd={}", ws.display())));
            assert!(log.contains("CI=[] NOLOGO=[1] SOURCES=[]"));
            assert!(log.contains(&format!(
                "ErrorLog=[{},version=2.1]",
                ws.join("BuildOutput.sarif").display()
            )));

            // structured warning plus one recovered restore error
            assert_eq!(report.runs().len(), 2);
            assert_eq!(report.warnings().count(), 1);
            let errors: Vec<_> = report.errors().collect();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].rule_id, "NU1101");
            assert_eq!(
                errors[0].message.text,
                "Unable to find package Missing.Package."
            );

            let captured = orch.captured_output();
            assert!(captured.iter().any(|l| l == "Build FAILED."));
            assert!(captured.iter().any(|l| l.contains("Determining projects")));

            let mut phases = 0;
            let mut reported = None;
            while let Ok(event) = rx.try_recv() {
                match event {
                    AppEvent::Build(BuildEvent::PhaseCompleted { .. }) => phases += 1,
                    AppEvent::Build(BuildEvent::DiagnosticsReported {
                        errors, warnings, ..
                    }) => reported = Some((errors, warnings)),
                    _ => {}
                }
            }
            assert_eq!(phases, 2);
            assert_eq!(reported, Some((1, 1)));

            orch.dispose().await;
            assert!(!ws.exists());
        }

        #[tokio::test]
        async fn test_missing_report_is_fatal() {
            let temp = tempfile::tempdir().unwrap();
            let log = temp.path().join("calls.log");
            let mut config = config_in(temp.path());
            config.toolchain.program = write_toolchain(temp.path(), &log, "echo 'no report'")
                .display()
                .to_string();

            let mut orch = BuildOrchestrator::new(&config);
            orch.register(project(&orch)).unwrap();
            let err = orch.build(&[], &CancellationToken::new()).await.unwrap_err();
            assert!(matches!(err, Error::Build(BuildError::ReportMissing { .. })));
            // output was still captured
            assert!(orch.captured_output().iter().any(|l| l == "no report"));
            orch.dispose().await;
        }

        #[tokio::test]
        async fn test_caller_set_report_property_wins() {
            let temp = tempfile::tempdir().unwrap();
            let log = temp.path().join("calls.log");
            let custom = temp.path().join("custom.sarif");
            let mut config = config_in(temp.path());
            config.toolchain.program = write_toolchain(temp.path(), &log, &write_report_body())
                .display()
                .to_string();

            let mut orch = BuildOrchestrator::new(&config);
            orch.register(project(&orch)).unwrap();
            orch.add_environment_variable(
                "ErrorLog",
                Some(format!("{},version=2.1", custom.display())),
            );

            // the toolchain writes where it was told; the orchestrator reads
            // its own report path and finds nothing there
            let err = orch.build(&[], &CancellationToken::new()).await.unwrap_err();
            assert!(matches!(err, Error::Build(BuildError::ReportMissing { .. })));
            assert!(custom.exists());
            orch.dispose().await;
        }

        #[tokio::test]
        async fn test_missing_toolchain() {
            let temp = tempfile::tempdir().unwrap();
            let mut config = config_in(temp.path());
            config.toolchain.program = temp.path().join("nope").display().to_string();

            let mut orch = BuildOrchestrator::new(&config);
            orch.register(project(&orch)).unwrap();
            let err = orch.build(&[], &CancellationToken::new()).await.unwrap_err();
            assert!(matches!(err, Error::Build(BuildError::ToolchainSpawn { .. })));
            orch.dispose().await;
        }

        #[tokio::test]
        async fn test_duplicate_descriptor_paths_fail_materialization() {
            let temp = tempfile::tempdir().unwrap();
            let log = temp.path().join("calls.log");
            let mut config = config_in(temp.path());
            config.toolchain.program = write_toolchain(temp.path(), &log, &write_report_body())
                .display()
                .to_string();

            let mut orch = BuildOrchestrator::new(&config);
            orch.register(project(&orch)).unwrap();
            orch.register(project(&orch)).unwrap();
            let err = orch.build(&[], &CancellationToken::new()).await.unwrap_err();
            assert!(err.is_precondition(), "{err:?}");
            // the toolchain never ran
            assert!(!log.exists());
            orch.dispose().await;
        }

        #[tokio::test]
        async fn test_local_packages_feed_restore() {
            let temp = tempfile::tempdir().unwrap();
            let log = temp.path().join("calls.log");
            let pack_log = temp.path().join("pack.log");
            let lib_dir = temp.path().join("Lib");
            std::fs::create_dir_all(&lib_dir).unwrap();
            std::fs::write(lib_dir.join("Lib.csproj"), "<Project />").unwrap();

            let pack_tool = temp.path().join("nuget");
            std::fs::write(
                &pack_tool,
                format!(
                    "#!/bin/sh\necho \"$@\" >> '{}'\ntouch \"$7/Lib.$5.nupkg\"\n",
                    pack_log.display()
                ),
            )
            .unwrap();
            std::fs::set_permissions(&pack_tool, std::fs::Permissions::from_mode(0o755))
                .unwrap();

            let mut config = config_in(temp.path());
            config.toolchain.program = write_toolchain(temp.path(), &log, &write_report_body())
                .display()
                .to_string();
            config.pack.tool = ToolMode::Command;
            config.pack.command = pack_tool.display().to_string();

            let packager = LocalPackageBuilder::new(&config);
            let mut orch = BuildOrchestrator::new(&config).with_local_packages(packager);
            let mut project =
                ProjectDescriptor::new(orch.workspace().root(), "App.csproj").unwrap();
            project.add_project_reference(lib_dir.join("Lib.csproj").display().to_string());
            orch.register(Arc::new(project)).unwrap();

            orch.build(&[], &CancellationToken::new()).await.unwrap();

            let packager = orch.packager().unwrap();
            assert!(packager.is_initialized());
            let out = packager.output_dir().to_path_buf();
            assert!(out.join("Lib.999.999.999.nupkg").exists());
            // only the project exists; its sibling spec was skipped
            assert_eq!(log_of(&pack_log).lines().count(), 1);
            assert!(log_of(&log).contains(&format!("SOURCES=[{}]", out.display())));

            orch.dispose().await;
            assert!(!out.exists());
        }

        #[tokio::test]
        async fn test_packager_idle_without_references() {
            let temp = tempfile::tempdir().unwrap();
            let log = temp.path().join("calls.log");
            let mut config = config_in(temp.path());
            config.toolchain.program = write_toolchain(temp.path(), &log, &write_report_body())
                .display()
                .to_string();
            config.pack.tool = ToolMode::Command;
            config.pack.command = temp.path().join("missing-nuget").display().to_string();

            let packager = LocalPackageBuilder::new(&config);
            let mut orch = BuildOrchestrator::new(&config).with_local_packages(packager);
            orch.register(project(&orch)).unwrap();

            orch.build(&[], &CancellationToken::new()).await.unwrap();
            assert!(!orch.packager().unwrap().is_initialized());
            orch.dispose().await;
        }
    }

    /// Requires a .NET SDK on PATH: `cargo test -- --ignored`
    mod real_toolchain {
        use super::*;

        async fn sdk_version() -> String {
            let out = tokio::process::Command::new("dotnet")
                .arg("--version")
                .output()
                .await
                .unwrap();
            String::from_utf8(out.stdout).unwrap().trim().to_string()
        }

        async fn build_program(source: &str) -> DiagnosticReport {
            let version = sdk_version().await;
            let major = version.split('.').next().unwrap().to_string();

            let mut orch = BuildOrchestrator::new(&Config::default());
            let root = orch.workspace().root().clone();
            let mut project = ProjectDescriptor::new(&root, "App.csproj").unwrap();
            project
                .set_target_framework(format!("net{major}.0"))
                .set_output_type(OutputType::Exe)
                .set_nullable(Nullable::Enable);
            orch.register(Arc::new(project)).unwrap();
            orch.register(Arc::new(
                SdkPinDescriptor::new(&root, version)
                    .unwrap()
                    .with_roll_forward(RollForward::LatestMajor),
            ))
            .unwrap();
            orch.register(Arc::new(SourceFile::new(&root, "Program.cs", source).unwrap()))
                .unwrap();

            let report = orch.build(&[], &CancellationToken::new()).await.unwrap();
            orch.dispose().await;
            report
        }

        #[tokio::test]
        #[ignore = "requires a .NET SDK"]
        async fn test_valid_program_has_no_diagnostics() {
            let report = build_program(
                "System.Console.WriteLine(\"hello\");\n",
            )
            .await;
            assert_eq!(report.errors().count(), 0, "{report}");
            assert_eq!(report.warnings().count(), 0, "{report}");
        }

        #[tokio::test]
        #[ignore = "requires a .NET SDK"]
        async fn test_invalid_program_reports_compiler_error() {
            let report = build_program("System.Console.WriteLine(undefinedName)\n").await;
            assert!(
                report.errors().any(|r| r.rule_id.starts_with("CS")),
                "{report}"
            );
        }
    }
}
