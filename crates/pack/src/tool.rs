//! Packaging tool invocation

use sandbuild_errors::{Error, PackError};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// `<tool> pack <source> -ForceEnglishOutput -Version <version> -OutputDirectory <dir>`
pub(crate) fn pack_args(source: &Path, version: &str, output_dir: &Path) -> Vec<String> {
    vec![
        "pack".to_string(),
        source.display().to_string(),
        "-ForceEnglishOutput".to_string(),
        "-Version".to_string(),
        version.to_string(),
        "-OutputDirectory".to_string(),
        output_dir.display().to_string(),
    ]
}

/// Run the tool once for `source` and wait for it
pub(crate) async fn run_pack(
    tool: &Path,
    source: &Path,
    version: &str,
    output_dir: &Path,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    let mut cmd = Command::new(tool);
    cmd.args(pack_args(source, version, output_dir))
        .stdin(Stdio::null())
        .kill_on_drop(true);
    if let Some(dir) = source.parent().filter(|d| !d.as_os_str().is_empty()) {
        cmd.current_dir(dir);
    }

    let output = tokio::select! {
        biased;
        () = cancel.cancelled() => return Err(Error::Cancelled),
        output = cmd.output() => output.map_err(|e| PackError::ToolSpawn {
            tool: tool.display().to_string(),
            message: e.to_string(),
        })?,
    };

    if !output.status.success() {
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(PackError::PackFailed {
            source_path: source.display().to_string(),
            code: output.status.code(),
            output: text.trim().to_string(),
        }
        .into());
    }
    Ok(())
}

/// Mark a downloaded tool as executable
#[cfg(unix)]
pub(crate) async fn make_executable(path: &Path) -> Result<(), Error> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .await
        .map_err(|e| Error::io_with_path(&e, path))
}

#[cfg(not(unix))]
pub(crate) async fn make_executable(_path: &Path) -> Result<(), Error> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_args() {
        let args = pack_args(
            Path::new("/src/Lib/Lib.csproj"),
            "999.999.999",
            Path::new("/tmp/out"),
        );
        assert_eq!(
            args,
            [
                "pack",
                "/src/Lib/Lib.csproj",
                "-ForceEnglishOutput",
                "-Version",
                "999.999.999",
                "-OutputDirectory",
                "/tmp/out"
            ]
        );
    }
}
