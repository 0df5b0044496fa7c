//! External tool drivers against fake executables.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use asc_mcp::error::AscError;
use asc_mcp::process::firebase::{FirebaseCli, FirebasePlatform};
use asc_mcp::process::transporter::{TransporterAuth, TransporterCli, UploadPlatform};
use asc_mcp::process::{Locator, ProcessRunner};

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn runner_for(path: &Path) -> ProcessRunner {
    ProcessRunner::new(Locator::new("fake", "Install fake.").known_path(path))
}

#[tokio::test]
async fn resolver_failure_means_not_installed() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = script(dir.path(), "resolve", "exit 1");
    let runner = ProcessRunner::new(
        Locator::new("ghost", "Install ghost.")
            .known_path(dir.path().join("ghost"))
            .resolver(&resolver, &["ghost"]),
    );

    match runner.run(&[]).await {
        Err(AscError::NotInstalled { tool, hint }) => {
            assert_eq!(tool, "ghost");
            assert_eq!(hint, "Install ghost.");
        }
        other => panic!("expected NotInstalled, got {other:?}"),
    }
}

#[tokio::test]
async fn resolver_output_locates_the_tool() {
    let dir = tempfile::tempdir().unwrap();
    let tool = script(dir.path(), "tool", "echo hello \"$@\"");
    let resolver = script(dir.path(), "resolve", &format!("echo {}", tool.display()));
    let runner = ProcessRunner::new(Locator::new("tool", "").resolver(&resolver, &[]));

    let output = runner.run(&["world".to_owned()]).await.unwrap();
    assert_eq!(output.stdout.trim(), "hello world");
    assert_eq!(runner.executable().await.unwrap(), tool);
}

#[tokio::test]
async fn nonzero_exit_fails_even_with_clean_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let tool = script(dir.path(), "tool", "echo '{\"status\":\"success\"}'\nexit 137");

    match runner_for(&tool).run(&["go".to_owned()]).await {
        Err(AscError::CommandFailed { command, exit_code }) => {
            assert_eq!(exit_code, 137);
            assert_eq!(command, "fake go");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn resolved_path_is_cached_for_the_runner_lifetime() {
    let dir = tempfile::tempdir().unwrap();
    let tool = script(dir.path(), "tool", "exit 0");
    let runner = runner_for(&tool);

    assert_eq!(runner.executable().await.unwrap(), tool);
    std::fs::remove_file(&tool).unwrap();
    assert_eq!(runner.executable().await.unwrap(), tool);
}

#[tokio::test]
async fn firebase_json_is_decoded_after_clean_exit() {
    let dir = tempfile::tempdir().unwrap();
    let tool = script(
        dir.path(),
        "firebase",
        r#"case "$1" in
  projects:list)
    echo '{"status":"success","result":[{"projectId":"demo-1","projectNumber":"42","displayName":"Demo","name":"projects/demo-1"}]}' ;;
  apps:list)
    echo "{\"status\":\"success\",\"result\":[{\"appId\":\"1:42:ios:abc\",\"displayName\":\"$3 $5 $6\",\"platform\":\"IOS\",\"bundleId\":\"com.example.app\"}]}" ;;
esac"#,
    );
    let cli = FirebaseCli::with_runner(runner_for(&tool));

    let projects = cli.list_projects().await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].project_id, "demo-1");

    let apps = cli
        .list_apps("demo-1", Some(FirebasePlatform::Ios))
        .await
        .unwrap();
    assert_eq!(apps[0].app_id, "1:42:ios:abc");
    // $3 is the project, $5/$6 are the platform flag and value.
    assert_eq!(apps[0].display_name.as_deref(), Some("demo-1 --platform ios"));
}

#[tokio::test]
async fn firebase_login_problems_are_recognized() {
    let dir = tempfile::tempdir().unwrap();
    let tool = script(
        dir.path(),
        "firebase",
        "echo '[]'\necho 'Error: not logged in, run firebase login' >&2",
    );
    let cli = FirebaseCli::with_runner(runner_for(&tool));

    assert!(matches!(cli.list_projects().await, Err(AscError::FirebaseNotLoggedIn)));
}

#[tokio::test]
async fn firebase_exit_status_wins_over_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let tool = script(dir.path(), "firebase", "echo 'project not found' >&2\nexit 2");
    let cli = FirebaseCli::with_runner(runner_for(&tool));

    assert!(matches!(
        cli.get_project("demo-1").await,
        Err(AscError::CommandFailed { exit_code: 2, .. })
    ));
}

#[tokio::test]
async fn firebase_garbage_output_is_invalid_json() {
    let dir = tempfile::tempdir().unwrap();
    let tool = script(dir.path(), "firebase", "echo 'Welcome to Firebase!'");
    let cli = FirebaseCli::with_runner(runner_for(&tool));

    assert!(matches!(cli.list_projects().await, Err(AscError::InvalidJson(_))));
}

fn auth() -> TransporterAuth {
    TransporterAuth {
        key_id: "KEY123".into(),
        issuer_id: "ISSUER".into(),
    }
}

#[tokio::test]
async fn transporter_upload_passes_mode_platform_and_key() {
    let dir = tempfile::tempdir().unwrap();
    let ipa = dir.path().join("App.ipa");
    std::fs::write(&ipa, b"ipa").unwrap();
    let tool = script(dir.path(), "iTMSTransporter", "echo \"$@\"");
    let cli = TransporterCli::with_runner(runner_for(&tool), auth());

    let stdout = cli.upload(&ipa, UploadPlatform::AppleTvOs).await.unwrap();
    assert!(stdout.contains("-m upload"), "{stdout}");
    assert!(stdout.contains("-type appletvos"), "{stdout}");
    assert!(stdout.contains("-apiKey KEY123 -apiIssuer ISSUER"), "{stdout}");
}

#[tokio::test]
async fn transporter_failures_carry_exit_code_and_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let ipa = dir.path().join("App.ipa");
    std::fs::write(&ipa, b"ipa").unwrap();
    let tool = script(dir.path(), "iTMSTransporter", "echo 'ERROR ITMS-90035: Invalid Signature' >&2\nexit 1");
    let cli = TransporterCli::with_runner(runner_for(&tool), auth());

    match cli.validate(&ipa).await {
        Err(AscError::ValidationFailed { exit_code, stderr }) => {
            assert_eq!(exit_code, 1);
            assert!(stderr.contains("ITMS-90035"));
        }
        other => panic!("expected ValidationFailed, got {other:?}"),
    }
    assert!(matches!(
        cli.upload(&ipa, UploadPlatform::Ios).await,
        Err(AscError::UploadFailed { exit_code: 1, .. })
    ));
}

#[tokio::test]
async fn symbol_upload_ignores_informational_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let dsym = dir.path().join("App.app.dSYM");
    std::fs::create_dir_all(&dsym).unwrap();
    let tool = script(
        dir.path(),
        "firebase",
        "echo 'Successfully uploaded Crashlytics symbols'\n\
         echo 'i  using service account authentication from GOOGLE_APPLICATION_CREDENTIALS' >&2\n\
         exit 0",
    );
    let cli = FirebaseCli::with_runner(runner_for(&tool));

    let output = cli.upload_dsyms("1:1:ios:a", &[dsym]).await.unwrap();
    assert!(output.stdout.contains("Successfully uploaded"));
    assert!(output.stderr.contains("service account authentication"));
}
