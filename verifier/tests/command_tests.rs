//! The `test` and `search` subcommands end to end, minus the real client.

mod common;

use common::{podman_context, ScriptedClient};
use directory::{SearchOutput, SearchScope};
use std::io::Cursor;
use verifier::{commands, Fixtures, ProbeRunner, VerifierConfig};

#[tokio::test]
async fn test_run_completes_despite_failures() {
    let config = VerifierConfig::default();
    let client = ScriptedClient::fixed(49, "");
    let runner = ProbeRunner::new(Some(podman_context()), client, config.clone());

    let mut out: Vec<u8> = Vec::new();
    let summary = commands::test(&runner, &config, &Fixtures::default(), &mut out)
        .await
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    assert!(summary.failed > 0);
    assert!(text.contains("✗"));
    assert!(text.trim_end().ends_with("Test run completed"));
}

#[tokio::test]
async fn test_run_without_service_skips_everything() {
    let config = VerifierConfig::default();
    let client = ScriptedClient::fixed(0, "");
    let runner = ProbeRunner::new(None, client.clone(), config.clone());

    let mut out: Vec<u8> = Vec::new();
    let summary = commands::test(&runner, &config, &Fixtures::default(), &mut out)
        .await
        .unwrap();

    assert_eq!(summary.failed, 0);
    assert_eq!(summary.passed, 0);
    assert_eq!(summary.skipped, summary.total());
    assert!(client.calls().is_empty());

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("No container runtime is running 'openldap'"));
    assert!(text.contains("Test run completed"));
}

#[tokio::test]
async fn test_search_with_blank_answers() {
    let config = VerifierConfig::default();
    let client = ScriptedClient::fixed(0, "dn: dc=example,dc=org\ndc: example\n");
    let ctx = podman_context();

    let mut input = Cursor::new("\n\n\n");
    let mut output: Vec<u8> = Vec::new();
    let mut errors: Vec<u8> = Vec::new();
    let code = commands::search(
        Some(&ctx),
        client.as_ref(),
        &config,
        &mut input,
        &mut output,
        &mut errors,
    )
    .await;

    assert_eq!(code, 0);
    let request = &client.calls()[0];
    assert_eq!(request.filter, "(objectClass=*)");
    assert_eq!(request.base_dn, "dc=example,dc=org");
    assert_eq!(request.scope, SearchScope::Sub);
    assert!(request.attributes.is_empty());

    let text = String::from_utf8(output).unwrap();
    assert!(text.ends_with("dn: dc=example,dc=org\ndc: example\n"));
}

#[tokio::test]
async fn test_search_surfaces_client_errors_verbatim() {
    let config = VerifierConfig::default();
    let client = ScriptedClient::new(|_| {
        Ok(SearchOutput::new(255, "").with_stderr("ldapsearch: bad filter (uid=john\n"))
    });
    let ctx = podman_context();

    let mut input = Cursor::new("\n(uid=john\ncn\n");
    let mut output: Vec<u8> = Vec::new();
    let mut errors: Vec<u8> = Vec::new();
    let code = commands::search(
        Some(&ctx),
        client.as_ref(),
        &config,
        &mut input,
        &mut output,
        &mut errors,
    )
    .await;

    assert_eq!(code, 255);
    assert_eq!(client.calls()[0].attributes, vec!["cn".to_string()]);
    assert_eq!(
        String::from_utf8(errors).unwrap(),
        "ldapsearch: bad filter (uid=john\n"
    );
}

#[tokio::test]
async fn test_search_launch_failure_and_missing_service() {
    let config = VerifierConfig::default();
    let ctx = podman_context();

    let mut output: Vec<u8> = Vec::new();
    let mut errors: Vec<u8> = Vec::new();
    let code = commands::search(
        Some(&ctx),
        ScriptedClient::unlaunchable().as_ref(),
        &config,
        &mut Cursor::new("\n\n\n"),
        &mut output,
        &mut errors,
    )
    .await;
    assert_eq!(code, 1);
    assert!(String::from_utf8(errors).unwrap().contains("Failed to launch"));

    let client = ScriptedClient::fixed(0, "");
    let mut errors: Vec<u8> = Vec::new();
    let code = commands::search(
        None,
        client.as_ref(),
        &config,
        &mut Cursor::new("\n\n\n"),
        &mut Vec::<u8>::new(),
        &mut errors,
    )
    .await;
    assert_eq!(code, 1);
    assert!(client.calls().is_empty());
}
