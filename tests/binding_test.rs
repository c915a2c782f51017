//! # Binding Tests
//!
//! End-to-end tests of the public binding API: credential in, environment
//! mapping and scratch files out, cleanup on unbind.

mod common;

use common::{entry_count, fixture, ssh_keygen_available, FIXTURE_PASSPHRASE};
use git_credential_bind::binding::{
    GCM_INTERACTIVE, GIT_SSH, GIT_SSH_COMMAND, GIT_TERMINAL_PROMPT, PASSPHRASE, PRIVATE_KEY,
};
use git_credential_bind::{
    BindContext, BindError, GitCapabilities, GitCredentialBinding, LocalWorkspace, Platform,
    SshPrivateKeyBinding, SshUserPrivateKey,
};
use std::fs;
use std::path::Path;
use std::thread;
use tempfile::TempDir;

fn ssh_binding(key: &str, passphrase: &str) -> SshPrivateKeyBinding {
    SshPrivateKeyBinding::new(
        SshUserPrivateKey::new("deploy", "git")
            .with_private_key(key)
            .with_passphrase(passphrase),
    )
}

#[test]
fn test_unencrypted_pem_modern_posix() {
    let temp = TempDir::new().unwrap();
    let ctx = BindContext::new(Platform::Posix, GitCapabilities::modern());

    let mut bound = ssh_binding(&fixture("rsa_pkcs1.pem"), "")
        .bind(Box::new(LocalWorkspace::new(temp.path())), &ctx)
        .unwrap();
    let mapping = bound.mapping();

    let command = mapping.get(GIT_SSH_COMMAND).unwrap();
    let key_path = bound
        .scratch_dir()
        .unwrap()
        .read_dir()
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    assert!(command.contains(&format!(
        "-i \"{}\" -o StrictHostKeyChecking=no",
        key_path.display()
    )));
    assert_eq!(mapping.get(GIT_TERMINAL_PROMPT), Some("false"));
    assert_eq!(mapping.get(PASSPHRASE), Some(""));
    assert!(!mapping.contains(GIT_SSH));

    // Only the legacy compatibility variables carry secrets
    for (name, _) in mapping.iter() {
        assert_eq!(
            mapping.is_sensitive(name),
            name == PRIVATE_KEY || name == PASSPHRASE,
            "{name}"
        );
    }

    bound.unbind().unwrap();
    assert_eq!(entry_count(temp.path()), 0);
}

#[test]
fn test_encrypted_openssh_legacy_windows() {
    let temp = TempDir::new().unwrap();
    let ssh = r"C:\Program Files\Git\usr\bin\ssh.exe";
    let ctx =
        BindContext::new(Platform::Windows, GitCapabilities::legacy()).with_ssh_executable(ssh);

    let bound = ssh_binding(&fixture("ed25519_openssh_encrypted"), FIXTURE_PASSPHRASE)
        .bind(Box::new(LocalWorkspace::new(temp.path())), &ctx)
        .unwrap();
    let mapping = bound.mapping();

    let script_path = Path::new(mapping.get(GIT_SSH).unwrap());
    assert!(script_path.to_string_lossy().ends_with(".bat"));
    let script = fs::read_to_string(script_path).unwrap();
    assert!(script.starts_with("@echo off"));
    assert!(script.contains(&format!("\"{ssh}\"")));

    assert_eq!(mapping.get(GCM_INTERACTIVE), Some("false"));
    assert!(!mapping.contains(GIT_SSH_COMMAND));
    assert!(!mapping.contains(GIT_TERMINAL_PROMPT));
}

#[test]
fn test_wrong_passphrase_fails_before_any_file_is_written() {
    let temp = TempDir::new().unwrap();
    let ctx = BindContext::new(Platform::Windows, GitCapabilities::legacy());

    for name in [
        "ed25519_openssh_encrypted",
        "rsa_pkcs1_aes128.pem",
        "rsa_pkcs1_des3.pem",
        "rsa_pkcs8_encrypted.pem",
        "ec_p256_aes256.pem",
    ] {
        let result = ssh_binding(&fixture(name), "wrong")
            .bind(Box::new(LocalWorkspace::new(temp.path())), &ctx);

        assert!(matches!(result, Err(BindError::KeyDecode(_))), "{name}");
        assert_eq!(entry_count(temp.path()), 0, "{name}");
    }
}

const FIXTURES: [(&str, &str); 10] = [
    ("ed25519_openssh", ""),
    ("ed25519_openssh_encrypted", FIXTURE_PASSPHRASE),
    ("rsa_openssh", ""),
    ("rsa_pkcs1.pem", ""),
    ("rsa_pkcs1_aes128.pem", FIXTURE_PASSPHRASE),
    ("rsa_pkcs1_des3.pem", FIXTURE_PASSPHRASE),
    ("rsa_pkcs8.pem", ""),
    ("rsa_pkcs8_encrypted.pem", FIXTURE_PASSPHRASE),
    ("ec_p256.pem", ""),
    ("ec_p256_aes256.pem", FIXTURE_PASSPHRASE),
];

#[test]
fn test_every_fixture_binds_in_every_mode() {
    let contexts = [
        BindContext::new(Platform::Posix, GitCapabilities::modern()),
        BindContext::new(Platform::Posix, GitCapabilities::legacy()),
        BindContext::new(Platform::Windows, GitCapabilities::modern()),
        BindContext::new(Platform::Windows, GitCapabilities::legacy()),
    ];

    let temp = TempDir::new().unwrap();
    for (name, passphrase) in FIXTURES {
        let binding = ssh_binding(&fixture(name), passphrase);
        for ctx in &contexts {
            let mut bound = binding
                .bind(Box::new(LocalWorkspace::new(temp.path())), ctx)
                .unwrap_or_else(|e| panic!("{name}: {e}"));

            let mapping = bound.mapping();
            assert!(mapping.contains(GIT_SSH_COMMAND) ^ mapping.contains(GIT_SSH));
            assert!(mapping.contains(GIT_TERMINAL_PROMPT) ^ mapping.contains(GCM_INTERACTIVE));

            bound.unbind().unwrap();
            bound.unbind().unwrap();
        }
    }
    assert_eq!(entry_count(temp.path()), 0);
}

#[cfg(unix)]
#[test]
fn test_bound_key_file_loads_in_ssh_keygen() {
    if !ssh_keygen_available() {
        eprintln!("ssh-keygen not found, skipping");
        return;
    }

    let temp = TempDir::new().unwrap();
    let ctx = BindContext::new(Platform::Posix, GitCapabilities::modern());
    for (name, passphrase) in FIXTURES {
        let bound = ssh_binding(&fixture(name), passphrase)
            .bind(Box::new(LocalWorkspace::new(temp.path())), &ctx)
            .unwrap_or_else(|e| panic!("{name}: {e}"));
        let key_path = bound
            .scratch_dir()
            .unwrap()
            .read_dir()
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();

        // An empty -P fails on any key that is still encrypted
        let output = assert_cmd::Command::new("ssh-keygen")
            .args(["-y", "-P", "", "-f"])
            .arg(&key_path)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "{name}: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let public = String::from_utf8_lossy(&output.stdout);
        assert!(public.starts_with("ssh-") || public.starts_with("ecdsa-"), "{name}: {public}");
    }
    assert_eq!(entry_count(temp.path()), 0);
}

#[test]
fn test_concurrent_binds_are_isolated() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();

    let handles: Vec<_> = ["rsa_pkcs1_aes128.pem", "ed25519_openssh_encrypted", "ec_p256_aes256.pem"]
        .into_iter()
        .map(|name| {
            let root = root.clone();
            let key = fixture(name);
            thread::spawn(move || {
                let ctx = BindContext::new(Platform::Posix, GitCapabilities::modern());
                let bound = ssh_binding(&key, FIXTURE_PASSPHRASE)
                    .bind(Box::new(LocalWorkspace::new(&root)), &ctx)
                    .unwrap();
                let dir = bound.scratch_dir().unwrap().to_path_buf();
                let command = bound.mapping().get(GIT_SSH_COMMAND).unwrap().to_string();
                (bound, dir, command)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(entry_count(&root), 3);
    for (i, (_, dir, command)) in results.iter().enumerate() {
        assert!(command.contains(&*dir.to_string_lossy()));
        for (_, other, _) in &results[i + 1..] {
            assert_ne!(dir, other);
        }
    }

    drop(results);
    assert_eq!(entry_count(&root), 0);
}
