use pretty_assertions::assert_eq;
use qail_xauth::parser::split_three;
use qail_xauth::prelude::*;

fn accounts() -> CredentialStore {
    let config = XAuthConfig::builder()
        .account("alice", "%", "secret")
        .account("ops", "10.0.0.1", "hunter2")
        .build();
    CredentialStore::from_config(&config).expect("Failed to build store")
}

fn reply(db: &str, user: &str, secret: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(db.as_bytes());
    out.push(0);
    out.extend_from_slice(user.as_bytes());
    out.push(0);
    out.extend_from_slice(secret);
    out
}

fn start<V: CredentialVerifier>(auth: &mut Mysql41Auth<RandomChallengeSource, V>) -> Vec<u8> {
    match auth.handle_start(MECHANISM_NAME, b"") {
        AuthOutcome::Ongoing(salt) => salt,
        other => panic!("expected challenge, got {:?}", other),
    }
}

/// Accepts exactly the user "alice", whatever the secret.
struct AcceptAlice;

impl CredentialVerifier for AcceptAlice {
    fn authenticate(&self, identity: &UserIdentity, _secret: &[u8], _challenge: &Challenge) -> bool {
        identity.username == "alice"
    }
}

struct RejectAll;

impl CredentialVerifier for RejectAll {
    fn authenticate(&self, _: &UserIdentity, _: &[u8], _: &Challenge) -> bool {
        false
    }
}

#[test]
fn test_end_to_end_success() {
    let mut auth = qail_xauth::authenticator(AcceptAlice);
    start(&mut auth);

    let peer = PeerContext::new("192.168.0.10:40000");
    let outcome = auth.handle_continue(&peer, b"db\0alice\0secret");

    assert_eq!(outcome, AuthOutcome::Succeeded(SessionBinding::new("db", "alice")));
    let binding = outcome.binding().expect("binding");
    assert_eq!(binding.dbname, "db");
    assert_eq!(binding.user, "alice");
    assert_eq!(auth.state(), HandshakeState::Done);
}

#[test]
fn test_end_to_end_no_separators() {
    let mut auth = qail_xauth::authenticator(AcceptAlice);
    start(&mut auth);

    let outcome = auth.handle_continue(&PeerContext::new("127.0.0.1:1"), b"dbalicesecret");
    assert_eq!(outcome.error_code(), Some(AuthErrorCode::BadMessage));
    assert!(!outcome.is_success());
}

#[test]
fn test_real_scramble_against_store() {
    let mut auth = qail_xauth::authenticator(accounts());
    let salt = start(&mut auth);
    assert_eq!(salt.len(), SCRAMBLE_LENGTH);

    let secret = encode_secret(b"secret", &salt);
    let outcome = auth.handle_continue(
        &PeerContext::new("172.16.4.2:55000"),
        &reply("sales", "alice", secret.as_bytes()),
    );
    assert!(outcome.is_success());
}

#[test]
fn test_raw_scramble_is_never_accepted() {
    let store = accounts();
    for _ in 0..200 {
        let mut auth = qail_xauth::authenticator(&store);
        let salt = start(&mut auth);

        // A raw scramble may contain NUL and break the framing, so only the
        // `*HEX` form is valid.
        let raw = scramble_password(b"secret", &salt);
        let outcome = auth.handle_continue(&PeerContext::new("[::1]:55000"), &reply("", "alice", &raw));
        assert!(!outcome.is_success());
        let expected = if raw.contains(&0) {
            AuthErrorCode::BadMessage
        } else {
            AuthErrorCode::AccessDenied
        };
        assert_eq!(outcome.error_code(), Some(expected));
    }
}

#[test]
fn test_hex_scramble_always_accepted() {
    let store = accounts();
    for _ in 0..200 {
        let mut auth = qail_xauth::authenticator(&store);
        let salt = start(&mut auth);
        let secret = encode_secret(b"secret", &salt);
        let outcome = auth.handle_continue(
            &PeerContext::new("[::1]:55000"),
            &reply("", "alice", secret.as_bytes()),
        );
        assert!(outcome.is_success());
    }
}

#[test]
fn test_non_utf8_user_cannot_match_replacement_account() {
    let mut store = CredentialStore::new();
    store.insert_password("\u{fffd}", "%", "");
    let peer = PeerContext::new("127.0.0.1:1");

    let payloads: [&[u8]; 3] = [b"\0\xfe\0", b"\0\xff\0", b"\0a\xffb\0"];
    for payload in payloads {
        let mut auth = qail_xauth::authenticator(&store);
        start(&mut auth);
        let outcome = auth.handle_continue(&peer, payload);
        assert_eq!(outcome.error_code(), Some(AuthErrorCode::AccessDenied));
        assert!(outcome.binding().is_some());
    }

    // The real U+FFFD user name still logs in.
    let mut auth = qail_xauth::authenticator(&store);
    start(&mut auth);
    let outcome = auth.handle_continue(&peer, "\0\u{fffd}\0".as_bytes());
    assert_eq!(outcome, AuthOutcome::Succeeded(SessionBinding::new("", "\u{fffd}")));
}

#[test]
fn test_host_restricted_account() {
    let store = accounts();

    let mut auth = qail_xauth::authenticator(&store);
    let salt = start(&mut auth);
    let ok = auth.handle_continue(
        &PeerContext::new("10.0.0.1:3000"),
        &reply("", "ops", encode_secret(b"hunter2", &salt).as_bytes()),
    );
    assert!(ok.is_success());

    let mut auth = qail_xauth::authenticator(&store);
    let salt = start(&mut auth);
    let denied = auth.handle_continue(
        &PeerContext::new("10.0.0.2:3000"),
        &reply("", "ops", encode_secret(b"hunter2", &salt).as_bytes()),
    );
    assert_eq!(denied.error_code(), Some(AuthErrorCode::AccessDenied));
}

#[test]
fn test_secret_from_other_salt_is_rejected() {
    let mut first = qail_xauth::authenticator(accounts());
    let old_salt = start(&mut first);

    let mut second = qail_xauth::authenticator(accounts());
    let new_salt = start(&mut second);
    assert_ne!(old_salt, new_salt);

    let replayed = encode_secret(b"secret", &old_salt);
    let outcome = second.handle_continue(
        &PeerContext::new("127.0.0.1:9"),
        &reply("", "alice", replayed.as_bytes()),
    );
    assert_eq!(outcome.error_code(), Some(AuthErrorCode::AccessDenied));
}

#[test]
fn test_skip_auth_accepts_any_secret() {
    let secrets: [&[u8]; 3] = [b"", b"junk", b"*0000000000000000000000000000000000000000"];
    for secret in secrets {
        let mut auth = qail_xauth::authenticator(RejectAll);
        start(&mut auth);
        let peer = PeerContext::new("203.0.113.9:1234").with_skip_auth(true);
        let outcome = auth.handle_continue(&peer, &reply("test", "nobody", secret));
        assert_eq!(outcome, AuthOutcome::Succeeded(SessionBinding::new("test", "nobody")));
    }
}

#[test]
fn test_rejecting_verifier_never_succeeds() {
    let payloads: [&[u8]; 3] = [b"db\0alice\0secret", b"\0\0", b"x\0root\0*"];
    for payload in payloads {
        let mut auth = qail_xauth::authenticator(RejectAll);
        start(&mut auth);
        let outcome = auth.handle_continue(&PeerContext::new("127.0.0.1:1"), payload);
        assert_eq!(outcome.error_code(), Some(AuthErrorCode::AccessDenied));
    }
}

#[test]
fn test_host_failure_and_bad_password_look_the_same() {
    let mut a = qail_xauth::authenticator(accounts());
    start(&mut a);
    let no_host = a.handle_continue(&PeerContext::new("/tmp/mysqlx.sock"), b"d\0alice\0x");

    let mut b = qail_xauth::authenticator(accounts());
    start(&mut b);
    let bad_pw = b.handle_continue(&PeerContext::new("127.0.0.1:1"), b"d\0alice\0x");

    assert_eq!(no_host, bad_pw);
}

#[test]
fn test_start_only_valid_in_starting() {
    // WaitingResponse
    let mut auth = qail_xauth::authenticator(AcceptAlice);
    start(&mut auth);
    assert_eq!(
        auth.handle_start(MECHANISM_NAME, b""),
        AuthOutcome::ProtocolError(AuthErrorCode::OutOfOrder)
    );
    assert_eq!(auth.state(), HandshakeState::Error);

    // Done
    let mut auth = qail_xauth::authenticator(AcceptAlice);
    start(&mut auth);
    auth.handle_continue(&PeerContext::new("127.0.0.1:1"), b"db\0alice\0secret");
    assert_eq!(
        auth.handle_start(MECHANISM_NAME, b""),
        AuthOutcome::ProtocolError(AuthErrorCode::OutOfOrder)
    );
    assert_eq!(auth.state(), HandshakeState::Error);

    // Error stays Error
    assert_eq!(
        auth.handle_start(MECHANISM_NAME, b""),
        AuthOutcome::ProtocolError(AuthErrorCode::OutOfOrder)
    );
    assert_eq!(auth.state(), HandshakeState::Error);
}

#[test]
fn test_continue_only_valid_in_waiting() {
    let peer = PeerContext::new("127.0.0.1:1");

    let mut fresh = qail_xauth::authenticator(AcceptAlice);
    assert_eq!(
        fresh.handle_continue(&peer, b"db\0alice\0secret"),
        AuthOutcome::ProtocolError(AuthErrorCode::OutOfOrder)
    );

    let mut done = qail_xauth::authenticator(AcceptAlice);
    start(&mut done);
    assert!(done.handle_continue(&peer, b"db\0alice\0secret").is_success());
    assert_eq!(
        done.handle_continue(&peer, b"db\0alice\0secret"),
        AuthOutcome::ProtocolError(AuthErrorCode::OutOfOrder)
    );
    assert_eq!(done.state(), HandshakeState::Error);
}

#[test]
fn test_malformed_payloads_never_panic() {
    let mut inputs: Vec<Vec<u8>> = vec![
        Vec::new(),
        vec![0],
        vec![0, 0, 0],
        b"a\0b".to_vec(),
        b"a\0b\0c\0d".to_vec(),
        vec![0xff; 4096],
    ];
    for len in 0..32usize {
        inputs.push((0..len).map(|i| if i % 3 == 0 { 0 } else { i as u8 }).collect());
    }

    for input in inputs {
        let separators = input.iter().filter(|&&b| b == 0).count();
        let parsed = split_three(&input);
        assert_eq!(parsed.is_some(), separators == 2, "input {:?}", input);

        let mut auth = qail_xauth::authenticator(RejectAll);
        start(&mut auth);
        let outcome = auth.handle_continue(&PeerContext::new("127.0.0.1:1"), &input);
        if separators != 2 {
            assert_eq!(outcome.error_code(), Some(AuthErrorCode::BadMessage));
        }
        assert_eq!(auth.state(), HandshakeState::Done);
    }
}

#[test]
fn test_fields_recovered_byte_exact() {
    let p = split_three(b"\0\xffuser\0*AB\x01").expect("three fields");
    assert_eq!(p.dbname, b"");
    assert_eq!(p.user, b"\xffuser");
    assert_eq!(p.secret, b"*AB\x01");
}
