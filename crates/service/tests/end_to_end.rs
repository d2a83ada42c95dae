//! End-to-end tests: bearer token in, records out.
//!
//! These exercise the full path an HTTP handler would take: the auth gate
//! verifies the `Authorization` header against a fake issuer's published
//! keys, then the record service creates and lists records for the
//! resulting identity. A counting store wrapper proves that rejected
//! requests never reach storage.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use journal_authn::{
    Identity, JwkSet, KeyCache, TokenVerifier, VerifierConfig,
    testutil::{FakeIssuer, create_signed_jwt, generate_test_keypair, test_jwk},
};
use journal_service::{AuthGate, RecordService, UnauthenticatedPolicy};
use journal_storage::{
    KvRecordStore, MemoryBackend, Record, RecordDraft, RecordStore, StorageResult,
};
use tokio_util::sync::CancellationToken;

const ISSUER: &str = "https://issuer.example.com/";
const AUDIENCE: &str = "api://journal";
const KID: &str = "kid-1";

/// Store wrapper counting every call, to prove rejected requests never
/// touch persistence.
struct CountingStore {
    inner: KvRecordStore,
    saves: AtomicUsize,
    lists: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: KvRecordStore::new(Arc::new(MemoryBackend::new()), "records"),
            saves: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.saves.load(Ordering::SeqCst) + self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for CountingStore {
    async fn save(&self, record: &Record) -> StorageResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(record).await
    }

    async fn list_by_owner(&self, owner: &str, limit: usize) -> StorageResult<Vec<Record>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list_by_owner(owner, limit).await
    }
}

struct Harness {
    pkcs8_der: Vec<u8>,
    gate: AuthGate,
    service: RecordService,
    store: Arc<CountingStore>,
    cancel: CancellationToken,
}

fn harness() -> Harness {
    harness_with_policy(UnauthenticatedPolicy::Reject)
}

fn harness_with_policy(policy: UnauthenticatedPolicy) -> Harness {
    let (pkcs8_der, public_key_b64) = generate_test_keypair();
    let issuer = Arc::new(FakeIssuer::with_keys(JwkSet { keys: vec![test_jwk(KID, &public_key_b64)] }));
    let keys = Arc::new(KeyCache::new(issuer));
    let verifier = TokenVerifier::new(VerifierConfig::new(ISSUER, AUDIENCE), keys);

    let store = Arc::new(CountingStore::new());
    Harness {
        pkcs8_der,
        gate: AuthGate::new(verifier, policy),
        service: RecordService::new(store.clone()),
        store,
        cancel: CancellationToken::new(),
    }
}

impl Harness {
    fn token_for(&self, sub: &str) -> String {
        create_signed_jwt(&self.pkcs8_der, KID, ISSUER, AUDIENCE, sub, 3600)
    }

    fn header_for(&self, sub: &str) -> String {
        format!("Bearer {}", self.token_for(sub))
    }

    async fn authenticate(&self, header: Option<&str>) -> Result<Identity, &'static str> {
        self.gate.authenticate(header, &self.cancel).await.map_err(|r| {
            assert_eq!(r.status, 401);
            r.code
        })
    }
}

fn draft(title: &str) -> RecordDraft {
    RecordDraft { title: title.into(), body: format!("body of {title}"), ..RecordDraft::default() }
}

#[tokio::test]
async fn test_valid_token_creates_and_lists() {
    let h = harness();
    let header = h.header_for("auth0|user-1");

    let identity = h.authenticate(Some(&header)).await.unwrap();
    assert_eq!(identity.as_str(), "auth0|user-1");

    let created = h.service.create(&identity, draft("Hello"), &h.cancel).await.unwrap();
    let listed = h.service.list(&identity, 10, &h.cancel).await.unwrap();

    assert_eq!(listed, vec![created.clone()]);
    assert_eq!(created.owner, "auth0|user-1");
    assert_eq!(created.title, "Hello");
}

#[tokio::test]
async fn test_tampered_token_rejected_before_any_store_call() {
    let h = harness();
    let token = h.token_for("auth0|user-1");
    let suffix = if token.ends_with("AA") { "BB" } else { "AA" };
    let mut tampered = token[..token.len() - 2].to_string();
    tampered.push_str(suffix);
    let header = format!("Bearer {tampered}");

    let code = h.authenticate(Some(&header)).await.unwrap_err();
    assert_eq!(code, "bad_signature");
    assert_eq!(h.store.calls(), 0, "a rejected request must never reach the store");
}

#[tokio::test]
async fn test_missing_credentials_rejected_under_reject_policy() {
    let h = harness();

    let code = h.authenticate(None).await.unwrap_err();
    assert_eq!(code, "missing_credentials");
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn test_allow_as_policy_admits_fixed_identity() {
    let fixed = Identity::new("system|batch").unwrap();
    let h = harness_with_policy(UnauthenticatedPolicy::AllowAs(fixed.clone()));

    let identity = h.authenticate(None).await.unwrap();
    assert_eq!(identity, fixed);

    let created = h.service.create(&identity, draft("Batch"), &h.cancel).await.unwrap();
    assert_eq!(created.owner, "system|batch");
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let h = harness();
    let token = create_signed_jwt(&h.pkcs8_der, KID, ISSUER, AUDIENCE, "auth0|user-1", -3600);
    let header = format!("Bearer {token}");

    let code = h.authenticate(Some(&header)).await.unwrap_err();
    assert_eq!(code, "token_expired");
}

#[tokio::test]
async fn test_unknown_key_rejected() {
    let h = harness();
    let token =
        create_signed_jwt(&h.pkcs8_der, "kid-retired", ISSUER, AUDIENCE, "auth0|user-1", 3600);
    let header = format!("Bearer {token}");

    let code = h.authenticate(Some(&header)).await.unwrap_err();
    assert_eq!(code, "unknown_key");
}

#[tokio::test]
async fn test_wrong_audience_rejected() {
    let h = harness();
    let token = create_signed_jwt(&h.pkcs8_der, KID, ISSUER, "api://other", "auth0|user-1", 3600);
    let header = format!("Bearer {token}");

    let code = h.authenticate(Some(&header)).await.unwrap_err();
    assert_eq!(code, "bad_audience");
}

#[tokio::test]
async fn test_non_bearer_scheme_rejected() {
    let h = harness();

    let code = h.authenticate(Some("Basic dXNlcjpwYXNz")).await.unwrap_err();
    assert_eq!(code, "malformed_token");
    assert_eq!(h.store.calls(), 0);
}

#[tokio::test]
async fn test_cancelled_request_rejected_with_timeout() {
    let h = harness();
    let header = h.header_for("auth0|user-1");
    h.cancel.cancel();

    let code = h.authenticate(Some(&header)).await.unwrap_err();
    assert_eq!(code, "timeout");
}

#[tokio::test]
async fn test_listing_is_newest_first_and_capped() {
    let h = harness();
    let header = h.header_for("auth0|user-1");
    let identity = h.authenticate(Some(&header)).await.unwrap();

    let mut ids = Vec::new();
    for title in ["first", "second", "third"] {
        let record = h.service.create(&identity, draft(title), &h.cancel).await.unwrap();
        ids.push(record.id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let listed = h.service.list(&identity, 2, &h.cancel).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, ids[2], "newest record first");
    assert_eq!(listed[1].id, ids[1]);
}

#[tokio::test]
async fn test_owner_isolation_across_tokens() {
    let h = harness();
    let alice_header = h.header_for("auth0|alice");
    let bob_header = h.header_for("auth0|bob");

    let alice = h.authenticate(Some(&alice_header)).await.unwrap();
    let bob = h.authenticate(Some(&bob_header)).await.unwrap();

    h.service.create(&alice, draft("Alice's entry"), &h.cancel).await.unwrap();

    let bobs = h.service.list(&bob, 10, &h.cancel).await.unwrap();
    assert!(bobs.is_empty(), "one principal must never see another's records");

    let alices = h.service.list(&alice, 10, &h.cancel).await.unwrap();
    assert_eq!(alices.len(), 1);
}

#[tokio::test]
async fn test_new_principal_lists_empty() {
    let h = harness();
    let header = h.header_for("auth0|fresh");
    let identity = h.authenticate(Some(&header)).await.unwrap();

    let listed = h.service.list(&identity, 50, &h.cancel).await.unwrap();
    assert!(listed.is_empty());
}
