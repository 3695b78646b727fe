//! Proves that a submitted signing key signed at least one published provider release.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use regsync_registry::{storage, EntryId, VersionRecord};
use tracing::{debug, info, warn};

use crate::{
    cancel::CancelFlag,
    context::RegsyncContext,
    error::{OperationError, Result},
    gpg::{IdentityCheck, Keyring, PublicKey, SignatureCheck},
    parallel::run_all,
    types::{KeyMatch, KeyVerdict, ScanReport, VerifyTarget},
    verification::{Status, Step, VerificationResult},
};

pub const KEY_STEP: &str = "Validate GPG key";
pub const USER_STEP: &str = "Validate GitHub user";
const SCAN_STEP: &str = "Key is used to sign at least one provider";
const MEMBERSHIP_REMARK: &str = "If this is incorrect, please ensure that your organization \
    membership is public. For more information, see [GitHub Docs - Publicizing or hiding \
    organization membership](https://docs.github.com/en/account-and-profile/setting-up-and-managing-your-personal-account-on-github/managing-your-membership-in-organizations/publicizing-or-hiding-organization-membership)";

/// A key to verify, with a label naming where it came from.
#[derive(Debug, Clone)]
pub struct KeySubmission {
    pub label: String,
    pub armored: String,
}

/// The step tree of one key plus the scan outcome when the scan ran.
#[derive(Debug, Clone)]
pub struct KeyVerification {
    pub step: Step,
    pub scan: Option<ScanReport>,
}

/// The whole verification run.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub result: VerificationResult,
    pub scans: Vec<ScanReport>,
}

impl VerificationReport {
    pub fn is_verified(&self) -> bool {
        !self.result.did_fail()
    }
}

/// Verifies every submitted key against `target` and, when `github_user` is given, that the
/// user belongs to the target namespace.
pub async fn run_verification(
    ctx: &RegsyncContext,
    keys: &[KeySubmission],
    target: &VerifyTarget,
    github_user: Option<&str>,
) -> VerificationReport {
    let mut result = VerificationResult::default();
    let mut scans = Vec::new();

    if keys.is_empty() {
        let step = result.add_step(KEY_STEP, Status::Failure);
        step.errors.push(format!("no keys found for {}", target.namespace()));
    }

    for key in keys {
        let verification = verify_key(ctx, key, target, &CancelFlag::new()).await;
        result.push(verification.step);
        scans.extend(verification.scan);
    }

    match github_user {
        Some(user) => result.push(verify_github_user(ctx, user, target.namespace()).await),
        None => {
            result.add_step(USER_STEP, Status::Skipped);
        }
    }

    VerificationReport { result, scans }
}

/// Runs the key checks and, when none of them failed, the signature scan.
pub async fn verify_key(
    ctx: &RegsyncContext,
    submission: &KeySubmission,
    target: &VerifyTarget,
    cancel: &CancelFlag,
) -> KeyVerification {
    let mut step = Step::new(KEY_STEP, Status::NotRun);
    step.add_remark(format!("Key: {}", submission.label));

    let key = match PublicKey::from_armored(&submission.armored) {
        Ok(key) => {
            step.add_step("Key is a valid PGP key", Status::Success);
            key
        }
        Err(err) => {
            step.record("Key is a valid PGP key", Err(err));
            step.status = Status::Failure;
            return KeyVerification { step, scan: None };
        }
    };
    debug!(key_id = %key.key_id(), "verifying key");

    let now = Utc::now();
    step.run_step("Key is not expired", || {
        if key.is_expired_at(now) {
            Err("key is expired")
        } else {
            Ok(())
        }
    });
    step.run_step("Key is not revoked", || {
        if key.is_revoked() {
            Err("key is revoked")
        } else {
            Ok(())
        }
    });
    step.run_step("Key can be used for signing", || {
        if key.can_sign() {
            Ok(())
        } else {
            Err("key cannot be used for signing")
        }
    });

    let identity = step.add_step(
        "Key has a valid identity and email. (Email is preferable but optional)",
        Status::Success,
    );
    match key.check_identities() {
        IdentityCheck::Valid => {}
        IdentityCheck::Warning(message) => {
            identity.fail(message);
            identity.failure_to_warning();
        }
        IdentityCheck::Invalid(message) => identity.fail(message),
    }

    let mut scan = None;
    if !step.did_fail() {
        let scan_step = step.add_step(SCAN_STEP, Status::NotRun);
        match scan_providers(ctx, &key.keyring(), target, cancel).await {
            Ok(report) => {
                match &report.verdict {
                    KeyVerdict::Verified { matches } => {
                        scan_step.status = Status::Success;
                        for found in matches {
                            scan_step.add_remark(format!("Signed {found}"));
                        }
                    }
                    KeyVerdict::NotVerified => {
                        scan_step.fail("key not used to sign any known artifact");
                        scan_step.failure_to_warning();
                    }
                }
                scan_step.errors.extend(report.failures.iter().cloned());
                scan = Some(report);
            }
            Err(err) => scan_step.fail(err),
        }
    }

    step.status = if step.did_fail() {
        Status::Failure
    } else if step.sub_steps.iter().any(|s| s.status == Status::Warning) {
        Status::Warning
    } else {
        Status::Success
    };
    KeyVerification { step, scan }
}

/// The provider entries named by `target`.
pub fn resolve_targets(ctx: &RegsyncContext, target: &VerifyTarget) -> Result<Vec<EntryId>> {
    let root = &ctx.settings().providers_dir;
    match target {
        VerifyTarget::Provider { namespace, name } => {
            let found: Vec<EntryId> = storage::providers_in_namespace(root, namespace)?
                .into_iter()
                .filter(|id| id.name.eq_ignore_ascii_case(name))
                .collect();
            if found.is_empty() {
                return Err(OperationError::Custom(format!(
                    "provider {} not found",
                    EntryId::provider(namespace, name)
                )));
            }
            Ok(found)
        }
        VerifyTarget::Namespace(namespace) => {
            let providers = storage::providers_in_namespace(root, namespace)?;
            if providers.is_empty() {
                return Err(OperationError::NoProviders(namespace.clone()));
            }
            Ok(providers)
        }
    }
}

#[derive(Default)]
struct ScanState {
    matches: Vec<KeyMatch>,
    failures: Vec<String>,
    cancelled: usize,
    checked: usize,
}

/// Checks the checksums signature of every version of every targeted provider until one
/// verifies against `keyring`.
///
/// The first match raises `cancel`; work not yet started, and checks that error after it, are
/// then counted as cancelled and never as failures. A signature by the key that does not verify is recorded as a failure
/// of that version only.
pub async fn scan_providers(
    ctx: &RegsyncContext,
    keyring: &Keyring,
    target: &VerifyTarget,
    cancel: &CancelFlag,
) -> Result<ScanReport> {
    let entries = resolve_targets(ctx, target)?;
    let keyring = Arc::new(keyring.clone());
    let state = Arc::new(Mutex::new(ScanState::default()));

    let tasks = entries.into_iter().map(|id| {
        let ctx = ctx.clone();
        let keyring = keyring.clone();
        let state = state.clone();
        let cancel = cancel.clone();
        async move {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let doc = storage::load_document(&ctx.settings().providers_dir, &id)
                .map_err(|err| OperationError::from(err).in_entry(&id))?;
            info!(provider = %id, versions = doc.versions.len(), "starting key signature checks");

            let checks = doc.versions.into_iter().map(|record| {
                let ctx = ctx.clone();
                let keyring = keyring.clone();
                let state = state.clone();
                let cancel = cancel.clone();
                let id = id.clone();
                async move {
                    if cancel.is_cancelled() {
                        lock(&state).cancelled += 1;
                        return Ok(());
                    }
                    let outcome = check_version(&ctx, &keyring, &record).await;

                    let mut state = lock(&state);
                    state.checked += 1;
                    match outcome {
                        Ok(SignatureCheck::Valid(key_id)) => {
                            info!(
                                provider = %id,
                                version = %record.version,
                                %key_id,
                                "key signed provider version"
                            );
                            state.matches.push(KeyMatch::new(&id, &record.version));
                            cancel.cancel();
                        }
                        Ok(SignatureCheck::UnknownIssuer) => {
                            debug!(
                                provider = %id,
                                version = %record.version,
                                "signed by another key"
                            );
                        }
                        Err(_) if cancel.is_cancelled() => {
                            state.cancelled += 1;
                        }
                        Err(err) => {
                            warn!(provider = %id, version = %record.version, "{err}");
                            state.failures.push(format!("{id} {}: {err}", record.version));
                        }
                    }
                    Ok(())
                }
            });

            let errors = run_all(checks, ctx.settings().version_concurrency).await;
            if !errors.is_empty() {
                lock(&state)
                    .failures
                    .extend(errors.into_iter().map(|err| format!("{id}: {err}")));
            }
            Ok(())
        }
    });

    for err in run_all(tasks, ctx.settings().entry_concurrency).await {
        warn!("{err}");
        lock(&state).failures.push(err.to_string());
    }

    let state = std::mem::take(&mut *lock(&state));
    let verdict = if state.matches.is_empty() {
        KeyVerdict::NotVerified
    } else {
        KeyVerdict::Verified {
            matches: state.matches,
        }
    };
    Ok(ScanReport {
        verdict,
        failures: state.failures,
        cancelled: state.cancelled,
        checked: state.checked,
    })
}

fn lock(state: &Mutex<ScanState>) -> std::sync::MutexGuard<'_, ScanState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn check_version(
    ctx: &RegsyncContext,
    keyring: &Keyring,
    record: &VersionRecord,
) -> Result<SignatureCheck> {
    let sums = download(ctx, &record.shasums_url).await?;
    let signature = download(ctx, &record.shasums_signature_url).await?;
    keyring.verify_detached(&sums, &signature)
}

async fn download(ctx: &RegsyncContext, url: &str) -> Result<Vec<u8>> {
    if url.is_empty() {
        return Err(OperationError::Custom("version has no checksums url".into()));
    }
    ctx.remote()
        .download_asset(url)
        .await?
        .ok_or_else(|| OperationError::Custom(format!("{url} not found")))
}

/// Checks that `user` is a (public) member of `org`.
pub async fn verify_github_user(ctx: &RegsyncContext, user: &str, org: &str) -> Step {
    let mut step = Step::new(USER_STEP, Status::NotRun);
    let result = match ctx.remote().check_membership(user, org).await {
        Ok(true) => Ok(()),
        Ok(false) => Err("user is not a member of the organization".to_string()),
        Err(err) => Err(format!("failed to get user: {err}")),
    };
    let member = step.record(format!("User is a member of the organization {org}"), result);
    member.add_remark(MEMBERSHIP_REMARK);

    step.status = if step.did_fail() {
        Status::Failure
    } else {
        Status::Success
    };
    step
}
