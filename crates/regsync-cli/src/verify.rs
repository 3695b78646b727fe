use std::{fs, path::PathBuf};

use regsync_operations::{
    error::ErrorContext,
    gpg::key_files,
    verify_key::{run_verification, KeySubmission},
    OperationError, RegsyncContext, Result, VerifyTarget,
};
use tracing::debug;

use crate::utils::write_file;

pub struct VerifyRequest {
    pub namespace: String,
    pub provider: Option<String>,
    pub key_files: Vec<PathBuf>,
    pub username: Option<String>,
    pub output: Option<PathBuf>,
}

pub async fn verify_key(ctx: &RegsyncContext, request: VerifyRequest, json: bool) -> Result<bool> {
    let target = match &request.provider {
        Some(name) => VerifyTarget::Provider {
            namespace: request.namespace.clone(),
            name: name.clone(),
        },
        None => VerifyTarget::Namespace(request.namespace.clone()),
    };

    let paths = if request.key_files.is_empty() {
        key_files(
            &ctx.settings().keys_dir,
            &request.namespace,
            request.provider.as_deref(),
        )?
    } else {
        request.key_files
    };
    let keys = read_keys(&paths)?;
    debug!(count = keys.len(), "loaded keys");

    let report = run_verification(ctx, &keys, &target, request.username.as_deref()).await;

    let json_output = report
        .result
        .to_json()
        .map_err(|err| OperationError::Custom(format!("serializing verification result: {err}")))?;
    if let Some(output) = &request.output {
        write_file(output, &json_output)?;
    }

    if json {
        println!("{json_output}");
    } else {
        print!("{}", report.result.render_markdown());
    }

    Ok(report.is_verified())
}

fn read_keys(paths: &[PathBuf]) -> Result<Vec<KeySubmission>> {
    paths
        .iter()
        .map(|path| {
            let armored = fs::read_to_string(path)
                .with_context(|| format!("reading key file {}", path.display()))?;
            Ok(KeySubmission {
                label: path.display().to_string(),
                armored,
            })
        })
        .collect()
}
