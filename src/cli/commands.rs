//! Command execution for the educloud CLI.
//!
//! Every command resolves to a JSON document printed on stdout.

use serde::Serialize;
use serde_json::{json, Value};

use super::args::{EmailCommand, KeyCommand, SearchCommand, SmsCommand};
use crate::error::{CloudError, CloudResult, ErrorCategory};
use crate::reconcile::{is_local_address, CloudContext, SignatureUpdate};

/// Process exit code for a failed command.
pub fn exit_code(err: &CloudError) -> i32 {
    match err.category() {
        ErrorCategory::Unreachable => 2,
        ErrorCategory::RemoteRejected => 3,
        ErrorCategory::PolicyRejected => 4,
        ErrorCategory::User | ErrorCategory::Storage => 1,
    }
}

/// JSON document describing a failure.
pub fn error_json(err: &CloudError) -> Value {
    json!({
        "error": {
            "code": err.error_code(),
            "category": err.category().as_str(),
            "message": err.user_message(),
            "hint": err.recovery_hint(),
            "retryable": err.is_retryable(),
        }
    })
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

pub async fn run_key(ctx: &CloudContext, command: KeyCommand) -> CloudResult<Value> {
    match command {
        KeyCommand::Verify {
            access_key,
            secret_key,
        } => {
            let verified = ctx.credentials().verify(&access_key, &secret_key).await?;
            Ok(json!({ "verified": true, "profile": to_json(&verified.profile) }))
        }
        KeyCommand::Install {
            access_key,
            secret_key,
        } => {
            let verified = ctx.credentials().install(&access_key, &secret_key).await?;
            Ok(json!({ "installed": true, "profile": to_json(&verified.profile) }))
        }
        KeyCommand::Info => {
            let profile = ctx.bound_credentials().await?.refresh_key_info().await?;
            Ok(to_json(&profile))
        }
        KeyCommand::Bind { host } => {
            if is_local_address(&host) {
                return Err(CloudError::InvalidInput {
                    field: "domain".to_string(),
                    message: format!("{} is a local address and cannot be licensed", host),
                });
            }
            let binding = ctx.bound_credentials().await?.bind_license_domain(&host).await?;
            Ok(to_json(&binding))
        }
    }
}

pub async fn run_sms(ctx: &CloudContext, command: SmsCommand) -> CloudResult<Value> {
    let sms = ctx.messaging().await?;
    match command {
        SmsCommand::Open { name } => Ok(to_json(&sms.open(name.as_deref()).await?)),
        SmsCommand::Close => Ok(to_json(&sms.close().await?)),
        SmsCommand::Sign { name } => match sms.set_signature(&name).await? {
            SignatureUpdate::Applied(status) => Ok(json!({ "applied": true, "status": to_json(&status) })),
            SignatureUpdate::Rejected { current, message } => Ok(json!({
                "applied": false,
                "message": message,
                "status": to_json(&current),
            })),
        },
        SmsCommand::Refresh => Ok(to_json(&sms.refresh().await?)),
        SmsCommand::Apply { name } => {
            sms.apply(&name).await?;
            Ok(json!({ "submitted": true, "name": name }))
        }
        SmsCommand::ApplyStatus => Ok(to_json(&sms.application_status().await?)),
        SmsCommand::Dismiss => {
            sms.dismiss_notice().await?;
            Ok(json!({ "dismissed": true }))
        }
    }
}

pub async fn run_email(ctx: &CloudContext, command: EmailCommand) -> CloudResult<Value> {
    let email = ctx.email().await?;
    let status = match command {
        EmailCommand::Open => email.open().await?,
        EmailCommand::Close => email.close().await?,
        EmailCommand::Sign { sender } => email.set_signature(&sender).await?,
        EmailCommand::Refresh => email.refresh().await?,
    };
    Ok(to_json(&status))
}

pub async fn run_search(ctx: &CloudContext, command: SearchCommand) -> CloudResult<Value> {
    let search = ctx.indexing().await?;
    match command {
        SearchCommand::Status => Ok(to_json(&search.status().await?)),
        SearchCommand::Connection => Ok(json!({ "status": to_json(&search.connection_status().await?) })),
        SearchCommand::Submit { site_url } => Ok(to_json(&search.submit(site_url.as_deref()).await?)),
        SearchCommand::Close => Ok(to_json(&search.close().await?)),
        SearchCommand::Callback { url } => {
            let state = search.accept_callback(&url).await?;
            Ok(json!({ "status": state.as_str() }))
        }
    }
}
