//! Binary upload and validation through iTMSTransporter.

use std::path::PathBuf;

use serde_json::json;

use super::args::Args;
use super::{Arguments, ToolContext, ToolDescriptor, ToolResult, enum_prop, string_prop};
use crate::error::AscError;
use crate::format;
use crate::process::transporter::UploadPlatform;

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "upload_build",
            "Upload an IPA file to App Store Connect using xcrun iTMSTransporter. Requires ASC_KEY_ID and ASC_ISSUER_ID environment variables.",
            json!({
                "ipa_path": string_prop("Absolute path to the .ipa file to upload"),
                "platform": enum_prop("Platform type (default: ios)", UploadPlatform::NAMES),
            }),
            &["ipa_path"],
        ),
        ToolDescriptor::new(
            "validate_build",
            "Validate an IPA file before uploading to App Store Connect. Checks for common issues and signing problems.",
            json!({ "ipa_path": string_prop("Absolute path to the .ipa file to validate") }),
            &["ipa_path"],
        ),
    ]
}

pub async fn upload_build(ctx: &ToolContext, arguments: &Arguments) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let ipa_path = PathBuf::from(args.required_str("ipa_path")?);
    let platform = args
        .optional_choice::<UploadPlatform>("platform")?
        .unwrap_or_default();

    let output = ctx.transporter.upload(&ipa_path, platform).await?;
    Ok(ToolResult::text(format::build_uploaded(&ipa_path, platform, &output)))
}

/// Anything the transporter step reports, file pre-checks included, becomes an error-flagged
/// report. Only a missing `ipa_path` argument is a hard failure.
pub async fn validate_build(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let ipa_path = PathBuf::from(Args::new(arguments).required_str("ipa_path")?);

    match ctx.transporter.validate(&ipa_path).await {
        Ok(output) => Ok(ToolResult::text(format::build_validated(&ipa_path, &output))),
        Err(e) => {
            tracing::error!(ipa = %ipa_path.display(), error = %e, "build validation failed");
            Ok(ToolResult::error_text(format::build_validation_failed(&ipa_path, &e)))
        }
    }
}
