//! Signing certificate management.

use std::path::PathBuf;

use serde_json::json;

use super::args::Args;
use super::{Arguments, ToolContext, ToolDescriptor, ToolResult, enum_prop, string_prop};
use crate::asc::kinds::CertificateType;
use crate::error::AscError;
use crate::format;

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "list_certificates",
            "List all certificates in App Store Connect. Optionally filter by certificate type.",
            json!({
                "certificate_type": enum_prop(
                    "Optional certificate type filter (e.g., 'IOS_DEVELOPMENT', 'IOS_DISTRIBUTION', 'DEVELOPER_ID_APPLICATION')",
                    CertificateType::NAMES,
                ),
            }),
            &[],
        ),
        ToolDescriptor::new(
            "create_certificate",
            "Create a new certificate in App Store Connect using a Certificate Signing Request (CSR).",
            json!({
                "certificate_type": enum_prop("Type of certificate to create", CertificateType::NAMES),
                "csr_content": string_prop("Base64-encoded CSR content"),
            }),
            &["certificate_type", "csr_content"],
        ),
        ToolDescriptor::new(
            "revoke_certificate",
            "Revoke a certificate by ID. This permanently disables the certificate and it cannot be used for code signing.",
            json!({ "certificate_id": string_prop("Certificate ID to revoke") }),
            &["certificate_id"],
        ),
        ToolDescriptor::new(
            "download_certificate",
            "Download a certificate as a .cer file to the specified output path.",
            json!({
                "certificate_id": string_prop("Certificate ID to download"),
                "output_path": string_prop("Local file path where the .cer file should be saved"),
            }),
            &["certificate_id", "output_path"],
        ),
    ]
}

#[derive(Debug)]
struct NewCertificate<'a> {
    certificate_type: CertificateType,
    csr_content: &'a str,
}

impl<'a> NewCertificate<'a> {
    fn decode(args: &Args<'a>) -> Result<Self, AscError> {
        let certificate_type = args
            .required_choice::<CertificateType>("certificate_type")
            .map_err(|e| match e {
                AscError::InvalidParameter { reason, .. } => AscError::InvalidCertificateType(reason),
                other => other,
            })?;
        let csr_content = args.required_str("csr_content")?;
        Ok(Self {
            certificate_type,
            csr_content,
        })
    }
}

pub async fn list_certificates(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let certificate_type = Args::new(arguments).optional_choice::<CertificateType>("certificate_type")?;

    let certificates = ctx
        .gateway
        .list_certificates(certificate_type.as_ref())
        .await?;
    Ok(ToolResult::text(format::certificates(&certificates, ctx.now())))
}

pub async fn create_certificate(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let request = NewCertificate::decode(&Args::new(arguments))?;

    let certificate = ctx
        .gateway
        .create_certificate(request.csr_content, &request.certificate_type)
        .await?;
    tracing::info!(certificate_id = %certificate.id, certificate_type = %request.certificate_type, "certificate created");
    Ok(ToolResult::text(format::certificate_created(&certificate)))
}

pub async fn revoke_certificate(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let certificate_id = Args::new(arguments).required_str("certificate_id")?;

    let certificate = ctx.gateway.get_certificate(certificate_id).await?;
    ctx.gateway.revoke_certificate(certificate_id).await?;
    tracing::info!(certificate_id = %certificate_id, "certificate revoked");
    Ok(ToolResult::text(format::certificate_revoked(&certificate)))
}

pub async fn download_certificate(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let certificate_id = args.required_str("certificate_id")?;
    let output_path = PathBuf::from(args.required_str("output_path")?);

    let written = ctx
        .gateway
        .download_certificate(certificate_id, &output_path)
        .await?;
    let size = tokio::fs::metadata(&written)
        .await
        .map_err(|e| AscError::io(format!("cannot stat {}", written.display()), e))?
        .len();
    Ok(ToolResult::text(format::certificate_downloaded(
        certificate_id,
        &written,
        size,
    )))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    fn arguments(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => Arguments::new(),
        }
    }

    #[test]
    fn unknown_certificate_type_is_its_own_error() {
        let map = arguments(json!({"certificate_type": "ios_development", "csr_content": "abc"}));
        match NewCertificate::decode(&Args::new(&map)) {
            Err(AscError::InvalidCertificateType(reason)) => {
                assert!(reason.contains("IOS_DEVELOPMENT"), "{reason}");
            }
            other => panic!("expected InvalidCertificateType, got {other:?}"),
        }
    }

    #[test]
    fn missing_certificate_type_stays_missing() {
        let map = arguments(json!({"csr_content": "abc"}));
        assert!(matches!(
            NewCertificate::decode(&Args::new(&map)),
            Err(AscError::MissingParameter(p)) if p == "certificate_type"
        ));
    }
}
