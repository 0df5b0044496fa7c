//! Bundle identifier registration and capability management.

use serde_json::json;

use super::args::Args;
use super::{Arguments, ToolContext, ToolDescriptor, ToolResult, enum_prop, string_prop};
use crate::asc::AppStoreConnect;
use crate::asc::bundle_id;
use crate::asc::kinds::{BundleIdPlatform, CapabilityType};
use crate::asc::models::BundleId;
use crate::error::AscError;
use crate::format;

const BUNDLE_REFERENCE: &str =
    "Bundle ID (App Store Connect ID) or bundle identifier (e.g., 'com.example.app')";

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "list_bundle_ids",
            "List all bundle IDs in App Store Connect. Optionally filter by platform or identifier.",
            json!({
                "platform": enum_prop("Optional platform filter", BundleIdPlatform::NAMES),
                "identifier_filter": string_prop("Optional partial match filter for bundle ID (e.g., 'com.example')"),
            }),
            &[],
        ),
        ToolDescriptor::new(
            "register_bundle_id",
            "Register a new bundle ID in App Store Connect. Bundle ID must be in reverse domain notation.",
            json!({
                "identifier": string_prop("Bundle ID in reverse domain notation (e.g., 'com.example.app')"),
                "name": string_prop("Display name for the bundle ID"),
                "platform": enum_prop("Platform for the bundle ID", BundleIdPlatform::NAMES),
            }),
            &["identifier", "name", "platform"],
        ),
        ToolDescriptor::new(
            "get_bundle_id",
            "Get detailed information about a bundle ID including all enabled capabilities. Can use bundle ID or identifier.",
            json!({ "bundle_id": string_prop(BUNDLE_REFERENCE) }),
            &["bundle_id"],
        ),
        ToolDescriptor::new(
            "update_bundle_id_capabilities",
            "Enable capabilities for a bundle ID. Capabilities already enabled will be skipped.",
            json!({
                "bundle_id": string_prop(BUNDLE_REFERENCE),
                "capabilities": {
                    "type": "array",
                    "description": "Array of capability types to enable (e.g., ['PUSH_NOTIFICATIONS', 'ICLOUD'])",
                    "items": { "type": "string", "enum": CapabilityType::NAMES },
                },
            }),
            &["bundle_id", "capabilities"],
        ),
    ]
}

/// A dotted value is an identifier, anything else a server id.
async fn resolve(gateway: &dyn AppStoreConnect, reference: &str) -> Result<BundleId, AscError> {
    if reference.contains('.') {
        gateway.find_bundle_id(reference).await
    } else {
        gateway.get_bundle_id(reference).await
    }
}

fn identifier_matches(bundle: &BundleId, filter: &str) -> bool {
    bundle
        .identifier()
        .is_some_and(|identifier| identifier.to_lowercase().contains(&filter.to_lowercase()))
}

pub async fn list_bundle_ids(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let platform = args.optional_choice::<BundleIdPlatform>("platform")?;
    let filter = args.optional_str("identifier_filter")?;

    let mut bundles = ctx.gateway.list_bundle_ids(platform.as_ref(), filter).await?;
    if let Some(filter) = filter {
        bundles.retain(|bundle| identifier_matches(bundle, filter));
    }
    Ok(ToolResult::text(format::bundle_ids(&bundles)))
}

#[derive(Debug)]
struct Registration<'a> {
    identifier: &'a str,
    name: &'a str,
    platform: BundleIdPlatform,
}

impl<'a> Registration<'a> {
    fn decode(args: &Args<'a>) -> Result<Self, AscError> {
        let identifier = args.required_str("identifier")?;
        let name = args.required_str("name")?;
        let platform = args.required_choice("platform")?;
        bundle_id::validate(identifier)?;
        Ok(Self {
            identifier,
            name,
            platform,
        })
    }
}

pub async fn register_bundle_id(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let request = Registration::decode(&Args::new(arguments))?;

    let bundle = ctx
        .gateway
        .register_bundle_id(request.identifier, request.name, &request.platform)
        .await?;
    tracing::info!(bundle_id = %bundle.id, identifier = %request.identifier, "bundle ID registered");
    Ok(ToolResult::text(format::bundle_id_registered(&bundle)))
}

pub async fn get_bundle_id(ctx: &ToolContext, arguments: &Arguments) -> Result<ToolResult, AscError> {
    let reference = Args::new(arguments).required_str("bundle_id")?;

    let bundle = resolve(ctx.gateway.as_ref(), reference).await?;
    let capabilities = ctx.gateway.list_capabilities(&bundle.id).await?;
    Ok(ToolResult::text(format::bundle_id_details(&bundle, &capabilities)))
}

pub async fn update_bundle_id_capabilities(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let reference = args.required_str("bundle_id")?;
    let requested = args.required_choice_array::<CapabilityType>("capabilities")?;

    let bundle = resolve(ctx.gateway.as_ref(), reference).await?;
    let existing = ctx.gateway.list_capabilities(&bundle.id).await?;

    let mut enabled = Vec::new();
    let mut skipped = Vec::new();
    for capability in requested {
        if enabled.contains(&capability) || skipped.contains(&capability) {
            continue;
        }
        if existing
            .iter()
            .any(|c| c.capability_type() == Some(&capability))
        {
            skipped.push(capability);
            continue;
        }
        ctx.gateway.enable_capability(&bundle.id, &capability).await?;
        tracing::info!(bundle_id = %bundle.id, capability = %capability, "capability enabled");
        enabled.push(capability);
    }

    let all = ctx.gateway.list_capabilities(&bundle.id).await?;
    Ok(ToolResult::text(format::capabilities_updated(
        &bundle, &enabled, &skipped, &all,
    )))
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::asc::models::BundleIdAttributes;

    fn arguments(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => Arguments::new(),
        }
    }

    fn bundle(identifier: &str) -> BundleId {
        BundleId::new(
            "B1",
            "bundleIds",
            BundleIdAttributes {
                identifier: Some(identifier.to_owned()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn identifier_filter_is_case_insensitive() {
        assert!(identifier_matches(&bundle("com.Example.app"), "example"));
        assert!(!identifier_matches(&bundle("com.other.app"), "example"));
    }

    #[test]
    fn registration_validates_identifier_locally() {
        let map = arguments(json!({"identifier": "com", "name": "App", "platform": "IOS"}));
        assert!(matches!(
            Registration::decode(&Args::new(&map)),
            Err(AscError::InvalidBundleId(id)) if id == "com"
        ));

        let map = arguments(json!({"identifier": "com.example.app", "name": "App", "platform": "IOS"}));
        let request = Registration::decode(&Args::new(&map)).unwrap();
        assert_eq!(request.platform, BundleIdPlatform::Ios);
    }
}
