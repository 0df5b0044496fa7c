//! Provisioning profile management.

use std::path::PathBuf;

use serde_json::json;

use super::args::Args;
use super::{
    Arguments, ToolContext, ToolDescriptor, ToolResult, enum_prop, string_array_prop, string_prop,
};
use crate::asc::kinds::ProfileType;
use crate::asc::models::NewProfile;
use crate::error::AscError;
use crate::format;

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "list_profiles",
            "List all provisioning profiles in App Store Connect. Optionally filter by profile type or bundle ID.",
            json!({
                "profile_type": enum_prop("Optional profile type filter", ProfileType::NAMES),
                "bundle_id_filter": string_prop("Optional partial match filter for bundle ID (e.g., 'com.example')"),
            }),
            &[],
        ),
        ToolDescriptor::new(
            "create_profile",
            "Create a new provisioning profile. Development and Ad Hoc profiles require device_ids. App Store profiles do not.",
            json!({
                "name": string_prop("Name for the provisioning profile"),
                "profile_type": enum_prop("Type of provisioning profile to create", ProfileType::NAMES),
                "bundle_id": string_prop("Bundle ID (App Store Connect ID) to associate with this profile"),
                "certificate_ids": string_array_prop("Array of certificate IDs to include in the profile"),
                "device_ids": string_array_prop(
                    "Array of device IDs (required for development and ad hoc profiles, not used for app store profiles)",
                ),
            }),
            &["name", "profile_type", "bundle_id", "certificate_ids"],
        ),
        ToolDescriptor::new(
            "delete_profile",
            "Delete a provisioning profile by ID. This action cannot be undone.",
            json!({ "profile_id": string_prop("Profile ID to delete") }),
            &["profile_id"],
        ),
        ToolDescriptor::new(
            "download_profile",
            "Download a provisioning profile as a .mobileprovision file. The file can be double-clicked to install in Xcode.",
            json!({
                "profile_id": string_prop("Profile ID to download"),
                "output_path": string_prop("Local file path where the .mobileprovision file should be saved"),
            }),
            &["profile_id", "output_path"],
        ),
    ]
}

/// Development and ad hoc types must name at least one device.
fn decode_new_profile(args: &Args<'_>) -> Result<NewProfile, AscError> {
    let name = args.required_str("name")?.to_owned();
    let profile_type = args.required_choice::<ProfileType>("profile_type")?;
    let bundle_id = args.required_str("bundle_id")?.to_owned();
    let certificate_ids = args.required_str_array("certificate_ids")?;
    let device_ids = args.optional_str_array("device_ids")?;

    if profile_type.requires_devices() && device_ids.is_empty() {
        return Err(AscError::invalid_parameter(
            "device_ids",
            format!("{profile_type} profiles require at least one device ID"),
        ));
    }

    Ok(NewProfile {
        name,
        profile_type,
        bundle_id,
        certificate_ids,
        device_ids,
    })
}

pub async fn list_profiles(ctx: &ToolContext, arguments: &Arguments) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let profile_type = args.optional_choice::<ProfileType>("profile_type")?;
    let filter = args.optional_str("bundle_id_filter")?.map(str::to_lowercase);

    let list = ctx.gateway.list_profiles(profile_type.as_ref()).await?;
    let rows: Vec<_> = list
        .profiles
        .iter()
        .map(|profile| (profile, list.bundle_identifier_for(profile)))
        .filter(|(_, identifier)| match &filter {
            None => true,
            Some(filter) => identifier.is_some_and(|i| i.to_lowercase().contains(filter)),
        })
        .collect();
    Ok(ToolResult::text(format::profiles(&rows)))
}

pub async fn create_profile(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let request = decode_new_profile(&Args::new(arguments))?;
    tracing::debug!(name = %request.name, profile_type = %request.profile_type, bundle_id = %request.bundle_id, "creating profile");

    let profile = ctx.gateway.create_profile(&request).await?;
    tracing::info!(profile_id = %profile.id, "profile created");
    Ok(ToolResult::text(format::profile_created(&profile)))
}

pub async fn delete_profile(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let profile_id = Args::new(arguments).required_str("profile_id")?;

    ctx.gateway.delete_profile(profile_id).await?;
    tracing::info!(profile_id = %profile_id, "profile deleted");
    Ok(ToolResult::text(format::profile_deleted(profile_id)))
}

pub async fn download_profile(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let profile_id = args.required_str("profile_id")?;
    let output_path = PathBuf::from(args.required_str("output_path")?);

    let written = ctx.gateway.download_profile(profile_id, &output_path).await?;
    let size = tokio::fs::metadata(&written)
        .await
        .map_err(|e| AscError::io(format!("cannot stat {}", written.display()), e))?
        .len();
    Ok(ToolResult::text(format::profile_downloaded(profile_id, &written, size)))
}
