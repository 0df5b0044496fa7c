//! App and build inspection tools.

use serde_json::json;

use super::args::Args;
use super::{Arguments, ToolContext, ToolDescriptor, ToolResult, string_prop};
use crate::error::AscError;
use crate::format;

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "list_apps",
            "List all apps in App Store Connect. Optionally filter by bundle ID.",
            json!({
                "bundle_id_filter": string_prop("Optional bundle ID filter (e.g., 'com.example.app')"),
            }),
            &[],
        ),
        ToolDescriptor::new(
            "get_app_status",
            "Get detailed status of an app by app ID or bundle ID. Returns app state, version info, and metadata.",
            json!({
                "app_id": string_prop("App Store Connect app ID"),
                "bundle_id": string_prop("App bundle ID (e.g., 'com.example.app')"),
            }),
            &[],
        ),
        ToolDescriptor::new(
            "list_builds",
            "List builds for a specific app. Optionally filter by version number.",
            json!({
                "app_id": string_prop("App Store Connect app ID"),
                "version_filter": string_prop("Optional version filter (e.g., '1.0.0')"),
            }),
            &["app_id"],
        ),
        ToolDescriptor::new(
            "get_latest_build",
            "Get the most recent build for a specific app.",
            json!({ "app_id": string_prop("App Store Connect app ID") }),
            &["app_id"],
        ),
        ToolDescriptor::new(
            "get_upload_status",
            "Check the upload and processing status of builds for an app. Shows the latest build and recent upload history.",
            json!({ "app_id": string_prop("App Store Connect app ID") }),
            &["app_id"],
        ),
    ]
}

/// How `get_app_status` identifies the app. The server id wins when both are given.
#[derive(Debug, PartialEq, Eq)]
enum AppLookup<'a> {
    Id(&'a str),
    BundleId(&'a str),
}

impl<'a> AppLookup<'a> {
    fn decode(args: &Args<'a>) -> Result<Self, AscError> {
        if let Some(id) = args.optional_str("app_id")? {
            return Ok(Self::Id(id));
        }
        match args.optional_str("bundle_id")? {
            Some(bundle_id) => Ok(Self::BundleId(bundle_id)),
            None => Err(AscError::MissingParameter("app_id or bundle_id".to_owned())),
        }
    }
}

pub async fn list_apps(ctx: &ToolContext, arguments: &Arguments) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let filter = args.optional_str("bundle_id_filter")?;

    let apps = ctx.gateway.list_apps(filter).await?;
    Ok(ToolResult::text(format::apps(&apps)))
}

pub async fn get_app_status(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let lookup = AppLookup::decode(&Args::new(arguments))?;

    let app = match lookup {
        AppLookup::Id(id) => ctx.gateway.get_app(id).await?,
        AppLookup::BundleId(bundle_id) => ctx.gateway.find_app_by_bundle_id(bundle_id).await?,
    };
    Ok(ToolResult::text(format::app_status(&app)))
}

pub async fn list_builds(ctx: &ToolContext, arguments: &Arguments) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let app_id = args.required_str("app_id")?;
    let version = args.optional_str("version_filter")?;

    let builds = ctx.gateway.list_builds(app_id, version).await?;
    Ok(ToolResult::text(format::builds(&builds)))
}

pub async fn get_latest_build(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let app_id = Args::new(arguments).required_str("app_id")?;

    let build = ctx.gateway.get_latest_build(app_id).await?;
    Ok(ToolResult::text(format::latest_build(&build)))
}

pub async fn get_upload_status(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let app_id = Args::new(arguments).required_str("app_id")?;

    let builds = ctx.gateway.list_builds(app_id, None).await?;
    Ok(ToolResult::text(format::upload_status(app_id, &builds)))
}
