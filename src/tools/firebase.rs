//! Firebase project and app inspection through the Firebase CLI.

use serde_json::json;

use super::args::Args;
use super::{Arguments, ToolContext, ToolDescriptor, ToolResult, enum_prop, string_prop};
use crate::error::AscError;
use crate::format;
use crate::process::firebase::FirebasePlatform;

pub fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "list_firebase_projects",
            "List all Firebase projects you have access to. Shows project names, IDs, numbers, and resource locations.",
            json!({}),
            &[],
        ),
        ToolDescriptor::new(
            "get_firebase_project",
            "Get detailed information about a specific Firebase project, including resources and configuration.",
            json!({ "project_id": string_prop("Firebase project ID (e.g., 'myapp-ios-123abc')") }),
            &["project_id"],
        ),
        ToolDescriptor::new(
            "list_firebase_apps",
            "List all apps (iOS, Android, Web) in a Firebase project. Optionally filter by platform.",
            json!({
                "project_id": string_prop("Firebase project ID"),
                "platform": enum_prop(
                    "Optional platform filter: 'ios', 'android', or 'web'",
                    FirebasePlatform::NAMES,
                ),
            }),
            &["project_id"],
        ),
    ]
}

pub async fn list_firebase_projects(
    ctx: &ToolContext,
    _arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let projects = ctx.firebase.list_projects().await?;
    tracing::info!(count = projects.len(), "Firebase projects listed");
    Ok(ToolResult::text(format::firebase_projects(&projects)))
}

pub async fn get_firebase_project(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let project_id = Args::new(arguments).required_str("project_id")?;

    let project = ctx.firebase.get_project(project_id).await?;
    Ok(ToolResult::text(format::firebase_project(&project)))
}

pub async fn list_firebase_apps(
    ctx: &ToolContext,
    arguments: &Arguments,
) -> Result<ToolResult, AscError> {
    let args = Args::new(arguments);
    let project_id = args.required_str("project_id")?;
    let platform = args.optional_choice::<FirebasePlatform>("platform")?;

    let apps = ctx.firebase.list_apps(project_id, platform).await?;
    tracing::info!(project_id = %project_id, count = apps.len(), "Firebase apps listed");
    Ok(ToolResult::text(format::firebase_apps(project_id, platform, &apps)))
}
