//! Static tool catalog and name-based dispatch.

use super::{
    ToolCall, ToolContext, ToolDescriptor, ToolResult, apps, bundle_ids, certificates, dsyms,
    firebase, profiles, transporter,
};
use crate::error::AscError;

/// Owns the catalog and the shared collaborators. Dispatch holds no per-call state, so calls may
/// run concurrently.
pub struct Dispatcher {
    ctx: ToolContext,
    catalog: Vec<ToolDescriptor>,
}

impl Dispatcher {
    pub fn new(ctx: ToolContext) -> Self {
        let catalog = [
            apps::descriptors(),
            dsyms::descriptors(),
            firebase::descriptors(),
            transporter::descriptors(),
            certificates::descriptors(),
            bundle_ids::descriptors(),
            profiles::descriptors(),
        ]
        .into_iter()
        .flatten()
        .collect();
        Self { ctx, catalog }
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        &self.catalog
    }

    pub async fn dispatch(&self, call: ToolCall) -> Result<ToolResult, AscError> {
        let ctx = &self.ctx;
        let args = &call.arguments;
        tracing::debug!(tool = %call.name, "handling tool call");

        let result = match call.name.as_str() {
            "list_apps" => apps::list_apps(ctx, args).await,
            "get_app_status" => apps::get_app_status(ctx, args).await,
            "list_builds" => apps::list_builds(ctx, args).await,
            "get_latest_build" => apps::get_latest_build(ctx, args).await,
            "get_upload_status" => apps::get_upload_status(ctx, args).await,
            "download_dsyms" => dsyms::download_dsyms(ctx, args).await,
            "upload_dsyms_to_firebase" => dsyms::upload_dsyms_to_firebase(ctx, args).await,
            "find_xcode_archives" => dsyms::find_xcode_archives(ctx, args).await,
            "list_firebase_projects" => firebase::list_firebase_projects(ctx, args).await,
            "get_firebase_project" => firebase::get_firebase_project(ctx, args).await,
            "list_firebase_apps" => firebase::list_firebase_apps(ctx, args).await,
            "upload_build" => transporter::upload_build(ctx, args).await,
            "validate_build" => transporter::validate_build(ctx, args).await,
            "list_certificates" => certificates::list_certificates(ctx, args).await,
            "create_certificate" => certificates::create_certificate(ctx, args).await,
            "revoke_certificate" => certificates::revoke_certificate(ctx, args).await,
            "download_certificate" => certificates::download_certificate(ctx, args).await,
            "list_bundle_ids" => bundle_ids::list_bundle_ids(ctx, args).await,
            "register_bundle_id" => bundle_ids::register_bundle_id(ctx, args).await,
            "get_bundle_id" => bundle_ids::get_bundle_id(ctx, args).await,
            "update_bundle_id_capabilities" => {
                bundle_ids::update_bundle_id_capabilities(ctx, args).await
            }
            "list_profiles" => profiles::list_profiles(ctx, args).await,
            "create_profile" => profiles::create_profile(ctx, args).await,
            "delete_profile" => profiles::delete_profile(ctx, args).await,
            "download_profile" => profiles::download_profile(ctx, args).await,
            _ => Err(AscError::UnknownTool(call.name.clone())),
        };

        match &result {
            Ok(outcome) if outcome.is_error => {
                tracing::warn!(tool = %call.name, "tool reported a failure");
            }
            Ok(_) => tracing::debug!(tool = %call.name, "tool call completed"),
            Err(e) if e.is_input_error() => {
                tracing::warn!(tool = %call.name, error = %e, "tool call rejected");
            }
            Err(e) => tracing::error!(tool = %call.name, error = %e, "tool call failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn names() -> Vec<&'static str> {
        [
            apps::descriptors(),
            dsyms::descriptors(),
            firebase::descriptors(),
            transporter::descriptors(),
            certificates::descriptors(),
            bundle_ids::descriptors(),
            profiles::descriptors(),
        ]
        .into_iter()
        .flatten()
        .map(|d| d.name)
        .collect()
    }

    #[test]
    fn catalog_names_are_unique() {
        let names = names();
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(names.len(), 25);
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn required_fields_are_declared_properties() {
        for descriptor in [apps::descriptors(), profiles::descriptors(), dsyms::descriptors()]
            .into_iter()
            .flatten()
        {
            let properties = descriptor.input_schema["properties"]
                .as_object()
                .unwrap();
            for required in descriptor.input_schema["required"].as_array().unwrap() {
                assert!(
                    properties.contains_key(required.as_str().unwrap()),
                    "{} requires undeclared {required}",
                    descriptor.name
                );
            }
        }
    }
}
