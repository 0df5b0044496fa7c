//! Text rendering of tool results.
//!
//! Every function here is pure: same input, same text. Anything time-dependent takes `now`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::archives::ArchiveRecord;
use crate::asc::kinds::{CapabilityType, ProcessingState};
use crate::asc::models::{App, Build, BundleId, BundleIdCapability, Certificate, Profile};
use crate::error::AscError;
use crate::process::ProcessOutput;
use crate::process::firebase::{FirebaseApp, FirebasePlatform, FirebaseProject};
use crate::process::transporter::UploadPlatform;

const UNKNOWN: &str = "Unknown";

// --- helpers ---

fn iso(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn medium_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn medium_date_time(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y at %-I:%M %p").to_string()
}

fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn kilobytes(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

/// Left-aligned fixed-width cell. Values that would fill the whole width are cut to leave one
/// trailing space and end in `...`.
pub fn cell(value: &str, width: usize) -> String {
    let len = value.chars().count();
    let fitted = if len >= width && width > 4 {
        let kept: String = value.chars().take(width - 4).collect();
        format!("{kept}...")
    } else {
        value.to_owned()
    };
    format!("{fitted:<width$}")
}

fn row(cells: &[(&str, usize)], last: &str) -> String {
    let mut line: String = cells.iter().map(|(value, width)| cell(value, *width) + " ").collect();
    line.push_str(last);
    line.trim_end().to_owned()
}

fn rule(width: usize) -> String {
    "-".repeat(width)
}

fn join(lines: Vec<String>) -> String {
    lines.join("\n")
}

fn state_of(build: &Build) -> String {
    build
        .processing_state()
        .map(|s| s.to_string())
        .unwrap_or_else(|| UNKNOWN.to_owned())
}

// --- apps & builds ---

pub fn apps(apps: &[App]) -> String {
    let mut lines = vec![format!("Found {} app(s)", apps.len()), String::new()];
    if apps.is_empty() {
        lines.push("No apps found.".to_owned());
    }
    for app in apps {
        let attrs = app.attrs().cloned().unwrap_or_default();
        lines.push(format!("App: {}", attrs.name.as_deref().unwrap_or(UNKNOWN)));
        lines.push(format!("  ID: {}", app.id));
        lines.push(format!("  Bundle ID: {}", attrs.bundle_id.as_deref().unwrap_or(UNKNOWN)));
        lines.push(format!("  SKU: {}", attrs.sku.as_deref().unwrap_or(UNKNOWN)));
        lines.push(String::new());
    }
    join(lines)
}

pub fn app_status(app: &App) -> String {
    let attrs = app.attrs().cloned().unwrap_or_default();
    let mut lines = vec![
        "App Status".to_owned(),
        "==========".to_owned(),
        String::new(),
        format!("Name: {}", attrs.name.as_deref().unwrap_or(UNKNOWN)),
        format!("ID: {}", app.id),
        format!("Bundle ID: {}", attrs.bundle_id.as_deref().unwrap_or(UNKNOWN)),
        format!("SKU: {}", attrs.sku.as_deref().unwrap_or(UNKNOWN)),
        format!("Primary Locale: {}", attrs.primary_locale.as_deref().unwrap_or(UNKNOWN)),
    ];
    if let Some(rights) = attrs.content_rights_declaration {
        lines.push(format!("Content Rights: {rights}"));
    }
    join(lines)
}

fn build_info(build: &Build) -> Vec<String> {
    let attrs = build.attrs().cloned().unwrap_or_default();
    let mut lines = vec![
        format!("Version: {}", attrs.version.as_deref().unwrap_or(UNKNOWN)),
        format!("ID: {}", build.id),
        format!("Processing State: {}", state_of(build)),
    ];
    if let Some(uploaded) = attrs.uploaded_date {
        lines.push(format!("Uploaded: {}", iso(uploaded)));
    }
    if let Some(expires) = attrs.expiration_date {
        lines.push(format!("Expires: {}", iso(expires)));
    }
    if let Some(expired) = attrs.expired {
        lines.push(format!("Expired: {}", yes_no(expired)));
    }
    lines
}

pub fn builds(builds: &[Build]) -> String {
    let mut lines = vec![format!("Found {} build(s)", builds.len()), String::new()];
    if builds.is_empty() {
        lines.push("No builds found.".to_owned());
    }
    for build in builds {
        lines.push(format!("Build: {}", build.version().unwrap_or(UNKNOWN)));
        lines.extend(build_info(build).into_iter().map(|line| format!("  {line}")));
        lines.push(String::new());
    }
    join(lines)
}

pub fn latest_build(build: &Build) -> String {
    let mut lines = vec!["Latest Build".to_owned(), "============".to_owned(), String::new()];
    lines.extend(build_info(build));
    if let Some(attrs) = build.attrs() {
        if let Some(min_os) = &attrs.min_os_version {
            lines.push(format!("Min OS Version: {min_os}"));
        }
        if let Some(encryption) = attrs.uses_non_exempt_encryption {
            lines.push(format!("Uses Non-Exempt Encryption: {}", yes_no(encryption)));
        }
    }
    join(lines)
}

/// `builds` must already be ordered newest first.
pub fn upload_status(app_id: &str, builds: &[Build]) -> String {
    let Some((latest, older)) = builds.split_first() else {
        return format!(
            "No builds found for app ID: {app_id}\n\n\
             If you just uploaded a build, it may take a few minutes to appear."
        );
    };

    let mut lines = vec!["Latest Build Status".to_owned(), String::new()];
    lines.extend(build_info(latest));

    if let Some(state) = latest.processing_state() {
        lines.push(String::new());
        lines.push(match state {
            ProcessingState::Processing => {
                "The build is currently being processed. This typically takes 10-30 minutes."
                    .to_owned()
            }
            ProcessingState::Valid => {
                "The build has been processed successfully and is ready for testing.".to_owned()
            }
            ProcessingState::Invalid => "The build processing failed. Check the build details \
                                         in App Store Connect for errors."
                .to_owned(),
            other => format!("Processing state: {other}"),
        });
    }

    if !older.is_empty() {
        lines.push(String::new());
        lines.push("Recent Builds: (showing last 5)".to_owned());
        lines.push(String::new());
        for build in older.iter().take(4) {
            let version = build.version().unwrap_or(UNKNOWN);
            match build.uploaded_date() {
                Some(uploaded) => lines.push(format!(
                    "- {version} - {} - Uploaded: {}",
                    state_of(build),
                    medium_date_time(uploaded)
                )),
                None => lines.push(format!("- {version} - {}", state_of(build))),
            }
        }
    }
    join(lines)
}

// --- dSYMs & archives ---

fn file_names(files: &[PathBuf]) -> impl Iterator<Item = String> + '_ {
    files.iter().map(|f| {
        f.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| f.display().to_string())
    })
}

pub fn dsyms_downloaded(
    build_id: &str,
    version: Option<&str>,
    directory: &Path,
    files: &[PathBuf],
) -> String {
    let mut lines = vec![
        "✓ dSYMs Downloaded Successfully".to_owned(),
        String::new(),
        format!("Build ID: {build_id}"),
    ];
    if let Some(version) = version {
        lines.push(format!("Build Version: {version}"));
    }
    lines.push(format!("dSYM Directory: {}", directory.display()));
    lines.push(String::new());
    lines.push(format!("Downloaded {} dSYM file(s):", files.len()));
    lines.extend(file_names(files).map(|name| format!("  - {name}")));
    lines.push(String::new());
    lines.push("The dSYM files are ready to use for crash symbolication.".to_owned());
    lines.push(
        "You can now upload them to Firebase Crashlytics or use them with crash analysis tools."
            .to_owned(),
    );
    join(lines)
}

pub fn dsyms_uploaded_to_firebase(
    firebase_app_id: &str,
    directory: &Path,
    files: &[PathBuf],
    output: &ProcessOutput,
) -> String {
    let mut lines = vec![
        "✓ dSYMs Uploaded to Firebase Successfully".to_owned(),
        String::new(),
        format!("Firebase App ID: {firebase_app_id}"),
        format!("dSYM Directory: {}", directory.display()),
        String::new(),
        format!("Uploaded {} dSYM file(s):", files.len()),
    ];
    lines.extend(file_names(files).map(|name| format!("  - {name}")));
    lines.push(String::new());
    lines.push("Firebase CLI Output:".to_owned());
    lines.push(output.stdout.trim_end().to_owned());
    if !output.stderr.trim().is_empty() {
        lines.push(String::new());
        lines.push("Warnings/Info:".to_owned());
        lines.push(output.stderr.trim_end().to_owned());
    }
    lines.push(String::new());
    lines.push(
        "The symbols are now available in Firebase Crashlytics for crash symbolication.".to_owned(),
    );
    join(lines)
}

/// Archives with the number of `.dSYM` entries found in each, if its dSYMs folder was readable.
pub fn archives(archives: &[(ArchiveRecord, Option<usize>)]) -> String {
    let mut lines = vec![format!("Found {} Xcode archive(s)", archives.len()), String::new()];
    if archives.is_empty() {
        lines.push("No Xcode archives found matching the criteria.".to_owned());
    }
    for (archive, dsyms) in archives {
        lines.push(format!("Archive: {}", archive.name));
        lines.push(format!("  Bundle ID: {}", archive.bundle_id));
        lines.push(format!("  Version: {} ({})", archive.version, archive.build_number));
        lines.push(format!("  Created: {}", iso(archive.created)));
        lines.push(format!("  Path: {}", archive.path.display()));
        match dsyms {
            Some(count) => lines.push(format!("  dSYMs: {count} file(s)")),
            None => lines.push("  dSYMs: Not available".to_owned()),
        }
        lines.push(String::new());
    }
    join(lines)
}

// --- certificates ---

fn certificate_status(certificate: &Certificate, now: DateTime<Utc>) -> &'static str {
    let attrs = certificate.attrs();
    if !attrs.and_then(|a| a.activated).unwrap_or(false) {
        "INACTIVE"
    } else if attrs
        .and_then(|a| a.expiration_date)
        .is_some_and(|expires| expires < now)
    {
        "EXPIRED"
    } else {
        "ACTIVE"
    }
}

fn certificate_name(certificate: &Certificate) -> &str {
    certificate
        .attrs()
        .and_then(|a| a.display_name.as_deref().or(a.name.as_deref()))
        .unwrap_or(UNKNOWN)
}

fn certificate_type(certificate: &Certificate) -> String {
    certificate
        .attrs()
        .and_then(|a| a.certificate_type.as_ref())
        .map(|t| t.to_string())
        .unwrap_or_else(|| UNKNOWN.to_owned())
}

pub fn certificates(certificates: &[Certificate], now: DateTime<Utc>) -> String {
    let mut lines = vec![
        format!("Found {} certificate(s)", certificates.len()),
        String::new(),
    ];
    if certificates.is_empty() {
        lines.push("No certificates found.".to_owned());
        return join(lines);
    }

    lines.push(rule(100));
    lines.push(row(
        &[("NAME", 30), ("TYPE", 25), ("EXPIRES", 20), ("STATUS", 15)],
        "ID",
    ));
    lines.push(rule(100));
    for certificate in certificates {
        let expires = certificate
            .attrs()
            .and_then(|a| a.expiration_date)
            .map(medium_date)
            .unwrap_or_else(|| "N/A".to_owned());
        lines.push(row(
            &[
                (certificate_name(certificate), 30),
                (certificate_type(certificate).as_str(), 25),
                (expires.as_str(), 20),
                (certificate_status(certificate, now), 15),
            ],
            &certificate.id,
        ));
    }
    lines.push(rule(100));
    join(lines)
}

pub fn certificate_created(certificate: &Certificate) -> String {
    let mut lines = vec![
        "Certificate created successfully!".to_owned(),
        String::new(),
        format!("Certificate ID: {}", certificate.id),
    ];
    if let Some(attrs) = certificate.attrs() {
        if let Some(kind) = &attrs.certificate_type {
            lines.push(format!("Type: {kind}"));
        }
        if let Some(name) = &attrs.display_name {
            lines.push(format!("Display Name: {name}"));
        }
        if let Some(expires) = attrs.expiration_date {
            lines.push(format!("Expiration Date: {}", medium_date(expires)));
        }
        if let Some(serial) = &attrs.serial_number {
            lines.push(format!("Serial Number: {serial}"));
        }
        if let Some(platform) = &attrs.platform {
            lines.push(format!("Platform: {platform}"));
        }
    }
    lines.push(String::new());
    lines.push("Use 'download_certificate' to download the .cer file".to_owned());
    join(lines)
}

pub fn certificate_revoked(certificate: &Certificate) -> String {
    join(vec![
        "Certificate revoked successfully!".to_owned(),
        String::new(),
        format!("Certificate ID: {}", certificate.id),
        format!("Name: {}", certificate_name(certificate)),
        format!("Type: {}", certificate_type(certificate)),
        String::new(),
        "Note: This certificate has been permanently revoked and can no longer be used for code \
         signing."
            .to_owned(),
    ])
}

pub fn certificate_downloaded(certificate_id: &str, path: &Path, size: u64) -> String {
    join(vec![
        "Certificate downloaded successfully!".to_owned(),
        String::new(),
        format!("Certificate ID: {certificate_id}"),
        format!("Downloaded to: {}", path.display()),
        format!("File size: {}", kilobytes(size)),
        String::new(),
        "To install the certificate:".to_owned(),
        "  1. Double-click the .cer file to open Keychain Access".to_owned(),
        "  2. The certificate will be added to your login keychain".to_owned(),
        "  3. Move it to the System keychain if needed for code signing".to_owned(),
    ])
}

// --- bundle ids ---

fn bundle_header(bundle: &BundleId) -> Vec<String> {
    let attrs = bundle.attrs().cloned().unwrap_or_default();
    let mut lines = vec![
        format!("ID: {}", bundle.id),
        format!("Identifier: {}", attrs.identifier.as_deref().unwrap_or(UNKNOWN)),
        format!("Name: {}", attrs.name.as_deref().unwrap_or(UNKNOWN)),
        format!(
            "Platform: {}",
            attrs.platform.map(|p| p.to_string()).as_deref().unwrap_or(UNKNOWN)
        ),
    ];
    if let Some(seed) = attrs.seed_id {
        lines.push(format!("Seed ID: {seed}"));
    }
    lines
}

pub fn bundle_ids(bundles: &[BundleId]) -> String {
    let mut lines = vec![format!("Found {} bundle ID(s)", bundles.len()), String::new()];
    if bundles.is_empty() {
        lines.push("No bundle IDs found matching the criteria.".to_owned());
        return join(lines);
    }

    lines.push(row(&[("Identifier", 40), ("Name", 30), ("Platform", 12)], "ID"));
    lines.push(rule(100));
    for bundle in bundles {
        let attrs = bundle.attrs().cloned().unwrap_or_default();
        let platform = attrs.platform.map(|p| p.to_string());
        lines.push(row(
            &[
                (attrs.identifier.as_deref().unwrap_or(UNKNOWN), 40),
                (attrs.name.as_deref().unwrap_or(UNKNOWN), 30),
                (platform.as_deref().unwrap_or(UNKNOWN), 12),
            ],
            &bundle.id,
        ));
    }
    join(lines)
}

pub fn bundle_id_registered(bundle: &BundleId) -> String {
    let mut lines = vec![
        "Successfully Registered Bundle ID".to_owned(),
        "================================".to_owned(),
        String::new(),
    ];
    lines.extend(bundle_header(bundle));
    join(lines)
}

pub fn bundle_id_details(bundle: &BundleId, capabilities: &[BundleIdCapability]) -> String {
    let mut lines = vec![
        "Bundle ID Details".to_owned(),
        "=================".to_owned(),
        String::new(),
    ];
    lines.extend(bundle_header(bundle));
    lines.push(String::new());
    lines.push(format!("Capabilities ({}):", capabilities.len()));
    lines.push("-------------".to_owned());
    if capabilities.is_empty() {
        lines.push("No capabilities enabled".to_owned());
    }
    for capability in capabilities {
        if let Some(kind) = capability.capability_type() {
            lines.push(format!("  - {kind}"));
        }
    }
    join(lines)
}

pub fn capabilities_updated(
    bundle: &BundleId,
    enabled: &[CapabilityType],
    skipped: &[CapabilityType],
    all: &[BundleIdCapability],
) -> String {
    let attrs = bundle.attrs().cloned().unwrap_or_default();
    let mut lines = vec![
        "Bundle ID Capabilities Updated".to_owned(),
        "==============================".to_owned(),
        String::new(),
        format!("Bundle ID: {}", attrs.identifier.as_deref().unwrap_or(UNKNOWN)),
        format!("Name: {}", attrs.name.as_deref().unwrap_or(UNKNOWN)),
        String::new(),
    ];
    if !enabled.is_empty() {
        lines.push(format!("Newly Enabled Capabilities ({}):", enabled.len()));
        lines.extend(enabled.iter().map(|c| format!("  ✓ {c}")));
        lines.push(String::new());
    }
    if !skipped.is_empty() {
        lines.push(format!("Already Enabled (skipped {}):", skipped.len()));
        lines.extend(skipped.iter().map(|c| format!("  - {c}")));
        lines.push(String::new());
    }
    lines.push(format!("Total Capabilities Enabled: {}", all.len()));
    lines.extend(
        all.iter()
            .filter_map(|c| c.capability_type())
            .map(|c| format!("  • {c}")),
    );
    join(lines)
}

// --- profiles ---

/// Profiles with their resolved bundle identifier, `None` when unresolved.
pub fn profiles(rows: &[(&Profile, Option<&str>)]) -> String {
    let mut lines = vec![
        format!("Found {} provisioning profile(s)", rows.len()),
        String::new(),
    ];
    if rows.is_empty() {
        lines.push("No profiles found matching the criteria.".to_owned());
        return join(lines);
    }

    lines.push(row(
        &[("Name", 40), ("Type", 25), ("Status", 10), ("Bundle ID", 30)],
        "",
    ));
    lines.push(rule(110));
    for (profile, bundle_identifier) in rows {
        let attrs = profile.attrs().cloned().unwrap_or_default();
        let kind = attrs.profile_type.map(|t| t.to_string());
        lines.push(row(
            &[
                (attrs.name.as_deref().unwrap_or(UNKNOWN), 40),
                (kind.as_deref().unwrap_or(UNKNOWN), 25),
                (attrs.profile_state.as_deref().unwrap_or(UNKNOWN), 10),
                (bundle_identifier.unwrap_or(UNKNOWN), 30),
            ],
            "",
        ));
        if let Some(expires) = attrs.expiration_date {
            lines.push(format!("  Expiration: {}", medium_date(expires)));
        }
        lines.push(format!("  ID: {}", profile.id));
        lines.push(String::new());
    }
    join(lines)
}

pub fn profile_created(profile: &Profile) -> String {
    let attrs = profile.attrs().cloned().unwrap_or_default();
    let mut lines = vec![
        "✓ Profile Created Successfully".to_owned(),
        String::new(),
        "Profile Details:".to_owned(),
        format!("  Name: {}", attrs.name.as_deref().unwrap_or(UNKNOWN)),
        format!("  ID: {}", profile.id),
        format!(
            "  Type: {}",
            attrs.profile_type.map(|t| t.to_string()).as_deref().unwrap_or(UNKNOWN)
        ),
        format!("  Status: {}", attrs.profile_state.as_deref().unwrap_or(UNKNOWN)),
    ];
    if let Some(expires) = attrs.expiration_date {
        lines.push(format!("  Expiration: {}", medium_date(expires)));
    }
    if let Some(uuid) = attrs.uuid {
        lines.push(format!("  UUID: {uuid}"));
    }
    lines.push(String::new());
    lines.push(
        "The profile has been created and is ready to use. Download it using the \
         download_profile tool."
            .to_owned(),
    );
    join(lines)
}

pub fn profile_deleted(profile_id: &str) -> String {
    join(vec![
        "✓ Profile Deleted Successfully".to_owned(),
        String::new(),
        format!("Profile ID: {profile_id}"),
        String::new(),
        "The provisioning profile has been permanently deleted from App Store Connect.".to_owned(),
        "Any apps signed with this profile will need to be re-signed with a different profile."
            .to_owned(),
    ])
}

pub fn profile_downloaded(profile_id: &str, path: &Path, size: u64) -> String {
    join(vec![
        "✓ Profile Downloaded Successfully".to_owned(),
        String::new(),
        format!("Profile ID: {profile_id}"),
        format!("File Path: {}", path.display()),
        format!("File Size: {}", kilobytes(size)),
        String::new(),
        "Installation Instructions:".to_owned(),
        "  1. Double-click the .mobileprovision file to install it in Xcode".to_owned(),
        "  2. Or manually copy it to ~/Library/MobileDevice/Provisioning Profiles/".to_owned(),
        "  3. The profile will appear in Xcode's signing settings".to_owned(),
        String::new(),
        "The provisioning profile is ready to use for code signing.".to_owned(),
    ])
}

// --- firebase ---

pub fn firebase_projects(projects: &[FirebaseProject]) -> String {
    let mut lines = vec!["Firebase Projects".to_owned(), "=".repeat(80), String::new()];
    if projects.is_empty() {
        lines.push("No Firebase projects found.".to_owned());
        lines.push(String::new());
        lines.push("Ensure you have access to at least one Firebase project.".to_owned());
    } else {
        let mut sorted: Vec<&FirebaseProject> = projects.iter().collect();
        sorted.sort_by(|a, b| a.display_name.cmp(&b.display_name));

        let name_width = sorted.iter().map(|p| p.display_name.chars().count()).max().unwrap_or(0).max(12);
        let id_width = sorted.iter().map(|p| p.project_id.chars().count()).max().unwrap_or(0).max(10);
        let number_width = sorted
            .iter()
            .map(|p| p.project_number.chars().count())
            .max()
            .unwrap_or(0)
            .max(14);

        lines.push(format!("Found {} project(s):", projects.len()));
        lines.push(String::new());
        lines.push(format!(
            "{:<name_width$} | {:<id_width$} | {:<number_width$} | Resource Location",
            "Display Name", "Project ID", "Project Number"
        ));
        lines.push(rule(80));
        for project in sorted {
            let location = project
                .resources
                .as_ref()
                .and_then(|r| r.location_id.as_deref())
                .unwrap_or("N/A");
            lines.push(format!(
                "{:<name_width$} | {:<id_width$} | {:<number_width$} | {location}",
                project.display_name, project.project_id, project.project_number
            ));
        }
    }
    lines.push(String::new());
    lines.push("To get details on a specific project, use: get_firebase_project".to_owned());
    join(lines)
}

pub fn firebase_project(project: &FirebaseProject) -> String {
    let mut lines = vec![
        "Firebase Project Details".to_owned(),
        "=".repeat(80),
        String::new(),
        format!("Display Name:     {}", project.display_name),
        format!("Project ID:       {}", project.project_id),
        format!("Project Number:   {}", project.project_number),
        format!("Name:             {}", project.name),
    ];
    if let Some(state) = &project.state {
        lines.push(format!("State:            {state}"));
    }
    lines.push(String::new());
    lines.push("Resources:".to_owned());
    match &project.resources {
        Some(resources) => {
            let entries = [
                ("Location ID:      ", &resources.location_id),
                ("Hosting Site:     ", &resources.hosting_site),
                ("Storage Bucket:   ", &resources.storage_bucket),
                ("Database Instance:", &resources.realtime_database_instance),
            ];
            for (label, value) in entries {
                if let Some(value) = value {
                    lines.push(format!("  {label}     {value}"));
                }
            }
        }
        None => lines.push("  No resources configured".to_owned()),
    }
    lines.push(String::new());
    lines.push("To list apps in this project, use: list_firebase_apps".to_owned());
    join(lines)
}

pub fn firebase_apps(
    project_id: &str,
    platform: Option<FirebasePlatform>,
    apps: &[FirebaseApp],
) -> String {
    let mut lines = vec![
        format!("Firebase Apps in Project: {project_id}"),
        "=".repeat(80),
        String::new(),
    ];
    if apps.is_empty() {
        lines.push("No apps found in this project.".to_owned());
        if let Some(platform) = platform {
            lines.push(format!("(Filter: {} apps only)", platform.as_str()));
        }
        return join(lines);
    }

    let filter_note = platform
        .map(|p| format!(" ({} apps only)", p.as_str()))
        .unwrap_or_default();
    lines.push(format!("Found {} app(s){filter_note}:", apps.len()));
    lines.push(String::new());

    for (wire, title) in [("IOS", "iOS Apps"), ("ANDROID", "Android Apps"), ("WEB", "Web Apps")] {
        let mut group: Vec<&FirebaseApp> = apps.iter().filter(|a| a.platform == wire).collect();
        if group.is_empty() {
            continue;
        }
        group.sort_by(|a, b| {
            a.display_name
                .as_deref()
                .unwrap_or_default()
                .cmp(b.display_name.as_deref().unwrap_or_default())
        });

        lines.push(format!("{title} ({}):", group.len()));
        lines.push(rule(40));
        for app in group {
            lines.push(format!("  Name:        {}", app.display_name.as_deref().unwrap_or("N/A")));
            lines.push(format!("  App ID:      {}", app.app_id));
            if let Some(bundle_id) = &app.bundle_id {
                lines.push(format!("  Bundle ID:   {bundle_id}"));
            }
            if let Some(package) = &app.package_name {
                lines.push(format!("  Package:     {package}"));
            }
            if let Some(namespace) = &app.namespace {
                lines.push(format!("  Namespace:   {namespace}"));
            }
            lines.push(String::new());
        }
    }
    lines.push("Use the App ID with other Firebase tools (e.g., upload_dsyms_to_firebase)".to_owned());
    join(lines)
}

// --- build upload ---

pub fn build_uploaded(ipa_path: &Path, platform: UploadPlatform, output: &str) -> String {
    join(vec![
        "Build upload initiated successfully".to_owned(),
        String::new(),
        format!("IPA: {}", ipa_path.display()),
        format!("Platform: {}", platform.as_str()),
        String::new(),
        "Upload Output:".to_owned(),
        output.trim_end().to_owned(),
        String::new(),
        "Note: The build will now be processed by App Store Connect.".to_owned(),
        "This may take several minutes. Use 'get_upload_status' to check progress.".to_owned(),
    ])
}

pub fn build_validated(ipa_path: &Path, output: &str) -> String {
    join(vec![
        "Build validation completed successfully".to_owned(),
        String::new(),
        format!("IPA: {}", ipa_path.display()),
        String::new(),
        "Validation Output:".to_owned(),
        output.trim_end().to_owned(),
        String::new(),
        "The IPA is ready for upload to App Store Connect.".to_owned(),
    ])
}

pub fn build_validation_failed(ipa_path: &Path, error: &AscError) -> String {
    let mut lines = vec![
        "Build validation failed".to_owned(),
        String::new(),
        format!("IPA: {}", ipa_path.display()),
        String::new(),
        format!("Error: {error}"),
    ];
    let suggestion = match error {
        AscError::NotInstalled { .. } => {
            Some("Install Xcode command line tools: xcode-select --install")
        }
        AscError::FileNotFound(_) => Some("Verify the file path exists and is accessible"),
        AscError::InvalidFile(_) => Some("Ensure the file is a valid .ipa file"),
        AscError::ValidationFailed { .. } => Some(
            "Check the error message for details. Ensure the IPA is properly signed and configured.",
        ),
        _ => None,
    };
    if let Some(suggestion) = suggestion {
        lines.push(String::new());
        lines.push("Suggestion:".to_owned());
        lines.push(suggestion.to_owned());
    }
    join(lines)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::asc::kinds::{BundleIdPlatform, CertificateType};
    use crate::asc::models::{BundleIdAttributes, CertificateAttributes, ProfileAttributes};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn certificate(id: &str, activated: bool, expires: DateTime<Utc>) -> Certificate {
        Certificate::new(
            id,
            "certificates",
            CertificateAttributes {
                display_name: Some("Jane Doe".into()),
                certificate_type: Some(CertificateType::IosDistribution),
                expiration_date: Some(expires),
                activated: Some(activated),
                ..Default::default()
            },
        )
    }

    #[test]
    fn cell_pads_and_truncates() {
        assert_eq!(cell("abc", 6), "abc   ");
        assert_eq!(cell("abcdefghij", 8), "abcd... ");
        assert_eq!(cell("abcdefghij", 8).chars().count(), 8);
    }

    #[test]
    fn cell_keeps_values_that_leave_a_space() {
        let name = "Apple Distribution: Acme Corp";
        assert_eq!(name.chars().count(), 29);
        assert_eq!(cell(name, 30), format!("{name} "));

        let full = "x".repeat(30);
        assert_eq!(cell(&full, 30), format!("{}... ", "x".repeat(26)));
    }

    #[test]
    fn zero_certificates_render_explicit_line() {
        let text = certificates(&[], now());
        assert!(text.starts_with("Found 0 certificate(s)"));
        assert!(text.contains("No certificates found."));
    }

    #[test]
    fn certificate_status_uses_now() {
        let expired = certificate("c1", true, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let active = certificate("c2", true, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let inactive = certificate("c3", false, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let text = certificates(&[expired, active, inactive], now());

        let rows: Vec<&str> = text.lines().filter(|l| l.starts_with("Jane Doe")).collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].contains("EXPIRED") && rows[0].ends_with("c1"));
        assert!(rows[1].contains("ACTIVE") && rows[1].ends_with("c2"));
        assert!(rows[2].contains("INACTIVE"));
        assert!(rows[1].contains("Jan 1, 2026"));
    }

    #[test]
    fn bundle_ids_table_has_one_row_per_entry() {
        let bundles = vec![BundleId::new(
            "B1",
            "bundleIds",
            BundleIdAttributes {
                name: Some("Example".into()),
                platform: Some(BundleIdPlatform::Ios),
                identifier: Some("com.example.app".into()),
                seed_id: None,
            },
        )];
        let text = bundle_ids(&bundles);
        assert!(text.starts_with("Found 1 bundle ID(s)"));
        assert_eq!(text.lines().filter(|l| l.starts_with("com.example.app")).count(), 1);
        assert!(bundle_ids(&[]).contains("No bundle IDs found matching the criteria."));
    }

    #[test]
    fn unresolved_profile_bundle_renders_unknown() {
        let profile = Profile::new(
            "P1",
            "profiles",
            ProfileAttributes {
                name: Some("A very long provisioning profile name that overflows".into()),
                profile_state: Some("ACTIVE".into()),
                ..Default::default()
            },
        );
        let text = profiles(&[(&profile, None)]);
        let table_row = text.lines().find(|l| l.starts_with("A very")).unwrap();
        assert!(table_row.contains("..."));
        assert!(table_row.trim_end().ends_with("Unknown"));
        assert!(text.contains("  ID: P1"));
    }

    #[test]
    fn upload_status_without_builds_is_explanatory() {
        let text = upload_status("123", &[]);
        assert!(text.starts_with("No builds found for app ID: 123"));
    }

    #[test]
    fn firebase_projects_sorted_by_display_name() {
        let project = |id: &str, name: &str| FirebaseProject {
            project_id: id.into(),
            project_number: "1".into(),
            display_name: name.into(),
            name: format!("projects/{id}"),
            resources: None,
            state: None,
        };
        let text = firebase_projects(&[project("z", "Zeta"), project("a", "Alpha")]);
        let alpha = text.find("Alpha").unwrap();
        let zeta = text.find("Zeta").unwrap();
        assert!(alpha < zeta);
        assert!(text.contains("N/A"));
    }
}
