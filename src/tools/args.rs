//! Typed extraction from the loosely-typed argument map of a tool call.
//!
//! Every accessor fails with `MissingParameter` or `InvalidParameter` and never touches the
//! network, so handlers decode their whole request before doing any work.

use serde_json::Value;

use super::Arguments;
use crate::asc::kinds::{BundleIdPlatform, CapabilityType, CertificateType, ProfileType};
use crate::error::AscError;
use crate::process::firebase::FirebasePlatform;
use crate::process::transporter::UploadPlatform;

/// A closed set of accepted string values. Matching is case-sensitive.
pub trait Choice: Sized {
    const NAMES: &'static [&'static str];

    fn choose(value: &str) -> Option<Self>;
}

macro_rules! choice_from_known {
    ($($ty:ty),+ $(,)?) => {
        $(impl Choice for $ty {
            const NAMES: &'static [&'static str] = <$ty>::NAMES;

            fn choose(value: &str) -> Option<Self> {
                <$ty>::known(value)
            }
        })+
    };
}

choice_from_known!(CertificateType, BundleIdPlatform, ProfileType, CapabilityType);

impl Choice for FirebasePlatform {
    const NAMES: &'static [&'static str] = FirebasePlatform::NAMES;

    fn choose(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

impl Choice for UploadPlatform {
    const NAMES: &'static [&'static str] = UploadPlatform::NAMES;

    fn choose(value: &str) -> Option<Self> {
        value.parse().ok()
    }
}

fn not_allowed<T: Choice>(name: &str, value: &str) -> AscError {
    AscError::invalid_parameter(
        name,
        format!("'{value}' is not one of: {}", T::NAMES.join(", ")),
    )
}

pub struct Args<'a> {
    map: &'a Arguments,
}

impl<'a> Args<'a> {
    pub fn new(map: &'a Arguments) -> Self {
        Self { map }
    }

    /// Absent and explicit `null` are the same thing.
    fn get(&self, name: &str) -> Option<&'a Value> {
        self.map.get(name).filter(|v| !v.is_null())
    }

    pub fn required_str(&self, name: &str) -> Result<&'a str, AscError> {
        match self.optional_str(name)? {
            Some(value) => Ok(value),
            None => Err(AscError::MissingParameter(name.to_owned())),
        }
    }

    /// Blank strings count as absent.
    pub fn optional_str(&self, name: &str) -> Result<Option<&'a str>, AscError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(AscError::invalid_parameter(
                name,
                format!("expected a string, got {}", type_name(other)),
            )),
        }
    }

    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, AscError> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(AscError::invalid_parameter(
                name,
                format!("expected a boolean, got {}", type_name(other)),
            )),
        }
    }

    /// Absent yields an empty list. Every element must be a non-empty string.
    pub fn optional_str_array(&self, name: &str) -> Result<Vec<String>, AscError> {
        let Some(value) = self.get(name) else {
            return Ok(Vec::new());
        };
        let Value::Array(items) = value else {
            return Err(AscError::invalid_parameter(
                name,
                format!("expected an array of strings, got {}", type_name(value)),
            ));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
                other => Err(AscError::invalid_parameter(
                    name,
                    format!("element {index} must be a non-empty string, got {}", type_name(other)),
                )),
            })
            .collect()
    }

    /// Must be present and non-empty.
    pub fn required_str_array(&self, name: &str) -> Result<Vec<String>, AscError> {
        if self.get(name).is_none() {
            return Err(AscError::MissingParameter(name.to_owned()));
        }
        let items = self.optional_str_array(name)?;
        if items.is_empty() {
            return Err(AscError::invalid_parameter(name, "must be a non-empty array of strings"));
        }
        Ok(items)
    }

    pub fn required_choice<T: Choice>(&self, name: &str) -> Result<T, AscError> {
        let value = self.required_str(name)?;
        T::choose(value).ok_or_else(|| not_allowed::<T>(name, value))
    }

    pub fn optional_choice<T: Choice>(&self, name: &str) -> Result<Option<T>, AscError> {
        match self.optional_str(name)? {
            None => Ok(None),
            Some(value) => T::choose(value)
                .map(Some)
                .ok_or_else(|| not_allowed::<T>(name, value)),
        }
    }

    /// Every element must be one of the accepted values.
    pub fn required_choice_array<T: Choice>(&self, name: &str) -> Result<Vec<T>, AscError> {
        self.required_str_array(name)?
            .iter()
            .map(|value| T::choose(value).ok_or_else(|| not_allowed::<T>(name, value)))
            .collect()
    }

    /// Exactly one of `names` must be present. Returns the present name and its value.
    pub fn exactly_one_of(
        &self,
        names: &[&'static str],
    ) -> Result<(&'static str, &'a str), AscError> {
        let mut present = Vec::new();
        for name in names {
            if let Some(value) = self.optional_str(name)? {
                present.push((*name, value));
            }
        }
        match present.as_slice() {
            [single] => Ok(*single),
            _ => Err(AscError::invalid_parameter(
                &names.join("/"),
                format!(
                    "exactly one of {} must be provided (got {})",
                    names.join(", "),
                    present.len()
                ),
            )),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("test arguments must be an object"),
        }
    }

    #[test]
    fn required_string_absent_null_or_blank_is_missing() {
        for value in [json!({}), json!({"app_id": null}), json!({"app_id": "  "})] {
            let arguments = map(value);
            let args = Args::new(&arguments);
            assert!(matches!(
                args.required_str("app_id"),
                Err(AscError::MissingParameter(p)) if p == "app_id"
            ));
        }
    }

    #[test]
    fn wrong_scalar_type_is_invalid() {
        let arguments = map(json!({"app_id": 42, "latest_only": "yes"}));
        let args = Args::new(&arguments);
        assert!(matches!(args.required_str("app_id"), Err(AscError::InvalidParameter { .. })));
        assert!(matches!(args.optional_bool("latest_only"), Err(AscError::InvalidParameter { .. })));
    }

    #[test]
    fn array_with_non_string_element_is_rejected_whole() {
        let arguments = map(json!({"certificate_ids": ["a", 2, "c"]}));
        let args = Args::new(&arguments);
        match args.required_str_array("certificate_ids") {
            Err(AscError::InvalidParameter { name, reason }) => {
                assert_eq!(name, "certificate_ids");
                assert!(reason.contains("element 1"));
            }
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn empty_required_array_is_invalid() {
        let arguments = map(json!({"certificate_ids": []}));
        let args = Args::new(&arguments);
        assert!(matches!(
            args.required_str_array("certificate_ids"),
            Err(AscError::InvalidParameter { .. })
        ));
        assert!(args.optional_str_array("device_ids").unwrap().is_empty());
    }

    #[test]
    fn choices_are_case_sensitive_and_name_allowed_set() {
        let arguments = map(json!({"platform": "ios", "certificate_type": "IOS_DISTRIBUTION"}));
        let args = Args::new(&arguments);
        assert_eq!(
            args.required_choice::<CertificateType>("certificate_type").unwrap(),
            CertificateType::IosDistribution
        );
        match args.required_choice::<BundleIdPlatform>("platform") {
            Err(AscError::InvalidParameter { reason, .. }) => {
                assert!(reason.contains("IOS, MAC_OS, UNIVERSAL"), "{reason}");
            }
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
        assert_eq!(
            args.optional_choice::<FirebasePlatform>("platform").unwrap(),
            Some(FirebasePlatform::Ios)
        );
    }

    #[test]
    fn capability_array_decodes_every_element() {
        let arguments = map(json!({"capabilities": ["PUSH_NOTIFICATIONS", "push"]}));
        let args = Args::new(&arguments);
        assert!(args.required_choice_array::<CapabilityType>("capabilities").is_err());
    }

    #[test]
    fn exactly_one_of_counts_present_members() {
        let group = ["build_id", "archive_path", "dsyms_path"];

        let arguments = map(json!({"archive_path": "/tmp/A.xcarchive"}));
        assert_eq!(
            Args::new(&arguments).exactly_one_of(&group).unwrap(),
            ("archive_path", "/tmp/A.xcarchive")
        );

        let none = map(json!({}));
        assert!(Args::new(&none).exactly_one_of(&group).is_err());

        let two = map(json!({"build_id": "b", "dsyms_path": "/tmp"}));
        match Args::new(&two).exactly_one_of(&group) {
            Err(AscError::InvalidParameter { reason, .. }) => assert!(reason.contains("got 2")),
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }
}
