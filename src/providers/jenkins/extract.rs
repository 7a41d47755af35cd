//! Field extraction from a raw last-build document.
//!
//! Jenkins spreads build metadata over a heterogeneous `actions` array whose
//! entries depend on installed plugins, so the document is walked as a
//! `serde_json::Value` instead of being decoded into a fixed schema.
//!
//! | field               | source                                        | when absent |
//! |---------------------|-----------------------------------------------|-------------|
//! | `user`              | first action with `causes`, first `userId`     | `""`        |
//! | `timestamp`         | top-level `timestamp`                          | `0`         |
//! | `lastBuiltRevision` | first action with `lastBuiltRevision.SHA1`     | `None`      |
//! | `remoteUrls`        | first action with `remoteUrls`, first element  | `None`      |

use serde_json::Value;

use super::types::LastBuildInfo;

pub fn extract_last_build(body: &Value) -> LastBuildInfo {
    LastBuildInfo {
        user: causer_user_id(body).unwrap_or_default(),
        timestamp: timestamp(body),
        last_built_revision: last_built_revision(body),
        remote_url: remote_url(body),
    }
}

fn actions(body: &Value) -> impl Iterator<Item = &Value> {
    body.get("actions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

/// Only the first action carrying `causes` is consulted; a timer-triggered
/// first cause list yields no user even if a later action names one.
fn causer_user_id(body: &Value) -> Option<String> {
    let causes = actions(body).find_map(|action| action.get("causes")?.as_array())?;
    causes
        .iter()
        .find_map(|cause| cause.get("userId").and_then(Value::as_str))
        .map(ToOwned::to_owned)
}

fn timestamp(body: &Value) -> i64 {
    match body.get("timestamp") {
        Some(value) => value
            .as_i64()
            .or_else(|| {
                #[allow(clippy::cast_possible_truncation)]
                value.as_f64().map(|f| f as i64)
            })
            .unwrap_or(0),
        None => 0,
    }
}

fn last_built_revision(body: &Value) -> Option<String> {
    actions(body)
        .find_map(|action| action.get("lastBuiltRevision")?.get("SHA1")?.as_str())
        .filter(|sha| !sha.is_empty())
        .map(ToOwned::to_owned)
}

fn remote_url(body: &Value) -> Option<String> {
    actions(body)
        .find_map(|action| action.get("remoteUrls")?.as_array())
        .and_then(|urls| urls.first())
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_all_fields_from_git_build() {
        let body = json!({
            "_class": "hudson.model.FreeStyleBuild",
            "actions": [
                {"_class": "hudson.model.CauseAction", "causes": [
                    {"shortDescription": "Started by user Alice", "userId": "alice", "userName": "Alice"}
                ]},
                {},
                {"_class": "hudson.plugins.git.util.BuildData",
                 "lastBuiltRevision": {"SHA1": "0f1e2d3c", "branch": []},
                 "remoteUrls": ["https://git.example.com/team/app.git"]},
            ],
            "timestamp": 1_700_000_000_123_i64,
            "result": "SUCCESS"
        });

        let info = extract_last_build(&body);
        assert_eq!(info.user, "alice");
        assert_eq!(info.timestamp, 1_700_000_000_123);
        assert_eq!(info.last_built_revision.as_deref(), Some("0f1e2d3c"));
        assert_eq!(
            info.remote_url.as_deref(),
            Some("https://git.example.com/team/app.git")
        );
    }

    #[test]
    fn test_empty_document_yields_defaults() {
        let info = extract_last_build(&json!({}));
        assert_eq!(info, LastBuildInfo::default());
    }

    #[test]
    fn test_non_object_document_yields_defaults() {
        assert_eq!(extract_last_build(&Value::Null), LastBuildInfo::default());
        assert_eq!(extract_last_build(&json!([1, 2])), LastBuildInfo::default());
    }

    #[test]
    fn test_user_from_first_causes_array_only() {
        let body = json!({
            "actions": [
                {"causes": [{"shortDescription": "Started by timer"}]},
                {"causes": [{"userId": "bob"}]}
            ]
        });

        assert_eq!(extract_last_build(&body).user, "");
    }

    #[test]
    fn test_user_skips_causes_without_user_id() {
        let body = json!({
            "actions": [
                {"parameters": []},
                {"causes": [{"shortDescription": "upstream"}, {"userId": "carol"}, {"userId": "dave"}]}
            ]
        });

        assert_eq!(extract_last_build(&body).user, "carol");
    }

    #[test]
    fn test_revision_and_urls_from_first_matching_action() {
        let body = json!({
            "actions": [
                {"lastBuiltRevision": {"SHA1": "first"}, "remoteUrls": []},
                {"lastBuiltRevision": {"SHA1": "second"}, "remoteUrls": ["https://second"]}
            ]
        });

        let info = extract_last_build(&body);
        assert_eq!(info.last_built_revision.as_deref(), Some("first"));
        // The first action with `remoteUrls` has an empty list.
        assert_eq!(info.remote_url, None);
    }

    #[test]
    fn test_empty_strings_are_treated_as_absent() {
        let body = json!({
            "actions": [{"lastBuiltRevision": {"SHA1": ""}, "remoteUrls": [""]}]
        });

        let info = extract_last_build(&body);
        assert_eq!(info.last_built_revision, None);
        assert_eq!(info.remote_url, None);
    }

    #[test]
    fn test_float_timestamp_is_truncated() {
        let info = extract_last_build(&json!({"timestamp": 1_234.9}));
        assert_eq!(info.timestamp, 1_234);
    }

    #[test]
    fn test_non_numeric_timestamp_is_zero() {
        let info = extract_last_build(&json!({"timestamp": "yesterday"}));
        assert_eq!(info.timestamp, 0);
    }
}
