use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::user::UserId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Todo,
    Doing,
    Done,
}

impl FromStr for Status {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Status::Todo),
            "doing" => Ok(Status::Doing),
            "done" => Ok(Status::Done),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Med,
    High,
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "med" => Ok(Priority::Med),
            "high" => Ok(Priority::High),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub status: Status,
    pub priority: Priority,
    pub owner_id: UserId,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateTask {
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "lenient")]
    pub priority: Option<Priority>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTask {
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "lenient")]
    pub priority: Option<Priority>,
}

// Unknown or non-string enum values read as absent instead of rejecting the body.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_body_defaults_when_fields_missing() {
        let body: CreateTask = serde_json::from_value(json!({ "text": "buy milk" })).unwrap();
        assert_eq!(body.text, "buy milk");
        assert_eq!(body.status.unwrap_or_default(), Status::Todo);
        assert_eq!(body.priority.unwrap_or_default(), Priority::Med);
    }

    #[test]
    fn invalid_enum_values_read_as_absent() {
        let body: CreateTask = serde_json::from_value(json!({
            "text": "x",
            "status": "blocked",
            "priority": 3
        }))
        .unwrap();
        assert_eq!(body.status, None);
        assert_eq!(body.priority, None);

        let patch: UpdateTask =
            serde_json::from_value(json!({ "status": null, "priority": "high" })).unwrap();
        assert_eq!(patch.status, None);
        assert_eq!(patch.priority, Some(Priority::High));
    }

    #[test]
    fn task_serializes_with_camel_case_owner() {
        let task = Task {
            id: "t1".into(),
            text: "x".into(),
            status: Status::Doing,
            priority: Priority::Med,
            owner_id: "u1".into(),
        };
        assert_eq!(
            serde_json::to_value(&task).unwrap(),
            json!({
                "id": "t1",
                "text": "x",
                "status": "doing",
                "priority": "med",
                "ownerId": "u1"
            })
        );
    }
}
