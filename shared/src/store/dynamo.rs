//! Single-table DynamoDB layout.
//!
//! | PK                 | SK                 | item                         |
//! |--------------------|--------------------|------------------------------|
//! | `USER#{username}`  | `PROFILE`          | user document                |
//! | `EMAIL#{email}`    | `EMAIL`            | email uniqueness marker      |
//! | `PROJECT#{id}`     | `METADATA`         | project document             |
//! | `USER#{username}`  | `PROJECT#{id}`     | owner/collaborator link      |
//!
//! Username and email keys are lowercased. Structured project sections are
//! stored as JSON strings; the chat history is a DynamoDB list of JSON strings
//! so that appends can use `list_append`.

use super::{email_key, user_key, Store};
use crate::error::StoreError;
use crate::types::{
    ChatMessage, Phase, Project, ProjectSection, Role, User, UserRecord,
};
use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;
use aws_sdk_dynamodb::types::{
    AttributeValue, KeysAndAttributes, Put, PutRequest, ReturnValue,
    ReturnValuesOnConditionCheckFailure, TransactWriteItem, WriteRequest,
};
use aws_sdk_dynamodb::Client as DynamoClient;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

type Item = HashMap<String, AttributeValue>;

const PROFILE_SK: &str = "PROFILE";
const EMAIL_SK: &str = "EMAIL";
const PROJECT_SK: &str = "METADATA";

pub struct DynamoStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

fn backend<E>(e: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Backend(DisplayErrorContext(e).to_string())
}

fn s(value: impl Into<String>) -> AttributeValue {
    AttributeValue::S(value.into())
}

fn get_s(item: &Item, name: &str) -> Option<String> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

fn get_json<T: DeserializeOwned + Default>(item: &Item, name: &str) -> Result<T, StoreError> {
    match item.get(name).and_then(|v| v.as_s().ok()) {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(T::default()),
    }
}

fn user_pk(username: &str) -> String {
    format!("USER#{}", user_key(username))
}

fn project_pk(project_id: &str) -> String {
    format!("PROJECT#{}", project_id)
}

fn user_to_item(record: &UserRecord) -> Item {
    let user = &record.user;
    let mut item = HashMap::new();
    item.insert("PK".to_string(), s(user_pk(&user.username)));
    item.insert("SK".to_string(), s(PROFILE_SK));
    item.insert("entity_type".to_string(), s("user"));
    item.insert("username".to_string(), s(user.username.clone()));
    item.insert("email".to_string(), s(user.email.clone()));
    item.insert("password_hash".to_string(), s(record.password_hash.clone()));
    item.insert("is_admin".to_string(), AttributeValue::Bool(user.is_admin));
    item.insert("role".to_string(), s(user.role.as_str()));
    item.insert("created_at".to_string(), s(user.created_at.clone()));
    if let Some(dob) = &user.date_of_birth {
        item.insert("date_of_birth".to_string(), s(dob.clone()));
    }
    item
}

fn user_from_item(item: &Item) -> UserRecord {
    UserRecord {
        user: User {
            username: get_s(item, "username").unwrap_or_default(),
            email: get_s(item, "email").unwrap_or_default(),
            date_of_birth: get_s(item, "date_of_birth"),
            is_admin: item
                .get("is_admin")
                .and_then(|v| v.as_bool().ok())
                .copied()
                .unwrap_or(false),
            role: get_s(item, "role")
                .and_then(|r| Role::parse(&r))
                .unwrap_or_default(),
            created_at: get_s(item, "created_at").unwrap_or_default(),
        },
        password_hash: get_s(item, "password_hash").unwrap_or_default(),
    }
}

fn section_value(section: &ProjectSection) -> Result<AttributeValue, StoreError> {
    let value = match section {
        ProjectSection::Phase(phase) => s(phase.as_str()),
        ProjectSection::SharedWith(list) => s(serde_json::to_string(list)?),
        ProjectSection::EmpathyMap(map) => s(serde_json::to_string(map)?),
        ProjectSection::Constraints(list) => s(serde_json::to_string(list)?),
        ProjectSection::PointOfView(pov) => s(serde_json::to_string(pov)?),
        ProjectSection::Ideas(ideas) => s(serde_json::to_string(ideas)?),
        ProjectSection::Prioritization(matrix) => s(serde_json::to_string(matrix)?),
        ProjectSection::TechSpec(spec) => s(serde_json::to_string(spec)?),
    };
    Ok(value)
}

fn project_to_item(project: &Project) -> Result<Item, StoreError> {
    let mut item = HashMap::new();
    item.insert("PK".to_string(), s(project_pk(&project.project_id)));
    item.insert("SK".to_string(), s(PROJECT_SK));
    item.insert("entity_type".to_string(), s("project"));
    item.insert("name".to_string(), s(project.name.clone()));
    item.insert("owner".to_string(), s(project.owner.clone()));
    item.insert("created_at".to_string(), s(project.created_at.clone()));
    item.insert("updated_at".to_string(), s(project.updated_at.clone()));
    if let Some(description) = &project.description {
        item.insert("description".to_string(), s(description.clone()));
    }

    let chat = project
        .chat
        .iter()
        .map(|m| serde_json::to_string(m).map(AttributeValue::S))
        .collect::<Result<Vec<_>, _>>()?;
    item.insert("chat".to_string(), AttributeValue::L(chat));

    let mut sections = vec![
        ProjectSection::Phase(project.phase),
        ProjectSection::SharedWith(project.shared_with.clone()),
        ProjectSection::EmpathyMap(project.empathy_map.clone()),
        ProjectSection::Constraints(project.constraints.clone()),
        ProjectSection::Ideas(project.ideas.clone()),
        ProjectSection::Prioritization(project.prioritization.clone()),
    ];
    if let Some(pov) = &project.point_of_view {
        sections.push(ProjectSection::PointOfView(pov.clone()));
    }
    if let Some(spec) = &project.tech_spec {
        sections.push(ProjectSection::TechSpec(spec.clone()));
    }
    for section in &sections {
        item.insert(section.attribute().to_string(), section_value(section)?);
    }

    Ok(item)
}

fn project_from_item(item: &Item) -> Result<Project, StoreError> {
    let project_id = get_s(item, "PK")
        .and_then(|pk| pk.strip_prefix("PROJECT#").map(|id| id.to_string()))
        .unwrap_or_default();

    let chat = match item.get("chat").and_then(|v| v.as_l().ok()) {
        Some(list) => list
            .iter()
            .filter_map(|v| v.as_s().ok())
            .map(|raw| serde_json::from_str::<ChatMessage>(raw))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    let point_of_view = match item.get("point_of_view").and_then(|v| v.as_s().ok()) {
        Some(raw) => Some(serde_json::from_str(raw)?),
        None => None,
    };
    let tech_spec = match item.get("tech_spec").and_then(|v| v.as_s().ok()) {
        Some(raw) => Some(serde_json::from_str(raw)?),
        None => None,
    };

    Ok(Project {
        project_id,
        name: get_s(item, "name").unwrap_or_default(),
        description: get_s(item, "description"),
        phase: get_s(item, "phase")
            .and_then(|p| Phase::parse(&p))
            .unwrap_or_default(),
        owner: get_s(item, "owner").unwrap_or_default(),
        shared_with: get_json(item, "shared_with")?,
        chat,
        empathy_map: get_json(item, "empathy_map")?,
        constraints: get_json(item, "constraints")?,
        point_of_view,
        ideas: get_json(item, "ideas")?,
        prioritization: get_json(item, "prioritization")?,
        tech_spec,
        created_at: get_s(item, "created_at").unwrap_or_default(),
        updated_at: get_s(item, "updated_at").unwrap_or_default(),
    })
}

#[async_trait]
impl Store for DynamoStore {
    async fn create_user(&self, record: &UserRecord) -> Result<(), StoreError> {
        let email = email_key(&record.user.email);

        let mut email_item = HashMap::new();
        email_item.insert("PK".to_string(), s(format!("EMAIL#{}", email)));
        email_item.insert("SK".to_string(), s(EMAIL_SK));
        email_item.insert("username".to_string(), s(user_key(&record.user.username)));

        let user_put = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(user_to_item(record)))
            .condition_expression("attribute_not_exists(PK)")
            .build()
            .map_err(backend)?;
        let email_put = Put::builder()
            .table_name(&self.table_name)
            .set_item(Some(email_item))
            .condition_expression("attribute_not_exists(PK)")
            .build()
            .map_err(backend)?;

        // Both items or neither; the cancellation reasons say which one collided.
        let result = self
            .client
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(user_put).build())
            .transact_items(TransactWriteItem::builder().put(email_put).build())
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if let Some(
                    aws_sdk_dynamodb::operation::transact_write_items::TransactWriteItemsError::TransactionCanceledException(ex),
                ) = e.as_service_error()
                {
                    let reasons = ex.cancellation_reasons();
                    let failed = |i: usize| {
                        reasons
                            .get(i)
                            .and_then(|r| r.code())
                            .map(|c| c == "ConditionalCheckFailed")
                            .unwrap_or(false)
                    };
                    if failed(0) {
                        return Err(StoreError::Conflict("username".to_string()));
                    }
                    if failed(1) {
                        return Err(StoreError::Conflict("email".to_string()));
                    }
                }
                Err(backend(e))
            }
        }
    }

    async fn get_user(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", s(user_pk(username)))
            .key("SK", s(PROFILE_SK))
            .consistent_read(true)
            .send()
            .await
            .map_err(backend)?;

        Ok(result.item().map(user_from_item))
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let mut users = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let result = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("entity_type = :user")
                .expression_attribute_values(":user", s("user"))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(backend)?;

            users.extend(result.items().iter().map(user_from_item));

            match result.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        Ok(users)
    }

    async fn create_project(&self, project: &Project) -> Result<(), StoreError> {
        let now = project.created_at.clone();

        let mut link = HashMap::new();
        link.insert("PK".to_string(), s(user_pk(&project.owner)));
        link.insert("SK".to_string(), s(project_pk(&project.project_id)));
        link.insert("joined_at".to_string(), s(now));

        let mut requests = Vec::new();
        for item in [project_to_item(project)?, link] {
            requests.push(
                WriteRequest::builder()
                    .put_request(
                        PutRequest::builder()
                            .set_item(Some(item))
                            .build()
                            .map_err(backend)?,
                    )
                    .build(),
            );
        }

        let result = self
            .client
            .batch_write_item()
            .request_items(&self.table_name, requests)
            .send()
            .await
            .map_err(backend)?;

        let unprocessed = result
            .unprocessed_items()
            .map(|items| items.values().map(|v| v.len()).sum::<usize>())
            .unwrap_or(0);
        if unprocessed > 0 {
            tracing::error!(
                "Project {} write left {} unprocessed items",
                project.project_id,
                unprocessed
            );
            return Err(StoreError::Backend("project write incomplete".to_string()));
        }

        Ok(())
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<Project>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", s(project_pk(project_id)))
            .key("SK", s(PROJECT_SK))
            .consistent_read(true)
            .send()
            .await
            .map_err(backend)?;

        result.item().map(project_from_item).transpose()
    }

    async fn list_projects(&self, username: &str) -> Result<Vec<Project>, StoreError> {
        let mut project_ids = Vec::new();
        let mut start_key: Option<Item> = None;

        loop {
            let result = self
                .client
                .query()
                .table_name(&self.table_name)
                .key_condition_expression("PK = :pk AND begins_with(SK, :sk_prefix)")
                .expression_attribute_values(":pk", s(user_pk(username)))
                .expression_attribute_values(":sk_prefix", s("PROJECT#"))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(backend)?;

            for item in result.items() {
                if let Some(id) = get_s(item, "SK").and_then(|sk| {
                    sk.strip_prefix("PROJECT#").map(|id| id.to_string())
                }) {
                    project_ids.push(id);
                }
            }

            match result.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        let mut projects = Vec::new();

        // BatchGetItem takes at most 100 keys
        for chunk in project_ids.chunks(100) {
            let keys = chunk
                .iter()
                .map(|id| {
                    let mut key = HashMap::new();
                    key.insert("PK".to_string(), s(project_pk(id)));
                    key.insert("SK".to_string(), s(PROJECT_SK));
                    key
                })
                .collect::<Vec<_>>();

            let mut request = Some(
                KeysAndAttributes::builder()
                    .set_keys(Some(keys))
                    .build()
                    .map_err(backend)?,
            );

            while let Some(keys) = request.take() {
                let batch = self
                    .client
                    .batch_get_item()
                    .request_items(&self.table_name, keys)
                    .send()
                    .await
                    .map_err(backend)?;

                if let Some(items) = batch.responses().and_then(|r| r.get(&self.table_name)) {
                    for item in items {
                        projects.push(project_from_item(item)?);
                    }
                }

                request = batch
                    .unprocessed_keys()
                    .and_then(|u| u.get(&self.table_name))
                    .filter(|k| !k.keys().is_empty())
                    .cloned();
            }
        }

        Ok(projects)
    }

    async fn update_section(
        &self,
        project_id: &str,
        section: &ProjectSection,
        updated_at: &str,
        expected_updated_at: Option<&str>,
    ) -> Result<Project, StoreError> {
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", s(project_pk(project_id)))
            .key("SK", s(PROJECT_SK))
            .update_expression("SET #section = :value, updated_at = :updated_at")
            .expression_attribute_names("#section", section.attribute())
            .expression_attribute_values(":value", section_value(section)?)
            .expression_attribute_values(":updated_at", s(updated_at))
            .return_values(ReturnValue::AllNew)
            .return_values_on_condition_check_failure(ReturnValuesOnConditionCheckFailure::AllOld);

        request = match expected_updated_at {
            Some(expected) => request
                .condition_expression("attribute_exists(PK) AND updated_at = :expected")
                .expression_attribute_values(":expected", s(expected)),
            None => request.condition_expression("attribute_exists(PK)"),
        };

        match request.send().await {
            Ok(output) => output
                .attributes()
                .map(project_from_item)
                .transpose()?
                .ok_or_else(|| StoreError::Backend("update returned no attributes".to_string())),
            Err(e) => {
                if let Some(UpdateItemError::ConditionalCheckFailedException(ex)) =
                    e.as_service_error()
                {
                    // the old item only comes back when the project exists
                    return Err(match ex.item() {
                        Some(_) => StoreError::Stale,
                        None => StoreError::NotFound,
                    });
                }
                Err(backend(e))
            }
        }
    }

    async fn link_member(&self, project_id: &str, username: &str) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .item("PK", s(user_pk(username)))
            .item("SK", s(project_pk(project_id)))
            .item("joined_at", s(chrono::Utc::now().to_rfc3339()))
            .send()
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn append_chat(&self, project_id: &str, message: &ChatMessage) -> Result<(), StoreError> {
        let entry = AttributeValue::L(vec![s(serde_json::to_string(message)?)]);

        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", s(project_pk(project_id)))
            .key("SK", s(PROJECT_SK))
            .update_expression("SET chat = list_append(if_not_exists(chat, :empty), :entry)")
            .condition_expression("attribute_exists(PK)")
            .expression_attribute_values(":empty", AttributeValue::L(Vec::new()))
            .expression_attribute_values(":entry", entry)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e
                    .as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false)
                {
                    return Err(StoreError::NotFound);
                }
                Err(backend(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatMessage, Idea, PointOfView};

    fn sample_project() -> Project {
        Project {
            project_id: "p-1".to_string(),
            name: "Library hours".to_string(),
            description: Some("Late-night study space".to_string()),
            phase: Phase::Ideate,
            owner: "Ana".to_string(),
            shared_with: vec![],
            chat: vec![ChatMessage {
                sender: "ana".to_string(),
                text: "kickoff".to_string(),
                timestamp: "2026-01-01T00:00:00Z".to_string(),
                phase: Phase::Empathize,
            }],
            empathy_map: Default::default(),
            constraints: vec!["no new staff".to_string()],
            point_of_view: Some(PointOfView {
                need: "a quiet place after 10pm".to_string(),
                ..Default::default()
            }),
            ideas: vec![Idea {
                id: "i-1".to_string(),
                text: "24h reading room".to_string(),
                author: None,
            }],
            prioritization: Default::default(),
            tech_spec: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_project_item_layout() {
        let project = sample_project();
        let item = project_to_item(&project).unwrap();

        assert_eq!(get_s(&item, "PK").unwrap(), "PROJECT#p-1");
        assert_eq!(get_s(&item, "SK").unwrap(), "METADATA");
        assert_eq!(get_s(&item, "phase").unwrap(), "ideate");
        assert!(item.get("tech_spec").is_none());
        assert_eq!(item.get("chat").unwrap().as_l().unwrap().len(), 1);

        assert_eq!(project_from_item(&item).unwrap(), project);
    }

    #[test]
    fn test_user_keys_are_lowercased() {
        let record = UserRecord {
            user: User {
                username: "Ana".to_string(),
                email: "Ana@Uni.edu".to_string(),
                date_of_birth: None,
                is_admin: true,
                role: Role::Admin,
                created_at: String::new(),
            },
            password_hash: "$argon2id$stub".to_string(),
        };
        let item = user_to_item(&record);
        assert_eq!(get_s(&item, "PK").unwrap(), "USER#ana");

        let back = user_from_item(&item);
        assert_eq!(back.user.username, "Ana");
        assert_eq!(back.user.role, Role::Admin);
        assert!(back.user.is_admin);
    }
}
