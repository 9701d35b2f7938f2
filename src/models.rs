// src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::ScheduleError;

// --- 1. 枚举类型 ---

/// 服务等级：1=Basic, 2=Standard, 3=Premium
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum Tier {
    Basic = 1,
    Standard = 2,
    Premium = 3,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Basic, Tier::Standard, Tier::Premium];
}

impl TryFrom<i32> for Tier {
    type Error = ScheduleError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::Basic),
            2 => Ok(Tier::Standard),
            3 => Ok(Tier::Premium),
            other => Err(ScheduleError::InvalidTier(other)),
        }
    }
}

impl From<Tier> for i32 {
    fn from(tier: Tier) -> Self {
        tier as i32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Setup,
    Content,
    Engagement,
    Reporting,
    Ads,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Setup => "setup",
            TaskType::Content => "content",
            TaskType::Engagement => "engagement",
            TaskType::Reporting => "reporting",
            TaskType::Ads => "ads",
        }
    }
}

/// 数据库里存的是文本，读回来时解析失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value `{}`", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl FromStr for TaskType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(TaskType::Setup),
            "content" => Ok(TaskType::Content),
            "engagement" => Ok(TaskType::Engagement),
            "reporting" => Ok(TaskType::Reporting),
            "ads" => Ok(TaskType::Ads),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

// --- 2. Project 模型 ---
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub tier: Tier,
    pub start_date: NaiveDate,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// 存储层创建项目的入参 (id 与 created_at 由存储层分配)
#[derive(Debug, Clone)]
pub struct NewProject {
    pub user_id: Uuid,
    pub name: String,
    pub tier: Tier,
    pub start_date: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectSchema {
    #[validate(length(min = 1, max = 100, message = "Project name must be 1-100 characters"))]
    pub name: String,
    // 不在这里做范围校验，交给排期生成器报 InvalidTier
    pub tier: i32,
    #[serde(deserialize_with = "deserialize_start_date")]
    pub start_date: NaiveDate,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectSchema {
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectResponse {
    pub project: Project,
    pub tasks_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ProjectWithTasks {
    pub project: Project,
    pub tasks: Vec<Task>,
}

// --- 3. Task 模型 ---
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_date: DateTime<Utc>,
    pub is_completed: bool,
    pub priority: Priority,
    pub estimated_time: Option<String>,
    pub task_type: TaskType,
    pub tier: Tier,
    pub recurring_day: Option<i32>,
}

/// 排期生成器的产物：还没有归属项目，也没有 id
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub scheduled_date: DateTime<Utc>,
    pub priority: Priority,
    pub estimated_time: Option<String>,
    pub task_type: TaskType,
    pub tier: Tier,
    pub recurring_day: Option<i32>,
}

impl TaskDraft {
    pub fn for_project(self, project_id: Uuid) -> NewTask {
        NewTask {
            project_id,
            title: self.title,
            description: self.description,
            scheduled_date: self.scheduled_date,
            is_completed: false,
            priority: self.priority,
            estimated_time: self.estimated_time,
            task_type: self.task_type,
            tier: self.tier,
            recurring_day: self.recurring_day,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_date: DateTime<Utc>,
    pub is_completed: bool,
    pub priority: Priority,
    pub estimated_time: Option<String>,
    pub task_type: TaskType,
    pub tier: Tier,
    pub recurring_day: Option<i32>,
}

impl NewTask {
    pub fn into_task(self, id: Uuid) -> Task {
        Task {
            id,
            project_id: self.project_id,
            title: self.title,
            description: self.description,
            scheduled_date: self.scheduled_date,
            is_completed: self.is_completed,
            priority: self.priority,
            estimated_time: self.estimated_time,
            task_type: self.task_type,
            tier: self.tier,
            recurring_day: self.recurring_day,
        }
    }
}

/// 唯一允许的任务修改：完成状态
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskSchema {
    pub is_completed: bool,
}

// --- 4. 认证与查询模型 ---
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterSchema {
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginSchema {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct TierInfo {
    pub tier: Tier,
    pub name: &'static str,
    pub price: u32,
    pub color: &'static str,
    pub features: &'static [&'static str],
}

// 前端可能传 "2024-03-15" 也可能传完整的 ISO 时间串
fn deserialize_start_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_start_date(&raw)
        .ok_or_else(|| de::Error::custom(format!("invalid start date `{raw}`")))
}

pub fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Tier::Standard).unwrap(), "2");
        let tier: Tier = serde_json::from_str("3").unwrap();
        assert_eq!(tier, Tier::Premium);
        assert!(serde_json::from_str::<Tier>("4").is_err());
    }

    #[test]
    fn start_date_accepts_plain_and_iso_forms() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_start_date("2024-03-15"), Some(expected));
        assert_eq!(parse_start_date("2024-03-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_start_date("15/03/2024"), None);
    }

    #[test]
    fn create_schema_reads_camel_case() {
        let body = r#"{"name":"Acme","tier":2,"startDate":"2024-06-01"}"#;
        let schema: CreateProjectSchema = serde_json::from_str(body).unwrap();
        assert_eq!(schema.tier, 2);
        assert_eq!(schema.start_date, NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        assert!(schema.is_active.is_none());
    }
}
