// src/ics.rs
//! `.ics` 日历导出 (只写不读)。

use chrono::{DateTime, Duration, Utc};
use icalendar::{Calendar, Component, Property};

use crate::models::{Priority, Project, Task};
use crate::scheduler::{last_day_of_month, start_of_day};

const UID_DOMAIN: &str = "socialmedia-taskmanager.com";
const PRODUCT_ID: &str = "-//Social Media Task Manager//EN";
const CALENDAR_DESCRIPTION: &str = "Social Media Marketing Tasks";

const REMINDER_TITLE: &str = "Send client completion report";
const REMINDER_DESCRIPTION: &str = "Send client a copy of completed tasks and analytics reports";

/// 导出的一条日历事件
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub priority: Option<Priority>,
}

impl CalendarItem {
    /// 固定一小时，不看 estimated_time
    fn one_hour(
        id: String,
        title: String,
        description: Option<String>,
        start: DateTime<Utc>,
        priority: Option<Priority>,
    ) -> Self {
        Self {
            id,
            title,
            description,
            start,
            end: start + Duration::hours(1),
            priority,
        }
    }
}

impl From<&Task> for CalendarItem {
    fn from(task: &Task) -> Self {
        CalendarItem::one_hour(
            format!("task-{}", task.id),
            task.title.clone(),
            task.description.clone(),
            task.scheduled_date,
            Some(task.priority),
        )
    }
}

/// 日历客户端按这个数字排序：1 最高，9 最低
pub fn priority_value(priority: Option<Priority>) -> u32 {
    match priority {
        Some(Priority::High) => 1,
        Some(Priority::Low) => 9,
        Some(Priority::Medium) | None => 5,
    }
}

/// `YYYYMMDDTHHMMSSZ`
pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn serialize(items: &[CalendarItem], calendar_name: &str, generated_at: DateTime<Utc>) -> String {
    let mut cal = Calendar::new();
    cal.append_property(Property::new("METHOD", "PUBLISH"));
    cal.append_property(Property::new("X-WR-CALNAME", calendar_name));
    cal.append_property(Property::new("X-WR-CALDESC", CALENDAR_DESCRIPTION));

    let dtstamp = format_utc(generated_at);

    for item in items {
        let mut event = icalendar::Event::new();
        event.uid(&format!("{}@{}", item.id, UID_DOMAIN));
        event.add_property("DTSTAMP", &dtstamp);
        event.add_property("DTSTART", format_utc(item.start));
        event.add_property("DTEND", format_utc(item.end));
        event.summary(&item.title);
        if let Some(ref desc) = item.description {
            event.description(desc);
        }
        event.add_property("PRIORITY", priority_value(item.priority).to_string());

        cal.push(event.done());
    }

    with_product_id(&cal.done().to_string())
}

/// icalendar 固定写 `PRODID:ICALENDAR-RS`，这里换成本产品的标识
fn with_product_id(ics: &str) -> String {
    let mut out = String::with_capacity(ics.len());
    for line in ics.split_inclusive("\r\n") {
        if line.starts_with("PRODID:") {
            out.push_str("PRODID:");
            out.push_str(PRODUCT_ID);
            out.push_str("\r\n");
        } else {
            out.push_str(line);
        }
    }
    out
}

/// 项目月末的 "发送完成报告" 提醒，id 来自项目而不是任务
pub fn completion_reminder(project: &Project) -> CalendarItem {
    let month_end = last_day_of_month(project.start_date);
    CalendarItem::one_hour(
        format!("reminder-{}", project.id),
        REMINDER_TITLE.to_string(),
        Some(REMINDER_DESCRIPTION.to_string()),
        start_of_day(month_end),
        Some(Priority::High),
    )
}

/// 导出整个项目：每个任务一条，外加一条月末提醒
pub fn export_project(project: &Project, tasks: &[Task], generated_at: DateTime<Utc>) -> String {
    let mut items: Vec<CalendarItem> = tasks.iter().map(CalendarItem::from).collect();
    items.push(completion_reminder(project));

    serialize(&items, &format!("{} Tasks", project.name), generated_at)
}

/// 下载文件名，只保留 ASCII 字母数字、`-` 和 `_`
pub fn export_filename(project_name: &str) -> String {
    let stem: String = project_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if stem.is_empty() {
        "project_tasks.ics".to_string()
    } else {
        format!("{}_tasks.ics", stem)
    }
}
