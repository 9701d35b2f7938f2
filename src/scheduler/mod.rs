// src/scheduler/mod.rs
//! 月度任务排期：把 (服务等级, 开始日期) 展开成当月的具体任务。
//!
//! 只用开始日期的年和月，所有任务都落在该日期所在的自然月内。
//! 返回顺序是模板顺序，按日期排序由存储层负责。

pub mod catalog;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::models::{NewTask, TaskDraft, Tier};
use catalog::{Recurrence, TaskTemplate};

/// 当月天数
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        4 | 6 | 9 | 11 => 30,
        2 if NaiveDate::from_ymd_opt(year, 2, 29).is_some() => 29,
        2 => 28,
        _ => 31,
    }
}

/// 该日期所在月份的最后一天
pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    // day 一定合法，with_day 只会在 day 超界时返回 None
    date.with_day(last).unwrap_or(date)
}

/// 当天 00:00 UTC
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

/// 按服务等级生成当月任务 (未绑定项目)
pub fn generate_tasks(tier: i32, start_date: NaiveDate) -> Result<Vec<TaskDraft>, ScheduleError> {
    let tier = Tier::try_from(tier)?;
    expand_month(tier, start_date.year(), start_date.month())
}

/// 生成并绑定到指定项目
pub fn generate_for_project(
    tier: i32,
    start_date: NaiveDate,
    project_id: Uuid,
) -> Result<Vec<NewTask>, ScheduleError> {
    Ok(generate_tasks(tier, start_date)?
        .into_iter()
        .map(|draft| draft.for_project(project_id))
        .collect())
}

pub fn expand_month(tier: Tier, year: i32, month: u32) -> Result<Vec<TaskDraft>, ScheduleError> {
    let last = days_in_month(year, month);
    let mut drafts = Vec::new();

    for template in tier.templates() {
        for day in anchor_days(&template.recurrence, last) {
            let date = NaiveDate::from_ymd_opt(year, month, day.min(last))
                .ok_or(ScheduleError::InvalidDay { year, month, day })?;
            drafts.push(draft_from(template, tier, date, day));
        }
    }

    Ok(drafts)
}

fn anchor_days(recurrence: &Recurrence, last: u32) -> Vec<u32> {
    match *recurrence {
        Recurrence::Days(days) => days.to_vec(),
        Recurrence::Daily { from, skip } => (from..=last).filter(|d| !skip.contains(d)).collect(),
    }
}

fn draft_from(template: &TaskTemplate, tier: Tier, date: NaiveDate, anchor: u32) -> TaskDraft {
    TaskDraft {
        title: template.title.to_string(),
        description: Some(template.description.to_string()),
        scheduled_date: start_of_day(date),
        priority: template.priority,
        estimated_time: Some(template.estimated_time.to_string()),
        task_type: template.task_type,
        tier,
        recurring_day: Some(anchor as i32),
    }
}
