// src/scheduler/catalog.rs
//! 各服务等级的任务模板表。

use crate::models::{Priority, TaskType, Tier, TierInfo};

/// 模板在一个月内落在哪几天
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    /// 固定日期，超出当月天数时取当月最后一天
    Days(&'static [u32]),
    /// 从 `from` 到月底每天一次，跳过 `skip` 中的日期
    Daily {
        from: u32,
        skip: &'static [u32],
    },
}

#[derive(Debug, Clone, Copy)]
pub struct TaskTemplate {
    pub title: &'static str,
    pub description: &'static str,
    pub priority: Priority,
    pub estimated_time: &'static str,
    pub task_type: TaskType,
    pub recurrence: Recurrence,
}

const fn template(
    title: &'static str,
    description: &'static str,
    priority: Priority,
    estimated_time: &'static str,
    task_type: TaskType,
    recurrence: Recurrence,
) -> TaskTemplate {
    TaskTemplate {
        title,
        description,
        priority,
        estimated_time,
        task_type,
        recurrence,
    }
}

use crate::models::Priority::{High, Low, Medium};
use crate::models::TaskType::{Ads, Content, Engagement, Reporting, Setup};
use Recurrence::{Daily, Days};

// --- Tier 1: Basic (每月 8 项) ---
const BASIC: &[TaskTemplate] = &[
    template(
        "Review/optimize social media profiles",
        "Update bios, images for 2 platforms",
        High,
        "30 min",
        Setup,
        Days(&[1]),
    ),
    template(
        "Schedule 2 posts/week",
        "Create and schedule content for the week",
        Medium,
        "45 min",
        Content,
        Days(&[5, 12, 19, 26]),
    ),
    template(
        "Respond to comments/messages",
        "Up to 5 interactions per session",
        Medium,
        "20 min",
        Engagement,
        Days(&[10, 20]),
    ),
    template(
        "Generate basic analytics report",
        "Monthly overview of engagement metrics",
        High,
        "60 min",
        Reporting,
        Days(&[30]),
    ),
];

// --- Tier 2: Standard (每月 16 项) ---
const STANDARD: &[TaskTemplate] = &[
    template(
        "Review/optimize profiles on 4 platforms",
        "Update bios, images for all platforms",
        High,
        "45 min",
        Setup,
        Days(&[1]),
    ),
    template(
        "Schedule 4 posts/week",
        "Create and schedule content across platforms",
        Medium,
        "60 min",
        Content,
        Days(&[3, 10, 17, 24]),
    ),
    template(
        "Create custom graphics",
        "Design graphics for 8 posts",
        Medium,
        "90 min",
        Content,
        Days(&[7, 14, 21, 28]),
    ),
    template(
        "Set up ad campaign",
        "Configure campaign with $100 budget",
        High,
        "45 min",
        Ads,
        Days(&[5]),
    ),
    template(
        "Monitor/adjust ad performance",
        "Review and optimize ad targeting",
        Medium,
        "30 min",
        Ads,
        Days(&[15, 25]),
    ),
    template(
        "Respond to comments/messages",
        "Up to 8-9 interactions per session",
        Medium,
        "30 min",
        Engagement,
        Days(&[10, 20, 30]),
    ),
    template(
        "Generate detailed analytics report",
        "Monthly report with insights and recommendations",
        High,
        "90 min",
        Reporting,
        Days(&[30]),
    ),
];

// 每周制作素材的那天，和当天的日更合并成一项，保证每天只有一个 content 任务
const PRODUCTION_DAYS: &[u32] = &[5, 12, 19, 26];

// --- Tier 3: Premium (每月 N + 16 项，N 为当月天数) ---
const PREMIUM: &[TaskTemplate] = &[
    template(
        "Review/optimize profiles on 6 platforms",
        "Update bios, images for all major platforms",
        High,
        "60 min",
        Setup,
        Days(&[1]),
    ),
    template(
        "Schedule daily posts",
        "1-2 posts per day across platforms",
        Medium,
        "30 min",
        Content,
        Daily {
            from: 2,
            skip: PRODUCTION_DAYS,
        },
    ),
    template(
        "Create custom graphics/videos and schedule daily posts",
        "Advanced content for 22-23 posts plus today's 1-2 posts",
        High,
        "120 min",
        Content,
        Days(PRODUCTION_DAYS),
    ),
    template(
        "Set up advanced ad campaign",
        "Configure campaign with $300 budget",
        High,
        "60 min",
        Ads,
        Days(&[5]),
    ),
    template(
        "Optimize ad targeting/performance",
        "Advanced targeting and performance optimization",
        Medium,
        "45 min",
        Ads,
        Days(&[10, 20, 30]),
    ),
    template(
        "Coordinate with micro-influencers",
        "Content planning and approvals with 1-2 influencers",
        Medium,
        "60 min",
        Engagement,
        Days(&[7, 21]),
    ),
    template(
        "Research/update SEO-optimized hashtags",
        "Update hashtags and keywords for each platform",
        Low,
        "45 min",
        Engagement,
        Days(&[3, 17]),
    ),
    template(
        "Respond to comments/messages",
        "Unlimited interactions within reason",
        Medium,
        "45 min",
        Engagement,
        Days(&[7, 14, 21, 28]),
    ),
    template(
        "Generate weekly analytics report",
        "Detailed performance tracking with strategy adjustments",
        High,
        "60 min",
        Reporting,
        Days(&[7, 14, 21, 28]),
    ),
];

impl Tier {
    pub fn templates(self) -> &'static [TaskTemplate] {
        match self {
            Tier::Basic => BASIC,
            Tier::Standard => STANDARD,
            Tier::Premium => PREMIUM,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Basic => "Basic",
            Tier::Standard => "Standard",
            Tier::Premium => "Premium",
        }
    }

    /// 月费 (美元)
    pub fn price(self) -> u32 {
        match self {
            Tier::Basic => 500,
            Tier::Standard => 1200,
            Tier::Premium => 2500,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Tier::Basic => "blue",
            Tier::Standard => "orange",
            Tier::Premium => "purple",
        }
    }

    pub fn features(self) -> &'static [&'static str] {
        match self {
            Tier::Basic => &[
                "2 Social Media Platforms",
                "8 Posts per Month",
                "Basic Analytics Report",
                "10 Interactions/month",
            ],
            Tier::Standard => &[
                "4 Social Media Platforms",
                "16 Posts per Month",
                "Custom Graphics",
                "Ad Management ($100)",
                "25 Interactions/month",
            ],
            Tier::Premium => &[
                "6 Social Media Platforms",
                "30 Posts per Month",
                "Advanced Content Creation",
                "Influencer Collaboration",
                "Weekly Analytics",
            ],
        }
    }

    pub fn info(self) -> TierInfo {
        TierInfo {
            tier: self,
            name: self.name(),
            price: self.price(),
            color: self.color(),
            features: self.features(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tier_starts_with_a_day_one_setup_task() {
        for tier in Tier::ALL {
            let first = &tier.templates()[0];
            assert_eq!(first.task_type, TaskType::Setup);
            assert_eq!(first.recurrence, Days(&[1]));
        }
    }

    #[test]
    fn fixed_days_stay_within_one_to_thirty_one() {
        for tier in Tier::ALL {
            for t in tier.templates() {
                if let Days(days) = t.recurrence {
                    assert!(days.iter().all(|d| (1..=31).contains(d)), "{}", t.title);
                }
            }
        }
    }

    #[test]
    fn tiers_are_ordered_by_price() {
        assert!(Tier::Basic < Tier::Standard && Tier::Standard < Tier::Premium);
        assert!(Tier::Basic.price() < Tier::Standard.price());
        assert!(Tier::Standard.price() < Tier::Premium.price());
    }
}
