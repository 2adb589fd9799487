//! Email and SMS marketing campaigns

use super::{entity, Paging};
use crate::slice::resource::require;
use crate::slice::entity::record_id;
use crate::slice::{EntityId, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Delivery channel
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Email,
    Sms,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Scheduled,
    Sending,
    Sent,
    #[serde(other)]
    Other,
}

/// A campaign and its delivery counters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    #[serde(flatten, with = "record_id")]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "type")]
    pub channel: Channel,
    /// Email subject line
    pub subject: Option<String>,
    #[serde(default, alias = "message")]
    pub content: String,
    #[serde(default)]
    pub status: CampaignStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sent_count: u64,
    #[serde(default)]
    pub open_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDraft {
    pub name: String,
    pub channel: Channel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub content: String,
    /// Recipient segment ("all", "members", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CampaignStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignFilter {
    #[serde(flatten)]
    pub paging: Paging,
    #[serde(rename = "type")]
    pub channel: Option<Channel>,
    pub status: Option<CampaignStatus>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignStats {
    pub total_campaigns: u64,
    pub total_sent: u64,
    pub average_open_rate: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Campaign collection
#[derive(Clone, Copy, Debug, Default)]
pub struct Campaigns;

impl Resource for Campaigns {
    type Entity = Campaign;
    type Draft = CampaignDraft;
    type Patch = CampaignPatch;
    type Filter = CampaignFilter;
    type Stats = CampaignStats;

    const DOMAIN: &'static str = "campaigns";
    const PATH: &'static str = "campaigns";
    const COLLECTION_KEY: &'static str = "campaigns";
    const LABEL: &'static str = "Campaign";

    fn validate_draft(draft: &CampaignDraft) -> Result<(), String> {
        require(&draft.name, "Campaign name")?;
        require(&draft.content, "Message")?;
        if draft.channel == Channel::Email {
            require(draft.subject.as_deref().unwrap_or_default(), "Subject")?;
        }
        Ok(())
    }
}

entity!(Campaign);
