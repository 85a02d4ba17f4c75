//! Typed view of the timeline GraphQL payload
//!
//! Only the shapes the extractor understands are modelled. Anything else
//! fails deserialization and surfaces as a malformed post.

use crate::error::{BotError, Result};
use serde::Deserialize;

/// `content` object of a timeline entry
#[derive(Debug, Deserialize)]
#[serde(tag = "entryType")]
pub enum EntryContent {
    /// A single post
    TimelineTimelineItem {
        #[serde(rename = "itemContent")]
        item_content: ItemContent,
    },
    /// A conversation: the first item is the outer post, the second its reply partner
    TimelineTimelineModule { items: Vec<ModuleItem> },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
pub struct ModuleItem {
    pub item: ModuleItemInner,
}

#[derive(Debug, Deserialize)]
pub struct ModuleItemInner {
    #[serde(rename = "itemContent")]
    pub item_content: ItemContent,
}

#[derive(Debug, Deserialize)]
pub struct ItemContent {
    pub tweet_results: Option<TweetResults>,
}

impl ItemContent {
    fn results(&self) -> Result<&TweetResults> {
        self.tweet_results
            .as_ref()
            .ok_or_else(|| BotError::malformed("Tweet contains no tweet_results key"))
    }
}

#[derive(Debug, Deserialize)]
pub struct TweetResults {
    pub result: Option<TweetResult>,
}

impl TweetResults {
    /// Unwrap visibility wrappers down to the tweet node
    pub fn node(&self) -> Result<&TweetNode> {
        match &self.result {
            Some(TweetResult::Tweet(node)) => Ok(node),
            Some(TweetResult::TweetWithVisibilityResults { tweet }) => Ok(tweet),
            Some(TweetResult::Unsupported) => {
                Err(BotError::malformed("Unsupported tweet result type"))
            }
            None => Err(BotError::malformed("Tweet results contain no result")),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum TweetResult {
    Tweet(TweetNode),
    TweetWithVisibilityResults { tweet: TweetNode },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
pub struct TweetNode {
    pub rest_id: Option<String>,
    pub core: Option<TweetCore>,
    pub legacy: Option<TweetLegacy>,
    pub quoted_status_result: Option<Box<TweetResults>>,
}

impl TweetNode {
    /// Numeric post id, from `legacy.id_str` or `rest_id`
    pub fn post_id(&self) -> Result<u64> {
        let raw = self
            .legacy
            .as_ref()
            .and_then(|l| l.id_str.as_deref())
            .or(self.rest_id.as_deref())
            .ok_or_else(|| BotError::malformed("Tweet has no id"))?;

        raw.parse::<u64>()
            .map_err(|_| BotError::malformed(format!("Tweet id is not numeric: {}", raw)))
    }

    pub fn user(&self) -> Result<&UserLegacy> {
        self.core
            .as_ref()
            .map(|c| &c.user_results.result.legacy)
            .ok_or_else(|| BotError::malformed("Tweet contains no core"))
    }

    pub fn legacy(&self) -> Result<&TweetLegacy> {
        self.legacy
            .as_ref()
            .ok_or_else(|| BotError::malformed("Tweet contains no legacy"))
    }
}

#[derive(Debug, Deserialize)]
pub struct TweetCore {
    pub user_results: UserResults,
}

#[derive(Debug, Deserialize)]
pub struct UserResults {
    pub result: UserResult,
}

#[derive(Debug, Deserialize)]
pub struct UserResult {
    pub legacy: UserLegacy,
}

#[derive(Debug, Deserialize)]
pub struct UserLegacy {
    /// Display name
    pub name: String,
    /// The @handle
    pub screen_name: String,
    #[serde(default)]
    pub profile_image_url_https: String,
}

#[derive(Debug, Deserialize)]
pub struct TweetLegacy {
    pub id_str: Option<String>,
    pub full_text: String,
    #[serde(default)]
    pub entities: Entities,
    pub extended_entities: Option<ExtendedEntities>,
    pub retweeted_status_result: Option<Box<TweetResults>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub hashtags: Vec<EntityText>,
    #[serde(default)]
    pub symbols: Vec<EntityText>,
}

#[derive(Debug, Deserialize)]
pub struct EntityText {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtendedEntities {
    #[serde(default)]
    pub media: Vec<MediaEntity>,
}

#[derive(Debug, Deserialize)]
pub struct MediaEntity {
    pub media_url_https: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Outer post and optional reply partner of one entry
pub struct Conversation<'a> {
    pub outer: &'a TweetResults,
    pub reply: Option<&'a TweetResults>,
}

impl EntryContent {
    pub fn conversation(&self) -> Result<Conversation<'_>> {
        match self {
            EntryContent::TimelineTimelineItem { item_content } => Ok(Conversation {
                outer: item_content.results()?,
                reply: None,
            }),
            EntryContent::TimelineTimelineModule { items } => {
                let first = items
                    .first()
                    .ok_or_else(|| BotError::malformed("Conversation module has no items"))?;
                let reply = match items.get(1) {
                    Some(item) => Some(item.item.item_content.results()?),
                    None => None,
                };
                Ok(Conversation {
                    outer: first.item.item_content.results()?,
                    reply,
                })
            }
            EntryContent::Unsupported => Err(BotError::malformed("Unsupported entry type")),
        }
    }
}
