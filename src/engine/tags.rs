// Engine operations: tag registry

use crate::error::{Result, VideothequeError};
use crate::library::tags::{self, TagOperator, TagSuggestion};
use crate::models::{MediaRecord, TagBucket, TagCatalog};
use super::{Collection, Engine};

impl Engine {
    pub fn add_custom_tag(&mut self, name: &str) -> Result<String> {
        let tag = tags::add_custom_tag(&mut self.data, name)?;
        self.persist_later(&[Collection::AppConfig]);
        Ok(tag)
    }

    /// Remove a custom tag from the catalog and from every record carrying it.
    pub fn remove_custom_tag(&mut self, name: &str) -> Result<usize> {
        let touched = tags::remove_custom_tag(&mut self.data, name)?;
        self.persist_later(&[
            Collection::UniqueMedias,
            Collection::SeriesEpisodes,
            Collection::SeriesMetadata,
            Collection::AppConfig,
        ]);
        Ok(touched)
    }

    fn media_collection(&self, media_id: &str) -> Result<Collection> {
        match self.data.find_record(media_id) {
            Some(MediaRecord::Unique(_)) => Ok(Collection::UniqueMedias),
            Some(MediaRecord::Episode(_)) => Ok(Collection::SeriesEpisodes),
            None => Err(VideothequeError::MediaNotFound(media_id.to_string())),
        }
    }

    pub fn add_tags_to_media(&mut self, media_id: &str, list: &[String], bucket: TagBucket) -> Result<Vec<String>> {
        let collection = self.media_collection(media_id)?;
        let bucket_after = tags::add_tags_to_media(&mut self.data, media_id, list, bucket)?;
        self.persist_later(&[collection, Collection::AppConfig]);
        Ok(bucket_after)
    }

    pub fn remove_tags_from_media(&mut self, media_id: &str, list: &[String], bucket: TagBucket) -> Result<Vec<String>> {
        let collection = self.media_collection(media_id)?;
        let bucket_after = tags::remove_tags_from_media(&mut self.data, media_id, list, bucket)?;
        self.persist_later(&[collection, Collection::AppConfig]);
        Ok(bucket_after)
    }

    pub fn search_by_tags(&self, list: &[String], operator: TagOperator) -> Vec<MediaRecord> {
        tags::search_by_tags(&self.data, list, operator)
    }

    pub fn get_tag_suggestions(&self, query: &str, limit: usize) -> Vec<TagSuggestion> {
        tags::tag_suggestions(&self.data, query, limit)
    }

    pub fn get_popular_tags(&self, limit: usize) -> Vec<TagSuggestion> {
        tags::popular_tags(&self.data, limit)
    }

    pub fn get_tag_catalog(&self) -> &TagCatalog {
        &self.data.config.tag_manager
    }
}
