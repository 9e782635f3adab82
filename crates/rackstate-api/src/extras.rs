// Extras endpoints: tags.

use crate::client::NetboxClient;
use crate::error::Error;
use crate::types::{TagCreate, TagResponse};

const TAGS: &str = "extras/tags/";

impl NetboxClient {
    pub async fn get_tag_by_name(&self, name: &str) -> Result<Option<TagResponse>, Error> {
        self.get_one(TAGS, &[("name", name.to_owned())]).await
    }

    pub async fn create_tag(&self, body: &TagCreate<'_>) -> Result<TagResponse, Error> {
        self.create(TAGS, body).await
    }
}
