use super::{FetchError, PageSource};
use crate::api::types::Post;
use crate::api::FacegramRest;
use crate::session::Session;
use async_trait::async_trait;
use std::sync::Arc;

/// The home timeline, paged through `GET v1/posts`.
pub struct HomeFeed {
    rest: Arc<FacegramRest>,
    session: Session,
}

impl HomeFeed {
    pub fn new(rest: Arc<FacegramRest>, session: Session) -> Self {
        Self { rest, session }
    }
}

#[async_trait]
impl PageSource for HomeFeed {
    type Item = Post;

    async fn fetch_page(&self, page: u32, size: u32) -> Result<Vec<Post>, FetchError> {
        self.rest
            .list_posts(&self.session, page, size)
            .await
            .map_err(FetchError::from)
    }
}
