use crate::{CommentNode, CoreError, Post};

/// Where posts and their comment trees come from.
///
/// Implementations own transport concerns (auth, rate limits, retries). The
/// pipeline awaits each call in turn and never issues two at once.
#[allow(async_fn_in_trait)]
pub trait ForumSource {
    /// Up to `limit` top-ranked posts of `community`, in the source's order.
    async fn top_posts(&self, community: &str, limit: usize) -> Result<Vec<Post>, CoreError>;

    /// The flattened comment set of `post`. Continuation markers the source
    /// managed to expand are already replaced by the comments they stood for.
    async fn comments(&self, post: &Post) -> Result<Vec<CommentNode>, CoreError>;
}
