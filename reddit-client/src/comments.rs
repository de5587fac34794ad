use crate::api::{CommentThing, RedditMoreData};
use std::collections::VecDeque;
use threadmood_core::{CommentNode, RawComment};

/// Reddit accepts at most this many ids per `/api/morechildren` call.
pub const MORE_CHILDREN_BATCH: usize = 100;

#[derive(Debug, Clone)]
enum ForestEntry {
    Comment(RawComment),
    More(RedditMoreData),
}

/// Ids drained from one continuation marker, waiting to be fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionBatch {
    pub position: usize,
    pub children: Vec<String>,
}

/// A thread's comments flattened breadth-first, parents before replies.
///
/// Continuation markers stay at the position where Reddit cut the tree off;
/// expanding one splices the fetched comments in at that spot.
#[derive(Debug, Clone, Default)]
pub struct CommentForest {
    entries: Vec<ForestEntry>,
}

impl CommentForest {
    pub fn from_things(things: Vec<CommentThing>) -> Self {
        Self {
            entries: flatten(things),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of markers that still reference unfetched comment ids.
    pub fn expandable_markers(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, ForestEntry::More(more) if !more.children.is_empty()))
            .count()
    }

    /// Takes up to one batch of ids from the first expandable marker.
    ///
    /// A marker whose ids are all taken is removed, so a failed fetch never
    /// comes back as the same batch.
    pub fn next_expansion(&mut self) -> Option<ExpansionBatch> {
        let position = self.entries.iter().position(
            |entry| matches!(entry, ForestEntry::More(more) if !more.children.is_empty()),
        )?;

        let ForestEntry::More(more) = &mut self.entries[position] else {
            return None;
        };
        let take = more.children.len().min(MORE_CHILDREN_BATCH);
        let children: Vec<String> = more.children.drain(..take).collect();
        more.count = more.count.saturating_sub(take as u32);

        if more.children.is_empty() {
            self.entries.remove(position);
        }

        Some(ExpansionBatch { position, children })
    }

    /// Splices fetched comments in where their marker used to be.
    pub fn insert_expansion(&mut self, batch: &ExpansionBatch, things: Vec<CommentThing>) {
        let position = batch.position.min(self.entries.len());
        let fetched = flatten(things);
        self.entries.splice(position..position, fetched);
    }

    pub fn into_nodes(self) -> Vec<CommentNode> {
        self.entries
            .into_iter()
            .map(|entry| match entry {
                ForestEntry::Comment(comment) => CommentNode::Comment(comment),
                ForestEntry::More(more) => CommentNode::ContinuationMarker {
                    id: more.id,
                    count: more.count,
                },
            })
            .collect()
    }
}

fn flatten(things: Vec<CommentThing>) -> Vec<ForestEntry> {
    let mut entries = Vec::new();
    let mut queue: VecDeque<CommentThing> = things.into();

    while let Some(thing) = queue.pop_front() {
        match thing {
            CommentThing::Comment(mut data) => {
                let replies = std::mem::take(&mut data.replies);
                queue.extend(replies.into_children());
                entries.push(ForestEntry::Comment(data.into()));
            }
            CommentThing::More(more) => entries.push(ForestEntry::More(more)),
        }
    }

    entries
}
